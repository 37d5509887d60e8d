//! Reference resolution against a catalog.
//!
//! Two modes, selected by [`ResolveOptions::inline_references`]:
//!
//! - **Inline**: the referenced shape is substituted in place. The
//!   referencing node's own declared keys win, except that a missing `tag`
//!   falls back to the target's — siblings of a `$ref` refine the target's
//!   structural kind, they never silently replace it.
//! - **Symbolic**: the reference is never substituted; it is rewritten into
//!   the node's `allOf` list as a pure-ref member, alongside whatever inline
//!   shape the node declares itself.
//!
//! Both backends thread a visited set of catalog names through resolution so
//! a cyclic catalog turns into [`Error::ReferenceCycle`] instead of
//! unbounded recursion.

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::schema::{Items, Schema, SchemaNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    pub inline_references: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        ResolveOptions {
            inline_references: true,
        }
    }
}

/// Overlay `node`'s own declared keys on a clone of the referenced `target`.
/// Every key the referencing node declares takes precedence; `kind` defaults
/// to the target's when omitted. The referencing `$ref` is consumed, but a
/// target that is itself a pure reference (an alias-collapsed catalog root)
/// keeps its own `$ref`, so callers resolve chains hop by hop under their
/// visited set.
pub fn merge_ref(node: &SchemaNode, target: &SchemaNode) -> SchemaNode {
    let mut out = target.clone();

    if node.kind.is_some() {
        out.kind = node.kind.clone();
    }
    if node.title.is_some() {
        out.title = node.title.clone();
    }
    if node.description.is_some() {
        out.description = node.description.clone();
    }
    if node.default.is_some() {
        out.default = node.default.clone();
    }
    if !node.examples.is_empty() {
        out.examples = node.examples.clone();
    }
    if !node.enum_values.is_empty() {
        out.enum_values = node.enum_values.clone();
        out.enum_labels = node.enum_labels.clone();
    }
    if !node.properties.is_empty() {
        out.properties = node.properties.clone();
    }
    if !node.required.is_empty() {
        out.required = node.required.clone();
    }
    if !node.pattern_properties.is_empty() {
        out.pattern_properties = node.pattern_properties.clone();
    }
    if node.additional_properties.is_some() {
        out.additional_properties = node.additional_properties.clone();
    }
    if node.items.is_some() {
        out.items = node.items.clone();
    }
    if node.min_items.is_some() {
        out.min_items = node.min_items;
    }
    if node.max_items.is_some() {
        out.max_items = node.max_items;
    }
    if !node.all_of.is_empty() {
        out.all_of = node.all_of.clone();
    }
    if !node.one_of.is_empty() {
        out.one_of = node.one_of.clone();
    }
    out
}

/// Resolve every reference reachable from `node`, returning a new tree.
/// The input is never mutated.
pub fn resolve_refs(node: &SchemaNode, catalog: &Catalog, opts: ResolveOptions) -> Result<SchemaNode> {
    let mut visited = Vec::new();
    resolve_node(node, catalog, opts, &mut visited)
}

fn resolve_node(
    node: &SchemaNode,
    catalog: &Catalog,
    opts: ResolveOptions,
    visited: &mut Vec<String>,
) -> Result<SchemaNode> {
    let mut current = node.clone();
    let mut pushed = 0usize;

    if opts.inline_references {
        // follow the whole chain: a merged-in target may itself be a pure
        // reference (alias-collapsed catalog root)
        while let Some(name) = current.ref_.clone() {
            let named = match catalog.resolve_name(&name) {
                Ok(named) => named,
                Err(e) => {
                    visited.truncate(visited.len() - pushed);
                    return Err(e);
                }
            };
            if visited.iter().any(|n| n == &named.id) {
                let err = Err(Error::ReferenceCycle(named.id.clone()));
                visited.truncate(visited.len() - pushed);
                return err;
            }
            visited.push(named.id.clone());
            pushed += 1;
            current = merge_ref(&current, &named.node);
        }
    } else if let Some(name) = current.ref_.take() {
        // symbolic: move the ref into allOf as a pure-ref member
        catalog.resolve_name(&name)?;
        let mut pointer = SchemaNode::default();
        pointer.ref_ = Some(name);
        current.all_of.insert(0, Schema::node(pointer));
    }

    let result = resolve_children(&mut current, catalog, opts, visited);
    visited.truncate(visited.len() - pushed);
    result?;
    Ok(current)
}

fn resolve_children(
    node: &mut SchemaNode,
    catalog: &Catalog,
    opts: ResolveOptions,
    visited: &mut Vec<String>,
) -> Result<()> {
    for (_, schema) in node.properties.iter_mut() {
        resolve_schema(schema, catalog, opts, visited)?;
    }
    for (_, schema) in node.pattern_properties.iter_mut() {
        resolve_schema(schema, catalog, opts, visited)?;
    }
    if let Some(extra) = node.additional_properties.as_mut() {
        resolve_schema(extra, catalog, opts, visited)?;
    }
    match node.items.as_mut() {
        Some(Items::One(item)) => resolve_schema(item, catalog, opts, visited)?,
        Some(Items::Tuple(items)) => {
            for item in items {
                resolve_schema(item, catalog, opts, visited)?;
            }
        }
        None => {}
    }
    for schema in node.all_of.iter_mut().chain(node.one_of.iter_mut()) {
        // symbolic mode leaves pure-ref combinator members as name tokens
        if !opts.inline_references {
            if let Schema::Node(n) = schema {
                if n.is_pure_ref() {
                    catalog.resolve_name(n.ref_.as_deref().unwrap_or_default())?;
                    continue;
                }
            }
        }
        resolve_schema(schema, catalog, opts, visited)?;
    }
    Ok(())
}

fn resolve_schema(
    schema: &mut Schema,
    catalog: &Catalog,
    opts: ResolveOptions,
    visited: &mut Vec<String>,
) -> Result<()> {
    if let Schema::Node(node) = schema {
        **node = resolve_node(node, catalog, opts, visited)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Entry;
    use crate::schema::{KindSet, NamedSchema, TagKind};
    use serde_json::json;

    fn catalog_with(name: &str, node: SchemaNode) -> Catalog {
        Catalog::from_entries([(
            name.to_string(),
            Entry::Schema(Box::new(NamedSchema {
                id: name.to_string(),
                fragment: true,
                node,
            })),
        )])
    }

    fn node(v: serde_json::Value) -> SchemaNode {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn inline_substitutes_target_shape() {
        let catalog = catalog_with(
            "Pos",
            node(json!({ "tag": "list", "items": { "tag": "double" } })),
        );
        let referencing = node(json!({ "$ref": "Pos", "description": "where it is" }));
        let resolved = resolve_refs(&referencing, &catalog, ResolveOptions::default()).unwrap();
        assert_eq!(resolved.ref_, None);
        assert_eq!(resolved.single_kind(), Some(TagKind::List));
        // own keys win
        assert_eq!(resolved.description.as_deref(), Some("where it is"));
    }

    #[test]
    fn sibling_keys_refine_not_replace_kind() {
        let catalog = catalog_with("Flag", node(json!({ "tag": "byte", "enum": [0, 1] })));
        // declares its own enum but no tag: kind comes from the target
        let referencing = node(json!({ "$ref": "Flag", "enum": [1] }));
        let resolved = resolve_refs(&referencing, &catalog, ResolveOptions::default()).unwrap();
        assert_eq!(resolved.single_kind(), Some(TagKind::Byte));
        assert_eq!(resolved.enum_values, vec![json!(1)]);

        // declares its own tag: it wins
        let overriding = node(json!({ "$ref": "Flag", "tag": "short" }));
        let resolved = resolve_refs(&overriding, &catalog, ResolveOptions::default()).unwrap();
        assert_eq!(resolved.single_kind(), Some(TagKind::Short));
    }

    #[test]
    fn no_reference_markers_survive_inline_resolution() {
        let catalog = Catalog::from_entries([
            (
                "Inner".to_string(),
                Entry::Schema(Box::new(NamedSchema {
                    id: "Inner".to_string(),
                    fragment: true,
                    node: node(json!({ "tag": "string" })),
                })),
            ),
            (
                "Outer".to_string(),
                Entry::Schema(Box::new(NamedSchema {
                    id: "Outer".to_string(),
                    fragment: false,
                    node: node(json!({
                        "tag": "compound",
                        "properties": {
                            "name": { "$ref": "Inner" },
                            "tags": { "tag": "list", "items": { "$ref": "Inner" } }
                        }
                    })),
                })),
            ),
        ]);
        let outer = catalog.resolve_name("Outer").unwrap().node.clone();
        let resolved = resolve_refs(&outer, &catalog, ResolveOptions::default()).unwrap();

        fn assert_no_refs(n: &SchemaNode) {
            assert_eq!(n.ref_, None);
            for s in n
                .properties
                .values()
                .chain(n.pattern_properties.values())
                .chain(n.all_of.iter())
                .chain(n.one_of.iter())
            {
                if let Some(child) = s.as_node() {
                    assert_no_refs(child);
                }
            }
            match &n.items {
                Some(Items::One(s)) => {
                    if let Some(child) = s.as_node() {
                        assert_no_refs(child);
                    }
                }
                Some(Items::Tuple(xs)) => {
                    for s in xs {
                        if let Some(child) = s.as_node() {
                            assert_no_refs(child);
                        }
                    }
                }
                None => {}
            }
        }
        assert_no_refs(&resolved);
    }

    #[test]
    fn symbolic_mode_keeps_name_token_in_all_of() {
        let catalog = catalog_with("Base", node(json!({ "tag": "compound", "properties": {} })));
        let referencing = node(json!({
            "$ref": "Base",
            "tag": "compound",
            "properties": { "Extra": { "tag": "int" } }
        }));
        let resolved = resolve_refs(
            &referencing,
            &catalog,
            ResolveOptions {
                inline_references: false,
            },
        )
        .unwrap();
        assert_eq!(resolved.ref_, None);
        let first = resolved.all_of[0].as_node().unwrap();
        assert_eq!(first.ref_.as_deref(), Some("Base"));
        // own shape kept alongside, not substituted
        assert!(resolved.properties.contains_key("Extra"));
    }

    #[test]
    fn chained_pure_reference_resolves_to_terminal_shape() {
        // an alias-collapsed root: a named schema whose node is nothing but
        // a reference to the real definition
        let catalog = Catalog::from_entries([
            (
                "Entity_Mob".to_string(),
                Entry::Schema(Box::new(NamedSchema {
                    id: "Entity_Mob".to_string(),
                    fragment: false,
                    node: node(json!({
                        "tag": "compound",
                        "properties": { "Health": { "tag": "float" } }
                    })),
                })),
            ),
            (
                "Entity_MobAlias".to_string(),
                Entry::Schema(Box::new(NamedSchema {
                    id: "Entity_MobAlias".to_string(),
                    fragment: true,
                    node: node(json!({ "$ref": "Entity_Mob" })),
                })),
            ),
        ]);
        let referencing = node(json!({ "$ref": "Entity_MobAlias" }));
        let resolved = resolve_refs(&referencing, &catalog, ResolveOptions::default()).unwrap();
        assert_eq!(resolved.ref_, None);
        assert_eq!(resolved.single_kind(), Some(TagKind::Compound));
        assert!(resolved.properties.contains_key("Health"));
    }

    #[test]
    fn pure_reference_cycle_is_a_defined_error() {
        let catalog = Catalog::from_entries([
            (
                "A".to_string(),
                Entry::Schema(Box::new(NamedSchema {
                    id: "A".to_string(),
                    fragment: true,
                    node: node(json!({ "$ref": "B" })),
                })),
            ),
            (
                "B".to_string(),
                Entry::Schema(Box::new(NamedSchema {
                    id: "B".to_string(),
                    fragment: true,
                    node: node(json!({ "$ref": "A" })),
                })),
            ),
        ]);
        let root = node(json!({ "$ref": "A" }));
        assert!(matches!(
            resolve_refs(&root, &catalog, ResolveOptions::default()),
            Err(Error::ReferenceCycle(_))
        ));
    }

    #[test]
    fn missing_reference_is_fatal() {
        let catalog = Catalog::default();
        let referencing = node(json!({ "$ref": "Ghost" }));
        assert!(matches!(
            resolve_refs(&referencing, &catalog, ResolveOptions::default()),
            Err(Error::MissingReference(n)) if n == "Ghost"
        ));
    }

    #[test]
    fn reference_cycle_is_a_defined_error() {
        let a = node(json!({
            "tag": "compound",
            "properties": { "next": { "$ref": "B" } }
        }));
        let b = node(json!({
            "tag": "compound",
            "properties": { "next": { "$ref": "A" } }
        }));
        let catalog = Catalog::from_entries([
            (
                "A".to_string(),
                Entry::Schema(Box::new(NamedSchema {
                    id: "A".to_string(),
                    fragment: false,
                    node: a.clone(),
                })),
            ),
            (
                "B".to_string(),
                Entry::Schema(Box::new(NamedSchema {
                    id: "B".to_string(),
                    fragment: false,
                    node: b,
                })),
            ),
        ]);
        let root = node(json!({ "$ref": "A" }));
        assert!(matches!(
            resolve_refs(&root, &catalog, ResolveOptions::default()),
            Err(Error::ReferenceCycle(_))
        ));
    }

    #[test]
    fn kind_set_union_survives_merge() {
        let catalog = catalog_with("U", node(json!({ "tag": ["byte", "short"] })));
        let referencing = node(json!({ "$ref": "U" }));
        let resolved = resolve_refs(&referencing, &catalog, ResolveOptions::default()).unwrap();
        assert_eq!(
            resolved.kind,
            Some(KindSet::Many(vec![TagKind::Byte, TagKind::Short]))
        );
    }
}
