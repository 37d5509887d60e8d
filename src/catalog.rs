//! The catalog: an immutable name → (named schema | alias) map.
//!
//! The catalog is always an explicit parameter — there is no hidden global
//! default. Construction happens once (usually from a JSON document) and the
//! map is read-only from then on; both backends only ever look names up.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::{NamedSchema, TagKind};

/// One catalog entry. A bare string is an alias pointing at another name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Entry {
    Alias(String),
    Schema(Box<NamedSchema>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    entries: IndexMap<String, Entry>,
}

impl Catalog {
    /// The single construction path. (`Catalog::default()` is the empty map.)
    pub fn new(entries: IndexMap<String, Entry>) -> Catalog {
        Catalog { entries }
    }

    pub fn from_entries<I>(entries: I) -> Catalog
    where
        I: IntoIterator<Item = (String, Entry)>,
    {
        Catalog {
            entries: entries.into_iter().collect(),
        }
    }

    /// Parse a catalog from JSON, reporting the failing JSON path on error.
    pub fn from_json_str(src: &str) -> Result<Catalog> {
        crate::path_de::from_str_with_path(src).map_err(Error::Catalog)
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Follow alias chains from `name` to a terminal [`NamedSchema`].
    ///
    /// An entry aliasing itself is treated as a non-alias and not followed
    /// (it resolves to nothing). Longer cycles are detected by a seen-set and
    /// reported as [`Error::AliasCycle`].
    pub fn resolve_name<'a>(&'a self, name: &str) -> Result<&'a NamedSchema> {
        let mut seen: Vec<&str> = Vec::new();
        let mut current = name;
        loop {
            match self.entries.get(current) {
                None => return Err(Error::MissingReference(current.to_string())),
                Some(Entry::Schema(named)) => return Ok(named),
                Some(Entry::Alias(target)) => {
                    if target == current {
                        // self-alias: a dead name, not a link
                        return Err(Error::MissingReference(current.to_string()));
                    }
                    if seen.contains(&current) {
                        return Err(Error::AliasCycle(name.to_string()));
                    }
                    seen.push(current);
                    current = target;
                }
            }
        }
    }

    /// One-time load-side validation pass. Collects every violation instead
    /// of stopping at the first:
    /// - every alias chain terminates at an existing named schema;
    /// - non-fragment roots carry compound kind;
    /// - `required` names only directly-declared properties.
    pub fn validate(&self) -> std::result::Result<(), Vec<Error>> {
        let mut violations = Vec::new();
        for (name, entry) in &self.entries {
            match entry {
                Entry::Alias(_) => {
                    if let Err(e) = self.resolve_name(name) {
                        violations.push(e);
                    }
                }
                Entry::Schema(named) => {
                    if !named.fragment && named.node.single_kind() != Some(TagKind::Compound) {
                        violations.push(Error::InvalidRoot(name.clone()));
                    }
                    for req in &named.node.required {
                        if !named.node.properties.contains_key(req) {
                            violations.push(Error::Catalog(format!(
                                "{name}: required key {req:?} is not a declared property"
                            )));
                        }
                    }
                }
            }
        }
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaNode;
    use serde_json::json;

    fn named(id: &str, node: SchemaNode) -> Entry {
        Entry::Schema(Box::new(NamedSchema {
            id: id.to_string(),
            fragment: false,
            node,
        }))
    }

    fn compound() -> SchemaNode {
        SchemaNode::of_kind(TagKind::Compound)
    }

    #[test]
    fn alias_chains_terminate_at_named_schema() {
        let catalog = Catalog::from_entries([
            ("A".to_string(), Entry::Alias("B".to_string())),
            ("B".to_string(), Entry::Alias("C".to_string())),
            ("C".to_string(), named("C", compound())),
        ]);
        assert_eq!(catalog.resolve_name("A").unwrap().id, "C");
    }

    #[test]
    fn self_alias_is_not_followed() {
        let catalog = Catalog::from_entries([("A".to_string(), Entry::Alias("A".to_string()))]);
        assert!(matches!(
            catalog.resolve_name("A"),
            Err(Error::MissingReference(n)) if n == "A"
        ));
    }

    #[test]
    fn alias_cycle_is_a_defined_error() {
        let catalog = Catalog::from_entries([
            ("A".to_string(), Entry::Alias("B".to_string())),
            ("B".to_string(), Entry::Alias("A".to_string())),
        ]);
        assert!(matches!(catalog.resolve_name("A"), Err(Error::AliasCycle(_))));
    }

    #[test]
    fn validate_flags_dangling_alias_and_bad_required() {
        let mut bad = compound();
        bad.required.push("Ghost".to_string());
        let catalog = Catalog::from_entries([
            ("A".to_string(), Entry::Alias("Nope".to_string())),
            ("B".to_string(), named("B", bad)),
        ]);
        let violations = catalog.validate().unwrap_err();
        assert_eq!(violations.len(), 2);
    }

    #[test]
    fn validate_rejects_non_compound_non_fragment_root() {
        let catalog = Catalog::from_entries([(
            "Scalar".to_string(),
            named("Scalar", SchemaNode::of_kind(TagKind::Byte)),
        )]);
        let violations = catalog.validate().unwrap_err();
        assert!(matches!(violations[0], Error::InvalidRoot(_)));
    }

    #[test]
    fn catalog_parses_from_json_with_aliases() {
        let src = json!({
            "Item_ItemStack": { "id": "Item_ItemStack", "tag": "compound", "properties": {} },
            "ItemStack": "Item_ItemStack"
        })
        .to_string();
        let catalog = Catalog::from_json_str(&src).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.resolve_name("ItemStack").unwrap().id, "Item_ItemStack");
        catalog.validate().unwrap();
    }
}
