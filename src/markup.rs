//! Prose-markup parser: indentation-based bullet markup → schema IR.
//!
//! Only lines starting with one-or-more `*` bullets and carrying an
//! `{{nbt|<kind>[|<name>]}}` directive are structural; the bullet count is
//! the nesting depth. Everything else is scanned for cross-reference
//! directives and otherwise ignored — malformed markup never raises.
//!
//! Parsing is a single pass over the lines with a stack of open frames;
//! lowering is a second pass that turns the generic tree into [`SchemaNode`]
//! values, including the merge-upward and alias-collapse rules the source
//! markup relies on to express inheritance.

pub mod naming;
pub mod prose;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::schema::{Items, NamedSchema, Schema, SchemaNode, TagKind};

// ————————————————————————————————————————————————————————————————————————————
// GRAMMAR
// ————————————————————————————————————————————————————————————————————————————

/// `<bullets> {{nbt|<kind>[|<name>]}}[: <description>]`
static BULLET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\*+)\s*\{\{nbt\|([a-z-]+)(?:\|([^{}|]+))?\}\}\s*(?::\s*(.*))?$").unwrap()
});

/// `{{<ref-template>|<name>[|<category>]}}` on any line.
static CROSSREF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{(?:ref|nbt inherit|main)\|([^{}|]+?)\s*(?:\|([^{}|]+?)\s*)?\}\}").unwrap()
});

/// `== Heading ==` section lines.
static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^=+\s*([^=]+?)\s*=+\s*$").unwrap());

static LEADING_BULLETS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\*+)").unwrap());

/// Optionality sniffing over prose-derived descriptions. Fragile by nature;
/// kept only because the legacy markup has no explicit optionality flag.
const MAY_NOT_EXIST: &str = "(may not exist)";

// ————————————————————————————————————————————————————————————————————————————
// PARSE TREE
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkupNode {
    /// Tag kind from the `{{nbt|…}}` directive. `None` for synthetic
    /// reference children (and the synthetic root).
    pub kind: Option<TagKind>,
    pub name: Option<String>,
    pub description: Option<String>,
    /// Catalog key for a cross-reference child.
    pub reference: Option<String>,
    pub children: Vec<MarkupNode>,
}

/// Parse markup into a tree under a synthetic root. Bullet count = depth;
/// the root sits at depth 0.
pub fn parse_tree(text: &str) -> MarkupNode {
    let mut stack: Vec<(usize, MarkupNode)> = vec![(0, MarkupNode::default())];

    for line in text.lines() {
        if let Some(caps) = BULLET.captures(line) {
            if let Some(kind) = TagKind::from_wiki_name(&caps[2]) {
                let depth = caps[1].len();
                let node = MarkupNode {
                    kind: Some(kind),
                    name: caps.get(3).map(|m| m.as_str().trim().to_string()),
                    description: caps
                        .get(4)
                        .map(|m| prose::normalize(m.as_str()))
                        .filter(|d| !d.is_empty()),
                    reference: None,
                    children: Vec::new(),
                };
                attach(&mut stack, depth, node);
                continue;
            }
            // unknown kind: fall through to cross-reference scanning
        }

        // non-structural line: extract cross-references, leave depth alone
        let depth = LEADING_BULLETS
            .captures(line)
            .map(|c| c[1].len())
            .unwrap_or_else(|| stack.last().map(|(d, _)| d + 1).unwrap_or(1));
        for caps in CROSSREF.captures_iter(line) {
            let key = naming::catalog_key(&caps[1], caps.get(2).map(|m| m.as_str()));
            let node = MarkupNode {
                reference: Some(key),
                ..MarkupNode::default()
            };
            attach(&mut stack, depth, node);
        }
    }

    // drain open frames into their parents
    while stack.len() > 1 {
        let (_, done) = stack.pop().unwrap();
        stack.last_mut().unwrap().1.children.push(done);
    }
    stack.pop().unwrap().1
}

/// Pop frames at or below the incoming depth, attach, push the new frame.
fn attach(stack: &mut Vec<(usize, MarkupNode)>, depth: usize, node: MarkupNode) {
    while stack.len() > 1 && stack.last().map(|(d, _)| *d >= depth).unwrap_or(false) {
        let (_, done) = stack.pop().unwrap();
        stack.last_mut().unwrap().1.children.push(done);
    }
    stack.push((depth, node));
}

// ————————————————————————————————————————————————————————————————————————————
// LOWERING
// ————————————————————————————————————————————————————————————————————————————

/// Lower a parsed section. A single top-level bullet becomes the schema
/// itself; multiple top-level bullets are treated as the fields of an
/// implicit compound.
pub fn lower_root(root: &MarkupNode) -> SchemaNode {
    if root.children.len() == 1 {
        return lower_node(&root.children[0]);
    }
    let mut synthetic = MarkupNode {
        kind: Some(TagKind::Compound),
        ..MarkupNode::default()
    };
    synthetic.children = root.children.clone();
    lower_compound(&synthetic)
}

pub fn lower_node(node: &MarkupNode) -> SchemaNode {
    if let Some(key) = &node.reference {
        let mut out = SchemaNode::default();
        out.ref_ = Some(key.clone());
        out.description = node.description.clone();
        return out;
    }
    match node.kind {
        Some(TagKind::Compound) => lower_compound(node),
        Some(TagKind::List) => lower_list(node),
        Some(kind) => {
            let mut out = SchemaNode::of_kind(kind);
            out.description = node.description.clone();
            out
        }
        None => {
            let mut out = SchemaNode::default();
            out.description = node.description.clone();
            out
        }
    }
}

/// List lowering follows the declaration backend's consumer contract:
/// no/one/many children → no-item/single-item/tuple-item forms.
fn lower_list(node: &MarkupNode) -> SchemaNode {
    let mut out = SchemaNode::of_kind(TagKind::List);
    out.description = node.description.clone();
    match node.children.len() {
        0 => {}
        1 => {
            out.items = Some(Items::One(Box::new(Schema::node(lower_node(
                &node.children[0],
            )))));
        }
        _ => {
            out.items = Some(Items::Tuple(
                node.children
                    .iter()
                    .map(|c| Schema::node(lower_node(c)))
                    .collect(),
            ));
        }
    }
    out
}

fn lower_compound(node: &MarkupNode) -> SchemaNode {
    let mut out = SchemaNode::of_kind(TagKind::Compound);
    out.description = node.description.clone();
    let mut mixins: Vec<String> = Vec::new();
    collect_members(&node.children, &mut out, &mut mixins);

    // a lone unnamed reference with no other content: the compound is a
    // pure alias, not an empty record with a mixin
    if out.properties.is_empty() && out.pattern_properties.is_empty() && mixins.len() == 1 {
        let mut alias = SchemaNode::default();
        alias.ref_ = Some(mixins.remove(0));
        alias.description = out.description;
        return alias;
    }

    for key in mixins {
        let mut mixin = SchemaNode::default();
        mixin.ref_ = Some(key);
        out.all_of.push(Schema::node(mixin));
    }
    out
}

fn collect_members(children: &[MarkupNode], out: &mut SchemaNode, mixins: &mut Vec<String>) {
    for child in children {
        if let Some(key) = &child.reference {
            match &child.name {
                // unnamed reference: mixin on the parent
                None => mixins.push(key.clone()),
                Some(name) => insert_property(out, name, lower_node(child)),
            }
            continue;
        }
        match (&child.name, child.kind) {
            // unnamed compound: its fields apply directly here
            (None, Some(TagKind::Compound)) => {
                collect_members(&child.children, out, mixins);
            }
            (Some(name), _) => insert_property(out, name, lower_node(child)),
            // unnamed non-compound children have nowhere to go
            (None, _) => {}
        }
    }
}

/// First-declared name wins on collision.
fn insert_property(out: &mut SchemaNode, name: &str, prop: SchemaNode) {
    if out.properties.contains_key(name) {
        return;
    }
    let required = !prop
        .description
        .as_deref()
        .is_some_and(|d| d.contains(MAY_NOT_EXIST));
    if required {
        out.required.push(name.to_string());
    }
    out.properties.insert(name.to_string(), Schema::node(prop));
}

// ————————————————————————————————————————————————————————————————————————————
// MULTI-SECTION DOCUMENTS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub key: String,
    pub heading: String,
    pub schema: NamedSchema,
}

/// Split a document by heading lines, lower each section independently, and
/// auto-key each via the name/category resolver. A section's first
/// non-bullet paragraph line becomes the schema description when the markup
/// itself declared none.
pub fn parse_sections(text: &str, category: Option<&str>) -> Vec<Section> {
    let mut sections: Vec<(String, Vec<&str>)> = Vec::new();
    for line in text.lines() {
        if let Some(caps) = HEADING.captures(line) {
            sections.push((caps[1].to_string(), Vec::new()));
        } else if let Some((_, body)) = sections.last_mut() {
            body.push(line);
        }
        // preamble before the first heading is ignored
    }

    sections
        .into_iter()
        .filter_map(|(heading, body_lines)| {
            let body = body_lines.join("\n");
            let tree = parse_tree(&body);
            if tree.children.is_empty() {
                return None;
            }
            let mut node = lower_root(&tree);
            if node.description.is_none() {
                node.description = leading_paragraph(&body_lines);
            }
            let key = naming::catalog_key(&heading, category);
            let fragment = node.single_kind() != Some(TagKind::Compound);
            Some(Section {
                key: key.clone(),
                heading,
                schema: NamedSchema {
                    id: key,
                    fragment,
                    node,
                },
            })
        })
        .collect()
}

fn leading_paragraph(lines: &[&str]) -> Option<String> {
    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.starts_with('*') {
            return None;
        }
        let normalized = prose::normalize(trimmed);
        if normalized.is_empty() {
            return None;
        }
        return Some(normalized);
    }
    None
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
