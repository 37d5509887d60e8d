//! Target-agnostic structural description of a declaration.
//!
//! The declaration backend is split in two: this module computes a [`Shape`]
//! tree (wrappers, unions, intersections, tuples, records with optionality)
//! from the schema IR, and `decl::print` turns shapes into concrete syntax.
//! Every rule with teeth — the list precedence ladder, pattern-key
//! narrowing, enum narrowing, helper extraction — lives here.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::resolve;
use crate::schema::{Items, KindSet, Schema, SchemaNode, TagKind};

use super::doc;
use super::Options;

// ————————————————————————————————————————————————————————————————————————————
// SHAPE IR
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// The `{ type: <discriminant>; value: <payload> }` pair every
    /// tag-bearing value renders as.
    Wrapper {
        kind: Discriminant,
        value: Box<Shape>,
    },
    Number,
    Str,
    Unknown,
    Never,
    /// An exact literal type (enum member).
    Literal(Value),
    /// Fixed-arity positional type.
    Tuple(Vec<Shape>),
    Array(Box<Shape>),
    Record(Record),
    Union(Vec<Shape>),
    Intersection(Vec<Shape>),
    /// A symbolic reference to another declaration (catalog key or extracted
    /// helper name).
    Named(String),
}

/// The `type` member of a wrapper: one-or-more exact kind literals, or a
/// loose `string` when the element kind is not pinned down.
#[derive(Debug, Clone, PartialEq)]
pub enum Discriminant {
    Kinds(Vec<TagKind>),
    Loose,
}

impl Discriminant {
    fn one(kind: TagKind) -> Discriminant {
        Discriminant::Kinds(vec![kind])
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub members: Vec<Member>,
    pub index: Vec<IndexMember>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub name: String,
    pub optional: bool,
    pub doc: Vec<String>,
    pub shape: Shape,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexMember {
    pub key: KeySig,
    pub shape: Shape,
}

/// Index-signature key type, narrowed from the pattern-property regex.
#[derive(Debug, Clone, PartialEq)]
pub enum KeySig {
    /// Digit-only / signed-digit / decimal pattern families.
    Number,
    /// A numeric placeholder embedded in literal text, e.g. `slot\d+`.
    Template { prefix: String, suffix: String },
    Str,
}

/// An extracted helper declaration (tagged-union branch lifted out).
#[derive(Debug, Clone, PartialEq)]
pub struct Helper {
    pub name: String,
    pub shape: Shape,
}

fn union_of(mut arms: Vec<Shape>) -> Shape {
    match arms.len() {
        0 => Shape::Never,
        1 => arms.remove(0),
        _ => Shape::Union(arms),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// BUILDER
// ————————————————————————————————————————————————————————————————————————————

/// Threads the per-invocation state: options, the cycle guard, and the
/// run-scoped helper list/counter. Never shared across calls.
pub struct Builder<'a> {
    catalog: &'a Catalog,
    opts: &'a Options,
    root_name: String,
    visited: Vec<String>,
    pub helpers: Vec<Helper>,
    helper_seq: u32,
}

impl<'a> Builder<'a> {
    pub fn new(catalog: &'a Catalog, opts: &'a Options, root_name: &str) -> Builder<'a> {
        Builder {
            catalog,
            opts,
            root_name: root_name.to_string(),
            visited: Vec::new(),
            helpers: Vec::new(),
            helper_seq: 0,
        }
    }

    /// Root declarations describe the document's fields directly (an
    /// interface), while nested compounds keep the `{type, value}` wrapper.
    pub fn root_shape(&mut self, node: &SchemaNode) -> Result<Shape> {
        if node.single_kind() == Some(TagKind::Compound) && node.ref_.is_none() {
            let record = Shape::Record(self.compound_value(node)?);
            let mut inter = vec![record];
            for s in &node.all_of {
                inter.push(self.combinator_shape(s)?);
            }
            let base = if inter.len() == 1 {
                inter.remove(0)
            } else {
                Shape::Intersection(inter)
            };
            if node.one_of.is_empty() {
                return Ok(base);
            }
            let mut arms = vec![base];
            for s in &node.one_of {
                arms.push(self.combinator_shape(s)?);
            }
            return Ok(Shape::Union(arms));
        }
        self.node_shape(node)
    }

    pub fn shape_of(&mut self, schema: &Schema) -> Result<Shape> {
        match schema {
            Schema::Bool(true) => Ok(Shape::Unknown),
            Schema::Bool(false) => Ok(Shape::Never),
            Schema::Node(node) => self.node_shape(node),
        }
    }

    pub fn node_shape(&mut self, node: &SchemaNode) -> Result<Shape> {
        // inline mode substitutes the target before anything else
        if self.opts.inline_references {
            if let Some(name) = &node.ref_ {
                return match self.catalog.resolve_name(name) {
                    Ok(named) => {
                        if self.visited.iter().any(|v| v == &named.id) {
                            return Err(Error::ReferenceCycle(named.id.clone()));
                        }
                        let id = named.id.clone();
                        let merged = resolve::merge_ref(node, &named.node);
                        self.visited.push(id);
                        let out = self.node_shape(&merged);
                        self.visited.pop();
                        out
                    }
                    // incomplete catalog: drop the unresolved part, keep
                    // whatever the node declares itself
                    Err(Error::MissingReference(_)) | Err(Error::AliasCycle(_)) => {
                        let mut own = node.clone();
                        own.ref_ = None;
                        self.node_shape(&own)
                    }
                    Err(e) => Err(e),
                };
            }
        }

        let mut inter: Vec<Shape> = Vec::new();
        if let Some(kinds) = &node.kind {
            inter.push(self.tagged_shape(node, kinds)?);
        }
        if !self.opts.inline_references {
            if let Some(name) = &node.ref_ {
                inter.push(self.ref_shape_or_unknown(name));
            }
        }
        for s in &node.all_of {
            inter.push(self.combinator_shape(s)?);
        }

        let base = match inter.len() {
            0 => None,
            1 => Some(inter.remove(0)),
            _ => Some(Shape::Intersection(inter)),
        };
        if node.one_of.is_empty() {
            return Ok(base.unwrap_or(Shape::Unknown));
        }
        let mut arms: Vec<Shape> = base.into_iter().collect();
        for s in &node.one_of {
            arms.push(self.combinator_shape(s)?);
        }
        Ok(union_of(arms))
    }

    /// Combinator members that are pure references stay symbolic name tokens
    /// in symbolic mode.
    fn combinator_shape(&mut self, schema: &Schema) -> Result<Shape> {
        if !self.opts.inline_references {
            if let Some(n) = schema.as_node() {
                if n.is_pure_ref() {
                    let name = n.ref_.as_deref().unwrap_or_default();
                    return Ok(self.ref_shape_or_unknown(name));
                }
            }
        }
        self.shape_of(schema)
    }

    /// The degrade site: an unresolvable name becomes an unconstrained
    /// placeholder here, where the validator backend would have failed.
    fn ref_shape_or_unknown(&mut self, name: &str) -> Shape {
        match self.catalog.resolve_name(name) {
            Ok(named) => Shape::Named(named.id.clone()),
            Err(_) => Shape::Unknown,
        }
    }

    fn tagged_shape(&mut self, node: &SchemaNode, kinds: &KindSet) -> Result<Shape> {
        let kinds: Vec<TagKind> = kinds.iter().collect();
        if kinds.len() == 1 {
            return self.kind_shape(node, kinds[0]);
        }
        let mut arms = Vec::with_capacity(kinds.len());
        for kind in kinds {
            let wrapper = self.kind_shape(node, kind)?;
            if self.opts.extract_helpers {
                let name = self.next_helper_name(kind);
                self.helpers.push(Helper {
                    name: name.clone(),
                    shape: wrapper,
                });
                arms.push(Shape::Named(name));
            } else {
                arms.push(wrapper);
            }
        }
        Ok(Shape::Union(arms))
    }

    fn next_helper_name(&mut self, kind: TagKind) -> String {
        self.helper_seq += 1;
        format!("{}{}{}", self.root_name, kind.pascal_name(), self.helper_seq)
    }

    /// Exactly one wrapper per kind-bearing node.
    fn kind_shape(&mut self, node: &SchemaNode, kind: TagKind) -> Result<Shape> {
        let value = self.value_shape(node, kind)?;
        Ok(Shape::Wrapper {
            kind: Discriminant::one(kind),
            value: Box::new(value),
        })
    }

    fn value_shape(&mut self, node: &SchemaNode, kind: TagKind) -> Result<Shape> {
        // an enum narrows the payload to the exact declared literals
        if !node.enum_values.is_empty() {
            return Ok(union_of(
                node.enum_values.iter().cloned().map(Shape::Literal).collect(),
            ));
        }
        let shape = match kind {
            TagKind::Byte
            | TagKind::Short
            | TagKind::Int
            | TagKind::Float
            | TagKind::Double => Shape::Number,
            TagKind::Long => long_pair(),
            TagKind::String => Shape::Str,
            TagKind::ByteArray | TagKind::ShortArray | TagKind::IntArray => {
                Shape::Array(Box::new(Shape::Number))
            }
            TagKind::LongArray => Shape::Array(Box::new(long_pair())),
            TagKind::List => self.list_value(node)?,
            TagKind::Compound => Shape::Record(self.compound_value(node)?),
            TagKind::End => Shape::Tuple(Vec::new()),
        };
        Ok(shape)
    }

    // ---- list rules, in precedence order ----

    fn list_value(&mut self, node: &SchemaNode) -> Result<Shape> {
        match &node.items {
            // 1) zero-length tuple: the end-tag empty list
            Some(Items::Tuple(items)) if items.is_empty() => {
                let empty = Shape::Wrapper {
                    kind: Discriminant::one(TagKind::End),
                    value: Box::new(Shape::Tuple(Vec::new())),
                };
                // extra trailing items tolerated → union with the any-array
                // escape hatch
                if node.max_items.map_or(true, |mx| mx > 0) {
                    Ok(Shape::Union(vec![empty, any_list_inner()]))
                } else {
                    Ok(empty)
                }
            }
            // 3) / 4) tuple items
            Some(Items::Tuple(items)) => self.tuple_value(items),
            // 5) single homogeneous item schema
            Some(Items::One(item)) => self.homogeneous_value(item),
            // 2) no item schema: precision over brevity — one branch per
            // possible element kind rather than a collapsed unknown
            None => {
                let mut arms = Vec::with_capacity(TagKind::ALL.len());
                for kind in TagKind::ALL {
                    arms.push(Shape::Wrapper {
                        kind: Discriminant::one(kind),
                        value: Box::new(default_element_payload(kind)),
                    });
                }
                Ok(Shape::Union(arms))
            }
        }
    }

    fn tuple_value(&mut self, items: &[Schema]) -> Result<Shape> {
        let mut kinds: Vec<Option<TagKind>> = Vec::with_capacity(items.len());
        let mut values: Vec<Shape> = Vec::with_capacity(items.len());
        for item in items {
            match item.as_node() {
                Some(n) => match n.single_kind() {
                    Some(k) => {
                        kinds.push(Some(k));
                        values.push(self.value_shape(n, k)?);
                    }
                    None => {
                        kinds.push(None);
                        values.push(Shape::Unknown);
                    }
                },
                None => {
                    kinds.push(None);
                    values.push(Shape::Unknown);
                }
            }
        }

        // 3) all positions share one kind: a fixed-length tuple keeps
        // positional precision (distinct per-axis literals survive)
        if let Some(Some(first)) = kinds.first() {
            if kinds.iter().all(|k| *k == Some(*first)) {
                return Ok(Shape::Wrapper {
                    kind: Discriminant::one(*first),
                    value: Box::new(Shape::Tuple(values)),
                });
            }
        }

        // 4) mixed kinds: union discriminant + array of unioned value-texts;
        // sound but positionally less precise
        let mut distinct: Vec<TagKind> = Vec::new();
        for k in kinds.into_iter().flatten() {
            if !distinct.contains(&k) {
                distinct.push(k);
            }
        }
        let discriminant = if distinct.is_empty() {
            Discriminant::Loose
        } else {
            Discriminant::Kinds(distinct)
        };
        Ok(Shape::Wrapper {
            kind: discriminant,
            value: Box::new(Shape::Array(Box::new(union_of(values)))),
        })
    }

    fn homogeneous_value(&mut self, item: &Schema) -> Result<Shape> {
        match item {
            Schema::Bool(true) => Ok(any_list_inner()),
            Schema::Bool(false) => Ok(Shape::Wrapper {
                kind: Discriminant::Loose,
                value: Box::new(Shape::Array(Box::new(Shape::Never))),
            }),
            Schema::Node(n) => {
                if let Some(kinds) = &n.kind {
                    let mut arms = Vec::new();
                    for kind in kinds.iter() {
                        let payload = self.value_shape(n, kind)?;
                        arms.push(Shape::Wrapper {
                            kind: Discriminant::one(kind),
                            value: Box::new(Shape::Array(Box::new(payload))),
                        });
                    }
                    Ok(union_of(arms))
                } else {
                    // reference/combinator items: fall back to an array of
                    // the item's full wrapped shape under a loose type
                    let inner = self.node_shape(n)?;
                    Ok(Shape::Wrapper {
                        kind: Discriminant::Loose,
                        value: Box::new(Shape::Array(Box::new(inner))),
                    })
                }
            }
        }
    }

    // ---- compound rules ----

    pub fn compound_value(&mut self, node: &SchemaNode) -> Result<Record> {
        let mut record = Record::default();
        for (name, schema) in &node.properties {
            let doc = match schema.as_node() {
                Some(n) => doc::doc_lines(n),
                None => Vec::new(),
            };
            record.members.push(Member {
                name: name.clone(),
                optional: !node.required.contains(name),
                doc,
                shape: self.shape_of(schema)?,
            });
        }

        // `additionalProperties: false` suppresses any index signature
        if node.additional_properties == Some(Schema::Bool(false)) {
            return Ok(record);
        }

        for (pattern, schema) in &node.pattern_properties {
            record.index.push(IndexMember {
                key: classify_key(pattern),
                shape: self.shape_of(schema)?,
            });
        }
        match &node.additional_properties {
            Some(Schema::Bool(true)) => record.index.push(IndexMember {
                key: KeySig::Str,
                shape: Shape::Unknown,
            }),
            Some(Schema::Node(extra)) => record.index.push(IndexMember {
                key: KeySig::Str,
                shape: self.node_shape(extra)?,
            }),
            Some(Schema::Bool(false)) => unreachable!("handled above"),
            None => {
                // nothing declared at all, but the caller opted in
                if node.pattern_properties.is_empty() && self.opts.permissive_extras {
                    record.index.push(IndexMember {
                        key: KeySig::Str,
                        shape: Shape::Unknown,
                    });
                }
            }
        }
        Ok(record)
    }
}

fn long_pair() -> Shape {
    Shape::Tuple(vec![Shape::Number, Shape::Number])
}

/// The escape-hatch inner shape: any element type, any payload array.
fn any_list_inner() -> Shape {
    Shape::Wrapper {
        kind: Discriminant::Loose,
        value: Box::new(Shape::Array(Box::new(Shape::Unknown))),
    }
}

/// The payload array for an unconstrained list branch of `kind`.
fn default_element_payload(kind: TagKind) -> Shape {
    match kind {
        TagKind::Byte | TagKind::Short | TagKind::Int | TagKind::Float | TagKind::Double => {
            Shape::Array(Box::new(Shape::Number))
        }
        TagKind::Long => Shape::Array(Box::new(long_pair())),
        TagKind::String => Shape::Array(Box::new(Shape::Str)),
        TagKind::ByteArray | TagKind::ShortArray | TagKind::IntArray => {
            Shape::Array(Box::new(Shape::Array(Box::new(Shape::Number))))
        }
        TagKind::LongArray => Shape::Array(Box::new(Shape::Array(Box::new(long_pair())))),
        // compound elements as open records
        TagKind::Compound => {
            let mut record = Record::default();
            record.index.push(IndexMember {
                key: KeySig::Str,
                shape: Shape::Unknown,
            });
            Shape::Array(Box::new(Shape::Record(record)))
        }
        // nested lists as any-array
        TagKind::List => Shape::Array(Box::new(Shape::Unknown)),
        TagKind::End => Shape::Tuple(Vec::new()),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// PATTERN-KEY NARROWING
// ————————————————————————————————————————————————————————————————————————————

/// Literal text with a single embedded numeric placeholder, e.g. `slot\d+`.
static TEMPLATE_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([^\\\[\](){}.*+?|^$]*)(?:\\d\+|\[0-9\]\+)([^\\\[\](){}.*+?|^$]*)$").unwrap()
});

/// Pattern families recognized as integer-like keys, after normalizing
/// `[0-9]` to `\d` and stripping anchors.
const NUMERIC_KEY_FAMILIES: [&str; 6] = [
    r"\d+",
    r"\d*",
    r"-\d+",
    r"-?\d+",
    r"\d+\.\d+",
    r"-?\d+\.\d+",
];

/// Narrow a pattern-property regex to a key type. Unrecognized patterns fall
/// back to a plain string key — never an error.
pub fn classify_key(pattern: &str) -> KeySig {
    let trimmed = pattern.strip_prefix('^').unwrap_or(pattern);
    let trimmed = trimmed.strip_suffix('$').unwrap_or(trimmed);

    let normalized = trimmed.replace("[0-9]", r"\d");
    if NUMERIC_KEY_FAMILIES.contains(&normalized.as_str()) {
        return KeySig::Number;
    }
    if let Some(caps) = TEMPLATE_KEY.captures(trimmed) {
        let prefix = caps[1].to_string();
        let suffix = caps[2].to_string();
        if !(prefix.is_empty() && suffix.is_empty()) {
            return KeySig::Template { prefix, suffix };
        }
    }
    KeySig::Str
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build(v: serde_json::Value) -> Shape {
        let node: SchemaNode = serde_json::from_value(v).unwrap();
        let catalog = Catalog::default();
        let opts = Options::default();
        Builder::new(&catalog, &opts, "T").node_shape(&node).unwrap()
    }

    #[test]
    fn digit_only_pattern_narrows_to_number_key() {
        assert_eq!(classify_key(r"\d+"), KeySig::Number);
        assert_eq!(classify_key(r"^[0-9]+$"), KeySig::Number);
        assert_eq!(classify_key(r"-?\d+"), KeySig::Number);
        assert_eq!(classify_key(r"-?\d+\.\d+"), KeySig::Number);
    }

    #[test]
    fn embedded_placeholder_becomes_template_key() {
        assert_eq!(
            classify_key(r"^slot\d+$"),
            KeySig::Template {
                prefix: "slot".to_string(),
                suffix: String::new()
            }
        );
        assert_eq!(
            classify_key(r"level[0-9]+_data"),
            KeySig::Template {
                prefix: "level".to_string(),
                suffix: "_data".to_string()
            }
        );
    }

    #[test]
    fn unrecognized_pattern_falls_back_to_string_key() {
        assert_eq!(classify_key(r"[a-z]+"), KeySig::Str);
        assert_eq!(classify_key(r"\w+\d+\w+\d+"), KeySig::Str);
    }

    #[test]
    fn enum_narrows_value_to_literal_union_in_order() {
        let shape = build(json!({ "tag": "byte", "enum": [1, 0] }));
        match shape {
            Shape::Wrapper { value, .. } => match *value {
                Shape::Union(arms) => {
                    assert_eq!(arms[0], Shape::Literal(json!(1)));
                    assert_eq!(arms[1], Shape::Literal(json!(0)));
                }
                other => panic!("expected literal union, got {other:?}"),
            },
            other => panic!("expected wrapper, got {other:?}"),
        }
    }

    #[test]
    fn uniform_kind_tuple_collapses_to_single_wrapper() {
        let shape = build(json!({
            "tag": "list",
            "items": [
                { "tag": "int", "enum": [0, 1, 2] },
                { "tag": "int" },
                { "tag": "int" }
            ]
        }));
        let Shape::Wrapper { value, .. } = shape else {
            panic!("expected list wrapper");
        };
        let Shape::Wrapper { kind, value } = *value else {
            panic!("expected inner wrapper");
        };
        assert_eq!(kind, Discriminant::Kinds(vec![TagKind::Int]));
        let Shape::Tuple(positions) = *value else {
            panic!("expected fixed tuple, not unioned wrappers");
        };
        assert_eq!(positions.len(), 3);
        // per-axis literal precision survives
        assert!(matches!(positions[0], Shape::Union(_)));
        assert_eq!(positions[1], Shape::Number);
    }

    #[test]
    fn mixed_kind_tuple_unions_discriminant_and_values() {
        let shape = build(json!({
            "tag": "list",
            "items": [ { "tag": "int" }, { "tag": "string" } ]
        }));
        let Shape::Wrapper { value, .. } = shape else {
            panic!("expected list wrapper");
        };
        let Shape::Wrapper { kind, value } = *value else {
            panic!("expected inner wrapper");
        };
        assert_eq!(kind, Discriminant::Kinds(vec![TagKind::Int, TagKind::String]));
        let Shape::Array(item) = *value else {
            panic!("expected array payload");
        };
        assert_eq!(*item, Shape::Union(vec![Shape::Number, Shape::Str]));
    }

    #[test]
    fn unconstrained_list_enumerates_every_kind() {
        let shape = build(json!({ "tag": "list" }));
        let Shape::Wrapper { value, .. } = shape else {
            panic!("expected list wrapper");
        };
        let Shape::Union(arms) = *value else {
            panic!("expected per-kind enumeration");
        };
        assert_eq!(arms.len(), TagKind::ALL.len());
    }

    #[test]
    fn empty_tuple_is_end_with_escape_hatch() {
        let shape = build(json!({ "tag": "list", "items": [] }));
        let Shape::Wrapper { value, .. } = shape else {
            panic!("expected list wrapper");
        };
        let Shape::Union(arms) = *value else {
            panic!("expected end/escape union");
        };
        assert_eq!(
            arms[0],
            Shape::Wrapper {
                kind: Discriminant::one(TagKind::End),
                value: Box::new(Shape::Tuple(Vec::new()))
            }
        );

        // a hard zero-length bound drops the escape hatch
        let bounded = build(json!({ "tag": "list", "items": [], "maxItems": 0 }));
        let Shape::Wrapper { value, .. } = bounded else {
            panic!()
        };
        assert!(matches!(*value, Shape::Wrapper { .. }));
    }

    #[test]
    fn additional_properties_false_suppresses_index_signatures() {
        let shape = build(json!({
            "tag": "compound",
            "properties": { "A": { "tag": "int" } },
            "patternProperties": { r"\d+": { "tag": "int" } },
            "additionalProperties": false
        }));
        let Shape::Wrapper { value, .. } = shape else {
            panic!()
        };
        let Shape::Record(record) = *value else { panic!() };
        assert_eq!(record.members.len(), 1);
        assert!(record.index.is_empty());
    }

    #[test]
    fn missing_reference_degrades_to_unknown() {
        let node: SchemaNode =
            serde_json::from_value(json!({ "allOf": [ { "$ref": "Ghost" } ], "tag": "compound" }))
                .unwrap();
        let catalog = Catalog::default();
        let opts = Options {
            inline_references: false,
            ..Options::default()
        };
        let shape = Builder::new(&catalog, &opts, "T").node_shape(&node).unwrap();
        let Shape::Intersection(parts) = shape else {
            panic!("expected intersection");
        };
        assert_eq!(parts[1], Shape::Unknown);
    }
}
