//! Schema intermediate representation for the tag-typed NBT document model.
//!
//! Every serialized NBT value is self-describing: a tag kind plus a payload.
//! The IR mirrors that — a node is a (possibly multi-valued) tag kind with
//! per-kind metadata (properties for compounds, items for lists), plus the
//! usual documentation metadata and `$ref`/`allOf`/`oneOf` combinators.
//!
//! Nodes are plain serde data. Catalog literals are authored as JSON and
//! deserialize straight into [`SchemaNode`]; both backends treat all input
//! trees as read-only and build fresh output trees.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ————————————————————————————————————————————————————————————————————————————
// TAG KINDS
// ————————————————————————————————————————————————————————————————————————————

/// The fixed discriminant set of the tag format.
///
/// Serde names follow the lowercase hyphenated spellings used by the
/// wiki-derived catalogs (`"byte"`, `"byte-array"`, …).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagKind {
    #[serde(rename = "byte")]
    Byte,
    #[serde(rename = "short")]
    Short,
    #[serde(rename = "int")]
    Int,
    #[serde(rename = "long")]
    Long,
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "double")]
    Double,
    #[serde(rename = "string")]
    String,
    #[serde(rename = "byte-array")]
    ByteArray,
    #[serde(rename = "short-array")]
    ShortArray,
    #[serde(rename = "int-array")]
    IntArray,
    #[serde(rename = "long-array")]
    LongArray,
    #[serde(rename = "list")]
    List,
    #[serde(rename = "compound")]
    Compound,
    #[serde(rename = "end")]
    End,
}

impl TagKind {
    /// All kinds, in catalog order. Used by the declaration backend when an
    /// unconstrained list must enumerate every possible element shape.
    pub const ALL: [TagKind; 14] = [
        TagKind::Byte,
        TagKind::Short,
        TagKind::Int,
        TagKind::Long,
        TagKind::Float,
        TagKind::Double,
        TagKind::String,
        TagKind::ByteArray,
        TagKind::ShortArray,
        TagKind::IntArray,
        TagKind::LongArray,
        TagKind::List,
        TagKind::Compound,
        TagKind::End,
    ];

    pub fn wiki_name(self) -> &'static str {
        match self {
            TagKind::Byte => "byte",
            TagKind::Short => "short",
            TagKind::Int => "int",
            TagKind::Long => "long",
            TagKind::Float => "float",
            TagKind::Double => "double",
            TagKind::String => "string",
            TagKind::ByteArray => "byte-array",
            TagKind::ShortArray => "short-array",
            TagKind::IntArray => "int-array",
            TagKind::LongArray => "long-array",
            TagKind::List => "list",
            TagKind::Compound => "compound",
            TagKind::End => "end",
        }
    }

    pub fn from_wiki_name(name: &str) -> Option<TagKind> {
        TagKind::ALL
            .into_iter()
            .find(|k| k.wiki_name() == name)
    }

    /// PascalCase form, used for helper-declaration naming.
    pub fn pascal_name(self) -> &'static str {
        match self {
            TagKind::Byte => "Byte",
            TagKind::Short => "Short",
            TagKind::Int => "Int",
            TagKind::Long => "Long",
            TagKind::Float => "Float",
            TagKind::Double => "Double",
            TagKind::String => "String",
            TagKind::ByteArray => "ByteArray",
            TagKind::ShortArray => "ShortArray",
            TagKind::IntArray => "IntArray",
            TagKind::LongArray => "LongArray",
            TagKind::List => "List",
            TagKind::Compound => "Compound",
            TagKind::End => "End",
        }
    }
}

/// A node's `tag` is either one kind or an ordered set of kinds (tagged
/// union). Order is preserved; both backends emit branches in declared order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KindSet {
    One(TagKind),
    Many(Vec<TagKind>),
}

impl KindSet {
    pub fn iter(&self) -> impl Iterator<Item = TagKind> + '_ {
        match self {
            KindSet::One(k) => std::slice::from_ref(k).iter().copied(),
            KindSet::Many(ks) => ks.as_slice().iter().copied(),
        }
    }

    pub fn single(&self) -> Option<TagKind> {
        match self {
            KindSet::One(k) => Some(*k),
            KindSet::Many(ks) if ks.len() == 1 => Some(ks[0]),
            KindSet::Many(_) => None,
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// NODES
// ————————————————————————————————————————————————————————————————————————————

/// Wherever a node is expected, the boolean literals stand in for the
/// unconstrained (`true`) and uninhabited (`false`) schemas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Schema {
    Bool(bool),
    Node(Box<SchemaNode>),
}

impl Schema {
    pub fn node(node: SchemaNode) -> Schema {
        Schema::Node(Box::new(node))
    }

    pub fn as_node(&self) -> Option<&SchemaNode> {
        match self {
            Schema::Node(n) => Some(n),
            Schema::Bool(_) => None,
        }
    }
}

/// A list node's item declaration: absent (fully unknown), a single schema
/// (homogeneous), or an ordered sequence (tuple). The enum makes "at most one
/// of single/tuple" structural rather than checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Items {
    Tuple(Vec<Schema>),
    One(Box<Schema>),
}

/// One IR node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaNode {
    /// Tag kind(s). May be omitted for pure reference/combinator nodes.
    #[serde(rename = "tag", skip_serializing_if = "Option::is_none")]
    pub kind: Option<KindSet>,

    // ---- metadata ----
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Value>,
    /// Literal value set; order preserved end-to-end.
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    /// Optional human labels, parallel to `enum_values`.
    #[serde(rename = "enumLabels", skip_serializing_if = "Vec::is_empty")]
    pub enum_labels: Vec<String>,

    // ---- compound-only ----
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Schema>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(rename = "patternProperties", skip_serializing_if = "IndexMap::is_empty")]
    pub pattern_properties: IndexMap<String, Schema>,
    #[serde(
        rename = "additionalProperties",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<Schema>,

    // ---- list-only ----
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Items>,
    #[serde(rename = "minItems", skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u32>,
    #[serde(rename = "maxItems", skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u32>,

    // ---- references & combinators ----
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub ref_: Option<String>,
    #[serde(rename = "allOf", skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<Schema>,
    #[serde(rename = "oneOf", skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<Schema>,
}

impl SchemaNode {
    pub fn of_kind(kind: TagKind) -> SchemaNode {
        SchemaNode {
            kind: Some(KindSet::One(kind)),
            ..SchemaNode::default()
        }
    }

    pub fn single_kind(&self) -> Option<TagKind> {
        self.kind.as_ref().and_then(KindSet::single)
    }

    /// A node whose only content is a `$ref` (description allowed).
    pub fn is_pure_ref(&self) -> bool {
        self.ref_.is_some()
            && self.kind.is_none()
            && self.properties.is_empty()
            && self.pattern_properties.is_empty()
            && self.items.is_none()
            && self.all_of.is_empty()
            && self.one_of.is_empty()
            && self.enum_values.is_empty()
    }

    /// Names referenced by this node directly (`$ref` plus combinator refs).
    /// Used by the declaration backend's doc synthesis.
    pub fn referenced_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        if let Some(r) = &self.ref_ {
            out.push(r.as_str());
        }
        for s in self.all_of.iter().chain(self.one_of.iter()) {
            if let Some(n) = s.as_node() {
                if let Some(r) = &n.ref_ {
                    out.push(r.as_str());
                }
            }
        }
        out
    }
}

/// Catalog root: a node plus an identity and a fragment flag. Non-fragment
/// roots must have compound kind (checked by the catalog validation pass and
/// again by the declaration entry point).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedSchema {
    pub id: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fragment: bool,
    #[serde(flatten)]
    pub node: SchemaNode,
}

// ————————————————————————————————————————————————————————————————————————————
// PROPERTY-ORDER CANONICALIZATION
// ————————————————————————————————————————————————————————————————————————————

/// Keys pulled to the front of every schema object, in this order. Remaining
/// keys keep their original relative order.
const CANONICAL_FRONT: [&str; 6] = ["id", "title", "description", "tag", "required", "properties"];

/// Keys whose values are themselves schema objects (or maps/lists of them).
const SCHEMA_VALUED: [&str; 6] = [
    "properties",
    "patternProperties",
    "additionalProperties",
    "items",
    "allOf",
    "oneOf",
];

/// Produce a reordered clone of a schema rendered as JSON: front keys first,
/// everything else in original order. Pure and idempotent; never adds or
/// removes keys. Recurses only through schema-valued keys so literal payloads
/// (`default`, `examples`) are left byte-for-byte alone.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for key in CANONICAL_FRONT {
                if let Some(v) = map.get(key) {
                    out.insert(key.to_string(), canonicalize_member(key, v));
                }
            }
            for (key, v) in map {
                if !CANONICAL_FRONT.contains(&key.as_str()) {
                    out.insert(key.clone(), canonicalize_member(key, v));
                }
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}

fn canonicalize_member(key: &str, value: &Value) -> Value {
    if !SCHEMA_VALUED.contains(&key) {
        return value.clone();
    }
    match (key, value) {
        // name → schema maps: reorder each value, keep key order
        ("properties" | "patternProperties", Value::Object(map)) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k.clone(), canonicalize(v));
            }
            Value::Object(out)
        }
        (_, Value::Array(xs)) => Value::Array(xs.iter().map(canonicalize).collect()),
        (_, v) => canonicalize(v),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kinds_round_trip_wiki_names() {
        for k in TagKind::ALL {
            assert_eq!(TagKind::from_wiki_name(k.wiki_name()), Some(k));
        }
        assert_eq!(TagKind::from_wiki_name("quadruple"), None);
    }

    #[test]
    fn node_deserializes_from_catalog_json() {
        let src = json!({
            "tag": "compound",
            "description": "a thing",
            "properties": {
                "Flag": { "tag": "byte", "enum": [0, 1], "enumLabels": ["true", "false"] }
            },
            "required": ["Flag"]
        });
        let node: SchemaNode = serde_json::from_value(src).unwrap();
        assert_eq!(node.single_kind(), Some(TagKind::Compound));
        let flag = node.properties.get("Flag").unwrap().as_node().unwrap();
        assert_eq!(flag.enum_values, vec![json!(0), json!(1)]);
        assert_eq!(flag.enum_labels, vec!["true", "false"]);
    }

    #[test]
    fn kind_set_accepts_single_and_many() {
        let one: SchemaNode = serde_json::from_value(json!({ "tag": "byte" })).unwrap();
        assert_eq!(one.single_kind(), Some(TagKind::Byte));

        let many: SchemaNode = serde_json::from_value(json!({ "tag": ["byte", "short"] })).unwrap();
        let ks: Vec<_> = many.kind.as_ref().unwrap().iter().collect();
        assert_eq!(ks, vec![TagKind::Byte, TagKind::Short]);
        assert_eq!(many.single_kind(), None);
    }

    #[test]
    fn boolean_schemas_parse_in_node_position() {
        let node: SchemaNode = serde_json::from_value(json!({
            "tag": "compound",
            "properties": { "x": true, "y": false }
        }))
        .unwrap();
        assert_eq!(node.properties.get("x"), Some(&Schema::Bool(true)));
        assert_eq!(node.properties.get("y"), Some(&Schema::Bool(false)));
    }

    #[test]
    fn canonicalize_pulls_front_keys_and_is_idempotent() {
        let src = json!({
            "properties": { "b": { "description": "d", "tag": "byte" } },
            "extra": 1,
            "tag": "compound",
            "description": "x",
            "required": ["b"],
            "title": "T",
            "id": "Thing"
        });
        let once = canonicalize(&src);
        let keys: Vec<_> = once.as_object().unwrap().keys().cloned().collect();
        assert_eq!(
            keys,
            vec!["id", "title", "description", "tag", "required", "properties", "extra"]
        );
        // nested schema objects are reordered too
        let b_keys: Vec<_> = once["properties"]["b"]
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(b_keys, vec!["description", "tag"]);

        let twice = canonicalize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn canonicalize_never_changes_key_membership() {
        let src = json!({
            "tag": "compound",
            "default": { "z": 1, "a": 2 },
            "properties": {}
        });
        let out = canonicalize(&src);
        let mut before: Vec<_> = src.as_object().unwrap().keys().cloned().collect();
        let mut after: Vec<_> = out.as_object().unwrap().keys().cloned().collect();
        before.sort();
        after.sort();
        assert_eq!(before, after);
        // literal payloads are untouched, key order included
        assert_eq!(src["default"], out["default"]);
    }
}
