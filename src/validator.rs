//! Validation-schema backend: IR → a JSON-Schema-shaped validator tree.
//!
//! Serialized NBT documents (in their JSON transport form) wrap every value
//! as `{ "type": <kind>, "value": <payload> }`. The converter mirrors that:
//! every kind-bearing node becomes an object schema requiring exactly those
//! two members, with the `value` shape driven by the kind.
//!
//! Missing references and unsupported kinds are fatal here — this backend
//! exists to validate, so an incomplete catalog is an error, never a
//! placeholder.

use serde_json::{json, Value};

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::resolve::{self, ResolveOptions};
use crate::schema::{Items, KindSet, Schema, SchemaNode, TagKind};

#[derive(Debug, Clone, Copy)]
pub struct ValidatorOptions {
    /// Inline referenced shapes (default). When false, references are kept
    /// as symbolic `$ref` pointers into a definitions section.
    pub inline_references: bool,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        ValidatorOptions {
            inline_references: true,
        }
    }
}

/// Convert the named root `name`.
pub fn validator_for(name: &str, catalog: &Catalog, opts: ValidatorOptions) -> Result<Value> {
    let named = catalog.resolve_name(name)?;
    to_validator(&named.node, catalog, opts)
}

/// Convert an arbitrary node. Pure; the input tree is read-only.
pub fn to_validator(node: &SchemaNode, catalog: &Catalog, opts: ValidatorOptions) -> Result<Value> {
    let mut visited = Vec::new();
    convert_node(node, catalog, opts, &mut visited)
}

fn convert_schema(
    schema: &Schema,
    catalog: &Catalog,
    opts: ValidatorOptions,
    visited: &mut Vec<String>,
) -> Result<Value> {
    match schema {
        // JSON Schema's boolean forms carry the same any/never meaning
        Schema::Bool(b) => Ok(Value::Bool(*b)),
        Schema::Node(node) => convert_node(node, catalog, opts, visited),
    }
}

fn convert_node(
    node: &SchemaNode,
    catalog: &Catalog,
    opts: ValidatorOptions,
    visited: &mut Vec<String>,
) -> Result<Value> {
    // references first
    if let Some(name) = &node.ref_ {
        let named = catalog.resolve_name(name)?;
        if !opts.inline_references {
            let pointer = json!({ "$ref": format!("#/definitions/{}", named.id) });
            if node.is_pure_ref() {
                return Ok(pointer);
            }
            let mut own = node.clone();
            own.ref_ = None;
            let own_schema = convert_node(&own, catalog, opts, visited)?;
            return Ok(json!({ "allOf": [pointer, own_schema] }));
        }
        if visited.iter().any(|n| n == &named.id) {
            return Err(Error::ReferenceCycle(named.id.clone()));
        }
        visited.push(named.id.clone());
        let merged = resolve::merge_ref(node, &named.node);
        let out = convert_node(&merged, catalog, opts, visited);
        visited.pop();
        return out;
    }

    // combinators wrap the node's own (kind-bearing) shape
    if !node.all_of.is_empty() || !node.one_of.is_empty() {
        let mut own = node.clone();
        own.all_of = Vec::new();
        own.one_of = Vec::new();
        let own_schema = if own.kind.is_some() {
            Some(convert_node(&own, catalog, opts, visited)?)
        } else {
            None
        };

        if !node.one_of.is_empty() {
            let mut arms: Vec<Value> = own_schema.into_iter().collect();
            for s in &node.one_of {
                arms.push(convert_schema(s, catalog, opts, visited)?);
            }
            return Ok(json!({ "oneOf": arms }));
        }
        let mut parts: Vec<Value> = own_schema.into_iter().collect();
        for s in &node.all_of {
            parts.push(convert_schema(s, catalog, opts, visited)?);
        }
        return Ok(json!({ "allOf": parts }));
    }

    match &node.kind {
        None => Ok(Value::Bool(true)),
        Some(KindSet::One(kind)) => convert_kind(node, *kind, catalog, opts, visited),
        Some(KindSet::Many(kinds)) => {
            if kinds.len() == 1 {
                return convert_kind(node, kinds[0], catalog, opts, visited);
            }
            let arms = kinds
                .iter()
                .map(|k| convert_kind(node, *k, catalog, opts, visited))
                .collect::<Result<Vec<_>>>()?;
            Ok(json!({ "oneOf": arms }))
        }
    }
}

/// One `{type, value}` wrapper for a single kind.
fn convert_kind(
    node: &SchemaNode,
    kind: TagKind,
    catalog: &Catalog,
    opts: ValidatorOptions,
    visited: &mut Vec<String>,
) -> Result<Value> {
    let value = if node.enum_values.is_empty() {
        kind_value(node, kind, catalog, opts, visited)?
    } else {
        // an enum narrows the payload to exactly the declared literals
        json!({ "enum": node.enum_values })
    };

    let mut wrapper = json!({
        "type": "object",
        "properties": {
            "type": { "const": kind.wiki_name() },
            "value": value,
        },
        "required": ["type", "value"],
    });
    if let Some(desc) = &node.description {
        wrapper["description"] = Value::from(desc.clone());
    }
    Ok(wrapper)
}

fn convert_items(
    node: &SchemaNode,
    catalog: &Catalog,
    opts: ValidatorOptions,
    visited: &mut Vec<String>,
) -> Result<Value> {
    let mut out = json!({ "type": "array" });
    match &node.items {
        None => {}
        Some(Items::One(item)) => {
            out["items"] = convert_schema(item, catalog, opts, visited)?;
        }
        Some(Items::Tuple(items)) => {
            let prefix = items
                .iter()
                .map(|s| convert_schema(s, catalog, opts, visited))
                .collect::<Result<Vec<_>>>()?;
            out["prefixItems"] = Value::Array(prefix);
            out["maxItems"] = Value::from(items.len() as u32);
        }
    }
    if let Some(mn) = node.min_items {
        out["minItems"] = Value::from(mn);
    }
    if let Some(mx) = node.max_items {
        out["maxItems"] = Value::from(mx);
    }
    Ok(out)
}

/// The per-kind `value` shape. The dispatcher enumerates exactly the
/// convertible kinds; anything else is fatal.
fn kind_value(
    node: &SchemaNode,
    kind: TagKind,
    catalog: &Catalog,
    opts: ValidatorOptions,
    visited: &mut Vec<String>,
) -> Result<Value> {
    let value = match kind {
        TagKind::Byte => bounded_int(-128, 127),
        TagKind::Short => bounded_int(-32_768, 32_767),
        TagKind::Int => bounded_int(-2_147_483_648, 2_147_483_647),
        TagKind::Float | TagKind::Double => json!({ "type": "number" }),
        // 64-bit values travel as (high, low) 32-bit halves
        TagKind::Long => long_pair(),
        TagKind::String => json!({ "type": "string" }),
        TagKind::ByteArray => number_array(bounded_int(-128, 127)),
        TagKind::ShortArray => number_array(bounded_int(-32_768, 32_767)),
        TagKind::IntArray => number_array(bounded_int(-2_147_483_648, 2_147_483_647)),
        TagKind::LongArray => number_array(long_pair()),
        TagKind::List => {
            // a list payload is itself a {type, value} pair with a loose type
            json!({
                "type": "object",
                "properties": {
                    "type": { "type": "string" },
                    "value": convert_items(node, catalog, opts, visited)?,
                },
                "required": ["type", "value"],
            })
        }
        TagKind::Compound => {
            let mut props = serde_json::Map::new();
            for (name, schema) in &node.properties {
                props.insert(name.clone(), convert_schema(schema, catalog, opts, visited)?);
            }
            let mut out = json!({ "type": "object", "properties": props });
            if !node.required.is_empty() {
                out["required"] = Value::from(node.required.clone());
            }
            if !node.pattern_properties.is_empty() {
                let mut pat = serde_json::Map::new();
                for (rx, schema) in &node.pattern_properties {
                    pat.insert(rx.clone(), convert_schema(schema, catalog, opts, visited)?);
                }
                out["patternProperties"] = Value::Object(pat);
            }
            // permissive by default
            out["additionalProperties"] = match &node.additional_properties {
                None => Value::Bool(true),
                Some(extra) => convert_schema(extra, catalog, opts, visited)?,
            };
            out
        }
        TagKind::End => return Err(Error::UnsupportedKind(TagKind::End)),
    };
    Ok(value)
}

fn bounded_int(min: i64, max: i64) -> Value {
    json!({ "type": "integer", "minimum": min, "maximum": max })
}

fn long_pair() -> Value {
    json!({
        "type": "array",
        "items": { "type": "integer" },
        "minItems": 2,
        "maxItems": 2,
    })
}

fn number_array(item: Value) -> Value {
    json!({ "type": "array", "items": item })
}
