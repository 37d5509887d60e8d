//! Thin structural-type printer (TypeScript-flavored syntax).
//!
//! Everything with algorithmic weight happens in `decl::shape`; this module
//! only turns a [`Shape`] into text. Swapping the concrete syntax means
//! swapping this file.

use serde_json::Value;

use super::shape::{Discriminant, IndexMember, KeySig, Member, Record, Shape};

const INDENT: &str = "    ";

/// One top-level declaration. Records become interfaces, everything else a
/// type alias.
pub fn declaration(name: &str, shape: &Shape, doc: &[String]) -> String {
    let mut out = String::new();
    out.push_str(&doc_block(doc, 0));
    match shape {
        Shape::Record(record) => {
            out.push_str(&format!("export interface {name} {}", record_text(record, 0)));
        }
        other => {
            out.push_str(&format!("export type {name} = {};", type_text(other, 0)));
        }
    }
    out
}

pub fn type_text(shape: &Shape, depth: usize) -> String {
    match shape {
        Shape::Number => "number".to_string(),
        Shape::Str => "string".to_string(),
        Shape::Unknown => "unknown".to_string(),
        Shape::Never => "never".to_string(),
        Shape::Named(name) => name.clone(),
        Shape::Literal(value) => literal_text(value),
        Shape::Tuple(elems) => {
            let inner: Vec<String> = elems.iter().map(|s| type_text(s, depth)).collect();
            format!("[{}]", inner.join(", "))
        }
        Shape::Array(item) => {
            let inner = type_text(item, depth);
            if needs_parens(item) {
                format!("({inner})[]")
            } else {
                format!("{inner}[]")
            }
        }
        Shape::Union(arms) => arms
            .iter()
            .map(|s| type_text(s, depth))
            .collect::<Vec<_>>()
            .join(" | "),
        Shape::Intersection(parts) => parts
            .iter()
            .map(|s| {
                let text = type_text(s, depth);
                if matches!(s, Shape::Union(_)) {
                    format!("({text})")
                } else {
                    text
                }
            })
            .collect::<Vec<_>>()
            .join(" & "),
        Shape::Wrapper { kind, value } => {
            format!(
                "{{ type: {}; value: {} }}",
                discriminant_text(kind),
                type_text(value, depth)
            )
        }
        Shape::Record(record) => record_text(record, depth),
    }
}

fn discriminant_text(kind: &Discriminant) -> String {
    match kind {
        Discriminant::Loose => "string".to_string(),
        Discriminant::Kinds(kinds) => kinds
            .iter()
            .map(|k| format!("{:?}", k.wiki_name()))
            .collect::<Vec<_>>()
            .join(" | "),
    }
}

fn record_text(record: &Record, depth: usize) -> String {
    if record.members.is_empty() && record.index.is_empty() {
        return "{}".to_string();
    }
    let pad = INDENT.repeat(depth + 1);
    let mut out = String::from("{\n");
    for member in &record.members {
        out.push_str(&member_text(member, depth + 1));
    }
    for index in &record.index {
        out.push_str(&format!(
            "{pad}{}: {};\n",
            key_sig_text(&index.key),
            type_text(&index.shape, depth + 1)
        ));
    }
    out.push_str(&INDENT.repeat(depth));
    out.push('}');
    out
}

fn member_text(member: &Member, depth: usize) -> String {
    let pad = INDENT.repeat(depth);
    let mut out = doc_block(&member.doc, depth);
    let marker = if member.optional { "?" } else { "" };
    out.push_str(&format!(
        "{pad}{}{marker}: {};\n",
        member_name(&member.name),
        type_text(&member.shape, depth)
    ));
    out
}

fn member_name(name: &str) -> String {
    if is_identifier(name) {
        name.to_string()
    } else {
        format!("{name:?}")
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn key_sig_text(key: &KeySig) -> String {
    match key {
        KeySig::Number => "[key: number]".to_string(),
        KeySig::Str => "[key: string]".to_string(),
        KeySig::Template { prefix, suffix } => {
            format!("[key: `{prefix}${{number}}{suffix}`]")
        }
    }
}

fn doc_block(lines: &[String], depth: usize) -> String {
    if lines.is_empty() {
        return String::new();
    }
    let pad = INDENT.repeat(depth);
    let mut out = format!("{pad}/**\n");
    for line in lines {
        if line.is_empty() {
            out.push_str(&format!("{pad} *\n"));
        } else {
            out.push_str(&format!("{pad} * {line}\n"));
        }
    }
    out.push_str(&format!("{pad} */\n"));
    out
}

/// Literal types: strings quoted, scalars verbatim, arrays as tuples of
/// literals.
fn literal_text(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("{s:?}"),
        Value::Array(xs) => {
            let inner: Vec<String> = xs.iter().map(literal_text).collect();
            format!("[{}]", inner.join(", "))
        }
        Value::Object(map) => {
            let inner: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{k:?}: {}", literal_text(v)))
                .collect();
            format!("{{ {} }}", inner.join("; "))
        }
    }
}

fn needs_parens(shape: &Shape) -> bool {
    matches!(shape, Shape::Union(_) | Shape::Intersection(_))
}
