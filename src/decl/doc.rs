//! Structured doc-comment synthesis for emitted members.
//!
//! Each member's comment is assembled in a fixed order: title, description,
//! cross-references to origin, default, examples, and (when both are
//! declared) the enum/label bullet list. Scalar defaults/examples inline on
//! one line; structured values get a block-indented pretty rendering. 64-bit
//! values render as an explicit `(high, low)` pair.

use serde_json::Value;

use crate::schema::{SchemaNode, TagKind};

const VALUE_INDENT: &str = "    ";

/// Comment lines (without comment syntax) for one schema node. Empty when
/// the node carries no documentation metadata at all.
pub fn doc_lines(node: &SchemaNode) -> Vec<String> {
    let mut lines = Vec::new();

    if let Some(title) = &node.title {
        lines.push(title.clone());
    }
    if let Some(description) = &node.description {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.extend(description.lines().map(str::to_string));
    }
    for name in node.referenced_names() {
        lines.push(format!("@see {name}"));
    }
    if let Some(default) = &node.default {
        push_valued(&mut lines, "Default", default, node);
    }
    for example in &node.examples {
        push_valued(&mut lines, "Example", example, node);
    }
    if !node.enum_values.is_empty() && !node.enum_labels.is_empty() {
        for (value, label) in node.enum_values.iter().zip(&node.enum_labels) {
            lines.push(format!("- `{}`: {label}", compact(value)));
        }
    }
    lines
}

fn push_valued(lines: &mut Vec<String>, label: &str, value: &Value, node: &SchemaNode) {
    if node.single_kind() == Some(TagKind::Long) {
        if let Some((high, low)) = as_long_pair(value) {
            lines.push(format!("{label}: ({high}, {low})"));
            return;
        }
    }
    if is_simple(value) {
        lines.push(format!("{label}: {}", compact(value)));
    } else {
        lines.push(format!("{label}:"));
        let pretty = serde_json::to_string_pretty(value).unwrap_or_default();
        for line in pretty.lines() {
            lines.push(format!("{VALUE_INDENT}{line}"));
        }
    }
}

fn is_simple(value: &Value) -> bool {
    matches!(
        value,
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_)
    )
}

fn compact(value: &Value) -> String {
    match value {
        Value::String(s) => format!("{s:?}"),
        other => other.to_string(),
    }
}

fn as_long_pair(value: &Value) -> Option<(i64, i64)> {
    let pair = value.as_array()?;
    if pair.len() != 2 {
        return None;
    }
    Some((pair[0].as_i64()?, pair[1].as_i64()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(v: serde_json::Value) -> SchemaNode {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn lines_assemble_in_fixed_order() {
        let lines = doc_lines(&node(json!({
            "tag": "byte",
            "title": "Flag",
            "description": "Whether the thing is on.",
            "default": 1,
            "enum": [0, 1],
            "enumLabels": ["off", "on"]
        })));
        assert_eq!(
            lines,
            vec![
                "Flag",
                "",
                "Whether the thing is on.",
                "Default: 1",
                "- `0`: off",
                "- `1`: on",
            ]
        );
    }

    #[test]
    fn long_default_renders_as_high_low_pair() {
        let lines = doc_lines(&node(json!({
            "tag": "long",
            "default": [12, 345]
        })));
        assert_eq!(lines, vec!["Default: (12, 345)"]);
    }

    #[test]
    fn structured_default_is_block_indented() {
        let lines = doc_lines(&node(json!({
            "tag": "compound",
            "default": { "x": 1 }
        })));
        assert_eq!(lines[0], "Default:");
        assert!(lines[1].starts_with(VALUE_INDENT));
    }

    #[test]
    fn cross_references_name_the_origin() {
        let lines = doc_lines(&node(json!({ "$ref": "Entity_Base" })));
        assert_eq!(lines, vec!["@see Entity_Base"]);
    }

    #[test]
    fn enum_without_labels_emits_no_bullets() {
        let lines = doc_lines(&node(json!({ "tag": "byte", "enum": [0, 1] })));
        assert!(lines.is_empty());
    }
}
