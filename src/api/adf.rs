//! Atlassian Document Format (ADF) conversion.
//!
//! API v3 carries descriptions and comment bodies as ADF trees, v2 as plain
//! strings. Reads accept either shape; writes produce ADF only for v3.

use serde_json::{json, Value};

/// Flatten a rich-text field into plain text.
///
/// Accepts a plain string, a `{"raw": ...}` wrapper, or an ADF `doc` node.
/// Anything else renders as an empty string.
pub fn to_plain_text(value: &Value) -> String {
    if let Some(text) = value.as_str() {
        return text.to_string();
    }
    if let Some(raw) = value.get("raw").and_then(Value::as_str) {
        return raw.to_string();
    }
    if value.get("type").and_then(Value::as_str) != Some("doc") {
        return String::new();
    }

    let mut out = String::new();
    walk_children(value, &mut out);
    out.trim().to_string()
}

fn walk_children(node: &Value, out: &mut String) {
    if let Some(children) = node.get("content").and_then(Value::as_array) {
        for child in children {
            walk(child, out);
        }
    }
}

fn walk(node: &Value, out: &mut String) {
    match node.get("type").and_then(Value::as_str) {
        Some("text") => {
            if let Some(text) = node.get("text").and_then(Value::as_str) {
                out.push_str(text);
            }
        }
        Some("hardBreak") => out.push('\n'),
        Some("mention") => {
            if let Some(text) = node.pointer("/attrs/text").and_then(Value::as_str) {
                if !text.starts_with('@') {
                    out.push('@');
                }
                out.push_str(text);
            }
        }
        Some("emoji") => {
            if let Some(short) = node.pointer("/attrs/shortName").and_then(Value::as_str) {
                out.push_str(short);
            }
        }
        Some("listItem") => {
            out.push_str("- ");
            walk_children(node, out);
            end_line(out);
        }
        Some("paragraph" | "heading" | "blockquote" | "codeBlock") => {
            walk_children(node, out);
            end_line(out);
        }
        Some("mediaGroup" | "mediaSingle" | "inlineCard") => {}
        _ => walk_children(node, out),
    }
}

fn end_line(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

/// Encode plain text as an ADF document.
///
/// Blank lines separate paragraphs; single newlines become hard breaks.
pub fn from_plain_text(text: &str) -> Value {
    let paragraphs: Vec<Value> = text
        .split("\n\n")
        .map(|block| block.trim_matches('\n'))
        .filter(|block| !block.trim().is_empty())
        .map(|block| {
            let mut inline = Vec::new();
            for (i, line) in block.split('\n').enumerate() {
                if i > 0 {
                    inline.push(json!({"type": "hardBreak"}));
                }
                if !line.is_empty() {
                    inline.push(json!({"type": "text", "text": line}));
                }
            }
            json!({"type": "paragraph", "content": inline})
        })
        .collect();

    json!({"version": 1, "type": "doc", "content": paragraphs})
}

/// Render an arbitrary field value (custom fields mostly) as one line of text.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => {
            if map.get("type").and_then(Value::as_str) == Some("doc") {
                return to_plain_text(value);
            }
            ["value", "name", "displayName", "key"]
                .iter()
                .find_map(|field| map.get(*field).and_then(Value::as_str))
                .map(str::to_string)
                .unwrap_or_else(|| value.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_string_passes_through() {
        assert_eq!(to_plain_text(&json!("hello\nworld")), "hello\nworld");
    }

    #[test]
    fn test_raw_wrapper() {
        assert_eq!(to_plain_text(&json!({"raw": "wiki *markup*"})), "wiki *markup*");
    }

    #[test]
    fn test_flattens_paragraphs() {
        let doc = json!({
            "type": "doc",
            "content": [
                {"type": "paragraph", "content": [{"type": "text", "text": "Hello"}]},
                {"type": "paragraph", "content": [{"type": "text", "text": "World"}]}
            ]
        });
        assert_eq!(to_plain_text(&doc), "Hello\nWorld");
    }

    #[test]
    fn test_lists_mentions_and_breaks() {
        let doc = json!({
            "type": "doc",
            "content": [
                {"type": "paragraph", "content": [
                    {"type": "text", "text": "ping "},
                    {"type": "mention", "attrs": {"text": "@alice"}},
                    {"type": "hardBreak"},
                    {"type": "text", "text": "next"}
                ]},
                {"type": "bulletList", "content": [
                    {"type": "listItem", "content": [
                        {"type": "paragraph", "content": [{"type": "text", "text": "one"}]}
                    ]},
                    {"type": "listItem", "content": [
                        {"type": "paragraph", "content": [{"type": "text", "text": "two"}]}
                    ]}
                ]}
            ]
        });
        assert_eq!(to_plain_text(&doc), "ping @alice\nnext\n- one\n- two");
    }

    #[test]
    fn test_non_doc_object_is_empty() {
        assert_eq!(to_plain_text(&json!({"type": "paragraph"})), "");
        assert_eq!(to_plain_text(&Value::Null), "");
    }

    #[test]
    fn test_from_plain_text_builds_paragraphs() {
        let doc = from_plain_text("first line\nsecond line\n\nnew paragraph");
        assert_eq!(doc["type"], "doc");
        assert_eq!(doc["version"], 1);
        let content = doc["content"].as_array().unwrap();
        assert_eq!(content.len(), 2);
        assert_eq!(content[0]["content"][1]["type"], "hardBreak");
        assert_eq!(content[1]["content"][0]["text"], "new paragraph");
    }

    #[test]
    fn test_from_plain_text_reads_back() {
        let text = "Steps\nto reproduce\n\nExpected: works";
        assert_eq!(to_plain_text(&from_plain_text(text)), "Steps\nto reproduce\nExpected: works");
    }

    #[test]
    fn test_display_value_shapes() {
        assert_eq!(display_value(&json!(3.5)), "3.5");
        assert_eq!(display_value(&json!({"value": "High"})), "High");
        assert_eq!(display_value(&json!([{"name": "api"}, {"name": "ui"}])), "api, ui");
        assert_eq!(display_value(&Value::Null), "");
    }
}
