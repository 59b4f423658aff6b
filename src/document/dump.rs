//! Pretty printer.
//!
//! Homogeneous scalar arrays ("typed arrays") are printed on one line. The
//! classification happens here only; the runtime model has no typed-array
//! variant.
use super::Document;

const INDENT: &str = "  ";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypedArray { Bool, Int, Float, String }

/// Classify a non-empty array whose elements are all scalars of one kind.
/// Mixed int/float arrays count as `Float`.
pub fn typed_array(items: &[Document]) -> Option<TypedArray> {
    let mut kind = None;
    for item in items {
        let this = match item {
            Document::Bool(_) => TypedArray::Bool,
            Document::Int(_) => TypedArray::Int,
            Document::Float(_) => TypedArray::Float,
            Document::String(_) => TypedArray::String,
            _ => return None,
        };
        kind = match (kind, this) {
            (None, k) => Some(k),
            (Some(a), b) if a == b => Some(a),
            (Some(TypedArray::Int), TypedArray::Float) | (Some(TypedArray::Float), TypedArray::Int) => {
                Some(TypedArray::Float)
            }
            _ => return None,
        };
    }
    kind
}

/// Render as indented JSON.
pub fn dump(doc: &Document) -> String {
    let mut out = String::new();
    write_node(doc, 0, &mut out);
    out
}

fn write_node(doc: &Document, level: usize, out: &mut String) {
    match doc {
        Document::Array(items) if items.is_empty() => out.push_str("[]"),
        Document::Array(items) if typed_array(items).is_some() => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 { out.push_str(", "); }
                out.push_str(&item.to_string());
            }
            out.push(']');
        }
        Document::Array(items) => {
            out.push_str("[\n");
            for (i, item) in items.iter().enumerate() {
                push_indent(level + 1, out);
                write_node(item, level + 1, out);
                if i + 1 < items.len() { out.push(','); }
                out.push('\n');
            }
            push_indent(level, out);
            out.push(']');
        }
        Document::Object(map) if map.is_empty() => out.push_str("{}"),
        Document::Object(map) => {
            out.push_str("{\n");
            for (i, (key, value)) in map.iter().enumerate() {
                push_indent(level + 1, out);
                out.push_str(&Document::String(key.clone()).to_string());
                out.push_str(": ");
                write_node(value, level + 1, out);
                if i + 1 < map.len() { out.push(','); }
                out.push('\n');
            }
            push_indent(level, out);
            out.push('}');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn push_indent(level: usize, out: &mut String) {
    for _ in 0..level { out.push_str(INDENT); }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_typed_arrays() {
        let ints: Vec<Document> = vec![Document::Int(1), Document::Int(2)];
        assert_eq!(typed_array(&ints), Some(TypedArray::Int));
        let mixed = vec![Document::Int(1), Document::Float(2.5)];
        assert_eq!(typed_array(&mixed), Some(TypedArray::Float));
        let hetero = vec![Document::Int(1), Document::from("x")];
        assert_eq!(typed_array(&hetero), None);
        assert_eq!(typed_array(&[Document::Null]), None);
    }

    #[test]
    fn typed_arrays_print_inline() {
        let d = Document::from(json!({"size": [1, 2, 3], "tags": [], "rows": [{"a": true}]}));
        let text = dump(&d);
        assert_eq!(
            text,
            "{\n  \"size\": [1, 2, 3],\n  \"tags\": [],\n  \"rows\": [\n    {\n      \"a\": true\n    }\n  ]\n}"
        );
        // still valid JSON
        let back: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(Document::from(back), d);
    }
}
