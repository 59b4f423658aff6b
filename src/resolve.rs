//! Local `$ref` resolution.
//!
//! Only same-document pointers (`#`, `#/definitions/Port`) are supported.
//! Resolution walks object keys one at a time; a missing key or a non-object
//! intermediate yields `None`.
use std::borrow::Cow;

use thiserror::Error;

use crate::document::{Document, Map};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("unresolved reference '{0}'")]
    Unresolved(String),
    #[error("reference depth limit ({limit}) exceeded while following '{reference}'")]
    DepthExceeded { reference: String, limit: usize },
}

pub fn resolve<'a>(root: &'a Document, pointer: &str) -> Option<&'a Document> {
    let rest = pointer.strip_prefix('#')?;
    if rest.is_empty() {
        return Some(root);
    }
    let rest = rest.strip_prefix('/')?;
    let mut node = root;
    for raw in rest.split('/') {
        let key = raw.replace("~1", "/").replace("~0", "~");
        node = node.as_object()?.get(&key)?;
    }
    Some(node)
}

pub fn ref_of(node: &Document) -> Option<&str> {
    node.get("$ref").and_then(Document::as_str)
}

/// Last pointer segment, used as a fallback label (`#/$defs/Circle` → `Circle`).
pub fn ref_name(reference: &str) -> Option<&str> {
    reference.rsplit('/').next().filter(|s| !s.is_empty() && *s != "#")
}

/// References followed from `node`, outermost first, stopping at a repeat,
/// an unresolved target or `max_hops`.
pub fn ref_chain<'a>(root: &'a Document, node: &'a Document, max_hops: usize) -> Vec<&'a str> {
    let mut chain: Vec<&'a str> = Vec::new();
    let mut current = node;
    while let Some(reference) = ref_of(current) {
        if chain.len() >= max_hops || chain.contains(&reference) {
            break;
        }
        chain.push(reference);
        let Some(target) = resolve(root, reference) else { break };
        current = target;
    }
    chain
}

/// View of `node` with its `$ref` chain followed.
///
/// Keywords written next to a `$ref` (notably `default`) are overlaid on the
/// resolved target, the outermost node winning, so `{"$ref": .., "default": x}`
/// still contributes `x`. Nodes without `$ref` are returned borrowed.
pub fn deref_schema<'a>(
    root: &'a Document,
    node: &'a Document,
    max_hops: usize,
) -> Result<Cow<'a, Document>, ResolveError> {
    let mut current: Cow<'a, Document> = Cow::Borrowed(node);
    let mut hops = 0;
    loop {
        let Some(reference) = ref_of(&current).map(str::to_string) else {
            return Ok(current);
        };
        hops += 1;
        if hops > max_hops {
            return Err(ResolveError::DepthExceeded { reference, limit: max_hops });
        }
        let target = resolve(root, &reference)
            .ok_or_else(|| ResolveError::Unresolved(reference.clone()))?;

        let siblings: Vec<(String, Document)> = current
            .as_object()
            .map(|m| {
                m.iter()
                    .filter(|(k, _)| k.as_str() != "$ref")
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default();

        current = if siblings.is_empty() {
            Cow::Borrowed(target)
        } else {
            let mut merged = match target {
                Document::Object(m) => m.clone(),
                _ => Map::new(),
            };
            for (k, v) in siblings {
                merged.insert(k, v);
            }
            Cow::Owned(Document::Object(merged))
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Document {
        Document::from(json!({
            "definitions": {
                "port": {"type": "integer", "minimum": 1},
                "a/b": {"type": "string"},
                "alias": {"$ref": "#/definitions/port"},
                "loop": {"$ref": "#/definitions/loop"}
            },
            "items": [{"type": "null"}]
        }))
    }

    #[test]
    fn resolves_local_pointers_only() {
        let root = schema();
        assert_eq!(
            resolve(&root, "#/definitions/port").and_then(|n| n.get("minimum")),
            Some(&Document::Int(1))
        );
        assert!(resolve(&root, "#/definitions/a~1b").is_some());
        assert_eq!(resolve(&root, "#"), Some(&root));
        assert!(resolve(&root, "#/definitions/missing").is_none());
        assert!(resolve(&root, "other.json#/definitions/port").is_none());
        // arrays are not walked
        assert!(resolve(&root, "#/items/0").is_none());
    }

    #[test]
    fn deref_overlays_sibling_keywords() {
        let root = schema();
        let node = Document::from(json!({"$ref": "#/definitions/alias", "default": 8080}));
        let view = deref_schema(&root, &node, 8).unwrap();
        assert_eq!(view.get("default"), Some(&Document::Int(8080)));
        assert_eq!(view.get("type"), Some(&Document::from("integer")));
        assert!(view.get("$ref").is_none());
    }

    #[test]
    fn deref_reports_cycles_and_misses() {
        let root = schema();
        let cyclic = Document::from(json!({"$ref": "#/definitions/loop"}));
        assert!(matches!(deref_schema(&root, &cyclic, 8), Err(ResolveError::DepthExceeded { .. })));
        let missing = Document::from(json!({"$ref": "#/nope"}));
        assert_eq!(
            deref_schema(&root, &missing, 8).unwrap_err(),
            ResolveError::Unresolved("#/nope".into())
        );
    }

    #[test]
    fn ref_chain_follows_aliases_and_stops_at_loops() {
        let root = schema();
        let alias = Document::from(json!({"$ref": "#/definitions/alias"}));
        assert_eq!(ref_chain(&root, &alias, 8), vec!["#/definitions/alias", "#/definitions/port"]);
        let cyclic = Document::from(json!({"$ref": "#/definitions/loop"}));
        assert_eq!(ref_chain(&root, &cyclic, 8), vec!["#/definitions/loop"]);
        assert!(ref_chain(&root, &Document::from(json!({"type": "string"})), 8).is_empty());
    }

    #[test]
    fn ref_names() {
        assert_eq!(ref_name("#/$defs/Circle"), Some("Circle"));
        assert_eq!(ref_name("#"), None);
    }
}
