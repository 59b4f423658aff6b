//! Defaults populator.
//!
//! Produces a copy of a document with schema `default`s filled in for absent
//! object keys. Values the user wrote are never replaced; only missing keys
//! are added. Nested objects, array items, `$ref`, `allOf` and `anyOf`/`oneOf`
//! are followed. An alternative is picked by its discriminator tag, else by
//! how well the document fits it once that alternative's defaults are in.
//!
//! Filling repeats until a pass changes nothing, so the result is a fixed
//! point and `apply_defaults` is idempotent.
use crate::compose;
use crate::document::{Document, Map};
use crate::options::ValidatorOptions;
use crate::path::Path;
use crate::resolve;
use crate::validate::{self, Validator};

const MAX_PASSES: usize = 16;

pub fn apply_defaults(data: &Document, root: &Document) -> Document {
    apply_defaults_with(data, root, &ValidatorOptions::default())
}

pub fn apply_defaults_with(data: &Document, root: &Document, options: &ValidatorOptions) -> Document {
    let populator = Populator { v: Validator::new(root, options) };
    let trail = vec!["#".to_string()];
    let mut out = if data.is_null() {
        populator.fill_root(root, &trail)
    } else {
        populator.fill(data, root, &Path::root(), 0, &trail)
    };
    for pass in 1..MAX_PASSES {
        let next = populator.fill(&out, root, &Path::root(), 0, &trail);
        if next.canonical() == out.canonical() {
            tracing::trace!(passes = pass, "defaults settled");
            return out;
        }
        out = next;
    }
    tracing::warn!(passes = MAX_PASSES, "defaults still changing, returning last pass");
    out
}

struct Populator<'a> {
    v: Validator<'a>,
}

impl Populator<'_> {
    /// A `null` root counts as absent: use the root default, or build an
    /// object from the property defaults.
    fn fill_root(&self, root: &Document, trail: &[String]) -> Document {
        self.synthesize(root, &Path::root(), trail).unwrap_or(Document::Null)
    }

    /// `hops` counts schema indirections at this node (`$ref`, composition)
    /// and resets for children. `trail` holds the `$ref`s entered on the way
    /// down from the root.
    fn fill(&self, data: &Document, node: &Document, path: &Path, hops: usize, trail: &[String]) -> Document {
        let max = self.v.options().max_ref_depth;
        if hops > max {
            return data.clone();
        }
        let Ok(view) = resolve::deref_schema(self.v.root(), node, max) else {
            return data.clone();
        };
        let Some(schema) = view.as_object() else {
            return data.clone();
        };
        if !data.is_object() && !data.is_array() {
            return data.clone();
        }
        let trail = extended(trail, &resolve::ref_chain(self.v.root(), node, max));

        let mut out = data.clone();
        match &mut out {
            Document::Object(map) => self.fill_object(map, schema, path, &trail),
            Document::Array(items) => self.fill_array(items, schema, path, &trail),
            _ => {}
        }

        if let Some(Document::Array(branches)) = schema.get("allOf") {
            for branch in branches {
                out = self.fill(&out, branch, path, hops + 1, &trail);
            }
        }
        for keyword in ["anyOf", "oneOf"] {
            let Some(Document::Array(alternatives)) = schema.get(keyword) else { continue };
            let picked = match compose::discriminated(&self.v, &out, alternatives) {
                Some(i) => Some((i, self.fill(&out, &alternatives[i], path, hops + 1, &trail))),
                None => self.closest(&out, alternatives, path, hops + 1, &trail),
            };
            if let Some((i, filled)) = picked {
                tracing::debug!(%path, keyword, alternative = i, "defaults dispatched to alternative");
                out = filled;
            }
        }
        out
    }

    /// Fill `data` through every alternative and keep the result with the
    /// fewest errors against its own alternative, the first one on ties.
    fn closest(
        &self,
        data: &Document,
        alternatives: &[Document],
        path: &Path,
        hops: usize,
        trail: &[String],
    ) -> Option<(usize, Document)> {
        alternatives.iter()
            .enumerate()
            .map(|(i, alternative)| {
                let filled = self.fill(data, alternative, path, hops, trail);
                let errors = self.v.check(&filled, alternative, path, 0).iter().filter(|d| d.is_error()).count();
                (errors, i, filled)
            })
            .min_by_key(|(errors, i, _)| (*errors, *i))
            .map(|(_, i, filled)| (i, filled))
    }

    fn fill_object(&self, map: &mut Map, schema: &Map, path: &Path, trail: &[String]) {
        let properties = schema.get("properties").and_then(Document::as_object);
        if let Some(properties) = properties {
            for (name, sub) in properties {
                let child = path.key(name.as_str());
                match map.get(name) {
                    Some(present) => {
                        let filled = self.fill(present, sub, &child, 0, trail);
                        map.insert(name.clone(), filled);
                    }
                    None => {
                        if let Some(value) = self.synthesize(sub, &child, trail) {
                            map.insert(name.clone(), value);
                        }
                    }
                }
            }
        }

        let patterns: Vec<(regex::Regex, &Document)> = schema.get("patternProperties")
            .and_then(Document::as_object)
            .map(|ps| {
                ps.iter()
                    .filter_map(|(source, sub)| validate::compile_regex(source).map(|rx| (rx, sub)))
                    .collect()
            })
            .unwrap_or_default();
        let additional = schema.get("additionalProperties").filter(|a| a.is_object());
        if patterns.is_empty() && additional.is_none() {
            return;
        }

        let extra: Vec<String> = map.keys()
            .filter(|k| !properties.is_some_and(|p| p.contains_key(k.as_str())))
            .cloned()
            .collect();
        for key in extra {
            let child = path.key(key.as_str());
            let Some(mut value) = map.get(&key).cloned() else { continue };
            let mut matched = false;
            for (rx, sub) in &patterns {
                if rx.is_match(&key) {
                    matched = true;
                    value = self.fill(&value, sub, &child, 0, trail);
                }
            }
            if let (false, Some(sub)) = (matched, additional) {
                value = self.fill(&value, sub, &child, 0, trail);
            }
            map.insert(key, value);
        }
    }

    fn fill_array(&self, items: &mut [Document], schema: &Map, path: &Path, trail: &[String]) {
        let (tuple, tail) = match (schema.get("prefixItems"), schema.get("items")) {
            (Some(Document::Array(prefix)), rest) => (prefix.as_slice(), rest),
            (_, Some(Document::Array(positional))) => (positional.as_slice(), schema.get("additionalItems")),
            (_, single) => (&[][..], single),
        };
        for (i, item) in items.iter_mut().enumerate() {
            let sub = match (tuple.get(i), tail) {
                (Some(sub), _) => sub,
                (None, Some(sub)) if sub.is_object() => sub,
                _ => continue,
            };
            *item = self.fill(item, sub, &path.index(i), 0, trail);
        }
    }

    /// Value for an absent key: its `default` (itself populated), or an
    /// object assembled from nested defaults when that object is non-empty
    /// and satisfies the schema. Nothing is made up for a node reached
    /// through a `$ref` already on the trail.
    fn synthesize(&self, node: &Document, path: &Path, trail: &[String]) -> Option<Document> {
        let max = self.v.options().max_ref_depth;
        let chain = resolve::ref_chain(self.v.root(), node, max);
        if chain.iter().any(|r| trail.iter().any(|t| t == r)) {
            return None;
        }
        let view = resolve::deref_schema(self.v.root(), node, max).ok()?;
        let schema = view.as_object()?;

        if let Some(default) = schema.get("default") {
            return Some(self.fill(default, node, path, 0, trail));
        }
        if !object_like(schema) {
            return None;
        }
        let built = self.fill(&Document::object(), node, path, 0, trail);
        let non_empty = built.as_object().is_some_and(|m| !m.is_empty());
        let accepted = non_empty && !self.v.check(&built, node, path, 0).iter().any(|d| d.is_error());
        accepted.then_some(built)
    }
}

fn extended(trail: &[String], chain: &[&str]) -> Vec<String> {
    trail.iter().cloned().chain(chain.iter().map(|r| r.to_string())).collect()
}

fn object_like(schema: &Map) -> bool {
    match schema.get("type") {
        Some(Document::String(t)) => t == "object",
        Some(Document::Array(ts)) => ts.iter().any(|t| t.as_str() == Some("object")),
        _ => schema.contains_key("properties"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn apply(data: Value, schema: Value) -> Value {
        let out = apply_defaults(&Document::from(data), &Document::from(schema));
        Value::from(&out)
    }

    fn port_schema() -> Value {
        json!({"type": "object", "properties": {"port": {"type": "integer", "default": 8080}}})
    }

    #[test]
    fn absent_key_gets_default() {
        assert_eq!(apply(json!({}), port_schema()), json!({"port": 8080}));
    }

    #[test]
    fn present_key_is_kept() {
        assert_eq!(apply(json!({"port": 100}), port_schema()), json!({"port": 100}));
        assert_eq!(apply(json!({"port": null}), port_schema()), json!({"port": null}));
    }

    #[test]
    fn input_is_not_mutated() {
        let data = Document::from(json!({}));
        let schema = Document::from(port_schema());
        let _ = apply_defaults(&data, &schema);
        assert_eq!(data, Document::object());
    }

    #[test]
    fn nested_objects_are_built_from_nested_defaults() {
        let schema = json!({
            "type": "object",
            "properties": {
                "server": {
                    "type": "object",
                    "properties": {"host": {"default": "localhost"}, "port": {"default": 80}}
                },
                "tls": {"type": "object", "properties": {"cert": {"type": "string"}}},
                "auth": {
                    "type": "object",
                    "properties": {"user": {"type": "string"}, "mode": {"default": "basic"}},
                    "required": ["user"]
                }
            }
        });
        assert_eq!(apply(json!({}), schema.clone()), json!({"server": {"host": "localhost", "port": 80}}));
        assert_eq!(
            apply(json!({"server": {"port": 9}}), schema),
            json!({"server": {"port": 9, "host": "localhost"}})
        );
    }

    #[test]
    fn inserted_defaults_are_populated_too() {
        let schema = json!({
            "properties": {
                "log": {"default": {"level": "info"}, "properties": {"format": {"default": "text"}}}
            }
        });
        assert_eq!(apply(json!({}), schema), json!({"log": {"level": "info", "format": "text"}}));
    }

    #[test]
    fn refs_and_sibling_defaults() {
        let schema = json!({
            "$defs": {"Port": {"type": "integer", "default": 1}},
            "properties": {
                "a": {"$ref": "#/$defs/Port"},
                "b": {"$ref": "#/$defs/Port", "default": 2}
            }
        });
        assert_eq!(apply(json!({}), schema), json!({"a": 1, "b": 2}));
    }

    #[test]
    fn array_items_dispatch_to_discriminated_alternative() {
        let schema = json!({
            "$defs": {
                "Circle": {
                    "properties": {"type": {"const": "circle"}, "radius": {"default": 1.0}, "color": {"default": "red"}},
                    "required": ["type"]
                },
                "Square": {
                    "properties": {"type": {"const": "square"}, "side": {"default": 2}},
                    "required": ["type"]
                }
            },
            "properties": {
                "shapes": {"type": "array", "items": {"anyOf": [{"$ref": "#/$defs/Circle"}, {"$ref": "#/$defs/Square"}]}}
            }
        });
        let out = apply(json!({"shapes": [{"type": "circle"}, {"type": "square", "side": 5}]}), schema);
        assert_eq!(out, json!({"shapes": [
            {"type": "circle", "radius": 1.0, "color": "red"},
            {"type": "square", "side": 5}
        ]}));
    }

    #[test]
    fn tuple_items_are_positional() {
        let schema = json!({
            "items": [{"properties": {"a": {"default": 1}}}, {"properties": {"b": {"default": 2}}}]
        });
        assert_eq!(apply(json!([{}, {}, {}]), schema), json!([{"a": 1}, {"b": 2}, {}]));
    }

    #[test]
    fn all_of_branches_apply_in_order() {
        let schema = json!({"allOf": [
            {"properties": {"a": {"default": 1}}},
            {"properties": {"a": {"default": 2}, "b": {"default": 3}}}
        ]});
        assert_eq!(apply(json!({}), schema), json!({"a": 1, "b": 3}));
    }

    #[test]
    fn additional_properties_schema_reaches_extra_keys() {
        let schema = json!({
            "properties": {"fixed": {"type": "object"}},
            "additionalProperties": {"properties": {"enabled": {"default": true}}}
        });
        assert_eq!(
            apply(json!({"fixed": {}, "plugin": {}}), schema),
            json!({"fixed": {}, "plugin": {"enabled": true}})
        );
    }

    #[test]
    fn null_root_counts_as_absent() {
        assert_eq!(apply(json!(null), json!({"default": [1, 2]})), json!([1, 2]));
        assert_eq!(apply(json!(null), port_schema()), json!({"port": 8080}));
        assert_eq!(apply(json!(null), json!({"type": "string"})), json!(null));
        assert_eq!(apply(json!("x"), json!({"default": "y"})), json!("x"));
    }

    #[test]
    fn recursive_schemas_stop_at_a_repeated_ref() {
        let schema = json!({
            "type": "object",
            "properties": {"name": {"default": "n"}, "child": {"$ref": "#"}}
        });
        assert_eq!(apply(json!({}), schema.clone()), json!({"name": "n"}));
        assert_eq!(
            apply(json!({"child": {"child": {}}}), schema),
            json!({"child": {"child": {"name": "n"}, "name": "n"}, "name": "n"})
        );
    }

    #[test]
    fn recursive_defaults_are_inserted_once() {
        let schema = json!({
            "$defs": {"Node": {"type": "object", "properties": {"next": {"$ref": "#/$defs/Node", "default": {}}}}},
            "properties": {"head": {"$ref": "#/$defs/Node", "default": {}}}
        });
        let once = apply(json!({}), schema.clone());
        assert_eq!(once, json!({"head": {}}));
        assert_eq!(apply(once.clone(), schema), once);
    }

    #[test]
    fn untagged_alternatives_are_ranked_after_their_defaults() {
        let schema = json!({"anyOf": [
            {"properties": {"a": {"default": 1}}, "required": ["x"]},
            {"properties": {"b": {"default": 2}}, "required": ["a"]}
        ]});
        let once = apply(json!({}), schema.clone());
        assert_eq!(once, json!({"a": 1, "b": 2}));
        assert_eq!(apply(once.clone(), schema.clone()), once);
        assert_eq!(apply(json!({"x": 0}), schema), json!({"x": 0, "a": 1}));
    }
}
