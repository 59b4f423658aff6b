use regex::Regex;

use crate::compose;
use crate::diagnostic::{Category, Diagnostic};
use crate::document::{Document, Map};
use crate::path::Path;
use crate::suggest;

use super::Validator;

/// `required`, `properties`, `patternProperties`, `additionalProperties`,
/// `unevaluatedProperties` and the property-count bounds.
pub(super) fn check_object(
    v: &Validator,
    data: &Document,
    map: &Map,
    schema: &Map,
    path: &Path,
    hops: usize,
    out: &mut Vec<Diagnostic>,
) {
    let properties = schema.get("properties").and_then(Document::as_object);
    let patterns = pattern_properties(schema, path, out);
    let declared = |key: &str| properties.is_some_and(|p| p.contains_key(key));

    if let Some(Document::Array(required)) = schema.get("required") {
        let required_names: Vec<&str> = required.iter().filter_map(Document::as_str).collect();
        for name in &required_names {
            if map.contains_key(*name) {
                continue;
            }
            let mut message = format!("missing required property '{name}'");
            if v.options().suggestions {
                let unknown = map.keys()
                    .map(String::as_str)
                    .filter(|k| !declared(*k) && !required_names.contains(k));
                if let Some(typo) = suggest::closest(name, unknown) {
                    message.push_str(&format!("; found '{typo}'. Did you mean '{name}'?"));
                }
            }
            out.push(Diagnostic::error(&path.key(*name), Category::MissingRequired, message));
        }
    }

    if let Some(properties) = properties {
        for (name, sub) in properties {
            if let Some(value) = map.get(name) {
                out.extend(v.check(value, sub, &path.key(name.as_str()), 0));
            }
        }
    }

    for (key, value) in map {
        for (rx, sub) in &patterns {
            if rx.is_match(key) {
                out.extend(v.check(value, sub, &path.key(key.as_str()), 0));
            }
        }
    }

    let covered = |key: &str| declared(key) || patterns.iter().any(|(rx, _)| rx.is_match(key));

    if let Some(additional) = schema.get("additionalProperties") {
        for (key, value) in map {
            if covered(key.as_str()) {
                continue;
            }
            match additional {
                Document::Bool(false) => {
                    let mut message = format!("property '{key}' is not allowed");
                    if let Some(props) = properties {
                        v.push_hint(&mut message, key, props.keys().map(String::as_str));
                    }
                    out.push(Diagnostic::error(&path.key(key.as_str()), Category::AdditionalProperty, message));
                }
                Document::Object(_) => out.extend(v.check(value, additional, &path.key(key.as_str()), 0)),
                _ => {}
            }
        }
    }

    if let Some(unevaluated) = schema.get("unevaluatedProperties") {
        if matches!(unevaluated, Document::Bool(false) | Document::Object(_)) {
            let evaluated = compose::evaluated_keys(v, data, schema, path, hops);
            for (key, value) in map {
                if evaluated.contains(key.as_str()) {
                    continue;
                }
                if let Document::Object(_) = unevaluated {
                    out.extend(v.check(value, unevaluated, &path.key(key.as_str()), 0));
                    continue;
                }
                let mut message = format!("property '{key}' is not evaluated by any subschema");
                v.push_hint(&mut message, key, declared_anywhere(&evaluated_candidates(v, schema)));
                out.push(Diagnostic::error(&path.key(key.as_str()), Category::AdditionalProperty, message));
            }
        }
    }

    let count = map.len() as u64;
    if let Some(min) = schema.get("minProperties").and_then(Document::as_u64) {
        if count < min {
            out.push(Diagnostic::error(path, Category::OutOfRange, format!(
                "object has {count} properties, fewer than the minimum of {min}"
            )));
        }
    }
    if let Some(max) = schema.get("maxProperties").and_then(Document::as_u64) {
        if count > max {
            out.push(Diagnostic::error(path, Category::OutOfRange, format!(
                "object has {count} properties, more than the maximum of {max}"
            )));
        }
    }
}

/// Compiled `patternProperties`; invalid keys are reported once and skipped.
fn pattern_properties<'s>(schema: &'s Map, path: &Path, out: &mut Vec<Diagnostic>) -> Vec<(Regex, &'s Document)> {
    let Some(Document::Object(patterns)) = schema.get("patternProperties") else {
        return Vec::new();
    };
    let mut compiled = Vec::with_capacity(patterns.len());
    for (source, sub) in patterns {
        match super::compile_regex(source) {
            Some(rx) => compiled.push((rx, sub)),
            None => out.push(Diagnostic::warning(path, Category::Other, format!(
                "schema patternProperties key '{source}' is not a valid regular expression and was ignored"
            ))),
        }
    }
    compiled
}

/// Property names declared by this node and its `allOf` branches, for hints.
fn evaluated_candidates(v: &Validator, schema: &Map) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut push_from = |node: &Map| {
        if let Some(props) = node.get("properties").and_then(Document::as_object) {
            names.extend(props.keys().cloned());
        }
    };
    push_from(schema);
    if let Some(Document::Array(branches)) = schema.get("allOf") {
        for branch in branches {
            if let Ok(view) = crate::resolve::deref_schema(v.root(), branch, v.options().max_ref_depth) {
                if let Some(m) = view.as_object() {
                    push_from(m);
                }
            }
        }
    }
    names
}

fn declared_anywhere(names: &[String]) -> impl Iterator<Item = &str> {
    names.iter().map(String::as_str)
}
