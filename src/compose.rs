//! Composition evaluator: `allOf`, `anyOf`, `oneOf`.
//!
//! Each alternative is checked with the constraint validator at the same path
//! and hop count. When nothing matches, the alternatives' errors are folded
//! into a single diagnostic, narrowed by the [discriminator](crate::discriminator)
//! where one can be inferred, so a `{"type": "circle"}` value is only told
//! about the circle alternative.
use std::collections::HashSet;

use crate::diagnostic::{Category, Diagnostic};
use crate::discriminator;
use crate::document::{Document, Map};
use crate::path::Path;
use crate::resolve;
use crate::validate::Validator;

// errors listed per alternative in a narrowed report
const MAX_ERRORS_PER_ALTERNATIVE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    All,
    Any,
    One,
}

impl Mode {
    pub fn keyword(self) -> &'static str {
        match self {
            Mode::All => "allOf",
            Mode::Any => "anyOf",
            Mode::One => "oneOf",
        }
    }

    pub fn category(self) -> Category {
        match self {
            Mode::All => Category::AllOfFailure,
            Mode::Any => Category::AnyOfMismatch,
            Mode::One => Category::OneOfMismatch,
        }
    }
}

/// Run every composition keyword present on `schema`.
pub fn evaluate(v: &Validator, data: &Document, schema: &Map, path: &Path, hops: usize) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for mode in [Mode::All, Mode::Any, Mode::One] {
        let Some(Document::Array(alternatives)) = schema.get(mode.keyword()) else { continue };
        tracing::trace!(%path, keyword = mode.keyword(), n = alternatives.len(), "composition");
        out.extend(match mode {
            Mode::All => all_of(v, data, alternatives, path, hops),
            Mode::Any => any_of(v, data, alternatives, path, hops),
            Mode::One => one_of(v, data, alternatives, path, hops),
        });
    }
    out
}

fn has_errors(ds: &[Diagnostic]) -> bool { ds.iter().any(Diagnostic::is_error) }

fn notes(ds: Vec<Diagnostic>) -> impl Iterator<Item = Diagnostic> {
    ds.into_iter().filter(|d| !d.is_error())
}

fn all_of(v: &Validator, data: &Document, branches: &[Document], path: &Path, hops: usize) -> Vec<Diagnostic> {
    let mut accepted = Vec::new();
    for (i, branch) in branches.iter().enumerate() {
        if let Document::Bool(false) = branch {
            return vec![Diagnostic::error(path, Category::AllOfFailure, format!(
                "allOf branch {} rejects every value",
                i + 1,
            ))];
        }
        let ds = v.check(data, branch, path, hops);
        if has_errors(&ds) {
            return ds;
        }
        accepted.extend(notes(ds));
    }
    accepted
}

fn any_of(v: &Validator, data: &Document, alternatives: &[Document], path: &Path, hops: usize) -> Vec<Diagnostic> {
    let mut results = Vec::with_capacity(alternatives.len());
    for alternative in alternatives {
        let ds = v.check(data, alternative, path, hops);
        if !has_errors(&ds) {
            return notes(ds).collect();
        }
        results.push(ds);
    }
    if alternatives.is_empty() {
        return Vec::new();
    }
    vec![narrowed(v, Mode::Any, data, alternatives, &results, path)]
}

fn one_of(v: &Validator, data: &Document, alternatives: &[Document], path: &Path, hops: usize) -> Vec<Diagnostic> {
    let results: Vec<Vec<Diagnostic>> = alternatives.iter()
        .map(|alternative| v.check(data, alternative, path, hops))
        .collect();
    let passing: Vec<usize> = (0..results.len()).filter(|&i| !has_errors(&results[i])).collect();

    match passing.as_slice() {
        [] if alternatives.is_empty() => Vec::new(),
        [] => vec![narrowed(v, Mode::One, data, alternatives, &results, path)],
        [only] => results.into_iter().nth(*only).map(|ds| notes(ds).collect()).unwrap_or_default(),
        many => {
            let labels = many.iter()
                .map(|&i| format!("'{}'", label(v, &alternatives[i], i)))
                .collect::<Vec<_>>()
                .join(", ");
            vec![Diagnostic::error(path, Category::OneOfMismatch, format!(
                "value matches {} alternatives ({labels}) but oneOf requires exactly one\n  value: {}",
                many.len(),
                v.render_value(data, path),
            ))]
        }
    }
}

// ---------------------------- Narrowed report ------------------------------ //

/// One diagnostic summarising why no alternative matched.
fn narrowed(
    v: &Validator,
    mode: Mode,
    data: &Document,
    alternatives: &[Document],
    results: &[Vec<Diagnostic>],
    path: &Path,
) -> Diagnostic {
    let n = alternatives.len();
    let selected = discriminator::find(v.root(), alternatives, v.options().max_ref_depth)
        .and_then(|d| d.select(data).map(|i| (d, i)));

    let mut message = match &selected {
        Some((d, i)) => {
            let name = label(v, &alternatives[*i], *i);
            let tag = data.get(d.property()).map(|t| v.preview(t)).unwrap_or_default();
            tracing::debug!(%path, property = d.property(), alternative = %name, "discriminator narrowed report");
            let mut m = format!(
                "value does not match the '{name}' alternative selected by {} = {tag}",
                d.property(),
            );
            push_errors(&mut m, &results[*i], "  ");
            m
        }
        None => {
            let mut m = match mode {
                Mode::One => format!("value matches none of the {n} oneOf alternatives"),
                _ => format!("value does not match any of the {n} {} alternatives", mode.keyword()),
            };
            let shown = n.min(v.options().max_reported_alternatives);
            for (i, (alternative, ds)) in alternatives.iter().zip(results).take(shown).enumerate() {
                m.push_str(&format!("\n  {}:", label(v, alternative, i)));
                push_errors(&mut m, ds, "    ");
            }
            if n > shown {
                m.push_str(&format!("\n  ... {} more alternatives not shown", n - shown));
            }
            m
        }
    };
    message.push_str(&format!("\n  value: {}", v.render_value(data, path)));
    Diagnostic::error(path, mode.category(), message)
}

fn push_errors(message: &mut String, ds: &[Diagnostic], indent: &str) {
    let errors: Vec<&Diagnostic> = ds.iter().filter(|d| d.is_error()).collect();
    for d in errors.iter().take(MAX_ERRORS_PER_ALTERNATIVE) {
        let nested = format!("\n{indent}  ");
        message.push_str(&format!("\n{indent}- {}", d.to_string().replace('\n', &nested)));
    }
    if errors.len() > MAX_ERRORS_PER_ALTERNATIVE {
        message.push_str(&format!("\n{indent}- ... and {} more", errors.len() - MAX_ERRORS_PER_ALTERNATIVE));
    }
}

/// `title`, else the `$ref` target name, else `alternative N`.
pub fn label(v: &Validator, alternative: &Document, index: usize) -> String {
    let view = resolve::deref_schema(v.root(), alternative, v.options().max_ref_depth).ok();
    view.as_deref()
        .and_then(|s| s.get("title"))
        .and_then(Document::as_str)
        .or_else(|| resolve::ref_of(alternative).and_then(resolve::ref_name))
        .map(str::to_string)
        .unwrap_or_else(|| format!("alternative {}", index + 1))
}

// ------------------------------ Selection ---------------------------------- //

/// The alternative selected by `data`'s discriminator tag, if one is inferred
/// and the tag matches exactly one alternative.
pub fn discriminated(v: &Validator, data: &Document, alternatives: &[Document]) -> Option<usize> {
    discriminator::find(v.root(), alternatives, v.options().max_ref_depth)?.select(data)
}

// ------------------------- Evaluated properties ---------------------------- //

/// Keys of `data` covered by `schema` or by any subschema that applies to it:
/// `$ref` targets, every `allOf` branch, and the passing `anyOf`/`oneOf`
/// branches. Used for `unevaluatedProperties`.
pub fn evaluated_keys(v: &Validator, data: &Document, schema: &Map, path: &Path, hops: usize) -> HashSet<String> {
    let mut keys = HashSet::new();
    collect_keys(v, data, schema, path, hops, false, &mut keys);
    keys
}

fn collect_keys(
    v: &Validator,
    data: &Document,
    schema: &Map,
    path: &Path,
    hops: usize,
    nested: bool,
    keys: &mut HashSet<String>,
) {
    let Some(map) = data.as_object() else { return };
    if hops >= v.options().max_ref_depth {
        return;
    }

    if let Some(props) = schema.get("properties").and_then(Document::as_object) {
        keys.extend(props.keys().filter(|k| map.contains_key(k.as_str())).cloned());
    }
    if let Some(patterns) = schema.get("patternProperties").and_then(Document::as_object) {
        for source in patterns.keys() {
            if let Some(rx) = crate::validate::compile_regex(source) {
                keys.extend(map.keys().filter(|k| rx.is_match(k)).cloned());
            }
        }
    }
    let open = |keyword: &str| schema.get(keyword).is_some_and(|s| !matches!(s, Document::Bool(false)));
    if open("additionalProperties") || (nested && open("unevaluatedProperties")) {
        keys.extend(map.keys().cloned());
        return;
    }

    if let Some(target) = schema.get("$ref").and_then(Document::as_str).and_then(|r| resolve::resolve(v.root(), r)) {
        if let Some(target) = target.as_object() {
            collect_keys(v, data, target, path, hops + 1, true, keys);
        }
    }
    if let Some(Document::Array(branches)) = schema.get("allOf") {
        for branch in branches.iter().filter_map(Document::as_object) {
            collect_keys(v, data, branch, path, hops, true, keys);
        }
    }
    for keyword in ["anyOf", "oneOf"] {
        let Some(Document::Array(branches)) = schema.get(keyword) else { continue };
        for branch in branches {
            let Some(branch_map) = branch.as_object() else { continue };
            if !has_errors(&v.check(data, branch, path, hops)) {
                collect_keys(v, data, branch_map, path, hops, true, keys);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Severity;
    use crate::options::ValidatorOptions;
    use serde_json::{json, Value};

    fn run(data: Value, schema: Value) -> Vec<Diagnostic> {
        let options = ValidatorOptions::default();
        let schema = Document::from(schema);
        Validator::new(&schema, &options).validate(&Document::from(data))
    }

    fn shapes() -> Value {
        json!({
            "$defs": {
                "Circle": {
                    "title": "Circle",
                    "type": "object",
                    "properties": {"type": {"const": "circle"}, "radius": {"type": "number"}},
                    "required": ["type", "radius"]
                },
                "Rectangle": {
                    "title": "Rectangle",
                    "type": "object",
                    "properties": {"type": {"const": "rectangle"}, "width": {"type": "number"}, "height": {"type": "number"}},
                    "required": ["type", "width", "height"]
                }
            },
            "anyOf": [{"$ref": "#/$defs/Circle"}, {"$ref": "#/$defs/Rectangle"}]
        })
    }

    #[test]
    fn any_of_passes_on_first_match() {
        assert!(run(json!({"type": "circle", "radius": 2}), shapes()).is_empty());
        assert!(run(json!({"type": "rectangle", "width": 1, "height": 2}), shapes()).is_empty());
    }

    #[test]
    fn any_of_failure_is_narrowed_by_discriminator() {
        let ds = run(json!({"type": "circle"}), shapes());
        assert_eq!(ds.len(), 1);
        assert_eq!(ds[0].category, Category::AnyOfMismatch);
        let text = ds[0].to_string();
        assert!(text.contains("Circle"), "{text}");
        assert!(text.contains("radius"), "{text}");
        assert!(!text.contains("Rectangle"), "{text}");
    }

    #[test]
    fn any_of_failure_without_tag_lists_alternatives() {
        let ds = run(json!({"type": "triangle"}), shapes());
        assert_eq!(ds.len(), 1);
        let text = &ds[0].message;
        assert!(text.starts_with("value does not match any of the 2 anyOf alternatives"), "{text}");
        assert!(text.contains("\n  Circle:") && text.contains("\n  Rectangle:"), "{text}");
        assert!(text.ends_with("value: {\"type\":\"triangle\"}"), "{text}");
    }

    #[test]
    fn reported_alternatives_are_capped() {
        let schema = json!({"anyOf": [
            {"type": "string"}, {"type": "integer"}, {"type": "array"}, {"type": "object"},
            {"type": "null"}, {"type": "number"}, {"const": false}
        ]});
        let ds = run(json!(true), schema);
        assert_eq!(ds.len(), 1);
        let text = &ds[0].message;
        assert!(text.contains("alternative 5:"), "{text}");
        assert!(!text.contains("alternative 6:"), "{text}");
        assert!(text.contains("... 2 more alternatives not shown"), "{text}");
    }

    #[test]
    fn one_of_counts_matches() {
        let schema = json!({"oneOf": [{"type": "integer"}, {"type": "number", "title": "Number"}]});
        let ds = run(json!(1), schema.clone());
        assert_eq!(ds.len(), 1);
        assert_eq!(ds[0].category, Category::OneOfMismatch);
        assert!(ds[0].message.starts_with("value matches 2 alternatives ('alternative 1', 'Number')"));
        assert!(run(json!(1.5), schema.clone()).is_empty());
        let ds = run(json!("x"), schema);
        assert!(ds[0].message.starts_with("value matches none of the 2 oneOf alternatives"));
    }

    #[test]
    fn one_of_zero_matches_is_narrowed_too() {
        let mut schema = shapes();
        let alternatives = schema["anyOf"].take();
        schema.as_object_mut().unwrap().remove("anyOf");
        schema["oneOf"] = alternatives;
        let ds = run(json!({"type": "rectangle", "width": 1}), schema);
        assert_eq!(ds[0].category, Category::OneOfMismatch);
        assert!(ds[0].message.contains("'Rectangle' alternative selected by type = \"rectangle\""));
        assert!(ds[0].message.contains("height"));
        assert!(!ds[0].message.contains("Circle"));
    }

    #[test]
    fn narrowed_report_renders_original_value() {
        let options = ValidatorOptions::default();
        let schema = Document::from(shapes());
        let original = Document::from(json!({"type": "circle"}));
        let populated = Document::from(json!({"type": "circle", "color": "red"}));
        let ds = Validator::new(&schema, &options)
            .with_original(Some(&original))
            .validate(&populated);
        assert!(ds[0].message.ends_with("value: {\"type\":\"circle\"}"), "{}", ds[0].message);
    }

    #[test]
    fn all_of_is_fail_fast() {
        let schema = json!({"allOf": [{"required": ["a"]}, {"required": ["b"]}]});
        let ds = run(json!({}), schema);
        assert_eq!(ds.len(), 1);
        assert_eq!(ds[0].path, "a");
        let ds = run(json!(1), json!({"allOf": [true, false]}));
        assert_eq!(ds[0].category, Category::AllOfFailure);
        assert_eq!(ds[0].message, "allOf branch 2 rejects every value");
    }

    #[test]
    fn accepted_branch_deprecations_surface() {
        let schema = json!({"oneOf": [
            {"const": "legacy", "deprecated": true, "description": "use 'modern'"},
            {"const": "modern"}
        ]});
        let ds = run(json!("legacy"), schema);
        assert_eq!(ds.len(), 1);
        assert_eq!(ds[0].severity, Severity::Deprecation);
        assert_eq!(ds[0].category, Category::DeprecatedValue);
    }

    #[test]
    fn discriminated_needs_a_matching_tag() {
        let options = ValidatorOptions::default();
        let schema = Document::from(shapes());
        let v = Validator::new(&schema, &options);
        let alternatives = schema.get("anyOf").and_then(Document::as_array).unwrap();
        let pick = |data: Value| discriminated(&v, &Document::from(data), alternatives);
        assert_eq!(pick(json!({"type": "rectangle"})), Some(1));
        assert_eq!(pick(json!({"width": 1, "height": 1})), None);
        assert_eq!(pick(json!({"type": "hexagon"})), None);
    }
}
