//! Constraint validator.
//!
//! Recursive descent of a document node against a schema node. Checks run in
//! a fixed order and collect; a later check still runs after an earlier one
//! failed, except where a keyword does not apply to the data's shape:
//!
//! 1. `$ref` (resolved, same path)
//! 2. `enum` / `const`
//! 3. `allOf` / `anyOf` / `oneOf` (see [`crate::compose`])
//! 4. `type`, then the keyword group for the data's kind
//! 5. `deprecated`
//!
//! Hops along `$ref` chains are counted per document node and reset whenever
//! the descent moves into a child value, so self-referential schemas over
//! finite data terminate while `{"$ref": "#"}` loops are cut off.
pub mod string;
pub mod num;
pub mod arr;
pub mod obj;

use std::collections::HashMap;
use std::sync::RwLock;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::compose;
use crate::diagnostic::{Category, Diagnostic};
use crate::document::{Document, Map};
use crate::options::ValidatorOptions;
use crate::path::Path;
use crate::resolve;
use crate::suggest;

// ------------------------------ Validator --------------------------------- //

/// One validation pass over a fixed schema root.
#[derive(Clone, Copy)]
pub struct Validator<'a> {
    root: &'a Document,
    options: &'a ValidatorOptions,
    original: Option<&'a Document>,
}

impl<'a> Validator<'a> {
    pub fn new(root: &'a Document, options: &'a ValidatorOptions) -> Self {
        Self { root, options, original: None }
    }

    /// Render values from `original` (the document as the user wrote it)
    /// instead of the one being checked, which may carry injected defaults.
    pub fn with_original(mut self, original: Option<&'a Document>) -> Self {
        self.original = original;
        self
    }

    pub fn root(&self) -> &'a Document { self.root }
    pub fn options(&self) -> &'a ValidatorOptions { self.options }

    pub fn validate(&self, data: &Document) -> Vec<Diagnostic> {
        self.check(data, self.root, &Path::root(), 0)
    }

    pub fn check(&self, data: &Document, node: &Document, path: &Path, hops: usize) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        let schema = match node {
            Document::Bool(true) => return out,
            Document::Bool(false) => {
                out.push(Diagnostic::error(path, Category::Other, "no value is allowed here"));
                return out;
            }
            Document::Object(m) => m,
            _ => return out,
        };

        // 1) $ref
        if let Some(reference) = schema.get("$ref").and_then(Document::as_str) {
            self.check_ref(data, reference, path, hops, &mut out);
        }

        // 2) enum / const
        let literal_ok = self.check_literals(data, schema, path, &mut out);

        // 3) composition
        out.extend(compose::evaluate(self, data, schema, path, hops));

        // 4) type + per-kind keywords
        self.check_type(data, schema, path, &mut out);
        match data {
            Document::Object(map) => obj::check_object(self, data, map, schema, path, hops, &mut out),
            Document::Array(items) => arr::check_array(self, items, schema, path, &mut out),
            Document::String(s) => string::check_string(self, s, schema, path, &mut out),
            Document::Int(_) | Document::Float(_) => num::check_number(data, schema, path, &mut out),
            Document::Null | Document::Bool(_) => {}
        }

        // 5) deprecated
        if literal_ok {
            self.check_deprecated(data, schema, path, &mut out);
        }
        out
    }

    fn check_ref(&self, data: &Document, reference: &str, path: &Path, hops: usize, out: &mut Vec<Diagnostic>) {
        if hops >= self.options.max_ref_depth {
            let err = resolve::ResolveError::DepthExceeded {
                reference: reference.to_string(),
                limit: self.options.max_ref_depth,
            };
            out.push(Diagnostic::error(path, Category::Other, err.to_string()));
            return;
        }
        match resolve::resolve(self.root, reference) {
            Some(target) => out.extend(self.check(data, target, path, hops + 1)),
            None => {
                tracing::debug!(%path, reference, "unresolved $ref");
                let err = resolve::ResolveError::Unresolved(reference.to_string());
                out.push(Diagnostic::error(path, Category::Other, err.to_string()));
            }
        }
    }

    /// Returns whether the value satisfied `enum`/`const` (true when absent).
    fn check_literals(&self, data: &Document, schema: &Map, path: &Path, out: &mut Vec<Diagnostic>) -> bool {
        let mut ok = true;
        if let Some(expected) = schema.get("const") {
            if data != expected {
                ok = false;
                out.push(Diagnostic::error(path, Category::InvalidEnum, format!(
                    "value {} does not equal the constant {}",
                    self.preview(data),
                    self.preview(expected),
                )));
            }
        }
        if let Some(Document::Array(allowed)) = schema.get("enum") {
            if !allowed.iter().any(|a| a == data) {
                ok = false;
                let listed = allowed.iter().map(|a| self.preview(a)).collect::<Vec<_>>().join(", ");
                let mut message = format!("value {} is not one of [{listed}]", self.preview(data));
                if let Some(s) = data.as_str() {
                    self.push_hint(&mut message, s, allowed.iter().filter_map(Document::as_str));
                }
                out.push(Diagnostic::error(path, Category::InvalidEnum, message));
            }
        }
        ok
    }

    fn check_type(&self, data: &Document, schema: &Map, path: &Path, out: &mut Vec<Diagnostic>) {
        let names: Vec<&str> = match schema.get("type") {
            Some(Document::String(s)) => vec![s.as_str()],
            Some(Document::Array(xs)) => xs.iter().filter_map(Document::as_str).collect(),
            _ => return,
        };
        if names.is_empty() || names.iter().any(|n| self.matches_type(data, n)) {
            return;
        }
        out.push(Diagnostic::error(path, Category::TypeMismatch, format!(
            "expected type {}, got {} {}",
            names.join(" or "),
            data.kind_name(),
            self.preview(data),
        )));
    }

    /// Unknown type names never reject.
    pub fn matches_type(&self, data: &Document, name: &str) -> bool {
        match name {
            "null" => data.is_null(),
            "boolean" => matches!(data, Document::Bool(_)),
            "object" => data.is_object(),
            "array" => data.is_array(),
            "string" => matches!(data, Document::String(_)),
            "number" => data.is_number(),
            "integer" => match data {
                Document::Int(_) => true,
                Document::Float(f) => {
                    self.options.integral_floats_are_integers && f.is_finite() && f.fract() == 0.0
                }
                _ => false,
            },
            _ => true,
        }
    }

    fn check_deprecated(&self, data: &Document, schema: &Map, path: &Path, out: &mut Vec<Diagnostic>) {
        if schema.get("deprecated").and_then(Document::as_bool) != Some(true) {
            return;
        }
        let (category, mut message) = if schema.contains_key("const") || schema.contains_key("enum") {
            (Category::DeprecatedValue, format!("value {} is deprecated", self.preview(data)))
        } else {
            match path.last_key() {
                Some(name) => (Category::DeprecatedProperty, format!("property '{name}' is deprecated")),
                None => (Category::DeprecatedProperty, "this setting is deprecated".to_string()),
            }
        };
        if let Some(description) = schema.get("description").and_then(Document::as_str) {
            message.push_str(": ");
            message.push_str(description);
        }
        out.push(Diagnostic::deprecation(path, category, message));
    }

    // ---------------------------- rendering ------------------------------- //

    pub fn preview(&self, data: &Document) -> String {
        data.preview(self.options.preview_chars)
    }

    /// Preview of the user-authored value at `path` when an original document
    /// was supplied and still has that path; otherwise of `data`.
    pub fn render_value(&self, data: &Document, path: &Path) -> String {
        let shown = self.original.and_then(|o| o.at(path)).unwrap_or(data);
        self.preview(shown)
    }

    pub(crate) fn push_hint<'c, I>(&self, message: &mut String, word: &str, candidates: I)
    where
        I: IntoIterator<Item = &'c str>,
    {
        if !self.options.suggestions {
            return;
        }
        if let Some(close) = suggest::closest(word, candidates) {
            message.push_str(&format!(". Did you mean '{close}'?"));
        }
    }
}

// ------------------------------- Regexes ---------------------------------- //

const REGEX_CACHE_LIMIT: usize = 512;

static REGEX_CACHE: Lazy<RwLock<HashMap<String, Option<Regex>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Compile through a process-wide cache; `None` for invalid patterns.
pub(crate) fn compile_regex(source: &str) -> Option<Regex> {
    if let Ok(cache) = REGEX_CACHE.read() {
        if let Some(hit) = cache.get(source) {
            return hit.clone();
        }
    }
    let compiled = Regex::new(source).ok();
    if let Ok(mut cache) = REGEX_CACHE.write() {
        if cache.len() >= REGEX_CACHE_LIMIT {
            cache.clear();
        }
        cache.insert(source.to_string(), compiled.clone());
    }
    compiled
}

/// `pattern` keyword semantics: the whole string must match.
pub(crate) fn full_match_regex(pattern: &str) -> Option<Regex> {
    // reject invalid patterns before wrapping, so `a)(b` is not accepted
    compile_regex(pattern)?;
    compile_regex(&format!("^(?:{pattern})$"))
}

// ------------------------------- Tests ------------------------------------ //
