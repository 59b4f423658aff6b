use crate::diagnostic::{Category, Diagnostic};
use crate::document::{Document, Map};
use crate::path::Path;

use super::Validator;

/// `minLength`/`maxLength` (counted in chars, not bytes) and `pattern`.
pub(super) fn check_string(v: &Validator, s: &str, schema: &Map, path: &Path, out: &mut Vec<Diagnostic>) {
    let len = s.chars().count() as u64;

    if let Some(min) = schema.get("minLength").and_then(Document::as_u64) {
        if len < min {
            out.push(Diagnostic::error(path, Category::OutOfRange, format!(
                "string is {len} characters long, shorter than the minimum length of {min}"
            )));
        }
    }
    if let Some(max) = schema.get("maxLength").and_then(Document::as_u64) {
        if len > max {
            out.push(Diagnostic::error(path, Category::OutOfRange, format!(
                "string is {len} characters long, longer than the maximum length of {max}"
            )));
        }
    }

    if let Some(pattern) = schema.get("pattern").and_then(Document::as_str) {
        match super::full_match_regex(pattern) {
            Some(rx) => {
                if !rx.is_match(s) {
                    out.push(Diagnostic::error(path, Category::PatternMismatch, format!(
                        "string {} does not match pattern '{pattern}'",
                        v.preview(&Document::from(s)),
                    )));
                }
            }
            // schema author error: surface it, but don't fail the document
            None => out.push(Diagnostic::warning(path, Category::Other, format!(
                "schema pattern '{pattern}' is not a valid regular expression and was ignored"
            ))),
        }
    }
}
