use crate::diagnostic::{Category, Diagnostic};
use crate::document::{canon, Document, Map};
use crate::path::Path;

use super::Validator;

/// Element schemas plus `minItems`/`maxItems`/`uniqueItems`.
///
/// Tuple form is either `items: [..]` with `additionalItems`, or
/// `prefixItems: [..]` with `items` covering the tail.
pub(super) fn check_array(v: &Validator, items: &[Document], schema: &Map, path: &Path, out: &mut Vec<Diagnostic>) {
    let n = items.len();

    let (tuple, tail) = match (schema.get("prefixItems"), schema.get("items")) {
        (Some(Document::Array(prefix)), rest) => (Some(prefix), rest),
        (_, Some(Document::Array(positional))) => (Some(positional), schema.get("additionalItems")),
        (_, single) => (None, single),
    };

    match tuple {
        Some(tuple) => {
            for (i, (item, sub)) in items.iter().zip(tuple).enumerate() {
                out.extend(v.check(item, sub, &path.index(i), 0));
            }
            if n > tuple.len() {
                match tail {
                    Some(Document::Bool(false)) => out.push(Diagnostic::error(path, Category::ArraySize, format!(
                        "array has {n} items but its tuple schema allows at most {}",
                        tuple.len(),
                    ))),
                    Some(sub @ Document::Object(_)) => {
                        for (i, item) in items.iter().enumerate().skip(tuple.len()) {
                            out.extend(v.check(item, sub, &path.index(i), 0));
                        }
                    }
                    _ => {}
                }
            }
        }
        None => {
            if let Some(sub) = tail {
                for (i, item) in items.iter().enumerate() {
                    out.extend(v.check(item, sub, &path.index(i), 0));
                }
            }
        }
    }

    let len = n as u64;
    if let Some(min) = schema.get("minItems").and_then(Document::as_u64) {
        if len < min {
            out.push(Diagnostic::error(path, Category::ArraySize, format!(
                "array has {n} items, fewer than the minimum of {min}"
            )));
        }
    }
    if let Some(max) = schema.get("maxItems").and_then(Document::as_u64) {
        if len > max {
            out.push(Diagnostic::error(path, Category::ArraySize, format!(
                "array has {n} items, more than the maximum of {max}"
            )));
        }
    }

    if schema.get("uniqueItems").and_then(Document::as_bool) == Some(true) {
        if let Some((a, b)) = canon::first_duplicate(items) {
            out.push(Diagnostic::error(path, Category::UniqueItems, format!(
                "items [{a}] and [{b}] are equal ({}); items must be unique",
                v.preview(&items[b]),
            )));
        }
    }
}
