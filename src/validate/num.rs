use std::cmp::Ordering;

use crate::diagnostic::{Category, Diagnostic};
use crate::document::{Document, Map};
use crate::path::Path;

// relative tolerance for float `multipleOf`
const MULTIPLE_EPSILON: f64 = 1e-9;

/// Range keywords. Both the numeric (draft 6+) and the boolean (draft 4)
/// spellings of `exclusiveMinimum`/`exclusiveMaximum` are understood.
/// Non-numeric keyword values are ignored.
pub(super) fn check_number(data: &Document, schema: &Map, path: &Path, out: &mut Vec<Diagnostic>) {
    let exclusive_min_flag = schema.get("exclusiveMinimum").and_then(Document::as_bool) == Some(true);
    let exclusive_max_flag = schema.get("exclusiveMaximum").and_then(Document::as_bool) == Some(true);

    if let Some(min) = schema.get("minimum").filter(|m| m.is_number()) {
        match compare(data, min) {
            Some(Ordering::Less) => out.push(range(path, format!("{data} is less than the minimum of {min}"))),
            Some(Ordering::Equal) if exclusive_min_flag => {
                out.push(range(path, format!("{data} must be greater than {min}")))
            }
            _ => {}
        }
    }
    if let Some(max) = schema.get("maximum").filter(|m| m.is_number()) {
        match compare(data, max) {
            Some(Ordering::Greater) => out.push(range(path, format!("{data} is greater than the maximum of {max}"))),
            Some(Ordering::Equal) if exclusive_max_flag => {
                out.push(range(path, format!("{data} must be less than {max}")))
            }
            _ => {}
        }
    }
    if let Some(min) = schema.get("exclusiveMinimum").filter(|m| m.is_number()) {
        if matches!(compare(data, min), Some(Ordering::Less | Ordering::Equal)) {
            out.push(range(path, format!("{data} must be greater than {min}")));
        }
    }
    if let Some(max) = schema.get("exclusiveMaximum").filter(|m| m.is_number()) {
        if matches!(compare(data, max), Some(Ordering::Greater | Ordering::Equal)) {
            out.push(range(path, format!("{data} must be less than {max}")));
        }
    }
    if let Some(step) = schema.get("multipleOf").filter(|m| m.is_number()) {
        if is_multiple(data, step) == Some(false) {
            out.push(range(path, format!("{data} is not a multiple of {step}")));
        }
    }
}

fn range(path: &Path, message: String) -> Diagnostic {
    Diagnostic::error(path, Category::OutOfRange, message)
}

/// Exact for two ints, float comparison otherwise; `None` involves NaN.
pub(crate) fn compare(a: &Document, b: &Document) -> Option<Ordering> {
    match (a, b) {
        (Document::Int(x), Document::Int(y)) => Some(x.cmp(y)),
        _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
    }
}

fn is_multiple(data: &Document, step: &Document) -> Option<bool> {
    match (data, step) {
        (Document::Int(x), Document::Int(y)) => x.checked_rem(*y).map(|r| r == 0),
        _ => {
            let (x, y) = (data.as_f64()?, step.as_f64()?);
            if y <= 0.0 || !x.is_finite() {
                return None;
            }
            let q = x / y;
            Some((q - q.round()).abs() <= MULTIPLE_EPSILON * q.abs().max(1.0))
        }
    }
}
