use std::collections::{BTreeMap, HashMap};
use ordered_float::OrderedFloat;

use super::Document;

/// Hashable, order-normalised mirror of a [`Document`].
///
/// Two documents that compare equal map to the same key: object keys are
/// sorted and integral floats collapse onto the integer arm.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CanonKey {
    Null,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    String(String),
    Array(Vec<CanonKey>),
    Object(BTreeMap<String, CanonKey>),
}

impl From<&Document> for CanonKey {
    fn from(doc: &Document) -> Self {
        match doc {
            Document::Null => CanonKey::Null,
            Document::Bool(b) => CanonKey::Bool(*b),
            Document::Int(i) => CanonKey::Int(*i),
            Document::Float(f) => {
                if f.is_finite() && f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                    CanonKey::Int(*f as i64)
                } else {
                    CanonKey::Float(OrderedFloat(*f))
                }
            }
            Document::String(s) => CanonKey::String(s.clone()),
            Document::Array(xs) => CanonKey::Array(xs.iter().map(CanonKey::from).collect()),
            Document::Object(m) => CanonKey::Object(
                m.iter().map(|(k, v)| (k.clone(), CanonKey::from(v))).collect()
            ),
        }
    }
}

impl Document {
    pub fn canonical(&self) -> CanonKey { CanonKey::from(self) }
}

/// First pair of structurally equal items, as `(earlier, later)` indices.
pub fn first_duplicate(items: &[Document]) -> Option<(usize, usize)> {
    let mut seen: HashMap<CanonKey, usize> = HashMap::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        if let Some(&j) = seen.get(&item.canonical()) {
            return Some((j, i));
        }
        seen.insert(item.canonical(), i);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn equal_documents_share_a_key() {
        let a = Document::from(json!({"x": [1, 2.0], "y": null}));
        let b = Document::from(json!({"y": null, "x": [1.0, 2]}));
        assert_eq!(a.canonical(), b.canonical());
    }

    #[test]
    fn finds_first_duplicate_pair() {
        let items: Vec<Document> = vec![json!({"a": 1}), json!("x"), json!({"a": 1.0}), json!("x")]
            .into_iter().map(Document::from).collect();
        assert_eq!(first_duplicate(&items), Some((0, 2)));
        assert_eq!(first_duplicate(&items[..2]), None);
    }
}
