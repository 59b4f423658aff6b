//! Dynamic document model.
//!
//! Every format front-end produces a [`Document`], and the validator, the
//! defaults populator and the CLI all consume the same tree. A node is exactly
//! one of six shapes; children are owned by their parent, so cloning a
//! document is always a deep copy and never aliases the source tree.
//!
//! - `Int` and `Float` stay distinct for type checks but compare numerically.
//! - Objects keep authoring order (for dumps); equality ignores key order.
//! - Typed arrays only exist at print time, see [`dump`].
pub mod canon;
pub mod dump;

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde::ser::{SerializeMap, SerializeSeq};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::path::{Path, Segment};

pub type Map = IndexMap<String, Document>;

#[derive(Debug, Clone, Default)]
pub enum Document {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Document>),
    Object(Map),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind { Null, Bool, Int, Float, String, Array, Object }

impl Kind {
    /// JSON-Schema spelling of the kind.
    pub fn name(self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Bool => "boolean",
            Kind::Int => "integer",
            Kind::Float => "number",
            Kind::String => "string",
            Kind::Array => "array",
            Kind::Object => "object",
        }
    }
}

// ------------------------------ Accessors -------------------------------- //

impl Document {
    pub fn object() -> Self { Document::Object(Map::new()) }

    pub fn kind(&self) -> Kind {
        match self {
            Document::Null => Kind::Null,
            Document::Bool(_) => Kind::Bool,
            Document::Int(_) => Kind::Int,
            Document::Float(_) => Kind::Float,
            Document::String(_) => Kind::String,
            Document::Array(_) => Kind::Array,
            Document::Object(_) => Kind::Object,
        }
    }

    pub fn kind_name(&self) -> &'static str { self.kind().name() }

    pub fn is_null(&self) -> bool { matches!(self, Document::Null) }
    pub fn is_object(&self) -> bool { matches!(self, Document::Object(_)) }
    pub fn is_array(&self) -> bool { matches!(self, Document::Array(_)) }
    pub fn is_number(&self) -> bool { matches!(self, Document::Int(_) | Document::Float(_)) }

    pub fn as_bool(&self) -> Option<bool> {
        match self { Document::Bool(b) => Some(*b), _ => None }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self { Document::Int(i) => Some(*i), _ => None }
    }

    /// Numeric view of either number kind.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Document::Int(i) => Some(*i as f64),
            Document::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Non-negative integral value, as used by count keywords (`minItems`, ...).
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Document::Int(i) if *i >= 0 => Some(*i as u64),
            Document::Float(f) if *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64 => Some(*f as u64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self { Document::String(s) => Some(s), _ => None }
    }

    pub fn as_array(&self) -> Option<&Vec<Document>> {
        match self { Document::Array(xs) => Some(xs), _ => None }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self { Document::Object(m) => Some(m), _ => None }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Map> {
        match self { Document::Object(m) => Some(m), _ => None }
    }

    pub fn get(&self, key: &str) -> Option<&Document> {
        self.as_object().and_then(|m| m.get(key))
    }

    pub fn get_index(&self, index: usize) -> Option<&Document> {
        self.as_array().and_then(|xs| xs.get(index))
    }

    /// RFC 6901 pointer lookup (`/servers/0/port`); `""` is the whole document.
    pub fn pointer(&self, pointer: &str) -> Option<&Document> {
        if pointer.is_empty() {
            return Some(self);
        }
        let rest = pointer.strip_prefix('/')?;
        let mut node = self;
        for raw in rest.split('/') {
            let token = raw.replace("~1", "/").replace("~0", "~");
            node = match node {
                Document::Object(m) => m.get(&token)?,
                Document::Array(xs) => xs.get(token.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(node)
    }

    /// Follow a diagnostic path into this document.
    pub fn at(&self, path: &Path) -> Option<&Document> {
        let mut node = self;
        for segment in path.segments() {
            node = match segment {
                Segment::Key(k) => node.get(k)?,
                Segment::Index(i) => node.get_index(*i)?,
            };
        }
        Some(node)
    }

    /// Compact JSON rendering capped at `max_chars` characters (plus `...`).
    pub fn preview(&self, max_chars: usize) -> String {
        let full = self.to_string();
        if full.chars().count() <= max_chars {
            return full;
        }
        let mut out: String = full.chars().take(max_chars).collect();
        out.push_str("...");
        out
    }

    /// Parse JSON text; `origin` names the source in errors.
    pub fn from_json_str(src: &str, origin: &str) -> Result<Self> {
        let value = serde_json::from_str::<Value>(src).map_err(|source| Error::Json {
            origin: origin.to_string(),
            source,
        })?;
        Ok(Document::from(value))
    }
}

// ------------------------------ Equality --------------------------------- //

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Document::Null, Document::Null) => true,
            (Document::Bool(a), Document::Bool(b)) => a == b,
            (Document::Int(a), Document::Int(b)) => a == b,
            (Document::Float(a), Document::Float(b)) => a == b,
            (Document::Int(i), Document::Float(f)) | (Document::Float(f), Document::Int(i)) => {
                int_equals_float(*i, *f)
            }
            (Document::String(a), Document::String(b)) => a == b,
            (Document::Array(a), Document::Array(b)) => a == b,
            (Document::Object(a), Document::Object(b)) => {
                a.len() == b.len() && a.iter().all(|(k, v)| b.get(k).is_some_and(|w| v == w))
            }
            _ => false,
        }
    }
}

fn int_equals_float(i: i64, f: f64) -> bool {
    f.is_finite()
        && f.fract() == 0.0
        && f >= i64::MIN as f64
        && f < i64::MAX as f64
        && f as i64 == i
}

// ----------------------------- Conversions ------------------------------- //

impl From<Value> for Document {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Document::Null,
            Value::Bool(b) => Document::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Document::Int(i)
                } else if let Some(u) = n.as_u64() {
                    // beyond i64::MAX
                    Document::Float(u as f64)
                } else {
                    Document::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => Document::String(s),
            Value::Array(xs) => Document::Array(xs.into_iter().map(Document::from).collect()),
            Value::Object(m) => Document::Object(
                m.into_iter().map(|(k, v)| (k, Document::from(v))).collect()
            ),
        }
    }
}

impl From<&Document> for Value {
    fn from(doc: &Document) -> Self {
        match doc {
            Document::Null => Value::Null,
            Document::Bool(b) => Value::Bool(*b),
            Document::Int(i) => Value::from(*i),
            Document::Float(f) => Value::from(*f),
            Document::String(s) => Value::String(s.clone()),
            Document::Array(xs) => Value::Array(xs.iter().map(Value::from).collect()),
            Document::Object(m) => Value::Object(
                m.iter().map(|(k, v)| (k.clone(), Value::from(v))).collect()
            ),
        }
    }
}

impl From<bool> for Document { fn from(b: bool) -> Self { Document::Bool(b) } }
impl From<i64> for Document { fn from(i: i64) -> Self { Document::Int(i) } }
impl From<f64> for Document { fn from(f: f64) -> Self { Document::Float(f) } }
impl From<&str> for Document { fn from(s: &str) -> Self { Document::String(s.to_string()) } }
impl From<String> for Document { fn from(s: String) -> Self { Document::String(s) } }

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Document::Null => serializer.serialize_unit(),
            Document::Bool(b) => serializer.serialize_bool(*b),
            Document::Int(i) => serializer.serialize_i64(*i),
            Document::Float(f) => serializer.serialize_f64(*f),
            Document::String(s) => serializer.serialize_str(s),
            Document::Array(xs) => {
                let mut seq = serializer.serialize_seq(Some(xs.len()))?;
                for x in xs { seq.serialize_element(x)?; }
                seq.end()
            }
            Document::Object(m) => {
                let mut map = serializer.serialize_map(Some(m.len()))?;
                for (k, v) in m { map.serialize_entry(k, v)?; }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Document::from)
    }
}

/// Compact JSON.
impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

// ------------------------------- Tests ------------------------------------ //
