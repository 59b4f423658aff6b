//! Discriminator heuristic for `anyOf`/`oneOf`.
//!
//! A discriminator is a property whose value picks one alternative out of
//! many, e.g. `type: "circle"` vs `type: "rectangle"`. It is inferred from
//! the alternatives themselves: a property with a `const` (or a short `enum`)
//! that is either required or has one of the conventional tag names.
//!
//! Used to narrow failure reports and to dispatch defaults; never affects
//! whether a document is valid.
use std::collections::HashMap;

use crate::document::{Document, Map};
use crate::resolve;

pub const CANONICAL_NAMES: [&str; 3] = ["type", "kind", "variant"];

/// Larger enums are treated as open value sets rather than tags.
pub const MAX_ENUM_VALUES: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct Discriminator {
    property: String,
    /// Per alternative, the tag values it accepts; `None` if it does not
    /// declare the property.
    values: Vec<Option<Vec<Document>>>,
}

impl Discriminator {
    pub fn property(&self) -> &str { &self.property }

    /// Index of the single alternative tagged with the data's value.
    pub fn select(&self, data: &Document) -> Option<usize> {
        let tag = data.get(&self.property)?;
        let mut hits = self.values.iter()
            .enumerate()
            .filter(|(_, values)| values.as_ref().is_some_and(|vs| vs.contains(tag)))
            .map(|(i, _)| i);
        match (hits.next(), hits.next()) {
            (Some(i), None) => Some(i),
            _ => None,
        }
    }
}

/// Infer the discriminator shared by at least half of `alternatives`.
pub fn find(root: &Document, alternatives: &[Document], max_hops: usize) -> Option<Discriminator> {
    if alternatives.is_empty() {
        return None;
    }
    let tagged: Vec<HashMap<String, Vec<Document>>> = alternatives.iter()
        .map(|alt| tags_of(root, alt, max_hops))
        .collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for tags in &tagged {
        for name in tags.keys() {
            *counts.entry(name.as_str()).or_default() += 1;
        }
    }
    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|(a, ca), (b, cb)| {
        cb.cmp(ca)
            .then_with(|| canonical_rank(a).cmp(&canonical_rank(b)))
            .then_with(|| a.cmp(b))
    });
    let (property, _) = ranked.into_iter()
        .filter(|(_, count)| count * 2 >= alternatives.len())
        .find(|(name, _)| separates(&tagged, name))?;

    let property = property.to_string();
    let values = tagged.iter().map(|tags| tags.get(&property).cloned()).collect();
    Some(Discriminator { property, values })
}

/// Whether the alternatives declaring `name` don't all accept the same tags.
/// A constant shared by every alternative (`apiVersion: "v1"`) selects none.
fn separates(tagged: &[HashMap<String, Vec<Document>>], name: &str) -> bool {
    let declared: Vec<&Vec<Document>> = tagged.iter().filter_map(|tags| tags.get(name)).collect();
    declared.len() < tagged.len() || declared.windows(2).any(|pair| pair[0] != pair[1])
}

fn canonical_rank(name: &str) -> usize {
    CANONICAL_NAMES.iter().position(|c| *c == name).unwrap_or(CANONICAL_NAMES.len())
}

/// Tag-like properties of one alternative, looking through `$ref` and `allOf`.
fn tags_of(root: &Document, alternative: &Document, max_hops: usize) -> HashMap<String, Vec<Document>> {
    let mut properties: Vec<(String, Document)> = Vec::new();
    let mut required: Vec<String> = Vec::new();
    collect(root, alternative, max_hops, 0, &mut properties, &mut required);

    let mut tags = HashMap::new();
    for (name, sub) in properties {
        let Ok(view) = resolve::deref_schema(root, &sub, max_hops) else { continue };
        let Some(values) = view.as_object().and_then(tag_values) else { continue };
        if required.contains(&name) || CANONICAL_NAMES.contains(&name.as_str()) {
            tags.entry(name).or_insert(values);
        }
    }
    tags
}

fn collect(
    root: &Document,
    node: &Document,
    max_hops: usize,
    depth: usize,
    properties: &mut Vec<(String, Document)>,
    required: &mut Vec<String>,
) {
    if depth > max_hops {
        return;
    }
    let Ok(view) = resolve::deref_schema(root, node, max_hops) else { return };
    let Some(schema) = view.as_object() else { return };
    if let Some(props) = schema.get("properties").and_then(Document::as_object) {
        properties.extend(props.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    if let Some(Document::Array(names)) = schema.get("required") {
        required.extend(names.iter().filter_map(Document::as_str).map(str::to_string));
    }
    if let Some(Document::Array(branches)) = schema.get("allOf") {
        for branch in branches {
            collect(root, branch, max_hops, depth + 1, properties, required);
        }
    }
}

fn tag_values(schema: &Map) -> Option<Vec<Document>> {
    if let Some(value) = schema.get("const") {
        return Some(vec![value.clone()]);
    }
    match schema.get("enum") {
        Some(Document::Array(values)) if !values.is_empty() && values.len() <= MAX_ENUM_VALUES => {
            Some(values.clone())
        }
        _ => None,
    }
}
