//! Validator configuration.
//!
//! Options are plain data, loadable from a JSON file:
//!
//! ```json
//! {
//!   "max_ref_depth": 32,
//!   "integral_floats_are_integers": true,
//!   "preview_chars": 80,
//!   "max_reported_alternatives": 5,
//!   "suggestions": true
//! }
//! ```
//!
//! Every field is optional; missing fields take their defaults.
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidatorOptions {
    /// Consecutive `$ref` hops allowed at one document node before the
    /// reference chain is reported as cyclic.
    pub max_ref_depth: usize,
    /// Let `"integer"` accept floats with no fractional part (`3.0`).
    pub integral_floats_are_integers: bool,
    /// Cap on rendered values inside diagnostic messages.
    pub preview_chars: usize,
    /// Alternatives listed in a failed `anyOf`/`oneOf` report.
    pub max_reported_alternatives: usize,
    /// Append "Did you mean ..." hints.
    pub suggestions: bool,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            max_ref_depth: 32,
            integral_floats_are_integers: true,
            preview_chars: 80,
            max_reported_alternatives: 5,
            suggestions: true,
        }
    }
}

impl ValidatorOptions {
    pub fn from_json_str(src: &str) -> Result<Self> {
        crate::path_de::from_str_with_path(src)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        crate::path_de::from_slice_with_path(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let opts = ValidatorOptions::from_json_str(r#"{"max_ref_depth": 4}"#).unwrap();
        assert_eq!(opts.max_ref_depth, 4);
        assert_eq!(opts.preview_chars, 80);
        assert!(opts.integral_floats_are_integers);
    }

    #[test]
    fn errors_name_the_offending_key() {
        let err = ValidatorOptions::from_json_str(r#"{"preview_chars": "wide"}"#).unwrap_err();
        match err {
            Error::Options { path, .. } => assert_eq!(path, "preview_chars"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(ValidatorOptions::from_json_str(r#"{"colour": true}"#).is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = std::env::temp_dir().join(format!("confcheck-options-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("options.json");
        std::fs::write(&file, r#"{"suggestions": false}"#).unwrap();
        let opts = ValidatorOptions::load(&file).unwrap();
        assert!(!opts.suggestions);
        assert!(ValidatorOptions::load(&dir.join("missing.json")).is_err());
        std::fs::remove_dir_all(&dir).ok();
    }
}
