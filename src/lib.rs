//! Schema validation and defaults population for configuration documents.
//!
//! ```ignore
//! let schema = Document::from_json_str(schema_src, "schema.json")?;
//! let config = Document::from_json_str(config_src, "config.json")?;
//! let (populated, report) = confcheck::check(&config, &schema, Some(config_src));
//! if !report.is_valid() {
//!     eprintln!("{report}");
//! }
//! ```
pub mod compose;
pub mod defaults;
pub mod diagnostic;
pub mod discriminator;
pub mod document;
pub mod error;
pub mod options;
pub mod path;
pub mod path_de;
pub mod resolve;
pub mod suggest;
pub mod validate;

pub use diagnostic::{Category, Diagnostic, Severity, ValidationResult};
pub use document::Document;
pub use error::{Error, Result};
pub use options::ValidatorOptions;
pub use path::Path;

use validate::Validator;

// ---- Context ---- //

/// Per-call inputs besides the document and schema.
#[derive(Debug, Clone, Default)]
pub struct ValidationContext<'a> {
    /// The document as the user wrote it, before defaults were applied.
    /// Failure reports render values from here.
    pub original: Option<&'a Document>,
    /// Raw text the document was parsed from, for line numbers.
    pub source: Option<&'a str>,
    pub options: ValidatorOptions,
}

impl<'a> ValidationContext<'a> {
    pub fn new() -> Self { Self::default() }
    pub fn with_original(mut self, original: &'a Document) -> Self {
        self.original = Some(original);
        self
    }
    pub fn with_source(mut self, source: &'a str) -> Self {
        self.source = Some(source);
        self
    }
    pub fn with_options(mut self, options: ValidatorOptions) -> Self {
        self.options = options;
        self
    }
}

// ---- Free functions ---- //

/// First error as `"<path or root>: <message>"`, or `None` when valid.
pub fn validate(data: &Document, schema: &Document) -> Option<String> {
    validate_all(data, schema, None).first_error().map(ToString::to_string)
}

pub fn validate_all(data: &Document, schema: &Document, source: Option<&str>) -> ValidationResult {
    let ctx = ValidationContext { source, ..Default::default() };
    validate_with(data, schema, &ctx)
}

pub fn validate_with(data: &Document, schema: &Document, ctx: &ValidationContext) -> ValidationResult {
    let diagnostics = Validator::new(schema, &ctx.options)
        .with_original(ctx.original)
        .validate(data);
    tracing::trace!(count = diagnostics.len(), "validation finished");
    let mut result = ValidationResult::new(diagnostics);
    if let Some(source) = ctx.source {
        result.annotate_lines(source);
    }
    result
}

pub fn set_defaults(data: &Document, schema: &Document) -> Document {
    defaults::apply_defaults(data, schema)
}

/// Populate defaults, then validate the result, rendering failures with the
/// values from `data`.
pub fn check(data: &Document, schema: &Document, source: Option<&str>) -> (Document, ValidationResult) {
    SchemaValidator::new(schema.clone()).check(data, source)
}

// ---- SchemaValidator ---- //

/// A schema with its options, reusable across documents and threads.
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    schema: Document,
    options: ValidatorOptions,
}

impl SchemaValidator {
    pub fn new(schema: Document) -> Self {
        Self { schema, options: ValidatorOptions::default() }
    }

    pub fn with_options(schema: Document, options: ValidatorOptions) -> Self {
        Self { schema, options }
    }

    pub fn schema(&self) -> &Document { &self.schema }
    pub fn options(&self) -> &ValidatorOptions { &self.options }

    pub fn validate(&self, data: &Document) -> Option<String> {
        self.validate_all(data, None).first_error().map(ToString::to_string)
    }

    pub fn validate_all(&self, data: &Document, source: Option<&str>) -> ValidationResult {
        self.validate_with(data, source, None)
    }

    pub fn validate_with(&self, data: &Document, source: Option<&str>, original: Option<&Document>) -> ValidationResult {
        let ctx = ValidationContext { original, source, options: self.options.clone() };
        validate_with(data, &self.schema, &ctx)
    }

    pub fn set_defaults(&self, data: &Document) -> Document {
        defaults::apply_defaults_with(data, &self.schema, &self.options)
    }

    pub fn check(&self, data: &Document, source: Option<&str>) -> (Document, ValidationResult) {
        let populated = self.set_defaults(data);
        let result = self.validate_with(&populated, source, Some(data));
        (populated, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: serde_json::Value) -> Document { Document::from(v) }

    #[test]
    fn schema_validator_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SchemaValidator>();
    }

    #[test]
    fn missing_required_is_reported_once_at_its_key() {
        let schema = doc(json!({"type": "object", "required": ["k"]}));
        let result = validate_all(&doc(json!({"other": 1})), &schema, None);
        let missing: Vec<_> = result.errors().filter(|d| d.category == Category::MissingRequired).collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].path, "k");
        assert!(missing[0].message.contains("missing required"));
        assert!(!result.is_valid());
    }

    #[test]
    fn validate_returns_first_error_text() {
        let schema = doc(json!({"properties": {"port": {"type": "integer"}}}));
        assert_eq!(
            validate(&doc(json!({"port": "80"})), &schema).as_deref(),
            Some("port: expected type integer, got string \"80\"")
        );
        assert_eq!(validate(&doc(json!({"port": 80})), &schema), None);
    }

    #[test]
    fn typo_in_required_key_is_suggested() {
        let schema = doc(json!({"type": "object", "required": ["name", "age", "address"]}));
        let text = validate(&doc(json!({"name": "a", "age": 1, "addrss": "b"})), &schema).unwrap();
        assert!(text.contains("Did you mean 'address'?"), "{text}");
    }

    #[test]
    fn check_populates_then_validates() {
        let schema = doc(json!({
            "type": "object",
            "properties": {"port": {"type": "integer", "default": 8080}},
            "required": ["port"]
        }));
        let (populated, result) = check(&doc(json!({})), &schema, None);
        assert_eq!(populated, doc(json!({"port": 8080})));
        assert!(result.is_valid(), "{result}");
        assert_eq!(set_defaults(&doc(json!({"port": 100})), &schema), doc(json!({"port": 100})));
    }

    #[test]
    fn any_of_report_names_only_the_selected_shape() {
        let schema = doc(json!({
            "type": "object",
            "properties": {
                "shape": {
                    "anyOf": [
                        {
                            "title": "Circle",
                            "properties": {"type": {"const": "circle"}, "radius": {"type": "number"}, "color": {"default": "red"}},
                            "required": ["type", "radius"]
                        },
                        {
                            "title": "Rectangle",
                            "properties": {"type": {"const": "rectangle"}, "width": {"type": "number"}, "height": {"type": "number"}},
                            "required": ["type", "width", "height"]
                        }
                    ]
                }
            }
        }));
        let (_, result) = check(&doc(json!({"shape": {"type": "circle"}})), &schema, None);
        let errors: Vec<_> = result.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].category, Category::AnyOfMismatch);
        let text = errors[0].to_string();
        assert!(text.starts_with("shape: "), "{text}");
        assert!(text.contains("Circle") && text.contains("radius"), "{text}");
        assert!(!text.contains("Rectangle"), "{text}");
        // the populated `color` never reached the user's file
        assert!(text.ends_with("value: {\"type\":\"circle\"}"), "{text}");
    }

    #[test]
    fn line_numbers_come_from_source() {
        let source = "{\n  \"name\": \"svc\",\n  \"port\": \"80\"\n}\n";
        let data = Document::from_json_str(source, "inline").unwrap();
        let schema = doc(json!({"properties": {"port": {"type": "integer"}}}));
        let result = validate_all(&data, &schema, Some(source));
        assert_eq!(result.first_error().and_then(|d| d.line), Some(3));
        assert!(result.format().contains("[line 3] port: expected type integer"));
    }

    #[test]
    fn options_flow_through_context() {
        let schema = doc(json!({"type": "integer"}));
        let strict = ValidatorOptions { integral_floats_are_integers: false, ..Default::default() };
        let ctx = ValidationContext::new().with_options(strict);
        assert!(!validate_with(&doc(json!(2.0)), &schema, &ctx).is_valid());
        assert!(validate_all(&doc(json!(2.0)), &schema, None).is_valid());
    }
}
