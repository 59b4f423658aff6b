//! Diagnostics produced by one validation pass, and the report built from them.
use std::fmt;

use serde::Serialize;

use crate::path::{Path, Segment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Error,
    Warning,
    Deprecation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    MissingRequired,
    TypeMismatch,
    OutOfRange,
    InvalidEnum,
    DeprecatedProperty,
    DeprecatedValue,
    AdditionalProperty,
    PatternMismatch,
    ArraySize,
    UniqueItems,
    OneOfMismatch,
    AnyOfMismatch,
    AllOfFailure,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// `servers[0].port`; empty for the document root.
    pub path: String,
    pub message: String,
    /// 1-based source line, when the raw text was supplied and the path
    /// could be located in it.
    pub line: Option<usize>,
    pub depth: usize,
    pub severity: Severity,
    pub category: Category,
    /// Structured form of `path`, for locating the value in source text.
    #[serde(skip)]
    pub(crate) segments: Vec<Segment>,
}

impl Diagnostic {
    pub fn new(path: &Path, severity: Severity, category: Category, message: impl Into<String>) -> Self {
        Self {
            path: path.render(),
            message: message.into(),
            line: None,
            depth: path.depth(),
            severity,
            category,
            segments: path.segments().to_vec(),
        }
    }

    pub fn error(path: &Path, category: Category, message: impl Into<String>) -> Self {
        Self::new(path, Severity::Error, category, message)
    }

    pub fn warning(path: &Path, category: Category, message: impl Into<String>) -> Self {
        Self::new(path, Severity::Warning, category, message)
    }

    pub fn deprecation(path: &Path, category: Category, message: impl Into<String>) -> Self {
        Self::new(path, Severity::Deprecation, category, message)
    }

    pub fn is_error(&self) -> bool { self.severity == Severity::Error }

    /// The path, or `root`.
    pub fn location(&self) -> &str {
        if self.path.is_empty() { "root" } else { &self.path }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location(), self.message)
    }
}

// ------------------------------- Result ----------------------------------- //

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationResult {
    diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self { Self { diagnostics } }

    /// No `Error` entries; warnings and deprecations don't fail validation.
    pub fn is_valid(&self) -> bool { !self.diagnostics.iter().any(Diagnostic::is_error) }

    pub fn diagnostics(&self) -> &[Diagnostic] { &self.diagnostics }
    pub fn into_inner(self) -> Vec<Diagnostic> { self.diagnostics }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> { self.of(Severity::Error) }
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> { self.of(Severity::Warning) }
    pub fn deprecations(&self) -> impl Iterator<Item = &Diagnostic> { self.of(Severity::Deprecation) }

    pub fn first_error(&self) -> Option<&Diagnostic> { self.errors().next() }

    fn of(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.severity == severity)
    }

    /// Best-effort: fill `line` by searching the raw text for the keys of
    /// each diagnostic path.
    pub fn annotate_lines(&mut self, source: &str) {
        let lines: Vec<&str> = source.lines().collect();
        for d in &mut self.diagnostics {
            d.line = locate(&lines, &d.segments);
        }
    }

    /// Human-readable report grouped by severity.
    pub fn format(&self) -> String {
        let errors = self.errors().count();
        let warnings = self.warnings().count();
        let deprecations = self.deprecations().count();

        let counts = [(errors, "error"), (warnings, "warning"), (deprecations, "deprecation")]
            .into_iter()
            .filter(|(n, _)| *n > 0)
            .map(|(n, word)| plural(n, word))
            .collect::<Vec<_>>()
            .join(", ");

        let mut out = if errors > 0 {
            format!("Validation failed: {counts}")
        } else if counts.is_empty() {
            "Validation passed".to_string()
        } else {
            format!("Validation passed with {counts}")
        };

        for (title, severity) in [
            ("Errors", Severity::Error),
            ("Warnings", Severity::Warning),
            ("Deprecations", Severity::Deprecation),
        ] {
            let mut group = self.of(severity).peekable();
            if group.peek().is_none() {
                continue;
            }
            out.push_str(&format!("\n{title}:"));
            for d in group {
                out.push_str("\n  - ");
                if let Some(line) = d.line {
                    out.push_str(&format!("[line {line}] "));
                }
                out.push_str(&indent_continuation(&d.to_string()));
            }
        }
        out
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 { format!("{n} {word}") } else { format!("{n} {word}s") }
}

// multi-line composition messages stay under their bullet
fn indent_continuation(text: &str) -> String {
    text.replace('\n', "\n    ")
}

// ---------------------------- Line lookup --------------------------------- //

/// Walk the path forward through the text, each key searched from the line
/// where its parent was found. A key under an array index `[i]` is taken to
/// be its `i+1`-th occurrence, one per element. Returns the deepest line
/// located.
fn locate(lines: &[&str], segments: &[Segment]) -> Option<usize> {
    let mut found = None;
    let mut from = 0;
    let mut index: Option<usize> = None;
    for segment in segments {
        match segment {
            Segment::Index(i) => {
                // nested arrays can't be told apart line by line
                if index.is_some() {
                    break;
                }
                index = Some(*i);
            }
            Segment::Key(key) => {
                let skip = index.take().unwrap_or(0);
                match (from..lines.len()).filter(|&i| mentions_key(lines[i], key)).nth(skip) {
                    Some(i) => {
                        found = Some(i + 1);
                        from = i;
                    }
                    None => break,
                }
            }
        }
    }
    found
}

fn mentions_key(line: &str, key: &str) -> bool {
    if line.contains(&format!("\"{key}\"")) || line.contains(&format!("'{key}'")) {
        return true;
    }
    // bare keys: `key = 1`, `key: 1`, `[key]`
    let trimmed = line.trim_start().trim_start_matches('[');
    trimmed
        .strip_prefix(key)
        .is_some_and(|rest| {
            let rest = rest.trim_start();
            rest.starts_with(':') || rest.starts_with('=') || rest.starts_with(']')
        })
}
