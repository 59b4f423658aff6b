//! Errors for loading documents, schemas and options.
//!
//! Validation never fails with an `Error`; problems found in a document are
//! reported as [`crate::Diagnostic`]s.
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid options at {path}: {message}")]
    Options { path: String, message: String },

    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("glob error: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("glob pattern matched no files: {0}")]
    NoMatches(String),

    #[error("JSON pointer {pointer} not found in {origin}")]
    PointerNotFound { pointer: String, origin: String },
}
