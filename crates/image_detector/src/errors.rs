//! Error types for image reference detection.
//!
//! [`DetectionError`] is what callers see. [`ReferenceParseError`] explains
//! why a candidate string was not accepted as a reference; the detector logs
//! it at debug level and moves on.

use thiserror::Error;
use values_merge::MergeError;

/// Errors returned by detection and analysis entry points.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectionError {
    #[error("Missing input: {input} - {reason}")]
    MissingInput { input: String, reason: String },

    #[error("Invalid path pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid configuration: {field} - {reason}")]
    InvalidConfiguration { field: String, reason: String },

    #[error("Failed to parse settings: {reason}")]
    ParseError { reason: String },

    #[error("Values merge failed: {0}")]
    Merge(#[from] MergeError),
}

/// Result type alias for detection operations.
pub type DetectionResult<T> = Result<T, DetectionError>;

/// Reasons a string is not a valid image reference.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceParseError {
    #[error("reference is empty")]
    Empty,

    #[error("reference contains template markers: {value}")]
    TemplateMarkers { value: String },

    #[error("reference contains whitespace: {value}")]
    Whitespace { value: String },

    #[error("invalid registry '{registry}'")]
    InvalidRegistry { registry: String },

    #[error("invalid repository '{repository}'")]
    InvalidRepository { repository: String },

    #[error("invalid tag '{tag}'")]
    InvalidTag { tag: String },

    #[error("invalid digest '{digest}'")]
    InvalidDigest { digest: String },
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
