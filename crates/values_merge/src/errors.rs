//! Error types for layered values merging.
//!
//! Recoverable anomalies in component declarations (missing nested components,
//! non-tree override blocks, dependency cycles) are logged and skipped; they
//! never surface here. Only failures that abort a merge session do.

use thiserror::Error;

/// Errors that abort a merge session.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MergeError {
    #[error("Invalid value assignment '{assignment}': {reason}")]
    InvalidAssignment { assignment: String, reason: String },

    #[error("Maximum merge depth of {max_depth} exceeded at path '{path}'")]
    MaxDepthExceeded { path: String, max_depth: usize },
}

/// Result type alias for merge operations.
pub type MergeResult<T> = Result<T, MergeError>;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
