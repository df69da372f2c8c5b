//! Error types for loading rules and matching input.

use thiserror::Error;

/// Errors produced by the Graphmaster and its collaborators
#[derive(Debug, Error)]
pub enum GraphmasterError {
    /// No path through the trie reached a category. This is an expected outcome.
    #[error("No match found for path: {path}")]
    NoMatch { path: String },

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Duplicate category at {path}: already loaded from {existing}, rejected from {incoming}")]
    DuplicateCategory {
        path: String,
        existing: String,
        incoming: String,
    },

    #[error("Malformed rule at line {line}: {reason}")]
    RuleSyntax { line: usize, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GraphmasterError {
    /// Check if this is the expected no-match outcome
    pub fn is_no_match(&self) -> bool {
        matches!(self, GraphmasterError::NoMatch { .. })
    }
}

pub type Result<T> = std::result::Result<T, GraphmasterError>;
