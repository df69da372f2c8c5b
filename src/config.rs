//! Runtime settings for the Graphmaster and the responder.
//!
//! Settings are plain serde structs so they can be read from a JSON file;
//! every field has a default, so `{}` is a valid configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{GraphmasterError, Result};

/// What to do when two categories normalize to the same path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergePolicy {
    /// Keep the first category, discard the new one
    #[default]
    Skip,
    /// Replace the stored category with the new one
    Overwrite,
    /// Append the new template to the stored one
    Append,
    /// Offer both templates as alternatives of a synthetic random
    Combine,
    /// Reject the new category with an error
    Error,
}

impl MergePolicy {
    /// Convert to a string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            MergePolicy::Skip => "skip",
            MergePolicy::Overwrite => "overwrite",
            MergePolicy::Append => "append",
            MergePolicy::Combine => "combine",
            MergePolicy::Error => "error",
        }
    }
}

impl std::str::FromStr for MergePolicy {
    type Err = GraphmasterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(MergePolicy::Skip),
            "overwrite" => Ok(MergePolicy::Overwrite),
            "append" => Ok(MergePolicy::Append),
            "combine" => Ok(MergePolicy::Combine),
            "error" => Ok(MergePolicy::Error),
            other => Err(GraphmasterError::Config(format!(
                "unknown merge policy '{}'",
                other
            ))),
        }
    }
}

/// Settings shared by the Graphmaster, the rule loader and the responder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Collision handling for path-identical categories
    pub merge_policy: MergePolicy,
    /// Log a warning for every collision
    pub note_each_merge: bool,
    /// Text inserted between templates by the append policy
    pub merge_append_separator: String,
    /// Log progress every this many loaded categories (0 disables)
    pub category_load_notify_interval: usize,
    /// Maximum number of trie steps a single match may take
    pub max_match_steps: usize,
    /// Wall-clock budget for a single match in milliseconds (0 disables).
    ///
    /// A non-zero budget makes the outcome depend on machine load, so the
    /// same input may match on one call and not on the next.
    pub response_timeout_ms: u64,
    /// Try `_` before literal words, as classic AIML orders them
    pub underscore_first: bool,
    /// Validate raw pattern text against the AIML pattern grammar
    pub strict_patterns: bool,
    /// Strings after which the responder splits input into sentences
    pub sentence_splitters: Vec<String>,
    /// Maximum nesting of symbolic reductions
    pub max_recursion_depth: usize,
    /// Input reduced instead when the recursion limit is hit
    pub infinite_loop_input: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            merge_policy: MergePolicy::Skip,
            note_each_merge: true,
            merge_append_separator: " ".to_string(),
            category_load_notify_interval: 5000,
            max_match_steps: 1_000_000,
            response_timeout_ms: 0,
            underscore_first: false,
            strict_patterns: false,
            sentence_splitters: vec![
                ".".to_string(),
                "!".to_string(),
                "?".to_string(),
                ";".to_string(),
            ],
            max_recursion_depth: 32,
            infinite_loop_input: "INFINITE LOOP".to_string(),
        }
    }
}

impl Settings {
    /// Create settings with all defaults
    pub fn new() -> Self {
        Settings::default()
    }

    /// Parse settings from a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read settings from a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Builder-style merge policy override
    pub fn with_merge_policy(mut self, policy: MergePolicy) -> Self {
        self.merge_policy = policy;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.max_match_steps == 0 {
            return Err(GraphmasterError::Config(
                "max_match_steps must be greater than zero".to_string(),
            ));
        }
        if self.sentence_splitters.iter().any(|s| s.is_empty()) {
            return Err(GraphmasterError::Config(
                "sentence splitters must not be empty strings".to_string(),
            ));
        }
        Ok(())
    }
}
