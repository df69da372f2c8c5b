//! The AIML pattern grammar, and matching of a single pattern without a trie.
//!
//! A pattern is one or more space-separated words, where each word is `*`,
//! `_` or a run of uppercase letters and digits. Loaders that want to reject
//! sloppy rule text use [`check_pattern`]; [`matches`] answers whether one
//! literal string fits one pattern, which is handy for tooling and tests.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use crate::error::{GraphmasterError, Result};

static AIML_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\*|_|[\p{Lu}\p{Nd}]+)( (\*|_|[\p{Lu}\p{Nd}]+))*$")
        .expect("valid AIML pattern grammar")
});

static NON_ALPHANUMERIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^\p{Lu}\p{Ll}\p{Nd}\s]+").expect("valid non-alphanumeric regex")
});

/// What a wildcard stands for in a compiled pattern
const WILDCARD_REGEX: &str = "[^ ]+( [^ ]+)*";

/// Replace runs of non-alphanumeric characters with a space and collapse whitespace
pub fn generically_normalize(text: &str) -> String {
    NON_ALPHANUMERIC
        .replace_all(text, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Check that a pattern follows the AIML pattern grammar
pub fn check_pattern(pattern: &str) -> Result<()> {
    if AIML_PATTERN.is_match(pattern) {
        Ok(())
    } else {
        let reason = if pattern.is_empty() {
            "pattern is empty"
        } else {
            "words must be *, _ or uppercase letters and digits separated by single spaces"
        };
        Err(GraphmasterError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        })
    }
}

/// Compile a pattern into an anchored regular expression
pub fn compile(pattern: &str, ignore_case: bool) -> Result<Regex> {
    check_pattern(pattern)?;

    let body = pattern
        .split(' ')
        .map(|word| match word {
            "*" | "_" => WILDCARD_REGEX.to_string(),
            literal => regex::escape(literal),
        })
        .collect::<Vec<_>>()
        .join(" ");

    RegexBuilder::new(&format!("^{}$", body))
        .case_insensitive(ignore_case)
        .build()
        .map_err(|e| GraphmasterError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

/// Check whether a literal string matches a pattern
pub fn matches(literal: &str, pattern: &str, ignore_case: bool) -> Result<bool> {
    let regex = compile(pattern, ignore_case)?;
    Ok(regex.is_match(&generically_normalize(literal)))
}
