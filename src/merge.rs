//! Collision handling for path-identical categories.
//!
//! When a category is added at a path that already holds one, the configured
//! [`MergePolicy`] decides which template survives.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::config::MergePolicy;
use crate::error::{GraphmasterError, Result};
use crate::trie::Category;

/// Opening tag of a random element produced by an earlier combine
static SYNTHETIC_RANDOM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*<random\s+synthetic="yes"\s*>"#).expect("valid synthetic random regex")
});

/// What `add` did with a category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The path was free; the category was stored
    Inserted,
    /// The path was taken; the new category was discarded
    Skipped,
    /// The path was taken; the new category replaced the old one
    Overwritten,
    /// The path was taken; the new template was appended to the old one
    Appended,
    /// The path was taken; both templates became random alternatives
    Combined,
}

impl AddOutcome {
    /// Check if the path already held a category
    pub fn collided(&self) -> bool {
        !matches!(self, AddOutcome::Inserted)
    }
}

/// Merges incoming categories into trie slots
#[derive(Debug, Clone)]
pub struct Merger {
    policy: MergePolicy,
    append_separator: String,
    note_each: bool,
}

impl Merger {
    pub fn new(policy: MergePolicy, append_separator: impl Into<String>, note_each: bool) -> Self {
        Merger {
            policy,
            append_separator: append_separator.into(),
            note_each,
        }
    }

    /// Store `incoming` in `slot`, resolving any collision by policy
    pub fn merge(&self, slot: &mut Option<Category>, incoming: Category) -> Result<AddOutcome> {
        let Some(existing) = slot.as_mut() else {
            *slot = Some(incoming);
            return Ok(AddOutcome::Inserted);
        };

        if self.note_each {
            warn!(
                policy = self.policy.as_str(),
                path = %incoming.path(),
                existing = %existing.provenance(),
                incoming = %incoming.provenance(),
                "path-identical category"
            );
        }

        match self.policy {
            MergePolicy::Skip => Ok(AddOutcome::Skipped),
            MergePolicy::Overwrite => {
                *existing = incoming;
                Ok(AddOutcome::Overwritten)
            }
            MergePolicy::Append => {
                existing.template =
                    append_template(&existing.template, &incoming.template, &self.append_separator);
                absorb_sources(existing, incoming);
                Ok(AddOutcome::Appended)
            }
            MergePolicy::Combine => {
                existing.template = combine_templates(&existing.template, &incoming.template);
                absorb_sources(existing, incoming);
                Ok(AddOutcome::Combined)
            }
            MergePolicy::Error => Err(GraphmasterError::DuplicateCategory {
                path: incoming.path(),
                existing: existing.provenance(),
                incoming: incoming.provenance(),
            }),
        }
    }
}

fn absorb_sources(existing: &mut Category, incoming: Category) {
    for source in incoming.sources {
        if !existing.has_source(&source) {
            existing.sources.push(source);
        }
    }
}

/// Append one template's content to another
pub fn append_template(existing: &str, incoming: &str, separator: &str) -> String {
    let mut result = String::with_capacity(existing.len() + separator.len() + incoming.len());
    result.push_str(existing);
    result.push_str(separator);
    result.push_str(incoming);
    result
}

/// Offer two templates as equally likely alternatives.
///
/// The first combine wraps both templates in a synthetic random element; later
/// combines on the same path add one more `<li>` to it, so every template
/// keeps an equal share.
pub fn combine_templates(existing: &str, incoming: &str) -> String {
    if SYNTHETIC_RANDOM.is_match(existing) {
        if let Some(close) = existing.rfind("</random>") {
            let mut result = String::with_capacity(existing.len() + incoming.len() + 9);
            result.push_str(&existing[..close]);
            result.push_str("<li>");
            result.push_str(incoming);
            result.push_str("</li>");
            result.push_str(&existing[close..]);
            return result;
        }
    }

    format!(
        "<random synthetic=\"yes\"><li>{}</li><li>{}</li></random>",
        existing, incoming
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(template: &str, source: &str) -> Category {
        Category::new("HI", "*", "*", template, source)
    }

    fn merger(policy: MergePolicy) -> Merger {
        Merger::new(policy, " ", false)
    }

    #[test]
    fn test_insert_into_empty_slot() {
        let mut slot = None;
        let outcome = merger(MergePolicy::Error).merge(&mut slot, category("A", "a")).unwrap();
        assert_eq!(outcome, AddOutcome::Inserted);
        assert!(!outcome.collided());
        assert_eq!(slot.unwrap().template, "A");
    }

    #[test]
    fn test_skip_keeps_first() {
        let mut slot = Some(category("A", "a"));
        let outcome = merger(MergePolicy::Skip).merge(&mut slot, category("B", "b")).unwrap();
        assert_eq!(outcome, AddOutcome::Skipped);
        assert!(outcome.collided());
        assert_eq!(slot.unwrap().template, "A");
    }

    #[test]
    fn test_overwrite_keeps_last() {
        let mut slot = Some(category("A", "a"));
        merger(MergePolicy::Overwrite).merge(&mut slot, category("B", "b")).unwrap();
        let stored = slot.unwrap();
        assert_eq!(stored.template, "B");
        assert_eq!(stored.sources, vec!["b"]);
    }

    #[test]
    fn test_append() {
        let mut slot = Some(category("A", "a"));
        let outcome = merger(MergePolicy::Append).merge(&mut slot, category("B", "b")).unwrap();
        assert_eq!(outcome, AddOutcome::Appended);
        let stored = slot.unwrap();
        assert_eq!(stored.template, "A B");
        assert_eq!(stored.provenance(), "a, b");
    }

    #[test]
    fn test_error_policy_leaves_slot() {
        let mut slot = Some(category("A", "a"));
        let err = merger(MergePolicy::Error).merge(&mut slot, category("B", "b")).unwrap_err();
        assert!(matches!(err, GraphmasterError::DuplicateCategory { .. }));
        assert_eq!(slot.unwrap().template, "A");
    }

    #[test]
    fn test_combine_balances_alternatives() {
        let once = combine_templates("A", "B");
        assert_eq!(once, "<random synthetic=\"yes\"><li>A</li><li>B</li></random>");

        let twice = combine_templates(&once, "C");
        assert_eq!(
            twice,
            "<random synthetic=\"yes\"><li>A</li><li>B</li><li>C</li></random>"
        );
    }

    #[test]
    fn test_combine_does_not_extend_authored_random() {
        let authored = "<random><li>X</li></random>";
        let combined = combine_templates(authored, "Y");
        assert!(combined.starts_with("<random synthetic=\"yes\"><li><random>"));
    }
}
