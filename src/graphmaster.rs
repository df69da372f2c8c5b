//! The Graphmaster: the shared, thread-safe home of all categories.
//!
//! Categories are inserted under their normalized `pattern <THAT> that <TOPIC>
//! topic` path and looked up with a best-first wildcard search. One
//! `Graphmaster` serves one bot (or one group of bots sharing a rule set) and
//! is shared as `Arc<Graphmaster>`. Matching takes a read lock and returns an
//! owned [`Match`], so a template evaluator can call back into
//! [`Graphmaster::match_input`] while expanding the result.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::arbiter::check_pattern;
use crate::config::Settings;
use crate::error::{GraphmasterError, Result};
use crate::match_result::Match;
use crate::matcher::{Exhaustion, MatchOptions, Matcher, MAX_PATH_LEN};
use crate::merge::{AddOutcome, Merger};
use crate::token::Token;
use crate::tokenizer::{category_path, input_path, normalize, tokens_to_text};
use crate::trie::{Category, Trie};

/// Trie plus the counters that change with it
#[derive(Debug, Default)]
struct State {
    trie: Trie,
    /// Categories stored at a previously empty path
    total_inserted: usize,
    /// Adds that hit an occupied path, whatever the policy did
    duplicates: usize,
}

/// The category store and matcher
#[derive(Debug)]
pub struct Graphmaster {
    state: RwLock<State>,
    merger: Merger,
    options: MatchOptions,
    settings: Settings,
}

impl Default for Graphmaster {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl Graphmaster {
    /// Create an empty Graphmaster
    pub fn new(settings: Settings) -> Self {
        Graphmaster {
            state: RwLock::new(State::default()),
            merger: Merger::new(
                settings.merge_policy,
                settings.merge_append_separator.clone(),
                settings.note_each_merge,
            ),
            options: MatchOptions::from(&settings),
            settings,
        }
    }

    /// The settings this Graphmaster was built with
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a category.
    ///
    /// The three path components are raw text and are normalized here. Empty
    /// and all-wildcard patterns are legal; paths longer than [`MAX_PATH_LEN`]
    /// tokens are rejected. When the path is already taken the configured
    /// merge policy decides the outcome.
    pub fn add(
        &self,
        pattern: &str,
        that: &str,
        topic: &str,
        template: &str,
        source: &str,
    ) -> Result<AddOutcome> {
        if self.settings.strict_patterns {
            for part in [pattern, that, topic] {
                if !part.trim().is_empty() {
                    check_pattern(part.trim())?;
                }
            }
        }

        let path = category_path(pattern, that, topic);
        if path.len() > MAX_PATH_LEN {
            return Err(GraphmasterError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: format!(
                    "path has {} tokens, the limit is {}",
                    path.len(),
                    MAX_PATH_LEN
                ),
            });
        }
        let category = Category::new(
            tokens_to_text(&normalize(pattern)),
            tokens_to_text(&normalize(that)),
            tokens_to_text(&normalize(topic)),
            template,
            source,
        );

        let mut state = self.write();
        let outcome = state
            .trie
            .upsert(&path, |slot| self.merger.merge(slot, category));

        match outcome {
            Ok(AddOutcome::Inserted) => {
                state.total_inserted += 1;
                let interval = self.settings.category_load_notify_interval;
                if interval > 0 && state.total_inserted % interval == 0 {
                    info!("{} categories loaded so far", state.total_inserted);
                }
            }
            Ok(_) | Err(GraphmasterError::DuplicateCategory { .. }) => state.duplicates += 1,
            Err(_) => {}
        }

        outcome
    }

    /// Find the best category for an input in its conversational context.
    ///
    /// `that` is the bot's previous reply and `topic` the current topic; empty
    /// values match as `*`. Failing to match is an ordinary
    /// [`GraphmasterError::NoMatch`].
    pub fn match_input(&self, input: &str, that: &str, topic: &str) -> Result<Match> {
        let path = input_path(input, that, topic);
        let started = Instant::now();

        let (result, steps) = {
            let state = self.read();
            let mut matcher = Matcher::new(&path, self.options);
            let result = matcher.run(state.trie.root());
            (result, matcher.steps())
        };

        match result {
            Ok(matched) => {
                debug!(
                    input = %tokens_to_text(&path),
                    matched = %matched.path(),
                    steps,
                    elapsed_us = started.elapsed().as_micros() as u64,
                    "match"
                );
                Ok(matched)
            }
            Err(reason) => {
                let attempted = tokens_to_text(&path);
                match reason {
                    Exhaustion::Complete => {
                        debug!(input = %attempted, steps, "no match");
                    }
                    Exhaustion::StepBudget | Exhaustion::Timeout | Exhaustion::PathTooLong => {
                        warn!(input = %attempted, steps, ?reason, "match abandoned");
                    }
                }
                Err(GraphmasterError::NoMatch { path: attempted })
            }
        }
    }

    /// Remove the category at a path
    pub fn remove(&self, pattern: &str, that: &str, topic: &str) -> Option<Category> {
        let path = category_path(pattern, that, topic);
        self.write().trie.remove(&path)
    }

    /// Remove every category loaded from `source`, returning how many went
    pub fn unload(&self, source: &str) -> usize {
        let removed = self.write().trie.remove_where(|c| c.has_source(source));
        info!(source, removed, "unloaded categories");
        removed
    }

    /// Get the category stored at an exact path, without wildcard matching
    pub fn get(&self, pattern: &str, that: &str, topic: &str) -> Option<Category> {
        let path = category_path(pattern, that, topic);
        self.read().trie.get(&path).cloned()
    }

    /// Check whether any category came from `source`
    pub fn has_loaded(&self, source: &str) -> bool {
        let state = self.read();
        let mut found = false;
        state.trie.for_each_category(|c| found |= c.has_source(source));
        found
    }

    /// Snapshot of all categories in path order
    pub fn categories(&self) -> Vec<Category> {
        let mut categories = Vec::new();
        self.read()
            .trie
            .for_each_category(|c| categories.push(c.clone()));
        categories
    }

    /// Number of categories currently stored
    pub fn category_count(&self) -> usize {
        self.read().trie.len()
    }

    /// Number of categories ever stored at a free path
    pub fn total_inserted(&self) -> usize {
        self.read().total_inserted
    }

    /// Number of adds that hit an occupied path
    pub fn duplicate_count(&self) -> usize {
        self.read().duplicates
    }

    /// Number of trie nodes, including the root
    pub fn node_count(&self) -> usize {
        self.read().trie.node_count()
    }

    /// Operator-facing summary of the category count
    pub fn category_report(&self) -> String {
        format!("{} total categories currently loaded.", self.category_count())
    }

    /// Whether a path component would be accepted in strict mode
    pub fn is_valid_pattern(text: &str) -> bool {
        check_pattern(text).is_ok()
    }

    /// The normalized path an input would be matched with
    pub fn input_path_text(input: &str, that: &str, topic: &str) -> String {
        tokens_to_text(&input_path(input, that, topic))
    }

    /// Check whether the trie holds any path that starts with `token`
    pub fn has_branch(&self, token: &Token) -> bool {
        self.read().trie.walk(token, None).is_some()
    }
}
