//! Loading categories from tab-separated rule text.
//!
//! Each non-empty, non-comment line is one category:
//!
//! ```text
//! pattern<TAB>that<TAB>topic<TAB>template
//! pattern<TAB>template
//! ```
//!
//! Empty that/topic fields default to `*`. A bad line is logged and counted,
//! and loading carries on with the next one.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::config::Settings;
use crate::error::{GraphmasterError, Result};
use crate::graphmaster::Graphmaster;
use crate::merge::AddOutcome;

/// Counts from one load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Categories stored at a free path
    pub loaded: usize,
    /// Categories that hit an occupied path
    pub duplicates: usize,
    /// Lines rejected as malformed or invalid
    pub rejected: usize,
}

impl LoadReport {
    fn record(&mut self, outcome: AddOutcome) {
        if outcome.collided() {
            self.duplicates += 1;
        } else {
            self.loaded += 1;
        }
    }

    fn absorb(&mut self, other: LoadReport) {
        self.loaded += other.loaded;
        self.duplicates += other.duplicates;
        self.rejected += other.rejected;
    }
}

/// One parsed rule line
#[derive(Debug, Clone, PartialEq, Eq)]
struct RuleLine<'a> {
    pattern: &'a str,
    that: &'a str,
    topic: &'a str,
    template: &'a str,
}

fn or_star(field: &str) -> &str {
    if field.trim().is_empty() {
        "*"
    } else {
        field
    }
}

fn parse_line(line: &str, line_no: usize) -> Result<RuleLine<'_>> {
    let parts: Vec<&str> = line.splitn(4, '\t').collect();
    let rule = match parts.as_slice() {
        [pattern, that, topic, template] => RuleLine {
            pattern: *pattern,
            that: or_star(*that),
            topic: or_star(*topic),
            template: *template,
        },
        [pattern, template] => RuleLine {
            pattern: *pattern,
            that: "*",
            topic: "*",
            template: *template,
        },
        _ => {
            return Err(GraphmasterError::RuleSyntax {
                line: line_no,
                reason: format!("expected 2 or 4 tab-separated fields, found {}", parts.len()),
            })
        }
    };

    if rule.template.trim().is_empty() {
        return Err(GraphmasterError::RuleSyntax {
            line: line_no,
            reason: "empty template".to_string(),
        });
    }

    Ok(rule)
}

/// Add every rule in `content` to `graphmaster`, in order
pub fn load_tsv(graphmaster: &Graphmaster, content: &str, source: &str) -> LoadReport {
    let mut report = LoadReport::default();

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim_end_matches('\r');
        if trimmed.trim().is_empty() || trimmed.trim_start().starts_with('#') {
            continue;
        }

        let added = parse_line(trimmed, line_no).and_then(|rule| {
            graphmaster.add(rule.pattern, rule.that, rule.topic, rule.template, source)
        });

        match added {
            Ok(outcome) => report.record(outcome),
            Err(e) => {
                warn!(source, line = line_no, error = %e, "rejected rule");
                report.rejected += 1;
            }
        }
    }

    info!(
        source,
        loaded = report.loaded,
        duplicates = report.duplicates,
        rejected = report.rejected,
        "loaded rules"
    );
    report
}

/// Read a rule file and add its rules, using the path as the source name
pub fn load_file(graphmaster: &Graphmaster, path: impl AsRef<Path>) -> Result<LoadReport> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    Ok(load_tsv(graphmaster, &content, &path.display().to_string()))
}

/// Builder for a Graphmaster loaded from rule text
pub struct GraphmasterBuilder {
    graphmaster: Graphmaster,
    report: LoadReport,
}

impl GraphmasterBuilder {
    /// Create a new builder
    pub fn new(settings: Settings) -> Self {
        GraphmasterBuilder {
            graphmaster: Graphmaster::new(settings),
            report: LoadReport::default(),
        }
    }

    /// Load rules from a TSV string
    pub fn load_tsv(&mut self, tsv_content: &str, source: &str) -> &mut Self {
        let report = load_tsv(&self.graphmaster, tsv_content, source);
        self.report.absorb(report);
        self
    }

    /// Load rules from a TSV file
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        let report = load_file(&self.graphmaster, path)?;
        self.report.absorb(report);
        Ok(self)
    }

    /// Counts accumulated over all loads so far
    pub fn report(&self) -> LoadReport {
        self.report
    }

    /// Build and return the Graphmaster
    pub fn build(self) -> Graphmaster {
        info!("{}", self.graphmaster.category_report());
        self.graphmaster
    }
}

impl Default for GraphmasterBuilder {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
