//! The result of a successful match.

use serde::{Deserialize, Serialize};

use crate::token::Segment;
use crate::trie::Category;

/// A matched category together with the words its wildcards captured.
///
/// A `Match` is an owned snapshot: it stays valid after the trie changes and
/// its star lists can be read any number of times.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Match {
    /// Template text of the matched category
    pub template: String,
    /// Sources of the matched category
    pub sources: Vec<String>,
    /// Input segment of the walked path, e.g. `MY NAME IS *`
    pub pattern: String,
    /// That segment of the walked path
    pub that: String,
    /// Topic segment of the walked path
    pub topic: String,
    /// Words captured by wildcards in the input segment, left to right
    pub input_stars: Vec<String>,
    /// Words captured by wildcards in the that segment, left to right
    pub that_stars: Vec<String>,
    /// Words captured by wildcards in the topic segment, left to right
    pub topic_stars: Vec<String>,
}

impl Match {
    pub(crate) fn new(category: &Category) -> Self {
        Match {
            template: category.template.clone(),
            sources: category.sources.clone(),
            ..Default::default()
        }
    }

    /// Template text of the matched category
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Sources of the matched category
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Input segment of the walked path
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn that(&self) -> &str {
        &self.that
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The walked path in `pattern : that : topic` form
    pub fn path(&self) -> String {
        format!("{} : {} : {}", self.pattern, self.that, self.topic)
    }

    pub fn input_stars(&self) -> &[String] {
        &self.input_stars
    }

    pub fn that_stars(&self) -> &[String] {
        &self.that_stars
    }

    pub fn topic_stars(&self) -> &[String] {
        &self.topic_stars
    }

    /// Stars captured in the given segment
    pub fn stars(&self, segment: Segment) -> &[String] {
        match segment {
            Segment::Input => &self.input_stars,
            Segment::That => &self.that_stars,
            Segment::Topic => &self.topic_stars,
        }
    }

    /// The `index`-th input star, counting from 1 as AIML does
    pub fn input_star(&self, index: usize) -> Option<&str> {
        nth_star(&self.input_stars, index)
    }

    /// The `index`-th that star, counting from 1
    pub fn that_star(&self, index: usize) -> Option<&str> {
        nth_star(&self.that_stars, index)
    }

    /// The `index`-th topic star, counting from 1
    pub fn topic_star(&self, index: usize) -> Option<&str> {
        nth_star(&self.topic_stars, index)
    }

    pub(crate) fn stars_mut(&mut self, segment: Segment) -> &mut Vec<String> {
        match segment {
            Segment::Input => &mut self.input_stars,
            Segment::That => &mut self.that_stars,
            Segment::Topic => &mut self.topic_stars,
        }
    }

    pub(crate) fn segment_path_mut(&mut self, segment: Segment) -> &mut String {
        match segment {
            Segment::Input => &mut self.pattern,
            Segment::That => &mut self.that,
            Segment::Topic => &mut self.topic,
        }
    }
}

fn nth_star(stars: &[String], index: usize) -> Option<&str> {
    index
        .checked_sub(1)
        .and_then(|i| stars.get(i))
        .map(String::as_str)
}
