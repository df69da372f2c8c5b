//! Token representation for match paths.
//!
//! A Token is one step of a path through the Graphmaster: a literal word, one
//! of the two wildcards, or a separator between the input, that and topic
//! segments.

use serde::{Deserialize, Serialize};

/// The segment of a match path a token belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Segment {
    /// The user input (the category's pattern)
    #[default]
    Input,
    /// The bot's previous utterance
    That,
    /// The current topic
    Topic,
}

impl Segment {
    /// Convert to a string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Segment::Input => "INPUT",
            Segment::That => "THAT",
            Segment::Topic => "TOPIC",
        }
    }
}

/// A single step of a match path.
///
/// The declaration order is only used for ordered storage of trie children;
/// matching priority is fixed by the matcher, not by this ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Token {
    /// `_`: one or more words, tried before `*`
    Underscore,
    /// An uppercase alphanumeric word
    Word(String),
    /// `*`: one or more words, tried after literals
    Star,
    /// Marks the start of the that segment
    ThatSeparator,
    /// Marks the start of the topic segment
    TopicSeparator,
}

impl Token {
    /// Classify a normalized word
    pub fn from_word(word: &str) -> Self {
        match word {
            "*" => Token::Star,
            "_" => Token::Underscore,
            _ => Token::Word(word.to_string()),
        }
    }

    /// Check if this is a segment separator
    pub fn is_separator(&self) -> bool {
        matches!(self, Token::ThatSeparator | Token::TopicSeparator)
    }

    /// The segment entered by crossing this token, if it is a separator
    pub fn entered_segment(&self) -> Option<Segment> {
        match self {
            Token::ThatSeparator => Some(Segment::That),
            Token::TopicSeparator => Some(Segment::Topic),
            _ => None,
        }
    }

    /// The text form used in paths and captured stars
    pub fn as_str(&self) -> &str {
        match self {
            Token::Underscore => "_",
            Token::Word(w) => w,
            Token::Star => "*",
            Token::ThatSeparator => "<THAT>",
            Token::TopicSeparator => "<TOPIC>",
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
