//! # graphmaster-rs
//!
//! An AIML Graphmaster: the pattern store and matcher at the heart of an
//! AIML chatbot.
//!
//! Categories are stored in a trie keyed by `pattern <THAT> that <TOPIC> topic`
//! paths. Matching walks the trie best-first, backtracking as needed, and
//! reports the words each wildcard captured. By default a literal word is
//! tried first, then `_`, then `*`; setting [`Settings::underscore_first`]
//! selects the classic AIML order of `_`, then literal words, then `*`.
//!
//! ## Quick Start
//!
//! ```rust
//! use graphmaster_rs::Graphmaster;
//!
//! let gm = Graphmaster::default();
//! gm.add("MY NAME IS *", "*", "*", "Nice to meet you, <star/>.", "names.aiml")
//!     .unwrap();
//!
//! let m = gm.match_input("My name is Bob", "", "").unwrap();
//! assert_eq!(m.template(), "Nice to meet you, <star/>.");
//! assert_eq!(m.input_stars(), &["BOB"]);
//! ```
//!
//! ## Rules and Replies
//!
//! Rules can be loaded from tab-separated text and answered with the built-in
//! evaluator:
//!
//! ```rust
//! use std::sync::Arc;
//! use graphmaster_rs::{GraphmasterBuilder, Responder};
//!
//! let mut builder = GraphmasterBuilder::default();
//! builder.load_tsv("HELLO\tHi!\nHI *\t<srai>HELLO</srai>", "greetings.tsv");
//! let responder = Responder::new(Arc::new(builder.build()));
//!
//! assert_eq!(responder.respond("hi there", "", "").unwrap(), "Hi!");
//! ```

pub mod arbiter;
pub mod config;
pub mod error;
pub mod graphmaster;
pub mod loader;
pub mod match_result;
pub mod matcher;
pub mod merge;
pub mod responder;
pub mod sentence;
pub mod token;
pub mod tokenizer;
pub mod trie;

// Re-export main types for convenience
pub use config::{MergePolicy, Settings};
pub use error::{GraphmasterError, Result};
pub use graphmaster::Graphmaster;
pub use loader::{load_file, load_tsv, GraphmasterBuilder, LoadReport};
pub use match_result::Match;
pub use matcher::{Exhaustion, MatchOptions, Matcher};
pub use merge::AddOutcome;
pub use responder::{Reduction, Responder, StarEvaluator, TemplateEvaluator};
pub use sentence::sentence_split;
pub use token::{Segment, Token};
pub use trie::{Category, Trie, TrieNode};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
