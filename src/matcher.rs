//! The best-match search over the category trie.
//!
//! At every node the children are tried in priority order: the literal word,
//! then `_`, then `*`. With `MatchOptions::underscore_first` the classic AIML
//! order applies instead and `_` is tried ahead of the literal word. If all
//! three fail and the node was itself entered through a wildcard, that
//! wildcard absorbs the current word and the search stays at the node. The
//! first path to reach a category wins, which makes the result a pure function
//! of the trie and the input.
//!
//! The search runs on an explicit stack of frames, one per consumed token, so
//! input length is bounded by [`MAX_PATH_LEN`] and not by the thread's stack.
//! Wildcard captures are tracked as token ranges. A range stays pending until
//! the next wildcard starts, a segment separator is crossed or the path ends.
//! Once a category is reached the frames are unwound deepest first, and the
//! collected keys and captures are reversed once at the end.

use std::collections::HashSet;
use std::ops::Range;
use std::time::{Duration, Instant};

use crate::config::Settings;
use crate::match_result::Match;
use crate::token::{Segment, Token};
use crate::tokenizer::tokens_to_text;
use crate::trie::{Category, TrieNode};

/// Longest path, in tokens, that is searched or stored
pub const MAX_PATH_LEN: usize = 4096;

/// How often the wall-clock deadline is checked, in steps
const DEADLINE_CHECK_INTERVAL: usize = 256;

/// Why a search ended without a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exhaustion {
    /// Every branch was explored
    Complete,
    /// The step budget ran out
    StepBudget,
    /// The deadline passed
    Timeout,
    /// The input path was too long to search
    PathTooLong,
}

/// Limits and priorities for one search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    /// Maximum number of trie steps
    pub max_steps: usize,
    /// Wall-clock budget
    pub timeout: Option<Duration>,
    /// Try `_` before the literal word (AIML order); otherwise literal first
    pub underscore_first: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        MatchOptions {
            max_steps: 1_000_000,
            timeout: None,
            underscore_first: false,
        }
    }
}

impl From<&Settings> for MatchOptions {
    fn from(settings: &Settings) -> Self {
        MatchOptions {
            max_steps: settings.max_match_steps,
            timeout: (settings.response_timeout_ms > 0)
                .then(|| Duration::from_millis(settings.response_timeout_ms)),
            underscore_first: settings.underscore_first,
        }
    }
}

/// A successful descent, built up while unwinding
struct Found<'a> {
    category: &'a Category,
    /// Trie keys taken, deepest first
    keys: Vec<Token>,
    /// Wildcard captures, rightmost first
    captures: Vec<(Segment, Range<usize>)>,
}

impl<'a> Found<'a> {
    fn new(category: &'a Category) -> Self {
        Found {
            category,
            keys: Vec::new(),
            captures: Vec::new(),
        }
    }

    fn flush(&mut self, segment: Segment, pending: Option<Range<usize>>) {
        if let Some(run) = pending {
            self.captures.push((segment, run));
        }
    }

    fn into_match(self, tokens: &[Token]) -> Match {
        let mut matched = Match::new(self.category);

        let mut segment = Segment::Input;
        for key in self.keys.iter().rev() {
            if let Some(next) = key.entered_segment() {
                segment = next;
                continue;
            }
            let path = matched.segment_path_mut(segment);
            if !path.is_empty() {
                path.push(' ');
            }
            path.push_str(key.as_str());
        }

        for (segment, run) in self.captures.into_iter().rev() {
            let words = &tokens[run];
            if words.iter().any(Token::is_separator) {
                panic!(
                    "wildcard captured a segment separator: {}",
                    tokens_to_text(words)
                );
            }
            matched.stars_mut(segment).push(tokens_to_text(words));
        }

        matched
    }
}

/// One search over one input path
pub struct Matcher<'a> {
    tokens: &'a [Token],
    steps: usize,
    max_steps: usize,
    underscore_first: bool,
    deadline: Option<Instant>,
    halted: Option<Exhaustion>,
    /// `(node address, position, wildcard open)` states known to fail
    failed: HashSet<(usize, usize, bool)>,
}

impl<'a> Matcher<'a> {
    /// Create a matcher for a full `input <THAT> that <TOPIC> topic` path
    pub fn new(tokens: &'a [Token], options: MatchOptions) -> Self {
        Matcher {
            tokens,
            steps: 0,
            max_steps: options.max_steps,
            underscore_first: options.underscore_first,
            deadline: options.timeout.map(|t| Instant::now() + t),
            halted: None,
            failed: HashSet::new(),
        }
    }

    /// Number of steps taken so far
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Search from `root`, returning the best match or why there was none
    pub fn run(&mut self, root: &'a TrieNode) -> Result<Match, Exhaustion> {
        if self.tokens.len() > MAX_PATH_LEN {
            return Err(Exhaustion::PathTooLong);
        }

        let mut stack: Vec<Frame<'a>> = Vec::new();
        let mut entry = Some(Frame::new(root, 0, None, false, Segment::Input));

        loop {
            if let Some(frame) = entry.take() {
                match self.enter(&frame) {
                    Entered::Halted => break,
                    Entered::Failed => {}
                    Entered::Found(category) => {
                        let mut found = Found::new(category);
                        found.flush(frame.segment, frame.pending);
                        for parent in stack.into_iter().rev() {
                            parent.unwind(self.tokens, &mut found);
                        }
                        return Ok(found.into_match(self.tokens));
                    }
                    Entered::Open => stack.push(frame),
                }
            }

            let Some(frame) = stack.last_mut() else {
                break;
            };
            match self.next_branch(frame) {
                Some(child) => entry = Some(child),
                None => {
                    let state = frame.state();
                    stack.pop();
                    self.failed.insert(state);
                }
            }
        }

        Err(self.halted.unwrap_or(Exhaustion::Complete))
    }

    fn should_halt(&mut self) -> bool {
        if self.halted.is_some() {
            return true;
        }

        self.steps += 1;
        if self.steps > self.max_steps {
            self.halted = Some(Exhaustion::StepBudget);
        } else if self.steps % DEADLINE_CHECK_INTERVAL == 0 {
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    self.halted = Some(Exhaustion::Timeout);
                }
            }
        }

        self.halted.is_some()
    }

    /// Decide what arriving at a state means
    fn enter(&mut self, frame: &Frame<'a>) -> Entered<'a> {
        if self.should_halt() {
            return Entered::Halted;
        }

        // Every edge consumes at least one token
        if self.tokens.len() - frame.pos < frame.node.min_depth() {
            return Entered::Failed;
        }

        // Success below a state never depends on the pending capture
        let state = frame.state();
        if self.failed.contains(&state) {
            return Entered::Failed;
        }

        if frame.pos == self.tokens.len() {
            return match frame.node.category.as_ref() {
                Some(category) => Entered::Found(category),
                None => {
                    self.failed.insert(state);
                    Entered::Failed
                }
            };
        }

        Entered::Open
    }

    /// The next untried branch out of `frame`, in priority order
    fn next_branch(&self, frame: &mut Frame<'a>) -> Option<Frame<'a>> {
        let tokens = self.tokens;
        let head = &tokens[frame.pos];

        // Separators are only ever matched literally and close the segment
        let order: &[Branch] = if head.is_separator() {
            &[Branch::Separator]
        } else if self.underscore_first {
            &UNDERSCORE_FIRST
        } else {
            &LITERAL_FIRST
        };

        while let Some(&branch) = order.get(frame.tried) {
            frame.tried += 1;
            if let Some(child) = frame.branch(branch, head) {
                frame.taken = Some(branch);
                return Some(child);
            }
        }
        None
    }
}

/// Ways out of a trie state, tried in array order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Branch {
    /// Cross a segment separator
    Separator,
    /// Follow the child keyed by the word itself
    Literal,
    /// Start a new `_` run
    Underscore,
    /// Start a new `*` run
    Star,
    /// Let the open run take one more word and stay put
    Absorb,
}

const LITERAL_FIRST: [Branch; 4] = [Branch::Literal, Branch::Underscore, Branch::Star, Branch::Absorb];
const UNDERSCORE_FIRST: [Branch; 4] =
    [Branch::Underscore, Branch::Literal, Branch::Star, Branch::Absorb];

/// Outcome of arriving at a state
enum Entered<'a> {
    Halted,
    Failed,
    Found(&'a Category),
    Open,
}

/// One state of the search: a node, a token position and the pending run
struct Frame<'a> {
    node: &'a TrieNode,
    pos: usize,
    pending: Option<Range<usize>>,
    open: bool,
    segment: Segment,
    /// Index of the next branch to try
    tried: usize,
    /// The branch currently being explored
    taken: Option<Branch>,
}

impl<'a> Frame<'a> {
    fn new(
        node: &'a TrieNode,
        pos: usize,
        pending: Option<Range<usize>>,
        open: bool,
        segment: Segment,
    ) -> Self {
        Frame {
            node,
            pos,
            pending,
            open,
            segment,
            tried: 0,
            taken: None,
        }
    }

    /// `(node address, position, wildcard open)`
    fn state(&self) -> (usize, usize, bool) {
        (self.node as *const TrieNode as usize, self.pos, self.open)
    }

    /// The state reached by `branch`, if this node offers it
    fn branch(&self, branch: Branch, head: &Token) -> Option<Frame<'a>> {
        let next = self.pos + 1;
        match branch {
            Branch::Separator => {
                let segment = head.entered_segment()?;
                let child = self.node.child(head)?;
                Some(Frame::new(child, next, None, false, segment))
            }
            Branch::Literal => {
                let child = self.node.child(head)?;
                Some(Frame::new(child, next, self.pending.clone(), false, self.segment))
            }
            Branch::Underscore | Branch::Star => {
                let wildcard = if branch == Branch::Star {
                    Token::Star
                } else {
                    Token::Underscore
                };
                let child = self.node.child(&wildcard)?;
                Some(Frame::new(child, next, Some(self.pos..next), true, self.segment))
            }
            Branch::Absorb => {
                if !self.open {
                    return None;
                }
                let Some(run) = &self.pending else {
                    panic!("open wildcard at position {} has no captured words", self.pos);
                };
                Some(Frame::new(self.node, next, Some(run.start..next), true, self.segment))
            }
        }
    }

    /// Record this frame's part of a successful path
    fn unwind(self, tokens: &[Token], found: &mut Found<'_>) {
        match self.taken {
            Some(Branch::Separator) => {
                found.flush(self.segment, self.pending);
                found.keys.push(tokens[self.pos].clone());
            }
            Some(Branch::Literal) => found.keys.push(tokens[self.pos].clone()),
            Some(Branch::Underscore) => {
                found.flush(self.segment, self.pending);
                found.keys.push(Token::Underscore);
            }
            Some(Branch::Star) => {
                found.flush(self.segment, self.pending);
                found.keys.push(Token::Star);
            }
            Some(Branch::Absorb) | None => {}
        }
    }
}
