//! Turning matches into replies.
//!
//! The Graphmaster only finds categories. Expanding a template into reply
//! text is the job of a [`TemplateEvaluator`]; the [`Responder`] drives the
//! whole round trip of splitting input into sentences, matching each one and
//! evaluating the winning template.
//!
//! Evaluators may reduce text symbolically through [`Reduction::srai`], which
//! matches again against the same Graphmaster in the same context. Nesting is
//! bounded by `max_recursion_depth`.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::{debug, warn};

use crate::error::Result;
use crate::graphmaster::Graphmaster;
use crate::match_result::Match;
use crate::sentence::sentence_split;
use crate::tokenizer::strip_markup;

/// `<star/>`, `<thatstar index="2"/>` and friends
static STAR_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<(star|thatstar|topicstar)(?:\s+index\s*=\s*"(\d+)")?\s*/>"#)
        .expect("valid star tag regex")
});

/// `<sr/>`, shorthand for `<srai><star/></srai>`
static SR_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<sr\s*/>").expect("valid sr tag regex"));

const SRAI_OPEN: &str = "<srai>";
const SRAI_CLOSE: &str = "</srai>";

/// Expands a matched template into reply text
pub trait TemplateEvaluator {
    fn evaluate(&self, m: &Match, ctx: &mut Reduction<'_>) -> Result<String>;
}

/// Context of one reply: the conversation state plus the recursion guard
pub struct Reduction<'a> {
    graphmaster: &'a Graphmaster,
    evaluator: &'a dyn TemplateEvaluator,
    that: &'a str,
    topic: &'a str,
    depth: usize,
    loop_guard_used: bool,
}

impl<'a> Reduction<'a> {
    pub fn new(
        graphmaster: &'a Graphmaster,
        evaluator: &'a dyn TemplateEvaluator,
        that: &'a str,
        topic: &'a str,
    ) -> Self {
        Reduction {
            graphmaster,
            evaluator,
            that,
            topic,
            depth: 0,
            loop_guard_used: false,
        }
    }

    /// Current nesting of symbolic reductions
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn that(&self) -> &str {
        self.that
    }

    pub fn topic(&self) -> &str {
        self.topic
    }

    /// Match `text` in the current context and evaluate the result.
    ///
    /// Past the recursion limit the configured infinite-loop input is reduced
    /// instead, once per reply; after that the reduction yields nothing.
    pub fn srai(&mut self, text: &str) -> Result<String> {
        let graphmaster = self.graphmaster;
        let settings = graphmaster.settings();
        if self.depth >= settings.max_recursion_depth {
            if self.loop_guard_used {
                return Ok(String::new());
            }
            self.loop_guard_used = true;
            warn!(depth = self.depth, input = text, "recursion limit reached");
            let fallback = settings.infinite_loop_input.clone();
            return self.reduce(&fallback);
        }

        self.depth += 1;
        let reply = self.reduce(text);
        self.depth -= 1;
        reply
    }

    /// One match-and-evaluate step at the current depth
    fn reduce(&mut self, text: &str) -> Result<String> {
        match self.graphmaster.match_input(text, self.that, self.topic) {
            Ok(m) => {
                let evaluator = self.evaluator;
                evaluator.evaluate(&m, self)
            }
            Err(e) if e.is_no_match() => Ok(String::new()),
            Err(e) => Err(e),
        }
    }
}

/// Answers input against a shared Graphmaster
pub struct Responder<E = StarEvaluator> {
    graphmaster: Arc<Graphmaster>,
    evaluator: E,
}

impl Responder<StarEvaluator> {
    /// Responder using the built-in star/srai evaluator
    pub fn new(graphmaster: Arc<Graphmaster>) -> Self {
        Self::with_evaluator(graphmaster, StarEvaluator)
    }
}

impl<E: TemplateEvaluator> Responder<E> {
    pub fn with_evaluator(graphmaster: Arc<Graphmaster>, evaluator: E) -> Self {
        Responder {
            graphmaster,
            evaluator,
        }
    }

    pub fn graphmaster(&self) -> &Arc<Graphmaster> {
        &self.graphmaster
    }

    /// Reply to `input`, sentence by sentence.
    ///
    /// A sentence without a matching category contributes nothing.
    pub fn respond(&self, input: &str, that: &str, topic: &str) -> Result<String> {
        let settings = self.graphmaster.settings();
        let mut replies = Vec::new();

        for sentence in sentence_split(&settings.sentence_splitters, input) {
            let mut ctx = Reduction::new(&self.graphmaster, &self.evaluator, that, topic);
            let reply = ctx.reduce(&sentence)?;
            debug!(sentence = %sentence, reply = %reply, "responded");
            if !reply.is_empty() {
                replies.push(reply);
            }
        }

        Ok(replies.join(" "))
    }
}

/// Minimal evaluator: substitutes stars, reduces `<srai>` and drops other markup
#[derive(Debug, Clone, Copy, Default)]
pub struct StarEvaluator;

impl StarEvaluator {
    fn substitute_stars(m: &Match, template: &str) -> String {
        let expanded = SR_TAG.replace_all(template, "<srai><star/></srai>");
        STAR_TAG
            .replace_all(&expanded, |caps: &Captures| {
                let index = caps
                    .get(2)
                    .and_then(|i| i.as_str().parse().ok())
                    .unwrap_or(1);
                let star = match &caps[1] {
                    "thatstar" => m.that_star(index),
                    "topicstar" => m.topic_star(index),
                    _ => m.input_star(index),
                };
                star.unwrap_or_default().to_string()
            })
            .into_owned()
    }
}

impl TemplateEvaluator for StarEvaluator {
    fn evaluate(&self, m: &Match, ctx: &mut Reduction<'_>) -> Result<String> {
        let mut text = Self::substitute_stars(m, m.template());

        // Innermost first, so nested reductions see finished text
        while let Some(open) = text.rfind(SRAI_OPEN) {
            let body_start = open + SRAI_OPEN.len();
            let Some(close) = text[body_start..].find(SRAI_CLOSE) else {
                break;
            };
            let body_end = body_start + close;
            let reduced = ctx.srai(&strip_markup(&text[body_start..body_end]))?;
            text.replace_range(open..body_end + SRAI_CLOSE.len(), &reduced);
        }

        Ok(strip_markup(&text)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    fn responder(rules: &[(&str, &str, &str, &str)]) -> Responder {
        let gm = Graphmaster::default();
        for (pattern, that, topic, template) in rules {
            gm.add(pattern, that, topic, template, "test").unwrap();
        }
        Responder::new(Arc::new(gm))
    }

    #[test]
    fn test_star_substitution() {
        let r = responder(&[("* IS *", "*", "*", "<star index=\"2\"/> <star/>!")]);
        assert_eq!(r.respond("the rose is red", "", "").unwrap(), "RED THE ROSE!");
    }

    #[test]
    fn test_that_and_topic_stars() {
        let r = responder(&[(
            "YES",
            "DO YOU LIKE *",
            "*",
            "You like <thatstar/>. Topic: <topicstar/>",
        )]);
        assert_eq!(
            r.respond("yes", "Do you like cheese?", "food").unwrap(),
            "You like CHEESE. Topic: FOOD"
        );
    }

    #[test]
    fn test_srai_reduction() {
        let r = responder(&[
            ("HELLO", "*", "*", "Hi there!"),
            ("HI *", "*", "*", "<srai>HELLO</srai>"),
            ("GREETINGS *", "*", "*", "<sr/>"),
            ("*", "*", "*", "<srai>HI <star/></srai>"),
        ]);
        assert_eq!(r.respond("hi bob", "", "").unwrap(), "Hi there!");
        assert_eq!(r.respond("yo", "", "").unwrap(), "Hi there!");
        assert_eq!(r.respond("greetings hello", "", "").unwrap(), "Hi there!");
    }

    #[test]
    fn test_nested_srai() {
        let r = responder(&[
            ("A", "*", "*", "<srai>B <srai>C</srai></srai>"),
            ("C", "*", "*", "D"),
            ("B D", "*", "*", "done"),
        ]);
        assert_eq!(r.respond("a", "", "").unwrap(), "done");
    }

    #[test]
    fn test_recursion_limit() {
        let settings = Settings {
            max_recursion_depth: 4,
            ..Default::default()
        };
        let gm = Graphmaster::new(settings);
        gm.add("LOOP", "*", "*", "<srai>LOOP</srai>", "test").unwrap();
        gm.add("INFINITE LOOP", "*", "*", "Too deep.", "test").unwrap();

        let r = Responder::new(Arc::new(gm));
        assert_eq!(r.respond("loop", "", "").unwrap(), "Too deep.");
    }

    #[test]
    fn test_loop_guard_fires_once() {
        let settings = Settings {
            max_recursion_depth: 3,
            infinite_loop_input: "LOOP".to_string(),
            ..Default::default()
        };
        let gm = Graphmaster::new(settings);
        gm.add("LOOP", "*", "*", "x <srai>LOOP</srai>", "test").unwrap();

        let r = Responder::new(Arc::new(gm));
        assert_eq!(r.respond("loop", "", "").unwrap(), "x x x x x");
    }

    #[test]
    fn test_sentences_answered_separately() {
        let r = responder(&[
            ("HELLO", "*", "*", "Hi."),
            ("HOW ARE YOU", "*", "*", "Fine."),
        ]);
        assert_eq!(
            r.respond("Hello. Gibberish! How are you?", "", "").unwrap(),
            "Hi. Fine."
        );
    }

    #[test]
    fn test_unmatched_input_is_empty_reply() {
        let r = responder(&[]);
        assert_eq!(r.respond("anything", "", "").unwrap(), "");
    }
}
