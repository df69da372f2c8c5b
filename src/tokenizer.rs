//! Normalization of free text into match-path tokens.
//!
//! The same normalization is applied to pattern text when categories are
//! added and to input, that and topic text when matching, so both sides of
//! the trie walk always agree on word boundaries and case.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::token::Token;

/// Any markup tag, e.g. `<set name="it">` or `<br/>`
static MARKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid markup regex"));

/// Remove markup tags, leaving a space where each tag was
pub fn strip_markup(text: &str) -> String {
    MARKUP.replace_all(text, " ").into_owned()
}

/// Fit text to the pattern alphabet without splitting it.
///
/// Markup is removed, the text is NFC-normalized, every character that is not
/// a letter, digit, `*` or `_` becomes a space and letters are uppercased.
pub fn pattern_fit(text: &str) -> String {
    let stripped = strip_markup(text);
    let mut result = String::with_capacity(stripped.len());

    for c in stripped.nfc() {
        if c.is_alphanumeric() {
            result.extend(c.to_uppercase());
        } else if c == '*' || c == '_' {
            result.push(c);
        } else {
            result.push(' ');
        }
    }

    result
}

/// Normalize text into a sequence of word and wildcard tokens.
///
/// Empty or all-punctuation text yields an empty sequence.
pub fn normalize(text: &str) -> Vec<Token> {
    pattern_fit(text)
        .split_whitespace()
        .map(Token::from_word)
        .collect()
}

/// Join tokens back into whitespace-separated text
pub fn tokens_to_text(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build the full `input <THAT> that <TOPIC> topic` path used for insertion
pub fn category_path(pattern: &str, that: &str, topic: &str) -> Vec<Token> {
    join_segments(normalize(pattern), normalize(that), normalize(topic))
}

/// Build the full path used for matching.
///
/// A segment that normalizes to nothing is matched as `*`.
pub fn input_path(input: &str, that: &str, topic: &str) -> Vec<Token> {
    let or_star = |tokens: Vec<Token>| {
        if tokens.is_empty() {
            vec![Token::Star]
        } else {
            tokens
        }
    };

    join_segments(
        or_star(normalize(input)),
        or_star(normalize(that)),
        or_star(normalize(topic)),
    )
}

fn join_segments(input: Vec<Token>, that: Vec<Token>, topic: Vec<Token>) -> Vec<Token> {
    let mut path = Vec::with_capacity(input.len() + that.len() + topic.len() + 2);
    path.extend(input);
    path.push(Token::ThatSeparator);
    path.extend(that);
    path.push(Token::TopicSeparator);
    path.extend(topic);
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(w: &str) -> Token {
        Token::Word(w.to_string())
    }

    #[test]
    fn test_normalize_basic() {
        assert_eq!(
            normalize("Hello, world!"),
            vec![word("HELLO"), word("WORLD")]
        );
    }

    #[test]
    fn test_normalize_wildcards() {
        assert_eq!(
            normalize("my name is *"),
            vec![word("MY"), word("NAME"), word("IS"), Token::Star]
        );
        assert_eq!(normalize("_ rocks"), vec![Token::Underscore, word("ROCKS")]);
    }

    #[test]
    fn test_normalize_empty() {
        assert!(normalize("").is_empty());
        assert!(normalize("  ?! ... ").is_empty());
    }

    #[test]
    fn test_punctuation_splits_words() {
        // An apostrophe is not alphanumeric, so it separates words
        assert_eq!(normalize("don't"), vec![word("DON"), word("T")]);
    }

    #[test]
    fn test_strip_markup() {
        assert_eq!(
            normalize("<b>bold</b> move"),
            vec![word("BOLD"), word("MOVE")]
        );
    }

    #[test]
    fn test_non_ascii_letters() {
        assert_eq!(normalize("café olé"), vec![word("CAFÉ"), word("OLÉ")]);
    }

    #[test]
    fn test_pattern_fit() {
        assert_eq!(pattern_fit("What's up?"), "WHAT S UP ");
    }

    #[test]
    fn test_round_trip_through_text() {
        let tokens = vec![Token::Underscore, word("IS"), Token::Star, word("42")];
        assert_eq!(normalize(&tokens_to_text(&tokens)), tokens);
    }

    #[test]
    fn test_input_path_fills_empty_segments() {
        let path = input_path("hi", "", "  ");
        assert_eq!(
            path,
            vec![
                word("HI"),
                Token::ThatSeparator,
                Token::Star,
                Token::TopicSeparator,
                Token::Star
            ]
        );
    }

    #[test]
    fn test_category_path_keeps_empty_segments() {
        let path = category_path("", "", "");
        assert_eq!(path, vec![Token::ThatSeparator, Token::TopicSeparator]);
    }
}
