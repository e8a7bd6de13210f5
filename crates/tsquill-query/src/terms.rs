//! Term combining: cleaned query text → ordered `(operator, term)` pairs.
//!
//! Recognized units:
//!
//! - `word`: a bare term, combined with AND by default
//! - `+word`: same as `word`
//! - `-word`: negated term, rendered `!word`
//! - `"some phrase"`: phrase group, rendered `(some&phrase)`; an
//!   unterminated quote runs to the end of the input
//! - `-"some phrase"`: negated phrase group, rendered `!(some&phrase)`
//! - `and` / `or`: standalone connectives that set the operator joining the
//!   *next* term to the one before it
//!
//! Each [`Term`] carries the operator that links it to its predecessor; the
//! first term's operator has nothing to its left and is ignored when the
//! expression is built.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::clean::clean_query;

/// Prefix markers recognised in front of words and phrases.
const MARKERS: [char; 2] = ['+', '-'];

/// Boolean operator joining a term to the preceding one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    /// Both sides must match (`&`).
    #[default]
    And,
    /// Either side may match (`|`).
    Or,
}

impl Operator {
    /// The tsquery symbol for this operator.
    pub fn symbol(self) -> char {
        match self {
            Self::And => '&',
            Self::Or => '|',
        }
    }

    /// Parse a standalone connective word (`and` / `or`, any case).
    pub fn from_connective(word: &str) -> Option<Self> {
        if word.eq_ignore_ascii_case("and") {
            Some(Self::And)
        } else if word.eq_ignore_ascii_case("or") {
            Some(Self::Or)
        } else {
            None
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
        }
    }
}

/// One unit of a search query and the operator linking it to the previous
/// unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Term {
    /// How this term combines with the one before it.
    pub operator: Operator,
    /// Term text in tsquery syntax (`word`, `!word`, `(a&b)`, `!(a&b)`).
    pub text: String,
}

impl Term {
    /// Create a term.
    pub fn new(operator: Operator, text: impl Into<String>) -> Self {
        Self {
            operator,
            text: text.into(),
        }
    }

    /// Create an AND term.
    pub fn and(text: impl Into<String>) -> Self {
        Self::new(Operator::And, text)
    }

    /// Create an OR term.
    pub fn or(text: impl Into<String>) -> Self {
        Self::new(Operator::Or, text)
    }

    /// Whether the term is negated.
    pub fn is_negated(&self) -> bool {
        self.text.starts_with('!')
    }

    /// Whether the term is a phrase group.
    pub fn is_phrase(&self) -> bool {
        self.text.trim_start_matches('!').starts_with('(')
    }
}

/// Split a query into terms.
///
/// The input is passed through [`clean_query`] first, so raw user input is
/// accepted. Parsing is total: malformed input degrades to fewer terms, never
/// to an error.
///
/// # Example
///
/// ```
/// use tsquill_query::{query_to_terms, Term};
///
/// assert_eq!(
///     query_to_terms("-a -\"c d\" or b +e"),
///     vec![
///         Term::and("!a"),
///         Term::and("!(c&d)"),
///         Term::or("b"),
///         Term::and("e"),
///     ]
/// );
/// ```
pub fn query_to_terms(query: &str) -> Vec<Term> {
    let cleaned = clean_query(query);
    let chars: Vec<char> = cleaned.chars().collect();
    let mut terms = Vec::new();
    let mut pending: Option<Operator> = None;
    let mut i = 0;

    while i < chars.len() {
        if chars[i].is_whitespace() {
            i += 1;
            continue;
        }

        let mut negated = false;
        let mut marked = false;
        while i < chars.len() && MARKERS.contains(&chars[i]) {
            negated |= chars[i] == '-';
            marked = true;
            i += 1;
        }

        if i < chars.len() && chars[i] == '"' {
            let start = i + 1;
            let end = chars[start..]
                .iter()
                .position(|&c| c == '"')
                .map_or(chars.len(), |offset| start + offset);
            let phrase: String = chars[start..end].iter().collect();
            // Step past the closing quote, if there was one.
            i = (end + 1).min(chars.len());

            let operator = pending.take().unwrap_or_default();
            terms.push(Term::new(operator, negate(phrase_group(&phrase), negated)));
            continue;
        }

        let start = i;
        while i < chars.len() && !chars[i].is_whitespace() && chars[i] != '"' {
            i += 1;
        }
        let raw: String = chars[start..i].iter().collect();
        let word = raw.trim_end_matches(MARKERS);

        if word.is_empty() {
            continue;
        }
        // Markers glued to a following quote belong to the phrase.
        if i < chars.len() && chars[i] == '"' {
            i -= raw.chars().count() - word.chars().count();
        }
        let standalone =
            word.len() == raw.len() && chars.get(i).is_none_or(|c| c.is_whitespace());
        if !marked && standalone {
            if let Some(op) = Operator::from_connective(word) {
                pending = Some(op);
                continue;
            }
        }

        let operator = pending.take().unwrap_or_default();
        terms.push(Term::new(operator, negate(word.to_string(), negated)));
    }

    terms
}

/// Render a phrase body as a parenthesised AND group.
fn phrase_group(phrase: &str) -> String {
    let words: Vec<&str> = phrase
        .split_whitespace()
        .map(|w| w.trim_matches(MARKERS))
        .filter(|w| !w.is_empty())
        .collect();
    format!("({})", words.join("&"))
}

fn negate(text: String, negated: bool) -> String {
    if negated { format!("!{text}") } else { text }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ------------------------------------------------------------------------
    // Bare words and connectives
    // ------------------------------------------------------------------------

    #[test]
    fn test_single_word() {
        assert_eq!(query_to_terms("text"), vec![Term::and("text")]);
    }

    #[test]
    fn test_default_conjunction() {
        let expected = vec![Term::and("text"), Term::and("asdf")];
        assert_eq!(query_to_terms("text asdf"), expected);
        assert_eq!(query_to_terms("text +asdf"), expected);
        assert_eq!(query_to_terms("text and asdf"), expected);
    }

    #[test]
    fn test_or_connective() {
        assert_eq!(
            query_to_terms("text or asdf"),
            vec![Term::and("text"), Term::or("asdf")]
        );
    }

    #[test]
    fn test_plus_and_minus_markers() {
        assert_eq!(
            query_to_terms("+text -sdf"),
            vec![Term::and("text"), Term::and("!sdf")]
        );
    }

    #[test]
    fn test_connective_before_negated_word() {
        assert_eq!(
            query_to_terms("+a and -b"),
            vec![Term::and("a"), Term::and("!b")]
        );
        assert_eq!(
            query_to_terms("+a or -b"),
            vec![Term::and("a"), Term::or("!b")]
        );
    }

    #[test]
    fn test_connectives_case_insensitive() {
        assert_eq!(
            query_to_terms("a OR b AND c"),
            vec![Term::and("a"), Term::or("b"), Term::and("c")]
        );
    }

    #[test]
    fn test_last_connective_wins() {
        assert_eq!(
            query_to_terms("a and or b"),
            vec![Term::and("a"), Term::or("b")]
        );
    }

    #[test]
    fn test_marked_connective_is_a_word() {
        assert_eq!(
            query_to_terms("cats +and dogs"),
            vec![Term::and("cats"), Term::and("and"), Term::and("dogs")]
        );
    }

    #[test]
    fn test_connective_substring_is_a_word() {
        assert_eq!(
            query_to_terms("sand order"),
            vec![Term::and("sand"), Term::and("order")]
        );
    }

    #[test]
    fn test_not_is_an_ordinary_word() {
        assert_eq!(
            query_to_terms("something or not"),
            vec![Term::and("something"), Term::or("not")]
        );
    }

    #[test]
    fn test_trailing_connective_dropped() {
        assert_eq!(query_to_terms("a or"), vec![Term::and("a")]);
    }

    #[test]
    fn test_connective_survives_dropped_word() {
        // The bare "-" cleans to nothing; the pending OR still reaches "b".
        assert_eq!(
            query_to_terms("a or - b"),
            vec![Term::and("a"), Term::or("b")]
        );
        assert_eq!(
            query_to_terms("a or (!) b"),
            vec![Term::and("a"), Term::or("b")]
        );
    }

    // ------------------------------------------------------------------------
    // Phrases
    // ------------------------------------------------------------------------

    #[test]
    fn test_single_word_phrase() {
        assert_eq!(query_to_terms("\"a\""), vec![Term::and("(a)")]);
    }

    #[test]
    fn test_phrase_strips_reserved_and_markers() {
        assert_eq!(query_to_terms("\"+-&|  -a  \""), vec![Term::and("(a)")]);
    }

    #[test]
    fn test_negated_phrase() {
        assert_eq!(query_to_terms("-\"a\""), vec![Term::and("!(a)")]);
    }

    #[test]
    fn test_phrase_collapses_whitespace() {
        assert_eq!(query_to_terms("\"a  b \""), vec![Term::and("(a&b)")]);
    }

    #[test]
    fn test_unterminated_phrase() {
        assert_eq!(query_to_terms("\"a  b "), vec![Term::and("(a&b)")]);
    }

    #[test]
    fn test_phrase_then_negated_unterminated_phrase() {
        assert_eq!(
            query_to_terms("\"a  b\" or -\"c d f"),
            vec![Term::and("(a&b)"), Term::or("!(c&d&f)")]
        );
    }

    #[test]
    fn test_compound_query() {
        assert_eq!(
            query_to_terms("-a -\"c d\" or b +e"),
            vec![
                Term::and("!a"),
                Term::and("!(c&d)"),
                Term::or("b"),
                Term::and("e"),
            ]
        );
    }

    #[test]
    fn test_empty_phrase_is_kept() {
        assert_eq!(query_to_terms("\"\""), vec![Term::and("()")]);
    }

    #[test]
    fn test_quote_inside_word_starts_phrase() {
        assert_eq!(
            query_to_terms("ab\"cd ef\""),
            vec![Term::and("ab"), Term::and("(cd&ef)")]
        );
    }

    #[test]
    fn test_connective_glued_to_quote_is_a_word() {
        assert_eq!(
            query_to_terms("a or\"b c\""),
            vec![Term::and("a"), Term::and("or"), Term::and("(b&c)")]
        );
        assert_eq!(
            query_to_terms("a or- b"),
            vec![Term::and("a"), Term::and("or"), Term::and("b")]
        );
    }

    #[test]
    fn test_marker_glued_to_quote_applies_to_phrase() {
        assert_eq!(
            query_to_terms("a-\"b c\""),
            vec![Term::and("a"), Term::and("!(b&c)")]
        );
        assert_eq!(
            query_to_terms("a+-\"b c\" d"),
            vec![Term::and("a"), Term::and("!(b&c)"), Term::and("d")]
        );
    }

    #[test]
    fn test_connective_inside_phrase_is_literal() {
        assert_eq!(
            query_to_terms("\"rock and roll\""),
            vec![Term::and("(rock&and&roll)")]
        );
    }

    #[test]
    fn test_phrase_keeps_escaped_quote() {
        assert_eq!(
            query_to_terms("\"O'Reily bookstore\""),
            vec![Term::and("(o''reily&bookstore)")]
        );
    }

    // ------------------------------------------------------------------------
    // Degenerate input
    // ------------------------------------------------------------------------

    #[test]
    fn test_empty_input() {
        assert!(query_to_terms("").is_empty());
        assert!(query_to_terms("   ").is_empty());
        assert!(query_to_terms("(!&|)").is_empty());
        assert!(query_to_terms("+ - --").is_empty());
    }

    #[test]
    fn test_deterministic() {
        let input = "word +\"some phrase\" -this and that or \"it was";
        assert_eq!(query_to_terms(input), query_to_terms(input));
    }

    // ------------------------------------------------------------------------
    // Term helpers
    // ------------------------------------------------------------------------

    #[test]
    fn test_term_predicates() {
        assert!(Term::and("!(a&b)").is_negated());
        assert!(Term::and("!(a&b)").is_phrase());
        assert!(!Term::and("word").is_phrase());
        assert!(!Term::or("word").is_negated());
    }

    #[test]
    fn test_operator_symbols() {
        assert_eq!(Operator::And.symbol(), '&');
        assert_eq!(Operator::Or.symbol(), '|');
        assert_eq!(Operator::default(), Operator::And);
        assert_eq!(Operator::Or.to_string(), "OR");
    }
}
