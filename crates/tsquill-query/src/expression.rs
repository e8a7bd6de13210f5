//! Boolean expression building: terms → tsquery text.

use std::fmt;

use crate::terms::{query_to_terms, Term};

/// Fold terms into a single tsquery expression.
///
/// The first term's operator is dropped; each later term is appended as
/// `<symbol><text>`. No terms yields an empty string.
pub fn terms_to_expression(terms: &[Term]) -> String {
    let mut expression = String::new();
    for (idx, term) in terms.iter().enumerate() {
        if idx > 0 {
            expression.push(term.operator.symbol());
        }
        expression.push_str(&term.text);
    }
    expression
}

/// Turn a raw user query into tsquery syntax (`&`, `|`, `!`, parentheses).
///
/// # Example
///
/// ```
/// use tsquill_query::fix_tsearch_query;
///
/// assert_eq!(
///     fix_tsearch_query("word +\"some phrase\" -this and that or \"it was"),
///     "word&(some&phrase)&!this&that|(it&was)"
/// );
/// assert_eq!(fix_tsearch_query("(!&|)"), "");
/// ```
pub fn fix_tsearch_query(query: &str) -> String {
    terms_to_expression(&query_to_terms(query))
}

/// A parsed search query.
///
/// Holds the term sequence so callers can inspect it before rendering the
/// expression (the CLI prints both).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TsQuery {
    terms: Vec<Term>,
}

impl TsQuery {
    /// Parse raw user input.
    pub fn parse(query: &str) -> Self {
        Self {
            terms: query_to_terms(query),
        }
    }

    /// The parsed terms, in input order.
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Whether nothing searchable survived parsing.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Render as tsquery text.
    pub fn to_expression(&self) -> String {
        terms_to_expression(&self.terms)
    }
}

impl fmt::Display for TsQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_expression())
    }
}

impl From<Vec<Term>> for TsQuery {
    fn from(terms: Vec<Term>) -> Self {
        Self { terms }
    }
}
