//! Query string cleaning.
//!
//! The first stage of the pipeline: lowercase the raw input, drop the
//! characters the tsearch query parser treats as syntax, and escape single
//! quotes the way a SQL string literal expects them. Structural markers
//! (`+`, `-`, `"`) are left in place for [`query_to_terms`](crate::query_to_terms).

/// Characters removed from every position of the query, quoted or not.
pub const RESERVED_CHARS: [char; 5] = ['!', '&', '|', '(', ')'];

/// Normalise a raw query string.
///
/// - trims surrounding whitespace
/// - lowercases
/// - removes [`RESERVED_CHARS`]
/// - doubles single quotes (`'` → `''`)
///
/// Never fails; the result may be empty.
///
/// # Example
///
/// ```
/// use tsquill_query::clean_query;
///
/// assert_eq!(clean_query("  (!&|Reserved) "), "reserved");
/// assert_eq!(clean_query("\"O'Reily bookstore\""), "\"o''reily bookstore\"");
/// ```
pub fn clean_query(query: &str) -> String {
    let mut cleaned = String::with_capacity(query.len());
    for c in query.chars().flat_map(char::to_lowercase) {
        match c {
            c if RESERVED_CHARS.contains(&c) => {}
            '\'' => cleaned.push_str("''"),
            c => cleaned.push(c),
        }
    }
    cleaned.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_escapes_single_quotes() {
        assert_eq!(
            clean_query("\"O'Reily bookstore\""),
            "\"o''reily bookstore\""
        );
    }

    #[test]
    fn test_clean_keeps_markers() {
        assert_eq!(clean_query("+test -test2"), "+test -test2");
    }

    #[test]
    fn test_clean_lowercases() {
        assert_eq!(clean_query("UpPerCaSe"), "uppercase");
    }

    #[test]
    fn test_clean_trims() {
        assert_eq!(
            clean_query("   stripped whitespace    "),
            "stripped whitespace"
        );
    }

    #[test]
    fn test_clean_removes_reserved() {
        assert_eq!(clean_query("(!&|reserved)"), "reserved");
        assert_eq!(clean_query("\"a & b\""), "\"a  b\"");
    }

    #[test]
    fn test_clean_trims_after_removal() {
        assert_eq!(clean_query("word (|)"), "word");
    }

    #[test]
    fn test_clean_empty() {
        assert_eq!(clean_query(""), "");
        assert_eq!(clean_query("   "), "");
        assert_eq!(clean_query("(!&|)"), "");
    }

    #[test]
    fn test_clean_unicode_lowercase() {
        assert_eq!(clean_query("ÜBER Straße"), "über straße");
    }
}
