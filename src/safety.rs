//! Textual safety gate over synthesized SQL.
//!
//! A case-insensitive whole-word scan for data- or schema-mutating keywords.
//! Deliberately conservative: a keyword inside a string literal or comment
//! still counts, because this gate is a keyword-absence check, not a parser.
//! It cannot be bypassed by configuration.

use regex::Regex;
use std::sync::OnceLock;

fn mutation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(INSERT|UPDATE|DELETE|ALTER|TRUNCATE|DROP|CREATE|MERGE)\b").unwrap()
    })
}

/// True if the statement contains any disallowed keyword anywhere in its
/// text. Pure function of the input.
pub fn is_mutating(sql_text: &str) -> bool {
    mutation_re().is_match(sql_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_every_disallowed_keyword_in_any_casing() {
        for kw in ["INSERT", "update", "Delete", "ALTER", "truncate", "DROP", "Create", "MERGE"] {
            let sql = format!("{} something", kw);
            assert!(is_mutating(&sql), "{kw} should be flagged");
        }
    }

    #[test]
    fn plain_select_passes() {
        assert!(!is_mutating("SELECT TOP 10 * FROM clothes WHERE clothes_no = 'B00022'"));
    }

    #[test]
    fn keyword_inside_string_literal_still_counts() {
        assert!(is_mutating("SELECT * FROM log WHERE note = 'DROP TABLE clothes'"));
    }

    #[test]
    fn substring_of_an_identifier_does_not_count() {
        assert!(!is_mutating("SELECT updated_at, dropped_items FROM inventory"));
    }

    #[test]
    fn repeated_calls_agree() {
        let sql = "SELECT merge_candidate FROM dedup";
        assert_eq!(is_mutating(sql), is_mutating(sql));
    }
}
