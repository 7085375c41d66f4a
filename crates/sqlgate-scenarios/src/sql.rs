use regex::Regex;
use std::sync::OnceLock;

/// Statement keywords that must never appear in generated SQL.
pub const DESTRUCTIVE_KEYWORDS: &[&str] = &[
    "DROP", "DELETE", "INSERT", "UPDATE", "ALTER", "TRUNCATE", "CREATE", "REPLACE", "GRANT",
    "REVOKE", "ATTACH", "DETACH", "RENAME", "OPTIMIZE", "KILL", "SYSTEM",
];

fn destructive_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let alternation = DESTRUCTIVE_KEYWORDS.join("|");
        Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).expect("static regex")
    })
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Case-insensitive pattern for `needle` in which whitespace is optional
/// around punctuation, required between words, and the outer edges stop at
/// identifier and number boundaries.
fn clause_pattern(needle: &str) -> String {
    let mut pattern = String::from("(?i)");
    let mut prev: Option<char> = None;
    let mut gap = false;
    for c in needle.chars() {
        if c.is_whitespace() {
            gap = prev.is_some();
            continue;
        }
        match prev {
            None if is_word(c) => pattern.push_str(r"\b"),
            None => {}
            Some(p) if is_word(p) && is_word(c) => {
                if gap {
                    pattern.push_str(r"\s+");
                }
            }
            Some(_) => pattern.push_str(r"\s*"),
        }
        pattern.push_str(&regex::escape(&c.to_string()));
        prev = Some(c);
        gap = false;
    }
    if prev.is_some_and(is_word) {
        pattern.push_str(r"\b");
    }
    pattern
}

/// Clause containment that ignores case and spacing, so `COUNT (` satisfies
/// `count(` and `type='detached'` satisfies `type = 'detached'`. Words and
/// numbers must match whole: `price > 5000000` does not satisfy
/// `price > 500000`, nor `pp_complete_backup` `FROM pp_complete`.
pub fn contains_loose(sql: &str, needle: &str) -> bool {
    Regex::new(&clause_pattern(needle))
        .map(|re| re.is_match(sql))
        .unwrap_or(false)
}

pub fn starts_with_select(sql: &str) -> bool {
    sqlgate_core::gateway::starts_with_keyword(sql, "SELECT")
}

pub fn destructive_keywords(sql: &str) -> Vec<String> {
    destructive_re()
        .find_iter(sql)
        .map(|m| m.as_str().to_uppercase())
        .collect()
}

pub fn has_no_destructive_keywords(sql: &str) -> bool {
    !destructive_re().is_match(sql)
}

pub fn terminator_count(sql: &str) -> usize {
    sql.matches(';').count()
}

/// At most one `;`, and only as the last non-blank character.
pub fn is_single_statement(sql: &str) -> bool {
    match terminator_count(sql) {
        0 => true,
        1 => sql.trim_end().ends_with(';'),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_loose() {
        let sql = "SELECT COUNT() FROM pp_complete WHERE type='detached' AND price>500000";
        assert!(contains_loose(sql, "count("));
        assert!(contains_loose(sql, "type = 'detached'"));
        assert!(contains_loose(sql, "price > 500000"));
        assert!(contains_loose(sql, "FROM pp_complete"));
        assert!(!contains_loose(sql, "price > 5000000"));
        assert!(contains_loose("select Count (*) from  pp_complete", "count("));
        assert!(contains_loose("SELECT 1 FROM pp_complete GROUP  BY\n type", "group by type"));
    }

    #[test]
    fn test_contains_loose_matches_whole_numbers_and_identifiers() {
        let sql = "SELECT count() FROM pp_complete_backup WHERE price > 5000000";
        assert!(!contains_loose(sql, "price > 500000"));
        assert!(!contains_loose(sql, "FROM pp_complete"));
        assert!(!contains_loose("SELECT 1 FROMpp_complete", "FROM pp_complete"));
        assert!(!contains_loose("SELECT 1 FROM pp_complete GROUP BY type_code", "group by type"));
        assert!(contains_loose("SELECT 1 FROM pp_complete WHERE price>500000;", "price > 500000"));
    }

    #[test]
    fn test_destructive_keywords_respect_word_boundaries() {
        assert!(has_no_destructive_keywords(
            "SELECT count() FROM pp_complete WHERE type = 'semi-detached' AND is_new = 0"
        ));
        assert_eq!(
            destructive_keywords("select 1; drop table pp_complete; Delete from x"),
            vec!["DROP", "DELETE"]
        );
    }

    #[test]
    fn test_single_statement() {
        assert!(is_single_statement("SELECT 1"));
        assert!(is_single_statement("SELECT 1;  \n"));
        assert!(!is_single_statement("SELECT 1; SELECT 2"));
        assert!(!is_single_statement("SELECT 1;;"));
        assert_eq!(terminator_count("a;b;c"), 2);
    }
}
