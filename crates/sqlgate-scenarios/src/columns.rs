use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

pub const TABLE: &str = "pp_complete";

/// Columns of `pp_complete`.
pub const VOCABULARY: &[&str] = &[
    "date", "price", "postcode1", "postcode2", "type", "is_new", "duration", "addr1", "addr2",
    "street", "locality", "town", "district", "county",
];

const KEYWORDS: &[&str] = &[
    "select", "from", "where", "and", "or", "not", "group", "by", "order", "asc", "desc",
    "limit", "offset", "as", "distinct", "having", "in", "is", "null", "like", "ilike",
    "between", "case", "when", "then", "else", "end", "true", "false", "interval", "on",
    "with", "all", "any", "nulls", "first", "last", "year", "month", "day", "format",
];

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"`([^`]*)`|"([^"]*)"|([A-Za-z_][A-Za-z0-9_]*)"#).expect("static regex")
    })
}

fn literal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"'(?:[^']|'')*'").expect("static regex"))
}

/// Identifiers that are neither keywords, function names, declared aliases,
/// the table itself, nor columns of `pp_complete`, in order of appearance.
pub fn unknown_columns(sql: &str) -> Vec<String> {
    let stripped = literal_re().replace_all(sql, " ");

    struct Tok {
        ident: String,
        quoted: bool,
        is_call: bool,
        after_as: bool,
    }

    let mut toks = Vec::new();
    let mut prev_as = false;
    for cap in token_re().captures_iter(&stripped) {
        let Some(m) = cap.get(0) else { continue };
        let (ident, quoted) = match (cap.get(1), cap.get(2), cap.get(3)) {
            (Some(q), _, _) | (_, Some(q), _) => (q.as_str().to_string(), true),
            (_, _, Some(b)) => (b.as_str().to_string(), false),
            _ => continue,
        };
        let is_call = stripped[m.end()..].trim_start().starts_with('(');
        let lower = ident.to_lowercase();
        toks.push(Tok {
            ident,
            quoted,
            is_call,
            after_as: prev_as,
        });
        prev_as = !quoted && lower == "as";
    }

    let aliases: HashSet<String> = toks
        .iter()
        .filter(|t| t.after_as)
        .map(|t| t.ident.to_lowercase())
        .collect();

    let mut unknown = Vec::new();
    for t in &toks {
        let lower = t.ident.to_lowercase();
        if t.is_call || t.after_as || aliases.contains(&lower) {
            continue;
        }
        if !t.quoted && KEYWORDS.contains(&lower.as_str()) {
            continue;
        }
        if lower == TABLE || VOCABULARY.contains(&lower.as_str()) {
            continue;
        }
        unknown.push(t.ident.clone());
    }
    unknown
}

pub fn only_known_columns(sql: &str) -> bool {
    let unknown = unknown_columns(sql);
    if !unknown.is_empty() {
        tracing::debug!(event = "unknown_columns", columns = ?unknown);
    }
    unknown.is_empty()
}
