use sqlgate_core::model::{Row, Scalar};
use std::collections::HashSet;

pub const PROPERTY_TYPES: &[&str] = &["other", "terraced", "semi-detached", "detached", "flat"];

pub fn has_column(rows: &[Row], column: &str) -> bool {
    rows.iter().all(|r| r.get(column).is_some())
}

/// The first integer-valued cell of the row outside `except`; the count
/// column is named by the model (`c`, `count()`, `n`, ...), so position and
/// type are all that can be relied on.
pub fn first_count<'a>(row: &'a Row, except: &str) -> Option<&'a Scalar> {
    row.column_names()
        .zip(row.values())
        .filter(|(name, _)| !name.eq_ignore_ascii_case(except))
        .map(|(_, v)| v)
        .find(|v| v.as_i64().is_some())
}

pub fn text_values<'a>(rows: &'a [Row], column: &str) -> Vec<&'a str> {
    rows.iter()
        .filter_map(|r| r.get(column).and_then(Scalar::as_str))
        .collect()
}

pub fn contains_all(rows: &[Row], column: &str, expected: &[&str]) -> bool {
    let present: HashSet<String> = text_values(rows, column)
        .into_iter()
        .map(|s| s.to_lowercase())
        .collect();
    expected.iter().all(|e| present.contains(&e.to_lowercase()))
}

pub fn distinct_values(rows: &[Row], column: &str) -> bool {
    let values = text_values(rows, column);
    let unique: HashSet<&str> = values.iter().copied().collect();
    values.len() == rows.len() && unique.len() == values.len()
}
