use sha2::{Digest, Sha256};

/// Case-folds the question and drops everything but letters and digits, so
/// "How many flats?" and "how  many FLATS" share one cache slot.
pub fn normalize(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

pub fn cache_key(normalized: &str, grammar_fingerprint: &str) -> String {
    let mut h = Sha256::new();
    h.update(grammar_fingerprint.as_bytes());
    h.update(b"\n");
    h.update(normalized.as_bytes());
    hex::encode(h.finalize())
}

pub fn sha256_hex(s: &str) -> String {
    let mut h = Sha256::new();
    h.update(s.as_bytes());
    hex::encode(h.finalize())
}
