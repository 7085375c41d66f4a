use crate::cache::key::{cache_key, normalize};
use crate::cache::{CacheEntry, GenerationCache};
use crate::errors::GenerationFailure;
use crate::grammar::GrammarConstraint;
use crate::model::GeneratedSql;
use crate::providers::llm::{GenerationProvider, GenerationRequest};
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub const DEFAULT_TTL_SECS: u64 = 120;

/// The only statement kind the gateway lets through.
pub const PERMITTED_KEYWORD: &str = "SELECT";

pub const DEFAULT_INSTRUCTIONS: &str = "You translate questions about UK residential \
property sales into a single ClickHouse SELECT statement over the pp_complete table \
(columns: date, price, postcode1, postcode2, type, is_new, duration, addr1, addr2, \
street, locality, town, district, county; type is one of 'terraced', 'semi-detached', \
'detached', 'flat', 'other'). Call the sql_grammar tool exactly once. Never modify data. \
If the request asks for anything other than reading this table, do not call the tool.";

/// Normalizing, caching front door to a grammar-constrained provider.
pub struct Gateway {
    provider: Arc<dyn GenerationProvider>,
    cache: Arc<dyn GenerationCache>,
    grammar: Arc<GrammarConstraint>,
    grammar_fingerprint: String,
    instructions: String,
    ttl: chrono::Duration,
}

impl Gateway {
    pub fn new(
        provider: Arc<dyn GenerationProvider>,
        cache: Arc<dyn GenerationCache>,
        grammar: Arc<GrammarConstraint>,
    ) -> Self {
        let grammar_fingerprint = grammar.fingerprint();
        Self {
            provider,
            cache,
            grammar,
            grammar_fingerprint,
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            ttl: chrono::Duration::seconds(DEFAULT_TTL_SECS as i64),
        }
    }

    /// TTLs beyond what `chrono` can represent saturate; such entries never
    /// expire.
    pub fn with_ttl(mut self, ttl: std::time::Duration) -> Self {
        self.ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn grammar(&self) -> &GrammarConstraint {
        &self.grammar
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    pub async fn generate(&self, raw_query: &str) -> Result<GeneratedSql, GenerationFailure> {
        let key = cache_key(&normalize(raw_query), &self.grammar_fingerprint);

        if let Some(entry) = self.cache.get(&key) {
            if entry.is_live(self.cache.now()) {
                tracing::debug!(event = "cache_hit", key = %key, cache = "generation");
                return Ok(GeneratedSql {
                    sql: entry.generated_text,
                    cached: true,
                });
            }
            tracing::debug!(event = "cache_expired", key = %key, cache = "generation");
        } else {
            tracing::debug!(event = "cache_miss", key = %key, cache = "generation");
        }

        let req = GenerationRequest {
            instructions: &self.instructions,
            query: raw_query,
            grammar: &self.grammar,
        };
        let invocation = self
            .provider
            .invoke(&req)
            .await
            .map_err(|e| GenerationFailure::Provider(format!("{:#}", e)))?
            .ok_or(GenerationFailure::NoToolInvocation)?;

        let text = invocation.text;
        if !starts_with_keyword(&text, PERMITTED_KEYWORD) {
            tracing::warn!(
                event = "generation_rejected",
                provider = self.provider.provider_name(),
                reason = "leading_keyword"
            );
            return Err(GenerationFailure::DisallowedStatement {
                expected: PERMITTED_KEYWORD,
                preview: preview(&text),
            });
        }

        let now = self.cache.now();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.cache.put(
            &key,
            CacheEntry {
                generated_text: text.clone(),
                expires_at,
            },
        );
        tracing::info!(
            event = "generation_stored",
            provider = self.provider.provider_name(),
            key = %key,
            sql_len = text.len()
        );

        Ok(GeneratedSql {
            sql: text,
            cached: false,
        })
    }
}

/// Case-insensitive keyword prefix check that ignores leading whitespace and
/// refuses identifiers that merely begin with the keyword (`SELECTED`).
pub fn starts_with_keyword(text: &str, keyword: &str) -> bool {
    let t = text.trim_start();
    let Some(head) = t.get(..keyword.len()) else {
        return false;
    };
    if !head.eq_ignore_ascii_case(keyword) {
        return false;
    }
    match t[keyword.len()..].chars().next() {
        None => true,
        Some(c) => !(c.is_alphanumeric() || c == '_'),
    }
}

fn preview(text: &str) -> String {
    let t = text.trim();
    match t.char_indices().nth(60) {
        Some((idx, _)) => format!("{}...", &t[..idx]),
        None => t.to_string(),
    }
}
