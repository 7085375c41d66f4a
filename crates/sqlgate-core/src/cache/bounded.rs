use super::{CacheEntry, Clock, GenerationCache, SystemClock};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// moka refuses TTLs over 1000 years; sweeps are capped well below that.
pub const MAX_SWEEP: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// Size-capped generation cache.
///
/// `moka` bounds memory (capacity eviction plus a background TTL sweep);
/// liveness of an entry is still decided against `expires_at` and the
/// injected clock, so tests can drive expiry without sleeping.
#[derive(Clone)]
pub struct BoundedCache {
    inner: moka::sync::Cache<String, CacheEntry>,
    clock: Arc<dyn Clock>,
}

impl BoundedCache {
    pub fn new(max_entries: u64, sweep_after: Duration) -> Self {
        Self::with_clock(max_entries, sweep_after, Arc::new(SystemClock))
    }

    pub fn with_clock(max_entries: u64, sweep_after: Duration, clock: Arc<dyn Clock>) -> Self {
        let inner = moka::sync::Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(sweep_after.min(MAX_SWEEP))
            .build();
        Self { inner, clock }
    }

    pub fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }
}

impl GenerationCache for BoundedCache {
    fn get(&self, key: &str) -> Option<CacheEntry> {
        self.inner.get(key)
    }

    fn put(&self, key: &str, entry: CacheEntry) {
        self.inner.insert(key.to_string(), entry);
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}
