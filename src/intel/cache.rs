//! # Result Cache
//! Latest snapshot per source with an absolute expiry instant.
//!
//! Freshness is computed when read; nothing is evicted in the background.
//! A new entry for a source supersedes the previous one, and a failed run
//! never touches the cache, so the last good snapshot stays servable
//! indefinitely.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Duration;

use crate::intel::types::{CacheEntry, IntelView, Snapshot};

#[derive(Debug, Default)]
pub struct ResultCache {
    inner: RwLock<HashMap<String, CacheEntry>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `snapshot` for `source_id`, expiring `ttl` after `now` (absolute TTL, no sliding refresh).
    pub fn set(&self, source_id: &str, snapshot: Snapshot, ttl: Duration, now: DateTime<Utc>) {
        let ttl = ChronoDuration::from_std(ttl).unwrap_or(ChronoDuration::MAX);
        let expires_at = now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
        let entry = CacheEntry {
            snapshot,
            stored_at: now,
            expires_at,
        };
        self.inner.write().insert(source_id.to_string(), entry);
    }

    pub fn get(&self, source_id: &str) -> Option<CacheEntry> {
        self.inner.read().get(source_id).cloned()
    }

    /// Cached snapshot annotated for readers at `now`.
    pub fn view(&self, source_id: &str, now: DateTime<Utc>) -> Option<IntelView> {
        self.get(source_id).map(|e| to_view(e, now))
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

fn to_view(entry: CacheEntry, now: DateTime<Utc>) -> IntelView {
    let from_cache = !entry.is_fresh(now);
    let cache_age_ms = (now - entry.stored_at).num_milliseconds().max(0);
    IntelView {
        snapshot: entry.snapshot,
        from_cache,
        cache_age_ms,
        expires_at: entry.expires_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intel::types::SourceCategory;
    use chrono::TimeZone;

    fn snap(id: &str, at: DateTime<Utc>) -> Snapshot {
        Snapshot {
            source_id: id.into(),
            category: SourceCategory::Market,
            obtained_at: at,
            metrics: serde_json::json!({ "v": 1 }),
            advisories: vec![],
        }
    }

    #[test]
    fn freshness_is_evaluated_at_read_time() {
        let t0 = Utc.with_ymd_and_hms(2025, 9, 6, 9, 0, 0).unwrap();
        let cache = ResultCache::new();
        cache.set("fuel", snap("fuel", t0), Duration::from_millis(1_000), t0);

        let v = cache.view("fuel", t0).unwrap();
        assert!(!v.from_cache);
        assert_eq!(v.cache_age_ms, 0);

        // exactly at expiry the entry is no longer fresh
        let v = cache.view("fuel", t0 + ChronoDuration::milliseconds(1_000)).unwrap();
        assert!(v.from_cache);

        let v = cache.view("fuel", t0 + ChronoDuration::milliseconds(1_500)).unwrap();
        assert!(v.from_cache);
        assert_eq!(v.cache_age_ms, 1_500);
        assert_eq!(v.snapshot, snap("fuel", t0));
    }

    #[test]
    fn newer_entry_supersedes_older() {
        let t0 = Utc.with_ymd_and_hms(2025, 9, 6, 9, 0, 0).unwrap();
        let t1 = t0 + ChronoDuration::seconds(30);
        let cache = ResultCache::new();
        cache.set("fuel", snap("fuel", t0), Duration::from_secs(10), t0);
        cache.set("fuel", snap("fuel", t1), Duration::from_secs(10), t1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("fuel").unwrap().snapshot.obtained_at, t1);
        assert!(cache.get("weather").is_none());
    }
}
