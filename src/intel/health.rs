//! Per-source health records, mutated only by runner outcomes.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::intel::types::{HealthRecord, HealthStatus};

#[derive(Debug, Default)]
pub struct HealthTracker {
    inner: RwLock<HashMap<String, HealthRecord>>,
}

impl HealthTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, source_id: &str, now: DateTime<Utc>, duration_ms: u64) {
        let mut map = self.inner.write();
        let rec = map
            .entry(source_id.to_string())
            .or_insert_with(|| HealthRecord::new(source_id));
        rec.status = HealthStatus::Healthy;
        rec.failure_count = 0;
        rec.last_success = Some(now);
        rec.last_attempt = Some(now);
        rec.last_duration_ms = Some(duration_ms);
    }

    /// Returns the failure count after this failure.
    pub fn record_failure(
        &self,
        source_id: &str,
        now: DateTime<Utc>,
        duration_ms: u64,
        error: &str,
    ) -> u64 {
        let mut map = self.inner.write();
        let rec = map
            .entry(source_id.to_string())
            .or_insert_with(|| HealthRecord::new(source_id));
        rec.status = HealthStatus::Degraded;
        rec.failure_count = rec.failure_count.saturating_add(1);
        rec.last_error = Some(error.to_string());
        rec.last_attempt = Some(now);
        rec.last_duration_ms = Some(duration_ms);
        rec.failure_count
    }

    pub fn get(&self, source_id: &str) -> Option<HealthRecord> {
        self.inner.read().get(source_id).cloned()
    }

    /// Records for the given ids, in that order; ids that never ran are skipped.
    pub fn snapshot_ordered(&self, ids: &[String]) -> Vec<HealthRecord> {
        let map = self.inner.read();
        ids.iter().filter_map(|id| map.get(id).cloned()).collect()
    }
}
