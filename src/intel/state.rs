// src/intel/state.rs
use std::time::Duration;

use crate::intel::alerts::AlertAggregator;
use crate::intel::cache::ResultCache;
use crate::intel::health::HealthTracker;

/// Mutable state owned by one orchestrator: health, cache and alert feed.
///
/// Each part locks internally and only for short synchronous sections, so
/// readers may see some sources refreshed and others not while a run is in
/// progress.
#[derive(Debug)]
pub struct IntelState {
    pub health: HealthTracker,
    pub cache: ResultCache,
    pub alerts: AlertAggregator,
}

impl IntelState {
    pub fn new(max_alerts: usize, alert_ttl: Duration) -> Self {
        Self {
            health: HealthTracker::new(),
            cache: ResultCache::new(),
            alerts: AlertAggregator::new(max_alerts, alert_ttl),
        }
    }
}
