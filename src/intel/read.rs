// src/intel/read.rs
//! Read surface consumed by risk scoring, dispatch pricing and treasury views.
//!
//! Everything here reads already-published state and never fails because a
//! source is degraded: a source is either served from its last good snapshot
//! or omitted if it never produced one. Calls are safe while a run is in
//! flight and may observe some sources refreshed and others not yet.

use serde::{Deserialize, Serialize};
use std::sync::atomic::Ordering;

use crate::error::IntelResult;
use crate::intel::adjustments::{fold_dispatch, fold_treasury, DispatchAdjustments, TreasuryInsights};
use crate::intel::orchestrator::Orchestrator;
use crate::intel::types::{Alert, HealthRecord, IntelView, RunSummary, Snapshot, SourceCategory, TransportMode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorStatus {
    /// A timer is active.
    pub scheduled: bool,
    pub interval_ms: Option<u64>,
    /// A run is executing right now.
    pub in_flight: bool,
    pub run_count: u64,
    pub last_run: Option<RunSummary>,
    /// Health of every source that has run at least once, in registration order.
    pub sources: Vec<HealthRecord>,
    pub registered_sources: usize,
    pub cached_sources: usize,
    pub active_alerts: usize,
}

impl Orchestrator {
    /// Cached snapshots, optionally filtered by category, in registration order.
    pub fn latest_intel(&self, category: Option<SourceCategory>) -> Vec<IntelView> {
        let inner = &self.inner;
        let now = inner.clock.now();
        inner
            .registry
            .iter()
            .filter(|s| category.map_or(true, |c| s.descriptor.category == c))
            .filter_map(|s| inner.state.cache.view(&s.descriptor.id, now))
            .collect()
    }

    pub fn market_intel(&self) -> Vec<IntelView> {
        self.latest_intel(Some(SourceCategory::Market))
    }

    pub fn operational_intel(&self) -> Vec<IntelView> {
        self.latest_intel(Some(SourceCategory::Operational))
    }

    pub fn compliance_intel(&self) -> Vec<IntelView> {
        self.latest_intel(Some(SourceCategory::Compliance))
    }

    pub fn partner_intel(&self) -> Vec<IntelView> {
        self.latest_intel(Some(SourceCategory::Partner))
    }

    /// Up to `limit` non-expired alerts, newest first.
    pub fn active_alerts(&self, limit: usize) -> Vec<Alert> {
        let now = self.inner.clock.now();
        self.inner.state.alerts.active(limit, now)
    }

    /// Pricing/dispatch adjustments for a lane from whatever is cached.
    pub fn dispatch_adjustments(&self, region: &str, mode: TransportMode) -> DispatchAdjustments {
        fold_dispatch(&self.cached_snapshots(), region, mode)
    }

    /// As [`dispatch_adjustments`](Self::dispatch_adjustments), parsing `mode`
    /// (e.g. `"OCEAN"`).
    pub fn dispatch_adjustments_for(&self, region: &str, mode: &str) -> IntelResult<DispatchAdjustments> {
        let mode: TransportMode = mode.parse()?;
        Ok(self.dispatch_adjustments(region, mode))
    }

    pub fn treasury_insights(&self) -> TreasuryInsights {
        fold_treasury(&self.cached_snapshots())
    }

    pub fn status(&self) -> OrchestratorStatus {
        let inner = &self.inner;
        let now = inner.clock.now();
        let scheduled = self.is_scheduled();
        let interval_ms = if scheduled {
            inner
                .timer
                .lock()
                .as_ref()
                .map(|t| t.interval.as_millis() as u64)
        } else {
            None
        };
        OrchestratorStatus {
            scheduled,
            interval_ms,
            in_flight: self.is_running(),
            run_count: inner.run_count.load(Ordering::Acquire),
            last_run: inner.last_run.read().clone(),
            sources: inner.state.health.snapshot_ordered(&inner.registry.ids()),
            registered_sources: inner.registry.len(),
            cached_sources: inner.state.cache.len(),
            active_alerts: inner.state.alerts.active_count(now),
        }
    }

    fn cached_snapshots(&self) -> Vec<Snapshot> {
        self.inner
            .registry
            .iter()
            .filter_map(|s| self.inner.state.cache.get(&s.descriptor.id))
            .map(|e| e.snapshot)
            .collect()
    }
}
