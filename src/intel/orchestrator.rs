//! # Orchestrator
//! Timer-driven driver that runs every registered source once per tick.
//!
//! - Single-flight: an atomic IDLE/RUNNING flag. A run requested while another
//!   is in flight (timer tick or on-demand) is dropped, not queued.
//! - Sources run sequentially in registration order; one failing source never
//!   blocks the others.
//! - No retry and no backoff: a failing source is simply attempted again on
//!   the next tick.
//! - Skipped ticks are deliberately silent apart from a debug log and the
//!   `intel_runs_skipped_total` counter. Downstream consumers tolerate missed
//!   intervals; do not turn this into a queue.
//! - `stop()` ends the timer but lets an in-flight run finish.

use metrics::{counter, gauge};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::clock::{Clock, SystemClock};
use crate::config::IntelConfig;
use crate::error::IntelError;
use crate::intel::providers::default_registry;
use crate::intel::registry::SourceRegistry;
use crate::intel::runner::CollectorRunner;
use crate::intel::sinks::{
    AuditLog, JsonlSnapshotStore, NoopSnapshotStore, SnapshotStore, TracingAuditLog,
};
use crate::intel::state::IntelState;
use crate::intel::types::{RunOutcome, RunSummary};
use crate::telemetry::ensure_metrics_described;

pub const AUDIT_EVENT_RUN: &str = "intel_run";
pub const AUDIT_MODULE: &str = "intel_orchestrator";

/// Cheap to clone; clones share one engine.
#[derive(Clone)]
pub struct Orchestrator {
    pub(crate) inner: Arc<Inner>,
}

pub(crate) struct Inner {
    pub(crate) registry: Arc<SourceRegistry>,
    pub(crate) state: Arc<IntelState>,
    pub(crate) clock: Arc<dyn Clock>,
    runner: CollectorRunner,
    audit: Arc<dyn AuditLog>,
    in_flight: AtomicBool,
    pub(crate) run_count: AtomicU64,
    pub(crate) last_run: RwLock<Option<RunSummary>>,
    pub(crate) timer: Mutex<Option<Timer>>,
}

pub(crate) struct Timer {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
    pub(crate) interval: Duration,
}

/// Holds the RUNNING flag; dropping it returns the orchestrator to IDLE.
struct RunGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct OrchestratorBuilder {
    registry: SourceRegistry,
    config: IntelConfig,
    store: Arc<dyn SnapshotStore>,
    audit: Arc<dyn AuditLog>,
    clock: Arc<dyn Clock>,
}

impl OrchestratorBuilder {
    pub fn config(mut self, config: IntelConfig) -> Self {
        self.config = config;
        self
    }

    pub fn snapshot_store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.store = store;
        self
    }

    pub fn audit_log(mut self, audit: Arc<dyn AuditLog>) -> Self {
        self.audit = audit;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Zero-valued config fields fall back to their defaults here too.
    pub fn build(self) -> Orchestrator {
        ensure_metrics_described();
        let config = self.config.sanitize();
        let registry = Arc::new(self.registry);
        let state = Arc::new(IntelState::new(config.max_alerts, config.alert_ttl()));
        let runner = CollectorRunner::new(
            registry.clone(),
            state.clone(),
            self.store,
            self.clock.clone(),
            config.collect_timeout(),
        );
        Orchestrator {
            inner: Arc::new(Inner {
                registry,
                state,
                clock: self.clock,
                runner,
                audit: self.audit,
                in_flight: AtomicBool::new(false),
                run_count: AtomicU64::new(0),
                last_run: RwLock::new(None),
                timer: Mutex::new(None),
            }),
        }
    }
}

impl Orchestrator {
    /// Start from a registry; defaults are system clock, no persistence and a
    /// tracing-backed audit log.
    pub fn builder(registry: SourceRegistry) -> OrchestratorBuilder {
        OrchestratorBuilder {
            registry,
            config: IntelConfig::default(),
            store: Arc::new(NoopSnapshotStore),
            audit: Arc::new(TracingAuditLog::new()),
            clock: Arc::new(SystemClock),
        }
    }

    /// Built-in sources and sinks as described by `cfg`.
    pub fn from_config(cfg: &IntelConfig) -> anyhow::Result<Self> {
        let registry = default_registry(cfg)?;
        let store: Arc<dyn SnapshotStore> = match &cfg.snapshot_log_path {
            Some(p) => {
                let store = JsonlSnapshotStore::new(p);
                tracing::info!(target: "intel", path = %store.path().display(), "persisting snapshots");
                Arc::new(store)
            }
            None => Arc::new(NoopSnapshotStore),
        };
        Ok(Self::builder(registry)
            .config(cfg.clone())
            .snapshot_store(store)
            .build())
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.inner.registry
    }

    pub fn is_running(&self) -> bool {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    pub fn run_count(&self) -> u64 {
        self.inner.run_count.load(Ordering::Acquire)
    }

    pub fn last_run(&self) -> Option<RunSummary> {
        self.inner.last_run.read().clone()
    }

    /// Run every source once. Returns `None` when another run is in flight.
    pub async fn run_once(&self) -> Option<RunSummary> {
        let Some(guard) = RunGuard::acquire(&self.inner.in_flight) else {
            counter!("intel_runs_skipped_total").increment(1);
            tracing::debug!(target: "intel", "run already in flight; request dropped");
            return None;
        };

        let inner = &self.inner;
        let started_at = inner.clock.now();
        let t0 = Instant::now();
        let mut succeeded = 0usize;
        let mut failed = 0usize;
        let mut alerts_raised = 0usize;

        for source in inner.registry.iter() {
            let id = source.descriptor.id.as_str();
            match inner.runner.run(id).await {
                Ok(RunOutcome::Fresh(snapshot)) => {
                    succeeded += 1;
                    alerts_raised += snapshot.advisories.len();
                }
                Ok(RunOutcome::Stale { .. }) | Ok(RunOutcome::Unavailable { .. }) => failed += 1,
                Err(e) => {
                    failed += 1;
                    tracing::error!(target: "intel", source = id, error = %e, "runner rejected registered source");
                }
            }
        }

        let finished_at = inner.clock.now();
        let run_number = inner.run_count.fetch_add(1, Ordering::AcqRel) + 1;
        let summary = RunSummary {
            run_number,
            started_at,
            duration_ms: t0.elapsed().as_millis() as u64,
            succeeded,
            failed,
            alerts_raised,
            active_alerts: inner.state.alerts.active_count(finished_at),
        };
        *inner.last_run.write() = Some(summary.clone());
        drop(guard);

        counter!("intel_runs_total").increment(1);
        gauge!("intel_alerts_active").set(summary.active_alerts as f64);
        gauge!("intel_last_run_ts").set(finished_at.timestamp().max(0) as f64);
        tracing::info!(
            target: "intel",
            run = summary.run_number,
            succeeded,
            failed,
            alerts = alerts_raised,
            duration_ms = summary.duration_ms,
            "orchestrator run finished"
        );

        self.emit_summary(&summary).await;
        Some(summary)
    }

    async fn emit_summary(&self, summary: &RunSummary) {
        let payload = match serde_json::to_value(summary) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(target: "intel", error = %e, "run summary not serializable");
                return;
            }
        };
        match self
            .inner
            .audit
            .log_event(AUDIT_EVENT_RUN, AUDIT_MODULE, payload)
            .await
        {
            Ok(Some(rec)) => tracing::trace!(target: "intel", audit_id = rec.id, "run summary logged"),
            Ok(None) => tracing::trace!(target: "intel", "audit log returned no record"),
            Err(e) => {
                let err = IntelError::AuditLogFailure(format!("{e:#}"));
                tracing::warn!(target: "intel", error = %err, "run summary not logged");
            }
        }
    }

    /// Fire `run_once` every `interval`. Calling it again restarts the timer
    /// with the new interval. Must be called inside a Tokio runtime.
    pub fn start(&self, interval: Duration) {
        let interval = interval.max(Duration::from_millis(1));
        let mut timer = self.inner.timer.lock();
        if let Some(old) = timer.take() {
            let _ = old.shutdown.send(true);
            tracing::info!(target: "intel", "restarting orchestrator timer");
        }

        let (tx, rx) = watch::channel(false);
        let weak = Arc::downgrade(&self.inner);
        let task = tokio::spawn(tick_loop(weak, interval, rx));
        *timer = Some(Timer {
            shutdown: tx,
            task,
            interval,
        });
        tracing::info!(
            target: "intel",
            interval_ms = interval.as_millis() as u64,
            sources = self.inner.registry.len(),
            "orchestrator started"
        );
    }

    /// Clear the timer. An in-flight run completes. Returns false if no timer was set.
    pub fn stop(&self) -> bool {
        match self.inner.timer.lock().take() {
            Some(t) => {
                let _ = t.shutdown.send(true);
                tracing::info!(target: "intel", "orchestrator stopped");
                true
            }
            None => false,
        }
    }

    /// Like [`stop`](Self::stop), then wait for the timer task (and any run it
    /// is executing) to finish.
    pub async fn shutdown(&self) {
        let timer = self.inner.timer.lock().take();
        if let Some(t) = timer {
            let _ = t.shutdown.send(true);
            if let Err(e) = t.task.await {
                tracing::warn!(target: "intel", error = %e, "timer task ended abnormally");
            }
            tracing::info!(target: "intel", "orchestrator shut down");
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.inner
            .timer
            .lock()
            .as_ref()
            .is_some_and(|t| !t.task.is_finished())
    }
}

async fn tick_loop(inner: Weak<Inner>, interval: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => break,
        }
        if *shutdown.borrow() {
            break;
        }
        let Some(inner) = inner.upgrade() else { break };
        let orch = Orchestrator { inner };
        if orch.run_once().await.is_none() {
            tracing::debug!(target: "intel", "tick skipped: previous run still in flight");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intel::registry::{Collector, FnCollector};
    use crate::intel::types::{Reading, SourceCategory, SourceDescriptor};
    use std::sync::atomic::AtomicUsize;

    fn counting_registry(calls: Arc<AtomicUsize>) -> SourceRegistry {
        let mut reg = SourceRegistry::new();
        reg.register(
            SourceDescriptor::new("a", "A", SourceCategory::Market, "test"),
            Duration::from_secs(60),
            Arc::new(FnCollector::new(move || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Reading {
                    metrics: serde_json::json!({}),
                    advisories: vec![],
                })
            })),
        )
        .unwrap();
        reg
    }

    #[test]
    fn run_guard_is_exclusive_and_released_on_drop() {
        let flag = AtomicBool::new(false);
        let g = RunGuard::acquire(&flag).unwrap();
        assert!(RunGuard::acquire(&flag).is_none());
        drop(g);
        assert!(RunGuard::acquire(&flag).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn timer_fires_until_stopped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let orch = Orchestrator::builder(counting_registry(calls.clone())).build();

        orch.start(Duration::from_secs(10));
        assert!(orch.is_scheduled());
        // first tick fires immediately, then every 10s
        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(orch.run_count(), 3);

        assert!(orch.stop());
        assert!(!orch.stop());
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(orch.run_count(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_replaces_previous_timer() {
        let calls = Arc::new(AtomicUsize::new(0));
        let orch = Orchestrator::builder(counting_registry(calls)).build();

        orch.start(Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(1)).await;
        orch.start(Duration::from_secs(100));
        tokio::time::sleep(Duration::from_secs(50)).await;
        // one immediate tick per start, nothing else within 50s
        assert_eq!(orch.run_count(), 2);
        orch.shutdown().await;
        assert!(!orch.is_scheduled());
    }

    /// Sleeps (tokio time) for the next queued delay, then `rest` for every later call.
    struct Slow {
        delays: Mutex<Vec<Duration>>,
        rest: Duration,
    }

    impl Slow {
        fn constant(delay: Duration) -> Self {
            Self {
                delays: Mutex::new(Vec::new()),
                rest: delay,
            }
        }

        fn first_then(first: Duration, rest: Duration) -> Self {
            Self {
                delays: Mutex::new(vec![first]),
                rest,
            }
        }
    }

    #[async_trait::async_trait]
    impl Collector for Slow {
        async fn collect(&self) -> anyhow::Result<Reading> {
            let delay = self.delays.lock().pop().unwrap_or(self.rest);
            tokio::time::sleep(delay).await;
            Ok(Reading {
                metrics: serde_json::json!({}),
                advisories: vec![],
            })
        }
    }

    fn slow_orchestrator(collector: Slow) -> Orchestrator {
        let mut reg = SourceRegistry::new();
        reg.register(
            SourceDescriptor::new("slow", "Slow", SourceCategory::Operational, "test"),
            Duration::from_secs(600),
            Arc::new(collector),
        )
        .unwrap();
        let cfg = IntelConfig {
            collect_timeout_ms: 60_000,
            ..IntelConfig::default()
        };
        Orchestrator::builder(reg).config(cfg).build()
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_during_a_run_are_dropped_not_queued() {
        let orch = slow_orchestrator(Slow::constant(Duration::from_secs(25)));

        // runs take 25s on a 10s interval: 0..25, 25..50, 50..75
        orch.start(Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(orch.run_count(), 1);
        assert!(orch.is_running());

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(orch.run_count(), 2);
        orch.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn missed_ticks_collapse_into_one_run() {
        let orch = slow_orchestrator(Slow::first_then(Duration::from_secs(25), Duration::ZERO));

        // first run spans 0..25s; the ticks at 10s and 20s yield a single
        // catch-up run at 25s, then the schedule resumes at 30s
        orch.start(Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(29)).await;
        assert_eq!(orch.run_count(), 2);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(orch.run_count(), 3);
        orch.shutdown().await;
    }

    #[tokio::test]
    async fn zero_collect_timeout_falls_back_to_default() {
        let mut reg = SourceRegistry::new();
        reg.register(
            SourceDescriptor::new("yielding", "Yielding", SourceCategory::Market, "test"),
            Duration::from_secs(60),
            Arc::new(Slow::constant(Duration::from_millis(5))),
        )
        .unwrap();
        let cfg = IntelConfig {
            collect_timeout_ms: 0,
            interval_ms: 0,
            ..IntelConfig::default()
        };
        let orch = Orchestrator::builder(reg).config(cfg).build();

        let summary = orch.run_once().await.unwrap();
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn status_reports_schedule() {
        let calls = Arc::new(AtomicUsize::new(0));
        let orch = Orchestrator::builder(counting_registry(calls)).build();
        assert!(!orch.status().scheduled);
        assert_eq!(orch.status().interval_ms, None);

        orch.start(Duration::from_secs(10));
        let status = orch.status();
        assert!(status.scheduled);
        assert_eq!(status.interval_ms, Some(10_000));
        assert_eq!(status.scheduled, orch.is_scheduled());

        orch.shutdown().await;
        let status = orch.status();
        assert!(!status.scheduled);
        assert_eq!(status.interval_ms, None);
    }
}
