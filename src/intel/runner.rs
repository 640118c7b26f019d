//! # Collector Runner
//! Runs one source's collector and applies the outcome.
//!
//! Success: health reset, cache write (expiry = now + TTL), best-effort
//! persistence, advisories appended to the alert feed.
//! Failure: failure count bumped, source marked degraded, cache untouched, and
//! the last good snapshot served instead (stale-serve) if there is one.
//!
//! Every failure mode of a collector (error, invalid payload, timeout, panic)
//! is absorbed here and never reaches the orchestrator loop.

use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::clock::Clock;
use crate::error::{IntelError, IntelResult};
use crate::intel::registry::{RegisteredSource, SourceRegistry};
use crate::intel::sinks::SnapshotStore;
use crate::intel::state::IntelState;
use crate::intel::types::{Reading, RunOutcome, Snapshot};
use crate::telemetry::ensure_metrics_described;

pub struct CollectorRunner {
    registry: Arc<SourceRegistry>,
    state: Arc<IntelState>,
    store: Arc<dyn SnapshotStore>,
    clock: Arc<dyn Clock>,
    collect_timeout: Duration,
}

impl CollectorRunner {
    pub fn new(
        registry: Arc<SourceRegistry>,
        state: Arc<IntelState>,
        store: Arc<dyn SnapshotStore>,
        clock: Arc<dyn Clock>,
        collect_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            state,
            store,
            clock,
            collect_timeout,
        }
    }

    /// Run the collector bound to `source_id`.
    ///
    /// Only an unregistered id is an error; collection failures come back as
    /// [`RunOutcome::Stale`] or [`RunOutcome::Unavailable`].
    pub async fn run(&self, source_id: &str) -> IntelResult<RunOutcome> {
        ensure_metrics_described();
        let source = self.registry.lookup(source_id)?;

        let t0 = Instant::now();
        let collected = self.collect(source).await;
        let duration_ms = t0.elapsed().as_millis() as u64;
        histogram!("intel_collect_ms").record(duration_ms as f64);

        let now = self.clock.now();
        let id = source.descriptor.id.as_str();

        match collected {
            Ok(reading) => {
                let snapshot = Snapshot {
                    source_id: id.to_string(),
                    category: source.descriptor.category,
                    obtained_at: now,
                    metrics: reading.metrics,
                    advisories: reading.advisories,
                };

                self.state.health.record_success(id, now, duration_ms);
                self.state.cache.set(id, snapshot.clone(), source.ttl, now);
                self.persist(&snapshot).await;

                for adv in &snapshot.advisories {
                    self.state
                        .alerts
                        .raise(id, snapshot.category, adv, self.clock.now());
                }

                counter!("intel_collect_success_total", "source" => id.to_string()).increment(1);
                tracing::debug!(
                    target: "intel",
                    source = id,
                    duration_ms,
                    advisories = snapshot.advisories.len(),
                    "collected"
                );
                Ok(RunOutcome::Fresh(snapshot))
            }
            Err(err) => {
                let reason = match &err {
                    IntelError::CollectionFailure { reason, .. } => reason.clone(),
                    other => other.to_string(),
                };
                let failures = self
                    .state
                    .health
                    .record_failure(id, now, duration_ms, &reason);
                counter!("intel_collect_failure_total", "source" => id.to_string()).increment(1);

                match self.state.cache.get(id) {
                    Some(entry) => {
                        tracing::warn!(
                            target: "intel",
                            source = id,
                            failures,
                            error = %err,
                            stale_since = %entry.snapshot.obtained_at,
                            "collection failed; serving cached snapshot"
                        );
                        counter!("intel_stale_served_total", "source" => id.to_string())
                            .increment(1);
                        self.persist(&entry.snapshot).await;
                        Ok(RunOutcome::Stale {
                            snapshot: entry.snapshot,
                            error: reason,
                        })
                    }
                    None => {
                        tracing::warn!(
                            target: "intel",
                            source = id,
                            failures,
                            error = %err,
                            "collection failed; nothing cached"
                        );
                        Ok(RunOutcome::Unavailable { error: reason })
                    }
                }
            }
        }
    }

    /// Call the collector in its own task so panics and timeouts stay contained.
    async fn collect(&self, source: &RegisteredSource) -> IntelResult<Reading> {
        let id = source.descriptor.id.as_str();
        let collector = Arc::clone(&source.collector);
        let mut task = tokio::spawn(async move { collector.collect().await });

        match tokio::time::timeout(self.collect_timeout, &mut task).await {
            Ok(Ok(Ok(reading))) => validate(id, reading),
            Ok(Ok(Err(e))) => Err(IntelError::collection(id, format!("{e:#}"))),
            Ok(Err(join)) if join.is_panic() => Err(IntelError::collection(id, "collector panicked")),
            Ok(Err(join)) => Err(IntelError::collection(id, join)),
            Err(_) => {
                task.abort();
                Err(IntelError::collection(
                    id,
                    format!("timed out after {}ms", self.collect_timeout.as_millis()),
                ))
            }
        }
    }

    async fn persist(&self, snapshot: &Snapshot) {
        if let Err(e) = self.store.persist(snapshot).await {
            let err = IntelError::PersistenceFailure {
                source_id: snapshot.source_id.clone(),
                reason: format!("{e:#}"),
            };
            tracing::warn!(target: "intel", error = %err, "snapshot not persisted");
        }
    }
}

fn validate(source_id: &str, reading: Reading) -> IntelResult<Reading> {
    if !reading.metrics.is_object() {
        return Err(IntelError::collection(
            source_id,
            "invalid payload: metrics must be a JSON object",
        ));
    }
    Ok(reading)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::intel::registry::FnCollector;
    use crate::intel::sinks::MemorySnapshotStore;
    use crate::intel::types::{Advisory, HealthStatus, SourceCategory, SourceDescriptor};
    use std::sync::atomic::{AtomicBool, Ordering};

    fn runner_with(
        collector: Arc<dyn crate::intel::registry::Collector>,
        store: Arc<MemorySnapshotStore>,
    ) -> (CollectorRunner, Arc<IntelState>) {
        let mut reg = SourceRegistry::new();
        reg.register(
            SourceDescriptor::new("src", "Source", SourceCategory::Operational, "test"),
            Duration::from_secs(60),
            collector,
        )
        .unwrap();
        let state = Arc::new(IntelState::new(100, Duration::from_secs(3600)));
        let runner = CollectorRunner::new(
            Arc::new(reg),
            state.clone(),
            store,
            Arc::new(ManualClock::default()),
            Duration::from_millis(200),
        );
        (runner, state)
    }

    #[tokio::test]
    async fn non_object_metrics_count_as_failure() {
        let c = Arc::new(FnCollector::new(|| {
            Ok(Reading {
                metrics: serde_json::json!([1, 2, 3]),
                advisories: vec![],
            })
        }));
        let (runner, state) = runner_with(c, Arc::new(MemorySnapshotStore::new()));
        let out = runner.run("src").await.unwrap();
        assert!(matches!(out, RunOutcome::Unavailable { ref error } if error.contains("invalid payload")));
        assert_eq!(state.health.get("src").unwrap().status, HealthStatus::Degraded);
    }

    #[tokio::test]
    async fn panicking_collector_is_contained() {
        let c = Arc::new(FnCollector::new(|| -> anyhow::Result<Reading> {
            panic!("collector blew up")
        }));
        let (runner, state) = runner_with(c, Arc::new(MemorySnapshotStore::new()));
        let out = runner.run("src").await.unwrap();
        assert_eq!(
            out,
            RunOutcome::Unavailable {
                error: "collector panicked".into()
            }
        );
        assert_eq!(state.health.get("src").unwrap().failure_count, 1);
    }

    struct Slow;

    #[async_trait::async_trait]
    impl crate::intel::registry::Collector for Slow {
        async fn collect(&self) -> anyhow::Result<Reading> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Reading {
                metrics: serde_json::json!({}),
                advisories: vec![],
            })
        }
    }

    #[tokio::test]
    async fn slow_collector_times_out() {
        let (runner, _state) = runner_with(Arc::new(Slow), Arc::new(MemorySnapshotStore::new()));
        let out = runner.run("src").await.unwrap();
        assert!(matches!(out, RunOutcome::Unavailable { ref error } if error.contains("timed out")));
    }

    #[tokio::test]
    async fn persistence_failure_does_not_fail_the_run() {
        let c = Arc::new(FnCollector::new(|| {
            Ok(Reading {
                metrics: serde_json::json!({ "ok": true }),
                advisories: vec![Advisory::warning("heads up")],
            })
        }));
        let (runner, state) = runner_with(c, Arc::new(MemorySnapshotStore::failing()));
        let out = runner.run("src").await.unwrap();
        assert!(out.is_success());
        assert!(state.cache.get("src").is_some());
        assert_eq!(state.alerts.len(), 1);
    }

    #[tokio::test]
    async fn stale_serve_does_not_reappend_advisories() {
        let fail = Arc::new(AtomicBool::new(false));
        let f = fail.clone();
        let c = Arc::new(FnCollector::new(move || {
            if f.load(Ordering::SeqCst) {
                anyhow::bail!("upstream down");
            }
            Ok(Reading {
                metrics: serde_json::json!({ "ok": true }),
                advisories: vec![Advisory::critical("storm")],
            })
        }));
        let store = Arc::new(MemorySnapshotStore::new());
        let (runner, state) = runner_with(c, store.clone());

        let first = runner.run("src").await.unwrap();
        fail.store(true, Ordering::SeqCst);
        let second = runner.run("src").await.unwrap();

        match second {
            RunOutcome::Stale { snapshot, error } => {
                assert_eq!(Some(&snapshot), first.snapshot());
                assert!(error.contains("upstream down"));
            }
            other => panic!("expected stale outcome, got {other:?}"),
        }
        assert_eq!(state.alerts.len(), 1);
        // fresh + stale-served both forwarded
        assert_eq!(store.saved().len(), 2);
    }

    #[tokio::test]
    async fn unknown_source_is_an_error() {
        let c = Arc::new(FnCollector::new(|| {
            Ok(Reading {
                metrics: serde_json::json!({}),
                advisories: vec![],
            })
        }));
        let (runner, _) = runner_with(c, Arc::new(MemorySnapshotStore::new()));
        assert!(matches!(
            runner.run("ghost").await,
            Err(IntelError::UnknownSource(_))
        ));
    }
}
