use metrics::{describe_counter, describe_gauge, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up in the exposition before first use).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "intel_collect_success_total",
            "Successful collector runs, labelled by source."
        );
        describe_counter!(
            "intel_collect_failure_total",
            "Failed collector runs (error, invalid payload, timeout, panic)."
        );
        describe_counter!(
            "intel_stale_served_total",
            "Failed runs answered from the last cached snapshot."
        );
        describe_histogram!("intel_collect_ms", "Collector run time in milliseconds.");
        describe_counter!("intel_runs_total", "Completed orchestrator runs.");
        describe_counter!(
            "intel_runs_skipped_total",
            "Run requests dropped because a run was already in flight."
        );
        describe_gauge!("intel_alerts_active", "Non-expired alerts after the last run.");
        describe_gauge!("intel_last_run_ts", "Unix ts when the last orchestrator run finished.");
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder and publish static config gauges.
    pub fn init(interval_ms: u64, max_alerts: usize) -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| anyhow::anyhow!("prometheus: install recorder: {e}"))?;

        ensure_metrics_described();
        gauge!("intel_interval_ms").set(interval_ms as f64);
        gauge!("intel_max_alerts").set(max_alerts as f64);

        Ok(Self { handle })
    }

    /// Prometheus exposition text.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}
