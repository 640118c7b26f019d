//! Intel Orchestrator: Binary Entrypoint
//! Loads configuration, wires the built-in collectors and runs the collection
//! timer until Ctrl-C.

use intel_orchestrator::{config, telemetry::Metrics, Orchestrator};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs by default; `INTEL_LOG_JSON=1` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("intel=info,audit=info,warn"));

    let json = std::env::var("INTEL_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = config::load_default()?;
    tracing::info!(
        target: "intel",
        interval_ms = cfg.interval_ms,
        max_alerts = cfg.max_alerts,
        "configuration loaded"
    );

    let metrics = match Metrics::init(cfg.interval_ms, cfg.max_alerts) {
        Ok(m) => Some(m),
        Err(e) => {
            tracing::warn!(target: "intel", error = %e, "metrics disabled");
            None
        }
    };

    let orch = Orchestrator::from_config(&cfg)?;
    orch.start(cfg.interval());

    let mut report = tokio::time::interval(cfg.interval());
    report.tick().await;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = report.tick() => {
                let status = orch.status();
                tracing::info!(
                    target: "intel",
                    runs = status.run_count,
                    cached = status.cached_sources,
                    alerts = status.active_alerts,
                    degraded = status
                        .sources
                        .iter()
                        .filter(|s| s.status == intel_orchestrator::intel::HealthStatus::Degraded)
                        .count(),
                    "status"
                );
                if let Some(m) = &metrics {
                    tracing::debug!(target: "intel", exposition = %m.render(), "metrics");
                }
            }
        }
    }

    orch.shutdown().await;
    Ok(())
}
