// src/intel/providers/mod.rs
//! Built-in, self-contained collectors. None of them touch the network; each
//! produces a plausible simulated reading plus advisories derived from it.

pub mod compliance_bulletins;
pub mod demand_signals;
pub mod fuel_prices;
pub mod market_rates;
pub mod partner_health;
pub mod port_status;
pub mod traffic;
pub mod weather;

use std::sync::Arc;

use crate::config::IntelConfig;
use crate::error::IntelResult;
use crate::intel::registry::{Collector, SourceRegistry};
use crate::intel::types::SourceDescriptor;

use compliance_bulletins::ComplianceBulletinsProvider;
use demand_signals::DemandSignalsProvider;
use fuel_prices::FuelPricesProvider;
use market_rates::MarketRatesProvider;
use partner_health::PartnerHealthProvider;
use port_status::PortStatusProvider;
use traffic::TrafficProvider;
use weather::WeatherProvider;

/// Every built-in source as `(descriptor, collector)`, in registration order.
pub fn builtin_sources() -> Vec<(SourceDescriptor, Arc<dyn Collector>)> {
    vec![
        entry(
            MarketRatesProvider::descriptor(),
            MarketRatesProvider,
        ),
        entry(
            FuelPricesProvider::descriptor(),
            FuelPricesProvider,
        ),
        entry(
            WeatherProvider::descriptor(),
            WeatherProvider,
        ),
        entry(
            TrafficProvider::descriptor(),
            TrafficProvider,
        ),
        entry(
            PortStatusProvider::descriptor(),
            PortStatusProvider,
        ),
        entry(
            DemandSignalsProvider::descriptor(),
            DemandSignalsProvider,
        ),
        entry(
            PartnerHealthProvider::descriptor(),
            PartnerHealthProvider,
        ),
        entry(
            ComplianceBulletinsProvider::descriptor(),
            ComplianceBulletinsProvider,
        ),
    ]
}

fn entry<C: Collector + 'static>(
    desc: SourceDescriptor,
    collector: C,
) -> (SourceDescriptor, Arc<dyn Collector>) {
    (desc, Arc::new(collector))
}

/// Registry with every built-in source that `cfg` does not disable.
/// TTL: `cfg.source_ttl_ms` entry, else `cfg.default_ttl_ms`.
pub fn default_registry(cfg: &IntelConfig) -> IntelResult<SourceRegistry> {
    let mut reg = SourceRegistry::new();
    for (desc, collector) in builtin_sources() {
        if cfg.is_disabled(&desc.id) {
            tracing::info!(target: "intel", source = %desc.id, "source disabled by config");
            continue;
        }
        let ttl = cfg.ttl_for(&desc.id);
        reg.register(desc, ttl, collector)?;
    }
    Ok(reg)
}

pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
