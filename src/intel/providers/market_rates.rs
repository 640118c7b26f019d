// src/intel/providers/market_rates.rs
use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;

use super::round2;
use crate::intel::registry::Collector;
use crate::intel::signals::{ids, MarketRates, RateLane, REGIONS};
use crate::intel::types::{Advisory, Reading, SourceCategory, SourceDescriptor, TransportMode};

const MODES: [(TransportMode, f64); 4] = [
    (TransportMode::Road, 2.45),
    (TransportMode::Rail, 1.60),
    (TransportMode::Air, 4.10),
    (TransportMode::Ocean, 1.85),
];

/// Simulated spot-rate index per (region, mode) lane.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarketRatesProvider;

impl MarketRatesProvider {
    pub fn descriptor() -> SourceDescriptor {
        SourceDescriptor::new(
            ids::MARKET_RATES,
            "Freight Spot Rates",
            SourceCategory::Market,
            "simulated:rate-index",
        )
    }

    fn sample() -> MarketRates {
        let mut rng = rand::rng();
        let mut lanes = Vec::with_capacity(REGIONS.len() * MODES.len());
        for region in REGIONS {
            for (mode, base) in MODES {
                let change = rng.random_range(-6.0..6.0);
                lanes.push(RateLane {
                    region: region.to_string(),
                    mode,
                    spot_rate: round2(base * (1.0 + change / 100.0)),
                    change_24h_pct: round2(change),
                });
            }
        }
        MarketRates { lanes }
    }
}

pub(crate) fn advisories(m: &MarketRates) -> Vec<Advisory> {
    m.lanes
        .iter()
        .filter(|l| l.change_24h_pct.abs() >= 5.0)
        .map(|l| {
            Advisory::warning(format!(
                "{:?} spot rates in {} moved {:+.1}% in 24h",
                l.mode, l.region, l.change_24h_pct
            ))
        })
        .collect()
}

#[async_trait]
impl Collector for MarketRatesProvider {
    async fn collect(&self) -> Result<Reading> {
        let m = Self::sample();
        let adv = advisories(&m);
        Reading::from_metrics(&m, adv)
    }
}
