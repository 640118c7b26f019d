// src/intel/providers/fuel_prices.rs
use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;

use super::round2;
use crate::intel::registry::Collector;
use crate::intel::signals::{ids, FuelPrices};
use crate::intel::types::{Advisory, Reading, SourceCategory, SourceDescriptor};

/// Simulated diesel / bunker / jet fuel prices.
#[derive(Debug, Default, Clone, Copy)]
pub struct FuelPricesProvider;

impl FuelPricesProvider {
    pub fn descriptor() -> SourceDescriptor {
        SourceDescriptor::new(
            ids::FUEL_PRICES,
            "Fuel Prices",
            SourceCategory::Market,
            "simulated:fuel-index",
        )
    }

    fn sample() -> FuelPrices {
        let mut rng = rand::rng();
        let diesel_change = rng.random_range(-4.0..7.0);
        let bunker_change = rng.random_range(-5.0..5.0);
        FuelPrices {
            diesel_usd_per_gal: round2(3.85 * (1.0 + diesel_change / 100.0)),
            diesel_change_24h_pct: round2(diesel_change),
            bunker_usd_per_ton: round2(610.0 * (1.0 + bunker_change / 100.0)),
            bunker_change_24h_pct: round2(bunker_change),
            jet_usd_per_gal: round2(rng.random_range(2.4..2.9)),
        }
    }
}

pub(crate) fn advisories(m: &FuelPrices) -> Vec<Advisory> {
    let mut out = Vec::new();
    if m.diesel_change_24h_pct > 5.0 {
        out.push(Advisory::warning(format!(
            "Diesel up {:.1}% in 24h (${:.2}/gal)",
            m.diesel_change_24h_pct, m.diesel_usd_per_gal
        )));
    }
    if m.bunker_change_24h_pct.abs() > 4.0 {
        out.push(Advisory::info(format!(
            "Bunker fuel moved {:+.1}% in 24h",
            m.bunker_change_24h_pct
        )));
    }
    out
}

#[async_trait]
impl Collector for FuelPricesProvider {
    async fn collect(&self) -> Result<Reading> {
        let m = Self::sample();
        let adv = advisories(&m);
        Reading::from_metrics(&m, adv)
    }
}
