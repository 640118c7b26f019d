// src/intel/providers/demand_signals.rs
use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;

use super::round2;
use crate::intel::registry::Collector;
use crate::intel::signals::{ids, DemandReport, RegionDemand, REGIONS};
use crate::intel::types::{Advisory, Reading, SourceCategory, SourceDescriptor};

/// Simulated shipment demand index per region (100 = baseline).
#[derive(Debug, Default, Clone, Copy)]
pub struct DemandSignalsProvider;

impl DemandSignalsProvider {
    pub fn descriptor() -> SourceDescriptor {
        SourceDescriptor::new(
            ids::DEMAND_SIGNALS,
            "Demand Signals",
            SourceCategory::Market,
            "simulated:demand",
        )
    }

    fn sample() -> DemandReport {
        let mut rng = rand::rng();
        let regions: Vec<RegionDemand> = REGIONS
            .iter()
            .map(|r| RegionDemand {
                region: r.to_string(),
                demand_index: round2(rng.random_range(75.0..130.0)),
                change_7d_pct: round2(rng.random_range(-12.0..12.0)),
            })
            .collect();
        let overall = regions.iter().map(|r| r.demand_index).sum::<f64>() / regions.len() as f64;
        DemandReport {
            regions,
            overall_index: round2(overall),
        }
    }
}

pub(crate) fn advisories(m: &DemandReport) -> Vec<Advisory> {
    m.regions
        .iter()
        .filter(|r| r.demand_index >= 120.0)
        .map(|r| {
            Advisory::info(format!(
                "Demand surge in {} (index {:.0}, {:+.1}% w/w)",
                r.region, r.demand_index, r.change_7d_pct
            ))
        })
        .collect()
}

#[async_trait]
impl Collector for DemandSignalsProvider {
    async fn collect(&self) -> Result<Reading> {
        let m = Self::sample();
        let adv = advisories(&m);
        Reading::from_metrics(&m, adv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overall_index_is_the_regional_mean() {
        let m = DemandSignalsProvider::sample();
        let mean = m.regions.iter().map(|r| r.demand_index).sum::<f64>() / 4.0;
        assert!((m.overall_index - mean).abs() < 0.01);
    }
}
