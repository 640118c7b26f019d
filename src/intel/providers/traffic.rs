// src/intel/providers/traffic.rs
use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;

use super::round2;
use crate::intel::registry::Collector;
use crate::intel::signals::{ids, TrafficCorridor, TrafficReport};
use crate::intel::types::{Advisory, Reading, SourceCategory, SourceDescriptor};

/// Congestion index at or above which a corridor counts as congested.
pub const CONGESTED_INDEX: f64 = 0.7;

const CORRIDORS: [(&str, &str); 6] = [
    ("I-5 Seattle-LA", "NORTH_AMERICA"),
    ("I-95 Northeast", "NORTH_AMERICA"),
    ("A2 Ruhr-Berlin", "EUROPE"),
    ("E40 Brussels-Cologne", "EUROPE"),
    ("G15 Shenyang-Haikou", "ASIA_PACIFIC"),
    ("BR-116 Sao Paulo", "LATIN_AMERICA"),
];

/// Simulated highway corridor congestion.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrafficProvider;

impl TrafficProvider {
    pub fn descriptor() -> SourceDescriptor {
        SourceDescriptor::new(
            ids::TRAFFIC,
            "Corridor Traffic",
            SourceCategory::Operational,
            "simulated:traffic",
        )
    }

    fn sample() -> TrafficReport {
        let mut rng = rand::rng();
        let corridors = CORRIDORS
            .iter()
            .map(|(name, region)| {
                let idx: f64 = rng.random_range(0.1..1.0);
                TrafficCorridor {
                    corridor: name.to_string(),
                    region: region.to_string(),
                    congestion_index: round2(idx),
                    delay_minutes: round2(idx * idx * 90.0),
                }
            })
            .collect();
        TrafficReport { corridors }
    }
}

pub(crate) fn advisories(m: &TrafficReport) -> Vec<Advisory> {
    m.corridors
        .iter()
        .filter(|c| c.congestion_index >= CONGESTED_INDEX)
        .map(|c| {
            Advisory::warning(format!(
                "Heavy congestion on {} (+{:.0} min)",
                c.corridor, c.delay_minutes
            ))
        })
        .collect()
}

#[async_trait]
impl Collector for TrafficProvider {
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
    fn congestion_index_stays_in_range() {
        let m = TrafficProvider::sample();
        assert_eq!(m.corridors.len(), CORRIDORS.len());
        assert!(m
            .corridors
            .iter()
            .all(|c| (0.0..=1.0).contains(&c.congestion_index)));
    }
}
