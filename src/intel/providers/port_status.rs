// src/intel/providers/port_status.rs
use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;

use super::round2;
use crate::intel::registry::Collector;
use crate::intel::signals::{ids, PortReport, PortStatus};
use crate::intel::types::{Advisory, Reading, SourceCategory, SourceDescriptor};

const PORTS: [(&str, &str); 7] = [
    ("Los Angeles", "NORTH_AMERICA"),
    ("Long Beach", "NORTH_AMERICA"),
    ("Savannah", "NORTH_AMERICA"),
    ("Rotterdam", "EUROPE"),
    ("Shanghai", "ASIA_PACIFIC"),
    ("Singapore", "ASIA_PACIFIC"),
    ("Santos", "LATIN_AMERICA"),
];

/// Simulated berth congestion and anchorage wait times.
#[derive(Debug, Default, Clone, Copy)]
pub struct PortStatusProvider;

impl PortStatusProvider {
    pub fn descriptor() -> SourceDescriptor {
        SourceDescriptor::new(
            ids::PORT_STATUS,
            "Port Status",
            SourceCategory::Operational,
            "simulated:port-authority",
        )
    }

    fn sample() -> PortReport {
        let mut rng = rand::rng();
        let ports = PORTS
            .iter()
            .map(|(port, region)| {
                let vessels: u32 = rng.random_range(0..40);
                let congested = vessels >= 25;
                let wait = if congested {
                    rng.random_range(2.0..9.0)
                } else {
                    rng.random_range(0.0..1.5)
                };
                PortStatus {
                    port: port.to_string(),
                    region: region.to_string(),
                    congested,
                    wait_time_days: round2(wait),
                    vessels_waiting: vessels,
                }
            })
            .collect();
        PortReport { ports }
    }
}

pub(crate) fn advisories(m: &PortReport) -> Vec<Advisory> {
    m.ports
        .iter()
        .filter(|p| p.congested)
        .map(|p| {
            Advisory::warning(format!(
                "Port of {} congested: {} vessels waiting, ~{:.1} days",
                p.port, p.vessels_waiting, p.wait_time_days
            ))
        })
        .collect()
}

#[async_trait]
impl Collector for PortStatusProvider {
    async fn collect(&self) -> Result<Reading> {
        let m = Self::sample();
        let adv = advisories(&m);
        Reading::from_metrics(&m, adv)
    }
}
