// src/intel/providers/partner_health.rs
use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;

use super::round2;
use crate::intel::registry::Collector;
use crate::intel::signals::{ids, PartnerBoard, PartnerReport};
use crate::intel::types::{Advisory, Reading, SourceCategory, SourceDescriptor};

const BOARDS: [&str; 4] = ["DAT", "Truckstop", "Freightos", "Convoy"];

/// Simulated availability of partner load boards.
#[derive(Debug, Default, Clone, Copy)]
pub struct PartnerHealthProvider;

impl PartnerHealthProvider {
    pub fn descriptor() -> SourceDescriptor {
        SourceDescriptor::new(
            ids::PARTNER_HEALTH,
            "Partner Board Health",
            SourceCategory::Partner,
            "simulated:partner-probe",
        )
    }

    fn sample() -> PartnerReport {
        let mut rng = rand::rng();
        let boards = BOARDS
            .iter()
            .map(|p| {
                let online = rng.random_bool(0.95);
                PartnerBoard {
                    partner: p.to_string(),
                    online,
                    latency_ms: if online { rng.random_range(40..900) } else { 0 },
                    acceptance_rate: if online {
                        round2(rng.random_range(0.55..0.98))
                    } else {
                        0.0
                    },
                }
            })
            .collect();
        PartnerReport { boards }
    }
}

pub(crate) fn advisories(m: &PartnerReport) -> Vec<Advisory> {
    let mut out = Vec::new();
    for b in &m.boards {
        if !b.online {
            out.push(Advisory::critical(format!("Partner board {} is offline", b.partner)));
        } else if b.latency_ms > 750 {
            out.push(Advisory::warning(format!(
                "Partner board {} slow ({} ms)",
                b.partner, b.latency_ms
            )));
        }
    }
    out
}

#[async_trait]
impl Collector for PartnerHealthProvider {
    async fn collect(&self) -> Result<Reading> {
        let m = Self::sample();
        let adv = advisories(&m);
        Reading::from_metrics(&m, adv)
    }
}
