// src/intel/providers/compliance_bulletins.rs
use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;

use crate::intel::registry::Collector;
use crate::intel::signals::{ids, ComplianceBulletin, ComplianceReport};
use crate::intel::types::{Advisory, Reading, SourceCategory, SourceDescriptor};

const TOPICS: [(&str, &str); 5] = [
    ("US", "FMCSA hours-of-service update"),
    ("US", "CBP customs filing change"),
    ("EU", "Mobility Package driver rules"),
    ("EU", "ETS maritime emissions surcharge"),
    ("CN", "Export documentation requirement"),
];

/// Simulated regulatory bulletins affecting carriers.
#[derive(Debug, Default, Clone, Copy)]
pub struct ComplianceBulletinsProvider;

impl ComplianceBulletinsProvider {
    pub fn descriptor() -> SourceDescriptor {
        SourceDescriptor::new(
            ids::COMPLIANCE_BULLETINS,
            "Compliance Bulletins",
            SourceCategory::Compliance,
            "simulated:regulatory-feed",
        )
    }

    fn sample() -> ComplianceReport {
        let mut rng = rand::rng();
        let mut bulletins = Vec::new();
        for (j, topic) in TOPICS {
            if !rng.random_bool(0.4) {
                continue;
            }
            bulletins.push(ComplianceBulletin {
                jurisdiction: j.to_string(),
                topic: topic.to_string(),
                effective_in_days: rng.random_range(0..90),
                mandatory: rng.random_bool(0.6),
            });
        }
        ComplianceReport { bulletins }
    }
}

pub(crate) fn advisories(m: &ComplianceReport) -> Vec<Advisory> {
    m.bulletins
        .iter()
        .filter(|b| b.mandatory && b.effective_in_days <= 14)
        .map(|b| {
            Advisory::warning(format!(
                "{}: {} takes effect in {} days",
                b.jurisdiction, b.topic, b.effective_in_days
            ))
        })
        .collect()
}

#[async_trait]
impl Collector for ComplianceBulletinsProvider {
    async fn collect(&self) -> Result<Reading> {
        let m = Self::sample();
        let adv = advisories(&m);
        Reading::from_metrics(&m, adv)
    }
}
