// src/intel/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::IntelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SourceCategory {
    Market,
    Operational,
    Compliance,
    Partner,
}

impl fmt::Display for SourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceCategory::Market => "MARKET",
            SourceCategory::Operational => "OPERATIONAL",
            SourceCategory::Compliance => "COMPLIANCE",
            SourceCategory::Partner => "PARTNER",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub id: String,       // e.g. "fuel_prices"
    pub name: String,     // display name
    pub category: SourceCategory,
    pub provider: String, // provider label, e.g. "simulated:eia"
}

impl SourceDescriptor {
    pub fn new(id: &str, name: &str, category: SourceCategory, provider: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            category,
            provider: provider.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AdvisoryLevel {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    pub level: AdvisoryLevel,
    pub message: String,
}

impl Advisory {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: AdvisoryLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: AdvisoryLevel::Warning,
            message: message.into(),
        }
    }

    pub fn critical(message: impl Into<String>) -> Self {
        Self {
            level: AdvisoryLevel::Critical,
            message: message.into(),
        }
    }
}

/// Raw result of one collector call, before the runner stamps it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub metrics: serde_json::Value,
    #[serde(default)]
    pub advisories: Vec<Advisory>,
}

impl Reading {
    /// Serialize a typed metrics payload into a reading.
    pub fn from_metrics<T: Serialize>(
        metrics: &T,
        advisories: Vec<Advisory>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            metrics: serde_json::to_value(metrics)?,
            advisories,
        })
    }
}

/// One source's timestamped collection result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub source_id: String,
    pub category: SourceCategory,
    pub obtained_at: DateTime<Utc>,
    pub metrics: serde_json::Value,
    pub advisories: Vec<Advisory>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub source_id: String,
    pub status: HealthStatus,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub last_attempt: Option<DateTime<Utc>>,
    pub failure_count: u64,
    pub last_duration_ms: Option<u64>,
}

impl HealthRecord {
    pub fn new(source_id: &str) -> Self {
        Self {
            source_id: source_id.to_string(),
            status: HealthStatus::Healthy,
            last_success: None,
            last_error: None,
            last_attempt: None,
            failure_count: 0,
            last_duration_ms: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub snapshot: Snapshot,
    pub stored_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// A cached snapshot as handed to readers.
///
/// `from_cache` turns true once the entry has outlived its TTL; readers apply
/// their own staleness policy using `cache_age_ms`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntelView {
    pub snapshot: Snapshot,
    pub from_cache: bool,
    pub cache_age_ms: i64,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: u64,
    pub source_id: String,
    pub category: SourceCategory,
    pub severity: AdvisoryLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Alert {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_number: u64,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub succeeded: usize,
    pub failed: usize,
    pub alerts_raised: usize,
    pub active_alerts: usize,
}

/// Result of a single collector run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Collection succeeded; the snapshot is now cached.
    Fresh(Snapshot),
    /// Collection failed; the last good snapshot is served instead.
    Stale { snapshot: Snapshot, error: String },
    /// Collection failed and nothing was ever cached.
    Unavailable { error: String },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Fresh(_))
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        match self {
            RunOutcome::Fresh(s) | RunOutcome::Stale { snapshot: s, .. } => Some(s),
            RunOutcome::Unavailable { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransportMode {
    Road,
    Rail,
    Air,
    Ocean,
}

impl FromStr for TransportMode {
    type Err = IntelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ROAD" | "TRUCK" => Ok(TransportMode::Road),
            "RAIL" => Ok(TransportMode::Rail),
            "AIR" => Ok(TransportMode::Air),
            "OCEAN" | "SEA" => Ok(TransportMode::Ocean),
            other => Err(IntelError::InvalidMode(other.to_string())),
        }
    }
}
