// src/config.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_CONFIG_PATH: &str = "INTEL_CONFIG_PATH";
pub const ENV_INTERVAL_MS: &str = "INTEL_INTERVAL_MS";
pub const ENV_MAX_ALERTS: &str = "INTEL_MAX_ALERTS";

pub const DEFAULT_CONFIG_TOML: &str = "config/intel.toml";
pub const DEFAULT_CONFIG_JSON: &str = "config/intel.json";

fn default_interval_ms() -> u64 {
    300_000
}
fn default_ttl_ms() -> u64 {
    600_000
}
fn default_collect_timeout_ms() -> u64 {
    10_000
}
fn default_max_alerts() -> usize {
    crate::intel::alerts::DEFAULT_MAX_ALERTS
}
fn default_alert_ttl_secs() -> u64 {
    3_600
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntelConfig {
    /// Tick interval of the orchestrator timer.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// TTL for sources without an explicit override.
    #[serde(default = "default_ttl_ms")]
    pub default_ttl_ms: u64,
    /// Upper bound for a single collector call.
    #[serde(default = "default_collect_timeout_ms")]
    pub collect_timeout_ms: u64,
    #[serde(default = "default_max_alerts")]
    pub max_alerts: usize,
    #[serde(default = "default_alert_ttl_secs")]
    pub alert_ttl_secs: u64,
    /// Per-source TTL overrides (source id -> ms).
    #[serde(default)]
    pub source_ttl_ms: HashMap<String, u64>,
    /// Built-in sources to leave unregistered.
    #[serde(default)]
    pub disabled_sources: Vec<String>,
    /// Append persisted snapshots here as JSON lines; `None` disables persistence.
    #[serde(default)]
    pub snapshot_log_path: Option<PathBuf>,
}

impl Default for IntelConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            default_ttl_ms: default_ttl_ms(),
            collect_timeout_ms: default_collect_timeout_ms(),
            max_alerts: default_max_alerts(),
            alert_ttl_secs: default_alert_ttl_secs(),
            source_ttl_ms: HashMap::new(),
            disabled_sources: Vec::new(),
            snapshot_log_path: None,
        }
    }
}

impl IntelConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn collect_timeout(&self) -> Duration {
        Duration::from_millis(self.collect_timeout_ms)
    }

    pub fn alert_ttl(&self) -> Duration {
        Duration::from_secs(self.alert_ttl_secs)
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    /// TTL for `source_id`: its `source_ttl_ms` entry, else `default_ttl_ms`.
    pub fn ttl_for(&self, source_id: &str) -> Duration {
        match self.source_ttl_ms.get(source_id) {
            Some(ms) => Duration::from_millis(*ms),
            None => self.default_ttl(),
        }
    }

    pub fn is_disabled(&self, source_id: &str) -> bool {
        self.disabled_sources
            .iter()
            .any(|s| s.trim().eq_ignore_ascii_case(source_id))
    }

    /// Replace zero values with defaults and clamp the rest.
    pub(crate) fn sanitize(mut self) -> Self {
        if self.interval_ms == 0 {
            self.interval_ms = default_interval_ms();
        }
        if self.default_ttl_ms == 0 {
            self.default_ttl_ms = default_ttl_ms();
        }
        if self.collect_timeout_ms == 0 {
            self.collect_timeout_ms = default_collect_timeout_ms();
        }
        if self.max_alerts == 0 {
            self.max_alerts = default_max_alerts();
        }
        self.max_alerts = self.max_alerts.min(10_000);
        self
    }

    fn apply_env_overrides(mut self) -> Self {
        if let Some(v) = env_parse::<u64>(ENV_INTERVAL_MS) {
            self.interval_ms = v;
        }
        if let Some(v) = env_parse::<usize>(ENV_MAX_ALERTS) {
            self.max_alerts = v;
        }
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_from(path: &Path) -> Result<IntelConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading intel config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let cfg = parse_config(&content, ext.as_str())
        .with_context(|| format!("parsing intel config {}", path.display()))?;
    Ok(cfg.apply_env_overrides().sanitize())
}

/// Load config using env var + fallbacks:
/// 1) $INTEL_CONFIG_PATH
/// 2) config/intel.toml
/// 3) config/intel.json
/// 4) built-in defaults
///
/// Env overrides (`INTEL_INTERVAL_MS`, `INTEL_MAX_ALERTS`) apply in every case.
pub fn load_default() -> Result<IntelConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_from(&pb);
        } else {
            return Err(anyhow!("INTEL_CONFIG_PATH points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from(DEFAULT_CONFIG_TOML);
    if toml_p.exists() {
        return load_from(&toml_p);
    }
    let json_p = PathBuf::from(DEFAULT_CONFIG_JSON);
    if json_p.exists() {
        return load_from(&json_p);
    }
    Ok(IntelConfig::default().apply_env_overrides().sanitize())
}

fn parse_config(s: &str, hint_ext: &str) -> Result<IntelConfig> {
    if hint_ext == "json" {
        return Ok(serde_json::from_str(s)?);
    }
    match toml::from_str::<IntelConfig>(s) {
        Ok(cfg) => Ok(cfg),
        Err(toml_err) => serde_json::from_str(s)
            .map_err(|_| anyhow!("unsupported intel config format: {toml_err}")),
    }
}
