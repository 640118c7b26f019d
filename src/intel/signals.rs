//! # Signal payloads
//! Typed metric payloads produced by the built-in collectors.
//!
//! Snapshots carry metrics as plain JSON so the cache, persistence and readers
//! stay source-agnostic. The folds in [`crate::intel::adjustments`] decode the
//! payloads they understand back into these types and ignore anything else.

use serde::{Deserialize, Serialize};

use crate::intel::types::TransportMode;

pub const REGIONS: [&str; 4] = ["NORTH_AMERICA", "EUROPE", "ASIA_PACIFIC", "LATIN_AMERICA"];

/// Source ids of the built-in collectors, in registration order.
pub mod ids {
    pub const MARKET_RATES: &str = "market_rates";
    pub const FUEL_PRICES: &str = "fuel_prices";
    pub const WEATHER: &str = "weather";
    pub const TRAFFIC: &str = "traffic";
    pub const PORT_STATUS: &str = "port_status";
    pub const DEMAND_SIGNALS: &str = "demand_signals";
    pub const PARTNER_HEALTH: &str = "partner_health";
    pub const COMPLIANCE_BULLETINS: &str = "compliance_bulletins";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLane {
    pub region: String,
    pub mode: TransportMode,
    pub spot_rate: f64,
    pub change_24h_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketRates {
    pub lanes: Vec<RateLane>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelPrices {
    pub diesel_usd_per_gal: f64,
    pub diesel_change_24h_pct: f64,
    pub bunker_usd_per_ton: f64,
    pub bunker_change_24h_pct: f64,
    pub jet_usd_per_gal: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherCity {
    pub city: String,
    pub region: String,
    pub condition: String,
    pub severe: bool,
    pub wind_kph: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub cities: Vec<WeatherCity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficCorridor {
    pub corridor: String,
    pub region: String,
    /// 0.0 (free flow) ..= 1.0 (gridlock)
    pub congestion_index: f64,
    pub delay_minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficReport {
    pub corridors: Vec<TrafficCorridor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortStatus {
    pub port: String,
    pub region: String,
    pub congested: bool,
    #[serde(alias = "waitTime")]
    pub wait_time_days: f64,
    #[serde(default)]
    pub vessels_waiting: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortReport {
    pub ports: Vec<PortStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionDemand {
    pub region: String,
    /// 100.0 is the long-run baseline.
    pub demand_index: f64,
    pub change_7d_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandReport {
    pub regions: Vec<RegionDemand>,
    pub overall_index: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerBoard {
    pub partner: String,
    pub online: bool,
    pub latency_ms: u64,
    pub acceptance_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerReport {
    pub boards: Vec<PartnerBoard>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceBulletin {
    pub jurisdiction: String,
    pub topic: String,
    pub effective_in_days: u32,
    pub mandatory: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub bulletins: Vec<ComplianceBulletin>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_status_accepts_camel_case_wait_time() {
        let v = serde_json::json!({
            "port": "Long Beach",
            "region": "NORTH_AMERICA",
            "congested": true,
            "waitTime": 5.0
        });
        let p: PortStatus = serde_json::from_value(v).unwrap();
        assert_eq!(p.wait_time_days, 5.0);
        assert_eq!(p.vessels_waiting, 0);
    }
}
