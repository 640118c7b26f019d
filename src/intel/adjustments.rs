//! # Adjustments
//! Pure folds from cached snapshots to pricing/dispatch inputs.
//! No I/O and no clock reads; callers hand in whatever snapshots are cached.
//!
//! Dispatch rules, starting from `rate_multiplier = 1.0`, `delay_factor = 0`
//! minutes and `risk_score = 0`:
//! - rates: matching lane up more than 3% in 24h → +0.03; down more than 3% → -0.02
//! - fuel: diesel up more than 5% in 24h → +0.02
//! - weather: each severe city in the region → +30 min, +15 risk
//! - traffic: each congested corridor in the region → + its delay, +5 risk
//! - ports (ocean only): each congested port in the region → + wait days in minutes;
//!   any congested port → +20 risk (once)
//!
//! Risk is clamped to 0..=100.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::intel::providers::traffic::CONGESTED_INDEX;
use crate::intel::signals::{
    ids, DemandReport, FuelPrices, MarketRates, PortReport, TrafficReport, WeatherReport,
};
use crate::intel::types::{Snapshot, TransportMode};

const RATE_UP_PCT: f64 = 3.0;
const RATE_UP_NUDGE: f64 = 0.03;
const RATE_DOWN_NUDGE: f64 = 0.02;
const FUEL_JUMP_PCT: f64 = 5.0;
const FUEL_NUDGE: f64 = 0.02;
const SEVERE_WEATHER_DELAY_MIN: f64 = 30.0;
const SEVERE_WEATHER_RISK: f64 = 15.0;
const TRAFFIC_RISK: f64 = 5.0;
const PORT_CONGESTION_RISK: f64 = 20.0;
const MAX_RISK: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchAdjustments {
    pub region: String,
    pub mode: TransportMode,
    pub rate_multiplier: f64,
    /// Expected extra delay in minutes.
    pub delay_factor: f64,
    /// 0..=100
    pub risk_score: f64,
    pub advisories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreasuryInsights {
    pub fuel_trend_pct: Option<f64>,
    pub average_rate_change_pct: Option<f64>,
    pub demand_index: Option<f64>,
    /// Mean absolute 24h lane move, a rough market volatility gauge.
    pub volatility: Option<f64>,
    pub recommendations: Vec<String>,
}

/// Decode the payload of the snapshot for `source_id`, if present and well-formed.
fn decode<'a, T, I>(snapshots: I, source_id: &str) -> Option<T>
where
    T: DeserializeOwned,
    I: IntoIterator<Item = &'a Snapshot>,
{
    let snap = snapshots.into_iter().find(|s| s.source_id == source_id)?;
    match serde_json::from_value(snap.metrics.clone()) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::debug!(target: "intel", source = source_id, error = %e, "payload not decodable; ignored");
            None
        }
    }
}

fn same_region(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

pub fn fold_dispatch(snapshots: &[Snapshot], region: &str, mode: TransportMode) -> DispatchAdjustments {
    let mut rate_multiplier = 1.0_f64;
    let mut delay = 0.0_f64;
    let mut risk = 0.0_f64;
    let mut advisories = Vec::new();

    if let Some(rates) = decode::<MarketRates, _>(snapshots, ids::MARKET_RATES) {
        if let Some(lane) = rates
            .lanes
            .iter()
            .find(|l| l.mode == mode && same_region(&l.region, region))
        {
            if lane.change_24h_pct > RATE_UP_PCT {
                rate_multiplier += RATE_UP_NUDGE;
                advisories.push(format!(
                    "Spot rates up {:.1}% in 24h on this lane",
                    lane.change_24h_pct
                ));
            } else if lane.change_24h_pct < -RATE_UP_PCT {
                rate_multiplier -= RATE_DOWN_NUDGE;
                advisories.push(format!(
                    "Spot rates down {:.1}% in 24h on this lane",
                    lane.change_24h_pct.abs()
                ));
            }
        }
    }

    if let Some(fuel) = decode::<FuelPrices, _>(snapshots, ids::FUEL_PRICES) {
        if fuel.diesel_change_24h_pct > FUEL_JUMP_PCT {
            rate_multiplier += FUEL_NUDGE;
            advisories.push(format!(
                "Fuel surcharge: diesel up {:.1}% in 24h",
                fuel.diesel_change_24h_pct
            ));
        }
    }

    if let Some(weather) = decode::<WeatherReport, _>(snapshots, ids::WEATHER) {
        for c in weather
            .cities
            .iter()
            .filter(|c| c.severe && same_region(&c.region, region))
        {
            delay += SEVERE_WEATHER_DELAY_MIN;
            risk += SEVERE_WEATHER_RISK;
            advisories.push(format!("Severe weather in {}: {}", c.city, c.condition));
        }
    }

    if let Some(traffic) = decode::<TrafficReport, _>(snapshots, ids::TRAFFIC) {
        for c in traffic
            .corridors
            .iter()
            .filter(|c| c.congestion_index >= CONGESTED_INDEX && same_region(&c.region, region))
        {
            delay += c.delay_minutes;
            risk += TRAFFIC_RISK;
            advisories.push(format!("Congestion on {}", c.corridor));
        }
    }

    if mode == TransportMode::Ocean {
        if let Some(ports) = decode::<PortReport, _>(snapshots, ids::PORT_STATUS) {
            let congested: Vec<_> = ports
                .ports
                .iter()
                .filter(|p| p.congested && same_region(&p.region, region))
                .collect();
            for p in &congested {
                delay += p.wait_time_days * 24.0 * 60.0;
                advisories.push(format!(
                    "Port of {} congested (~{:.1} days wait)",
                    p.port, p.wait_time_days
                ));
            }
            if !congested.is_empty() {
                risk += PORT_CONGESTION_RISK;
            }
        }
    }

    DispatchAdjustments {
        region: region.to_string(),
        mode,
        rate_multiplier: (rate_multiplier * 10_000.0).round() / 10_000.0,
        delay_factor: delay,
        risk_score: risk.clamp(0.0, MAX_RISK),
        advisories,
    }
}

pub fn fold_treasury(snapshots: &[Snapshot]) -> TreasuryInsights {
    let fuel = decode::<FuelPrices, _>(snapshots, ids::FUEL_PRICES);
    let rates = decode::<MarketRates, _>(snapshots, ids::MARKET_RATES);
    let demand = decode::<DemandReport, _>(snapshots, ids::DEMAND_SIGNALS);

    let fuel_trend_pct = fuel.as_ref().map(|f| f.diesel_change_24h_pct);

    let (average_rate_change_pct, volatility) = match rates.as_ref().filter(|r| !r.lanes.is_empty()) {
        Some(r) => {
            let n = r.lanes.len() as f64;
            let avg = r.lanes.iter().map(|l| l.change_24h_pct).sum::<f64>() / n;
            let vol = r.lanes.iter().map(|l| l.change_24h_pct.abs()).sum::<f64>() / n;
            (Some(round2(avg)), Some(round2(vol)))
        }
        None => (None, None),
    };

    let demand_index = demand.as_ref().map(|d| d.overall_index);

    let mut recommendations = Vec::new();
    if fuel_trend_pct.is_some_and(|f| f > FUEL_JUMP_PCT) {
        recommendations.push("Hedge fuel exposure; diesel is rising sharply".to_string());
    }
    if average_rate_change_pct.is_some_and(|r| r > RATE_UP_PCT) {
        recommendations.push("Lock in carrier capacity before rates climb further".to_string());
    } else if average_rate_change_pct.is_some_and(|r| r < -RATE_UP_PCT) {
        recommendations.push("Defer long-term rate commitments; spot market softening".to_string());
    }
    if volatility.is_some_and(|v| v > 4.0) {
        recommendations.push("Raise liquidity buffer; rate volatility is elevated".to_string());
    }
    match demand_index {
        Some(d) if d >= 115.0 => {
            recommendations.push("Demand above baseline; expand partner capacity".to_string())
        }
        Some(d) if d <= 85.0 => {
            recommendations.push("Demand below baseline; trim reserved capacity".to_string())
        }
        _ => {}
    }

    TreasuryInsights {
        fuel_trend_pct,
        average_rate_change_pct,
        demand_index,
        volatility,
        recommendations,
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
