// src/intel/providers/weather.rs
use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;

use super::round2;
use crate::intel::registry::Collector;
use crate::intel::signals::{ids, WeatherCity, WeatherReport};
use crate::intel::types::{Advisory, Reading, SourceCategory, SourceDescriptor};

const CITIES: [(&str, &str); 8] = [
    ("Chicago", "NORTH_AMERICA"),
    ("Houston", "NORTH_AMERICA"),
    ("Los Angeles", "NORTH_AMERICA"),
    ("Rotterdam", "EUROPE"),
    ("Hamburg", "EUROPE"),
    ("Shanghai", "ASIA_PACIFIC"),
    ("Singapore", "ASIA_PACIFIC"),
    ("Sao Paulo", "LATIN_AMERICA"),
];

const SEVERE: [&str; 3] = ["blizzard", "hurricane", "severe thunderstorm"];
const CALM: [&str; 4] = ["clear", "cloudy", "light rain", "fog"];

/// Simulated city weather along major freight hubs.
#[derive(Debug, Default, Clone, Copy)]
pub struct WeatherProvider;

impl WeatherProvider {
    pub fn descriptor() -> SourceDescriptor {
        SourceDescriptor::new(
            ids::WEATHER,
            "Hub Weather",
            SourceCategory::Operational,
            "simulated:weather",
        )
    }

    fn sample() -> WeatherReport {
        let mut rng = rand::rng();
        let cities = CITIES
            .iter()
            .map(|(city, region)| {
                let severe = rng.random_bool(0.08);
                let condition = if severe {
                    SEVERE[rng.random_range(0..SEVERE.len())]
                } else {
                    CALM[rng.random_range(0..CALM.len())]
                };
                let wind = if severe {
                    rng.random_range(60.0..140.0)
                } else {
                    rng.random_range(0.0..35.0)
                };
                WeatherCity {
                    city: city.to_string(),
                    region: region.to_string(),
                    condition: condition.to_string(),
                    severe,
                    wind_kph: round2(wind),
                }
            })
            .collect();
        WeatherReport { cities }
    }
}

pub(crate) fn advisories(m: &WeatherReport) -> Vec<Advisory> {
    m.cities
        .iter()
        .filter(|c| c.severe)
        .map(|c| {
            Advisory::critical(format!(
                "Severe weather in {} ({}, wind {:.0} kph)",
                c.city, c.condition, c.wind_kph
            ))
        })
        .collect()
}

#[async_trait]
impl Collector for WeatherProvider {
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
    fn sample_reports_every_city_and_severe_ones_are_windy() {
        let m = WeatherProvider::sample();
        assert_eq!(m.cities.len(), CITIES.len());
        for c in m.cities.iter().filter(|c| c.severe) {
            assert!(c.wind_kph >= 60.0);
        }
        assert_eq!(advisories(&m).len(), m.cities.iter().filter(|c| c.severe).count());
    }
}
