use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::icons;
use crate::units::{self, TemperatureUnit, UnitSystem, UvLevel, WindSpeedUnit};

/// How `fetch_forecast` shapes the provider's 3-hour samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ForecastMode {
    /// Every interval sample, unmodified.
    #[default]
    Intervals,
    /// One representative point per calendar day.
    DailySummary,
}

impl std::str::FromStr for ForecastMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "intervals" | "raw" => Ok(Self::Intervals),
            "daily_summary" | "daily" => Ok(Self::DailySummary),
            other => Err(format!("unknown forecast mode: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Current conditions for one city.
///
/// Temperatures and wind speed are in the units of `units`. Optional
/// readings are `None` when the provider did not report them; they never
/// default to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub city: String,
    pub country: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub units: UnitSystem,
    pub temperature: f64,
    pub feels_like: f64,
    /// Percent, 0..=100
    pub humidity: u8,
    pub pressure_hpa: f64,
    pub wind_speed: f64,
    /// Bearing in degrees
    pub wind_direction: Option<f64>,
    /// Percent, 0..=100
    pub cloud_cover: u8,
    pub visibility_m: Option<f64>,
    pub condition: String,
    pub description: Option<String>,
    /// Provider icon code, e.g. "04d"
    pub provider_icon: Option<String>,
    pub uv_index: Option<f64>,
    pub sunrise: Option<DateTime<FixedOffset>>,
    pub sunset: Option<DateTime<FixedOffset>>,
    pub observed_at: Option<DateTime<FixedOffset>>,
}

impl CurrentConditions {
    pub fn icon(&self) -> &'static str {
        icons::icon_for(&self.condition)
    }

    pub fn temperature_unit(&self) -> TemperatureUnit {
        self.units.temperature_unit()
    }

    pub fn wind_speed_in(&self, unit: WindSpeedUnit) -> f64 {
        units::convert_wind_speed(self.wind_speed, self.units.wind_speed_unit(), unit)
    }

    pub fn compass_direction(&self) -> Option<&'static str> {
        self.wind_direction.map(units::compass_direction)
    }

    pub fn uv_level(&self) -> Option<UvLevel> {
        self.uv_index.map(units::classify_uv)
    }

    pub fn visibility_km(&self) -> Option<f64> {
        self.visibility_m.map(|m| m / 1000.0)
    }

    pub fn daylight_hours(&self) -> Option<f64> {
        match (&self.sunrise, &self.sunset) {
            (Some(rise), Some(set)) => Some(units::daylight_hours(rise, set)),
            _ => None,
        }
    }

    /// "City, CC"
    pub fn location_label(&self) -> String {
        units::format_location(&self.city, self.country.as_deref())
    }

    /// Wind-chill estimate in the record's own temperature unit.
    pub fn wind_chill(&self) -> f64 {
        let temp_unit = self.temperature_unit();
        let temp_c = units::convert_temperature(self.temperature, temp_unit, TemperatureUnit::Celsius);
        let wind_ms = self.wind_speed_in(WindSpeedUnit::MetersPerSecond);
        let chill_c = units::wind_chill(temp_c, wind_ms);
        units::convert_temperature(chill_c, TemperatureUnit::Celsius, temp_unit)
    }
}

/// One forecast sample, in the units the forecast was requested with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// City-local instant
    pub timestamp: DateTime<FixedOffset>,
    pub temperature: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    /// Percent, 0..=100
    pub humidity: u8,
    pub wind_speed: f64,
    pub pressure_hpa: f64,
    pub condition: String,
    pub description: Option<String>,
    /// Rain volume over the sample window in mm
    pub precipitation_mm: Option<f64>,
}

impl ForecastPoint {
    pub fn icon(&self) -> &'static str {
        icons::icon_for(&self.condition)
    }
}
