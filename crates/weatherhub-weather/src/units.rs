//! Unit conversions and descriptive labels for weather readings.
//!
//! Everything here is pure and stateless.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Provider unit system, sent as the `units` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn as_query(&self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Imperial => "imperial",
        }
    }

    /// Unit the provider reports temperatures in.
    pub fn temperature_unit(&self) -> TemperatureUnit {
        match self {
            Self::Metric => TemperatureUnit::Celsius,
            Self::Imperial => TemperatureUnit::Fahrenheit,
        }
    }

    /// Unit the provider reports wind speed in.
    pub fn wind_speed_unit(&self) -> WindSpeedUnit {
        match self {
            Self::Metric => WindSpeedUnit::MetersPerSecond,
            Self::Imperial => WindSpeedUnit::MilesPerHour,
        }
    }
}

impl FromStr for UnitSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "metric" | "c" | "celsius" => Ok(Self::Metric),
            "imperial" | "f" | "fahrenheit" => Ok(Self::Imperial),
            other => Err(format!("unknown unit system: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }
}

/// Convert a temperature. Exact formulas; same-unit conversion is identity.
pub fn convert_temperature(value: f64, from: TemperatureUnit, to: TemperatureUnit) -> f64 {
    match (from, to) {
        (TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit) => value * 9.0 / 5.0 + 32.0,
        (TemperatureUnit::Fahrenheit, TemperatureUnit::Celsius) => (value - 32.0) * 5.0 / 9.0,
        _ => value,
    }
}

/// Rounded value with its unit symbol, e.g. "21°C".
pub fn format_temperature(value: f64, unit: TemperatureUnit) -> String {
    format!("{}{}", value.round(), unit.symbol())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum WindSpeedUnit {
    #[default]
    #[serde(rename = "kmh")]
    KilometersPerHour,
    #[serde(rename = "mph")]
    MilesPerHour,
    #[serde(rename = "ms")]
    MetersPerSecond,
    #[serde(rename = "knots")]
    Knots,
}

impl WindSpeedUnit {
    pub fn label(&self) -> &'static str {
        match self {
            Self::KilometersPerHour => "km/h",
            Self::MilesPerHour => "mph",
            Self::MetersPerSecond => "m/s",
            Self::Knots => "knots",
        }
    }

    /// Size of one unit expressed in metres per second.
    fn in_meters_per_second(&self) -> f64 {
        match self {
            Self::KilometersPerHour => 1000.0 / 3600.0,
            Self::MilesPerHour => 0.44704,
            Self::MetersPerSecond => 1.0,
            Self::Knots => 1852.0 / 3600.0,
        }
    }
}

impl FromStr for WindSpeedUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kmh" | "km/h" | "kph" => Ok(Self::KilometersPerHour),
            "mph" => Ok(Self::MilesPerHour),
            "ms" | "m/s" => Ok(Self::MetersPerSecond),
            "knots" | "kn" | "kt" => Ok(Self::Knots),
            other => Err(format!("unknown wind speed unit: {}", other)),
        }
    }
}

/// Multiplicative factor converting `from` into `to`.
///
/// Derived from each unit's size in m/s, so `factor(a, b) * factor(b, a)`
/// is 1 up to rounding.
pub fn wind_speed_factor(from: WindSpeedUnit, to: WindSpeedUnit) -> f64 {
    if from == to {
        return 1.0;
    }
    from.in_meters_per_second() / to.in_meters_per_second()
}

pub fn convert_wind_speed(value: f64, from: WindSpeedUnit, to: WindSpeedUnit) -> f64 {
    value * wind_speed_factor(from, to)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PressureUnit {
    #[default]
    Hpa,
    Mb,
    Inhg,
}

impl PressureUnit {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Hpa => "hPa",
            Self::Mb => "mb",
            Self::Inhg => "inHg",
        }
    }
}

/// Convert a pressure reading given in hPa.
pub fn convert_pressure(hpa: f64, to: PressureUnit) -> f64 {
    match to {
        PressureUnit::Hpa | PressureUnit::Mb => hpa,
        PressureUnit::Inhg => hpa * 29.92 / 1013.25,
    }
}

/// Wind-chill approximation in °C.
///
/// Below 10 °C the wind lowers the perceived temperature by
/// `0.2 * wind_speed`; at or above 10 °C the temperature is returned as is.
pub fn wind_chill(temperature_c: f64, wind_speed: f64) -> f64 {
    if temperature_c < 10.0 {
        temperature_c - 0.2 * wind_speed
    } else {
        temperature_c
    }
}

/// UV index exposure bucket. Boundaries are lower-inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UvLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
    Extreme,
}

impl UvLevel {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::VeryHigh => "Very High",
            Self::Extreme => "Extreme",
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            Self::Low => "No protection required",
            Self::Moderate => "Wear sunscreen",
            Self::High => "Seek shade during midday",
            Self::VeryHigh => "Avoid sun exposure",
            Self::Extreme => "Stay indoors",
        }
    }
}

impl fmt::Display for UvLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Low [0,3), Moderate [3,6), High [6,8), Very High [8,11), Extreme [11,∞).
pub fn classify_uv(uv_index: f64) -> UvLevel {
    if uv_index.is_nan() || uv_index < 3.0 {
        UvLevel::Low
    } else if uv_index < 6.0 {
        UvLevel::Moderate
    } else if uv_index < 8.0 {
        UvLevel::High
    } else if uv_index < 11.0 {
        UvLevel::VeryHigh
    } else {
        UvLevel::Extreme
    }
}

const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// 16-point compass label for a bearing in degrees.
///
/// Ties between two points round half away from zero, so 11.25° is "NNE".
/// Negative and >360° bearings wrap around.
pub fn compass_direction(degrees: f64) -> &'static str {
    let index = (degrees / 22.5).round() as i64;
    COMPASS_POINTS[index.rem_euclid(16) as usize]
}

/// Visibility given in kilometres.
pub fn visibility_description(km: f64) -> &'static str {
    if km >= 10.0 {
        "Excellent"
    } else if km >= 5.0 {
        "Good"
    } else if km >= 1.0 {
        "Moderate"
    } else if km > 0.0 {
        "Poor"
    } else {
        "Very Poor"
    }
}

pub fn pressure_description(hpa: f64) -> &'static str {
    if hpa > 1020.0 {
        "High - Stable Weather"
    } else if hpa > 1010.0 {
        "Normal"
    } else if hpa > 990.0 {
        "Low - Unstable Weather"
    } else {
        "Very Low - Storm Risk"
    }
}

pub fn humidity_description(percent: f64) -> &'static str {
    if percent < 30.0 {
        "Dry"
    } else if percent < 50.0 {
        "Comfortable"
    } else if percent < 70.0 {
        "Humid"
    } else {
        "Very Humid"
    }
}

/// Hours between sunrise and sunset.
pub fn daylight_hours<Tz: TimeZone>(sunrise: &DateTime<Tz>, sunset: &DateTime<Tz>) -> f64 {
    (sunset.clone() - sunrise.clone()).num_seconds() as f64 / 3600.0
}

/// "City, CC", or just the city when the country is unknown.
pub fn format_location(city: &str, country: Option<&str>) -> String {
    match country {
        Some(cc) if !cc.is_empty() => format!("{}, {}", city, cc),
        _ => city.to_string(),
    }
}

/// "Today", "Tomorrow", "Yesterday", or the weekday name.
pub fn relative_day_label(date: NaiveDate, today: NaiveDate) -> &'static str {
    match (date - today).num_days() {
        0 => "Today",
        1 => "Tomorrow",
        -1 => "Yesterday",
        _ => weekday_name(date.weekday()),
    }
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
