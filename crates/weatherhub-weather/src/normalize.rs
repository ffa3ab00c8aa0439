//! Mapping from raw OpenWeatherMap JSON to domain records.
//!
//! Every provider field is read as optional and then either required
//! explicitly (missing -> `MalformedResponse`) or carried as `None`.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::FetchError;
use crate::types::{Coordinates, CurrentConditions, ForecastPoint};
use crate::units::{convert_temperature, TemperatureUnit, UnitSystem};

/// Plausible air temperature range in °C.
const MIN_TEMPERATURE_C: f64 = -90.0;
const MAX_TEMPERATURE_C: f64 = 60.0;

#[derive(Debug, Deserialize)]
struct RawCurrent {
    name: Option<String>,
    coord: Option<RawCoord>,
    main: Option<RawMain>,
    wind: Option<RawWind>,
    #[serde(default)]
    weather: Vec<RawWeather>,
    clouds: Option<RawClouds>,
    sys: Option<RawSys>,
    visibility: Option<f64>,
    dt: Option<i64>,
    /// Shift from UTC in seconds
    timezone: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct RawForecast {
    #[serde(default)]
    list: Vec<RawForecastItem>,
    city: Option<RawCity>,
}

#[derive(Debug, Deserialize)]
struct RawForecastItem {
    dt: Option<i64>,
    main: Option<RawMain>,
    wind: Option<RawWind>,
    #[serde(default)]
    weather: Vec<RawWeather>,
    rain: Option<HashMap<String, f64>>,
}

#[derive(Debug, Deserialize)]
struct RawCity {
    timezone: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct RawCoord {
    lat: Option<f64>,
    lon: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawMain {
    temp: Option<f64>,
    feels_like: Option<f64>,
    temp_min: Option<f64>,
    temp_max: Option<f64>,
    pressure: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawWind {
    speed: Option<f64>,
    deg: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawWeather {
    main: Option<String>,
    description: Option<String>,
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawClouds {
    all: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawSys {
    country: Option<String>,
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

/// Provider status from the body's `cod` field.
///
/// The current-weather endpoint sends a number, the forecast endpoint a
/// string; both are accepted.
pub fn provider_status(raw: &Value) -> Option<u16> {
    match raw.get("cod")? {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Provider error text from the body's `message` field.
pub fn provider_message(raw: &Value) -> Option<String> {
    raw.get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

/// UV index from the `/uvi` endpoint body.
pub fn parse_uv_index(raw: &Value) -> Option<f64> {
    raw.get("value")
        .and_then(Value::as_f64)
        .filter(|uv| uv.is_finite() && *uv >= 0.0)
}

pub fn normalize_current(raw: &Value, units: UnitSystem) -> Result<CurrentConditions, FetchError> {
    let body = RawCurrent::deserialize(raw).map_err(malformed)?;
    let offset = city_offset(body.timezone);

    let main = required(body.main, "main")?;
    let wind = required(body.wind, "wind")?;
    let clouds = required(body.clouds, "clouds")?;
    let weather = required(body.weather.into_iter().next(), "weather[0]")?;
    let sys = body.sys;

    let temperature = check_temperature(required(main.temp, "main.temp")?, units, "main.temp")?;
    let feels_like = check_temperature(
        required(main.feels_like, "main.feels_like")?,
        units,
        "main.feels_like",
    )?;

    let coordinates = body.coord.and_then(|c| match (c.lat, c.lon) {
        (Some(latitude), Some(longitude)) => Some(Coordinates {
            latitude,
            longitude,
        }),
        _ => None,
    });

    let (country, sunrise, sunset) = match sys {
        Some(sys) => (
            sys.country,
            sys.sunrise.map(|t| local_time(t, &offset)).transpose()?,
            sys.sunset.map(|t| local_time(t, &offset)).transpose()?,
        ),
        None => (None, None, None),
    };

    Ok(CurrentConditions {
        city: required(body.name, "name")?,
        country,
        coordinates,
        units,
        temperature,
        feels_like,
        humidity: check_percentage(required(main.humidity, "main.humidity")?, "main.humidity")?,
        pressure_hpa: required(main.pressure, "main.pressure")?,
        wind_speed: check_wind_speed(required(wind.speed, "wind.speed")?)?,
        wind_direction: wind.deg,
        cloud_cover: check_percentage(required(clouds.all, "clouds.all")?, "clouds.all")?,
        visibility_m: body.visibility.filter(|v| *v >= 0.0),
        condition: condition_label(&weather)?,
        description: weather.description,
        provider_icon: weather.icon,
        uv_index: None,
        sunrise,
        sunset,
        observed_at: body.dt.map(|t| local_time(t, &offset)).transpose()?,
    })
}

/// Forecast samples in ascending timestamp order.
pub fn normalize_forecast_list(
    raw: &Value,
    units: UnitSystem,
) -> Result<Vec<ForecastPoint>, FetchError> {
    let body = RawForecast::deserialize(raw).map_err(malformed)?;
    let offset = city_offset(body.city.and_then(|c| c.timezone));

    let mut points = body
        .list
        .into_iter()
        .enumerate()
        .map(|(i, item)| forecast_point(item, units, &offset, i))
        .collect::<Result<Vec<_>, _>>()?;

    points.sort_by_key(|p| p.timestamp);
    Ok(points)
}

/// Collapse samples into at most `days` calendar-day buckets.
///
/// Each day is represented by its first sample, with `temp_min`/`temp_max`
/// widened to the day's extremes and precipitation summed over the day.
/// Days follow the city-local date of each timestamp. Input must be sorted.
pub fn summarize_daily(points: &[ForecastPoint], days: usize) -> Vec<ForecastPoint> {
    let mut summary: Vec<ForecastPoint> = Vec::with_capacity(days);
    let mut current_day: Option<NaiveDate> = None;

    for point in points {
        let day = point.timestamp.date_naive();
        if current_day != Some(day) {
            if summary.len() == days {
                break;
            }
            current_day = Some(day);
            summary.push(point.clone());
            continue;
        }

        if let Some(rep) = summary.last_mut() {
            rep.temp_min = rep.temp_min.min(point.temp_min);
            rep.temp_max = rep.temp_max.max(point.temp_max);
            rep.precipitation_mm = match (rep.precipitation_mm, point.precipitation_mm) {
                (Some(a), Some(b)) => Some(a + b),
                (a, b) => a.or(b),
            };
        }
    }

    summary
}

fn forecast_point(
    item: RawForecastItem,
    units: UnitSystem,
    offset: &FixedOffset,
    index: usize,
) -> Result<ForecastPoint, FetchError> {
    let field = |name: &str| format!("list[{}].{}", index, name);

    let main = required(item.main, &field("main"))?;
    let wind = required(item.wind, &field("wind"))?;
    let weather = required(item.weather.into_iter().next(), &field("weather[0]"))?;

    let temp = check_temperature(
        required(main.temp, &field("main.temp"))?,
        units,
        &field("main.temp"),
    )?;
    let feels_like = check_temperature(
        required(main.feels_like, &field("main.feels_like"))?,
        units,
        &field("main.feels_like"),
    )?;

    Ok(ForecastPoint {
        timestamp: local_time(required(item.dt, &field("dt"))?, offset)?,
        temperature: temp,
        feels_like,
        temp_min: main.temp_min.unwrap_or(temp),
        temp_max: main.temp_max.unwrap_or(temp),
        humidity: check_percentage(
            required(main.humidity, &field("main.humidity"))?,
            &field("main.humidity"),
        )?,
        wind_speed: check_wind_speed(required(wind.speed, &field("wind.speed"))?)?,
        pressure_hpa: required(main.pressure, &field("main.pressure"))?,
        condition: condition_label(&weather)?,
        description: weather.description,
        precipitation_mm: item.rain.and_then(|r| r.get("3h").copied()),
    })
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, FetchError> {
    value.ok_or_else(|| FetchError::MalformedResponse(format!("missing field `{}`", field)))
}

fn malformed(e: serde_json::Error) -> FetchError {
    FetchError::MalformedResponse(e.to_string())
}

fn check_temperature(value: f64, units: UnitSystem, field: &str) -> Result<f64, FetchError> {
    let celsius = convert_temperature(value, units.temperature_unit(), TemperatureUnit::Celsius);
    if (MIN_TEMPERATURE_C..=MAX_TEMPERATURE_C).contains(&celsius) {
        Ok(value)
    } else {
        Err(FetchError::MalformedResponse(format!(
            "`{}` out of range: {}",
            field, value
        )))
    }
}

fn check_percentage(value: f64, field: &str) -> Result<u8, FetchError> {
    if (0.0..=100.0).contains(&value) {
        Ok(value.round() as u8)
    } else {
        Err(FetchError::MalformedResponse(format!(
            "`{}` out of range: {}",
            field, value
        )))
    }
}

fn check_wind_speed(value: f64) -> Result<f64, FetchError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(FetchError::MalformedResponse(format!(
            "`wind.speed` out of range: {}",
            value
        )))
    }
}

fn condition_label(weather: &RawWeather) -> Result<String, FetchError> {
    weather
        .main
        .clone()
        .or_else(|| weather.description.clone())
        .ok_or_else(|| FetchError::MalformedResponse("missing field `weather[0].main`".into()))
}

/// City offset from the provider's `timezone` shift, UTC when absent.
fn city_offset(shift_secs: Option<i32>) -> FixedOffset {
    shift_secs
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix())
}

fn local_time(epoch_secs: i64, offset: &FixedOffset) -> Result<DateTime<FixedOffset>, FetchError> {
    DateTime::from_timestamp(epoch_secs, 0)
        .map(|utc| utc.with_timezone(offset))
        .ok_or_else(|| {
            FetchError::MalformedResponse(format!("timestamp out of range: {}", epoch_secs))
        })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    fn london_current() -> Value {
        json!({
            "coord": {"lon": -0.1257, "lat": 51.5085},
            "weather": [{"id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d"}],
            "main": {"temp": 14.2, "feels_like": 13.5, "temp_min": 12.9, "temp_max": 15.3,
                     "pressure": 1012, "humidity": 72},
            "visibility": 10000,
            "wind": {"speed": 4.6, "deg": 250},
            "clouds": {"all": 75},
            "dt": 1_709_290_800,
            "sys": {"country": "GB", "sunrise": 1_709_275_560, "sunset": 1_709_315_040},
            "timezone": 0,
            "name": "London",
            "cod": 200
        })
    }

    fn forecast_item(dt: i64, temp: f64) -> Value {
        json!({
            "dt": dt,
            "main": {"temp": temp, "feels_like": temp - 1.0, "temp_min": temp - 0.5,
                     "temp_max": temp + 0.5, "pressure": 1015, "humidity": 60},
            "weather": [{"main": "Rain", "description": "light rain", "icon": "10d"}],
            "clouds": {"all": 90},
            "wind": {"speed": 3.2, "deg": 180},
            "rain": {"3h": 0.5}
        })
    }

    #[test]
    fn test_normalize_current() {
        let current = normalize_current(&london_current(), UnitSystem::Metric).unwrap();

        assert_eq!(current.city, "London");
        assert_eq!(current.country.as_deref(), Some("GB"));
        assert_eq!(current.temperature, 14.2);
        assert_eq!(current.feels_like, 13.5);
        assert_eq!(current.humidity, 72);
        assert_eq!(current.pressure_hpa, 1012.0);
        assert_eq!(current.cloud_cover, 75);
        assert_eq!(current.visibility_m, Some(10000.0));
        assert_eq!(current.wind_direction, Some(250.0));
        assert_eq!(current.condition, "Clouds");
        assert_eq!(current.description.as_deref(), Some("broken clouds"));
        assert_eq!(current.icon(), "☁️");
        assert_eq!(current.compass_direction(), Some("WSW"));
        assert_eq!(current.location_label(), "London, GB");
        assert!(current.uv_index.is_none());
        assert!(current.sunrise.is_some());
        assert!(current.daylight_hours().unwrap() > 10.0);
    }

    #[test]
    fn test_missing_optional_fields_are_unavailable() {
        let mut raw = london_current();
        let obj = raw.as_object_mut().unwrap();
        obj.remove("visibility");
        obj.remove("sys");
        obj.remove("coord");
        obj["wind"] = json!({"speed": 0.0});

        let current = normalize_current(&raw, UnitSystem::Metric).unwrap();
        assert_eq!(current.visibility_m, None);
        assert_eq!(current.country, None);
        assert_eq!(current.sunrise, None);
        assert_eq!(current.coordinates, None);
        assert_eq!(current.wind_direction, None);
        assert_eq!(current.compass_direction(), None);
        assert_eq!(current.uv_level(), None);
    }

    #[test]
    fn test_missing_required_field() {
        let mut raw = london_current();
        raw["main"].as_object_mut().unwrap().remove("temp");

        let err = normalize_current(&raw, UnitSystem::Metric).unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(ref m) if m.contains("main.temp")));
    }

    #[test]
    fn test_empty_weather_array_is_malformed() {
        let mut raw = london_current();
        raw["weather"] = json!([]);
        assert!(matches!(
            normalize_current(&raw, UnitSystem::Metric),
            Err(FetchError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_implausible_readings_rejected() {
        let mut raw = london_current();
        raw["main"]["humidity"] = json!(140);
        assert!(normalize_current(&raw, UnitSystem::Metric).is_err());

        let mut raw = london_current();
        raw["main"]["temp"] = json!(75.0);
        assert!(normalize_current(&raw, UnitSystem::Metric).is_err());

        let mut raw = london_current();
        raw["wind"]["speed"] = json!(-1.0);
        assert!(normalize_current(&raw, UnitSystem::Metric).is_err());
    }

    #[test]
    fn test_imperial_range_check_uses_fahrenheit() {
        let mut raw = london_current();
        raw["main"]["temp"] = json!(95.0);
        raw["main"]["feels_like"] = json!(101.0);

        let current = normalize_current(&raw, UnitSystem::Imperial).unwrap();
        assert_eq!(current.temperature, 95.0);
        assert_eq!(current.units, UnitSystem::Imperial);
    }

    #[test]
    fn test_timestamps_use_city_offset() {
        let mut raw = london_current();
        raw["timezone"] = json!(19_800); // UTC+05:30

        let current = normalize_current(&raw, UnitSystem::Metric).unwrap();
        let observed = current.observed_at.unwrap();
        assert_eq!(observed.offset().local_minus_utc(), 19_800);
        assert_eq!(observed.timestamp(), 1_709_290_800);
    }

    #[test]
    fn test_provider_status_number_and_string() {
        assert_eq!(provider_status(&json!({"cod": 200})), Some(200));
        assert_eq!(provider_status(&json!({"cod": "404"})), Some(404));
        assert_eq!(provider_status(&json!({"name": "x"})), None);
        assert_eq!(
            provider_message(&json!({"cod": "404", "message": "city not found"})).as_deref(),
            Some("city not found")
        );
    }

    #[test]
    fn test_parse_uv_index() {
        assert_eq!(parse_uv_index(&json!({"value": 0.0})), Some(0.0));
        assert_eq!(parse_uv_index(&json!({"value": 7.4})), Some(7.4));
        assert_eq!(parse_uv_index(&json!({})), None);
    }

    #[test]
    fn test_forecast_list_sorted() {
        let raw = json!({
            "cod": "200",
            "list": [forecast_item(1_709_301_600, 10.0), forecast_item(1_709_290_800, 8.0)],
            "city": {"name": "London", "timezone": 0}
        });

        let points = normalize_forecast_list(&raw, UnitSystem::Metric).unwrap();
        assert_eq!(points.len(), 2);
        assert!(points[0].timestamp < points[1].timestamp);
        assert_eq!(points[0].temperature, 8.0);
        assert_eq!(points[0].precipitation_mm, Some(0.5));
        assert_eq!(points[0].icon(), "🌧️");
    }

    #[test]
    fn test_forecast_item_missing_field_names_index() {
        let mut bad = forecast_item(1_709_301_600, 10.0);
        bad.as_object_mut().unwrap().remove("dt");
        let raw = json!({"list": [forecast_item(1_709_290_800, 8.0), bad]});

        let err = normalize_forecast_list(&raw, UnitSystem::Metric).unwrap_err();
        assert!(err.to_string().contains("list[1].dt"));
    }

    fn forty_samples(start: i64) -> Vec<ForecastPoint> {
        let list: Vec<Value> = (0..40)
            .map(|i| forecast_item(start + i * 3 * 3600, 5.0 + (i % 8) as f64))
            .collect();
        normalize_forecast_list(&json!({"list": list, "city": {"timezone": 0}}), UnitSystem::Metric)
            .unwrap()
    }

    #[test]
    fn test_daily_summary_five_days() {
        // 2024-03-01T00:00:00Z
        let points = forty_samples(1_709_251_200);
        let daily = summarize_daily(&points, 5);

        assert_eq!(daily.len(), 5);
        for pair in daily.windows(2) {
            assert_eq!(
                pair[1].timestamp.date_naive(),
                pair[0].timestamp.date_naive().succ_opt().unwrap()
            );
        }
        assert_eq!(daily[0].timestamp.day(), 1);
        assert_eq!(daily[0].timestamp.hour(), 0);
        assert_eq!(daily[0].temp_min, 4.5);
        assert_eq!(daily[0].temp_max, 12.5);
        assert!((daily[0].precipitation_mm.unwrap() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_daily_summary_truncates_partial_days() {
        // 2024-03-01T12:00:00Z, spans six calendar days
        let points = forty_samples(1_709_294_400);
        let daily = summarize_daily(&points, 5);

        assert_eq!(daily.len(), 5);
        assert_eq!(daily[0].timestamp.day(), 1);
        assert_eq!(daily[4].timestamp.day(), 5);
    }

    #[test]
    fn test_daily_summary_fewer_days_than_requested() {
        let points = forty_samples(1_709_251_200);
        assert_eq!(summarize_daily(&points[..8], 5).len(), 1);
        assert!(summarize_daily(&[], 5).is_empty());
        assert_eq!(summarize_daily(&points, 2).len(), 2);
    }
}
