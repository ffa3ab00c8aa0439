//! Plain-text rendering of a weather report.

use chrono::{DateTime, Utc};
use std::fmt::{self, Write};
use weatherhub_weather::units::{
    convert_wind_speed, format_temperature, humidity_description, pressure_description,
    relative_day_label, visibility_description,
};
use weatherhub_weather::{
    CurrentConditions, FetchError, ForecastPoint, UnitSystem, WeatherReport, WindSpeedUnit,
};

/// Render both sections of `report`; a failed section shows its error message
/// in place of its data.
pub fn render_report(
    report: &WeatherReport,
    units: UnitSystem,
    wind_unit: WindSpeedUnit,
    now: DateTime<Utc>,
) -> Result<String, fmt::Error> {
    let mut out = String::new();

    match &report.current {
        Ok(current) => render_current(&mut out, current, wind_unit)?,
        Err(e) => render_error(&mut out, "Current conditions", e)?,
    }

    writeln!(out)?;

    match &report.forecast {
        Ok(points) => render_forecast(&mut out, points, units, wind_unit, now)?,
        Err(e) => render_error(&mut out, "Forecast", e)?,
    }

    Ok(out)
}

fn render_error(out: &mut String, section: &str, error: &FetchError) -> fmt::Result {
    writeln!(out, "{}", section)?;
    writeln!(out, "  {}", error.user_message())
}

pub fn render_current(
    out: &mut String,
    current: &CurrentConditions,
    wind_unit: WindSpeedUnit,
) -> fmt::Result {
    let temp_unit = current.temperature_unit();

    write!(
        out,
        "{}  {} {}",
        current.location_label(),
        current.icon(),
        current.condition
    )?;
    match &current.description {
        Some(desc) => writeln!(out, " ({})", desc)?,
        None => writeln!(out)?,
    }

    card(out, "Temperature", format_temperature(current.temperature, temp_unit))?;
    card(out, "Feels like", format_temperature(current.wind_chill(), temp_unit))?;
    card(
        out,
        "Humidity",
        format!(
            "{}% ({})",
            current.humidity,
            humidity_description(f64::from(current.humidity))
        ),
    )?;
    card(
        out,
        "Pressure",
        format!(
            "{:.0} hPa ({})",
            current.pressure_hpa,
            pressure_description(current.pressure_hpa)
        ),
    )?;

    let mut wind = format!(
        "{:.1} {}",
        current.wind_speed_in(wind_unit),
        wind_unit.label()
    );
    if let Some(dir) = current.compass_direction() {
        write!(wind, " {}", dir)?;
    }
    card(out, "Wind", wind)?;

    card(
        out,
        "Visibility",
        match current.visibility_km() {
            Some(km) => format!("{:.1} km ({})", km, visibility_description(km)),
            None => "unavailable".to_string(),
        },
    )?;
    card(out, "Cloud cover", format!("{}%", current.cloud_cover))?;
    card(
        out,
        "UV index",
        match (current.uv_index, current.uv_level()) {
            (Some(uv), Some(level)) => format!("{:.1} ({}) - {}", uv, level, level.advice()),
            _ => "unavailable".to_string(),
        },
    )?;

    if let Some(rise) = &current.sunrise {
        card(out, "Sunrise", rise.format("%H:%M").to_string())?;
    }
    if let Some(set) = &current.sunset {
        card(out, "Sunset", set.format("%H:%M").to_string())?;
    }
    if let Some(hours) = current.daylight_hours() {
        card(out, "Daylight", format!("{:.1} h", hours))?;
    }

    Ok(())
}

fn card(out: &mut String, label: &str, value: String) -> fmt::Result {
    writeln!(out, "  {:<12} {}", label, value)
}

pub fn render_forecast(
    out: &mut String,
    points: &[ForecastPoint],
    units: UnitSystem,
    wind_unit: WindSpeedUnit,
    now: DateTime<Utc>,
) -> fmt::Result {
    writeln!(out, "Forecast")?;

    if points.is_empty() {
        return writeln!(out, "  No forecast data");
    }

    let temp_unit = units.temperature_unit();
    let source_wind = units.wind_speed_unit();

    for point in points {
        let today = now.with_timezone(point.timestamp.offset()).date_naive();
        let day = relative_day_label(point.timestamp.date_naive(), today);
        let wind = convert_wind_speed(point.wind_speed, source_wind, wind_unit);

        writeln!(
            out,
            "  {:<10} {} {} {:>6} feels {:>6}  {:>3}%  {:>5.1} {:<5} {:>5.0} hPa",
            day,
            point.timestamp.format("%H:%M"),
            point.icon(),
            format_temperature(point.temperature, temp_unit),
            format_temperature(point.feels_like, temp_unit),
            point.humidity,
            wind,
            wind_unit.label(),
            point.pressure_hpa,
        )?;
    }

    Ok(())
}
