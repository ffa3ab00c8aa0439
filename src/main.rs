mod dashboard;

use anyhow::Context;
use clap::Parser;
use weatherhub_core::{AppError, Config};
use weatherhub_weather::{ForecastMode, UnitSystem, WeatherClient, WindSpeedUnit};

#[derive(Parser)]
#[command(name = "weatherhub")]
#[command(about = "Current weather and short-term forecast for a city", long_about = None)]
struct Cli {
    /// City to look up (defaults to display.city from the config file)
    #[arg(short, long, env = "WEATHERHUB_CITY")]
    city: Option<String>,

    /// Unit system: metric or imperial
    #[arg(short, long)]
    units: Option<UnitSystem>,

    /// Wind speed unit: kmh, mph, ms or knots
    #[arg(short, long)]
    wind_unit: Option<WindSpeedUnit>,

    /// Number of forecast days (1-5)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=5))]
    days: Option<u32>,

    /// Show one forecast entry per day instead of every 3 hours
    #[arg(long)]
    daily: bool,
}

impl Cli {
    fn apply_to(self, config: &mut Config) {
        if let Some(city) = self.city {
            config.display.city = city;
        }
        if let Some(units) = self.units {
            config.display.units = units;
        }
        if let Some(wind_unit) = self.wind_unit {
            config.display.wind_unit = wind_unit;
        }
        if let Some(days) = self.days {
            config.display.forecast_days = days;
        }
        if self.daily {
            config.display.forecast_mode = ForecastMode::DailySummary;
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = weatherhub_core::init() {
        eprintln!("{}", e);
    }

    if let Err(e) = run(cli).await {
        tracing::error!("{}", e);
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let (config, _) = Config::load_validated(|c| cli.apply_to(c))?;

    let client = WeatherClient::new(config.client_options())?;
    let settings = &config.display;

    tracing::info!(city = %settings.city, days = settings.forecast_days, "Refreshing weather");
    let report = client
        .fetch_report(&settings.city, settings.forecast_days)
        .await;

    let text = dashboard::render_report(
        &report,
        settings.units,
        settings.wind_unit,
        chrono::Utc::now(),
    )
    .context("Failed to render dashboard")?;
    print!("{}", text);

    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("weatherhub").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = Config::default();
        parse(&[
            "--city",
            "Tokyo",
            "--units",
            "imperial",
            "--wind-unit",
            "knots",
            "--days",
            "3",
            "--daily",
        ])
        .apply_to(&mut config);

        assert_eq!(config.display.city, "Tokyo");
        assert_eq!(config.display.units, UnitSystem::Imperial);
        assert_eq!(config.display.wind_unit, WindSpeedUnit::Knots);
        assert_eq!(config.display.forecast_days, 3);
        assert_eq!(config.display.forecast_mode, ForecastMode::DailySummary);
    }

    #[test]
    fn test_no_flags_keep_config() {
        let mut config = Config::default();
        config.display.city = "Paris".to_string();
        Cli {
            city: None,
            units: None,
            wind_unit: None,
            days: None,
            daily: false,
        }
        .apply_to(&mut config);

        assert_eq!(config.display.city, "Paris");
        assert_eq!(config.display.forecast_days, 5);
        assert_eq!(config.display.forecast_mode, ForecastMode::Intervals);
    }

    #[test]
    fn test_days_out_of_range_rejected() {
        let result = Cli::try_parse_from(["weatherhub", "--days", "0"]);
        assert!(result.is_err());
        let result = Cli::try_parse_from(["weatherhub", "--days", "6"]);
        assert!(result.is_err());
    }
}
