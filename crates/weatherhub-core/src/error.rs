//! Application-level error types for WeatherHub.
//!
//! Library errors convert into `AppError`; `user_message()` gives text
//! suitable for printing to the terminal.

use thiserror::Error;
use weatherhub_weather::FetchError;

/// Top-level application error type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Weather service error: {0}")]
    Weather(#[from] FetchError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a user-friendly message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Weather(e) => e.user_message(),
            AppError::Config(e) => e.user_message().to_string(),
            AppError::Io(_) => "A file operation failed. Please try again.".to_string(),
            AppError::Other(_) => "An unexpected error occurred. Please try again.".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Missing required setting: {0}")]
    MissingSetting(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::MissingSetting(_) => {
                "An OpenWeatherMap API key is required. Set OPENWEATHER_API_KEY or provider.api_key."
            }
        }
    }
}
