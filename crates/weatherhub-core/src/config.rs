use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;
use weatherhub_weather::client::{DEFAULT_BASE_URL, MAX_FORECAST_DAYS};
use weatherhub_weather::{ClientOptions, ForecastMode, UnitSystem, WindSpeedUnit};

use crate::error::{AppError, ConfigError};

/// Environment variable that overrides `provider.api_key`
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

const API_KEY_PLACEHOLDER: &str = "YOUR_API_KEY_HERE";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// All errors joined into one line
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// OpenWeatherMap API key; `OPENWEATHER_API_KEY` takes precedence
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Look up the UV index alongside current conditions
    #[serde(default = "default_true")]
    pub fetch_uv_index: bool,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_true() -> bool {
    true
}

impl ProviderConfig {
    /// Check if an API key is set (not empty or the placeholder)
    pub fn has_api_key(&self) -> bool {
        let key = self.api_key.trim();
        !key.is_empty() && key != API_KEY_PLACEHOLDER
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: API_KEY_PLACEHOLDER.to_string(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            fetch_uv_index: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Seconds a fetched response stays fresh (default: 600)
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_ttl_secs() -> u64 {
    600
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_city")]
    pub city: String,

    #[serde(default)]
    pub units: UnitSystem,

    #[serde(default)]
    pub wind_unit: WindSpeedUnit,

    #[serde(default = "default_forecast_days")]
    pub forecast_days: u32,

    #[serde(default)]
    pub forecast_mode: ForecastMode,
}

fn default_city() -> String {
    "London".to_string()
}

fn default_forecast_days() -> u32 {
    MAX_FORECAST_DAYS
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            city: default_city(),
            units: UnitSystem::default(),
            wind_unit: WindSpeedUnit::default(),
            forecast_days: default_forecast_days(),
            forecast_mode: ForecastMode::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_api_key_override(std::env::var(API_KEY_ENV).ok());
        Ok(config)
    }

    /// Load configuration from `path`, writing defaults there if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!("Created default config at {}", path.display());
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration, apply `overrides`, then validate it
    ///
    /// Warnings are logged; any error fails the load.
    pub fn load_validated(
        overrides: impl FnOnce(&mut Self),
    ) -> Result<(Self, ValidationResult), AppError> {
        Self::validated(Self::load()?, overrides)
    }

    /// Same as `load_validated`, reading from `path`
    pub fn load_validated_from(
        path: &Path,
        overrides: impl FnOnce(&mut Self),
    ) -> Result<(Self, ValidationResult), AppError> {
        Self::validated(Self::load_from(path)?, overrides)
    }

    fn validated(
        mut config: Self,
        overrides: impl FnOnce(&mut Self),
    ) -> Result<(Self, ValidationResult), AppError> {
        overrides(&mut config);
        let validation = config.ensure_valid()?;
        Ok((config, validation))
    }

    /// Replace the file's API key with a non-empty override
    pub fn apply_api_key_override(&mut self, key: Option<String>) {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            tracing::debug!("Using API key from {}", API_KEY_ENV);
            self.provider.api_key = key.trim().to_string();
        }
    }

    /// Validate and convert errors into a `ConfigError`
    pub fn ensure_valid(&self) -> Result<ValidationResult, ConfigError> {
        let validation = self.validate();

        if let Some(missing) = validation
            .errors
            .iter()
            .find(|e| e.field == "provider.api_key")
        {
            return Err(ConfigError::MissingSetting(missing.to_string()));
        }

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()));
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok(validation)
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if !self.provider.has_api_key() {
            result.add_error(
                "provider.api_key",
                format!("API key not configured (set {})", API_KEY_ENV),
            );
        }

        self.validate_url(&self.provider.base_url, "provider.base_url", &mut result);

        if self.provider.timeout_secs == 0 {
            result.add_error("provider.timeout_secs", "Timeout must be greater than 0");
        } else if self.provider.timeout_secs > 60 {
            result.add_warning(
                "provider.timeout_secs",
                "Timeout is unusually long (>60 seconds)",
            );
        }

        if self.cache.ttl_secs == 0 {
            result.add_warning("cache.ttl_secs", "Caching disabled (0 seconds)");
        }

        if self.display.city.trim().is_empty() {
            result.add_warning("display.city", "No default city set");
        }

        if !(1..=MAX_FORECAST_DAYS).contains(&self.display.forecast_days) {
            result.add_error(
                "display.forecast_days",
                format!(
                    "Forecast days must be between 1 and {}, got {}",
                    MAX_FORECAST_DAYS, self.display.forecast_days
                ),
            );
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Options for `WeatherClient::new`
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            api_key: self.provider.api_key.clone(),
            base_url: self.provider.base_url.clone(),
            timeout: Duration::from_secs(self.provider.timeout_secs),
            cache_ttl: Duration::from_secs(self.cache.ttl_secs),
            units: self.display.units,
            forecast_mode: self.display.forecast_mode,
            fetch_uv_index: self.provider.fetch_uv_index,
        }
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("weatherhub");

        Ok(config_dir.join("config.toml"))
    }
}
