//! OpenWeatherMap client.
//!
//! Each client owns its cache; entries are keyed by endpoint, city and
//! unit system and live for `ClientOptions::cache_ttl`.

use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

use crate::cache::{Clock, ExpiringCache, SystemClock};
use crate::error::FetchError;
use crate::normalize;
use crate::types::{Coordinates, CurrentConditions, ForecastMode, ForecastPoint};
use crate::units::UnitSystem;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);
/// The free forecast endpoint covers five days.
pub const MAX_FORECAST_DAYS: u32 = 5;
/// One sample every 3 hours.
const SAMPLES_PER_DAY: u32 = 8;
const USER_AGENT: &str = concat!("WeatherHub/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct ClientOptions {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
    pub cache_ttl: Duration,
    pub units: UnitSystem,
    pub forecast_mode: ForecastMode,
    /// Look up the UV index after a current-conditions fetch
    pub fetch_uv_index: bool,
}

impl ClientOptions {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            cache_ttl: DEFAULT_CACHE_TTL,
            units: UnitSystem::default(),
            forecast_mode: ForecastMode::default(),
            fetch_uv_index: true,
        }
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("cache_ttl", &self.cache_ttl)
            .field("units", &self.units)
            .field("forecast_mode", &self.forecast_mode)
            .field("fetch_uv_index", &self.fetch_uv_index)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Endpoint {
    Current,
    Forecast { samples: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    endpoint: Endpoint,
    city: String,
    units: UnitSystem,
}

#[derive(Debug, Clone)]
enum CachedPayload {
    Current(CurrentConditions),
    Forecast(Vec<ForecastPoint>),
}

/// Current conditions and forecast for one refresh. Either half can fail
/// without affecting the other.
#[derive(Debug)]
pub struct WeatherReport {
    pub current: Result<CurrentConditions, FetchError>,
    pub forecast: Result<Vec<ForecastPoint>, FetchError>,
}

#[derive(Debug)]
pub struct WeatherClient {
    http: Client,
    options: ClientOptions,
    cache: ExpiringCache<CacheKey, CachedPayload>,
}

impl WeatherClient {
    pub fn new(options: ClientOptions) -> Result<Self, FetchError> {
        Self::with_clock(options, Arc::new(SystemClock))
    }

    /// Client whose cache reads time from `clock`.
    pub fn with_clock(options: ClientOptions, clock: Arc<dyn Clock>) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(options.timeout)
            .user_agent(USER_AGENT)
            .build()?;
        let cache = ExpiringCache::with_clock(options.cache_ttl, clock);

        Ok(Self {
            http,
            options,
            cache,
        })
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Drop every cached response so the next fetches hit the network.
    pub fn clear_cache(&self) {
        self.cache.clear();
        tracing::debug!("Weather cache cleared");
    }

    /// Current conditions for `city`, served from cache while fresh.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_current(&self, city: &str) -> Result<CurrentConditions, FetchError> {
        let city = clean_city(city)?;
        let key = self.cache_key(Endpoint::Current, city);

        if let Some(CachedPayload::Current(current)) = self.cache.get(&key) {
            tracing::debug!("Current conditions served from cache");
            return Ok(current);
        }

        let raw = self.request("weather", city, &[]).await?;
        let mut current = normalize::normalize_current(&raw, self.options.units)?;

        if self.options.fetch_uv_index {
            if let Some(coords) = current.coordinates {
                current.uv_index = self.fetch_uv_index(coords).await;
            }
        }

        tracing::info!(city = %current.city, "Fetched current conditions");
        self.cache.set(key, CachedPayload::Current(current.clone()));
        Ok(current)
    }

    /// Forecast for `city` covering `days`, capped at 5. Zero days is an
    /// empty forecast and makes no request.
    ///
    /// Returns every 3-hour sample in `Intervals` mode, or at most `days`
    /// per-day points in `DailySummary` mode.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_forecast(
        &self,
        city: &str,
        days: u32,
    ) -> Result<Vec<ForecastPoint>, FetchError> {
        let city = clean_city(city)?;
        if days == 0 {
            return Ok(Vec::new());
        }
        let days = days.min(MAX_FORECAST_DAYS);
        let samples = days * SAMPLES_PER_DAY;
        let key = self.cache_key(Endpoint::Forecast { samples }, city);

        let points = match self.cache.get(&key) {
            Some(CachedPayload::Forecast(points)) => {
                tracing::debug!("Forecast served from cache");
                points
            }
            _ => {
                let cnt = samples.to_string();
                let raw = self.request("forecast", city, &[("cnt", &cnt)]).await?;
                let points = normalize::normalize_forecast_list(&raw, self.options.units)?;
                tracing::info!(samples = points.len(), "Fetched forecast");
                self.cache.set(key, CachedPayload::Forecast(points.clone()));
                points
            }
        };

        Ok(match self.options.forecast_mode {
            ForecastMode::Intervals => points,
            ForecastMode::DailySummary => normalize::summarize_daily(&points, days as usize),
        })
    }

    /// Fetch current conditions and forecast concurrently.
    pub async fn fetch_report(&self, city: &str, days: u32) -> WeatherReport {
        let (current, forecast) = tokio::join!(
            self.fetch_current(city),
            self.fetch_forecast(city, days)
        );
        WeatherReport { current, forecast }
    }

    /// UV index at `coords`; any failure yields `None`, never zero.
    async fn fetch_uv_index(&self, coords: Coordinates) -> Option<f64> {
        let lat = coords.latitude.to_string();
        let lon = coords.longitude.to_string();

        let response = match self.get("uvi", &[("lat", &lat), ("lon", &lon)]).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("UV index request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::warn!("UV index lookup returned status {}", response.status());
            return None;
        }

        match response.json::<Value>().await {
            Ok(body) => {
                let uv = normalize::parse_uv_index(&body);
                if uv.is_none() {
                    tracing::warn!("UV index missing from response");
                }
                uv
            }
            Err(e) => {
                tracing::warn!("UV index parse error: {}", e.without_url());
                None
            }
        }
    }

    fn cache_key(&self, endpoint: Endpoint, city: &str) -> CacheKey {
        CacheKey {
            endpoint,
            city: city.to_lowercase(),
            units: self.options.units,
        }
    }

    /// City-scoped request against `{base}/{endpoint}`.
    async fn request(
        &self,
        endpoint: &str,
        city: &str,
        extra: &[(&str, &str)],
    ) -> Result<Value, FetchError> {
        let mut params = vec![("q", city), ("units", self.options.units.as_query())];
        params.extend_from_slice(extra);

        let result = match self.get(endpoint, &params).await {
            Ok(response) => Self::handle_response(response, city).await,
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            tracing::warn!(endpoint, "Weather request failed: {}", e);
        }
        result
    }

    async fn get(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<reqwest::Response, FetchError> {
        let url = format!(
            "{}/{}",
            self.options.base_url.trim_end_matches('/'),
            endpoint
        );

        let response = self
            .http
            .get(&url)
            .query(params)
            .query(&[("appid", self.options.api_key.as_str())])
            .send()
            .await?;
        Ok(response)
    }

    /// Map provider status codes and bodies onto `FetchError`.
    async fn handle_response(response: reqwest::Response, city: &str) -> Result<Value, FetchError> {
        let status = response.status();
        let text = response.text().await?;
        let body: Option<Value> = serde_json::from_str(&text).ok();

        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::CityNotFound(city.to_string()));
        }

        if !status.is_success() {
            let message = body
                .as_ref()
                .and_then(normalize::provider_message)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
            return Err(FetchError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let body = body.ok_or_else(|| {
            FetchError::MalformedResponse("response body is not valid JSON".to_string())
        })?;

        match normalize::provider_status(&body) {
            None | Some(200) => Ok(body),
            Some(code) => {
                tracing::debug!(code, "Provider reported a non-success status");
                Err(FetchError::CityNotFound(city.to_string()))
            }
        }
    }
}

fn clean_city(city: &str) -> Result<&str, FetchError> {
    let city = city.trim();
    if city.is_empty() {
        return Err(FetchError::CityNotFound(String::new()));
    }
    Ok(city)
}
