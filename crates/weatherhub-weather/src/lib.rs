//! Weather data access for WeatherHub
//!
//! Fetches current conditions and forecasts from OpenWeatherMap, caches
//! responses per client, and normalizes them into typed records.

pub mod cache;
pub mod client;
pub mod error;
pub mod icons;
pub mod normalize;
pub mod types;
pub mod units;

pub use cache::{Clock, ExpiringCache, SystemClock};
pub use client::{ClientOptions, WeatherClient, WeatherReport};
pub use error::FetchError;
pub use types::*;
pub use units::{PressureUnit, TemperatureUnit, UnitSystem, UvLevel, WindSpeedUnit};
