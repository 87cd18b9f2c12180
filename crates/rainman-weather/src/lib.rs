//! Current-weather client for Rainman
//!
//! Fetches current conditions from OpenWeatherMap or DarkSky and caches
//! responses per rounded coordinate cell for a configurable TTL.

pub mod cache;
pub mod client;
pub mod clock;
pub mod error;
pub mod provider;
pub mod transport;
pub mod types;
pub mod wind;

pub use cache::{CacheEntry, CacheKey, WeatherCache};
pub use client::{WeatherClient, WeatherClientBuilder};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{TransportError, WeatherError};
pub use transport::{ReqwestTransport, Transport, TransportResponse};
pub use types::Coordinates;
pub use wind::WindDirection;

pub use rainman_core::{ConfigError, Provider, Units, WeatherConfig, WeatherOptions};
