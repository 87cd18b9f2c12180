//! Current-weather client with a coordinate-keyed TTL cache.

use std::sync::Arc;

use rainman_core::{WeatherConfig, WeatherOptions};
use serde_json::Value;
use tracing::instrument;

use crate::cache::{CacheEntry, CacheKey, WeatherCache};
use crate::clock::{Clock, SystemClock};
use crate::error::{TransportError, WeatherError};
use crate::provider::{build_query, redact};
use crate::transport::{ReqwestTransport, Transport};
use crate::types::Coordinates;
use crate::wind::WindDirection;

/// Fetches current weather for a coordinate pair, caching successful
/// responses per rounded coordinate cell.
///
/// `get` takes `&self`, so one client can be shared across tasks behind an
/// `Arc`. Concurrent lookups of the same cell are not coalesced: each one
/// misses, fetches, and the last response to arrive is the one cached.
pub struct WeatherClient {
    config: WeatherConfig,
    cache: WeatherCache,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
}

impl WeatherClient {
    /// Client using the default reqwest transport and the system clock.
    pub fn new(config: WeatherConfig) -> Result<Self, WeatherError> {
        Self::builder(config).build()
    }

    /// Validate `options` and build a client from them.
    pub fn from_options(options: WeatherOptions) -> Result<Self, WeatherError> {
        Self::new(WeatherConfig::try_from(options)?)
    }

    pub fn builder(config: WeatherConfig) -> WeatherClientBuilder {
        WeatherClientBuilder {
            config,
            transport: None,
            clock: None,
        }
    }

    pub fn config(&self) -> &WeatherConfig {
        &self.config
    }

    /// Cache key the given coordinates resolve to under this client's accuracy.
    pub fn cache_key(&self, coordinates: impl Into<Coordinates>) -> Result<CacheKey, WeatherError> {
        let coordinates = coordinates.into();
        CacheKey::new(coordinates, self.config.accuracy()).ok_or(
            WeatherError::InvalidCoordinates {
                latitude: coordinates.latitude,
                longitude: coordinates.longitude,
            },
        )
    }

    /// Current weather at `coordinates` (latitude, longitude).
    ///
    /// Served from the cache when a fresh entry exists for the rounded
    /// coordinates; otherwise fetched from the provider and, if caching is
    /// enabled, stored for `ttl_seconds`. The payload is the provider's JSON
    /// document, unmodified.
    pub async fn get(&self, coordinates: impl Into<Coordinates>) -> Result<Value, WeatherError> {
        self.lookup(coordinates.into()).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn lookup(&self, coordinates: Coordinates) -> Result<Value, WeatherError> {
        let key = self.cache_key(coordinates)?;

        if let Some(data) = self.cache.get_fresh(&key, self.clock.now_millis()) {
            return Ok(data);
        }

        let provider = self.config.provider();
        let url = build_query(&key, &self.config)?;
        tracing::info!(
            %provider,
            url = %redact(&url, provider),
            "Fetching current weather"
        );

        let response = self.transport.get(&url).await?;

        if !response.is_success() {
            tracing::warn!(%provider, status = response.status, "Weather provider request failed");
            return Err(WeatherError::Provider {
                status: response.status,
            });
        }

        let data: Value = serde_json::from_str(&response.body).map_err(TransportError::from)?;

        if self.config.cache_enabled() {
            self.cache.insert(key, data.clone(), self.clock.now_millis());
            tracing::debug!(%key, "Cached weather response");
        }

        Ok(data)
    }

    /// Compass label for a wind bearing in `0.0..=360.0` degrees.
    pub fn convert_wind_degrees_to_direction(&self, degrees: f64) -> Option<WindDirection> {
        WindDirection::from_degrees(degrees)
    }

    /// Inspect the cache entry for `key` without applying expiry.
    pub fn cached(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.cache.get(key)
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Drop all stale entries now rather than on next access.
    pub fn purge_expired(&self) -> usize {
        let removed = self.cache.purge_expired(self.clock.now_millis());
        if removed > 0 {
            tracing::debug!(removed, "Purged expired weather cache entries");
        }
        removed
    }
}

impl std::fmt::Debug for WeatherClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherClient")
            .field("config", &self.config)
            .field("cached_entries", &self.cache.len())
            .finish_non_exhaustive()
    }
}

/// Builder for a [`WeatherClient`] with injected collaborators.
pub struct WeatherClientBuilder {
    config: WeatherConfig,
    transport: Option<Arc<dyn Transport>>,
    clock: Option<Arc<dyn Clock>>,
}

impl WeatherClientBuilder {
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<WeatherClient, WeatherError> {
        let transport = match self.transport {
            Some(t) => t,
            None => Arc::new(ReqwestTransport::new(self.config.timeout())?),
        };
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        tracing::debug!(
            provider = %self.config.provider(),
            cache_enabled = self.config.cache_enabled(),
            ttl_seconds = self.config.ttl_seconds(),
            accuracy = self.config.accuracy(),
            "Weather client created"
        );

        Ok(WeatherClient {
            cache: WeatherCache::new(self.config.ttl_millis()),
            config: self.config,
            transport,
            clock,
        })
    }
}
