use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::error::ConfigError;

/// Default cache lifetime: 60³ seconds (2.5 days).
pub const DEFAULT_TTL_SECS: u64 = 60 * 60 * 60;

/// Default number of decimal places coordinates are rounded to.
pub const DEFAULT_ACCURACY: u32 = 2;

/// Largest accepted accuracy. Beyond this, scaled coordinates exceed the
/// range an f64 represents exactly.
pub const MAX_ACCURACY: u32 = 12;

/// Default request timeout for the built-in HTTP transport.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const LONG_TTL_WARNING_SECS: u64 = 7 * 24 * 60 * 60;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
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

    /// Returns true if the given field has at least one error
    pub fn has_error(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Upstream weather data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenWeatherMap,
    DarkSky,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenWeatherMap => "openweathermap",
            Self::DarkSky => "darksky",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openweathermap" => Ok(Self::OpenWeatherMap),
            "darksky" => Ok(Self::DarkSky),
            _ => Err(ConfigError::UnknownProvider(s.to_string())),
        }
    }
}

/// Unit system requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Imperial => "imperial",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Units {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "metric" => Ok(Self::Metric),
            "imperial" => Ok(Self::Imperial),
            other => Err(ConfigError::Invalid(format!(
                "units must be metric or imperial, got: {}",
                other
            ))),
        }
    }
}

/// Raw, caller-supplied options. Every field is optional here; defaults and
/// validation are applied when converting into a [`WeatherConfig`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherOptions {
    #[serde(alias = "key")]
    pub api_key: Option<String>,

    /// `openweathermap` or `darksky`
    pub provider: Option<String>,

    #[serde(alias = "cache")]
    pub cache_enabled: Option<bool>,

    #[serde(alias = "ttl")]
    pub ttl_seconds: Option<u64>,

    /// Decimal places coordinates are rounded to
    pub accuracy: Option<u32>,

    /// `metric` or `imperial`
    pub units: Option<String>,

    /// Replaces the provider's base URL (self-hosted proxies, tests)
    pub endpoint: Option<String>,

    pub timeout_seconds: Option<u64>,
}

impl WeatherOptions {
    pub fn new(api_key: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            provider: Some(provider.into()),
            ..Self::default()
        }
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = Some(enabled);
        self
    }

    pub fn with_ttl_seconds(mut self, ttl_seconds: u64) -> Self {
        self.ttl_seconds = Some(ttl_seconds);
        self
    }

    pub fn with_accuracy(mut self, accuracy: u32) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    pub fn with_units(mut self, units: Units) -> Self {
        self.units = Some(units.as_str().to_string());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_timeout_seconds(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = Some(timeout_seconds);
        self
    }

    /// Validate the options
    ///
    /// Returns a ValidationResult containing any errors or warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        match self.provider.as_deref() {
            None => result.add_error("provider", "Provider is required"),
            Some(p) => {
                if let Err(e) = p.parse::<Provider>() {
                    result.add_error("provider", e.to_string());
                }
            }
        }

        if self.trimmed_api_key().is_none() {
            result.add_error("api_key", "API key must not be empty");
        }

        match self.ttl_seconds {
            Some(0) => result.add_error("ttl_seconds", "TTL must be greater than 0"),
            Some(ttl) if ttl > LONG_TTL_WARNING_SECS => {
                result.add_warning("ttl_seconds", "Cache TTL is more than 7 days")
            }
            _ => {}
        }

        match self.accuracy {
            Some(a) if a > MAX_ACCURACY => result.add_error(
                "accuracy",
                format!("Accuracy must be at most {} decimal places", MAX_ACCURACY),
            ),
            Some(0) => result.add_warning(
                "accuracy",
                "Coordinates will be rounded to whole degrees",
            ),
            _ => {}
        }

        if let Some(units) = self.units.as_deref() {
            if let Err(e) = units.parse::<Units>() {
                result.add_error("units", e.to_string());
            }
        }

        if self.timeout_seconds == Some(0) {
            result.add_error("timeout_seconds", "Timeout must be greater than 0");
        }

        if let Some(endpoint) = self.endpoint.as_deref() {
            validate_url(endpoint, "endpoint", &mut result);
        }

        result
    }

    fn trimmed_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

/// Validate a URL field
fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) {
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

            if url.query().is_some() {
                result.add_error(field_name, "URL must not carry a query string");
            }
        }
        Err(e) => {
            result.add_error(field_name, format!("Invalid URL: {}", e));
        }
    }
}

/// Validated client configuration. Immutable once built.
#[derive(Clone, PartialEq)]
pub struct WeatherConfig {
    api_key: String,
    provider: Provider,
    cache_enabled: bool,
    ttl_seconds: u64,
    accuracy: u32,
    units: Units,
    endpoint: Option<String>,
    timeout_seconds: u64,
}

impl WeatherConfig {
    /// Configuration with every optional field at its default.
    pub fn new(api_key: impl Into<String>, provider: Provider) -> Result<Self, ConfigError> {
        Self::try_from(WeatherOptions::new(api_key, provider.as_str()))
    }

    /// Parse a TOML document of [`WeatherOptions`] and validate it.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let options: WeatherOptions =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::try_from(options)
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache_enabled
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    /// TTL in milliseconds, the unit cache expiry timestamps are stored in.
    pub fn ttl_millis(&self) -> i64 {
        i64::try_from(self.ttl_seconds.saturating_mul(1000)).unwrap_or(i64::MAX)
    }

    pub fn accuracy(&self) -> u32 {
        self.accuracy
    }

    pub fn units(&self) -> Units {
        self.units
    }

    /// Base URL override, without a trailing slash.
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl TryFrom<WeatherOptions> for WeatherConfig {
    type Error = ConfigError;

    fn try_from(options: WeatherOptions) -> Result<Self, Self::Error> {
        let provider: Provider = options
            .provider
            .as_deref()
            .ok_or(ConfigError::MissingProvider)?
            .parse()?;

        let api_key = options
            .trimmed_api_key()
            .ok_or(ConfigError::MissingApiKey)?
            .to_string();

        let validation = options.validate();
        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()));
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        let units = match options.units.as_deref() {
            Some(u) => u.parse()?,
            None => Units::default(),
        };

        Ok(Self {
            api_key,
            provider,
            cache_enabled: options.cache_enabled.unwrap_or(true),
            ttl_seconds: options.ttl_seconds.unwrap_or(DEFAULT_TTL_SECS),
            accuracy: options.accuracy.unwrap_or(DEFAULT_ACCURACY),
            units,
            endpoint: options
                .endpoint
                .map(|e| e.trim_end_matches('/').to_string()),
            timeout_seconds: options.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS),
        })
    }
}

impl fmt::Debug for WeatherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherConfig")
            .field("api_key", &"<redacted>")
            .field("provider", &self.provider)
            .field("cache_enabled", &self.cache_enabled)
            .field("ttl_seconds", &self.ttl_seconds)
            .field("accuracy", &self.accuracy)
            .field("units", &self.units)
            .field("endpoint", &self.endpoint)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}
