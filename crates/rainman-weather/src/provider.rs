//! Provider request URLs.

use rainman_core::{ConfigError, Provider, WeatherConfig};
use url::Url;

use crate::cache::CacheKey;

pub const OPENWEATHERMAP_URL: &str = "http://api.openweathermap.org/data/2.5/weather";
pub const DARKSKY_URL: &str = "https://api.darksky.net/forecast";

/// DarkSky blocks dropped from the response; only `currently` is kept.
const DARKSKY_EXCLUDE: &str = "[minutely,hourly,daily,alerts,flags]";

const REDACTED: &str = "REDACTED";

/// Base URL for the configured provider, honoring an endpoint override.
pub fn base_url(config: &WeatherConfig) -> &str {
    config.endpoint().unwrap_or(match config.provider() {
        Provider::OpenWeatherMap => OPENWEATHERMAP_URL,
        Provider::DarkSky => DARKSKY_URL,
    })
}

/// Build the current-weather request URL for the rounded coordinates in `key`.
pub fn build_query(key: &CacheKey, config: &WeatherConfig) -> Result<Url, ConfigError> {
    let base = base_url(config);
    let lat = key.latitude_str();
    let lon = key.longitude_str();
    let api_key = urlencoding::encode(config.api_key());
    let units = config.units();

    let url = match config.provider() {
        Provider::OpenWeatherMap => format!(
            "{}?lat={}&lon={}&appid={}&units={}",
            base, lat, lon, api_key, units
        ),
        Provider::DarkSky => format!(
            "{}/{}/{},{}?exclude={}&units={}",
            base, api_key, lat, lon, DARKSKY_EXCLUDE, units
        ),
    };

    Url::parse(&url).map_err(|e| {
        ConfigError::Invalid(format!(
            "Couldn't build a {} request from {}: {}",
            config.provider(),
            base,
            e
        ))
    })
}

/// Copy of `url` with the API key replaced, safe to log.
pub fn redact(url: &Url, provider: Provider) -> String {
    let mut redacted = url.clone();

    match provider {
        Provider::OpenWeatherMap => {
            let pairs: Vec<(String, String)> = url
                .query_pairs()
                .map(|(k, v)| {
                    let v = if k == "appid" { REDACTED.into() } else { v };
                    (k.into_owned(), v.into_owned())
                })
                .collect();
            redacted.query_pairs_mut().clear().extend_pairs(pairs);
        }
        Provider::DarkSky => {
            // Path ends in `/{key}/{lat},{lon}`.
            let mut segments: Vec<String> = url
                .path_segments()
                .map(|s| s.map(str::to_string).collect())
                .unwrap_or_default();
            let len = segments.len();
            if len >= 2 {
                segments[len - 2] = REDACTED.to_string();
                if let Ok(mut path) = redacted.path_segments_mut() {
                    path.clear().extend(segments.iter());
                }
            }
        }
    }

    redacted.to_string()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use rainman_core::{Units, WeatherOptions};

    use crate::types::Coordinates;

    fn config(provider: &str) -> WeatherConfig {
        WeatherConfig::try_from(WeatherOptions::new("1234567890", provider)).unwrap()
    }

    fn key(latitude: f64, longitude: f64) -> CacheKey {
        CacheKey::new(Coordinates::new(latitude, longitude), 2).unwrap()
    }

    #[test]
    fn test_openweathermap_query() {
        let url = build_query(&key(1.2345, 6.789), &config("openweathermap")).unwrap();

        assert_eq!(url.host_str(), Some("api.openweathermap.org"));
        assert_eq!(
            url.as_str(),
            "http://api.openweathermap.org/data/2.5/weather?lat=1.23&lon=6.79&appid=1234567890&units=metric"
        );
    }

    #[test]
    fn test_query_coordinates_round_stored_value() {
        let url = build_query(&key(123.175, 19.465), &config("darksky")).unwrap();
        assert_eq!(url.path(), "/forecast/1234567890/123.17,19.46");
    }

    #[test]
    fn test_darksky_query() {
        let url = build_query(&key(0.0, 0.0), &config("darksky")).unwrap();

        assert_eq!(url.host_str(), Some("api.darksky.net"));
        assert_eq!(url.path(), "/forecast/1234567890/0,0");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("exclude".to_string(), DARKSKY_EXCLUDE.to_string()),
                ("units".to_string(), "metric".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_includes_configured_units() {
        for provider in ["openweathermap", "darksky"] {
            let options = WeatherOptions::new("k", provider).with_units(Units::Imperial);
            let config = WeatherConfig::try_from(options).unwrap();
            let url = build_query(&key(10.0, 20.0), &config).unwrap();
            assert!(
                url.query_pairs().any(|(k, v)| k == "units" && v == "imperial"),
                "{} missing units: {}",
                provider,
                url
            );
        }
    }

    #[test]
    fn test_endpoint_override() {
        let options =
            WeatherOptions::new("k", "darksky").with_endpoint("http://127.0.0.1:4000/proxy/");
        let config = WeatherConfig::try_from(options).unwrap();
        let url = build_query(&key(-1.5, 2.25), &config).unwrap();

        assert_eq!(url.host_str(), Some("127.0.0.1"));
        assert_eq!(url.path(), "/proxy/k/-1.5,2.25");
    }

    #[test]
    fn test_api_key_is_percent_encoded() {
        let config =
            WeatherConfig::try_from(WeatherOptions::new("a/b&c", "openweathermap")).unwrap();
        let url = build_query(&key(0.0, 0.0), &config).unwrap();

        assert!(url.query_pairs().any(|(k, v)| k == "appid" && v == "a/b&c"));
    }

    #[test]
    fn test_redact_openweathermap() {
        let url = build_query(&key(0.0, 0.0), &config("openweathermap")).unwrap();
        let redacted = redact(&url, Provider::OpenWeatherMap);

        assert!(!redacted.contains("1234567890"));
        assert!(redacted.contains("appid=REDACTED"));
        assert!(redacted.contains("lat=0"));
    }

    #[test]
    fn test_redact_darksky() {
        let url = build_query(&key(1.0, 2.0), &config("darksky")).unwrap();
        let redacted = redact(&url, Provider::DarkSky);

        assert!(!redacted.contains("1234567890"));
        assert!(redacted.contains("/forecast/REDACTED/1,2"));
    }
}
