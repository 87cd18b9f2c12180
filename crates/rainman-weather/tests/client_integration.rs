//! Integration tests for WeatherClient using wiremock.
//!
//! The provider base URL is pointed at a mock server through the `endpoint`
//! option, so requests go through the real reqwest transport.

use std::sync::Arc;
use std::time::Duration;

use rainman_weather::{
    ManualClock, Units, WeatherClient, WeatherConfig, WeatherError, WeatherOptions,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "1234567890";

/// Trimmed OpenWeatherMap `/weather` response.
fn owm_response() -> serde_json::Value {
    serde_json::json!({
        "coord": { "lon": 0, "lat": 0 },
        "weather": [{ "id": 800, "main": "Clear", "description": "clear sky", "icon": "01d" }],
        "main": { "temp": 26.4, "pressure": 1012, "humidity": 79 },
        "wind": { "speed": 5.1, "deg": 190 },
        "name": "",
        "cod": 200
    })
}

/// Trimmed DarkSky `/forecast` response.
fn darksky_response() -> serde_json::Value {
    serde_json::json!({
        "latitude": 51.51,
        "longitude": -0.13,
        "timezone": "Europe/London",
        "currently": { "summary": "Drizzle", "temperature": 12.3, "windBearing": 250 }
    })
}

fn owm_options(server: &MockServer) -> WeatherOptions {
    WeatherOptions::new(API_KEY, "openweathermap").with_endpoint(format!("{}/weather", server.uri()))
}

#[tokio::test]
async fn test_openweathermap_fetch() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("lat", "0"))
        .and(query_param("lon", "0"))
        .and(query_param("appid", API_KEY))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(owm_response()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = WeatherClient::from_options(owm_options(&mock_server)).unwrap();
    let data = client.get((0.0, 0.0)).await.unwrap();

    assert_eq!(data, owm_response());
}

#[tokio::test]
async fn test_darksky_fetch() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/forecast/{}/51.51,-0.13", API_KEY)))
        .and(query_param("exclude", "[minutely,hourly,daily,alerts,flags]"))
        .and(query_param("units", "imperial"))
        .respond_with(ResponseTemplate::new(200).set_body_json(darksky_response()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let options = WeatherOptions::new(API_KEY, "darksky")
        .with_endpoint(format!("{}/forecast", mock_server.uri()))
        .with_units(Units::Imperial);
    let client = WeatherClient::from_options(options).unwrap();
    let data = client.get([51.5074, -0.1278]).await.unwrap();

    assert_eq!(data["currently"]["summary"], "Drizzle");
}

#[tokio::test]
async fn test_second_lookup_served_from_cache() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(owm_response()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = WeatherClient::from_options(owm_options(&mock_server)).unwrap();
    let first = client.get((0.0, 0.0)).await.unwrap();
    let second = client.get((0.004, -0.004)).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(client.cache_len(), 1);
}

#[tokio::test]
async fn test_expired_entry_triggers_new_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(owm_response()))
        .expect(2)
        .mount(&mock_server)
        .await;

    let clock = Arc::new(ManualClock::new(0));
    let config =
        WeatherConfig::try_from(owm_options(&mock_server).with_ttl_seconds(60)).unwrap();
    let client = WeatherClient::builder(config)
        .with_clock(clock.clone())
        .build()
        .unwrap();

    client.get((0.0, 0.0)).await.unwrap();
    clock.advance(Duration::from_secs(61));
    client.get((0.0, 0.0)).await.unwrap();

    let key = client.cache_key((0.0, 0.0)).unwrap();
    assert_eq!(client.cached(&key).unwrap().expires_at, 61_000 + 60_000);
}

#[tokio::test]
async fn test_cache_disabled_always_fetches() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(owm_response()))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = WeatherClient::from_options(owm_options(&mock_server).with_cache(false)).unwrap();
    client.get((0.0, 0.0)).await.unwrap();
    client.get((0.0, 0.0)).await.unwrap();

    assert_eq!(client.cache_len(), 0);
}

#[tokio::test]
async fn test_error_status_rejects_with_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(408))
        .mount(&mock_server)
        .await;

    let client = WeatherClient::from_options(owm_options(&mock_server)).unwrap();
    let err = client.get((0.0, 0.0)).await.unwrap_err();

    assert!(matches!(err, WeatherError::Provider { status: 408 }));
    assert!(err.to_string().contains("408"), "Error should mention 408 status: {}", err);
    assert_eq!(client.cache_len(), 0);
}

#[tokio::test]
async fn test_invalid_api_key_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "cod": 401,
            "message": "Invalid API key."
        })))
        .mount(&mock_server)
        .await;

    let client = WeatherClient::from_options(owm_options(&mock_server)).unwrap();
    let err = client.get((0.0, 0.0)).await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert!(err.user_message().contains("API key"));
}

#[tokio::test]
async fn test_concurrent_lookups_are_not_coalesced() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(owm_response())
                .set_delay(Duration::from_millis(100)),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = Arc::new(WeatherClient::from_options(owm_options(&mock_server)).unwrap());
    let (a, b) = tokio::join!(client.get((0.0, 0.0)), client.get((0.0, 0.0)));

    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(client.cache_len(), 1);
}
