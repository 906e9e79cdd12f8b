//! OpenWeather client tests against a WireMock server.
//!
//! These exercise the real HTTP path: query parameters, status mapping and
//! forecast normalization of a full 40-sample feed.

use std::time::Duration;

use serde_json::json;
use weatherdash_core::{
    Coordinates, ErrorKind, Location, OpenWeatherClient, Units, WeatherProvider,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

// =============================================================================
// Test Helpers
// =============================================================================

/// Monday 2024-01-01 00:00:00 UTC.
const MONDAY: i64 = 1_704_067_200;
const HOUR: i64 = 3600;

fn client(base_url: &str) -> OpenWeatherClient {
    OpenWeatherClient::new(Some("test-key".to_string()), base_url, Duration::from_secs(2))
        .expect("client should build")
}

fn current_body(city: &str) -> serde_json::Value {
    json!({
        "name": city,
        "dt": MONDAY + 13 * HOUR,
        "timezone": 0,
        "main": { "temp": 21.4, "feels_like": 20.6, "humidity": 40 },
        "weather": [{ "main": "Clear", "description": "clear sky", "icon": "01d" }],
        "wind": { "speed": 3.2, "deg": 180 },
        "sys": { "country": "FR", "sunrise": MONDAY + 7 * HOUR, "sunset": MONDAY + 17 * HOUR }
    })
}

/// 40 samples, 3 hours apart, Monday through Friday. The noon sample of
/// every day is rainy and 5 degrees warmer than the rest.
fn forecast_body() -> serde_json::Value {
    let list: Vec<_> = (0..40)
        .map(|i| {
            let dt = MONDAY + i * 3 * HOUR;
            let noon = (dt - MONDAY) % (24 * HOUR) == 12 * HOUR;
            let base = if noon { 15.0 } else { 10.0 };
            let condition = if noon { "Rain" } else { "Clouds" };
            json!({
                "dt": dt,
                "main": {
                    "temp": base,
                    "temp_min": base - 2.0,
                    "temp_max": base + 2.0,
                    "humidity": 60
                },
                "weather": [{ "main": condition }],
                "wind": { "speed": 4.5 }
            })
        })
        .collect();

    json!({ "city": { "name": "Paris", "country": "FR", "timezone": 0 }, "list": list })
}

fn owm_error(code: u16, message: &str) -> serde_json::Value {
    json!({ "cod": code.to_string(), "message": message })
}

// =============================================================================
// Current Weather
// =============================================================================

#[tokio::test]
async fn current_weather_sends_expected_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", "Paris"))
        .and(query_param("units", "metric"))
        .and(query_param("appid", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body("Paris")))
        .expect(1)
        .mount(&server)
        .await;

    let snap = client(&server.uri())
        .fetch_current_weather("  Paris ", Units::Metric)
        .await
        .expect("current weather");

    assert_eq!(snap.city, "Paris");
    assert_eq!(snap.country, "FR");
    assert_eq!(snap.temperature, 21);
    assert_eq!(snap.feels_like, 21);
    assert_eq!(snap.condition, "Clear");
    assert_eq!(snap.sunrise, "7:00 AM");
    assert_eq!(snap.sunset, "5:00 PM");
    assert!(snap.is_daytime);
}

#[tokio::test]
async fn city_not_found_maps_to_404_with_city_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(404).set_body_json(owm_error(404, "city not found")))
        .mount(&server)
        .await;

    let err = client(&server.uri())
        .fetch_current_weather("Zzqx", Units::Imperial)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(err.status, 404);
    assert_eq!(err.message, "City \"Zzqx\" not found");
    assert_eq!(err.data["message"], "city not found");
}

#[tokio::test]
async fn rejected_key_maps_to_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(owm_error(401, "Invalid API key.")))
        .mount(&server)
        .await;

    let err = client(&server.uri())
        .fetch_current_weather("Paris", Units::Imperial)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Unauthorized);
    assert_eq!(err.message, "Invalid API key");
}

#[tokio::test]
async fn server_errors_map_to_service_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = client(&server.uri())
        .fetch_forecast("Paris", Units::Imperial)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::ServiceUnavailable);
    assert_eq!(err.status, 502);
    assert_eq!(err.message, "Weather service is temporarily unavailable");
}

#[tokio::test]
async fn other_provider_errors_pass_message_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_json(owm_error(429, "Your account is temporary blocked")),
        )
        .mount(&server)
        .await;

    let err = client(&server.uri())
        .fetch_current_weather("Paris", Units::Imperial)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Provider);
    assert_eq!(err.status, 429);
    assert_eq!(err.message, "Your account is temporary blocked");
}

#[tokio::test]
async fn undecodable_success_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>captive portal</html>"))
        .mount(&server)
        .await;

    let err = client(&server.uri())
        .fetch_current_weather("Paris", Units::Imperial)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::InvalidResponse);
    assert_eq!(err.status, 200);
}

// =============================================================================
// Preconditions
// =============================================================================

#[tokio::test]
async fn missing_key_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body("Paris")))
        .expect(0)
        .mount(&server)
        .await;

    let client = OpenWeatherClient::new(None, server.uri(), Duration::from_secs(2)).unwrap();
    let err = client.fetch_forecast("Paris", Units::Imperial).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::Configuration);
    assert_eq!(err.status, 401);
    assert_eq!(err.data["message"], "API key missing");
}

#[tokio::test]
async fn blank_city_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body("Paris")))
        .expect(0)
        .mount(&server)
        .await;

    let err = client(&server.uri())
        .fetch_current_weather("   ", Units::Imperial)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(err.status, 400);
    assert_eq!(err.message, "City name is required");
}

#[tokio::test]
async fn unreachable_provider_is_a_network_error() {
    // Nothing listens on port 1.
    let err = client("http://127.0.0.1:1")
        .fetch_current_weather("Paris", Units::Imperial)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Network);
    assert_eq!(err.status, 0);
    assert_eq!(err.message, "Network error. No response received from weather service.");
}

#[tokio::test]
async fn malformed_base_url_is_a_setup_error() {
    let err = client("not a url")
        .fetch_forecast("Paris", Units::Imperial)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::RequestSetup);
    assert_eq!(err.status, 0);
    assert!(err.message.starts_with("Error setting up forecast request: "));
}

// =============================================================================
// Forecast
// =============================================================================

#[tokio::test]
async fn forecast_requests_forty_samples_and_normalizes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("q", "Paris"))
        .and(query_param("cnt", "40"))
        .and(query_param("units", "imperial"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .expect(1)
        .mount(&server)
        .await;

    let days = client(&server.uri())
        .fetch_forecast("Paris", Units::Imperial)
        .await
        .expect("forecast");

    let labels: Vec<_> = days.iter().map(|d| d.day.as_str()).collect();
    assert_eq!(labels, ["Mon", "Tue", "Wed", "Thu", "Fri"]);
    for day in &days {
        // Only the noon sample survives the per-day filter.
        assert_eq!(day.condition, "Rain");
        assert_eq!(day.high, 17);
        assert_eq!(day.low, 13);
        assert_eq!(day.temp, 15);
        assert_eq!(day.humidity, 60);
    }
}

#[tokio::test]
async fn empty_forecast_list_is_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "city": { "timezone": 0 }, "list": [] })),
        )
        .mount(&server)
        .await;

    let days = client(&server.uri())
        .fetch_forecast("Paris", Units::Imperial)
        .await
        .expect("forecast");
    assert!(days.is_empty());
}

// =============================================================================
// Coordinates
// =============================================================================

#[tokio::test]
async fn position_uses_coordinate_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("lat", "48.85"))
        .and(query_param("lon", "2.35"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body("Paris")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("lat", "48.85"))
        .and(query_param("cnt", "40"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server.uri());
    let here = Location::CurrentPosition(Some(Coordinates::new(48.85, 2.35)));

    let snap = client.current_weather(&here, Units::Metric).await.expect("current");
    let days = client.forecast(&here, Units::Metric).await.expect("forecast");
    assert_eq!(snap.city, "Paris");
    assert_eq!(days.len(), 5);
}

#[tokio::test]
async fn coordinate_not_found_has_no_city_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(owm_error(404, "city not found")))
        .mount(&server)
        .await;

    let err = client(&server.uri())
        .fetch_forecast_by_coords(0.0, 0.0, Units::Metric)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(err.message, "Location not found");
}

#[tokio::test]
async fn unresolved_position_is_a_validation_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client(&server.uri())
        .current_weather(&Location::CurrentPosition(None), Units::Metric)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(err.message, "Latitude and longitude are required");
}
