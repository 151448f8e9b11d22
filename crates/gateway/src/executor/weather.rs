//! Current-weather lookup backed by Open-Meteo.

use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};
use url::Url;

use super::ToolError;
use crate::config::GatewaySettings;

const CURRENT_FIELDS: &str =
    "temperature_2m,apparent_temperature,relative_humidity_2m,wind_speed_10m,weather_code";

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Vec<Place>,
}

#[derive(Debug, Deserialize)]
struct Place {
    name: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: Current,
}

#[derive(Debug, Deserialize)]
struct Current {
    temperature_2m: f64,
    apparent_temperature: Option<f64>,
    relative_humidity_2m: Option<f64>,
    wind_speed_10m: Option<f64>,
    weather_code: Option<u16>,
}

/// Look up current conditions for `city`.
///
/// When the lookup fails and `weather_fallback` is enabled, a record marked
/// `"fallback": true` is returned instead of an error.
pub(super) async fn lookup(
    http: &reqwest::Client,
    settings: &GatewaySettings,
    city: &str,
) -> Result<Value, ToolError> {
    match fetch(http, settings, city).await {
        Ok(value) => Ok(value),
        Err(e) if settings.weather_fallback => {
            warn!(city, error = %e, "weather lookup failed, returning fallback data");
            Ok(json!({
                "city": city,
                "condition": "Unknown",
                "fallback": true,
                "note": format!("Fallback data: the live weather lookup failed ({e})"),
            }))
        }
        Err(e) => Err(e),
    }
}

async fn fetch(
    http: &reqwest::Client,
    settings: &GatewaySettings,
    city: &str,
) -> Result<Value, ToolError> {
    let geocoding = endpoint(&settings.geocoding_url, &[("name", city), ("count", "1")])?;
    let places: GeocodingResponse = get_json(http, settings, geocoding).await?;
    let place = places.results.into_iter().next().ok_or_else(|| {
        ToolError::Execution(format!("could not find coordinates for city: {city}"))
    })?;
    debug!(city, place = %place.name, place.latitude, place.longitude, "geocoded");

    let latitude = place.latitude.to_string();
    let longitude = place.longitude.to_string();
    let forecast = endpoint(
        &settings.forecast_url,
        &[
            ("latitude", latitude.as_str()),
            ("longitude", longitude.as_str()),
            ("current", CURRENT_FIELDS),
            ("timezone", "auto"),
        ],
    )?;
    let current = get_json::<ForecastResponse>(http, settings, forecast).await?.current;

    Ok(json!({
        "city": place.name,
        "country": place.country,
        "temperature": current.temperature_2m.round(),
        "apparent_temperature": current.apparent_temperature.map(f64::round),
        "condition": current.weather_code.map(condition).unwrap_or("Unknown"),
        "humidity": current.relative_humidity_2m,
        "wind": current.wind_speed_10m.map(|speed| format!("{} km/h", speed.round())),
        "timestamp": Utc::now().to_rfc3339(),
        "source": "Open-Meteo API",
    }))
}

fn endpoint(base: &str, params: &[(&str, &str)]) -> Result<Url, ToolError> {
    Url::parse_with_params(base, params)
        .map_err(|e| ToolError::Execution(format!("invalid weather endpoint {base}: {e}")))
}

async fn get_json<T: serde::de::DeserializeOwned>(
    http: &reqwest::Client,
    settings: &GatewaySettings,
    url: Url,
) -> Result<T, ToolError> {
    let response = http
        .get(url)
        .timeout(settings.request_timeout())
        .send()
        .await
        .map_err(|e| ToolError::Execution(format!("weather service unreachable: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ToolError::Execution(format!("weather service returned {status}")));
    }

    response
        .json()
        .await
        .map_err(|e| ToolError::Execution(format!("invalid weather response: {e}")))
}

/// WMO weather interpretation code.
fn condition(code: u16) -> &'static str {
    match code {
        0 => "Clear",
        1 => "Mainly Clear",
        2 => "Partly Cloudy",
        3 => "Cloudy",
        45 => "Foggy",
        48 => "Rime Fog",
        51 => "Light Drizzle",
        53 => "Moderate Drizzle",
        55 => "Dense Drizzle",
        56 => "Light Freezing Drizzle",
        57 => "Dense Freezing Drizzle",
        61 => "Slight Rain",
        63 => "Moderate Rain",
        65 => "Heavy Rain",
        66 => "Light Freezing Rain",
        67 => "Heavy Freezing Rain",
        71 => "Slight Snow",
        73 => "Moderate Snow",
        75 => "Heavy Snow",
        77 => "Snow Grains",
        80 => "Slight Rain Showers",
        81 => "Moderate Rain Showers",
        82 => "Violent Rain Showers",
        85 => "Slight Snow Showers",
        86 => "Heavy Snow Showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with Slight Hail",
        99 => "Thunderstorm with Heavy Hail",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn settings(server: &Server, fallback: bool) -> GatewaySettings {
        GatewaySettings {
            geocoding_url: format!("{}/v1/search", server.url()),
            forecast_url: format!("{}/v1/forecast", server.url()),
            weather_fallback: fallback,
            ..GatewaySettings::default()
        }
    }

    #[test]
    fn codes_map_to_conditions() {
        assert_eq!(condition(0), "Clear");
        assert_eq!(condition(63), "Moderate Rain");
        assert_eq!(condition(42), "Unknown");
    }

    #[tokio::test]
    async fn geocodes_then_reads_current_conditions() {
        let mut server = Server::new_async().await;
        let _geocoding = server
            .mock("GET", "/v1/search")
            .match_query(Matcher::UrlEncoded("name".into(), "Paris".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"results":[{"name":"Paris","latitude":48.85,"longitude":2.35,"country":"France"}]}"#,
            )
            .create_async()
            .await;
        let _forecast = server
            .mock("GET", "/v1/forecast")
            .match_query(Matcher::UrlEncoded("latitude".into(), "48.85".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"current":{"temperature_2m":17.6,"apparent_temperature":16.2,"relative_humidity_2m":70,"wind_speed_10m":11.4,"weather_code":2}}"#,
            )
            .create_async()
            .await;

        let value = lookup(&reqwest::Client::new(), &settings(&server, false), "Paris")
            .await
            .unwrap();
        assert_eq!(value["city"], "Paris");
        assert_eq!(value["temperature"], 18.0);
        assert_eq!(value["condition"], "Partly Cloudy");
        assert_eq!(value["wind"], "11 km/h");
    }

    #[tokio::test]
    async fn unknown_city_is_an_error_without_fallback() {
        let mut server = Server::new_async().await;
        let _geocoding = server
            .mock("GET", "/v1/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{}"#)
            .create_async()
            .await;

        let err = lookup(&reqwest::Client::new(), &settings(&server, false), "Atlantis")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Atlantis"));
    }

    #[tokio::test]
    async fn fallback_is_opt_in_and_marked() {
        let mut server = Server::new_async().await;
        let _geocoding = server
            .mock("GET", "/v1/search")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let value = lookup(&reqwest::Client::new(), &settings(&server, true), "Oslo")
            .await
            .unwrap();
        assert_eq!(value["fallback"], true);
        assert_eq!(value["city"], "Oslo");
    }
}
