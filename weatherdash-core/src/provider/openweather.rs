use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    error::{Resource, Target, WeatherApiError},
    forecast::{self, FORECAST_SAMPLE_COUNT, ForecastSample},
    model::{
        Coordinates, CurrentWeatherSnapshot, DailyForecastEntry, Location, Units, round_half_up,
    },
};

use super::WeatherProvider;

/// Client for the OpenWeatherMap 2.5 REST API.
///
/// Holds no state between calls apart from the key and endpoint it was built
/// with. Clone is cheap; `reqwest::Client` shares its connection pool.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: Option<String>,
    base_url: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(
        api_key: Option<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Current conditions for a city name.
    pub async fn fetch_current_weather(
        &self,
        city: &str,
        units: Units,
    ) -> Result<CurrentWeatherSnapshot, WeatherApiError> {
        let key = self.api_key()?;
        let city = required_city(city)?;

        let parsed: OwCurrentResponse = self
            .get_json(
                "weather",
                key,
                &[("q", city.to_string()), ("units", units.to_string())],
                Target::City(city),
                Resource::Weather,
            )
            .await?;

        Ok(parsed.into_snapshot())
    }

    /// Daily forecast for a city name, normalized to at most five days.
    pub async fn fetch_forecast(
        &self,
        city: &str,
        units: Units,
    ) -> Result<Vec<DailyForecastEntry>, WeatherApiError> {
        let key = self.api_key()?;
        let city = required_city(city)?;

        let parsed: OwForecastResponse = self
            .get_json(
                "forecast",
                key,
                &[
                    ("q", city.to_string()),
                    ("units", units.to_string()),
                    ("cnt", FORECAST_SAMPLE_COUNT.to_string()),
                ],
                Target::City(city),
                Resource::Forecast,
            )
            .await?;

        Ok(parsed.into_daily())
    }

    /// Current conditions for a position.
    pub async fn fetch_current_weather_by_coords(
        &self,
        lat: f64,
        lon: f64,
        units: Units,
    ) -> Result<CurrentWeatherSnapshot, WeatherApiError> {
        let key = self.api_key()?;
        let coords = required_coords(lat, lon)?;

        let parsed: OwCurrentResponse = self
            .get_json(
                "weather",
                key,
                &[
                    ("lat", coords.lat.to_string()),
                    ("lon", coords.lon.to_string()),
                    ("units", units.to_string()),
                ],
                Target::Coordinates,
                Resource::Weather,
            )
            .await?;

        Ok(parsed.into_snapshot())
    }

    /// Daily forecast for a position, normalized to at most five days.
    pub async fn fetch_forecast_by_coords(
        &self,
        lat: f64,
        lon: f64,
        units: Units,
    ) -> Result<Vec<DailyForecastEntry>, WeatherApiError> {
        let key = self.api_key()?;
        let coords = required_coords(lat, lon)?;

        let parsed: OwForecastResponse = self
            .get_json(
                "forecast",
                key,
                &[
                    ("lat", coords.lat.to_string()),
                    ("lon", coords.lon.to_string()),
                    ("units", units.to_string()),
                    ("cnt", FORECAST_SAMPLE_COUNT.to_string()),
                ],
                Target::Coordinates,
                Resource::Forecast,
            )
            .await?;

        Ok(parsed.into_daily())
    }

    fn api_key(&self) -> Result<&str, WeatherApiError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(WeatherApiError::missing_api_key)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        api_key: &str,
        params: &[(&str, String)],
        target: Target<'_>,
        resource: Resource,
    ) -> Result<T, WeatherApiError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        tracing::debug!(%url, ?resource, "sending OpenWeather request");

        let res = self
            .http
            .get(&url)
            .query(&[("appid", api_key)])
            .query(params)
            .send()
            .await
            .map_err(|e| {
                tracing::debug!(error = %e, "OpenWeather request failed before a response");
                WeatherApiError::from_transport(&e, resource)
            })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| WeatherApiError::from_transport(&e, resource))?;

        if !status.is_success() {
            return Err(WeatherApiError::from_status(status, &body, target, resource));
        }

        serde_json::from_str(&body).map_err(|e| WeatherApiError::invalid_response(status, &e))
    }
}

fn required_city(city: &str) -> Result<&str, WeatherApiError> {
    let city = city.trim();
    if city.is_empty() {
        return Err(WeatherApiError::city_required());
    }
    Ok(city)
}

fn required_coords(lat: f64, lon: f64) -> Result<Coordinates, WeatherApiError> {
    let coords = Coordinates::new(lat, lon);
    if !coords.is_valid() {
        return Err(WeatherApiError::coordinates_required());
    }
    Ok(coords)
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp: f64,
    temp_min: f64,
    temp_max: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
    deg: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    country: Option<String>,
    #[serde(default)]
    sunrise: i64,
    #[serde(default)]
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    /// Shift from UTC in seconds.
    #[serde(default)]
    timezone: i32,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: OwWind,
    #[serde(default)]
    sys: OwSys,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    #[serde(default)]
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwForecastMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: OwCity,
    #[serde(default)]
    list: Vec<OwForecastEntry>,
}

impl OwCurrentResponse {
    fn into_snapshot(self) -> CurrentWeatherSnapshot {
        let offset = fixed_offset(self.timezone);
        let (condition, description, icon_key) = match self.weather.into_iter().next() {
            Some(w) => (w.main, w.description, w.icon),
            None => ("Unknown".to_string(), String::new(), String::new()),
        };

        CurrentWeatherSnapshot {
            city: self.name,
            country: self.sys.country.unwrap_or_default(),
            observed_at: format_local(self.dt, offset, "%A, %B %-d"),
            temperature: round_half_up(self.main.temp),
            feels_like: round_half_up(self.main.feels_like),
            condition,
            description,
            humidity: self.main.humidity,
            wind_speed: round_half_up(self.wind.speed),
            wind_direction: self.wind.deg,
            sunrise: format_local(self.sys.sunrise, offset, "%-I:%M %p"),
            sunset: format_local(self.sys.sunset, offset, "%-I:%M %p"),
            is_daytime: self.dt > self.sys.sunrise && self.dt < self.sys.sunset,
            icon_key,
        }
    }
}

impl OwForecastResponse {
    fn into_daily(self) -> Vec<DailyForecastEntry> {
        let offset = fixed_offset(self.city.timezone);
        let samples: Vec<ForecastSample> = self
            .list
            .into_iter()
            .map(|entry| ForecastSample {
                timestamp: entry.dt,
                temp: entry.main.temp,
                temp_min: entry.main.temp_min,
                temp_max: entry.main.temp_max,
                humidity: entry.main.humidity,
                wind_speed: entry.wind.speed,
                condition: entry
                    .weather
                    .into_iter()
                    .next()
                    .map(|w| w.main)
                    .unwrap_or_else(|| "Unknown".to_string()),
            })
            .collect();

        forecast::normalize(&samples, offset)
    }
}

fn fixed_offset(seconds: i32) -> FixedOffset {
    FixedOffset::east_opt(seconds).unwrap_or_else(|| Utc.fix())
}

fn format_local(ts: i64, offset: FixedOffset, pattern: &str) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|utc| utc.with_timezone(&offset).format(pattern).to_string())
        .unwrap_or_default()
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current_weather(
        &self,
        location: &Location,
        units: Units,
    ) -> Result<CurrentWeatherSnapshot, WeatherApiError> {
        match location {
            Location::City(city) => self.fetch_current_weather(city, units).await,
            Location::CurrentPosition(Some(c)) => {
                self.fetch_current_weather_by_coords(c.lat, c.lon, units).await
            }
            Location::CurrentPosition(None) => {
                self.api_key()?;
                Err(WeatherApiError::coordinates_required())
            }
        }
    }

    async fn forecast(
        &self,
        location: &Location,
        units: Units,
    ) -> Result<Vec<DailyForecastEntry>, WeatherApiError> {
        match location {
            Location::City(city) => self.fetch_forecast(city, units).await,
            Location::CurrentPosition(Some(c)) => {
                self.fetch_forecast_by_coords(c.lat, c.lon, units).await
            }
            Location::CurrentPosition(None) => {
                self.api_key()?;
                Err(WeatherApiError::coordinates_required())
            }
        }
    }
}
