use crate::{
    Config, WeatherApiError,
    model::{CurrentWeatherSnapshot, DailyForecastEntry, Location, Units},
    provider::openweather::OpenWeatherClient,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Source of current conditions and daily forecasts.
///
/// Implementations must report every failure as a [`WeatherApiError`]; the
/// controller never sees transport-specific errors.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current_weather(
        &self,
        location: &Location,
        units: Units,
    ) -> Result<CurrentWeatherSnapshot, WeatherApiError>;

    async fn forecast(
        &self,
        location: &Location,
        units: Units,
    ) -> Result<Vec<DailyForecastEntry>, WeatherApiError>;
}

/// Construct the OpenWeatherMap client from config.
///
/// A missing API key is not an error here; every request made with the
/// client will fail with a configuration error instead.
pub fn provider_from_config(config: &Config) -> anyhow::Result<OpenWeatherClient> {
    OpenWeatherClient::new(
        config.api_key().map(str::to_owned),
        config.base_url.clone(),
        config.timeout(),
    )
}
