//! Core library for the `weatherdash` terminal dashboard.
//!
//! This crate defines:
//! - The OpenWeatherMap client and its typed error
//! - Forecast normalization (3-hourly samples to daily summaries)
//! - The dashboard state controller and its notification policy
//! - Configuration & credentials handling
//!
//! It is used by `weatherdash-cli`, but any other front end can drive the
//! [`WeatherController`] the same way.

pub mod config;
pub mod controller;
pub mod error;
pub mod forecast;
pub mod model;
pub mod notify;
pub mod provider;
pub mod suggest;

pub use config::Config;
pub use controller::{
    FetchOutcome, FetchRequest, FetchStatus, View, WeatherController, WeatherState,
};
pub use error::{ErrorKind, WeatherApiError};
pub use model::{
    Coordinates, CurrentWeatherSnapshot, DailyForecastEntry, Location, Units, WeatherIcon,
};
pub use notify::{
    MemorySink, Notification, NotificationContent, NotificationId, NotificationSink, Notifier,
    Severity,
};
pub use provider::{WeatherProvider, openweather::OpenWeatherClient, provider_from_config};
