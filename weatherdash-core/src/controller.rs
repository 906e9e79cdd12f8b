//! Dashboard state machine: location, units, selected forecast day, and
//! what happens when a fetch succeeds or fails.
//!
//! Operations that need fresh data return a [`FetchRequest`]. Executing it
//! runs the current-weather and forecast calls concurrently; applying the
//! resulting [`FetchOutcome`] performs the state transition. Each request
//! carries a sequence number and only the most recently issued one may
//! change state, so a slow response for an abandoned search is dropped.

use std::sync::Arc;

use crate::{
    error::WeatherApiError,
    model::{Coordinates, CurrentWeatherSnapshot, DailyForecastEntry, Location, Units},
    notify::{NotificationContent, Notifier, Severity},
    provider::WeatherProvider,
    suggest::suggest_cities,
};

/// Shown when the very first load fails for a reason other than "not found".
pub const FATAL_ERROR_MESSAGE: &str = "Failed to fetch weather data. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Idle,
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct WeatherState {
    pub location: Location,
    pub units: Units,
    pub status: FetchStatus,
    pub loading: bool,
    pub error: Option<String>,
    pub current: Option<CurrentWeatherSnapshot>,
    pub forecast: Vec<DailyForecastEntry>,
    /// Index into `forecast`; `None` shows current conditions.
    pub selected_day: Option<usize>,
}

/// The one thing a consumer should render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum View<'a> {
    Loading,
    Error(&'a str),
    Weather {
        current: &'a CurrentWeatherSnapshot,
        forecast: &'a [DailyForecastEntry],
        selected: Option<&'a DailyForecastEntry>,
    },
    /// Nothing loaded yet and nothing to complain about; prompt for a city.
    Empty,
}

/// A fetch cycle waiting to be executed.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub seq: u64,
    pub location: Location,
    pub units: Units,
}

pub type FetchResult =
    Result<(CurrentWeatherSnapshot, Vec<DailyForecastEntry>), WeatherApiError>;

#[derive(Debug)]
pub struct FetchOutcome {
    pub seq: u64,
    pub location: Location,
    pub units: Units,
    pub result: FetchResult,
}

impl FetchRequest {
    /// Issue both calls at once and wait for both to settle.
    pub async fn execute(self, provider: &dyn WeatherProvider) -> FetchOutcome {
        let (current, forecast) = tokio::join!(
            provider.current_weather(&self.location, self.units),
            provider.forecast(&self.location, self.units),
        );

        let result = match (current, forecast) {
            (Ok(current), Ok(forecast)) => Ok((current, forecast)),
            (Err(err), _) | (_, Err(err)) => Err(err),
        };

        FetchOutcome { seq: self.seq, location: self.location, units: self.units, result }
    }
}

pub struct WeatherController {
    provider: Arc<dyn WeatherProvider>,
    notifier: Notifier,
    state: WeatherState,
    last_known_good: Option<Location>,
    /// Units the displayed data was fetched in.
    last_good_units: Units,
    latest_seq: u64,
}

impl std::fmt::Debug for WeatherController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherController")
            .field("state", &self.state)
            .field("last_known_good", &self.last_known_good)
            .field("last_good_units", &self.last_good_units)
            .field("latest_seq", &self.latest_seq)
            .finish_non_exhaustive()
    }
}

impl WeatherController {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        notifier: Notifier,
        location: Location,
        units: Units,
    ) -> Self {
        Self {
            provider,
            notifier,
            state: WeatherState {
                location,
                units,
                status: FetchStatus::Idle,
                loading: false,
                error: None,
                current: None,
                forecast: Vec::new(),
                selected_day: None,
            },
            last_known_good: None,
            last_good_units: units,
            latest_seq: 0,
        }
    }

    pub fn state(&self) -> &WeatherState {
        &self.state
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn provider(&self) -> Arc<dyn WeatherProvider> {
        Arc::clone(&self.provider)
    }

    pub fn last_known_good(&self) -> Option<&Location> {
        self.last_known_good.as_ref()
    }

    pub fn view(&self) -> View<'_> {
        let state = &self.state;
        if state.loading {
            return View::Loading;
        }
        if let Some(error) = state.error.as_deref() {
            return View::Error(error);
        }
        match state.current.as_ref() {
            Some(current) => View::Weather {
                current,
                forecast: &state.forecast,
                selected: state.selected_day.and_then(|i| state.forecast.get(i)),
            },
            None => View::Empty,
        }
    }

    /// Start a fetch for the current location and units. Also used for the
    /// initial load.
    pub fn refresh(&mut self) -> FetchRequest {
        self.state.loading = true;
        self.state.status = FetchStatus::Loading;
        self.state.error = None;
        self.latest_seq += 1;

        tracing::debug!(
            seq = self.latest_seq,
            location = %self.state.location,
            units = %self.state.units,
            "starting fetch cycle"
        );

        FetchRequest {
            seq: self.latest_seq,
            location: self.state.location.clone(),
            units: self.state.units,
        }
    }

    /// Switch to `city`. Returns `None` when nothing needs fetching.
    pub fn search_location(&mut self, city: &str) -> Option<FetchRequest> {
        let city = city.trim();
        if city.is_empty() {
            self.notifier.error("Please enter a city name");
            return None;
        }

        let requested = Location::city(city);
        if requested.same_place(&self.state.location) && !self.state.loading {
            self.notifier.info(format!("Already showing weather for {city}"));
            return None;
        }

        self.notifier.clear_all();
        self.state.location = requested;
        Some(self.refresh())
    }

    /// Switch to the device position. `None` means it has not been resolved.
    pub fn use_current_position(&mut self, position: Option<Coordinates>) -> FetchRequest {
        self.notifier.clear_all();
        self.state.location = Location::CurrentPosition(position);
        self.refresh()
    }

    pub fn toggle_units(&mut self) -> FetchRequest {
        self.state.units = self.state.units.toggled();
        self.notifier.info(format!("Switched to {}", self.state.units.scale_name()));
        self.refresh()
    }

    /// Select a forecast day; selecting the current one (or `None`) goes back
    /// to current conditions.
    pub fn select_day(&mut self, index: Option<usize>) {
        self.state.selected_day = match index {
            Some(i) if i >= self.state.forecast.len() => {
                tracing::debug!(
                    index = i,
                    days = self.state.forecast.len(),
                    "ignoring out-of-range day"
                );
                None
            }
            Some(i) if self.state.selected_day == Some(i) => None,
            other => other,
        };
    }

    pub fn clear_error(&mut self) {
        self.state.error = None;
        if self.state.status == FetchStatus::Error {
            self.state.status = FetchStatus::Idle;
        }
    }

    /// Execute `request` with this controller's provider and apply it.
    pub async fn run(&mut self, request: FetchRequest) {
        let provider = self.provider();
        let outcome = request.execute(provider.as_ref()).await;
        self.apply(outcome);
    }

    /// Apply a finished fetch. Outcomes of superseded requests are ignored.
    pub fn apply(&mut self, outcome: FetchOutcome) {
        if outcome.seq != self.latest_seq {
            tracing::debug!(
                seq = outcome.seq,
                latest = self.latest_seq,
                location = %outcome.location,
                "discarding stale fetch result"
            );
            return;
        }

        self.state.loading = false;
        match outcome.result {
            Ok((current, forecast)) => {
                self.on_success(outcome.location, outcome.units, current, forecast)
            }
            Err(err) => self.on_failure(&outcome.location, err),
        }
    }

    fn on_success(
        &mut self,
        location: Location,
        units: Units,
        current: CurrentWeatherSnapshot,
        forecast: Vec<DailyForecastEntry>,
    ) {
        let is_new_place = self
            .last_known_good
            .as_ref()
            .is_none_or(|previous| !previous.same_place(&location));
        if is_new_place {
            self.notifier.success(format!("Showing weather for {}", current.place_label()));
        }

        tracing::debug!(city = %current.city, days = forecast.len(), "weather loaded");
        self.state.status = FetchStatus::Success;
        self.state.error = None;
        self.state.selected_day = None;
        self.state.current = Some(current);
        self.state.forecast = forecast;
        self.last_known_good = Some(location);
        self.last_good_units = units;
    }

    fn on_failure(&mut self, location: &Location, err: WeatherApiError) {
        if let Some(current) = self.state.current.as_ref() {
            // Keep the last good data on screen and only tell the user.
            tracing::warn!(
                location = %location,
                status = err.status,
                kind = ?err.kind,
                error = %err,
                "fetch failed, keeping previous weather"
            );
            self.notifier
                .error(format!("{err}. Still showing {}.", current.place_label()));
            self.state.status = FetchStatus::Success;

            let revert_to = self
                .last_known_good
                .as_ref()
                .filter(|good| !good.same_place(&self.state.location))
                .cloned();
            if let Some(good) = revert_to {
                self.state.location = good;
            }
            // The snapshot on screen was fetched in these units.
            self.state.units = self.last_good_units;
            return;
        }

        if err.is_not_found() {
            tracing::debug!(location = %location, "location not found on first load");
            let cities = match location {
                Location::City(name) => suggest_cities(name),
                Location::CurrentPosition(_) => Vec::new(),
            };
            self.notifier.custom(
                NotificationContent::Suggestions {
                    message: err.message.clone(),
                    cities: cities.into_iter().map(str::to_string).collect(),
                },
                Severity::Error,
            );
            self.state.status = FetchStatus::Idle;
            self.state.error = None;
            return;
        }

        tracing::error!(
            location = %location,
            status = err.status,
            kind = ?err.kind,
            error = %err,
            "initial weather fetch failed"
        );
        self.state.status = FetchStatus::Error;
        self.state.error = Some(FATAL_ERROR_MESSAGE.to_string());
    }
}
