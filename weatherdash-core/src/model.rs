use serde::{Deserialize, Serialize};
use std::fmt;

/// Measurement system requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Imperial,
    Metric,
}

impl Units {
    /// Value of the provider's `units` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Imperial => "imperial",
            Units::Metric => "metric",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Units::Imperial => Units::Metric,
            Units::Metric => Units::Imperial,
        }
    }

    pub fn temperature_symbol(&self) -> &'static str {
        match self {
            Units::Imperial => "°F",
            Units::Metric => "°C",
        }
    }

    pub fn speed_label(&self) -> &'static str {
        match self {
            Units::Imperial => "mph",
            Units::Metric => "m/s",
        }
    }

    /// Human name of the temperature scale, e.g. "Celsius".
    pub fn scale_name(&self) -> &'static str {
        match self {
            Units::Imperial => "Fahrenheit",
            Units::Metric => "Celsius",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Units {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "imperial" | "f" | "fahrenheit" => Ok(Units::Imperial),
            "metric" | "c" | "celsius" => Ok(Units::Metric),
            _ => Err(anyhow::anyhow!(
                "Unknown unit system '{value}'. Supported: imperial, metric."
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// Where the dashboard should show weather for.
///
/// `CurrentPosition` is the geolocation sentinel. Its coordinates are filled
/// in by whoever resolves the device position; until then it is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Location {
    City(String),
    CurrentPosition(Option<Coordinates>),
}

impl Location {
    pub fn city(name: impl Into<String>) -> Self {
        Location::City(name.into())
    }

    /// True when both locations denote the same place. City names compare
    /// trimmed and case-insensitively.
    pub fn same_place(&self, other: &Location) -> bool {
        match (self, other) {
            (Location::City(a), Location::City(b)) => {
                a.trim().to_lowercase() == b.trim().to_lowercase()
            }
            (Location::CurrentPosition(a), Location::CurrentPosition(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::City(name) => f.write_str(name),
            Location::CurrentPosition(_) => f.write_str("current location"),
        }
    }
}

/// Current conditions, reshaped for display. Replaced wholesale on every
/// successful fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeatherSnapshot {
    pub city: String,
    pub country: String,
    /// e.g. "Tuesday, October 17", in the location's local time.
    pub observed_at: String,
    pub temperature: i32,
    pub feels_like: i32,
    pub condition: String,
    pub description: String,
    pub humidity: u8,
    pub wind_speed: i32,
    /// Meteorological degrees, when the provider reports them.
    pub wind_direction: Option<f64>,
    /// e.g. "6:42 AM", in the location's local time.
    pub sunrise: String,
    pub sunset: String,
    pub is_daytime: bool,
    /// Provider icon code, e.g. "10d".
    pub icon_key: String,
}

impl CurrentWeatherSnapshot {
    /// "City, CC", or just the city when the provider gave no country.
    pub fn place_label(&self) -> String {
        if self.country.is_empty() {
            self.city.clone()
        } else {
            format!("{}, {}", self.city, self.country)
        }
    }

    pub fn icon(&self) -> WeatherIcon {
        WeatherIcon::classify(&self.condition, self.is_daytime)
    }
}

/// One day of the normalized forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecastEntry {
    /// Short weekday label, e.g. "Mon".
    pub day: String,
    pub high: i32,
    pub low: i32,
    /// Average temperature of the last sample seen for the day.
    pub temp: i32,
    pub humidity: u8,
    pub wind_speed: f64,
    /// Most frequent condition among the day's samples.
    pub condition: String,
}

/// Coarse icon family used by renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherIcon {
    Sun,
    Moon,
    Cloud,
    Rain,
    Snow,
    Thunder,
}

impl WeatherIcon {
    pub fn classify(condition: &str, is_day: bool) -> Self {
        let condition = condition.to_lowercase();
        let clear_sky = if is_day { WeatherIcon::Sun } else { WeatherIcon::Moon };

        if condition.contains("clear") || condition.contains("sunny") {
            clear_sky
        } else if condition.contains("cloud") {
            WeatherIcon::Cloud
        } else if condition.contains("rain") || condition.contains("drizzle") {
            WeatherIcon::Rain
        } else if condition.contains("snow") {
            WeatherIcon::Snow
        } else if condition.contains("thunderstorm") {
            WeatherIcon::Thunder
        } else if condition.contains("mist") || condition.contains("fog") {
            WeatherIcon::Cloud
        } else {
            clear_sky
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            WeatherIcon::Sun => "☀",
            WeatherIcon::Moon => "☾",
            WeatherIcon::Cloud => "☁",
            WeatherIcon::Rain => "☂",
            WeatherIcon::Snow => "❄",
            WeatherIcon::Thunder => "⚡",
        }
    }
}

/// Round half-up (toward positive infinity on ties), so -2.5 becomes -2.
pub fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}
