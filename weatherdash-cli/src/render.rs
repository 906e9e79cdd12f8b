use std::fmt::Write;

use weatherdash_core::{CurrentWeatherSnapshot, DailyForecastEntry, Units, View, WeatherIcon};

const COMPASS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

/// Plain-text rendering of whatever the controller says is visible.
pub fn render_view(view: View<'_>, units: Units) -> String {
    match view {
        View::Loading => "Loading weather...".to_string(),
        View::Error(message) => format!("{message}\n(type `refresh` to retry)"),
        View::Empty => "No weather to show yet. Enter a city name.".to_string(),
        View::Weather { current, forecast, selected } => {
            let mut out = match selected {
                Some(day) => render_day(day, units),
                None => render_current(current, units),
            };
            out.push('\n');
            out.push_str(&render_forecast(forecast, selected, units));
            out
        }
    }
}

fn render_current(current: &CurrentWeatherSnapshot, units: Units) -> String {
    let t = units.temperature_symbol();
    let mut out = String::new();

    let _ = writeln!(out, "{} · {}", current.place_label(), current.observed_at);
    let _ = writeln!(
        out,
        "{}  {}{t}  {} ({})",
        current.icon().glyph(),
        current.temperature,
        current.condition,
        current.description
    );
    let _ = writeln!(out, "Feels like {}{t} · Humidity {}%", current.feels_like, current.humidity);

    let direction = current.wind_direction.map(compass).unwrap_or("");
    let _ = writeln!(
        out,
        "Wind {} {} {direction}",
        current.wind_speed,
        units.speed_label()
    );
    let _ = writeln!(out, "Sunrise {} · Sunset {}", current.sunrise, current.sunset);
    out
}

fn render_day(day: &DailyForecastEntry, units: Units) -> String {
    let t = units.temperature_symbol();
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} {}  {}{t}  {}",
        WeatherIcon::classify(&day.condition, true).glyph(),
        day.day,
        day.temp,
        day.condition
    );
    let _ = writeln!(out, "High {}{t} · Low {}{t}", day.high, day.low);
    let _ = writeln!(
        out,
        "Humidity {}% · Wind {:.1} {}",
        day.humidity,
        day.wind_speed,
        units.speed_label()
    );
    out
}

fn render_forecast(
    forecast: &[DailyForecastEntry],
    selected: Option<&DailyForecastEntry>,
    units: Units,
) -> String {
    if forecast.is_empty() {
        return "No forecast available.\n".to_string();
    }

    let t = units.temperature_symbol();
    let mut out = String::new();
    for (i, day) in forecast.iter().enumerate() {
        let marker = if selected.is_some_and(|s| std::ptr::eq(s, day)) { ">" } else { " " };
        let _ = writeln!(
            out,
            "{marker} [{}] {:<4} {} {:>4}{t} / {:>4}{t}  {}",
            i + 1,
            day.day,
            WeatherIcon::classify(&day.condition, true).glyph(),
            day.high,
            day.low,
            day.condition
        );
    }
    out
}

/// Eight-point compass label for meteorological degrees.
pub fn compass(degrees: f64) -> &'static str {
    let sector = ((degrees.rem_euclid(360.0) + 22.5) / 45.0) as usize % 8;
    COMPASS[sector]
}

pub fn to_json(
    current: &CurrentWeatherSnapshot,
    forecast: &[DailyForecastEntry],
) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&serde_json::json!({
        "current": current,
        "forecast": forecast,
    }))?)
}
