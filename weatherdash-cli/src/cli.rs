use std::{sync::Arc, time::Duration};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{InquireError, Password, Select, Text};
use weatherdash_core::{
    Config, Coordinates, Location, Notifier, Units, View, WeatherController, provider_from_config,
};

use crate::{
    render::{render_view, to_json},
    sink::ConsoleSink,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherdash", version, about = "Weather dashboard for the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeatherMap API key and preferred units.
    Configure,

    /// Show current weather and the 5-day forecast for a city.
    Show {
        /// City name, e.g. "Paris" or "Portland,US".
        city: String,

        /// imperial or metric; defaults to the configured units.
        #[arg(long, value_parser = parse_units)]
        units: Option<Units>,

        /// Show the details of forecast day N (1-5) instead of current conditions.
        #[arg(long)]
        day: Option<usize>,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Show weather for a latitude/longitude.
    Coords {
        #[arg(allow_negative_numbers = true)]
        lat: f64,

        #[arg(allow_negative_numbers = true)]
        lon: f64,

        #[arg(long, value_parser = parse_units)]
        units: Option<Units>,

        #[arg(long)]
        json: bool,
    },

    /// Interactive dashboard: search cities, toggle units, browse days.
    Interactive {
        /// Starting city; defaults to the configured location.
        city: Option<String>,

        #[arg(long, value_parser = parse_units)]
        units: Option<Units>,
    },
}

fn parse_units(value: &str) -> Result<Units, String> {
    Units::try_from(value).map_err(|e| e.to_string())
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        tracing::debug!(command = ?self.command, "running command");

        match self.command {
            Command::Configure => configure(),
            Command::Show { city, units, day, json } => {
                if city.trim().is_empty() {
                    bail!("City name is required");
                }
                let config = Config::load_with_env()?;
                let units = units.unwrap_or(config.units);
                let mut controller =
                    build_controller(&config, Location::city(city.trim()), units, Duration::ZERO)?;

                let request = controller.refresh();
                controller.run(request).await;
                if let Some(day) = day {
                    controller.select_day(day.checked_sub(1));
                }
                print_once(&controller, json)
            }
            Command::Coords { lat, lon, units, json } => {
                let config = Config::load_with_env()?;
                let units = units.unwrap_or(config.units);
                let mut controller = build_controller(
                    &config,
                    Location::CurrentPosition(None),
                    units,
                    Duration::ZERO,
                )?;

                let request = controller.use_current_position(Some(Coordinates::new(lat, lon)));
                controller.run(request).await;
                print_once(&controller, json)
            }
            Command::Interactive { city, units } => {
                let config = Config::load_with_env()?;
                let start = city.unwrap_or_else(|| config.default_location.clone());
                let units = units.unwrap_or(config.units);
                let controller = build_controller(
                    &config,
                    Location::city(start),
                    units,
                    config.notification_debounce(),
                )?;
                interactive(controller).await
            }
        }
    }
}

fn build_controller(
    config: &Config,
    location: Location,
    units: Units,
    debounce: Duration,
) -> anyhow::Result<WeatherController> {
    let provider = Arc::new(provider_from_config(config)?);
    let notifier = Notifier::with_debounce(Arc::new(ConsoleSink::default()), debounce);
    Ok(WeatherController::new(provider, notifier, location, units))
}

fn print_once(controller: &WeatherController, json: bool) -> anyhow::Result<()> {
    let units = controller.state().units;
    match controller.view() {
        View::Weather { current, forecast, .. } if json => {
            println!("{}", to_json(current, forecast)?);
            Ok(())
        }
        view @ View::Weather { .. } => {
            println!("{}", render_view(view, units));
            Ok(())
        }
        View::Error(message) => bail!("{message}"),
        View::Empty | View::Loading => bail!("No weather data available"),
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let key = Password::new("OpenWeatherMap API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    let units = Select::new("Preferred units:", vec![Units::Imperial, Units::Metric])
        .prompt()
        .context("Failed to read units")?;

    config.set_api_key(key);
    config.units = units;
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

/// One line of input in the interactive dashboard.
#[derive(Debug, Clone, PartialEq)]
enum Action {
    Search(String),
    ToggleUnits,
    /// 1-based day number; 0 returns to current conditions.
    Day(usize),
    Back,
    Here(Coordinates),
    Refresh,
    Quit,
    Unknown(String),
}

fn parse_action(input: &str) -> Action {
    let input = input.trim();
    let mut words = input.split_whitespace();
    let head = words.next().unwrap_or_default().to_lowercase();
    let rest: Vec<&str> = words.collect();

    match (head.as_str(), rest.as_slice()) {
        ("quit" | "exit" | "q", []) => Action::Quit,
        ("units" | "u", []) => Action::ToggleUnits,
        ("back" | "b", []) => Action::Back,
        ("refresh" | "r", []) => Action::Refresh,
        ("day" | "d", [n]) => match n.parse() {
            Ok(n) => Action::Day(n),
            Err(_) => Action::Unknown(input.to_string()),
        },
        ("here", [lat, lon]) => match (lat.parse(), lon.parse()) {
            (Ok(lat), Ok(lon)) => Action::Here(Coordinates::new(lat, lon)),
            _ => Action::Unknown(input.to_string()),
        },
        ("day" | "d" | "here", _) => Action::Unknown(input.to_string()),
        _ => Action::Search(input.to_string()),
    }
}

async fn prompt_line() -> anyhow::Result<Option<String>> {
    let answer = tokio::task::spawn_blocking(|| {
        Text::new(">")
            .with_help_message("city name · units · day <n> · back · here <lat> <lon> · refresh · quit")
            .prompt()
    })
    .await
    .context("Prompt task failed")?;

    match answer {
        Ok(line) => Ok(Some(line)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(err) => Err(err).context("Failed to read input"),
    }
}

async fn interactive(mut controller: WeatherController) -> anyhow::Result<()> {
    let initial = controller.refresh();
    controller.run(initial).await;

    loop {
        println!("\n{}", render_view(controller.view(), controller.state().units));

        let Some(line) = prompt_line().await? else {
            break;
        };

        match parse_action(&line) {
            Action::Quit => break,
            Action::ToggleUnits => {
                let request = controller.toggle_units();
                controller.run(request).await;
            }
            Action::Day(n) => controller.select_day(n.checked_sub(1)),
            Action::Back => controller.select_day(None),
            Action::Here(coords) => {
                let request = controller.use_current_position(Some(coords));
                controller.run(request).await;
            }
            Action::Refresh => {
                controller.clear_error();
                let request = controller.refresh();
                controller.run(request).await;
            }
            Action::Search(city) => {
                if let Some(request) = controller.search_location(&city) {
                    controller.run(request).await;
                }
            }
            Action::Unknown(input) => {
                controller.notifier().info(format!("Didn't understand \"{input}\""));
            }
        }
    }

    Ok(())
}
