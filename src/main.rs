#![forbid(unsafe_code)]

mod config;
mod constants;
mod dashboard;
mod gui;
mod http;
mod layout;
mod lights;
mod pretty;
mod timer;
mod toolkit;
mod weather;

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{error, info, warn, Level as TraceLevel};
use tracing_subscriber::FmtSubscriber;

use config::{Config, DashboardSettings};
use constants::paths;
use dashboard::Dashboard;
use http::HttpClient;
use lights::Lights;
use toolkit::{KindRegistry, StyleSheet, Toolkit};
use weather::{Weather, WeatherError};

const DEFAULT_LAYOUT: &str = include_str!("../assets/ui.txt");
const DEFAULT_STYLES: &str = include_str!("../assets/styles.css");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum WindowMode {
    #[default]
    Windowed,
    Fullscreen,
}

/// Wall-mounted home dashboard: clock, lights and weather
#[derive(Debug, Parser)]
#[command(version)]
struct CommandLineArguments {
    /// Open windowed or take over the whole screen
    #[arg(value_enum, default_value_t = WindowMode::Windowed)]
    mode: WindowMode,

    /// Config store to use instead of the usual lookup
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Read `name` from the working directory, falling back to the built-in copy
fn read_override(name: &str, builtin: &'static str) -> Result<String> {
    let path = Path::new(name);
    if !path.exists() {
        return Ok(builtin.to_string());
    }
    info!(path = %path.display(), "using local override");
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn load_settings(arguments: &CommandLineArguments) -> Result<DashboardSettings> {
    let config = match &arguments.config {
        Some(path) => Config::load(path)?,
        None => Config::discover()?,
    };
    info!(path = %config.path().display(), "loaded config store");
    Ok(DashboardSettings::from_config(&config)?)
}

fn main() -> Result<()> {
    // Parse log level from environment variable
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let arguments = CommandLineArguments::parse();

    // Nothing touches the network until the config store checks out
    let settings = load_settings(&arguments).unwrap_or_else(|err| {
        error!("failed to load settings: err={err:#}");
        std::process::exit(1);
    });

    fs::create_dir_all(paths::ICON_CACHE_DIR)
        .with_context(|| format!("Failed to create icon cache '{}'", paths::ICON_CACHE_DIR))?;

    let layout = read_override(paths::UI_FILE, DEFAULT_LAYOUT)?;
    let stylesheet = StyleSheet::parse(&read_override(paths::STYLES_FILE, DEFAULT_STYLES)?)
        .context("Failed to parse style sheet")?;
    let toolkit = Rc::new(Toolkit::new(
        KindRegistry::standard(),
        stylesheet,
        paths::ICON_CACHE_DIR,
    ));

    let http = HttpClient::new().context("Failed to create HTTP client")?;

    let mut weather = Weather::new(http.clone(), settings.weather.clone(), paths::ICON_CACHE_DIR);
    match weather.refresh() {
        Ok(()) => info!(location = weather.location_name(), "fetched weather"),
        Err(WeatherError::Unauthorized) => {
            error!("weather provider rejected the API key, check weather-api-key");
            std::process::exit(1);
        }
        Err(err) => warn!(error = %err, "initial weather fetch failed, retrying later"),
    }

    let mut lights = Lights::new(http, settings.overseer_url());
    if let Err(err) = lights.refresh(None) {
        warn!(overseer = %settings.overseer, error = %err, "could not reach overseer");
    }

    let dashboard = Dashboard::new(toolkit, &layout, lights, weather, Instant::now())?;
    gui::run_gui(dashboard, arguments.mode == WindowMode::Fullscreen)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_built_in_assets_are_valid() {
        let sheet = StyleSheet::parse(DEFAULT_STYLES).unwrap();
        assert!(!sheet.is_empty());
        let dir = tempfile::tempdir().unwrap();
        let toolkit = Rc::new(Toolkit::new(KindRegistry::standard(), sheet, dir.path()));
        let root = toolkit::Handle::new(toolkit::Widget::panel());
        layout::LayoutBuilder::new(toolkit, &root, DEFAULT_LAYOUT).unwrap();
    }

    #[test]
    fn test_command_line() {
        let arguments = CommandLineArguments::parse_from(["overseer-dashboard"]);
        assert_eq!(arguments.mode, WindowMode::Windowed);
        assert!(arguments.config.is_none());

        let arguments =
            CommandLineArguments::parse_from(["overseer-dashboard", "fullscreen", "-c", "a.json"]);
        assert_eq!(arguments.mode, WindowMode::Fullscreen);
        assert_eq!(arguments.config, Some(PathBuf::from("a.json")));
    }
}
