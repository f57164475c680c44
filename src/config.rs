//! Config store: a flat JSON object read once at startup
//!
//! The raw store answers `get(name)`; [`DashboardSettings`] is the typed view
//! the rest of the application is handed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::constants::{endpoints, keys, paths};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing {} file!", path.display())]
    Missing { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is not valid JSON: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} must contain a JSON object at the top level", path.display())]
    NotAnObject { path: PathBuf },

    #[error("config error - tried to access \"{0}\" but it couldn't be found")]
    MissingKey(String),

    #[error("config key \"{key}\" must be {expected}")]
    WrongType { key: String, expected: &'static str },

    #[error(
        "config needs either \"{zip}\" or both \"{lat}\" and \"{lon}\"",
        zip = keys::ZIP_CODE,
        lat = keys::LATITUDE,
        lon = keys::LONGITUDE
    )]
    NoLocation,
}

#[derive(Debug, Clone)]
pub struct Config {
    path: PathBuf,
    values: Map<String, Value>,
}

impl Config {
    /// `config.json` in the working directory, falling back to the platform
    /// config directory. The working-directory path is reported when neither
    /// exists.
    pub fn discover() -> Result<Self, ConfigError> {
        let local = PathBuf::from(paths::CONFIG_FILE);
        if local.exists() {
            return Self::load(&local);
        }

        if let Some(fallback) = Self::fallback_path().filter(|path| path.exists()) {
            debug!(path = %fallback.display(), "using config from platform config dir");
            return Self::load(&fallback);
        }

        Err(ConfigError::Missing { path: local })
    }

    fn fallback_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push(paths::APP_DIR);
        path.push(paths::CONFIG_FILE);
        Some(path)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => ConfigError::Missing {
                path: path.to_path_buf(),
            },
            _ => ConfigError::Read {
                path: path.to_path_buf(),
                source,
            },
        })?;

        let value: Value = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let Value::Object(values) = value else {
            return Err(ConfigError::NotAnObject {
                path: path.to_path_buf(),
            });
        };

        info!(path = %path.display(), keys = values.len(), "loaded config");
        Ok(Self {
            path: path.to_path_buf(),
            values,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, name: &str) -> Result<&Value, ConfigError> {
        self.values
            .get(name)
            .ok_or_else(|| ConfigError::MissingKey(name.to_string()))
    }

    /// String value; bare numbers are accepted and stringified (zip codes are
    /// often written unquoted)
    pub fn get_str(&self, name: &str) -> Result<String, ConfigError> {
        match self.get(name)? {
            Value::String(value) => Ok(value.clone()),
            Value::Number(value) => Ok(value.to_string()),
            _ => Err(ConfigError::WrongType {
                key: name.to_string(),
                expected: "a string",
            }),
        }
    }

    /// Numeric value; numeric strings are accepted
    pub fn get_f64(&self, name: &str) -> Result<f64, ConfigError> {
        let wrong_type = || ConfigError::WrongType {
            key: name.to_string(),
            expected: "a number",
        };
        match self.get(name)? {
            Value::Number(value) => value.as_f64().ok_or_else(wrong_type),
            Value::String(value) => value.trim().parse().map_err(|_| wrong_type()),
            _ => Err(wrong_type()),
        }
    }

    fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Optional string with a default
    fn get_or(&self, name: &str, default: &str) -> Result<String, ConfigError> {
        if self.contains(name) {
            self.get_str(name)
        } else {
            Ok(default.to_string())
        }
    }
}

/// Where the weather is reported for
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    Zip(String),
    Coordinates { lat: f64, lon: f64 },
}

#[derive(Debug, Clone)]
pub struct WeatherSettings {
    pub api_key: String,
    pub location: LocationQuery,
    pub weather_api_url: String,
    pub geo_api_url: String,
    pub alerts_api_url: String,
    pub icon_url: String,
}

/// Everything the dashboard needs from the config store, validated up front
#[derive(Debug, Clone)]
pub struct DashboardSettings {
    /// `host:port` of the lighting controller
    pub overseer: String,
    pub weather: WeatherSettings,
}

impl DashboardSettings {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let overseer = config.get_str(keys::OVERSEER)?;
        let api_key = config.get_str(keys::WEATHER_API_KEY)?;

        let location = if config.contains(keys::ZIP_CODE) {
            LocationQuery::Zip(config.get_str(keys::ZIP_CODE)?)
        } else if config.contains(keys::LATITUDE) || config.contains(keys::LONGITUDE) {
            LocationQuery::Coordinates {
                lat: config.get_f64(keys::LATITUDE)?,
                lon: config.get_f64(keys::LONGITUDE)?,
            }
        } else {
            return Err(ConfigError::NoLocation);
        };

        let url = |key: &str, default: &str| -> Result<String, ConfigError> {
            Ok(config.get_or(key, default)?.trim_end_matches('/').to_string())
        };

        Ok(Self {
            overseer,
            weather: WeatherSettings {
                api_key,
                location,
                weather_api_url: url(keys::WEATHER_API_URL, endpoints::WEATHER_API)?,
                geo_api_url: url(keys::GEO_API_URL, endpoints::GEO_API)?,
                alerts_api_url: url(keys::ALERTS_API_URL, endpoints::ALERTS_API)?,
                icon_url: url(keys::WEATHER_ICON_URL, endpoints::WEATHER_ICONS)?,
            },
        })
    }

    /// Base URL of the lighting controller
    pub fn overseer_url(&self) -> String {
        format!("http://{}", self.overseer.trim_end_matches('/'))
    }
}
