//! Weather client: location lookup, current conditions, the 5-day/3-hour
//! forecast, active alerts and the on-disk icon cache

pub mod api;
pub mod forecast;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, Local, NaiveDate, Offset, TimeZone, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{LocationQuery, WeatherSettings};
use crate::constants::endpoints::UNITS;
use crate::http::{HttpClient, HttpError};
use api::{AlertsReply, CurrentReply, ForecastReply, PlaceReply, ZipReply};
pub use forecast::{Condition, Current, DayAggregate, Period, Precipitation};

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("the weather provider rejected the API key")]
    Unauthorized,

    #[error("no place found for {0}")]
    UnknownLocation(String),

    #[error("provider sent an out-of-range timestamp {0}")]
    BadTimestamp(i64),

    #[error("failed to cache icon {}: {source}", path.display())]
    Icon {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Http(HttpError),
}

impl From<HttpError> for WeatherError {
    fn from(err: HttpError) -> Self {
        match err.status() {
            Some(401) => WeatherError::Unauthorized,
            _ => WeatherError::Http(err),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    /// `City, State`
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub headline: String,
    pub description: String,
}

/// What the dashboard shows for today
#[derive(Debug, Clone, PartialEq)]
pub struct Today {
    pub temp: f64,
    pub low: f64,
    pub high: f64,
    pub condition: Condition,
}

#[derive(Debug)]
pub struct Weather {
    http: HttpClient,
    settings: WeatherSettings,
    icon_dir: PathBuf,
    location: Option<Location>,
    offset: FixedOffset,
    current: Option<Current>,
    periods: Vec<Period>,
    days: Vec<DayAggregate>,
    alerts: Vec<Alert>,
    updated: Option<DateTime<Local>>,
}

impl Weather {
    pub fn new(http: HttpClient, settings: WeatherSettings, icon_dir: impl Into<PathBuf>) -> Self {
        Self {
            http,
            settings,
            icon_dir: icon_dir.into(),
            location: None,
            offset: Utc.fix(),
            current: None,
            periods: Vec::new(),
            days: Vec::new(),
            alerts: Vec::new(),
            updated: None,
        }
    }

    /// Fetch everything again. The location is looked up once and kept.
    /// On failure the previous data stays in place.
    pub fn refresh(&mut self) -> Result<(), WeatherError> {
        let location = match &self.location {
            Some(location) => location.clone(),
            None => {
                let location = self.locate()?;
                info!(name = %location.name, lat = location.lat, lon = location.lon, "resolved weather location");
                self.location = Some(location.clone());
                location
            }
        };

        let (lat, lon) = (location.lat.to_string(), location.lon.to_string());
        let query = [
            ("lat", lat.as_str()),
            ("lon", lon.as_str()),
            ("units", UNITS),
            ("appid", self.settings.api_key.as_str()),
        ];

        let current: CurrentReply = self
            .http
            .get_json(&format!("{}/weather", self.settings.weather_api_url), &query)?;
        let forecast: ForecastReply = self
            .http
            .get_json(&format!("{}/forecast", self.settings.weather_api_url), &query)?;

        let offset = FixedOffset::east_opt(forecast.city.timezone)
            .or_else(|| FixedOffset::east_opt(current.timezone))
            .unwrap_or(self.offset);
        let current = Current {
            time: offset
                .timestamp_opt(current.dt, 0)
                .single()
                .ok_or(WeatherError::BadTimestamp(current.dt))?,
            temp: current.main.temp,
            condition: Condition::from_blocks(&current.weather),
        };
        let periods: Vec<Period> = forecast
            .list
            .iter()
            .map(|entry| Period::from_entry(entry, offset).ok_or(WeatherError::BadTimestamp(entry.dt)))
            .collect::<Result<_, _>>()?;

        self.alerts = self.fetch_alerts(&location).unwrap_or_else(|err| {
            warn!(error = %err, "failed to fetch weather alerts, assuming none");
            Vec::new()
        });
        self.days = forecast::aggregate_days(&periods, Some(&current));
        self.offset = offset;
        self.current = Some(current);
        self.periods = periods;
        self.updated = Some(Local::now());
        debug!(
            periods = self.periods.len(),
            days = self.days.len(),
            alerts = self.alerts.len(),
            "refreshed weather"
        );

        self.cache_icons();
        Ok(())
    }

    fn locate(&self) -> Result<Location, WeatherError> {
        let geo = &self.settings.geo_api_url;
        let key = self.settings.api_key.as_str();

        let (lat, lon, fallback) = match &self.settings.location {
            LocationQuery::Coordinates { lat, lon } => (*lat, *lon, None),
            LocationQuery::Zip(zip) => {
                let reply: ZipReply = self
                    .http
                    .get_json(&format!("{geo}/zip"), &[("zip", zip.as_str()), ("appid", key)])?;
                let fallback = format!("{}, {}", reply.name, reply.country);
                (reply.lat, reply.lon, Some(fallback))
            }
        };

        let (lat_text, lon_text) = (lat.to_string(), lon.to_string());
        let places: Vec<PlaceReply> = self.http.get_json(
            &format!("{geo}/reverse"),
            &[
                ("lat", lat_text.as_str()),
                ("lon", lon_text.as_str()),
                ("limit", "1"),
                ("appid", key),
            ],
        )?;

        let name = match places.first() {
            Some(place) => {
                let region = place.state.as_deref().unwrap_or(place.country.as_str());
                format!("{}, {region}", place.name)
            }
            None => fallback.ok_or_else(|| WeatherError::UnknownLocation(format!("{lat},{lon}")))?,
        };
        Ok(Location { name, lat, lon })
    }

    fn fetch_alerts(&self, location: &Location) -> Result<Vec<Alert>, HttpError> {
        let point = format!("{:.4},{:.4}", location.lat, location.lon);
        let reply: AlertsReply = self
            .http
            .get_json(&self.settings.alerts_api_url, &[("point", point.as_str())])?;

        Ok(reply
            .features
            .into_iter()
            .map(|feature| Alert {
                headline: feature.properties.headline.unwrap_or_default(),
                description: feature.properties.description.unwrap_or_default(),
            })
            .collect())
    }

    /// Download every icon the current data refers to that is not on disk yet
    fn cache_icons(&self) {
        let mut icons: Vec<&str> = Vec::new();
        let conditions = self
            .current
            .iter()
            .map(|current| &current.condition)
            .chain(self.days.iter().map(|day| &day.condition))
            .chain(self.periods.iter().map(|period| &period.condition));
        for condition in conditions {
            if !icons.contains(&condition.icon.as_str()) {
                icons.push(&condition.icon);
            }
        }

        for icon in icons {
            if let Err(err) = self.cache_icon(icon) {
                warn!(icon, error = %err, "failed to cache weather icon");
            }
        }
    }

    /// Path of the cached icon, fetching it first if the file does not exist
    pub fn cache_icon(&self, icon: &str) -> Result<PathBuf, WeatherError> {
        let path = icon_path(&self.icon_dir, icon);
        if path.exists() {
            return Ok(path);
        }

        let bytes = self
            .http
            .get_bytes(&format!("{}/{icon}@2x.png", self.settings.icon_url))?;
        fs::write(&path, bytes).map_err(|source| WeatherError::Icon {
            path: path.clone(),
            source,
        })?;
        debug!(icon, path = %path.display(), "cached weather icon");
        Ok(path)
    }

    pub fn location_name(&self) -> &str {
        self.location.as_ref().map_or("", |location| location.name.as_str())
    }

    pub fn updated(&self) -> Option<DateTime<Local>> {
        self.updated
    }

    pub fn today(&self) -> Option<Today> {
        let current = self.current.as_ref()?;
        let day = self.days.first()?;
        Some(Today {
            temp: current.temp,
            low: day.low,
            high: day.high,
            condition: current.condition.clone(),
        })
    }

    /// Today first, then each following day
    pub fn days(&self) -> &[DayAggregate] {
        &self.days
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    /// Current time at the forecast location
    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }

    pub fn periods_by_day(&self, day: Option<NaiveDate>) -> Option<Vec<Period>> {
        forecast::periods_by_day(&self.periods, day, self.now())
    }

    pub fn upcoming_precip_messages(&self) -> Vec<String> {
        forecast::upcoming_precip_messages(&self.periods, self.now())
    }
}

pub fn icon_path(icon_dir: &Path, icon: &str) -> PathBuf {
    icon_dir.join(format!("{icon}.png"))
}
