//! Application-wide constants
//!
//! Paths, endpoints, refresh intervals and the temperature colour scale live
//! here so the rest of the code never hard-codes them.

/// Files and directories, relative to the working directory unless noted
pub mod paths {
    /// Downloaded weather icons, `cache/<icon>.png`
    pub const ICON_CACHE_DIR: &str = "cache";

    /// Config store looked up in the working directory first
    pub const CONFIG_FILE: &str = "config.json";

    /// Directory under the platform config dir used as the config fallback
    pub const APP_DIR: &str = "overseer-dashboard";

    /// Optional override of the built-in main layout
    pub const UI_FILE: &str = "ui.txt";

    /// Optional override of the built-in style sheet
    pub const STYLES_FILE: &str = "styles.css";
}

/// HTTP client settings
pub mod http {
    /// Identifying header sent with every request
    pub const USER_AGENT: &str = "Overseer Dashboard";

    /// Upper bound on how long one blocking request may stall the UI thread
    pub const TIMEOUT_SECS: u64 = 10;
}

/// Config store keys
pub mod keys {
    pub const OVERSEER: &str = "overseer";
    pub const WEATHER_API_KEY: &str = "weather-api-key";
    pub const ZIP_CODE: &str = "zip-code";
    pub const LATITUDE: &str = "latitude";
    pub const LONGITUDE: &str = "longitude";
    pub const WEATHER_API_URL: &str = "weather-api-url";
    pub const GEO_API_URL: &str = "geo-api-url";
    pub const ALERTS_API_URL: &str = "alerts-api-url";
    pub const WEATHER_ICON_URL: &str = "weather-icon-url";
}

/// Default provider endpoints, each overridable from the config store
pub mod endpoints {
    /// Current conditions (`/weather`) and 5-day/3-hour forecast (`/forecast`)
    pub const WEATHER_API: &str = "https://api.openweathermap.org/data/2.5";

    /// Zip and reverse geocoding (`/zip`, `/reverse`)
    pub const GEO_API: &str = "https://api.openweathermap.org/geo/1.0";

    /// Active alerts keyed by `point=lat,lon`
    pub const ALERTS_API: &str = "https://api.weather.gov/alerts/active";

    /// Icon bitmaps, `<base>/<icon>@2x.png`
    pub const WEATHER_ICONS: &str = "https://openweathermap.org/img/wn";

    /// Unit system requested from the provider
    pub const UNITS: &str = "imperial";
}

/// Refresh cadence of the dashboard timers
pub mod intervals {
    /// Clock labels
    pub const CLOCK_SECS: u64 = 1;

    /// Weather reports only change every ten minutes upstream
    pub const WEATHER_SECS: u64 = 300;

    /// Lights can be switched from elsewhere, so poll them
    pub const LIGHTS_SECS: u64 = 10;
}

/// Forecast presentation
pub mod forecast {
    /// Upcoming days shown below today, not counting today
    pub const DAYS_SHOWN: usize = 5;

    /// Look-ahead window for the precipitation messages
    pub const PRECIP_WINDOW_HOURS: i64 = 24;

    /// Edge length of forecast-day icons
    pub const DAY_ICON_SIZE: u32 = 50;

    /// Edge length of period-detail icons
    pub const PERIOD_ICON_SIZE: u32 = 75;

    pub const MM_PER_INCH: f64 = 25.4;
}

/// Temperature colour scale: the first band whose bound the temperature
/// exceeds wins, anything colder gets [`COLDEST`](temperature::COLDEST)
pub mod temperature {
    pub const SCALE: &[(f64, &str)] = &[
        (100.0, "cc006c"),
        (90.0, "fe3300"),
        (80.0, "fe6601"),
        (70.0, "fe8a33"),
        (60.0, "ffbf00"),
        (50.0, "fdff00"),
        (40.0, "3fff6e"),
        (30.0, "34cbc6"),
        (20.0, "35cbcb"),
        (10.0, "009afe"),
        (0.0, "2f34c9"),
        (-10.0, "6a00ce"),
        (-20.0, "9901f6"),
        (-30.0, "cd98fe"),
    ];

    pub const COLDEST: &str = "e3e1ed";
}
