//! Provider reply shapes. Only the fields the dashboard reads are declared.

use serde::Deserialize;

/// `/zip?zip=<code>`
#[derive(Debug, Clone, Deserialize)]
pub struct ZipReply {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub country: String,
}

/// One entry of `/reverse?lat=..&lon=..`
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceReply {
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MainBlock {
    pub temp: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConditionBlock {
    pub main: String,
    pub description: String,
    pub icon: String,
}

/// Precipitation volume in millimetres over the last one or three hours
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VolumeBlock {
    #[serde(rename = "1h")]
    pub one_hour: Option<f64>,
    #[serde(rename = "3h")]
    pub three_hours: Option<f64>,
}

impl VolumeBlock {
    pub fn millimetres(&self) -> f64 {
        self.three_hours.or(self.one_hour).unwrap_or(0.0)
    }
}

/// `/weather`
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentReply {
    pub dt: i64,
    pub main: MainBlock,
    pub weather: Vec<ConditionBlock>,
    /// Offset from UTC in seconds
    #[serde(default)]
    pub timezone: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastEntry {
    pub dt: i64,
    pub main: MainBlock,
    pub weather: Vec<ConditionBlock>,
    #[serde(default)]
    pub rain: Option<VolumeBlock>,
    #[serde(default)]
    pub snow: Option<VolumeBlock>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CityBlock {
    #[serde(default)]
    pub timezone: i32,
}

/// `/forecast`: 5 days of 3-hour periods
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastReply {
    pub list: Vec<ForecastEntry>,
    pub city: CityBlock,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlertProperties {
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlertFeature {
    pub properties: AlertProperties,
}

/// Active alerts for a point
#[derive(Debug, Clone, Deserialize)]
pub struct AlertsReply {
    #[serde(default)]
    pub features: Vec<AlertFeature>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forecast_entry_with_and_without_precipitation() {
        let reply: ForecastReply = serde_json::from_str(
            r#"{
                "list": [
                    {"dt": 1700000000, "main": {"temp": 41.2, "humidity": 80},
                     "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10n"}],
                     "rain": {"3h": 2.54}},
                    {"dt": 1700010800, "main": {"temp": 39.0},
                     "weather": [{"id": 800, "main": "Clear", "description": "clear sky", "icon": "01n"}]}
                ],
                "city": {"name": "Minneapolis", "timezone": -21600}
            }"#,
        )
        .unwrap();

        assert_eq!(reply.city.timezone, -21600);
        assert_eq!(reply.list[0].rain.as_ref().unwrap().millimetres(), 2.54);
        assert!(reply.list[1].rain.is_none());
    }

    #[test]
    fn test_alerts_tolerate_missing_fields() {
        let reply: AlertsReply = serde_json::from_str(
            r#"{"type": "FeatureCollection", "features": [{"properties": {"headline": "Wind Advisory"}}]}"#,
        )
        .unwrap();
        assert_eq!(reply.features[0].properties.headline.as_deref(), Some("Wind Advisory"));
        assert_eq!(reply.features[0].properties.description, None);

        let empty: AlertsReply = serde_json::from_str("{}").unwrap();
        assert!(empty.features.is_empty());
    }
}
