//! Client for the overseer lighting controller

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::http::{HttpClient, HttpError};

#[derive(Debug, Error)]
pub enum LightsError {
    #[error("overseer rejected the request: {0} (does overseer trust this device?)")]
    Rejected(String),

    #[error("no light with id '{0}'")]
    UnknownLight(String),

    #[error(transparent)]
    Http(#[from] HttpError),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Light {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    pub on: bool,
}

/// Body of `/lights/info` and `/lights/toggle/<id>`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LightsReply {
    Failure { error: Value },
    Lights(Vec<Light>),
}

/// Ids are numeric strings; tolerate controllers that send bare numbers
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid light id {other}"))),
    }
}

fn reason(error: &Value) -> String {
    match error {
        Value::String(message) => message.clone(),
        other => other.to_string(),
    }
}

/// Cached light states. Only `refresh` and `toggle` change the cache, and
/// a failure of either leaves it as it was.
#[derive(Debug)]
pub struct Lights {
    http: HttpClient,
    base_url: String,
    lights: Vec<Light>,
}

impl Lights {
    /// `base_url` is `http://<overseer>`; nothing is fetched until the first refresh
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            lights: Vec::new(),
        }
    }

    /// Replace the cache from `reply`, or from a fresh `/lights/info` fetch
    pub fn refresh(&mut self, reply: Option<LightsReply>) -> Result<(), LightsError> {
        let reply = match reply {
            Some(reply) => reply,
            None => self
                .http
                .get_json(&format!("{}/lights/info", self.base_url), &[])?,
        };

        match reply {
            LightsReply::Failure { error } => Err(LightsError::Rejected(reason(&error))),
            LightsReply::Lights(lights) => {
                debug!(count = lights.len(), "refreshed lights");
                self.lights = lights;
                Ok(())
            }
        }
    }

    /// Toggle one light and take the new states from the reply
    pub fn toggle(&mut self, id: &str) -> Result<(), LightsError> {
        let light = self
            .find(id)
            .ok_or_else(|| LightsError::UnknownLight(id.to_string()))?;
        info!(id, name = %light.name, "toggling {id} ({})", light.name);

        let reply: LightsReply = self
            .http
            .get_json(&format!("{}/lights/toggle/{id}", self.base_url), &[])?;
        self.refresh(Some(reply))
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn find(&self, id: &str) -> Option<&Light> {
        self.lights.iter().find(|light| light.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_LIGHTS: &str = r#"[
        {"id": "1", "name": "Porch", "on": false},
        {"id": 2, "name": "Kitchen", "on": true}
    ]"#;

    fn lights_for(server: &mockito::Server) -> Lights {
        Lights::new(HttpClient::new().unwrap(), server.url())
    }

    #[test]
    fn test_refresh_fetches_info() {
        let mut server = mockito::Server::new();
        let mock = server.mock("GET", "/lights/info").with_body(TWO_LIGHTS).create();

        let mut lights = lights_for(&server);
        lights.refresh(None).unwrap();
        mock.assert();

        assert_eq!(lights.lights().len(), 2);
        assert_eq!(lights.lights()[1].id, "2");
        assert!(lights.find("2").unwrap().on);
    }

    #[test]
    fn test_error_reply_keeps_state() {
        let mut server = mockito::Server::new();
        let _info = server.mock("GET", "/lights/info").with_body(TWO_LIGHTS).create();

        let mut lights = lights_for(&server);
        lights.refresh(None).unwrap();

        let reply: LightsReply = serde_json::from_str(r#"{"error": "untrusted device"}"#).unwrap();
        let err = lights.refresh(Some(reply)).unwrap_err();
        assert!(matches!(err, LightsError::Rejected(ref reason) if reason == "untrusted device"));
        assert_eq!(lights.lights().len(), 2);
    }

    #[test]
    fn test_toggle_refreshes_from_reply_without_second_request() {
        let mut server = mockito::Server::new();
        let info = server
            .mock("GET", "/lights/info")
            .with_body(TWO_LIGHTS)
            .expect(1)
            .create();
        let toggle = server
            .mock("GET", "/lights/toggle/1")
            .with_body(r#"[{"id": "1", "name": "Porch", "on": true}, {"id": "2", "name": "Kitchen", "on": true}]"#)
            .expect(1)
            .create();

        let mut lights = lights_for(&server);
        lights.refresh(None).unwrap();
        lights.toggle("1").unwrap();

        assert!(lights.find("1").unwrap().on);
        info.assert();
        toggle.assert();
    }

    #[test]
    fn test_toggle_error_keeps_state() {
        let mut server = mockito::Server::new();
        let _info = server.mock("GET", "/lights/info").with_body(TWO_LIGHTS).create();
        let _toggle = server
            .mock("GET", "/lights/toggle/2")
            .with_body(r#"{"error": "light offline"}"#)
            .create();

        let mut lights = lights_for(&server);
        lights.refresh(None).unwrap();
        assert!(matches!(lights.toggle("2"), Err(LightsError::Rejected(_))));
        assert!(lights.find("2").unwrap().on);
    }

    #[test]
    fn test_toggle_unknown_light_sends_nothing() {
        let mut server = mockito::Server::new();
        let toggle = server.mock("GET", "/lights/toggle/9").expect(0).create();

        let mut lights = lights_for(&server);
        assert!(matches!(lights.toggle("9"), Err(LightsError::UnknownLight(ref id)) if id == "9"));
        toggle.assert();
    }

    #[test]
    fn test_transport_failure_keeps_state() {
        let mut server = mockito::Server::new();
        let _info = server.mock("GET", "/lights/info").with_status(500).create();

        let mut lights = lights_for(&server);
        assert!(matches!(lights.refresh(None), Err(LightsError::Http(_))));
        assert!(lights.lights().is_empty());
    }
}
