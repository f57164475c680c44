//! Blocking HTTP access shared by the lighting and weather clients
//!
//! Every request carries the dashboard's `User-Agent` and the same timeout.
//! There is no retry or backoff; callers decide what a failure means.

use std::time::Duration;

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::constants::http::{TIMEOUT_SECS, USER_AGENT};

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16, body: String },

    #[error("{url} returned an unexpected payload: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

// reqwest echoes the full URL, query string included
impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        HttpError::Transport(err.without_url())
    }
}

impl HttpError {
    /// Status code of a non-success reply
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::blocking::Client,
}

impl HttpClient {
    pub fn new() -> Result<Self, HttpError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }

    /// GET `url` with `query` and decode the JSON reply. Query values stay
    /// out of errors and logs since they may hold credentials.
    pub fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, HttpError> {
        let response = self.client.get(url).query(query).send()?;
        let status = response.status();
        let body = response.text()?;
        debug!(url, status = status.as_u16(), bytes = body.len(), "GET json");

        if !status.is_success() {
            return Err(HttpError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|source| HttpError::Decode {
            url: url.to_string(),
            source,
        })
    }

    /// GET `url` and return the raw body
    pub fn get_bytes(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }

        let bytes = response.bytes()?;
        debug!(url, bytes = bytes.len(), "GET bytes");
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Reply {
        name: String,
    }

    #[test]
    fn test_get_json_sends_user_agent_and_query() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/thing")
            .match_header("user-agent", USER_AGENT)
            .match_query(Matcher::UrlEncoded("units".into(), "imperial".into()))
            .with_header("content-type", "application/json")
            .with_body(r#"{"name": "porch"}"#)
            .create();

        let client = HttpClient::new().unwrap();
        let reply: Reply = client
            .get_json(&format!("{}/thing", server.url()), &[("units", "imperial")])
            .unwrap();

        assert_eq!(reply, Reply { name: "porch".to_string() });
        mock.assert();
    }

    #[test]
    fn test_non_success_status_is_reported() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/weather")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"cod": 401, "message": "Invalid API key"}"#)
            .create();

        let client = HttpClient::new().unwrap();
        let err = client
            .get_json::<Reply>(&format!("{}/weather", server.url()), &[("appid", "secret")])
            .unwrap_err();

        assert_eq!(err.status(), Some(401));
        assert!(!err.to_string().contains("secret"));
    }

    #[test]
    fn test_transport_error_hides_query() {
        let client = HttpClient::new().unwrap();
        let err = client
            .get_json::<Reply>("http://127.0.0.1:9/data/weather", &[("appid", "s3cret-key")])
            .unwrap_err();

        assert!(matches!(err, HttpError::Transport(_)));
        assert_eq!(err.status(), None);
        assert!(!err.to_string().contains("s3cret-key"));
        assert!(!format!("{err:?}").contains("s3cret-key"));
    }

    #[test]
    fn test_decode_failure() {
        let mut server = mockito::Server::new();
        let _mock = server.mock("GET", "/thing").with_body("<html>").create();

        let client = HttpClient::new().unwrap();
        let err = client
            .get_json::<Reply>(&format!("{}/thing", server.url()), &[])
            .unwrap_err();
        assert!(matches!(err, HttpError::Decode { .. }));
    }

    #[test]
    fn test_get_bytes() {
        let mut server = mockito::Server::new();
        let _found = server.mock("GET", "/img/01d@2x.png").with_body([1u8, 2, 3]).create();
        let _missing = server.mock("GET", "/img/missing@2x.png").with_status(404).create();

        let client = HttpClient::new().unwrap();
        assert_eq!(
            client.get_bytes(&format!("{}/img/01d@2x.png", server.url())).unwrap(),
            vec![1, 2, 3]
        );
        assert_eq!(
            client
                .get_bytes(&format!("{}/img/missing@2x.png", server.url()))
                .unwrap_err()
                .status(),
            Some(404)
        );
    }
}
