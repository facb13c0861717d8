use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::editor::Language;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Backend operation. The all-in-one flow is composed client-side from
/// Debug + Analyze, so it has no endpoint of its own here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Debug,
    Analyze,
    Convert,
}

impl Action {
    pub fn path(&self) -> &'static str {
        match self {
            Action::Debug => "/api/debug",
            Action::Analyze => "/api/analyze",
            Action::Convert => "/api/convert",
        }
    }
}

/// Outbound request state, captured from the editor when a trigger is
/// accepted.
#[derive(Debug, Clone)]
pub struct RequestPayload {
    pub code: String,
    pub source_lang: Language,
    pub target_lang: Option<Language>,
}

#[derive(Serialize)]
struct WireRequest<'a> {
    code: &'a str,
    source_lang: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_lang: Option<&'a str>,
}

impl RequestPayload {
    fn to_wire(&self) -> WireRequest<'_> {
        WireRequest {
            code: &self.code,
            source_lang: self.source_lang.as_str(),
            target_lang: self.target_lang.map(|l| l.as_str()),
        }
    }
}

/// Every endpoint shares one response shape; each action fills in its own
/// subset of fields. Missing fields default to None rather than failing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponsePayload {
    pub summary: Option<String>,
    pub fixed_code: Option<String>,
    pub time_complexity: Option<String>,
    pub space_complexity: Option<String>,
    pub explanation: Option<String>,
    pub converted_code: Option<String>,
}

/// Result of one dispatched request. Failures carry a human-readable
/// description; the dispatcher never lets an error escape its boundary.
#[derive(Debug, Clone)]
pub enum Outcome {
    Success(ResponsePayload),
    Failure(String),
}

#[derive(Debug, Error)]
enum DispatchError {
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Transport(reqwest::Error),
    #[error("backend returned {0}")]
    Status(reqwest::StatusCode),
    #[error("invalid response: {0}")]
    Decode(reqwest::Error),
}

impl DispatchError {
    fn from_send(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DispatchError::Timeout
        } else {
            DispatchError::Transport(err)
        }
    }
}

#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn send(&self, action: Action, payload: RequestPayload) -> Outcome;
}

/// HTTP client for the analysis backend. One non-retried POST per call,
/// bounded by a 30s timeout.
#[derive(Clone)]
pub struct MentorClient {
    client: Client,
    base_url: String,
}

impl MentorClient {
    pub fn new(base_url: &str) -> reqwest::Result<Self> {
        // Propagate builder failures; a default client would lose the
        // request timeout bound.
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post(
        &self,
        action: Action,
        payload: &RequestPayload,
    ) -> Result<ResponsePayload, DispatchError> {
        let url = format!("{}{}", self.base_url, action.path());

        let response = self
            .client
            .post(&url)
            .json(&payload.to_wire())
            .send()
            .await
            .map_err(DispatchError::from_send)?;

        if !response.status().is_success() {
            return Err(DispatchError::Status(response.status()));
        }

        response.json().await.map_err(DispatchError::Decode)
    }
}

#[async_trait]
impl Dispatcher for MentorClient {
    async fn send(&self, action: Action, payload: RequestPayload) -> Outcome {
        tracing::debug!(path = action.path(), lang = payload.source_lang.as_str(), "dispatching");
        match self.post(action, &payload).await {
            Ok(response) => Outcome::Success(response),
            Err(err) => {
                tracing::warn!(path = action.path(), %err, "request failed");
                Outcome::Failure(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_paths() {
        assert_eq!(Action::Debug.path(), "/api/debug");
        assert_eq!(Action::Analyze.path(), "/api/analyze");
        assert_eq!(Action::Convert.path(), "/api/convert");
    }

    #[test]
    fn test_wire_request_omits_missing_target() {
        let payload = RequestPayload {
            code: "x = 1".to_string(),
            source_lang: Language::Python,
            target_lang: None,
        };
        let json = serde_json::to_value(payload.to_wire()).unwrap();
        assert_eq!(json["code"], "x = 1");
        assert_eq!(json["source_lang"], "python");
        assert!(json.get("target_lang").is_none());
    }

    #[test]
    fn test_wire_request_includes_target_when_set() {
        let payload = RequestPayload {
            code: "x = 1".to_string(),
            source_lang: Language::Python,
            target_lang: Some(Language::Rust),
        };
        let json = serde_json::to_value(payload.to_wire()).unwrap();
        assert_eq!(json["target_lang"], "rust");
    }

    #[test]
    fn test_response_defaults_missing_fields() {
        let response: ResponsePayload = serde_json::from_str("{}").unwrap();
        assert!(response.summary.is_none());
        assert!(response.fixed_code.is_none());
        assert!(response.converted_code.is_none());
    }

    #[test]
    fn test_client_construction_succeeds() {
        assert!(MentorClient::new("http://localhost:8000").is_ok());
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = MentorClient::new("http://localhost:8000/").unwrap();
        assert_eq!(client.base_url, "http://localhost:8000");
    }
}
