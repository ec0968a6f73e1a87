//! HTTP implementation of the inference collaborator.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use formdeck_core::error::{DeckError, Result};
use formdeck_core::inference::{ChatTurn, InferenceClient};

use crate::config::RemoteConfig;

/// Client for `POST /inference/message`.
///
/// Stamps each request with an RFC 3339 timestamp and the configured model
/// tag. The message route carries a single user turn; prior turns are
/// backend-side context and are not part of its wire format.
#[derive(Clone)]
pub struct HttpInferenceClient {
    client: Client,
    config: RemoteConfig,
}

impl HttpInferenceClient {
    /// Creates a client over the configured endpoint.
    pub fn new(config: RemoteConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl InferenceClient for HttpInferenceClient {
    async fn complete(
        &self,
        _history: &[ChatTurn],
        user_input: &str,
        image_url: Option<&str>,
    ) -> Result<String> {
        let request = InferenceMessageRequest {
            user_input,
            date_time: chrono::Utc::now().to_rfc3339(),
            model: &self.config.model,
            image_url,
            lat: None,
            long: None,
        };

        let response = self
            .client
            .post(self.config.inference_url())
            .json(&request)
            .send()
            .await
            .map_err(|err| DeckError::inference(format!("request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(DeckError::inference(format!("HTTP {status}: {body}")));
        }

        let reply: InferenceMessageResponse = response
            .json()
            .await
            .map_err(|err| DeckError::inference(format!("invalid response body: {err}")))?;
        debug!(chars = reply.response.len(), "inference reply received");
        Ok(reply.response)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InferenceMessageRequest<'a> {
    user_input: &'a str,
    date_time: String,
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    long: Option<f64>,
}

#[derive(Deserialize)]
struct InferenceMessageResponse {
    response: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_with_camel_case_names() {
        let request = InferenceMessageRequest {
            user_input: "hello",
            date_time: "2024-01-01T00:00:00Z".to_string(),
            model: "gpt-4",
            image_url: Some("https://cdn.example.com/cat.png"),
            lat: None,
            long: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["userInput"], "hello");
        assert_eq!(json["dateTime"], "2024-01-01T00:00:00Z");
        assert_eq!(json["model"], "gpt-4");
        assert_eq!(json["imageUrl"], "https://cdn.example.com/cat.png");
        assert!(json.get("lat").is_none());
    }

    #[test]
    fn response_parses_reply_text() {
        let reply: InferenceMessageResponse =
            serde_json::from_str(r#"{"response":"hi there"}"#).unwrap();
        assert_eq!(reply.response, "hi there");
    }
}
