//! HTTP implementation of the two-phase upload broker.
//!
//! Phase (a) asks the backend for a presigned slot; phase (b) PUTs the raw
//! bytes straight to that slot. The public URL in the slot is only
//! meaningful once phase (b) succeeded.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use formdeck_core::error::{DeckError, Result};
use formdeck_core::upload::{UploadBroker, UploadSlot};

use crate::config::RemoteConfig;

/// Client for `POST /uploads/presign` plus the direct transfer.
#[derive(Clone)]
pub struct HttpUploadBroker {
    client: Client,
    config: RemoteConfig,
}

impl HttpUploadBroker {
    /// Creates a broker over the configured endpoint.
    pub fn new(config: RemoteConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl UploadBroker for HttpUploadBroker {
    async fn request_slot(&self, file_name: &str, file_type: &str) -> Result<UploadSlot> {
        let request = PresignRequest {
            file_name,
            file_type,
        };

        let response = self
            .client
            .post(self.config.presign_url())
            .json(&request)
            .send()
            .await
            .map_err(|err| DeckError::attachment(format!("presign request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(DeckError::attachment(format!(
                "presign failed: HTTP {status}: {body}"
            )));
        }

        let presigned: PresignResponse = response
            .json()
            .await
            .map_err(|err| DeckError::attachment(format!("invalid presign body: {err}")))?;
        debug!(file_name, "upload slot issued");

        Ok(UploadSlot {
            upload_target: presigned.url.url,
            public_url: presigned.url.public_url,
        })
    }

    async fn transfer(
        &self,
        upload_target: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        let response = self
            .client
            .put(upload_target)
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|err| DeckError::attachment(format!("transfer failed: {err}")))?;

        if !response.status().is_success() {
            return Err(DeckError::attachment(format!(
                "transfer rejected: HTTP {}",
                response.status()
            )));
        }
        debug!(upload_target, "upload transfer complete");
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PresignRequest<'a> {
    file_name: &'a str,
    file_type: &'a str,
}

#[derive(Deserialize)]
struct PresignResponse {
    url: PresignedSlot,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PresignedSlot {
    url: String,
    public_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presign_request_uses_camel_case_names() {
        let request = PresignRequest {
            file_name: "cat.png",
            file_type: "image/png",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["fileName"], "cat.png");
        assert_eq!(json["fileType"], "image/png");
    }

    #[test]
    fn presign_response_unwraps_nested_slot() {
        let body = r#"{"url":{"url":"https://s3/put-here","publicUrl":"https://cdn/cat.png"}}"#;
        let parsed: PresignResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.url.url, "https://s3/put-here");
        assert_eq!(parsed.url.public_url, "https://cdn/cat.png");
    }
}
