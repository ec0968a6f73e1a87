//! HTTP implementation of the Form store.
//!
//! Plain REST CRUD over `/versions`. Every error is tagged with the
//! operation that failed so the engine can surface "update failed" rather
//! than a bare transport message. No retries here: the store assigns field
//! ids during persist, so a blind replay of a half-applied write could
//! duplicate them.

use async_trait::async_trait;
use reqwest::{Client, Response};
use tracing::debug;

use formdeck_core::error::{DeckError, Result};
use formdeck_core::form::{Form, FormDraft, FormRepository};

use crate::config::RemoteConfig;

/// reqwest-backed [`FormRepository`].
#[derive(Clone)]
pub struct HttpFormRepository {
    client: Client,
    config: RemoteConfig,
}

impl HttpFormRepository {
    /// Creates a repository over the configured endpoints.
    pub fn new(config: RemoteConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    async fn expect_success(operation: &str, response: Response) -> Result<Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        Err(DeckError::remote_sync(
            operation,
            format!("HTTP {status}: {body}"),
        ))
    }
}

#[async_trait]
impl FormRepository for HttpFormRepository {
    async fn list_all(&self) -> Result<Vec<Form>> {
        let operation = "list";
        let response = self
            .client
            .get(self.config.versions_url())
            .send()
            .await
            .map_err(|err| DeckError::remote_sync(operation, err.to_string()))?;
        let response = Self::expect_success(operation, response).await?;

        let forms: Vec<Form> = response.json().await.map_err(|err| {
            DeckError::remote_sync(operation, format!("invalid response body: {err}"))
        })?;
        debug!(count = forms.len(), "fetched versions");
        Ok(forms)
    }

    async fn create(&self, draft: &FormDraft) -> Result<Form> {
        let operation = "create";
        let response = self
            .client
            .post(self.config.versions_url())
            .json(draft)
            .send()
            .await
            .map_err(|err| DeckError::remote_sync(operation, err.to_string()))?;
        let response = Self::expect_success(operation, response).await?;

        let form: Form = response.json().await.map_err(|err| {
            DeckError::remote_sync(operation, format!("invalid response body: {err}"))
        })?;
        debug!(form_id = %form.id, version = form.version, "created version");
        Ok(form)
    }

    async fn update(&self, form: &Form) -> Result<Form> {
        let operation = "update";
        let response = self
            .client
            .put(self.config.version_url(&form.id))
            .json(form)
            .send()
            .await
            .map_err(|err| DeckError::remote_sync(operation, err.to_string()))?;
        let response = Self::expect_success(operation, response).await?;

        let canonical: Form = response.json().await.map_err(|err| {
            DeckError::remote_sync(operation, format!("invalid response body: {err}"))
        })?;
        debug!(form_id = %canonical.id, "updated version");
        Ok(canonical)
    }

    async fn delete(&self, form_id: &str) -> Result<()> {
        let operation = "delete";
        let response = self
            .client
            .delete(self.config.version_url(form_id))
            .send()
            .await
            .map_err(|err| DeckError::remote_sync(operation, err.to_string()))?;
        Self::expect_success(operation, response).await?;
        debug!(%form_id, "deleted version");
        Ok(())
    }
}
