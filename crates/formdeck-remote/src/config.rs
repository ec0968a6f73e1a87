//! Endpoint configuration for the remote collaborators.
//!
//! Supports explicit construction or resolution from environment
//! variables (`FORMDECK_API_URL`, `FORMDECK_MODEL`).

use std::env;

const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_MODEL: &str = "gpt-4";

/// Where the three collaborator endpoints live and which model inference
/// requests name.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL all routes are derived from, without a trailing slash.
    pub base_url: String,
    /// Model tag sent with inference requests.
    pub model: String,
}

impl RemoteConfig {
    /// Creates a config pointing at the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Resolves the config from `FORMDECK_API_URL` and `FORMDECK_MODEL`,
    /// falling back to the local development defaults.
    pub fn from_env() -> Self {
        let base_url = env::var("FORMDECK_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let mut config = Self::new(base_url);
        if let Ok(model) = env::var("FORMDECK_MODEL") {
            config.model = model;
        }
        config
    }

    /// Overrides the model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub(crate) fn versions_url(&self) -> String {
        format!("{}/versions", self.base_url)
    }

    pub(crate) fn version_url(&self, id: &str) -> String {
        format!("{}/versions/{id}", self.base_url)
    }

    pub(crate) fn inference_url(&self) -> String {
        format!("{}/inference/message", self.base_url)
    }

    pub(crate) fn presign_url(&self) -> String {
        format!("{}/uploads/presign", self.base_url)
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
