//! Error types for the Formdeck engine.

use serde::Serialize;
use thiserror::Error;

/// A shared error type for every Formdeck operation.
///
/// Each variant is scoped to the operation that raised it; nothing here is
/// fatal to the process. Variants carry enough structure for callers to
/// branch on without parsing messages.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum DeckError {
    /// Entity not found (unknown form id, stale selection). Recovered
    /// locally as a no-op by callers.
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Version numbering collision that survived the single allowed retry.
    #[error("Version allocation failed: {0}")]
    VersionAllocation(String),

    /// A create/update/delete against the remote store failed. Optimistic
    /// state has already been rolled back when this surfaces.
    #[error("Remote sync failed during {operation}: {message}")]
    RemoteSync { operation: String, message: String },

    /// Either phase of the two-phase upload failed. Attachment state has
    /// been cleared when this surfaces.
    #[error("Attachment upload failed: {0}")]
    Attachment(String),

    /// A local precondition was violated; refused before any network call.
    #[error("Precondition violated: {0}")]
    Precondition(String),

    /// The inference backend returned an error or an unusable reply.
    #[error("Inference call failed: {0}")]
    Inference(String),

    /// Serialization/deserialization error at a wire boundary.
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error (bad endpoint URL, missing setting).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal invariant violation (should not happen in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DeckError {
    /// Creates a NotFound error.
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a RemoteSync error tagged with the failing operation.
    pub fn remote_sync(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RemoteSync {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Creates a Precondition error.
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    /// Creates an Attachment error.
    pub fn attachment(message: impl Into<String>) -> Self {
        Self::Attachment(message.into())
    }

    /// Creates an Inference error.
    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference(message.into())
    }

    /// Creates a Config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a NotFound error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a Precondition error.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_))
    }

    /// Check if this is a RemoteSync error.
    pub fn is_remote_sync(&self) -> bool {
        matches!(self, Self::RemoteSync { .. })
    }

    /// Check if this is an Attachment error.
    pub fn is_attachment(&self) -> bool {
        matches!(self, Self::Attachment(_))
    }
}

impl From<serde_json::Error> for DeckError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, DeckError>`.
pub type Result<T> = std::result::Result<T, DeckError>;
