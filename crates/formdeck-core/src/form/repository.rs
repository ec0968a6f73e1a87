//! Form repository trait.
//!
//! Defines the interface to the authoritative remote store, decoupling the
//! engine from the transport. The store owns every identifier: `create` and
//! `update` return the server's canonical copy, which callers must
//! reconcile into the cache in place of whatever they sent.

use super::model::{Form, FormDraft};
use crate::error::Result;
use async_trait::async_trait;

/// An abstract repository over the remote Form store.
#[async_trait]
pub trait FormRepository: Send + Sync {
    /// Fetches every stored Form.
    async fn list_all(&self) -> Result<Vec<Form>>;

    /// Persists a new Form; the store assigns the document id and field ids.
    async fn create(&self, draft: &FormDraft) -> Result<Form>;

    /// Replaces a stored Form wholesale and returns the canonical copy
    /// (field ids re-assigned or confirmed, authoritative ordering).
    async fn update(&self, form: &Form) -> Result<Form>;

    /// Deletes a stored Form.
    async fn delete(&self, form_id: &str) -> Result<()>;
}
