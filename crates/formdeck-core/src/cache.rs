//! In-memory version cache.
//!
//! The single source of truth for the UI layer: a mapping of document id to
//! Form, the current selection pointer, and the version watermark. The
//! cache is a plain synchronous container; the sync engine wraps it in
//! `Arc<RwLock<..>>` and funnels every access through these operations.
//!
//! Two rules shape the API:
//! - optimistic applies hand back the pre-mutation snapshot so a failed
//!   remote call can roll the entry back, and
//! - the server's echo always wins (`commit_remote`), because it carries
//!   the authoritative identifiers and ordering.

use std::collections::HashMap;

use crate::error::{DeckError, Result};
use crate::form::{self, Form};

/// Watermark before any Forms have been loaded.
const INITIAL_WATERMARK: f64 = 1.0;

/// Holds every known Form plus the current selection and the version
/// watermark.
#[derive(Debug, Clone)]
pub struct VersionCache {
    documents: HashMap<String, Form>,
    selection: Option<String>,
    watermark: f64,
}

impl VersionCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            documents: HashMap::new(),
            selection: None,
            watermark: INITIAL_WATERMARK,
        }
    }

    /// Replaces the mapping wholesale after a full remote fetch.
    ///
    /// Every Form's fields are re-sorted, the maximum-version Form becomes
    /// the selection, and the watermark adopts that maximum. An empty fetch
    /// clears the mapping and the selection; the watermark keeps its value
    /// so previously issued numbers are not re-used.
    pub fn load(&mut self, forms: Vec<Form>) {
        self.documents = forms
            .into_iter()
            .map(|mut f| {
                f.fields = form::sorted_by_id(&f.fields);
                (f.id.clone(), f)
            })
            .collect();

        self.selection = self.highest_version_id();
        if let Some(max) = self
            .documents
            .values()
            .map(|f| f.version)
            .max_by(f64::total_cmp)
        {
            self.watermark = self.watermark.max(max);
        }
    }

    /// Sets the selection to `id` when it names a cached Form.
    ///
    /// An unknown id leaves the selection unchanged and reports NotFound;
    /// callers treat that as a no-op, not a crash.
    pub fn select(&mut self, id: &str) -> Result<()> {
        if !self.documents.contains_key(id) {
            return Err(DeckError::not_found("Form", id));
        }
        self.selection = Some(id.to_string());
        Ok(())
    }

    /// Applies `mutator` optimistically and stores the result immediately.
    ///
    /// Returns `(snapshot, updated)` so the caller can roll back when the
    /// remote store rejects the write.
    pub fn apply_local<F>(&mut self, id: &str, mutator: F) -> Result<(Form, Form)>
    where
        F: FnOnce(&Form) -> Form,
    {
        let current = self
            .documents
            .get(id)
            .ok_or_else(|| DeckError::not_found("Form", id))?;
        let snapshot = current.clone();
        let updated = mutator(current);
        self.documents.insert(id.to_string(), updated.clone());
        Ok((snapshot, updated))
    }

    /// Replaces the cached entry with the server-returned copy.
    ///
    /// The server copy always wins over any optimistic state: it carries
    /// the authoritative identifiers. Fields are re-sorted on the way in,
    /// and a Form the cache has never seen (fresh create) is inserted.
    pub fn commit_remote(&mut self, mut remote: Form) -> Form {
        remote.fields = form::sorted_by_id(&remote.fields);
        self.documents.insert(remote.id.clone(), remote.clone());
        remote
    }

    /// Restores a pre-mutation snapshot after a failed remote call.
    pub fn rollback(&mut self, id: &str, snapshot: Form) {
        self.documents.insert(id.to_string(), snapshot);
    }

    /// Drops a Form from the cache.
    ///
    /// When the dropped Form was selected, the highest-version remainder
    /// takes over the selection (or it clears if nothing is left).
    pub fn remove(&mut self, id: &str) {
        self.documents.remove(id);
        if self.selection.as_deref() == Some(id) {
            self.selection = self.highest_version_id();
        }
    }

    /// Advances the watermark to cover a successfully persisted version.
    /// Never lowers it.
    pub fn record_version(&mut self, version: f64) {
        self.watermark = self.watermark.max(version);
    }

    /// Looks up a Form by id.
    pub fn get(&self, id: &str) -> Option<&Form> {
        self.documents.get(id)
    }

    /// The currently selected Form, if any.
    pub fn current(&self) -> Option<&Form> {
        self.selection.as_deref().and_then(|id| self.documents.get(id))
    }

    /// The currently selected Form id, if any.
    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    /// The highest version number allocated so far.
    pub fn watermark(&self) -> f64 {
        self.watermark
    }

    /// Cloned snapshot of every cached Form, in no particular order.
    pub fn forms(&self) -> Vec<Form> {
        self.documents.values().cloned().collect()
    }

    /// Number of cached Forms.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the cache holds no Forms.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn highest_version_id(&self) -> Option<String> {
        self.documents
            .values()
            .max_by(|a, b| a.version.total_cmp(&b.version))
            .map(|f| f.id.clone())
    }
}

impl Default for VersionCache {
    fn default() -> Self {
        Self::new()
    }
}
