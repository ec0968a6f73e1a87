//! Mutation orchestration against the remote store.
//!
//! Every user-initiated mutation runs the same cycle:
//!
//! ```text
//! +----------+    +------------------+    +-------------+
//! | snapshot | -> | optimistic apply | -> | remote call |
//! +----------+    +------------------+    +------+------+
//!                                                |
//!                        success: commit_remote  |  failure: rollback
//!                        (server copy wins)      |  (snapshot restored)
//! ```
//!
//! At most one remote call per Form is in flight at a time: a single-slot
//! async mutex per Form id queues later mutations FIFO behind the pending
//! one, because the store assigns field ids during persist and out-of-order
//! writes would corrupt the id-based ordering. Mutations against different
//! Forms proceed concurrently. Failed calls are never replayed
//! automatically: a half-applied write could have assigned ids already.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use formdeck_core::cache::VersionCache;
use formdeck_core::error::{DeckError, Result};
use formdeck_core::form::{self, Field, FieldRole, Form, FormDraft, FormRepository};
use formdeck_core::version;

/// Orchestrates cache mutations and their remote persistence.
pub struct SyncEngine {
    cache: Arc<RwLock<VersionCache>>,
    repository: Arc<dyn FormRepository>,
    /// One single-slot queue per Form id, created lazily.
    write_slots: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SyncEngine {
    /// Creates an engine over the given store with an empty cache.
    pub fn new(repository: Arc<dyn FormRepository>) -> Self {
        Self {
            cache: Arc::new(RwLock::new(VersionCache::new())),
            repository,
            write_slots: Mutex::new(HashMap::new()),
        }
    }

    /// Shared handle to the cache for read-side consumers.
    pub fn cache(&self) -> Arc<RwLock<VersionCache>> {
        Arc::clone(&self.cache)
    }

    /// Replaces the cache wholesale from a full remote fetch.
    pub async fn refresh(&self) -> Result<()> {
        let forms = self.repository.list_all().await?;
        let mut cache = self.cache.write().await;
        cache.load(forms);
        info!(
            count = cache.len(),
            selection = ?cache.selection(),
            "cache refreshed from store"
        );
        Ok(())
    }

    /// A cloned view of the Form with the given id.
    pub async fn form(&self, form_id: &str) -> Option<Form> {
        self.cache.read().await.get(form_id).cloned()
    }

    /// A cloned view of the currently selected Form.
    pub async fn current_form(&self) -> Option<Form> {
        self.cache.read().await.current().cloned()
    }

    /// The currently selected Form id, if any.
    pub async fn selection(&self) -> Option<String> {
        self.cache.read().await.selection().map(str::to_string)
    }

    /// Moves the selection pointer. An unknown id is reported and leaves
    /// the selection unchanged.
    pub async fn select_version(&self, form_id: &str) -> Result<()> {
        self.cache.write().await.select(form_id)
    }

    /// Runs one mutation through the snapshot / optimistic-apply / persist /
    /// reconcile cycle, queued FIFO behind any pending write for the same
    /// Form.
    ///
    /// A mutator that returns the Form unchanged (a protected-field delete,
    /// an out-of-range edit) short-circuits: the no-op never reaches the
    /// network.
    pub async fn update_form<F>(&self, form_id: &str, mutator: F) -> Result<Form>
    where
        F: FnOnce(&Form) -> Form + Send,
    {
        let slot = self.write_slot(form_id).await;
        let _guard = slot.lock().await;

        let (snapshot, optimistic) = {
            let mut cache = self.cache.write().await;
            cache.apply_local(form_id, mutator)?
        };

        if optimistic == snapshot {
            debug!(%form_id, "mutation is a no-op, skipping remote call");
            return Ok(optimistic);
        }

        match self.repository.update(&optimistic).await {
            Ok(canonical) => {
                let mut cache = self.cache.write().await;
                Ok(cache.commit_remote(canonical))
            }
            Err(err) => {
                warn!(%form_id, error = %err, "update rejected by store, rolling back");
                let mut cache = self.cache.write().await;
                cache.rollback(form_id, snapshot);
                Err(err)
            }
        }
    }

    /// Rewrites the content of the field at `index` (display order).
    pub async fn edit_field(
        &self,
        form_id: &str,
        index: usize,
        content: impl Into<String> + Send,
    ) -> Result<Form> {
        let content = content.into();
        self.update_form(form_id, move |current| {
            let mut next = current.clone();
            if let Some(field) = next.fields.get_mut(index) {
                field.content = content;
            }
            next
        })
        .await
    }

    /// Appends an empty field with the alternated role.
    pub async fn add_field(&self, form_id: &str) -> Result<Form> {
        self.update_form(form_id, |current| {
            let role = form::next_role(&current.fields);
            let mut next = current.clone();
            next.fields = form::append(&current.fields, Field::new(role, ""));
            next
        })
        .await
    }

    /// Removes the field at `index`. Deleting the lead system field is a
    /// silent no-op and never reaches the store.
    pub async fn remove_field(&self, form_id: &str, index: usize) -> Result<Form> {
        self.update_form(form_id, move |current| {
            let mut next = current.clone();
            next.fields = form::remove_at(&current.fields, index);
            next
        })
        .await
    }

    /// Creates a new version seeded with one empty system and one empty
    /// user field, persists it, and selects it.
    ///
    /// The watermark only advances once the store accepted the document, so
    /// a failed create never burns a version number.
    pub async fn create_version(&self) -> Result<Form> {
        let watermark = self.cache.read().await.watermark();
        let next_version = version::next_new_version(watermark);
        let draft = FormDraft {
            version: next_version,
            name: format!("Version {}", version::format_version(next_version)),
            fields: vec![
                Field::new(FieldRole::System, ""),
                Field::new(FieldRole::User, ""),
            ],
        };

        let created = self.repository.create(&draft).await?;
        let mut cache = self.cache.write().await;
        let committed = cache.commit_remote(created);
        cache.record_version(committed.version);
        cache.select(&committed.id)?;
        info!(form_id = %committed.id, version = committed.version, "created version");
        Ok(committed)
    }

    /// Duplicates a Form: deep-copies its field content (ids dropped, the
    /// store assigns fresh ones), allocates the next one-decimal version,
    /// persists it as a new document, and selects it.
    pub async fn duplicate_version(&self, form_id: &str) -> Result<Form> {
        let (source_name, fields, watermark) = {
            let cache = self.cache.read().await;
            let source = cache
                .get(form_id)
                .ok_or_else(|| DeckError::not_found("Form", form_id))?;
            let fields: Vec<Field> = source
                .fields
                .iter()
                .map(|f| Field::new(f.role, f.content.clone()))
                .collect();
            (source.name.clone(), fields, cache.watermark())
        };

        let next_version = version::next_duplicate_version(watermark)?;
        let draft = FormDraft {
            version: next_version,
            name: format!("{} ({})", source_name, version::format_version(next_version)),
            fields,
        };

        let created = self.repository.create(&draft).await?;
        let mut cache = self.cache.write().await;
        let committed = cache.commit_remote(created);
        cache.record_version(committed.version);
        cache.select(&committed.id)?;
        info!(
            source_id = %form_id,
            form_id = %committed.id,
            version = committed.version,
            "duplicated version"
        );
        Ok(committed)
    }

    /// Deletes a Form from the store and the cache, reseating the selection
    /// on the highest-version remainder.
    ///
    /// Refused outright while the cache holds a single Form; that check
    /// runs before any network traffic.
    pub async fn delete_version(&self, form_id: &str) -> Result<()> {
        {
            let cache = self.cache.read().await;
            if cache.get(form_id).is_none() {
                return Err(DeckError::not_found("Form", form_id));
            }
            if cache.len() <= 1 {
                return Err(DeckError::precondition(
                    "cannot delete the last remaining version",
                ));
            }
        }

        let slot = self.write_slot(form_id).await;
        let _guard = slot.lock().await;

        self.repository.delete(form_id).await?;
        self.cache.write().await.remove(form_id);
        self.write_slots.lock().await.remove(form_id);
        info!(%form_id, "deleted version");
        Ok(())
    }

    /// Renames a Form. The local name change is immediate and sticks even
    /// when the store rejects the write; names are low-stakes metadata and
    /// converge on the next successful save, unlike field edits.
    pub async fn rename_version(&self, form_id: &str, name: impl Into<String> + Send) -> Result<Form> {
        let slot = self.write_slot(form_id).await;
        let _guard = slot.lock().await;

        let name = name.into();
        let (snapshot, optimistic) = {
            let mut cache = self.cache.write().await;
            cache.apply_local(form_id, move |current| {
                let mut next = current.clone();
                next.name = name;
                next
            })?
        };

        if optimistic == snapshot {
            return Ok(optimistic);
        }

        match self.repository.update(&optimistic).await {
            Ok(canonical) => {
                let mut cache = self.cache.write().await;
                Ok(cache.commit_remote(canonical))
            }
            Err(err) => {
                warn!(%form_id, error = %err, "rename not confirmed by store, keeping local name");
                Ok(optimistic)
            }
        }
    }

    async fn write_slot(&self, form_id: &str) -> Arc<Mutex<()>> {
        let mut slots = self.write_slots.lock().await;
        Arc::clone(
            slots
                .entry(form_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }
}
