//! Workbench facade: the composition root the UI layer talks to.
//!
//! Wires the sync engine, attachment coordinator and submission pipeline
//! over the three collaborator seams and exposes one method per UI event,
//! addressed at the current selection. The cache stays keyed by Form id
//! underneath; "current" is resolved at call time.

use std::sync::Arc;

use formdeck_core::error::{DeckError, Result};
use formdeck_core::form::{Form, FormRepository};
use formdeck_core::inference::InferenceClient;
use formdeck_core::upload::UploadBroker;

use crate::attachments::AttachmentCoordinator;
use crate::submission::SubmissionPipeline;
use crate::sync_engine::SyncEngine;

/// Top-level handle bundling every Formdeck service.
pub struct Workbench {
    engine: Arc<SyncEngine>,
    attachments: Arc<AttachmentCoordinator>,
    pipeline: SubmissionPipeline,
}

impl Workbench {
    /// Wires a workbench over the given collaborators.
    pub fn new(
        repository: Arc<dyn FormRepository>,
        inference: Arc<dyn InferenceClient>,
        broker: Arc<dyn UploadBroker>,
    ) -> Self {
        let engine = Arc::new(SyncEngine::new(repository));
        let attachments = Arc::new(AttachmentCoordinator::new(broker));
        let pipeline = SubmissionPipeline::new(
            Arc::clone(&engine),
            inference,
            Arc::clone(&attachments),
        );
        Self {
            engine,
            attachments,
            pipeline,
        }
    }

    /// Performs the initial full fetch.
    pub async fn bootstrap(&self) -> Result<()> {
        self.engine.refresh().await
    }

    /// Every known version, highest first, for pickers.
    pub async fn versions(&self) -> Vec<Form> {
        let cache = self.engine.cache();
        let cache = cache.read().await;
        let mut forms = cache.forms();
        forms.sort_by(|a, b| b.version.total_cmp(&a.version));
        forms
    }

    /// The currently selected Form, if any.
    pub async fn current_form(&self) -> Option<Form> {
        self.engine.current_form().await
    }

    /// Moves the selection. Unknown ids are reported as NotFound and leave
    /// the selection alone.
    pub async fn select_version(&self, form_id: &str) -> Result<()> {
        self.engine.select_version(form_id).await
    }

    /// Creates and selects a new version.
    pub async fn new_version(&self) -> Result<Form> {
        self.engine.create_version().await
    }

    /// Duplicates the current version and selects the copy.
    pub async fn duplicate_current(&self) -> Result<Form> {
        let id = self.current_id().await?;
        self.engine.duplicate_version(&id).await
    }

    /// Deletes the current version; refused when it is the last one.
    pub async fn delete_current(&self) -> Result<()> {
        let id = self.current_id().await?;
        self.engine.delete_version(&id).await
    }

    /// Renames the current version (immediate locally, eventually
    /// consistent remotely).
    pub async fn rename_current(&self, name: impl Into<String> + Send) -> Result<Form> {
        let id = self.current_id().await?;
        self.engine.rename_version(&id, name).await
    }

    /// Rewrites one field of the current version.
    pub async fn edit_field(
        &self,
        index: usize,
        content: impl Into<String> + Send,
    ) -> Result<Form> {
        let id = self.current_id().await?;
        self.engine.edit_field(&id, index, content).await
    }

    /// Appends an empty field with the alternated role.
    pub async fn add_field(&self) -> Result<Form> {
        let id = self.current_id().await?;
        self.engine.add_field(&id).await
    }

    /// Removes one field; the lead system field is silently kept.
    pub async fn remove_field(&self, index: usize) -> Result<Form> {
        let id = self.current_id().await?;
        self.engine.remove_field(&id, index).await
    }

    /// Uploads an image for the field at `index`; its URL rides along with
    /// the next submission.
    pub async fn attach_image(
        &self,
        index: usize,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String> {
        self.attachments.upload(index, file_name, bytes).await
    }

    /// Submits the current conversation and appends the model's reply.
    pub async fn submit(&self) -> Result<Form> {
        self.pipeline.submit().await
    }

    /// Attachment state for previews and upload indicators.
    pub fn attachments(&self) -> &AttachmentCoordinator {
        &self.attachments
    }

    /// The underlying engine, for consumers that address Forms by id.
    pub fn engine(&self) -> Arc<SyncEngine> {
        Arc::clone(&self.engine)
    }

    async fn current_id(&self) -> Result<String> {
        self.engine
            .selection()
            .await
            .ok_or_else(|| DeckError::precondition("no version selected"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use formdeck_core::form::{Field, FieldRole, FormDraft};
    use formdeck_core::inference::ChatTurn;
    use formdeck_core::upload::UploadSlot;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MockStore {
        state: Mutex<StoreState>,
    }

    struct StoreState {
        forms: HashMap<String, Form>,
        next_doc: i64,
        next_field: i64,
    }

    impl MockStore {
        fn with_forms(forms: Vec<Form>) -> Self {
            let next_field = forms
                .iter()
                .flat_map(|f| f.fields.iter().filter_map(|fl| fl.id))
                .max()
                .unwrap_or(0)
                + 1;
            Self {
                state: Mutex::new(StoreState {
                    next_doc: forms.len() as i64 + 1,
                    next_field,
                    forms: forms.into_iter().map(|f| (f.id.clone(), f)).collect(),
                }),
            }
        }
    }

    #[async_trait]
    impl FormRepository for MockStore {
        async fn list_all(&self) -> Result<Vec<Form>> {
            Ok(self.state.lock().unwrap().forms.values().cloned().collect())
        }

        async fn create(&self, draft: &FormDraft) -> Result<Form> {
            let mut state = self.state.lock().unwrap();
            let id = format!("doc-{}", state.next_doc);
            state.next_doc += 1;
            let mut form = Form {
                id: id.clone(),
                version: draft.version,
                name: draft.name.clone(),
                fields: draft.fields.clone(),
            };
            for field in &mut form.fields {
                if field.id.is_none() {
                    field.id = Some(state.next_field);
                    state.next_field += 1;
                }
            }
            state.forms.insert(id, form.clone());
            Ok(form)
        }

        async fn update(&self, form: &Form) -> Result<Form> {
            let mut state = self.state.lock().unwrap();
            let mut canonical = form.clone();
            for field in &mut canonical.fields {
                if field.id.is_none() {
                    field.id = Some(state.next_field);
                    state.next_field += 1;
                }
            }
            state
                .forms
                .insert(canonical.id.clone(), canonical.clone());
            Ok(canonical)
        }

        async fn delete(&self, form_id: &str) -> Result<()> {
            self.state.lock().unwrap().forms.remove(form_id);
            Ok(())
        }
    }

    struct EchoInference;

    #[async_trait]
    impl InferenceClient for EchoInference {
        async fn complete(
            &self,
            _history: &[ChatTurn],
            user_input: &str,
            _image_url: Option<&str>,
        ) -> Result<String> {
            Ok(format!("echo: {user_input}"))
        }
    }

    struct OkBroker;

    #[async_trait]
    impl UploadBroker for OkBroker {
        async fn request_slot(&self, file_name: &str, _file_type: &str) -> Result<UploadSlot> {
            Ok(UploadSlot {
                upload_target: "https://bucket/put".to_string(),
                public_url: format!("https://cdn/{file_name}"),
            })
        }

        async fn transfer(
            &self,
            _upload_target: &str,
            _bytes: Vec<u8>,
            _content_type: &str,
        ) -> Result<()> {
            Ok(())
        }
    }

    fn field(id: Option<i64>, role: FieldRole, content: &str) -> Field {
        Field {
            id,
            role,
            content: content.to_string(),
        }
    }

    fn stored_form(id: &str, version: f64) -> Form {
        Form {
            id: id.to_string(),
            version,
            name: format!("Version {version}"),
            fields: vec![
                field(Some(1), FieldRole::System, "be brief"),
                field(Some(2), FieldRole::User, "hello"),
            ],
        }
    }

    async fn workbench_with(forms: Vec<Form>) -> Workbench {
        let bench = Workbench::new(
            Arc::new(MockStore::with_forms(forms)),
            Arc::new(EchoInference),
            Arc::new(OkBroker),
        );
        bench.bootstrap().await.unwrap();
        bench
    }

    #[tokio::test]
    async fn bootstrap_selects_the_latest_version() {
        let bench =
            workbench_with(vec![stored_form("a", 1.0), stored_form("b", 2.0)]).await;

        assert_eq!(bench.current_form().await.unwrap().version, 2.0);

        let cache = bench.engine().cache();
        assert_eq!(cache.read().await.watermark(), 2.0);

        let versions = bench.versions().await;
        assert_eq!(versions[0].version, 2.0);
        assert_eq!(versions[1].version, 1.0);
    }

    #[tokio::test]
    async fn authoring_round_trip() {
        let bench = workbench_with(vec![stored_form("a", 1.0)]).await;

        let created = bench.new_version().await.unwrap();
        assert_eq!(created.version, 2.0);
        assert_eq!(bench.current_form().await.unwrap().id, created.id);

        let renamed = bench.rename_current("Greeting").await.unwrap();
        assert_eq!(renamed.name, "Greeting");

        bench.edit_field(1, "say hi").await.unwrap();

        let submitted = bench.submit().await.unwrap();
        let last = submitted.fields.last().unwrap();
        assert_eq!(last.role, FieldRole::Assistant);
        assert_eq!(last.content, "echo: say hi");
    }

    #[tokio::test]
    async fn duplicate_current_steps_the_version() {
        let bench =
            workbench_with(vec![stored_form("a", 1.0), stored_form("b", 2.0)]).await;

        let copy = bench.duplicate_current().await.unwrap();

        assert_eq!(copy.version, 2.1);
        assert_eq!(copy.name, "Version 2 (2.1)");
        assert_eq!(bench.current_form().await.unwrap().id, copy.id);
        assert_eq!(bench.versions().await.len(), 3);
    }

    #[tokio::test]
    async fn delete_current_reselects_the_highest_remainder() {
        let bench =
            workbench_with(vec![stored_form("a", 1.0), stored_form("b", 2.0)]).await;

        bench.delete_current().await.unwrap();

        let current = bench.current_form().await.unwrap();
        assert_eq!(current.id, "a");
    }

    #[tokio::test]
    async fn attachment_rides_the_next_submission() {
        let bench = workbench_with(vec![stored_form("a", 1.0)]).await;

        bench.attach_image(1, "cat.png", vec![1, 2]).await.unwrap();
        assert_eq!(
            bench.attachments().preview(1).as_deref(),
            Some("https://cdn/cat.png")
        );

        let submitted = bench.submit().await.unwrap();
        assert!(submitted.fields[1]
            .content
            .contains("[image: https://cdn/cat.png]"));
    }

    #[tokio::test]
    async fn selection_scoped_operations_need_a_selection() {
        let bench = workbench_with(vec![]).await;

        let err = bench.edit_field(0, "x").await.unwrap_err();
        assert!(err.is_precondition());

        let err = bench.duplicate_current().await.unwrap_err();
        assert!(err.is_precondition());
    }
}
