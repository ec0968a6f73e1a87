//! Submission pipeline: one inference round trip per trailing user turn.
//!
//! The pipeline reads the current Form, sends the conversation to the
//! inference collaborator, and feeds the reply back through the sync
//! engine as one combined mutation (annotate the trailing user field,
//! append the assistant field). Until that mutation commits, nothing is
//! appended anywhere, so an inference failure leaves the Form exactly as
//! it was.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use formdeck_core::error::{DeckError, Result};
use formdeck_core::form::{Field, FieldRole, Form};
use formdeck_core::inference::{ChatTurn, InferenceClient};

use crate::attachments::AttachmentCoordinator;
use crate::sync_engine::SyncEngine;

/// Drives submissions of the currently selected Form.
pub struct SubmissionPipeline {
    engine: Arc<SyncEngine>,
    inference: Arc<dyn InferenceClient>,
    attachments: Arc<AttachmentCoordinator>,
    /// Form ids with a submission in flight.
    in_flight: Mutex<HashSet<String>>,
}

impl SubmissionPipeline {
    /// Creates a pipeline over the engine and collaborators.
    pub fn new(
        engine: Arc<SyncEngine>,
        inference: Arc<dyn InferenceClient>,
        attachments: Arc<AttachmentCoordinator>,
    ) -> Self {
        Self {
            engine,
            inference,
            attachments,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Submits the current Form's conversation and appends the reply.
    ///
    /// Preconditions, all checked before any network call: a Form is
    /// selected, it has fields, the trailing field is a user turn, no
    /// upload is in flight, and no submission for this Form is pending.
    /// Past the preconditions, the pending attachment URL is consumed
    /// whether or not the round trip succeeds.
    pub async fn submit(&self) -> Result<Form> {
        let form = self
            .engine
            .current_form()
            .await
            .ok_or_else(|| DeckError::precondition("no version selected"))?;

        if self.attachments.is_uploading() {
            return Err(DeckError::precondition(
                "an image upload is still in flight",
            ));
        }
        let last = form
            .last_field()
            .ok_or_else(|| DeckError::precondition("version has no fields"))?;
        if last.role != FieldRole::User {
            return Err(DeckError::precondition(
                "last field must be a user message",
            ));
        }

        {
            let mut in_flight = self.in_flight.lock().unwrap();
            if !in_flight.insert(form.id.clone()) {
                return Err(DeckError::precondition(
                    "a submission for this version is already in flight",
                ));
            }
        }

        let result = self.run(&form).await;
        self.in_flight.lock().unwrap().remove(&form.id);
        if let Err(err) = &result {
            warn!(form_id = %form.id, error = %err, "submission failed");
        }
        result
    }

    async fn run(&self, form: &Form) -> Result<Form> {
        // consumed here so it is gone regardless of how the round trip ends
        let image_url = self.attachments.take_pending_url();

        let last_index = form.fields.len() - 1;
        let base = form.fields[last_index].content.clone();
        let annotated = match &image_url {
            Some(url) => format!("{base}\n[image: {url}]"),
            None => base,
        };
        let history: Vec<ChatTurn> = form.fields[..last_index].iter().map(ChatTurn::from).collect();

        let reply = self
            .inference
            .complete(&history, &annotated, image_url.as_deref())
            .await?;
        info!(form_id = %form.id, chars = reply.len(), "inference reply received");

        self.engine
            .update_form(&form.id, move |current| {
                let mut next = current.clone();
                if let Some(last) = next.fields.last_mut() {
                    last.content = annotated;
                }
                next.fields.push(Field::new(FieldRole::Assistant, reply));
                next
            })
            .await
    }
}
