//! Inference collaborator seam.

use crate::error::Result;
use crate::form::{Field, FieldRole};
use async_trait::async_trait;

/// One prior turn of the conversation handed to the inference backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub role: FieldRole,
    pub content: String,
}

impl From<&Field> for ChatTurn {
    fn from(field: &Field) -> Self {
        Self {
            role: field.role,
            content: field.content.clone(),
        }
    }
}

/// A client that turns a conversation into one model completion.
///
/// `history` carries all prior fields in id order; `user_input` is the
/// (possibly attachment-annotated) trailing user message. Implementations
/// decide how much of the history their wire format can carry.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn complete(
        &self,
        history: &[ChatTurn],
        user_input: &str,
        image_url: Option<&str>,
    ) -> Result<String>;
}
