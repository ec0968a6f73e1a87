//! Form domain model.
//!
//! A Form (one "version" of a prompt template) is a server-owned document:
//! the remote store assigns the document id and every field id, and its
//! echo of a write is authoritative over whatever the client sent.

use serde::{Deserialize, Serialize};

/// Represents the role of a message field in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldRole {
    /// System prompt material.
    System,
    /// Message authored by the operator.
    User,
    /// Message produced by the model.
    Assistant,
}

/// One role-tagged message unit inside a Form.
///
/// `id` is assigned by the remote store on first persist and is `None` for
/// fields that have never round-tripped. Field ids, not array positions,
/// define the authoritative ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Server-assigned field identifier; absent until first persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// The role of the message sender.
    pub role: FieldRole,
    /// Message text. May embed one external resource reference (an image
    /// URL) inline as a substring.
    pub content: String,
}

impl Field {
    /// Creates a not-yet-persisted field.
    pub fn new(role: FieldRole, content: impl Into<String>) -> Self {
        Self {
            id: None,
            role,
            content: content.into(),
        }
    }
}

/// One persisted prompt template instance ("version").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Form {
    /// Opaque identifier assigned by the remote store.
    pub id: String,
    /// Numeric display tag. Unique among live Forms by convention, but the
    /// server-assigned `id` is the only true key.
    pub version: f64,
    /// Display name.
    pub name: String,
    /// Ordered message fields (materialized sorted by field id).
    pub fields: Vec<Field>,
}

impl Form {
    /// Returns the last field in display order, if any.
    pub fn last_field(&self) -> Option<&Field> {
        self.fields.last()
    }
}

/// A Form that has not been persisted yet: the create payload.
///
/// The remote store assigns the document id and field ids on `POST`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDraft {
    pub version: f64,
    pub name: String,
    pub fields: Vec<Field>,
}
