//! Form domain: model, field-sequence operations, and the store seam.

pub mod fields;
pub mod model;
pub mod repository;

pub use fields::{append, is_protected, next_role, remove_at, sorted_by_id};
pub use model::{Field, FieldRole, Form, FormDraft};
pub use repository::FormRepository;
