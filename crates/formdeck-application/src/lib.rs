//! Formdeck application services.
//!
//! Orchestrates the domain layer against the remote collaborators: the
//! sync engine runs every mutation through its optimistic
//! apply/persist/reconcile cycle, the attachment coordinator owns the
//! two-phase upload state, the submission pipeline drives inference round
//! trips, and the workbench bundles all three behind the UI-event entry
//! points.

pub mod attachments;
pub mod submission;
pub mod sync_engine;
pub mod workbench;

pub use attachments::AttachmentCoordinator;
pub use submission::SubmissionPipeline;
pub use sync_engine::SyncEngine;
pub use workbench::Workbench;
