//! Object-storage collaborator seam.

use crate::error::Result;
use async_trait::async_trait;

/// A presigned upload slot issued by the storage collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadSlot {
    /// Presigned target the raw bytes are PUT to.
    pub upload_target: String,
    /// URL the object will be readable at once the transfer completes.
    pub public_url: String,
}

/// Two-phase upload broker: request a slot, then transfer the bytes.
///
/// The public URL must not be treated as live until `transfer` has
/// succeeded.
#[async_trait]
pub trait UploadBroker: Send + Sync {
    /// Phase (a): asks the collaborator for a presigned slot.
    async fn request_slot(&self, file_name: &str, file_type: &str) -> Result<UploadSlot>;

    /// Phase (b): PUTs the raw bytes to the presigned target.
    async fn transfer(
        &self,
        upload_target: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<()>;
}
