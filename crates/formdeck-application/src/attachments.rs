//! Two-phase image upload coordination.
//!
//! Phase (a) requests a presigned slot, phase (b) transfers the bytes.
//! The public URL becomes visible to the submission pipeline and the
//! per-field preview map only after phase (b) succeeded; a failure at
//! either phase clears everything, so no partial state leaks out.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use formdeck_core::error::{DeckError, Result};
use formdeck_core::upload::UploadBroker;

/// Coordinates uploads and holds the attachment state the rest of the
/// application reads: the in-flight flag, the pending public URL, and the
/// field-index preview map.
pub struct AttachmentCoordinator {
    broker: Arc<dyn UploadBroker>,
    state: Mutex<AttachmentState>,
}

#[derive(Default)]
struct AttachmentState {
    uploading: bool,
    pending_url: Option<String>,
    previews: HashMap<usize, String>,
}

impl AttachmentCoordinator {
    /// Creates a coordinator over the given broker.
    pub fn new(broker: Arc<dyn UploadBroker>) -> Self {
        Self {
            broker,
            state: Mutex::new(AttachmentState::default()),
        }
    }

    /// Uploads one image destined for the field at `field_index` and
    /// returns its public URL.
    ///
    /// The MIME type is derived from the file name, falling back to
    /// `application/octet-stream`. A second upload started while one is in
    /// flight is refused before any network traffic.
    pub async fn upload(
        &self,
        field_index: usize,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String> {
        {
            let mut state = self.state.lock().unwrap();
            if state.uploading {
                return Err(DeckError::precondition("an upload is already in flight"));
            }
            state.uploading = true;
        }

        let content_type = mime_guess::from_path(file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        match self.run_upload(file_name, &content_type, bytes).await {
            Ok(public_url) => {
                let mut state = self.state.lock().unwrap();
                state.uploading = false;
                state.pending_url = Some(public_url.clone());
                state.previews.insert(field_index, public_url.clone());
                info!(file_name, %public_url, "attachment uploaded");
                Ok(public_url)
            }
            Err(err) => {
                let mut state = self.state.lock().unwrap();
                state.uploading = false;
                state.pending_url = None;
                state.previews.clear();
                warn!(file_name, error = %err, "attachment upload failed");
                Err(err)
            }
        }
    }

    async fn run_upload(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String> {
        let slot = self.broker.request_slot(file_name, content_type).await?;
        self.broker
            .transfer(&slot.upload_target, bytes, content_type)
            .await?;
        Ok(slot.public_url)
    }

    /// Whether an upload is currently between phase (a) and phase (b).
    pub fn is_uploading(&self) -> bool {
        self.state.lock().unwrap().uploading
    }

    /// The public URL of the last completed upload, if unconsumed.
    pub fn pending_url(&self) -> Option<String> {
        self.state.lock().unwrap().pending_url.clone()
    }

    /// Hands the pending URL to the caller and clears it.
    pub fn take_pending_url(&self) -> Option<String> {
        self.state.lock().unwrap().pending_url.take()
    }

    /// The preview URL bound to a field index, if any.
    pub fn preview(&self, field_index: usize) -> Option<String> {
        self.state.lock().unwrap().previews.get(&field_index).cloned()
    }

    /// Clears every preview and the pending URL.
    pub fn clear(&self) {
        let mut state = self.state.lock().unwrap();
        state.pending_url = None;
        state.previews.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use formdeck_core::upload::UploadSlot;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct MockBroker {
        slot_requests: Mutex<Vec<(String, String)>>,
        fail_presign: bool,
        fail_transfer: bool,
        /// When set, `request_slot` parks until released.
        gate: Option<(Arc<Notify>, Arc<Notify>)>,
    }

    impl MockBroker {
        fn gated() -> (Self, Arc<Notify>, Arc<Notify>) {
            let entered = Arc::new(Notify::new());
            let release = Arc::new(Notify::new());
            let broker = Self {
                gate: Some((Arc::clone(&entered), Arc::clone(&release))),
                ..Self::default()
            };
            (broker, entered, release)
        }
    }

    #[async_trait]
    impl UploadBroker for MockBroker {
        async fn request_slot(&self, file_name: &str, file_type: &str) -> Result<UploadSlot> {
            self.slot_requests
                .lock()
                .unwrap()
                .push((file_name.to_string(), file_type.to_string()));
            if let Some((entered, release)) = &self.gate {
                entered.notify_one();
                release.notified().await;
            }
            if self.fail_presign {
                return Err(DeckError::attachment("presign refused"));
            }
            Ok(UploadSlot {
                upload_target: "https://bucket/put-here".to_string(),
                public_url: format!("https://cdn/{file_name}"),
            })
        }

        async fn transfer(
            &self,
            _upload_target: &str,
            _bytes: Vec<u8>,
            _content_type: &str,
        ) -> Result<()> {
            if self.fail_transfer {
                return Err(DeckError::attachment("transfer refused"));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn successful_upload_exposes_url_and_preview() {
        let coordinator = AttachmentCoordinator::new(Arc::new(MockBroker::default()));

        let url = coordinator
            .upload(2, "cat.png", vec![1, 2, 3])
            .await
            .unwrap();

        assert_eq!(url, "https://cdn/cat.png");
        assert_eq!(coordinator.pending_url(), Some(url.clone()));
        assert_eq!(coordinator.preview(2), Some(url));
        assert!(!coordinator.is_uploading());
    }

    #[tokio::test]
    async fn mime_type_derives_from_file_name() {
        let broker = Arc::new(MockBroker::default());
        let coordinator = AttachmentCoordinator::new(broker.clone());

        coordinator.upload(0, "cat.png", vec![]).await.unwrap();
        coordinator.upload(0, "unknown-blob", vec![]).await.unwrap();

        let requests = broker.slot_requests.lock().unwrap().clone();
        assert_eq!(requests[0].1, "image/png");
        assert_eq!(requests[1].1, "application/octet-stream");
    }

    #[tokio::test]
    async fn presign_failure_clears_all_state() {
        let broker = MockBroker {
            fail_presign: true,
            ..MockBroker::default()
        };
        let coordinator = AttachmentCoordinator::new(Arc::new(broker));

        let err = coordinator.upload(1, "cat.png", vec![]).await.unwrap_err();

        assert!(err.is_attachment());
        assert_eq!(coordinator.pending_url(), None);
        assert_eq!(coordinator.preview(1), None);
        assert!(!coordinator.is_uploading());
    }

    #[tokio::test]
    async fn transfer_failure_clears_all_state() {
        let broker = MockBroker {
            fail_transfer: true,
            ..MockBroker::default()
        };
        let coordinator = AttachmentCoordinator::new(Arc::new(broker));

        let err = coordinator.upload(1, "cat.png", vec![]).await.unwrap_err();

        assert!(err.is_attachment());
        assert_eq!(coordinator.pending_url(), None);
        assert_eq!(coordinator.preview(1), None);
        assert!(!coordinator.is_uploading());
    }

    #[tokio::test]
    async fn concurrent_upload_is_refused() {
        let (broker, entered, release) = MockBroker::gated();
        let coordinator = Arc::new(AttachmentCoordinator::new(Arc::new(broker)));

        let first = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.upload(0, "cat.png", vec![]).await })
        };
        entered.notified().await;
        assert!(coordinator.is_uploading());

        let err = coordinator.upload(1, "dog.png", vec![]).await.unwrap_err();
        assert!(err.is_precondition());

        release.notify_one();
        first.await.unwrap().unwrap();
        assert!(!coordinator.is_uploading());
    }

    #[tokio::test]
    async fn take_pending_url_consumes_it() {
        let coordinator = AttachmentCoordinator::new(Arc::new(MockBroker::default()));
        coordinator.upload(0, "cat.png", vec![]).await.unwrap();

        assert!(coordinator.take_pending_url().is_some());
        assert_eq!(coordinator.pending_url(), None);
    }
}
