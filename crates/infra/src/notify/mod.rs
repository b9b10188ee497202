//! Notification sink: tells the requester what happened.

mod recording;

pub use recording::{Notification, RecordingNotifier};

use pixelrelay_core::Owner;

use crate::resilience::CallError;

/// Notification sink abstraction.
#[async_trait::async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send_text(&self, owner: Owner, text: &str) -> Result<(), NotifyError>;

    /// Deliver an image given by URL or by a transport-native file reference.
    async fn send_image(&self, owner: Owner, image_ref: &str, caption: &str) -> Result<(), NotifyError>;
}

/// Notification delivery error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotifyError {
    #[error("notification delivery failed: {0}")]
    Delivery(#[from] CallError),
    #[error("could not download result image: {0}")]
    Download(CallError),
    #[error("notification rejected: {0}")]
    Rejected(String),
}
