use std::sync::{Arc, Mutex};

use pixelrelay_core::Owner;

use super::{NotificationSink, NotifyError};

/// A notification captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Text { owner: Owner, text: String },
    Image { owner: Owner, image_ref: String, caption: String },
}

impl Notification {
    pub fn owner(&self) -> Owner {
        match self {
            Notification::Text { owner, .. } | Notification::Image { owner, .. } => *owner,
        }
    }
}

/// Notification sink that records everything it is asked to send.
///
/// `failing_images` makes every image delivery fail after being recorded.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    failing_images: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn failing_images() -> Self {
        Self {
            failing_images: true,
            ..Self::default()
        }
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    pub fn texts(&self) -> Vec<String> {
        self.notifications()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Text { text, .. } => Some(text),
                Notification::Image { .. } => None,
            })
            .collect()
    }

    pub fn images(&self) -> Vec<String> {
        self.notifications()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Image { image_ref, .. } => Some(image_ref),
                Notification::Text { .. } => None,
            })
            .collect()
    }

    fn record(&self, notification: Notification) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .map_err(|_| NotifyError::Rejected("recorder lock poisoned".to_string()))?
            .push(notification);
        Ok(())
    }
}

#[async_trait::async_trait]
impl NotificationSink for RecordingNotifier {
    async fn send_text(&self, owner: Owner, text: &str) -> Result<(), NotifyError> {
        self.record(Notification::Text {
            owner,
            text: text.to_string(),
        })
    }

    async fn send_image(&self, owner: Owner, image_ref: &str, caption: &str) -> Result<(), NotifyError> {
        self.record(Notification::Image {
            owner,
            image_ref: image_ref.to_string(),
            caption: caption.to_string(),
        })?;
        if self.failing_images {
            return Err(NotifyError::Rejected("image delivery disabled".to_string()));
        }
        Ok(())
    }
}
