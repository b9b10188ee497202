use serde::{Deserialize, Serialize};

use pixelrelay_core::{ChatId, Owner, UserId};

use crate::envelope::{Envelope, EventSource};

/// A user asking for an image to be processed.
///
/// Wire shape (camelCase):
/// `{ owner: {chatId, userId}, mode?, input?: {sourceRef, mimeType?, sizeBytes?, fileName?}, messageId? }`.
/// `input` is optional on the wire so that a request without an image can be
/// answered with a proper rejection instead of a decode error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionEvent {
    pub owner: OwnerPayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<InputPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerPayload {
    pub chat_id: i64,
    pub user_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputPayload {
    /// Opaque reference the media source can resolve (e.g. a chat file id).
    pub source_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl SubmissionEvent {
    pub fn owner(&self) -> Owner {
        Owner::new(
            ChatId::new(self.owner.chat_id),
            UserId::new(self.owner.user_id),
        )
    }

    /// The image input, if one with a usable source reference was supplied.
    pub fn image(&self) -> Option<&InputPayload> {
        self.input
            .as_ref()
            .filter(|input| !input.source_ref.trim().is_empty())
    }
}

impl From<SubmissionEvent> for Envelope<SubmissionEvent> {
    fn from(event: SubmissionEvent) -> Self {
        Envelope::received(EventSource::Messaging, event)
    }
}
