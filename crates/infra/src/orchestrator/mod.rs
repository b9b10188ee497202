//! Job orchestrator.
//!
//! Turns a submission into a stored input, a backend job and a persisted job
//! document; turns a completion callback into at most one state transition
//! and the notification that transition owes the requester.

mod callback;
mod error;
mod messages;
mod submit;

pub use error::SubmitError;
pub use messages::UserMessage;

use std::sync::Arc;
use std::time::Duration;

use pixelrelay_core::{InputPolicy, JobId, Mode, ModeTable};

use crate::backend::ProcessingBackend;
use crate::config::Settings;
use crate::jobs::JobStateStore;
use crate::media::MediaSource;
use crate::notify::NotificationSink;
use crate::storage::ObjectStorage;

/// Everything the orchestrator talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub jobs: Arc<dyn JobStateStore>,
    pub storage: Arc<dyn ObjectStorage>,
    pub media: Arc<dyn MediaSource>,
    pub backend: Arc<dyn ProcessingBackend>,
    pub notifier: Arc<dyn NotificationSink>,
}

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub input_policy: InputPolicy,
    pub modes: ModeTable,
    /// Where the backend reports completion.
    pub callback_url: String,
    /// Lifetime of the input URL handed to the backend.
    pub presign_ttl: Duration,
}

impl OrchestratorSettings {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            input_policy: settings.input_policy(),
            modes: settings.mode_table(),
            callback_url: settings.callback_url(),
            presign_ttl: settings.presign_ttl(),
        }
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            input_policy: InputPolicy::default(),
            modes: ModeTable::builtin(),
            callback_url: "http://localhost:8080/webhooks/processing".to_string(),
            presign_ttl: Duration::from_secs(3600),
        }
    }
}

/// What a successful submission produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub job_id: JobId,
    pub mode: Mode,
    /// Object storage key of the uploaded input.
    pub storage_key: String,
}

pub struct JobOrchestrator {
    collaborators: Collaborators,
    settings: OrchestratorSettings,
}

impl JobOrchestrator {
    pub fn new(collaborators: Collaborators, settings: OrchestratorSettings) -> Self {
        Self {
            collaborators,
            settings,
        }
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }
}
