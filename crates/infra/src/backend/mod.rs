//! Processing backend client.
//!
//! The backend accepts a transformation request, answers with its own job id,
//! and later reports the outcome to the callback URL.

mod http;
mod scripted;

pub use http::{BackendConfig, BackendKind, HttpProcessingBackend, PROVIDER_API_URL};
pub use scripted::ScriptedBackend;

use pixelrelay_core::{JobId, Mode, ModeProfile};

use crate::resilience::{CallError, UpstreamError};

/// What to process and where to report back.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRequest {
    /// URL the backend can fetch the input image from.
    pub input_url: String,
    pub callback_url: String,
    pub mode: Mode,
    pub profile: ModeProfile,
}

/// The backend took the job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub id: JobId,
    pub status: Option<String>,
    pub model_version: Option<String>,
}

/// Processing backend abstraction.
#[async_trait::async_trait]
pub trait ProcessingBackend: Send + Sync {
    async fn submit(&self, request: &SubmissionRequest) -> Result<Accepted, BackendError>;
}

/// Classified backend failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("processing backend is misconfigured: {0}")]
    Configuration(String),
    #[error("processing backend rejected our credentials (status {status})")]
    Auth { status: u16 },
    #[error("processing backend is rate limiting us")]
    RateLimited,
    #[error("processing backend unavailable: {0}")]
    Server(String),
    #[error("processing backend unreachable: {0}")]
    Network(String),
    #[error("unexpected processing backend response: {0}")]
    InvalidResponse(String),
    #[error("processing backend rejected the request (status {status}): {body}")]
    Rejected { status: u16, body: String },
}

impl From<CallError> for BackendError {
    fn from(err: CallError) -> Self {
        match err.last_error() {
            UpstreamError::Status {
                status: status @ (401 | 403),
                ..
            } => BackendError::Auth { status: *status },
            UpstreamError::Status { status: 429, .. } => BackendError::RateLimited,
            UpstreamError::Status { status, .. } if *status >= 500 => BackendError::Server(err.to_string()),
            UpstreamError::Status { status, body } => BackendError::Rejected {
                status: *status,
                body: body.clone(),
            },
            UpstreamError::Network(_) | UpstreamError::Timeout(_) => BackendError::Network(err.to_string()),
            UpstreamError::Decode(reason) => BackendError::InvalidResponse(reason.clone()),
        }
    }
}
