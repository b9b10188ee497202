use pixelrelay_core::{InputPolicy, ValidationError};

use super::messages::UserMessage;
use crate::backend::BackendError;
use crate::media::MediaError;

/// Why a submission was not turned into a job.
///
/// No variant leaves a persisted job behind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("input rejected: {0}")]
    Validation(#[from] ValidationError),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("processing backend refused our credentials: {0}")]
    UpstreamAuth(String),
    #[error("processing backend rate limit: {0}")]
    UpstreamRateLimit(String),
    #[error("processing backend unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("could not fetch input: {0}")]
    Source(#[from] MediaError),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<BackendError> for SubmitError {
    fn from(err: BackendError) -> Self {
        let detail = err.to_string();
        match err {
            BackendError::Configuration(_) => SubmitError::Configuration(detail),
            BackendError::Auth { .. } => SubmitError::UpstreamAuth(detail),
            BackendError::RateLimited => SubmitError::UpstreamRateLimit(detail),
            BackendError::Server(_) => SubmitError::UpstreamUnavailable(detail),
            BackendError::Network(_) => SubmitError::Network(detail),
            BackendError::InvalidResponse(_) | BackendError::Rejected { .. } => {
                SubmitError::Internal(detail)
            }
        }
    }
}

impl SubmitError {
    /// Stable machine-readable code, safe to return to callers.
    pub fn code(&self) -> &'static str {
        match self {
            SubmitError::Validation(ValidationError::MissingInput) => "missing_input",
            SubmitError::Validation(ValidationError::Oversize { .. }) => "input_too_large",
            SubmitError::Validation(ValidationError::UnsupportedMime { .. }) => "unsupported_mime",
            SubmitError::Configuration(_) => "configuration_error",
            SubmitError::UpstreamAuth(_) => "upstream_auth_error",
            SubmitError::UpstreamRateLimit(_) => "upstream_rate_limited",
            SubmitError::UpstreamUnavailable(_) => "upstream_unavailable",
            SubmitError::Network(_) => "network_error",
            SubmitError::Source(_) => "input_unavailable",
            SubmitError::Storage(_) => "storage_error",
            SubmitError::Internal(_) => "internal_error",
        }
    }

    /// The sanitized text shown to the requester.
    pub fn user_message(&self, policy: &InputPolicy) -> UserMessage {
        match self {
            SubmitError::Validation(ValidationError::MissingInput) => UserMessage::MissingInput,
            SubmitError::Validation(ValidationError::Oversize { .. }) => UserMessage::TooLarge {
                limit_mb: policy.max_megabytes(),
            },
            SubmitError::Validation(ValidationError::UnsupportedMime { .. }) => {
                UserMessage::UnsupportedFormat {
                    allowed: policy.allowed_mime.clone(),
                }
            }
            SubmitError::Configuration(_) => UserMessage::ServiceMisconfigured,
            SubmitError::UpstreamAuth(_) => UserMessage::ServiceAuth,
            SubmitError::UpstreamRateLimit(_) => UserMessage::RateLimited,
            SubmitError::UpstreamUnavailable(_) => UserMessage::ServiceUnavailable,
            SubmitError::Network(_) => UserMessage::NetworkTrouble,
            SubmitError::Source(_) => UserMessage::SourceUnavailable,
            SubmitError::Storage(_) | SubmitError::Internal(_) => UserMessage::SubmissionFailed,
        }
    }
}
