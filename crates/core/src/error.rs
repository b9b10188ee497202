//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic failures (malformed identifiers, broken
/// invariants). Transport and storage concerns belong to the infra crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. empty or not usable as a document key).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

/// Reason a submitted image was rejected before any side effect happened.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The submission carried no image at all.
    #[error("submission has no image input")]
    MissingInput,

    /// The image is larger than the configured limit.
    #[error("image is {size_bytes} bytes, limit is {limit_bytes} bytes")]
    Oversize { size_bytes: u64, limit_bytes: u64 },

    /// The image type is not on the allow-list.
    #[error("unsupported mime type `{mime_type}`")]
    UnsupportedMime { mime_type: String },
}
