use std::time::Duration;

/// Failure of a single outbound attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    #[error("network error: {0}")]
    Network(String),
    #[error("attempt timed out after {0:?}")]
    Timeout(Duration),
    #[error("upstream returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unreadable upstream response: {0}")]
    Decode(String),
}

impl UpstreamError {
    /// Largest response body excerpt kept in an error.
    const BODY_EXCERPT: usize = 512;

    pub fn status(status: u16, body: impl AsRef<str>) -> Self {
        let body = body.as_ref();
        let body = match body.char_indices().nth(Self::BODY_EXCERPT) {
            Some((idx, _)) => format!("{}...", &body[..idx]),
            None => body.to_string(),
        };
        Self::Status { status, body }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            UpstreamError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Network-level failures (connection, timeout) as opposed to answered requests.
    pub fn is_transport(&self) -> bool {
        matches!(self, UpstreamError::Network(_) | UpstreamError::Timeout(_))
    }

    /// Turn a non-success response into a `Status` error, keeping a body excerpt.
    pub async fn check(response: reqwest::Response) -> Result<reqwest::Response, UpstreamError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Self::status(status.as_u16(), body))
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        // Request URLs may embed credentials (bot tokens), keep them out of errors.
        let err = err.without_url();
        if err.is_decode() {
            UpstreamError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            UpstreamError::status(status.as_u16(), err.to_string())
        } else {
            UpstreamError::Network(err.to_string())
        }
    }
}

/// Final outcome of a retried call that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
    /// Non-retryable failure, surfaced on the attempt that produced it.
    #[error("{operation} failed: {source}")]
    Fatal {
        operation: String,
        source: UpstreamError,
    },
    /// Every attempt failed with a retryable error.
    #[error("{operation} unavailable after {attempts} attempts: {last}")]
    UpstreamUnavailable {
        operation: String,
        attempts: u32,
        last: UpstreamError,
    },
}

impl CallError {
    /// The concrete error of the last attempt.
    pub fn last_error(&self) -> &UpstreamError {
        match self {
            CallError::Fatal { source, .. } => source,
            CallError::UpstreamUnavailable { last, .. } => last,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, CallError::UpstreamUnavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_bodies_are_truncated() {
        let err = UpstreamError::status(500, "x".repeat(2_000));
        match err {
            UpstreamError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body.len(), UpstreamError::BODY_EXCERPT + 3);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn last_error_is_exposed_for_both_outcomes() {
        let fatal = CallError::Fatal {
            operation: "submit".into(),
            source: UpstreamError::status(401, "nope"),
        };
        assert_eq!(fatal.last_error().status_code(), Some(401));
        assert!(!fatal.is_exhausted());

        let exhausted = CallError::UpstreamUnavailable {
            operation: "submit".into(),
            attempts: 3,
            last: UpstreamError::Timeout(Duration::from_secs(1)),
        };
        assert!(exhausted.last_error().is_transport());
        assert!(exhausted.is_exhausted());
    }
}
