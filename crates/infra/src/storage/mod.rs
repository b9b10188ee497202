//! Object storage collaborator.
//!
//! Holds uploaded inputs and the job documents. Keys are `/`-separated
//! relative paths such as `images/input/2025/01/02/<uuid>.jpg`.

mod filesystem;
mod in_memory;

use std::time::Duration;

pub use filesystem::FilesystemObjectStorage;
pub use in_memory::InMemoryObjectStorage;

/// Object storage abstraction.
#[async_trait::async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` under `key`, replacing any previous object.
    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StorageError>;

    /// A URL granting read access to `key` for `ttl`.
    async fn presign(&self, key: &str, ttl: Duration) -> Result<String, StorageError>;

    /// Read the object under `key`.
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;
}

#[async_trait::async_trait]
impl<S> ObjectStorage for std::sync::Arc<S>
where
    S: ObjectStorage + ?Sized,
{
    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StorageError> {
        (**self).upload(key, bytes, content_type).await
    }

    async fn presign(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        (**self).presign(key, ttl).await
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        (**self).get(key).await
    }
}

/// Object storage error.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("invalid object key `{0}`")]
    InvalidKey(String),
    #[error("storage io error on `{key}`: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

/// Reject keys that could escape the storage root.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if bad {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Unix timestamp at which a URL presigned now for `ttl` stops being valid.
pub(crate) fn expiry_timestamp(ttl: Duration) -> i64 {
    let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::zero());
    (chrono::Utc::now() + ttl).timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_must_stay_inside_the_root() {
        assert!(validate_key("tasks/abc.json").is_ok());
        assert!(validate_key("images/input/2025/01/02/x.jpg").is_ok());

        for bad in ["", "/etc/passwd", "a/../b", "a//b", "./a", "a\\b", "tasks/"] {
            assert!(validate_key(bad).is_err(), "{bad} should be rejected");
        }
    }
}
