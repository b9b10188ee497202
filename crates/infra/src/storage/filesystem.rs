use std::path::{Path, PathBuf};
use std::time::Duration;

use uuid::Uuid;

use super::{ObjectStorage, StorageError, expiry_timestamp, validate_key};

/// Object storage on a local directory.
///
/// Presigned URLs point at `public_base_url`, which is expected to serve the
/// same directory (the API's `/objects` route does).
#[derive(Debug, Clone)]
pub struct FilesystemObjectStorage {
    root: PathBuf,
    public_base_url: String,
}

impl FilesystemObjectStorage {
    pub fn new<P: AsRef<Path>>(root: P, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(key.split('/').fold(self.root.clone(), |path, segment| path.join(segment)))
    }
}

fn io_error(key: &str) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        key: key.to_string(),
        source,
    }
}

#[async_trait::async_trait]
impl ObjectStorage for FilesystemObjectStorage {
    async fn upload(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_error(key))?;
        }

        // Write to a sibling temp file and rename so readers never see a partial object.
        let tmp = path.with_file_name(format!(".{}.tmp", Uuid::new_v4()));
        tokio::fs::write(&tmp, &bytes).await.map_err(io_error(key))?;
        if let Err(err) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(io_error(key)(err));
        }
        Ok(())
    }

    async fn presign(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        validate_key(key)?;
        Ok(format!(
            "{}/{}?expires={}",
            self.public_base_url,
            key,
            expiry_timestamp(ttl)
        ))
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(err) => Err(io_error(key)(err)),
        }
    }
}
