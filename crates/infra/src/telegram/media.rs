use async_trait::async_trait;
use tracing::debug;

use super::api::TelegramApi;
use crate::media::{FetchedMedia, MediaError, MediaSource};

/// Resolves chat file ids through `getFile` and downloads the file.
#[derive(Debug, Clone)]
pub struct TelegramMediaSource {
    api: TelegramApi,
}

impl TelegramMediaSource {
    pub fn new(api: TelegramApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl MediaSource for TelegramMediaSource {
    async fn fetch(&self, source_ref: &str) -> Result<FetchedMedia, MediaError> {
        let file = self.api.get_file(source_ref).await?;
        let file_path = file
            .file_path
            .filter(|p| !p.is_empty())
            .ok_or_else(|| MediaError::Invalid(format!("file `{source_ref}` has no download path")))?;

        debug!(file_path = %file_path, reported_size = ?file.file_size, "downloading input");
        let (bytes, content_type) = self.api.download_file(&file_path).await?;

        Ok(FetchedMedia {
            bytes,
            path: Some(file_path),
            content_type,
        })
    }
}
