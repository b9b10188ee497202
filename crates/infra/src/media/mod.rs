//! Media source: turns the submission's source reference into image bytes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::resilience::CallError;

/// Downloaded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedMedia {
    pub bytes: Vec<u8>,
    /// Path or file name reported by the source, used for type inference.
    pub path: Option<String>,
    pub content_type: Option<String>,
}

impl FetchedMedia {
    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Media source abstraction.
#[async_trait::async_trait]
pub trait MediaSource: Send + Sync {
    async fn fetch(&self, source_ref: &str) -> Result<FetchedMedia, MediaError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MediaError {
    #[error("media `{0}` not found")]
    NotFound(String),
    #[error("media transfer failed: {0}")]
    Transport(#[from] CallError),
    #[error("media source returned an invalid answer: {0}")]
    Invalid(String),
}

/// Media source serving fixed payloads, for tests/dev.
#[derive(Debug, Default)]
pub struct StaticMediaSource {
    items: HashMap<String, FetchedMedia>,
    fetches: AtomicUsize,
}

impl StaticMediaSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, source_ref: impl Into<String>, media: FetchedMedia) -> Self {
        self.items.insert(source_ref.into(), media);
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl MediaSource for StaticMediaSource {
    async fn fetch(&self, source_ref: &str) -> Result<FetchedMedia, MediaError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.items
            .get(source_ref)
            .cloned()
            .ok_or_else(|| MediaError::NotFound(source_ref.to_string()))
    }
}
