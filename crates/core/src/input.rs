//! Input policy: what images are accepted and where they are stored.

use chrono::{DateTime, Datelike, Utc};
use uuid::Uuid;

use crate::error::ValidationError;

pub const DEFAULT_MIME: &str = "image/jpeg";

/// Limits applied to every submitted image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPolicy {
    pub max_bytes: u64,
    pub allowed_mime: Vec<String>,
}

impl Default for InputPolicy {
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024,
            allowed_mime: vec!["image/jpeg".to_string(), "image/png".to_string()],
        }
    }
}

impl InputPolicy {
    pub fn from_megabytes(max_mb: u64, allowed_mime: Vec<String>) -> Self {
        Self {
            max_bytes: max_mb.saturating_mul(1024 * 1024),
            allowed_mime: allowed_mime
                .into_iter()
                .map(|m| m.trim().to_ascii_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }

    /// Limit in whole megabytes, for user-facing text.
    pub fn max_megabytes(&self) -> u64 {
        self.max_bytes / (1024 * 1024)
    }

    pub fn check_size(&self, size_bytes: u64) -> Result<(), ValidationError> {
        if size_bytes > self.max_bytes {
            return Err(ValidationError::Oversize {
                size_bytes,
                limit_bytes: self.max_bytes,
            });
        }
        Ok(())
    }

    pub fn check_mime(&self, mime_type: &str) -> Result<(), ValidationError> {
        let normalized = normalize_mime(mime_type);
        if self.allowed_mime.iter().any(|allowed| *allowed == normalized) {
            Ok(())
        } else {
            Err(ValidationError::UnsupportedMime {
                mime_type: normalized,
            })
        }
    }
}

/// Lower-case a mime type, drop parameters, and fold `image/jpg` into `image/jpeg`.
pub fn normalize_mime(mime_type: &str) -> String {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if essence == "image/jpg" {
        DEFAULT_MIME.to_string()
    } else {
        essence
    }
}

/// File extension used for stored objects of a given mime type.
pub fn extension_for(mime_type: &str) -> &'static str {
    match normalize_mime(mime_type).as_str() {
        "image/png" => ".png",
        "image/webp" => ".webp",
        "image/gif" => ".gif",
        _ => ".jpg",
    }
}

/// Storage key for an uploaded input: `images/input/{YYYY}/{MM}/{DD}/{id}{ext}`.
pub fn input_storage_key(at: DateTime<Utc>, id: Uuid, mime_type: &str) -> String {
    format!(
        "images/input/{:04}/{:02}/{:02}/{}{}",
        at.year(),
        at.month(),
        at.day(),
        id,
        extension_for(mime_type)
    )
}
