//! Configuration loading and representation.
//!
//! Settings come from an optional TOML file, then environment variables, and
//! are validated once before the process starts serving.

mod loader;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use pixelrelay_core::{InputPolicy, Mode, ModeProfile, ModeTable};
use pixelrelay_observability::LogFormat;

use crate::backend::{BackendConfig, PROVIDER_API_URL};
use crate::resilience::RetryPolicy;
use crate::telegram::{TELEGRAM_API_URL, TelegramConfig};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub telegram: TelegramSettings,
    pub processing: ProcessingSettings,
    pub storage: StorageSettings,
    pub limits: LimitSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address the HTTP server binds to.
    pub bind: String,
    /// Public base URL of this service, used to build the callback address.
    pub base_url: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            base_url: "http://localhost:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelegramSettings {
    pub bot_token: Option<String>,
    pub api_url: String,
    pub text_timeout_secs: u64,
    pub media_timeout_secs: u64,
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_url: TELEGRAM_API_URL.to_string(),
            text_timeout_secs: 10,
            media_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProcessingSettings {
    pub api_url: String,
    pub api_token: Option<String>,
    pub model_version: Option<String>,
    pub submit_timeout_secs: u64,
    pub retry_attempts: u32,
    pub retry_base_delay_ms: u64,
    /// Per-mode overrides, merged over the built-in modes.
    pub modes: BTreeMap<String, ModeProfile>,
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            api_url: PROVIDER_API_URL.to_string(),
            api_token: None,
            model_version: None,
            submit_timeout_secs: 15,
            retry_attempts: 3,
            retry_base_delay_ms: 1_000,
            modes: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub root: PathBuf,
    /// Base URL serving `root`; defaults to `{server.base_url}/objects`.
    pub public_url: Option<String>,
    pub presign_ttl_secs: u64,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./data"),
            public_url: None,
            presign_ttl_secs: 3_600,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitSettings {
    pub max_image_mb: u64,
    pub allowed_mime: Vec<String>,
    pub default_mode: String,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            max_image_mb: 10,
            allowed_mime: vec!["image/jpeg".to_string(), "image/png".to_string()],
            default_mode: "restoration".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

impl Settings {
    pub fn input_policy(&self) -> InputPolicy {
        InputPolicy::from_megabytes(self.limits.max_image_mb, self.limits.allowed_mime.clone())
    }

    /// Built-in modes plus configured ones; configured profiles win.
    pub fn mode_table(&self) -> ModeTable {
        let builtin = ModeTable::builtin();
        let mut profiles: BTreeMap<Mode, ModeProfile> = builtin
            .modes()
            .map(|mode| (mode.clone(), ModeProfile::default()))
            .collect();
        for (name, profile) in &self.processing.modes {
            profiles.insert(Mode::new(name), profile.clone());
        }
        ModeTable::new(Mode::new(&self.limits.default_mode), profiles)
    }

    pub fn callback_url(&self) -> String {
        format!("{}/webhooks/processing", self.server.base_url.trim_end_matches('/'))
    }

    pub fn storage_public_url(&self) -> String {
        match &self.storage.public_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("{}/objects", self.server.base_url.trim_end_matches('/')),
        }
    }

    pub fn presign_ttl(&self) -> Duration {
        Duration::from_secs(self.storage.presign_ttl_secs)
    }

    pub fn max_image_bytes(&self) -> u64 {
        self.input_policy().max_bytes
    }

    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            api_url: self.processing.api_url.clone(),
            api_token: self.processing.api_token.clone(),
            model_version: self.processing.model_version.clone(),
        }
    }

    pub fn submit_policy(&self) -> RetryPolicy {
        RetryPolicy::exponential(
            self.processing.retry_attempts,
            Duration::from_millis(self.processing.retry_base_delay_ms),
            Duration::from_secs(self.processing.submit_timeout_secs),
        )
    }

    /// Policy for short Bot API calls (messages, `getFile`).
    pub fn text_policy(&self) -> RetryPolicy {
        self.submit_policy()
            .with_timeout(Duration::from_secs(self.telegram.text_timeout_secs))
    }

    /// Policy for uploads and downloads.
    pub fn media_policy(&self) -> RetryPolicy {
        self.submit_policy()
            .with_timeout(Duration::from_secs(self.telegram.media_timeout_secs))
    }

    /// Bot API settings; `None` when no token is configured.
    pub fn telegram_config(&self) -> Option<TelegramConfig> {
        self.telegram.bot_token.as_ref().map(|token| TelegramConfig {
            api_url: self.telegram.api_url.clone(),
            bot_token: token.clone(),
        })
    }
}
