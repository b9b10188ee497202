use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, anyhow, bail};

use pixelrelay_core::{Mode, ModeTable};

use super::Settings;

const VALID_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

impl Settings {
    /// Load configuration: optional TOML file, then process environment, then validation.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_env_overrides(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load configuration from a TOML file.
    ///
    /// Note: Environment overrides are applied separately via `apply_env_overrides()`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file {}", path.as_ref().display()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).map_err(|e| anyhow!("Failed to parse config file: {}", e))
    }

    /// Override settings from environment-style variables provided by `lookup`.
    ///
    /// Empty values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = get("TG_BOT_TOKEN") {
            self.telegram.bot_token = Some(v);
        }
        if let Some(v) = get("BASE_URL") {
            self.server.base_url = v;
        }
        if let Some(v) = get("HTTP_BIND") {
            self.server.bind = v;
        }
        if let Some(v) = get("PROCESSING_API_URL") {
            self.processing.api_url = v;
        }
        if let Some(v) = get("PROCESSING_API_TOKEN") {
            self.processing.api_token = Some(v);
        }
        if let Some(v) = get("PROCESSING_MODEL_VERSION") {
            self.processing.model_version = Some(v);
        }
        if let Some(v) = get("STORAGE_ROOT") {
            self.storage.root = v.into();
        }
        if let Some(v) = get("STORAGE_PUBLIC_URL") {
            self.storage.public_url = Some(v);
        }
        if let Some(v) = get("PRESIGN_EXPIRES_SECONDS") {
            self.storage.presign_ttl_secs = v
                .parse()
                .with_context(|| format!("PRESIGN_EXPIRES_SECONDS must be a number, got '{v}'"))?;
        }
        if let Some(v) = get("MAX_IMAGE_MB") {
            self.limits.max_image_mb = v
                .parse()
                .with_context(|| format!("MAX_IMAGE_MB must be a number, got '{v}'"))?;
        }
        if let Some(v) = get("ALLOWED_IMAGE_MIME") {
            self.limits.allowed_mime = v
                .split(',')
                .map(|m| m.trim().to_ascii_lowercase())
                .filter(|m| !m.is_empty())
                .collect();
        }
        if let Some(v) = get("DEFAULT_MODE") {
            self.limits.default_mode = v;
        }
        if let Some(v) = get("LOG_LEVEL") {
            self.logging.level = v.to_ascii_lowercase();
        }

        Ok(())
    }

    /// Validate configuration settings
    pub fn validate(&self) -> anyhow::Result<()> {
        self.server
            .bind
            .parse::<SocketAddr>()
            .with_context(|| format!("Invalid bind address '{}'", self.server.bind))?;

        for (name, url) in [
            ("server.base_url", self.server.base_url.as_str()),
            ("processing.api_url", self.processing.api_url.as_str()),
            ("telegram.api_url", self.telegram.api_url.as_str()),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                bail!("{name} must be an http(s) URL, got '{url}'");
            }
        }

        match &self.telegram.bot_token {
            Some(token) if !token.trim().is_empty() => {}
            _ => bail!("telegram.bot_token (TG_BOT_TOKEN) is required"),
        }

        if self.limits.max_image_mb == 0 {
            bail!("limits.max_image_mb must be greater than 0");
        }
        if self.limits.allowed_mime.is_empty() {
            bail!("limits.allowed_mime must list at least one type");
        }
        let default_mode = Mode::new(&self.limits.default_mode);
        let known = ModeTable::builtin().contains(&default_mode)
            || self.processing.modes.keys().any(|name| Mode::new(name) == default_mode);
        if !known {
            bail!(
                "limits.default_mode '{}' is not a known mode",
                self.limits.default_mode
            );
        }

        if self.processing.retry_attempts == 0 {
            bail!("processing.retry_attempts must be at least 1");
        }
        if self.processing.submit_timeout_secs == 0
            || self.telegram.text_timeout_secs == 0
            || self.telegram.media_timeout_secs == 0
        {
            bail!("timeouts must be greater than 0");
        }
        if self.storage.presign_ttl_secs == 0 {
            bail!("storage.presign_ttl_secs must be greater than 0");
        }

        if !VALID_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(anyhow!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                VALID_LEVELS.join(", ")
            ));
        }

        Ok(())
    }
}
