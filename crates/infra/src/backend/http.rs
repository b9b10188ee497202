use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{info, warn};

use pixelrelay_core::JobId;

use super::{Accepted, BackendError, ProcessingBackend, SubmissionRequest};
use crate::resilience::{ResilientCaller, UpstreamError};

/// Base URL of the public prediction provider.
pub const PROVIDER_API_URL: &str = "https://api.replicate.com";

/// Which flavour of backend the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// A local stand-in: no credentials, no model version.
    Mock,
    /// The real provider: token and model version are mandatory.
    Provider,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub api_url: String,
    pub api_token: Option<String>,
    pub model_version: Option<String>,
}

impl BackendConfig {
    pub fn kind(&self) -> BackendKind {
        let is_public = self.api_url.trim_end_matches('/') == PROVIDER_API_URL;
        if is_public || self.api_token.is_some() {
            BackendKind::Provider
        } else {
            BackendKind::Mock
        }
    }

    pub fn predictions_url(&self) -> String {
        format!("{}/v1/predictions", self.api_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct PredictionResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// HTTP client for the prediction API.
#[derive(Debug, Clone)]
pub struct HttpProcessingBackend {
    client: reqwest::Client,
    config: BackendConfig,
    caller: ResilientCaller,
}

impl HttpProcessingBackend {
    pub fn new(client: reqwest::Client, config: BackendConfig, caller: ResilientCaller) -> Self {
        Self {
            client,
            config,
            caller,
        }
    }

    pub fn kind(&self) -> BackendKind {
        self.config.kind()
    }

    /// Request body for a submission, or a configuration error in provider mode.
    fn build_body(&self, request: &SubmissionRequest) -> Result<(Value, Option<String>), BackendError> {
        let mut input = Map::new();
        for (key, value) in &request.profile.input {
            input.insert(key.clone(), value.clone());
        }
        input.insert("image".to_string(), Value::String(request.input_url.clone()));

        let mut body = json!({
            "input": Value::Object(input),
            "webhook": request.callback_url,
            "webhook_events_filter": ["completed"],
        });

        let version = request
            .profile
            .model_version
            .clone()
            .or_else(|| self.config.model_version.clone());

        if self.kind() == BackendKind::Provider {
            if self.config.api_token.is_none() {
                return Err(BackendError::Configuration(
                    "provider mode requires an API token".to_string(),
                ));
            }
            let Some(version) = version.clone() else {
                return Err(BackendError::Configuration(format!(
                    "provider mode requires a model version (mode `{}`)",
                    request.mode
                )));
            };
            body["version"] = Value::String(version);
        }

        Ok((body, version))
    }
}

#[async_trait::async_trait]
impl ProcessingBackend for HttpProcessingBackend {
    async fn submit(&self, request: &SubmissionRequest) -> Result<Accepted, BackendError> {
        let (body, model_version) = self.build_body(request)?;
        let url = self.config.predictions_url();

        let response: PredictionResponse = self
            .caller
            .call("create prediction", || {
                let mut builder = self.client.post(&url).json(&body);
                if let Some(token) = &self.config.api_token {
                    builder = builder.header(reqwest::header::AUTHORIZATION, format!("Token {token}"));
                }
                async move {
                    let response = UpstreamError::check(builder.send().await?).await?;
                    Ok::<_, UpstreamError>(response.json::<PredictionResponse>().await?)
                }
            })
            .await
            .map_err(|err| {
                warn!(mode = %request.mode, error = %err, "prediction request failed");
                BackendError::from(err)
            })?;

        let id = response
            .id
            .ok_or_else(|| BackendError::InvalidResponse("response has no prediction id".to_string()))?;
        let id = JobId::parse(id).map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

        info!(
            job_id = %id,
            mode = %request.mode,
            status = response.status.as_deref().unwrap_or("unknown"),
            "prediction created"
        );

        Ok(Accepted {
            id,
            status: response.status,
            model_version,
        })
    }
}
