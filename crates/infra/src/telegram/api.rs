use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::resilience::{CallError, ResilientCaller, UpstreamError};

pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelegramConfig {
    pub api_url: String,
    pub bot_token: String,
}

/// File metadata returned by `getFile`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TelegramFile {
    pub file_id: String,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
}

/// Bytes to upload through multipart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Photo,
    Document,
}

impl UploadKind {
    fn method(&self) -> &'static str {
        match self {
            UploadKind::Photo => "sendPhoto",
            UploadKind::Document => "sendDocument",
        }
    }

    fn field(&self) -> &'static str {
        match self {
            UploadKind::Photo => "photo",
            UploadKind::Document => "document",
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

/// Thin Bot API client. Text calls and media calls use separate retry policies
/// so that uploads get a longer per-attempt timeout.
#[derive(Debug, Clone)]
pub struct TelegramApi {
    client: reqwest::Client,
    config: TelegramConfig,
    text_caller: ResilientCaller,
    media_caller: ResilientCaller,
}

impl TelegramApi {
    pub fn new(
        client: reqwest::Client,
        config: TelegramConfig,
        text_caller: ResilientCaller,
        media_caller: ResilientCaller,
    ) -> Self {
        Self {
            client,
            config,
            text_caller,
            media_caller,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.bot_token,
            method
        )
    }

    fn file_url(&self, file_path: &str) -> String {
        format!(
            "{}/file/bot{}/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.bot_token,
            file_path.trim_start_matches('/')
        )
    }

    async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, UpstreamError> {
        let response = UpstreamError::check(response).await?;
        let body: ApiResponse<T> = response.json().await?;
        match (body.ok, body.result) {
            (true, Some(result)) => Ok(result),
            (_, _) => Err(UpstreamError::Decode(
                body.description
                    .unwrap_or_else(|| "bot api answered without a result".to_string()),
            )),
        }
    }

    async fn call_json<T: DeserializeOwned>(
        &self,
        caller: &ResilientCaller,
        method: &str,
        payload: Value,
    ) -> Result<T, CallError> {
        let url = self.method_url(method);
        caller
            .call(method, || {
                let request = self.client.post(&url).json(&payload);
                async move { Self::read::<T>(request.send().await?).await }
            })
            .await
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), CallError> {
        let payload = json!({ "chat_id": chat_id, "text": text });
        self.call_json::<Value>(&self.text_caller, "sendMessage", payload)
            .await
            .map(|_| ())
    }

    /// Send a photo the Bot API can resolve itself (a file id).
    pub async fn send_photo_ref(&self, chat_id: i64, photo: &str, caption: &str) -> Result<(), CallError> {
        let payload = json!({ "chat_id": chat_id, "photo": photo, "caption": caption });
        self.call_json::<Value>(&self.text_caller, "sendPhoto", payload)
            .await
            .map(|_| ())
    }

    /// Upload bytes as a photo or a document.
    pub async fn send_upload(
        &self,
        kind: UploadKind,
        chat_id: i64,
        upload: &Upload,
        caption: &str,
    ) -> Result<(), CallError> {
        let url = self.method_url(kind.method());
        self.media_caller
            .call(kind.method(), || {
                let part = reqwest::multipart::Part::bytes(upload.bytes.clone())
                    .file_name(upload.file_name.clone())
                    .mime_str(&upload.content_type);
                let client = self.client.clone();
                let url = url.clone();
                let chat_id = chat_id.to_string();
                let caption = caption.to_string();
                async move {
                    let form = reqwest::multipart::Form::new()
                        .text("chat_id", chat_id)
                        .text("caption", caption)
                        .part(kind.field(), part?);
                    Self::read::<Value>(client.post(&url).multipart(form).send().await?).await
                }
            })
            .await
            .map(|_| ())
    }

    pub async fn get_file(&self, file_id: &str) -> Result<TelegramFile, CallError> {
        self.call_json(&self.text_caller, "getFile", json!({ "file_id": file_id }))
            .await
    }

    /// Download a file previously resolved with [`TelegramApi::get_file`].
    pub async fn download_file(&self, file_path: &str) -> Result<(Vec<u8>, Option<String>), CallError> {
        let url = self.file_url(file_path);
        self.download(&url).await
    }

    /// Download any URL (redirects are followed), returning bytes and content type.
    pub async fn download(&self, url: &str) -> Result<(Vec<u8>, Option<String>), CallError> {
        self.media_caller
            .call("download", || {
                let request = self.client.get(url);
                async move {
                    let response = UpstreamError::check(request.send().await?).await?;
                    let content_type = response
                        .headers()
                        .get(reqwest::header::CONTENT_TYPE)
                        .and_then(|v| v.to_str().ok())
                        .map(|v| v.split(';').next().unwrap_or_default().trim().to_ascii_lowercase())
                        .filter(|v| !v.is_empty());
                    let bytes = response.bytes().await?;
                    Ok::<_, UpstreamError>((bytes.to_vec(), content_type))
                }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> TelegramApi {
        TelegramApi::new(
            reqwest::Client::new(),
            TelegramConfig {
                api_url: "https://api.telegram.org/".into(),
                bot_token: "123:abc".into(),
            },
            ResilientCaller::default(),
            ResilientCaller::default(),
        )
    }

    #[test]
    fn urls_follow_bot_api_layout() {
        let api = api();
        assert_eq!(
            api.method_url("sendMessage"),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
        assert_eq!(
            api.file_url("/photos/file_1.jpg"),
            "https://api.telegram.org/file/bot123:abc/photos/file_1.jpg"
        );
    }
}
