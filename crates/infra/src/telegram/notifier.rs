use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, warn};

use pixelrelay_core::Owner;

use super::api::{TelegramApi, Upload, UploadKind};
use crate::notify::{NotificationSink, NotifyError};

/// Photo types the Bot API reliably accepts through `sendPhoto`.
const PHOTO_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

/// Delivers notifications to the chat the job came from.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    api: TelegramApi,
    /// Larger results are sent as documents.
    max_photo_bytes: u64,
}

impl TelegramNotifier {
    pub fn new(api: TelegramApi, max_photo_bytes: u64) -> Self {
        Self { api, max_photo_bytes }
    }

    fn upload_kind(&self, upload: &Upload) -> UploadKind {
        let photo_type = PHOTO_TYPES.contains(&upload.content_type.as_str());
        if photo_type && upload.bytes.len() as u64 <= self.max_photo_bytes {
            UploadKind::Photo
        } else {
            UploadKind::Document
        }
    }
}

fn is_url(image_ref: &str) -> bool {
    image_ref.starts_with("http://") || image_ref.starts_with("https://")
}

/// Build an upload from downloaded bytes, naming the file after its type.
pub(crate) fn upload_from_download(url: &str, bytes: Vec<u8>, content_type: Option<String>) -> Upload {
    let url_path = url.split(['?', '#']).next().unwrap_or_default();
    let guessed = mime_guess::from_path(url_path).first_raw().map(str::to_string);
    let content_type = content_type
        .or(guessed)
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let extension = match content_type.as_str() {
        "image/jpeg" => Some("jpg".to_string()),
        "image/png" => Some("png".to_string()),
        _ => Path::new(url_path)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase),
    };
    let file_name = match extension {
        Some(ext) => format!("result.{ext}"),
        None => "result".to_string(),
    };

    Upload {
        bytes,
        file_name,
        content_type,
    }
}

#[async_trait]
impl NotificationSink for TelegramNotifier {
    async fn send_text(&self, owner: Owner, text: &str) -> Result<(), NotifyError> {
        self.api.send_message(owner.chat_id.get(), text).await?;
        Ok(())
    }

    async fn send_image(&self, owner: Owner, image_ref: &str, caption: &str) -> Result<(), NotifyError> {
        let chat_id = owner.chat_id.get();

        if !is_url(image_ref) {
            self.api.send_photo_ref(chat_id, image_ref, caption).await?;
            return Ok(());
        }

        // The Bot API cannot always reach backend URLs, so results are re-uploaded.
        let (bytes, content_type) = self
            .api
            .download(image_ref)
            .await
            .map_err(NotifyError::Download)?;
        let upload = upload_from_download(image_ref, bytes, content_type);
        let kind = self.upload_kind(&upload);
        debug!(chat_id, ?kind, content_type = %upload.content_type, size = upload.bytes.len(), "uploading result");

        match self.api.send_upload(kind, chat_id, &upload, caption).await {
            Ok(()) => Ok(()),
            Err(err) if kind == UploadKind::Photo && err.last_error().status_code() == Some(400) => {
                warn!(chat_id, error = %err, "photo rejected, retrying as document");
                self.api
                    .send_upload(UploadKind::Document, chat_id, &upload, caption)
                    .await?;
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::body::Bytes;
    use axum::extract::{Path as UrlPath, State};
    use axum::http::{StatusCode, header};
    use axum::response::IntoResponse;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use pixelrelay_core::{ChatId, UserId};
    use serde_json::{Value, json};

    use crate::resilience::{ResilientCaller, RetryPolicy};
    use crate::telegram::TelegramConfig;

    #[derive(Clone, Default)]
    struct Recorder {
        calls: Arc<Mutex<Vec<(String, String)>>>,
        reject_photos: bool,
    }

    async fn bot_method(
        State(recorder): State<Recorder>,
        UrlPath((_token, method)): UrlPath<(String, String)>,
        body: Bytes,
    ) -> (StatusCode, Json<Value>) {
        let body = String::from_utf8_lossy(&body).to_string();
        recorder.calls.lock().unwrap().push((method.clone(), body));

        if method == "sendPhoto" && recorder.reject_photos {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "ok": false, "description": "Bad Request: IMAGE_PROCESS_FAILED" })),
            );
        }
        (StatusCode::OK, Json(json!({ "ok": true, "result": { "message_id": 1 } })))
    }

    async fn result_png() -> impl IntoResponse {
        ([(header::CONTENT_TYPE, "image/png")], vec![0x89u8, b'P', b'N', b'G'])
    }

    async fn result_webp() -> impl IntoResponse {
        ([(header::CONTENT_TYPE, "image/webp")], vec![1u8, 2, 3])
    }

    async fn spawn(reject_photos: bool) -> (String, Recorder) {
        let recorder = Recorder {
            reject_photos,
            ..Recorder::default()
        };
        let app = Router::new()
            .route("/:token/:method", post(bot_method))
            .route("/out/result.png", get(result_png))
            .route("/out/result.webp", get(result_webp))
            .with_state(recorder.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), recorder)
    }

    fn notifier(base: &str, max_photo_bytes: u64) -> TelegramNotifier {
        let caller = ResilientCaller::new(RetryPolicy::exponential(
            2,
            Duration::from_millis(10),
            Duration::from_secs(5),
        ));
        let api = TelegramApi::new(
            reqwest::Client::new(),
            TelegramConfig {
                api_url: base.to_string(),
                bot_token: "42:token".to_string(),
            },
            caller.clone(),
            caller,
        );
        TelegramNotifier::new(api, max_photo_bytes)
    }

    fn owner() -> Owner {
        Owner::new(ChatId::new(777), UserId::new(1))
    }

    fn methods(recorder: &Recorder) -> Vec<String> {
        recorder.calls.lock().unwrap().iter().map(|(m, _)| m.clone()).collect()
    }

    #[tokio::test]
    async fn text_goes_through_send_message() {
        let (base, recorder) = spawn(false).await;

        notifier(&base, 1024).send_text(owner(), "hello").await.unwrap();

        let calls = recorder.calls.lock().unwrap();
        assert_eq!(calls[0].0, "sendMessage");
        let body: Value = serde_json::from_str(&calls[0].1).unwrap();
        assert_eq!(body, json!({ "chat_id": 777, "text": "hello" }));
    }

    #[tokio::test]
    async fn url_results_are_uploaded_as_photos() {
        let (base, recorder) = spawn(false).await;

        notifier(&base, 1024)
            .send_image(owner(), &format!("{base}/out/result.png"), "done")
            .await
            .unwrap();

        assert_eq!(methods(&recorder), vec!["sendPhoto".to_string()]);
        let calls = recorder.calls.lock().unwrap();
        assert!(calls[0].1.contains("name=\"photo\"; filename=\"result.png\""));
        assert!(calls[0].1.contains("done"));
    }

    #[tokio::test]
    async fn rejected_photo_falls_back_to_document() {
        let (base, recorder) = spawn(true).await;

        notifier(&base, 1024)
            .send_image(owner(), &format!("{base}/out/result.png"), "done")
            .await
            .unwrap();

        assert_eq!(
            methods(&recorder),
            vec!["sendPhoto".to_string(), "sendDocument".to_string()]
        );
    }

    #[tokio::test]
    async fn unusual_types_and_large_files_go_as_documents() {
        let (base, recorder) = spawn(false).await;

        notifier(&base, 1024)
            .send_image(owner(), &format!("{base}/out/result.webp"), "done")
            .await
            .unwrap();
        notifier(&base, 2)
            .send_image(owner(), &format!("{base}/out/result.png"), "done")
            .await
            .unwrap();

        assert_eq!(
            methods(&recorder),
            vec!["sendDocument".to_string(), "sendDocument".to_string()]
        );
    }

    #[tokio::test]
    async fn file_ids_are_sent_by_reference() {
        let (base, recorder) = spawn(false).await;

        notifier(&base, 1024)
            .send_image(owner(), "AgACAgIAAxkBAAIBZ2", "done")
            .await
            .unwrap();

        let calls = recorder.calls.lock().unwrap();
        assert_eq!(calls[0].0, "sendPhoto");
        let body: Value = serde_json::from_str(&calls[0].1).unwrap();
        assert_eq!(body["photo"], "AgACAgIAAxkBAAIBZ2");
    }

    #[test]
    fn upload_names_follow_content_type() {
        let upload = upload_from_download("https://x/out.bin?sig=1", vec![1], Some("image/jpeg".into()));
        assert_eq!(upload.file_name, "result.jpg");

        let guessed = upload_from_download("https://x/out.png?sig=1", vec![1], None);
        assert_eq!(guessed.content_type, "image/png");
        assert_eq!(guessed.file_name, "result.png");
    }
}
