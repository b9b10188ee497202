use serde::{Deserialize, Serialize};
use serde_json::Value;

use pixelrelay_core::{JobEvent, resolve_output};

use crate::envelope::{Envelope, EventSource};

/// A completion (or progress) report from the processing backend.
///
/// Accepts both `externalId` and the backend's native `id` for the job id.
/// `output` may be a string, an array of strings, or anything else; `error`
/// may be a string or an object with a `message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackEvent {
    #[serde(alias = "id")]
    pub external_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorPayload {
    Text(String),
    Detail {
        #[serde(default)]
        message: Option<String>,
    },
    Other(Value),
}

impl ErrorPayload {
    pub fn message(&self) -> Option<String> {
        match self {
            ErrorPayload::Text(text) => Some(text.clone()),
            ErrorPayload::Detail { message } => message.clone(),
            ErrorPayload::Other(Value::Null) => None,
            ErrorPayload::Other(other) => Some(other.to_string()),
        }
    }
}

impl CallbackEvent {
    /// Resolved output reference, if the callback carried a usable one.
    pub fn output_ref(&self) -> Option<String> {
        resolve_output(self.output.as_ref())
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().and_then(ErrorPayload::message)
    }

    /// The domain event this callback reports.
    pub fn to_job_event(&self) -> JobEvent {
        JobEvent::from_reported(&self.status, self.output_ref(), self.error_message())
    }
}

impl From<CallbackEvent> for Envelope<CallbackEvent> {
    fn from(event: CallbackEvent) -> Self {
        Envelope::received(EventSource::ProcessingBackend, event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_native_backend_payload() {
        let event: CallbackEvent = serde_json::from_value(json!({
            "id": "ufawqhfynnddngldkgtslldrkq",
            "version": "5c7d5dc6dd8bf75c1acaa8565735e7986bc5b66206b55cca93cb72c9bf15ccaa",
            "status": "succeeded",
            "output": ["https://replicate.delivery/pbxt/out.png"],
            "error": null,
            "metrics": { "predict_time": 4.2 }
        }))
        .unwrap();

        assert_eq!(event.external_id, "ufawqhfynnddngldkgtslldrkq");
        assert_eq!(
            event.to_job_event(),
            JobEvent::Succeeded {
                output: Some("https://replicate.delivery/pbxt/out.png".into())
            }
        );
    }

    #[test]
    fn error_may_be_text_or_object() {
        let text: CallbackEvent = serde_json::from_value(json!({
            "externalId": "a", "status": "failed", "error": "CUDA out of memory"
        }))
        .unwrap();
        assert_eq!(text.error_message().as_deref(), Some("CUDA out of memory"));

        let object: CallbackEvent = serde_json::from_value(json!({
            "externalId": "a", "status": "failed", "error": { "message": "bad input" }
        }))
        .unwrap();
        assert_eq!(object.error_message().as_deref(), Some("bad input"));

        let empty: CallbackEvent = serde_json::from_value(json!({
            "externalId": "a", "status": "failed", "error": {}
        }))
        .unwrap();
        assert_eq!(empty.to_job_event(), JobEvent::Failed { message: None });
    }

    #[test]
    fn missing_status_is_unrecognized() {
        let event: CallbackEvent = serde_json::from_value(json!({ "externalId": "a" })).unwrap();
        assert!(matches!(event.to_job_event(), JobEvent::Unrecognized { .. }));
    }

    #[test]
    fn job_id_is_required() {
        assert!(serde_json::from_value::<CallbackEvent>(json!({ "status": "succeeded" })).is_err());
    }
}
