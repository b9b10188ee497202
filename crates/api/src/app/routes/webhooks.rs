use std::sync::Arc;

use axum::{Json, body::Bytes, extract::Extension};
use serde_json::{Value, json};
use tracing::warn;

use pixelrelay_events::CallbackEvent;

use crate::app::services::AppServices;

/// `POST /webhooks/processing`
///
/// Always answers `200 {"ok":true}` so the backend never redelivers because
/// of our own failures; outcomes are visible in the logs only.
pub async fn processing_callback(
    Extension(services): Extension<Arc<AppServices>>,
    body: Bytes,
) -> Json<Value> {
    match serde_json::from_slice::<CallbackEvent>(&body) {
        Ok(event) => {
            services.orchestrator.on_callback(event).await;
        }
        Err(err) => {
            warn!(error = %err, bytes = body.len(), "undecodable processing callback");
        }
    }

    Json(json!({ "ok": true }))
}
