use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use pixelrelay_events::SubmissionEvent;

use crate::app::errors::json_error;
use crate::app::services::AppServices;

/// `POST /events/submission`
///
/// A handled rejection is still a `200`: the requester has already been told.
pub async fn submit(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<SubmissionEvent>, JsonRejection>,
) -> Response {
    let Json(event) = match payload {
        Ok(event) => event,
        Err(rejection) => {
            return json_error(StatusCode::BAD_REQUEST, "invalid_submission", rejection.body_text());
        }
    };

    match services.orchestrator.submit(event).await {
        Ok(receipt) => (
            StatusCode::ACCEPTED,
            Json(json!({ "ok": true, "job_id": receipt.job_id })),
        )
            .into_response(),
        Err(err) => (
            StatusCode::OK,
            Json(json!({ "ok": false, "error": err.code() })),
        )
            .into_response(),
    }
}
