use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::error;

use crate::app::errors::json_error;
use crate::app::services::AppServices;

/// Only uploaded inputs are reachable; job documents are not.
const SERVED_PREFIX: &str = "images/";

#[derive(Debug, Deserialize)]
pub struct ObjectQuery {
    pub expires: Option<i64>,
}

/// `GET /objects/*key?expires=<unix seconds>`
pub async fn get_object(
    Extension(services): Extension<Arc<AppServices>>,
    Path(key): Path<String>,
    Query(query): Query<ObjectQuery>,
) -> Response {
    let Some(storage) = services.objects.as_ref() else {
        return json_error(StatusCode::NOT_FOUND, "not_found", "object serving is disabled");
    };

    if !key.starts_with(SERVED_PREFIX) {
        return json_error(StatusCode::NOT_FOUND, "not_found", "not found");
    }

    match query.expires {
        Some(expires) if expires >= Utc::now().timestamp() => {}
        _ => return json_error(StatusCode::FORBIDDEN, "link_expired", "link expired"),
    }

    match storage.get(&key).await {
        Ok(bytes) => {
            let content_type = mime_guess::from_path(&key).first_or_octet_stream();
            ([(header::CONTENT_TYPE, content_type.essence_str().to_string())], bytes).into_response()
        }
        Err(err) if err.is_not_found() => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        Err(err) => {
            error!(key = %key, error = %err, "failed to read object");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", "failed to read object")
        }
    }
}
