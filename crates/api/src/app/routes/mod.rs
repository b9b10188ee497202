use axum::{
    Router,
    routing::{get, post},
};

pub mod objects;
pub mod submissions;
pub mod system;
pub mod webhooks;

/// Router for the inbound event endpoints and object serving.
pub fn router() -> Router {
    Router::new()
        .route("/events/submission", post(submissions::submit))
        .route("/webhooks/processing", post(webhooks::processing_callback))
        .route("/objects/*key", get(objects::get_object))
}
