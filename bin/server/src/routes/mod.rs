//! HTTP routes.

pub mod cache;
pub mod events;
pub mod execute;
pub mod metrics;
pub mod voice;
pub mod workflows;

use crate::state::AppState;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{Value as JsonValue, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Successful response body: `{"success": true, "data": ...}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

/// Wraps data in a success envelope.
pub fn ok<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        data,
    })
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route(
            "/api/workflows",
            get(workflows::list).post(workflows::create),
        )
        .route(
            "/api/workflows/{workflow_id}",
            get(workflows::get)
                .put(workflows::update)
                .delete(workflows::delete),
        )
        .route("/api/execute/node/{node_id}", post(execute::execute_node))
        .route("/api/events/{workflow_id}", get(events::stream_events))
        .route("/api/cache/{node_id}", get(cache::get_cached))
        .route("/api/voice/call", post(voice::initiate_call))
        .route("/api/voice/speech-to-text", post(voice::speech_to_text))
        .route("/api/voice/text-to-speech", post(voice::text_to_speech))
        .route("/metrics", get(metrics::export))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> Json<JsonValue> {
    Json(json!({"message": "Welcome to AI Call Flow Builder API"}))
}


#[cfg(test)]
mod tests {
    use super::test_support::{send, state};
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn root_returns_welcome_message() {
        let app = router(state());
        let (status, body) = send(&app, "GET", "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Welcome to AI Call Flow Builder API");
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let app = router(state());
        let (status, _) = send(&app, "GET", "/api/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
