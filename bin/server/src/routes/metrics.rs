//! Prometheus scrape endpoint.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};

/// `GET /metrics`
pub async fn export(State(state): State<AppState>) -> Result<Response, ApiError> {
    let body = callflow_workflow::metrics::render(&state.registry).map_err(ApiError::internal)?;
    Ok((
        [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use crate::routes::router;
    use crate::routes::test_support::state;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use callflow_core::{NodeId, WorkflowId};
    use callflow_workflow::{Node, Workflow};
    use serde_json::json;
    use tower::ServiceExt;

    #[tokio::test]
    async fn exposes_execution_metrics() {
        let state = state();
        state
            .store()
            .create(Workflow::new("t").with_id("w1").with_node(Node::new("n1", "startCall")))
            .await
            .expect("seed");
        state
            .engine
            .execute(&WorkflowId::new("w1"), &NodeId::new("n1"), json!({}))
            .await;

        let response = router(state)
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let text = String::from_utf8(bytes.to_vec()).expect("utf8");
        assert!(text.contains("workflow_executions_total 1"));
        assert!(text.contains("node_executions_total{node_type=\"startCall\"} 1"));
        assert!(text.contains("node_execution_duration_seconds_bucket"));
    }
}
