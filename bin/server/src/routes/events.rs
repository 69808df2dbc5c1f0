//! Event streaming handler.

use crate::state::AppState;
use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use callflow_core::WorkflowId;
use futures::stream::{Stream, StreamExt};
use std::time::Duration;
use tracing::info;

/// `GET /api/events/{workflow_id}`
///
/// Streams the workflow's execution events as server-sent events. The SSE
/// event name is the event type and the data is the JSON event. The stream
/// ends when the server shuts down or the subscriber falls too far behind.
pub async fn stream_events(
    State(state): State<AppState>,
    Path(workflow_id): Path<WorkflowId>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let subscription = state.engine.bus().subscribe(&workflow_id);
    info!(%workflow_id, subscription = %subscription.id(), "starting event stream");

    let shutdown = state.shutdown.clone();
    let stream = subscription
        .take_until(async move { shutdown.cancelled().await })
        .map(|event| Event::default().event(event.event_type()).json_data(&event));

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

#[cfg(test)]
mod tests {
    use crate::routes::router;
    use crate::routes::test_support::state;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use callflow_core::{NodeId, WorkflowId};
    use callflow_workflow::{Node, Workflow};
    use futures::StreamExt;
    use serde_json::json;
    use tower::ServiceExt;

    #[tokio::test]
    async fn streams_events_until_shutdown() {
        let state = state();
        state
            .store()
            .create(
                Workflow::new("Sales")
                    .with_id("w1")
                    .with_node(Node::new("n1", "endCall")),
            )
            .await
            .expect("seed");
        let app = router(state.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/events/w1")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok()),
            Some("text/event-stream")
        );

        let workflow_id = WorkflowId::new("w1");
        assert_eq!(state.engine.bus().subscriber_count(&workflow_id), 1);

        let outcome = state
            .engine
            .execute(&workflow_id, &NodeId::new("n1"), json!({}))
            .await;
        assert!(outcome.is_success());

        let mut body = response.into_body().into_data_stream();
        let mut text = String::new();
        while !text.contains("\"outcome\":\"success\"") {
            let chunk = body.next().await.expect("stream open").expect("chunk");
            text.push_str(std::str::from_utf8(&chunk).expect("utf8"));
        }

        state.shutdown.cancel();
        assert!(body.next().await.is_none());

        assert!(text.contains("event: node_execution_start"));
        assert!(text.contains("event: node_execution_complete"));
        let start = text.find("node_execution_start").expect("start");
        let complete = text.find("node_execution_complete").expect("complete");
        assert!(start < complete);
    }
}
