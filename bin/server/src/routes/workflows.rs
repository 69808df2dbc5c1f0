//! Workflow CRUD handlers.

use super::{Envelope, ok};
use crate::error::ApiError;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, State};
use callflow_core::WorkflowId;
use callflow_workflow::Workflow;
use serde_json::{Value as JsonValue, json};
use tracing::info;

/// `GET /api/workflows`
pub async fn list(State(state): State<AppState>) -> Result<Json<Envelope<Vec<Workflow>>>, ApiError> {
    let workflows = state.store().list().await.map_err(ApiError::internal)?;
    Ok(ok(workflows))
}

/// `GET /api/workflows/{workflow_id}`
pub async fn get(
    State(state): State<AppState>,
    Path(workflow_id): Path<WorkflowId>,
) -> Result<Json<Envelope<Workflow>>, ApiError> {
    state
        .store()
        .find(&workflow_id)
        .await
        .map_err(ApiError::internal)?
        .map(ok)
        .ok_or_else(ApiError::workflow_not_found)
}

/// `POST /api/workflows`
pub async fn create(
    State(state): State<AppState>,
    Json(workflow): Json<Workflow>,
) -> Result<Json<Envelope<Workflow>>, ApiError> {
    let created = state
        .store()
        .create(workflow)
        .await
        .map_err(|report| ApiError::store(report.current_context()))?;
    info!(workflow_id = %created.id, "workflow created");
    Ok(ok(created))
}

/// `PUT /api/workflows/{workflow_id}`
pub async fn update(
    State(state): State<AppState>,
    Path(workflow_id): Path<WorkflowId>,
    Json(workflow): Json<Workflow>,
) -> Result<Json<Envelope<Workflow>>, ApiError> {
    state
        .store()
        .update(&workflow_id, workflow)
        .await
        .map_err(|report| ApiError::store(report.current_context()))?
        .map(ok)
        .ok_or_else(ApiError::workflow_not_found)
}

/// `DELETE /api/workflows/{workflow_id}`
pub async fn delete(
    State(state): State<AppState>,
    Path(workflow_id): Path<WorkflowId>,
) -> Result<Json<JsonValue>, ApiError> {
    let removed = state
        .store()
        .delete(&workflow_id)
        .await
        .map_err(ApiError::internal)?;
    if !removed {
        return Err(ApiError::workflow_not_found());
    }
    info!(%workflow_id, "workflow deleted");
    Ok(Json(json!({"success": true})))
}

#[cfg(test)]
mod tests {
    use crate::routes::router;
    use crate::routes::test_support::{send, state};
    use axum::http::StatusCode;
    use serde_json::json;

    fn document(id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": "Sales call",
            "nodes": [
                {"id": "1", "type": "startCall", "data": {}, "position": {"x": 0.0, "y": 0.0}},
                {"id": "2", "type": "playAudio", "data": {"audioMessage": "Hi"}, "position": {"x": 0.0, "y": 100.0}}
            ],
            "edges": [{"id": "e1-2", "source": "1", "target": "2"}]
        })
    }

    #[tokio::test]
    async fn crud_lifecycle() {
        let app = router(state());

        let (status, body) = send(&app, "POST", "/api/workflows", Some(document("w1"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["id"], "w1");

        let (status, body) = send(&app, "GET", "/api/workflows", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

        let mut renamed = document("w1");
        renamed["name"] = json!("Renamed");
        let (status, body) = send(&app, "PUT", "/api/workflows/w1", Some(renamed)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Renamed");

        let (status, body) = send(&app, "GET", "/api/workflows/w1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["nodes"][1]["data"]["audioMessage"], "Hi");

        let (status, body) = send(&app, "DELETE", "/api/workflows/w1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true}));

        let (status, body) = send(&app, "GET", "/api/workflows/w1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Workflow not found");
    }

    #[tokio::test]
    async fn missing_workflow_is_404_for_update_and_delete() {
        let app = router(state());
        let (status, _) = send(&app, "PUT", "/api/workflows/nope", Some(document("nope"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "DELETE", "/api/workflows/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn duplicate_nodes_are_rejected() {
        let app = router(state());
        let mut bad = document("w1");
        bad["nodes"][1]["id"] = json!("1");
        let (status, body) = send(&app, "POST", "/api/workflows", Some(bad)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn duplicate_workflow_is_conflict() {
        let app = router(state());
        send(&app, "POST", "/api/workflows", Some(document("w1"))).await;
        let (status, _) = send(&app, "POST", "/api/workflows", Some(document("w1"))).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn racing_creates_yield_one_conflict() {
        let app = router(state());
        let (first, second) = tokio::join!(
            send(&app, "POST", "/api/workflows", Some(document("w1"))),
            send(&app, "POST", "/api/workflows", Some(document("w1"))),
        );

        let mut statuses = [first.0, second.0];
        statuses.sort();
        assert_eq!(statuses, [StatusCode::OK, StatusCode::CONFLICT]);
        let conflict = if first.0 == StatusCode::CONFLICT { first.1 } else { second.1 };
        assert_eq!(
            conflict,
            json!({"success": false, "error": "workflow w1 already exists"})
        );
    }

    #[tokio::test]
    async fn invalid_update_is_bad_request() {
        let app = router(state());
        send(&app, "POST", "/api/workflows", Some(document("w1"))).await;
        let mut bad = document("w1");
        bad["nodes"][1]["id"] = json!("1");
        let (status, body) = send(&app, "PUT", "/api/workflows/w1", Some(bad)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "duplicate node id: 1");
    }
}
