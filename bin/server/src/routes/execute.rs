//! Node execution handler.

use crate::error::ApiError;
use crate::state::AppState;
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use callflow_core::{NodeId, WorkflowId};
use callflow_workflow::{ExecutionError, ExecutionOutcome};
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

/// Query string of `POST /api/execute/node/{node_id}`.
#[derive(Debug, Deserialize)]
pub struct ExecuteQuery {
    pub workflow_id: WorkflowId,
}

/// `POST /api/execute/node/{node_id}?workflow_id=...`
///
/// The body is the step input; an empty body means `{}`. Missing workflows
/// and nodes are 404s; step failures are 200s with `success: false`.
pub async fn execute_node(
    State(state): State<AppState>,
    Path(node_id): Path<NodeId>,
    Query(query): Query<ExecuteQuery>,
    body: Bytes,
) -> Result<Json<ExecutionOutcome>, ApiError> {
    let input = parse_input(&body)?;
    let cancel = state.shutdown.child_token();

    match state
        .engine
        .try_execute(&query.workflow_id, &node_id, input, &cancel)
        .await
    {
        Ok(data) => Ok(Json(ExecutionOutcome::succeeded(data))),
        Err(ExecutionError::WorkflowNotFound { .. }) => Err(ApiError::workflow_not_found()),
        Err(ExecutionError::NodeNotFound { .. }) => Err(ApiError::NotFound { what: "Node" }),
        Err(ExecutionError::Store { message }) => Err(ApiError::Internal { details: message }),
        Err(err) => Ok(Json(ExecutionOutcome::failed(err.to_string()))),
    }
}

fn parse_input(body: &[u8]) -> Result<JsonValue, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(JsonValue::Object(Map::new()));
    }
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest {
        details: format!("invalid input payload: {e}"),
    })
}
