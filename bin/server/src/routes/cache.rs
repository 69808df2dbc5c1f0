//! Cached result lookup.

use super::{Envelope, ok};
use crate::error::ApiError;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, State};
use callflow_core::NodeId;
use callflow_workflow::CachedResult;

/// `GET /api/cache/{node_id}`
///
/// Returns the last result of the node while it is still live.
pub async fn get_cached(
    State(state): State<AppState>,
    Path(node_id): Path<NodeId>,
) -> Result<Json<Envelope<CachedResult>>, ApiError> {
    state
        .engine
        .cache()
        .get(&node_id)
        .map(ok)
        .ok_or(ApiError::NotFound {
            what: "Cached result",
        })
}
