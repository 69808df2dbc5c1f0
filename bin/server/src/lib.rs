//! callflow HTTP server.
//!
//! This crate exposes the node execution engine over HTTP: workflow CRUD,
//! single-node execution, server-sent execution events, cached results,
//! voice endpoints and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::{AiConfig, ServerConfig};
pub use error::ApiError;
pub use routes::router;
pub use state::AppState;

use callflow_workflow::ResultCache;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Periodically drops expired cache entries until `shutdown` fires.
pub async fn sweep_cache(cache: ResultCache, every: Duration, shutdown: CancellationToken) {
    let mut interval = tokio::time::interval(every);
    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            _ = interval.tick() => {
                let purged = cache.purge_expired();
                if purged > 0 {
                    debug!(purged, "swept expired cache entries");
                }
            }
        }
    }
}
