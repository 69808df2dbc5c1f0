//! Domain error types for HTTP handlers.
//!
//! Handlers return `ApiError`; each variant maps to a status code and a
//! `{"success": false, "error": ...}` body. Internal details are logged, not
//! sent to the client.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use callflow_workflow::StoreError;
use serde_json::json;
use std::fmt;
use tracing::error;

/// Errors returned by HTTP handlers.
#[derive(Debug)]
pub enum ApiError {
    /// The requested resource does not exist.
    NotFound { what: &'static str },
    /// The request is malformed.
    BadRequest { details: String },
    /// The resource already exists.
    Conflict { details: String },
    /// A downstream provider failed.
    Upstream { details: String },
    /// Anything else.
    Internal { details: String },
}

impl ApiError {
    /// A missing workflow.
    #[must_use]
    pub fn workflow_not_found() -> Self {
        Self::NotFound { what: "Workflow" }
    }

    /// Wraps an unexpected failure.
    #[must_use]
    pub fn internal(err: impl fmt::Display) -> Self {
        Self::Internal {
            details: err.to_string(),
        }
    }

    /// Maps a store failure onto the matching client or server error.
    #[must_use]
    pub fn store(err: &StoreError) -> Self {
        match err {
            StoreError::InvalidDefinition(err) => Self::BadRequest {
                details: err.to_string(),
            },
            StoreError::AlreadyExists { workflow_id } => Self::Conflict {
                details: format!("workflow {workflow_id} already exists"),
            },
            StoreError::Unavailable { .. } => Self::internal(err),
        }
    }

    /// Returns the HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Upstream { .. } => StatusCode::BAD_GATEWAY,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the client-safe message.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::NotFound { what } => format!("{what} not found"),
            Self::BadRequest { details } | Self::Conflict { details } => details.clone(),
            Self::Upstream { .. } => "Upstream provider error".to_string(),
            Self::Internal { .. } => "Internal server error".to_string(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { what } => write!(f, "{what} not found"),
            Self::BadRequest { details } => write!(f, "bad request: {details}"),
            Self::Conflict { details } => write!(f, "conflict: {details}"),
            Self::Upstream { details } => write!(f, "upstream error: {details}"),
            Self::Internal { details } => write!(f, "internal error: {details}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Upstream { .. } | Self::Internal { .. }) {
            error!(error = %self, "request failed");
        }
        let body = json!({"success": false, "error": self.public_message()});
        (self.status(), Json(body)).into_response()
    }
}
