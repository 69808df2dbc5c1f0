//! Error types for the AI crate.

use std::fmt;

/// Errors from conversational-AI backend operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// The request never reached the backend or the connection broke.
    RequestFailed { reason: String },
    /// The backend answered with a non-success status.
    UnexpectedStatus { status: u16 },
    /// Response parsing failed.
    ResponseParseFailed { reason: String },
    /// The flow ID is unknown to the backend.
    FlowNotFound { flow_id: String },
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestFailed { reason } => {
                write!(f, "error communicating with flow backend: {reason}")
            }
            Self::UnexpectedStatus { status } => {
                write!(f, "flow backend responded with status {status}")
            }
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse flow response: {reason}")
            }
            Self::FlowNotFound { flow_id } => write!(f, "flow not found: {flow_id}"),
        }
    }
}

impl std::error::Error for FlowError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_failed_display() {
        let err = FlowError::RequestFailed {
            reason: "connection refused".to_string(),
        };
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn unexpected_status_display() {
        let err = FlowError::UnexpectedStatus { status: 502 };
        assert!(err.to_string().contains("502"));
    }
}
