//! Call provider trait and related types.
//!
//! A call provider places and ends phone calls. Results keep the field
//! names the call-flow editor expects (`call_sid`, `from`, `to`, ...).

use crate::error::VoiceError;
use async_trait::async_trait;
use callflow_core::generated_id;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Placeholder caller number used by the simulated provider.
pub const SIMULATED_FROM_NUMBER: &str = "+15551234567";

/// Placeholder callee number used by the simulated provider.
pub const SIMULATED_TO_NUMBER: &str = "+15559876543";

/// An outbound call request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRequest {
    /// Number to call from, if the node configures one.
    pub from: Option<String>,
    /// Number to call, if the node configures one.
    pub to: Option<String>,
}

/// An established (or initiating) call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSession {
    /// Provider call identifier.
    pub call_sid: String,
    /// Provider status (e.g. "initiated").
    pub status: String,
    /// Calling number.
    pub from: String,
    /// Called number.
    pub to: String,
}

/// A request to end a call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallTermination {
    /// The call to end, when known.
    pub call_sid: Option<String>,
}

/// Summary of an ended call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSummary {
    /// Final call status.
    pub status: String,
    /// Call duration in seconds.
    pub duration: u64,
    /// Business outcome of the call.
    pub outcome: String,
}

/// Trait for telephony providers.
#[async_trait]
pub trait CallProvider: Send + Sync {
    /// Places an outbound call.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider refuses or cannot be reached.
    async fn initiate_call(&self, request: &CallRequest) -> Result<CallSession, VoiceError>;

    /// Ends a call.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider refuses or cannot be reached.
    async fn end_call(&self, request: &CallTermination) -> Result<CallSummary, VoiceError>;

    /// Returns the provider name.
    fn name(&self) -> &str;
}

/// Provider that pretends every call succeeds.
///
/// It never dials: the returned numbers are always the placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedCallProvider;

impl SimulatedCallProvider {
    /// Fixed duration reported for ended calls, in seconds.
    pub const CALL_DURATION_SECS: u64 = 120;
}

#[async_trait]
impl CallProvider for SimulatedCallProvider {
    async fn initiate_call(&self, request: &CallRequest) -> Result<CallSession, VoiceError> {
        debug!(?request, "simulating outbound call");
        Ok(CallSession {
            call_sid: generated_id("CA"),
            status: "initiated".to_string(),
            from: SIMULATED_FROM_NUMBER.to_string(),
            to: SIMULATED_TO_NUMBER.to_string(),
        })
    }

    async fn end_call(&self, request: &CallTermination) -> Result<CallSummary, VoiceError> {
        debug!(call_sid = ?request.call_sid, "simulating call hangup");
        Ok(CallSummary {
            status: "completed".to_string(),
            duration: Self::CALL_DURATION_SECS,
            outcome: "success".to_string(),
        })
    }

    fn name(&self) -> &str {
        "simulated"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn simulated_call_uses_placeholder_numbers() {
        let provider = SimulatedCallProvider;
        let session = provider
            .initiate_call(&CallRequest::default())
            .await
            .expect("simulated call succeeds");

        assert!(session.call_sid.starts_with("CA"));
        assert_eq!(session.status, "initiated");
        assert_eq!(session.from, SIMULATED_FROM_NUMBER);
        assert_eq!(session.to, SIMULATED_TO_NUMBER);
    }

    #[tokio::test]
    async fn simulated_call_sids_are_unique() {
        let provider = SimulatedCallProvider;
        let first = provider.initiate_call(&CallRequest::default()).await.unwrap();
        let second = provider.initiate_call(&CallRequest::default()).await.unwrap();
        assert_ne!(first.call_sid, second.call_sid);
    }

    #[tokio::test]
    async fn simulated_hangup_reports_fixed_summary() {
        let provider = SimulatedCallProvider;
        let summary = provider
            .end_call(&CallTermination {
                call_sid: Some("CA1".to_string()),
            })
            .await
            .expect("simulated hangup succeeds");

        assert_eq!(summary.status, "completed");
        assert_eq!(summary.duration, 120);
        assert_eq!(summary.outcome, "success");
    }

    #[test]
    fn call_session_serializes_editor_field_names() {
        let session = CallSession {
            call_sid: "CA1".to_string(),
            status: "initiated".to_string(),
            from: "+1".to_string(),
            to: "+2".to_string(),
        };
        let json = serde_json::to_value(&session).expect("serialize");
        assert_eq!(json["call_sid"], "CA1");
        assert_eq!(json["from"], "+1");
    }
}
