//! Conversational-AI backend abstraction.
//!
//! AI nodes hand their input to a hosted flow (a Langflow graph identified by
//! a flow ID) and get back a natural-language response with a classified
//! intent. Backends:
//! - `SimulatedFlowBackend`: canned response after a fixed delay
//! - `LangflowBackend`: HTTP call to a Langflow run endpoint

use crate::error::FlowError;
use async_trait::async_trait;
use callflow_core::Delay;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Default Langflow run endpoint.
pub const DEFAULT_LANGFLOW_URL: &str = "http://localhost:7860/api/v1/run";

/// Available flow backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowBackendKind {
    /// Canned responses, no network access.
    #[default]
    Simulated,
    /// Langflow HTTP API.
    Langflow,
}

/// A request to run a flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowRequest {
    /// The flow to run.
    pub flow_id: String,
    /// Input payload handed to the flow.
    pub input: JsonValue,
}

impl FlowRequest {
    /// Creates a new flow request.
    #[must_use]
    pub fn new(flow_id: impl Into<String>, input: JsonValue) -> Self {
        Self {
            flow_id: flow_id.into(),
            input,
        }
    }
}

/// The response of a flow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowResponse {
    /// Natural-language response.
    pub response: String,
    /// Confidence of the intent classification (0.0 - 1.0).
    #[serde(default)]
    pub confidence: f64,
    /// Classified caller intent.
    #[serde(default)]
    pub intent: String,
}

/// Trait for conversational-AI backends.
#[async_trait]
pub trait FlowBackend: Send + Sync {
    /// Runs a flow with the given input.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or answers with
    /// something that is not a flow response.
    async fn run_flow(&self, request: &FlowRequest) -> Result<FlowResponse, FlowError>;

    /// Returns the backend kind.
    fn kind(&self) -> FlowBackendKind;
}

/// Backend returning a fixed response after a simulated delay.
pub struct SimulatedFlowBackend {
    delay: Arc<dyn Delay>,
    latency_units: u32,
}

impl SimulatedFlowBackend {
    /// Simulated latency of one flow run, in time units.
    pub const DEFAULT_LATENCY_UNITS: u32 = 2;

    /// Creates a simulated backend.
    #[must_use]
    pub fn new(delay: Arc<dyn Delay>) -> Self {
        Self {
            delay,
            latency_units: Self::DEFAULT_LATENCY_UNITS,
        }
    }

    /// Overrides the simulated latency.
    #[must_use]
    pub fn with_latency(mut self, units: u32) -> Self {
        self.latency_units = units;
        self
    }
}

#[async_trait]
impl FlowBackend for SimulatedFlowBackend {
    async fn run_flow(&self, request: &FlowRequest) -> Result<FlowResponse, FlowError> {
        debug!(flow_id = %request.flow_id, "running simulated flow");
        self.delay.wait(self.latency_units).await;
        Ok(FlowResponse {
            response: "This is a simulated AI response".to_string(),
            confidence: 0.95,
            intent: "greeting".to_string(),
        })
    }

    fn kind(&self) -> FlowBackendKind {
        FlowBackendKind::Simulated
    }
}

/// Backend calling the Langflow run API.
#[derive(Clone)]
pub struct LangflowBackend {
    client: reqwest::Client,
    run_url: String,
}

impl LangflowBackend {
    /// Creates a backend posting to `run_url`.
    #[must_use]
    pub fn new(run_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            run_url: run_url.into(),
        }
    }

    /// Returns the run endpoint.
    #[must_use]
    pub fn run_url(&self) -> &str {
        &self.run_url
    }
}

#[async_trait]
impl FlowBackend for LangflowBackend {
    #[instrument(skip(self, request), fields(flow_id = %request.flow_id))]
    async fn run_flow(&self, request: &FlowRequest) -> Result<FlowResponse, FlowError> {
        let response = self
            .client
            .post(&self.run_url)
            .json(request)
            .send()
            .await
            .map_err(|e| FlowError::RequestFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, &request.flow_id));
        }

        let parsed = response
            .json::<FlowResponse>()
            .await
            .map_err(|e| FlowError::ResponseParseFailed {
                reason: e.to_string(),
            })?;

        debug!(intent = %parsed.intent, "flow run finished");
        Ok(parsed)
    }

    fn kind(&self) -> FlowBackendKind {
        FlowBackendKind::Langflow
    }
}

fn status_error(status: reqwest::StatusCode, flow_id: &str) -> FlowError {
    if status == reqwest::StatusCode::NOT_FOUND {
        FlowError::FlowNotFound {
            flow_id: flow_id.to_string(),
        }
    } else {
        FlowError::UnexpectedStatus {
            status: status.as_u16(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callflow_core::RecordingDelay;

    #[tokio::test]
    async fn simulated_backend_returns_canned_response() {
        let delay = Arc::new(RecordingDelay::new());
        let backend = SimulatedFlowBackend::new(delay.clone());

        let response = backend
            .run_flow(&FlowRequest::new("flow-1", serde_json::json!({"text": "hi"})))
            .await
            .expect("simulated flow succeeds");

        assert_eq!(response.response, "This is a simulated AI response");
        assert_eq!(response.confidence, 0.95);
        assert_eq!(response.intent, "greeting");
        assert_eq!(delay.requested(), vec![2]);
    }

    #[tokio::test]
    async fn simulated_latency_is_configurable() {
        let delay = Arc::new(RecordingDelay::new());
        let backend = SimulatedFlowBackend::new(delay.clone()).with_latency(0);

        backend
            .run_flow(&FlowRequest::new("flow-1", JsonValue::Null))
            .await
            .expect("simulated flow succeeds");

        assert_eq!(delay.requested(), vec![0]);
    }

    #[test]
    fn flow_response_tolerates_missing_optional_fields() {
        let parsed: FlowResponse =
            serde_json::from_value(serde_json::json!({"response": "ok"})).expect("deserialize");
        assert_eq!(parsed.response, "ok");
        assert_eq!(parsed.intent, "");
    }

    #[test]
    fn backend_kind_serde() {
        let kind: FlowBackendKind = serde_json::from_str("\"langflow\"").expect("deserialize");
        assert_eq!(kind, FlowBackendKind::Langflow);
        assert_eq!(FlowBackendKind::default(), FlowBackendKind::Simulated);
    }

    #[test]
    fn langflow_backend_keeps_url() {
        let backend = LangflowBackend::new(DEFAULT_LANGFLOW_URL);
        assert_eq!(backend.run_url(), DEFAULT_LANGFLOW_URL);
        assert_eq!(backend.kind(), FlowBackendKind::Langflow);
    }

    #[test]
    fn missing_flow_maps_to_flow_not_found() {
        assert_eq!(
            status_error(reqwest::StatusCode::NOT_FOUND, "flow-9"),
            FlowError::FlowNotFound {
                flow_id: "flow-9".to_string()
            }
        );
        assert_eq!(
            status_error(reqwest::StatusCode::BAD_GATEWAY, "flow-9"),
            FlowError::UnexpectedStatus { status: 502 }
        );
    }
}
