//! Conversational-AI integration for callflow.
//!
//! AI nodes delegate to a flow backend (Langflow in production, a canned
//! simulator otherwise) through the [`FlowBackend`] trait.

pub mod backend;
pub mod error;

pub use backend::{
    DEFAULT_LANGFLOW_URL, FlowBackend, FlowBackendKind, FlowRequest, FlowResponse,
    LangflowBackend, SimulatedFlowBackend,
};
pub use error::FlowError;
