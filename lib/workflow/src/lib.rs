//! Node execution engine for callflow.
//!
//! This crate provides everything needed to run one node of a call flow:
//!
//! - **Definitions**: workflows, nodes and edges as stored by the editor
//! - **Steps**: a registry of executors, one per node type
//! - **Engine**: resolves a node, runs its step and records the outcome
//! - **Events**: per-workflow fanout of start/complete/error events
//! - **Cache**: the latest result per node, kept for an hour

pub mod builtin;
pub mod bus;
pub mod cache;
pub mod definition;
pub mod edge;
pub mod engine;
pub mod error;
pub mod event;
pub mod execution;
pub mod metrics;
pub mod node;
pub mod report;
pub mod step;
pub mod store;

pub use builtin::{
    AiNodeStep, DEFAULT_AUDIO_MESSAGE, EndCallStep, PlayAudioStep, Providers, StartCallStep,
};
pub use bus::{DEFAULT_QUEUE_CAPACITY, EventBus, Subscription, SubscriptionId};
pub use cache::{CachedResult, DEFAULT_TTL_SECONDS, ResultCache};
pub use definition::Workflow;
pub use edge::Edge;
pub use engine::{EngineConfig, ExecutionEngine};
pub use error::{DefinitionError, ExecutionError, StepError, StoreError};
pub use event::{EventData, EventKind, EventMessage, ExecutionEvent};
pub use execution::{ExecutionOutcome, ExecutionState, NodeRun};
pub use metrics::EngineMetrics;
pub use node::{Node, NodeType, Position};
pub use report::{ErrorReporter, TracingErrorReporter};
pub use step::{EchoStep, MockStep, StepContext, StepExecutor, StepRegistry};
pub use store::{InMemoryWorkflowStore, WorkflowStore};
