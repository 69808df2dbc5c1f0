//! Error sink for failed executions.

use crate::error::ExecutionError;
use crate::execution::NodeRun;
use tracing::error;

/// Receives every execution failure the engine catches.
pub trait ErrorReporter: Send + Sync {
    /// Reports one failure.
    fn report(&self, run: &NodeRun, error: &ExecutionError);
}

/// Reporter that logs failures through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorReporter;

impl ErrorReporter for TracingErrorReporter {
    fn report(&self, run: &NodeRun, err: &ExecutionError) {
        error!(
            workflow_id = %run.workflow_id,
            node_id = %run.node_id,
            node_type = run.node_type.as_ref().map(|t| t.as_str()),
            error = %err,
            "error executing node"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callflow_core::{NodeId, WorkflowId};

    #[test]
    fn tracing_reporter_accepts_any_run() {
        let run = NodeRun::new(WorkflowId::new("w1"), NodeId::new("n1"));
        TracingErrorReporter.report(&run, &ExecutionError::Cancelled);
    }
}
