//! Single-node execution engine.
//!
//! One execution:
//! 1. Loads the workflow and finds the node (no events if either is missing)
//! 2. Publishes `Start` and starts the per-type timer
//! 3. Runs the step executor, catching failures, panics and cancellation,
//!    including the execution future being dropped
//! 4. On success caches the result and publishes `Complete`, otherwise
//!    reports the error and publishes `Error`
//!
//! Executions are independent. Concurrent runs of the same node race on the
//! cache and interleave their events; the last write wins.

use crate::bus::{DEFAULT_QUEUE_CAPACITY, EventBus};
use crate::cache::{DEFAULT_TTL_SECONDS, ResultCache};
use crate::error::{ExecutionError, StepError};
use crate::event::ExecutionEvent;
use crate::execution::{ExecutionOutcome, NodeRun};
use crate::metrics::EngineMetrics;
use crate::node::Node;
use crate::report::{ErrorReporter, TracingErrorReporter};
use crate::step::{StepContext, StepRegistry};
use crate::store::WorkflowStore;
use callflow_core::{Clock, NodeId, SystemClock, TokioDelay, WorkflowId};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Engine tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Lifetime of cached results.
    #[serde(default = "default_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,
    /// Events buffered per subscriber before it is disconnected.
    #[serde(default = "default_event_queue_capacity")]
    pub event_queue_capacity: usize,
    /// Length of one simulated latency unit.
    #[serde(default = "default_delay_unit_millis")]
    pub delay_unit_millis: u64,
}

fn default_cache_ttl_seconds() -> u64 {
    DEFAULT_TTL_SECONDS
}

fn default_event_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

fn default_delay_unit_millis() -> u64 {
    1000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_ttl_seconds: default_cache_ttl_seconds(),
            event_queue_capacity: default_event_queue_capacity(),
            delay_unit_millis: default_delay_unit_millis(),
        }
    }
}

impl EngineConfig {
    /// Builds the result cache.
    #[must_use]
    pub fn result_cache(&self) -> ResultCache {
        ResultCache::with_ttl(Duration::from_secs(self.cache_ttl_seconds))
    }

    /// Builds the event bus.
    #[must_use]
    pub fn event_bus(&self) -> EventBus {
        EventBus::with_capacity(self.event_queue_capacity)
    }

    /// Builds the real-time delay used by simulated providers.
    #[must_use]
    pub fn delay(&self) -> TokioDelay {
        TokioDelay::new(Duration::from_millis(self.delay_unit_millis))
    }
}

/// Executes single nodes of stored workflows.
///
/// Cloning is cheap; clones share the store, bus, cache and metrics.
#[derive(Clone)]
pub struct ExecutionEngine {
    store: Arc<dyn WorkflowStore>,
    steps: Arc<StepRegistry>,
    bus: EventBus,
    cache: ResultCache,
    metrics: EngineMetrics,
    clock: Arc<dyn Clock>,
    reporter: Arc<dyn ErrorReporter>,
}

impl ExecutionEngine {
    /// Creates an engine.
    #[must_use]
    pub fn new(
        store: Arc<dyn WorkflowStore>,
        steps: StepRegistry,
        bus: EventBus,
        cache: ResultCache,
        metrics: EngineMetrics,
    ) -> Self {
        Self {
            store,
            steps: Arc::new(steps),
            bus,
            cache,
            metrics,
            clock: Arc::new(SystemClock),
            reporter: Arc::new(TracingErrorReporter),
        }
    }

    /// Uses the given clock for event timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sends caught failures to the given reporter.
    #[must_use]
    pub fn with_error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Returns the event bus.
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Returns the result cache.
    #[must_use]
    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Returns the workflow store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn WorkflowStore> {
        &self.store
    }

    /// Returns the step registry.
    #[must_use]
    pub fn steps(&self) -> &StepRegistry {
        &self.steps
    }

    /// Executes a node and returns the uniform outcome.
    pub async fn execute(
        &self,
        workflow_id: &WorkflowId,
        node_id: &NodeId,
        input: JsonValue,
    ) -> ExecutionOutcome {
        self.execute_with_cancel(workflow_id, node_id, input, &CancellationToken::new())
            .await
    }

    /// Executes a node, giving up with `Cancelled` if `cancel` fires first.
    pub async fn execute_with_cancel(
        &self,
        workflow_id: &WorkflowId,
        node_id: &NodeId,
        input: JsonValue,
        cancel: &CancellationToken,
    ) -> ExecutionOutcome {
        match self.try_execute(workflow_id, node_id, input, cancel).await {
            Ok(data) => ExecutionOutcome::succeeded(data),
            Err(err) => ExecutionOutcome::failed(err.to_string()),
        }
    }

    /// Executes a node, keeping the typed error.
    ///
    /// # Errors
    ///
    /// Returns an error when the workflow or node is missing, the store
    /// fails, the step fails, or the execution is cancelled.
    #[instrument(skip_all, fields(workflow_id = %workflow_id, node_id = %node_id))]
    pub async fn try_execute(
        &self,
        workflow_id: &WorkflowId,
        node_id: &NodeId,
        input: JsonValue,
        cancel: &CancellationToken,
    ) -> Result<JsonValue, ExecutionError> {
        let mut run = NodeRun::new(workflow_id.clone(), node_id.clone());

        let workflow = match self.store.find(workflow_id).await {
            Ok(Some(workflow)) => workflow,
            Ok(None) => {
                let err = ExecutionError::WorkflowNotFound {
                    workflow_id: workflow_id.clone(),
                };
                return Err(self.fail_unresolved(&mut run, err));
            }
            Err(report) => {
                let err = ExecutionError::Store {
                    message: report.to_string(),
                };
                self.reporter.report(&run, &err);
                return Err(self.fail_unresolved(&mut run, err));
            }
        };

        let Some(node) = workflow.find_node(node_id) else {
            let err = ExecutionError::NodeNotFound {
                workflow_id: workflow_id.clone(),
                node_id: node_id.clone(),
            };
            return Err(self.fail_unresolved(&mut run, err));
        };

        let node_type = node.node_type.as_str();
        run.start(node.node_type.clone(), self.clock.now());
        self.bus.publish(&ExecutionEvent::start(
            workflow_id.clone(),
            node_id.clone(),
            self.clock.now(),
        ));
        self.metrics.record_start(node_type);

        let mut guard = RunGuard::new(self, run, node_type);
        let outcome = self.run_step(workflow_id, node, &input, cancel).await;
        let elapsed = guard.disarm();

        match outcome {
            Ok(result) => {
                self.cache.put(node_id, result.clone());
                self.bus.publish(&ExecutionEvent::complete(
                    workflow_id.clone(),
                    node_id.clone(),
                    result.clone(),
                    self.clock.now(),
                ));
                guard.run.complete(result.clone(), self.clock.now());
                info!(node_type, elapsed_ms = elapsed.as_millis() as u64, "node executed");
                Ok(result)
            }
            Err(err) => {
                self.publish_failure(&mut guard.run, &err);
                Err(err)
            }
        }
    }

    fn publish_failure(&self, run: &mut NodeRun, err: &ExecutionError) {
        self.reporter.report(run, err);
        self.bus.publish(&ExecutionEvent::error(
            run.workflow_id.clone(),
            run.node_id.clone(),
            err.to_string(),
            self.clock.now(),
        ));
        run.fail(err, self.clock.now());
    }

    async fn run_step(
        &self,
        workflow_id: &WorkflowId,
        node: &Node,
        input: &JsonValue,
        cancel: &CancellationToken,
    ) -> Result<JsonValue, ExecutionError> {
        let Some(executor) = self.steps.get(&node.node_type) else {
            warn!(node_type = %node.node_type, "no executor for node type, returning empty result");
            return Ok(JsonValue::Null);
        };

        let ctx = StepContext::new(workflow_id, node, input);
        let step = AssertUnwindSafe(executor.execute(ctx)).catch_unwind();

        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(ExecutionError::Cancelled),
            result = step => match result {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(source)) => Err(ExecutionError::Step {
                    node_type: node.node_type.clone(),
                    source,
                }),
                Err(panic) => Err(ExecutionError::Step {
                    node_type: node.node_type.clone(),
                    source: StepError::Panicked {
                        message: panic_message(panic.as_ref()),
                    },
                }),
            },
        }
    }

    fn fail_unresolved(&self, run: &mut NodeRun, err: ExecutionError) -> ExecutionError {
        debug!(error = %err, "node not resolved");
        run.fail(&err, self.clock.now());
        err
    }
}

/// Finishes a started run that is dropped before the step returns.
///
/// Dropping the execution future (a timeout, a disconnected client) would
/// otherwise leave subscribers with a `Start` and no terminal event.
struct RunGuard<'a> {
    engine: &'a ExecutionEngine,
    run: NodeRun,
    node_type: &'a str,
    started: Instant,
    armed: bool,
}

impl<'a> RunGuard<'a> {
    fn new(engine: &'a ExecutionEngine, run: NodeRun, node_type: &'a str) -> Self {
        Self {
            engine,
            run,
            node_type,
            started: Instant::now(),
            armed: true,
        }
    }

    /// Records the step duration; the caller finishes the run from here.
    fn disarm(&mut self) -> Duration {
        self.armed = false;
        let elapsed = self.started.elapsed();
        self.engine.metrics.record_duration(self.node_type, elapsed);
        elapsed
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.engine
            .metrics
            .record_duration(self.node_type, self.started.elapsed());
        warn!(node_type = self.node_type, "execution dropped before the step finished");
        self.engine
            .publish_failure(&mut self.run, &ExecutionError::Cancelled);
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
