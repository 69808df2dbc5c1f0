//! Execution metrics.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Prometheus collectors for node execution.
#[derive(Clone)]
pub struct EngineMetrics {
    /// Executions whose node was resolved.
    pub workflow_executions_total: IntCounter,

    /// Node executions by node type.
    pub node_executions_total: IntCounterVec,

    /// Step duration by node type, whatever the outcome.
    pub node_execution_duration_seconds: HistogramVec,
}

impl EngineMetrics {
    /// Creates the collectors and registers them.
    ///
    /// # Errors
    ///
    /// Returns an error if a collector with the same name is already registered.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let workflow_executions_total = IntCounter::with_opts(Opts::new(
            "workflow_executions_total",
            "Total number of workflow executions",
        ))?;
        registry.register(Box::new(workflow_executions_total.clone()))?;

        let node_executions_total = IntCounterVec::new(
            Opts::new("node_executions_total", "Total number of node executions"),
            &["node_type"],
        )?;
        registry.register(Box::new(node_executions_total.clone()))?;

        let node_execution_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "node_execution_duration_seconds",
                "Duration of node execution in seconds",
            )
            .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
            &["node_type"],
        )?;
        registry.register(Box::new(node_execution_duration_seconds.clone()))?;

        Ok(Self {
            workflow_executions_total,
            node_executions_total,
            node_execution_duration_seconds,
        })
    }

    /// Counts the start of one execution.
    pub fn record_start(&self, node_type: &str) {
        self.workflow_executions_total.inc();
        self.node_executions_total
            .with_label_values(&[node_type])
            .inc();
    }

    /// Records how long one step took.
    pub fn record_duration(&self, node_type: &str, elapsed: Duration) {
        self.node_execution_duration_seconds
            .with_label_values(&[node_type])
            .observe(elapsed.as_secs_f64());
    }
}

/// Renders a registry in the Prometheus text format.
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn render(registry: &Registry) -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
