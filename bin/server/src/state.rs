//! Shared application state.

use crate::config::ServerConfig;
use callflow_ai::{FlowBackendKind, LangflowBackend};
use callflow_core::{Delay, NoDelay};
use callflow_voice::SimulatedTextToSpeech;
use callflow_workflow::{
    EngineMetrics, ExecutionEngine, InMemoryWorkflowStore, Providers, StepRegistry, WorkflowStore,
};
use prometheus::Registry;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// State handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// The node execution engine.
    pub engine: ExecutionEngine,
    /// Providers backing the voice endpoints. Synthesis here answers at once;
    /// only the `playAudio` step simulates latency.
    pub providers: Providers,
    /// Registry scraped by `/metrics`.
    pub registry: Arc<Registry>,
    /// Cancelled on shutdown; stops event streams and in-flight executions.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Builds the state from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine metrics cannot be registered.
    pub fn new(
        config: &ServerConfig,
        store: Arc<dyn WorkflowStore>,
        delay: Arc<dyn Delay>,
    ) -> Result<Self, prometheus::Error> {
        let mut providers = Providers::simulated(delay);
        if config.ai.backend == FlowBackendKind::Langflow {
            info!(url = %config.ai.langflow_url, "using Langflow backend");
            providers = providers.with_flows(Arc::new(LangflowBackend::new(&config.ai.langflow_url)));
        }

        let registry = Arc::new(Registry::new());
        let metrics = EngineMetrics::new(&registry)?;
        let engine = ExecutionEngine::new(
            store,
            StepRegistry::builtin(&providers),
            config.engine.event_bus(),
            config.engine.result_cache(),
            metrics,
        );

        let providers = Providers {
            tts: Arc::new(SimulatedTextToSpeech::new(Arc::new(NoDelay))),
            ..providers
        };

        Ok(Self {
            engine,
            providers,
            registry,
            shutdown: CancellationToken::new(),
        })
    }

    /// Builds the state with an empty in-memory store.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine metrics cannot be registered.
    pub fn in_memory(config: &ServerConfig, delay: Arc<dyn Delay>) -> Result<Self, prometheus::Error> {
        Self::new(config, Arc::new(InMemoryWorkflowStore::new()), delay)
    }

    /// Returns the workflow store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn WorkflowStore> {
        self.engine.store()
    }
}
