//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from `CALLFLOW__*` environment variables
//! (for example `CALLFLOW__ENGINE__CACHE_TTL_SECONDS=600`).
//!
//! See [`EngineConfig`] for engine tuning.

use callflow_ai::{DEFAULT_LANGFLOW_URL, FlowBackendKind};
use callflow_workflow::EngineConfig;
use serde::Deserialize;

/// Server configuration composed from library configs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Interval between expired-cache sweeps, in seconds.
    #[serde(default = "default_cache_sweep_interval_seconds")]
    pub cache_sweep_interval_seconds: u64,

    /// Execution engine configuration.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Conversational-AI backend configuration.
    #[serde(default)]
    pub ai: AiConfig,
}

/// Conversational-AI backend selection.
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Which backend AI nodes use.
    #[serde(default)]
    pub backend: FlowBackendKind,

    /// Langflow run endpoint, used when `backend` is `langflow`.
    #[serde(default = "default_langflow_url")]
    pub langflow_url: String,
}

fn default_bind_address() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_cache_sweep_interval_seconds() -> u64 {
    60
}

fn default_langflow_url() -> String {
    DEFAULT_LANGFLOW_URL.to_string()
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            backend: FlowBackendKind::default(),
            langflow_url: default_langflow_url(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cache_sweep_interval_seconds: default_cache_sweep_interval_seconds(),
            engine: EngineConfig::default(),
            ai: AiConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Environment variable prefix.
    pub const ENV_PREFIX: &'static str = "CALLFLOW";

    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_builder(config::Config::builder().add_source(
            config::Environment::with_prefix(Self::ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        ))
    }

    /// Builds and deserializes configuration from the given sources.
    ///
    /// # Errors
    ///
    /// Returns an error if a source fails or a value has the wrong type.
    pub fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, config::ConfigError> {
        builder.build()?.try_deserialize()
    }
}
