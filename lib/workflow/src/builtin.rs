//! Executors for the built-in call-flow node types.
//!
//! | Type        | Provider        | Result                                   |
//! |-------------|-----------------|------------------------------------------|
//! | `startCall` | call provider   | `call_sid`, `status`, `from`, `to`       |
//! | `playAudio` | text-to-speech  | `audio_id`, `message`, `status`          |
//! | `aiNode`    | flow backend    | `response`, `confidence`, `intent`       |
//! | `endCall`   | call provider   | `status`, `duration`, `outcome`          |

use crate::error::StepError;
use crate::node::NodeType;
use crate::step::{StepContext, StepExecutor, StepRegistry};
use async_trait::async_trait;
use callflow_ai::{FlowBackend, FlowRequest, SimulatedFlowBackend};
use callflow_core::Delay;
use callflow_voice::{
    CallProvider, CallRequest, CallTermination, SimulatedCallProvider, SimulatedSpeechToText,
    SimulatedTextToSpeech, SpeechRequest, SpeechToText, TextToSpeech,
};
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use tracing::debug;

/// Message spoken when a `playAudio` node has none configured.
pub const DEFAULT_AUDIO_MESSAGE: &str = "Hello, this is a default message.";

/// The external services the built-in steps talk to.
#[derive(Clone)]
pub struct Providers {
    pub calls: Arc<dyn CallProvider>,
    pub tts: Arc<dyn TextToSpeech>,
    pub stt: Arc<dyn SpeechToText>,
    pub flows: Arc<dyn FlowBackend>,
}

impl Providers {
    /// Simulated providers sharing one delay source.
    #[must_use]
    pub fn simulated(delay: Arc<dyn Delay>) -> Self {
        Self {
            calls: Arc::new(SimulatedCallProvider),
            tts: Arc::new(SimulatedTextToSpeech::new(delay.clone())),
            stt: Arc::new(SimulatedSpeechToText),
            flows: Arc::new(SimulatedFlowBackend::new(delay)),
        }
    }

    /// Replaces the flow backend.
    #[must_use]
    pub fn with_flows(mut self, flows: Arc<dyn FlowBackend>) -> Self {
        self.flows = flows;
        self
    }
}

impl StepRegistry {
    /// A registry with the four built-in node types.
    #[must_use]
    pub fn builtin(providers: &Providers) -> Self {
        Self::new()
            .with(
                NodeType::StartCall,
                Arc::new(StartCallStep::new(providers.calls.clone())),
            )
            .with(
                NodeType::PlayAudio,
                Arc::new(PlayAudioStep::new(providers.tts.clone())),
            )
            .with(
                NodeType::AiNode,
                Arc::new(AiNodeStep::new(providers.flows.clone())),
            )
            .with(
                NodeType::EndCall,
                Arc::new(EndCallStep::new(providers.calls.clone())),
            )
    }
}

/// Places the outbound call.
pub struct StartCallStep {
    calls: Arc<dyn CallProvider>,
}

impl StartCallStep {
    #[must_use]
    pub fn new(calls: Arc<dyn CallProvider>) -> Self {
        Self { calls }
    }
}

#[async_trait]
impl StepExecutor for StartCallStep {
    async fn execute(&self, ctx: StepContext<'_>) -> Result<JsonValue, StepError> {
        let request = CallRequest {
            from: ctx.config_str("from").map(str::to_string),
            to: ctx.config_str("to").map(str::to_string),
        };
        let session = self
            .calls
            .initiate_call(&request)
            .await
            .map_err(|e| StepError::provider(self.calls.name(), e))?;

        debug!(call_sid = %session.call_sid, "call initiated");
        Ok(json!({
            "call_sid": session.call_sid,
            "status": session.status,
            "from": session.from,
            "to": session.to,
        }))
    }
}

/// Speaks the configured message.
pub struct PlayAudioStep {
    tts: Arc<dyn TextToSpeech>,
}

impl PlayAudioStep {
    #[must_use]
    pub fn new(tts: Arc<dyn TextToSpeech>) -> Self {
        Self { tts }
    }
}

#[async_trait]
impl StepExecutor for PlayAudioStep {
    async fn execute(&self, ctx: StepContext<'_>) -> Result<JsonValue, StepError> {
        let message = ctx.config_str("audioMessage").unwrap_or(DEFAULT_AUDIO_MESSAGE);
        let mut request = SpeechRequest::new(message);
        if let Some(voice_id) = ctx.config_str("voiceId") {
            request = request.with_voice(voice_id);
        }

        let audio = self
            .tts
            .synthesize(&request)
            .await
            .map_err(|e| StepError::provider("text-to-speech", e))?;

        Ok(json!({
            "audio_id": audio.audio_id,
            "message": message,
            "status": "generated",
        }))
    }
}

/// Runs the configured AI flow on the input.
pub struct AiNodeStep {
    flows: Arc<dyn FlowBackend>,
}

impl AiNodeStep {
    #[must_use]
    pub fn new(flows: Arc<dyn FlowBackend>) -> Self {
        Self { flows }
    }

    /// Reads `flowId`, accepting a non-empty string or a non-zero number.
    fn flow_id(ctx: &StepContext<'_>) -> Option<String> {
        match ctx.config("flowId")? {
            JsonValue::String(id) if !id.is_empty() => Some(id.clone()),
            JsonValue::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[async_trait]
impl StepExecutor for AiNodeStep {
    async fn execute(&self, ctx: StepContext<'_>) -> Result<JsonValue, StepError> {
        let flow_id = Self::flow_id(&ctx).ok_or(StepError::MissingFlowId)?;

        let response = self
            .flows
            .run_flow(&FlowRequest::new(flow_id, ctx.input.clone()))
            .await
            .map_err(|e| StepError::provider("Langflow API", e))?;

        Ok(json!({
            "response": response.response,
            "confidence": response.confidence,
            "intent": response.intent,
        }))
    }
}

/// Hangs up.
pub struct EndCallStep {
    calls: Arc<dyn CallProvider>,
}

impl EndCallStep {
    #[must_use]
    pub fn new(calls: Arc<dyn CallProvider>) -> Self {
        Self { calls }
    }
}

#[async_trait]
impl StepExecutor for EndCallStep {
    async fn execute(&self, ctx: StepContext<'_>) -> Result<JsonValue, StepError> {
        let termination = CallTermination {
            call_sid: ctx.input_str("call_sid").map(str::to_string),
        };
        let summary = self
            .calls
            .end_call(&termination)
            .await
            .map_err(|e| StepError::provider(self.calls.name(), e))?;

        Ok(json!({
            "status": summary.status,
            "duration": summary.duration,
            "outcome": summary.outcome,
        }))
    }
}
