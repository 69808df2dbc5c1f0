//! Speech synthesis and transcription boundaries.

use crate::error::VoiceError;
use async_trait::async_trait;
use callflow_core::{Delay, generated_id};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::debug;

/// A text-to-speech request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechRequest {
    /// Text to speak.
    pub text: String,
    /// Provider voice, if not the default.
    pub voice_id: Option<String>,
}

impl SpeechRequest {
    /// Creates a request using the default voice.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice_id: None,
        }
    }

    /// Selects a voice.
    #[must_use]
    pub fn with_voice(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = Some(voice_id.into());
        self
    }
}

/// Generated audio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesizedAudio {
    /// Provider clip identifier.
    pub audio_id: String,
    /// Where the clip can be fetched.
    pub audio_url: String,
    /// Clip length in seconds.
    pub duration: f64,
}

/// Audio handed to a transcription provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioInput {
    /// Provider-specific audio payload (URL, base64 blob, stream handle).
    #[serde(flatten)]
    pub payload: serde_json::Map<String, JsonValue>,
}

/// Transcription result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Recognized text.
    pub transcript: String,
    /// Recognition confidence (0.0 - 1.0).
    pub confidence: f64,
}

/// Trait for speech synthesis providers.
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Synthesizes speech for the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider refuses or cannot be reached.
    async fn synthesize(&self, request: &SpeechRequest) -> Result<SynthesizedAudio, VoiceError>;
}

/// Trait for transcription providers.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribes caller audio.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider refuses or cannot be reached.
    async fn transcribe(&self, audio: &AudioInput) -> Result<Transcript, VoiceError>;
}

/// Synthesizer that fabricates a clip reference after a simulated delay.
pub struct SimulatedTextToSpeech {
    delay: Arc<dyn Delay>,
    latency_units: u32,
    base_url: String,
}

impl SimulatedTextToSpeech {
    /// Simulated latency of one synthesis, in time units.
    pub const DEFAULT_LATENCY_UNITS: u32 = 1;

    /// Reported clip length, in seconds.
    pub const CLIP_DURATION_SECS: f64 = 2.5;

    /// Creates a simulated synthesizer.
    #[must_use]
    pub fn new(delay: Arc<dyn Delay>) -> Self {
        Self {
            delay,
            latency_units: Self::DEFAULT_LATENCY_UNITS,
            base_url: "https://example.com/audio".to_string(),
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
impl TextToSpeech for SimulatedTextToSpeech {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<SynthesizedAudio, VoiceError> {
        debug!(chars = request.text.len(), voice_id = ?request.voice_id, "simulating speech synthesis");
        self.delay.wait(self.latency_units).await;

        let audio_id = generated_id("audio_");
        Ok(SynthesizedAudio {
            audio_url: format!("{}/{audio_id}.mp3", self.base_url),
            audio_id,
            duration: Self::CLIP_DURATION_SECS,
        })
    }
}

/// Transcriber that always hears the same sentence.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedSpeechToText;

#[async_trait]
impl SpeechToText for SimulatedSpeechToText {
    async fn transcribe(&self, audio: &AudioInput) -> Result<Transcript, VoiceError> {
        debug!(fields = audio.payload.len(), "simulating transcription");
        Ok(Transcript {
            transcript: "Hello, I'm calling about your product.".to_string(),
            confidence: 0.95,
        })
    }
}
