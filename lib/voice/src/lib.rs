//! Voice provider boundaries for callflow.
//!
//! This crate provides:
//!
//! - **Call provider**: outbound call setup and teardown (Twilio-style)
//! - **Text-to-speech**: audio generation for prompts (ElevenLabs-style)
//! - **Speech-to-text**: caller transcription (Deepgram-style)
//!
//! Each boundary ships a simulated implementation that returns the same
//! result shape a real provider would, without network access.

pub mod call;
pub mod error;
pub mod speech;

pub use call::{
    CallProvider, CallRequest, CallSession, CallSummary, CallTermination, SimulatedCallProvider,
};
pub use error::VoiceError;
pub use speech::{
    AudioInput, SimulatedSpeechToText, SimulatedTextToSpeech, SpeechRequest, SpeechToText,
    SynthesizedAudio, TextToSpeech, Transcript,
};
