//! Voice integration handlers.

use super::{Envelope, ok};
use crate::error::ApiError;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Query, State};
use callflow_core::{WorkflowId, generated_id};
use callflow_voice::{AudioInput, CallRequest, SpeechRequest, Transcript, VoiceError};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Query string of `POST /api/voice/call`.
#[derive(Debug, Deserialize)]
pub struct CallQuery {
    pub phone_number: String,
    pub workflow_id: WorkflowId,
}

/// Body of a call initiation response.
#[derive(Debug, Serialize)]
pub struct CallStarted {
    pub call_id: String,
    pub status: String,
    pub phone_number: String,
}

/// Query string of `POST /api/voice/text-to-speech`.
#[derive(Debug, Deserialize)]
pub struct SpeechQuery {
    pub text: String,
    pub voice_id: Option<String>,
}

/// Body of a synthesis response.
#[derive(Debug, Serialize)]
pub struct SpeechAudio {
    pub audio_url: String,
    pub duration: f64,
}

fn voice_error(err: VoiceError) -> ApiError {
    match err {
        VoiceError::InvalidRequest { reason } => ApiError::BadRequest { details: reason },
        other => ApiError::Upstream {
            details: other.to_string(),
        },
    }
}

/// `POST /api/voice/call?phone_number=...&workflow_id=...`
pub async fn initiate_call(
    State(state): State<AppState>,
    Query(query): Query<CallQuery>,
) -> Result<Json<Envelope<CallStarted>>, ApiError> {
    state
        .store()
        .find(&query.workflow_id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(ApiError::workflow_not_found)?;

    let session = state
        .providers
        .calls
        .initiate_call(&CallRequest {
            from: None,
            to: Some(query.phone_number.clone()),
        })
        .await
        .map_err(voice_error)?;

    let call_id = generated_id("call_");
    info!(
        %call_id,
        call_sid = %session.call_sid,
        workflow_id = %query.workflow_id,
        "call initiated"
    );
    Ok(ok(CallStarted {
        call_id,
        status: session.status,
        phone_number: query.phone_number,
    }))
}

/// `POST /api/voice/speech-to-text`
pub async fn speech_to_text(
    State(state): State<AppState>,
    Json(audio): Json<AudioInput>,
) -> Result<Json<Envelope<Transcript>>, ApiError> {
    let transcript = state
        .providers
        .stt
        .transcribe(&audio)
        .await
        .map_err(voice_error)?;
    Ok(ok(transcript))
}

/// `POST /api/voice/text-to-speech?text=...&voice_id=...`
pub async fn text_to_speech(
    State(state): State<AppState>,
    Query(query): Query<SpeechQuery>,
) -> Result<Json<Envelope<SpeechAudio>>, ApiError> {
    let mut request = SpeechRequest::new(query.text);
    if let Some(voice_id) = query.voice_id {
        request = request.with_voice(voice_id);
    }

    let audio = state
        .providers
        .tts
        .synthesize(&request)
        .await
        .map_err(voice_error)?;
    Ok(ok(SpeechAudio {
        audio_url: audio.audio_url,
        duration: audio.duration,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::router;
    use crate::routes::test_support::{send, state};
    use crate::config::ServerConfig;
    use axum::http::StatusCode;
    use callflow_core::RecordingDelay;
    use callflow_workflow::Workflow;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn call_requires_existing_workflow() {
        let app = router(state());
        let (status, body) = send(
            &app,
            "POST",
            "/api/voice/call?phone_number=%2B15550001111&workflow_id=nope",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Workflow not found");
    }

    #[tokio::test]
    async fn call_is_initiated() {
        let state = state();
        state
            .store()
            .create(Workflow::new("Sales").with_id("w1"))
            .await
            .expect("seed");
        let app = router(state);

        let (status, body) = send(
            &app,
            "POST",
            "/api/voice/call?phone_number=%2B15550001111&workflow_id=w1",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert!(body["data"]["call_id"].as_str().is_some_and(|id| id.starts_with("call_")));
        assert_eq!(body["data"]["status"], "initiated");
        assert_eq!(body["data"]["phone_number"], "+15550001111");
    }

    #[tokio::test]
    async fn speech_to_text_returns_transcript() {
        let app = router(state());
        let (status, body) = send(
            &app,
            "POST",
            "/api/voice/speech-to-text",
            Some(json!({"url": "https://example.com/a.wav"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["transcript"], "Hello, I'm calling about your product.");
        assert_eq!(body["data"]["confidence"], 0.95);
    }

    #[tokio::test]
    async fn text_to_speech_returns_clip() {
        let app = router(state());
        let (status, body) = send(
            &app,
            "POST",
            "/api/voice/text-to-speech?text=Hello&voice_id=rachel",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["audio_url"].as_str().is_some_and(|url| url.ends_with(".mp3")));
        assert_eq!(body["data"]["duration"], 2.5);
    }

    #[tokio::test]
    async fn text_to_speech_does_not_wait() {
        let delay = Arc::new(RecordingDelay::new());
        let state = AppState::in_memory(&ServerConfig::default(), delay.clone()).expect("state");
        let app = router(state);

        let (status, _) = send(&app, "POST", "/api/voice/text-to-speech?text=Hello", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(delay.requested().is_empty());
    }

    #[test]
    fn invalid_voice_request_is_bad_request() {
        let err = voice_error(VoiceError::InvalidRequest {
            reason: "empty text".to_string(),
        });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
