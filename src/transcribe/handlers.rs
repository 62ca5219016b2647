use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use bytes::Bytes;
use tracing::{error, instrument};

use crate::speech::SpeechError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/transcribe", post(transcribe))
}

/// POST /transcribe — raw audio bytes in, trimmed transcript out. An empty
/// transcript is a valid 200 (no speech detected), distinct from a failure.
#[instrument(skip(state, headers, body), fields(bytes = body.len()))]
async fn transcribe(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    if body.is_empty() {
        return (StatusCode::BAD_REQUEST, "audio body is required".to_string()).into_response();
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    match state.speech.transcribe(body, &content_type).await {
        Ok(transcript) => (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            transcript,
        )
            .into_response(),
        Err(e @ SpeechError::Status(_)) => {
            error!(error = %e, "transcription rejected upstream");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Transcription failed".to_string(),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "transcription failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
                .into_response()
        }
    }
}
