use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;
use tracing::{error, instrument};

use crate::state::AppState;

use super::dto::ChatRequest;
use super::service;

pub fn router() -> Router<AppState> {
    Router::new().route("/chat", post(chat))
}

/// POST /chat — streams the assistant reply as raw text chunks. The status
/// line is committed once streaming starts, so only failures before the
/// first model round get a JSON 500.
#[instrument(skip(state, body), fields(messages = body.messages.len()))]
async fn chat(State(state): State<AppState>, Json(body): Json<ChatRequest>) -> Response {
    if body.messages.is_empty() {
        return (StatusCode::BAD_REQUEST, "messages is required".to_string()).into_response();
    }

    match service::stream_reply(state, body.into_turns()).await {
        Ok(chunks) => {
            let mut response = Response::new(Body::from_stream(chunks));
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            );
            response
        }
        Err(e) => {
            error!(error = %e, "chat failed before streaming");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error",
                    "details": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}
