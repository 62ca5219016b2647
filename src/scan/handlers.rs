use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tracing::{error, instrument};

use crate::state::AppState;

use super::dto::ScanQuery;
use super::service;

pub fn router() -> Router<AppState> {
    Router::new().route("/scan", get(scan))
}

/// GET /scan?id=<productId> — one structured nutrition candidate as JSON.
#[instrument(skip(state))]
async fn scan(State(state): State<AppState>, Query(q): Query<ScanQuery>) -> Response {
    let Some(id) = q.id.filter(|id| !id.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "id is required".to_string()).into_response();
    };

    match service::scan_product(&state, &id).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => {
            error!(error = %e, %id, "scan failed");
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
