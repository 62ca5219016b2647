use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::state::AppState;

use super::dto::{CreatedIngredientResponse, NewIngredient, SearchQuery};
use super::repo::{self, Ingredient};

pub fn read_router() -> Router<AppState> {
    Router::new().route("/ingredients", get(search_ingredients))
}

pub fn write_router() -> Router<AppState> {
    Router::new().route("/ingredients", post(create_ingredient))
}

#[instrument(skip(state))]
async fn search_ingredients(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> Result<Json<Vec<Ingredient>>, (StatusCode, String)> {
    let rows = repo::search_by_name(&state.db, &q.name)
        .await
        .map_err(internal)?;
    Ok(Json(rows))
}

/// Scan-confirmation write path: the UI posts the reviewed scan result here.
/// Idempotent on `ean_id`: a replayed EAN answers 200 with the existing id
/// instead of 201.
#[instrument(skip(state, body))]
async fn create_ingredient(
    State(state): State<AppState>,
    Json(body): Json<NewIngredient>,
) -> Result<(StatusCode, HeaderMap, Json<CreatedIngredientResponse>), (StatusCode, String)> {
    body.validate()
        .map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;

    let outcome = repo::create(&state.db, &body).await.map_err(internal)?;

    let mut headers = HeaderMap::new();
    let status = match outcome {
        repo::CreateOutcome::Inserted(id) => {
            if let Ok(location) = format!("/api/ingredients/{id}").parse() {
                headers.insert(axum::http::header::LOCATION, location);
            }
            StatusCode::CREATED
        }
        repo::CreateOutcome::Existing(_) => StatusCode::OK,
    };

    Ok((
        status,
        headers,
        Json(CreatedIngredientResponse { id: outcome.id() }),
    ))
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
