use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::state::AppState;

use super::dto::RangeQuery;
use super::repo::{self, LoggedFood};

pub fn read_router() -> Router<AppState> {
    Router::new().route("/foods", get(list_foods))
}

/// GET /foods?from=YYYY-MM-DD&to=YYYY-MM-DD — inclusive bounds, newest
/// first, capped at 100 rows.
#[instrument(skip(state))]
async fn list_foods(
    State(state): State<AppState>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<LoggedFood>>, (StatusCode, String)> {
    validate_range(&range).map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;
    let rows = repo::list_by_date_range(&state.db, &range.from, &range.to)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(rows))
}

fn validate_range(range: &RangeQuery) -> Result<(), String> {
    if range.from.is_empty() || range.to.is_empty() {
        return Err("from and to are required".into());
    }
    if range.from > range.to {
        return Err("from must not be after to".into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(from: &str, to: &str) -> RangeQuery {
        RangeQuery {
            from: from.into(),
            to: to.into(),
        }
    }

    #[test]
    fn accepts_ordered_bounds() {
        assert!(validate_range(&range("2025-01-01", "2025-01-31")).is_ok());
        assert!(validate_range(&range("2025-01-15", "2025-01-15")).is_ok());
    }

    #[test]
    fn rejects_inverted_or_empty_bounds() {
        assert!(validate_range(&range("2025-02-01", "2025-01-01")).is_err());
        assert!(validate_range(&range("", "2025-01-01")).is_err());
    }
}
