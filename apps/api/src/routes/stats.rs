use axum::{extract::State, Json};

use crate::state::AppState;
use crate::store::{self, Stats};

/// GET /api/v1/stats
/// Landing-page counters. A database failure is logged and reported as zeros.
pub async fn stats_handler(State(state): State<AppState>) -> Json<Stats> {
    match store::stats(&state.db).await {
        Ok(stats) => Json(stats),
        Err(e) => {
            tracing::warn!("Failed to load landing page stats: {e}");
            Json(Stats::default())
        }
    }
}
