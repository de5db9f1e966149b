//! Statistics endpoints

use axum::{extract::State, Json};

use crate::{error::AppResult, services::stats::LibraryStatistics, AppState};

/// Library-wide counters
#[utoipa::path(
    get,
    path = "/library/statistics/",
    tag = "stats",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Library statistics", body = LibraryStatistics),
        (status = 403, description = "Staff privileges required", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_statistics(State(state): State<AppState>) -> AppResult<Json<LibraryStatistics>> {
    let stats = state.services.stats.get_statistics().await?;
    Ok(Json(stats))
}
