//! Statistics endpoint for the librarian dashboard

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppResult, repository::books::TopBook};

use super::AuthenticatedUser;

/// Loans aggregated by calendar month
#[derive(Serialize, ToSchema)]
pub struct MonthlyLoansEntry {
    /// Month label, e.g. "Mar 2025"
    pub month: String,
    pub total: i64,
}

/// Dashboard statistics
#[derive(Serialize, ToSchema)]
pub struct StatsResponse {
    pub total_books: i64,
    pub total_readers: i64,
    pub active_loans: i64,
    pub overdue_loans: i64,
    pub loans_per_month: Vec<MonthlyLoansEntry>,
    pub top_books: Vec<TopBook>,
}

/// Get library statistics. Librarian-only.
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Library statistics", body = StatsResponse),
        (status = 403, description = "Librarian role required")
    )
)]
pub async fn get_stats(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<StatsResponse>> {
    claims.require_librarian()?;

    let stats = state.services.stats.get_stats().await?;
    Ok(Json(stats))
}
