//! Report export endpoints (CSV)

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
};

use crate::error::AppResult;

use super::AuthenticatedUser;

fn csv_headers(filename: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    headers.insert(header::CONTENT_DISPOSITION, HeaderValue::from_static(filename));
    headers
}

/// Export the book catalog as CSV. Librarian-only.
#[utoipa::path(
    get,
    path = "/reports/books.csv",
    tag = "reports",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Book catalog report", body = String, content_type = "text/csv"),
        (status = 403, description = "Librarian role required")
    )
)]
pub async fn books_csv(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<(HeaderMap, String)> {
    claims.require_librarian()?;

    let csv = state.services.reports.books_csv().await?;
    Ok((
        csv_headers("attachment; filename=\"books_report.csv\""),
        csv,
    ))
}

/// Export loan history as CSV. Librarian-only.
#[utoipa::path(
    get,
    path = "/reports/loans.csv",
    tag = "reports",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Loans report", body = String, content_type = "text/csv"),
        (status = 403, description = "Librarian role required")
    )
)]
pub async fn loans_csv(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<(HeaderMap, String)> {
    claims.require_librarian()?;

    let csv = state.services.reports.loans_csv().await?;
    Ok((
        csv_headers("attachment; filename=\"loans_report.csv\""),
        csv,
    ))
}
