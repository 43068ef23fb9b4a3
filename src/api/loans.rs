//! Loan lifecycle endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::loan::{Loan, LoanDetails},
};

use super::AuthenticatedUser;

/// Create loan request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLoanRequest {
    /// Book to borrow
    pub book_id: i32,
}

/// Loan response with calculated due date
#[derive(Serialize, ToSchema)]
pub struct LoanResponse {
    /// Loan ID
    pub id: i32,
    /// Due date (ISO 8601 format)
    pub due_date: DateTime<Utc>,
    /// Status message
    pub message: String,
    /// Set when the confirmation email could not be delivered
    pub warning: Option<String>,
}

/// Return response
#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    /// Return status
    pub status: String,
    /// Title of the returned book
    pub book_title: String,
    /// Whether an active reservation claimed this return
    pub reservation_fulfilled: bool,
    /// Set when the reservation notice could not be delivered
    pub warning: Option<String>,
}

/// Borrow a book as the authenticated user
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = CreateLoanRequest,
    responses(
        (status = 201, description = "Loan created", body = LoanResponse),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book is not available"),
        (status = 422, description = "Active sanction blocks new loans")
    )
)]
pub async fn create_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateLoanRequest>,
) -> AppResult<(StatusCode, Json<LoanResponse>)> {
    let created = state
        .services
        .loans
        .create_loan(request.book_id, &claims)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(LoanResponse {
            id: created.loan.id,
            due_date: created.loan.due_date,
            message: format!("You have borrowed \"{}\"", created.book_title),
            warning: created.warning,
        }),
    ))
}

/// Return a borrowed book. Librarian-only.
#[utoipa::path(
    post,
    path = "/loans/{id}/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = ReturnResponse),
        (status = 403, description = "Librarian role required"),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Already returned")
    )
)]
pub async fn return_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<ReturnResponse>> {
    let returned = state.services.loans.return_loan(loan_id, &claims).await?;

    Ok(Json(ReturnResponse {
        status: "returned".to_string(),
        book_title: returned.book_title,
        reservation_fulfilled: returned.reservation_fulfilled,
        warning: returned.warning,
    }))
}

/// Flag a loan as overdue ahead of its due date. Librarian-only.
#[utoipa::path(
    post,
    path = "/loans/{id}/overdue",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan flagged as overdue", body = Loan),
        (status = 403, description = "Librarian role required"),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Loan already returned")
    )
)]
pub async fn mark_loan_overdue(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<Loan>> {
    let loan = state.services.loans.mark_overdue(loan_id, &claims).await?;
    Ok(Json(loan))
}

/// All loans, open first. Librarian-only management view.
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All loans", body = Vec<LoanDetails>),
        (status = 403, description = "Librarian role required")
    )
)]
pub async fn list_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<LoanDetails>>> {
    let loans = state.services.loans.list_loans(&claims).await?;
    Ok(Json(loans))
}

/// Loans of the authenticated user
#[utoipa::path(
    get,
    path = "/loans/me",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own loans", body = Vec<LoanDetails>)
    )
)]
pub async fn my_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<LoanDetails>>> {
    let loans = state.services.loans.get_user_loans(&claims).await?;
    Ok(Json(loans))
}
