//! Reservation endpoints

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{error::AppResult, models::reservation::ReservationDetails};

use super::AuthenticatedUser;

/// Create reservation request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReservationRequest {
    /// Book to queue for
    pub book_id: i32,
}

/// Reservation response
#[derive(Serialize, ToSchema)]
pub struct ReservationResponse {
    /// Reservation ID
    pub id: i32,
    /// When the hold lapses if the book does not come back
    pub expires_at: DateTime<Utc>,
    /// Status message
    pub message: String,
}

/// Reserve a currently-unavailable book for the authenticated user
#[utoipa::path(
    post,
    path = "/reservations",
    tag = "reservations",
    security(("bearer_auth" = [])),
    request_body = CreateReservationRequest,
    responses(
        (status = 201, description = "Reservation created", body = ReservationResponse),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book available for direct loan, or duplicate reservation")
    )
)]
pub async fn create_reservation(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateReservationRequest>,
) -> AppResult<(StatusCode, Json<ReservationResponse>)> {
    let reservation = state
        .services
        .reservations
        .create_reservation(request.book_id, &claims)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ReservationResponse {
            id: reservation.id,
            expires_at: reservation.expires_at,
            message: "Reservation created. You will be notified when the book is available."
                .to_string(),
        }),
    ))
}

/// Reservations of the authenticated user
#[utoipa::path(
    get,
    path = "/reservations/me",
    tag = "reservations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own reservations", body = Vec<ReservationDetails>)
    )
)]
pub async fn my_reservations(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<ReservationDetails>>> {
    let reservations = state
        .services
        .reservations
        .get_user_reservations(&claims)
        .await?;
    Ok(Json(reservations))
}
