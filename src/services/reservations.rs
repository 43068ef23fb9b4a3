//! Reservation service

use chrono::Duration;

use crate::{
    config::CirculationConfig,
    error::AppResult,
    models::{
        reservation::{Reservation, ReservationDetails},
        user::UserClaims,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct ReservationsService {
    repository: Repository,
    policy: CirculationConfig,
}

impl ReservationsService {
    pub fn new(repository: Repository, policy: CirculationConfig) -> Self {
        Self { repository, policy }
    }

    /// Queue a reservation for the authenticated user.
    ///
    /// No notification goes out at creation time; the holder is notified
    /// when a return fulfills the reservation.
    pub async fn create_reservation(
        &self,
        book_id: i32,
        claims: &UserClaims,
    ) -> AppResult<Reservation> {
        let reservation = self
            .repository
            .reservations
            .create(
                claims.user_id,
                book_id,
                Duration::days(self.policy.reservation_hold_days),
            )
            .await?;

        tracing::info!(
            reservation_id = reservation.id,
            book_id,
            user_id = claims.user_id,
            "reservation created"
        );

        Ok(reservation)
    }

    /// Reservations of the authenticated user
    pub async fn get_user_reservations(
        &self,
        claims: &UserClaims,
    ) -> AppResult<Vec<ReservationDetails>> {
        self.repository
            .reservations
            .get_user_reservations(claims.user_id)
            .await
    }
}
