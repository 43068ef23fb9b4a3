//! Reservations repository for database operations

use chrono::{DateTime, Duration, Utc};
use sqlx::{Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::BookState,
        reservation::{Reservation, ReservationDetails},
    },
};

#[derive(Clone)]
pub struct ReservationsRepository {
    pool: Pool<Postgres>,
}

/// Expired reservation with holder contact, for the expiry sweep
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ExpiredReservation {
    pub reservation_id: i32,
    pub book_title: String,
    pub expires_at: DateTime<Utc>,
    pub holder_email: String,
    pub holder_first_name: Option<String>,
    pub holder_username: String,
}

impl ReservationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Queue a reservation for a book that cannot be borrowed right now.
    ///
    /// Rejected when the book is available (borrow it directly instead) and
    /// when the user already holds an active reservation on it.
    pub async fn create(
        &self,
        user_id: i32,
        book_id: i32,
        hold_period: Duration,
    ) -> AppResult<Reservation> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let book_row = sqlx::query("SELECT state FROM books WHERE id = $1 FOR UPDATE")
            .bind(book_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book_id)))?;

        let state: BookState = book_row.get("state");
        if state == BookState::Available {
            return Err(AppError::BookAlreadyAvailable);
        }

        let duplicate: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM reservations
                WHERE book_id = $1 AND user_id = $2 AND NOT fulfilled AND expires_at > $3
            )
            "#,
        )
        .bind(book_id)
        .bind(user_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        if duplicate {
            return Err(AppError::DuplicateReservation);
        }

        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            INSERT INTO reservations (book_id, user_id, reserved_at, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(book_id)
        .bind(user_id)
        .bind(now)
        .bind(now + hold_period)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(reservation)
    }

    /// Reservations of one user, most recent first
    pub async fn get_user_reservations(&self, user_id: i32) -> AppResult<Vec<ReservationDetails>> {
        let mut reservations = sqlx::query_as::<_, ReservationDetails>(
            r#"
            SELECT r.id, r.book_id, b.title AS book_title,
                   r.reserved_at, r.expires_at, r.fulfilled
            FROM reservations r
            JOIN books b ON b.id = r.book_id
            WHERE r.user_id = $1
            ORDER BY r.reserved_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let now = Utc::now();
        for r in &mut reservations {
            r.is_active = !r.fulfilled && now <= r.expires_at;
        }

        Ok(reservations)
    }

    /// Unfulfilled reservations that expired inside the look-back window,
    /// for the expiry-notification sweep
    pub async fn expired_since(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<ExpiredReservation>> {
        let now = Utc::now();
        let expired = sqlx::query_as::<_, ExpiredReservation>(
            r#"
            SELECT r.id AS reservation_id, b.title AS book_title, r.expires_at,
                   u.email AS holder_email, u.first_name AS holder_first_name,
                   u.username AS holder_username
            FROM reservations r
            JOIN books b ON b.id = r.book_id
            JOIN users u ON u.id = r.user_id
            WHERE NOT r.fulfilled AND r.expires_at <= $1 AND r.expires_at > $2
            ORDER BY r.expires_at
            "#,
        )
        .bind(now)
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(expired)
    }
}
