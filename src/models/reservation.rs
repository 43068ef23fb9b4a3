//! Reservation model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Reservation model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Reservation {
    pub id: i32,
    pub book_id: i32,
    pub user_id: i32,
    pub reserved_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub fulfilled: bool,
}

impl Reservation {
    /// A reservation queues for the book while unfulfilled and unexpired.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.fulfilled && now <= self.expires_at
    }
}

/// Reservation with book context for lists
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ReservationDetails {
    pub id: i32,
    pub book_id: i32,
    pub book_title: String,
    pub reserved_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub fulfilled: bool,
    #[sqlx(default)]
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn reservation(expires_in_days: i64, fulfilled: bool) -> (Reservation, DateTime<Utc>) {
        let now = Utc::now();
        let r = Reservation {
            id: 1,
            book_id: 1,
            user_id: 1,
            reserved_at: now - Duration::days(1),
            expires_at: now + Duration::days(expires_in_days),
            fulfilled,
        };
        (r, now)
    }

    #[test]
    fn unfulfilled_before_expiry_is_active() {
        let (r, now) = reservation(2, false);
        assert!(r.is_active_at(now));
    }

    #[test]
    fn expired_reservation_is_inactive() {
        let (r, now) = reservation(-1, false);
        assert!(!r.is_active_at(now));
    }

    #[test]
    fn fulfilled_reservation_is_inactive() {
        let (r, now) = reservation(2, true);
        assert!(!r.is_active_at(now));
    }
}
