//! Loan model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Loan model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: i32,
    pub book_id: i32,
    pub user_id: i32,
    pub loan_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    /// Null while the loan is open
    pub return_date: Option<DateTime<Utc>>,
    /// Librarian override, counts as overdue regardless of the due date
    pub manual_overdue: bool,
}

impl Loan {
    /// Whether the loan is overdue at `now`. Closed loans are never overdue.
    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        if self.return_date.is_some() {
            return false;
        }
        if self.manual_overdue {
            return true;
        }
        now > self.due_date
    }
}

/// Loan with book and borrower context for lists and reports
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LoanDetails {
    pub id: i32,
    pub book_id: i32,
    pub book_title: String,
    pub user_id: i32,
    pub username: String,
    pub loan_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub manual_overdue: bool,
    #[sqlx(default)]
    pub is_overdue: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn loan(due_in_days: i64, returned: bool, manual: bool) -> (Loan, DateTime<Utc>) {
        let now = Utc::now();
        let loan = Loan {
            id: 1,
            book_id: 1,
            user_id: 1,
            loan_date: now - Duration::days(1),
            due_date: now + Duration::days(due_in_days),
            return_date: returned.then_some(now),
            manual_overdue: manual,
        };
        (loan, now)
    }

    #[test]
    fn open_loan_past_due_is_overdue() {
        let (loan, now) = loan(-1, false, false);
        assert!(loan.is_overdue_at(now));
    }

    #[test]
    fn open_loan_before_due_is_not_overdue() {
        let (loan, now) = loan(13, false, false);
        assert!(!loan.is_overdue_at(now));
    }

    #[test]
    fn manual_flag_overrides_due_date() {
        let (loan, now) = loan(13, false, true);
        assert!(loan.is_overdue_at(now));
    }

    #[test]
    fn returned_loan_is_never_overdue() {
        let (loan, now) = loan(-30, true, true);
        assert!(!loan.is_overdue_at(now));
    }
}
