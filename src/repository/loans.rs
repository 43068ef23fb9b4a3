//! Loans repository: the loan/reservation lifecycle transactions.
//!
//! Every lifecycle operation runs as one transaction and takes a row lock on
//! the book before the check-then-act sequence, so two concurrent requests
//! cannot both observe an available book and both succeed.

use chrono::{DateTime, Duration, Utc};
use sqlx::{Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::BookState,
        loan::{Loan, LoanDetails},
        reservation::Reservation,
    },
};

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

/// Committed loan plus the context needed for the confirmation email
#[derive(Debug, Clone)]
pub struct CreatedLoan {
    pub loan: Loan,
    pub book_title: String,
    pub borrower_email: String,
    pub borrower_name: String,
}

/// Reservation fulfilled during a return, with holder contact
#[derive(Debug, Clone)]
pub struct FulfilledReservation {
    pub reservation: Reservation,
    pub holder_email: String,
    pub holder_name: String,
}

/// Outcome of a return: the closed loan and at most one fulfilled reservation
#[derive(Debug, Clone)]
pub struct ReturnedLoan {
    pub loan: Loan,
    pub book_title: String,
    pub fulfilled: Option<FulfilledReservation>,
}

/// Open loan due soon, with borrower contact for the reminder sweep
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DueSoonLoan {
    pub loan_id: i32,
    pub book_title: String,
    pub due_date: DateTime<Utc>,
    pub borrower_email: String,
    pub borrower_first_name: Option<String>,
    pub borrower_username: String,
}

/// Loans-per-month entry for the dashboard
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MonthlyLoans {
    pub month: DateTime<Utc>,
    pub total: i64,
}

fn display_name(first_name: Option<String>, username: String) -> String {
    first_name.filter(|n| !n.is_empty()).unwrap_or(username)
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// Create a new loan for a user.
    ///
    /// Precondition order matters: the sanction check runs before the
    /// availability check, and a failure of either leaves no trace.
    pub async fn create(
        &self,
        user_id: i32,
        book_id: i32,
        loan_period: Duration,
    ) -> AppResult<CreatedLoan> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        // Lock the book row for the whole check-then-act sequence
        let book_row = sqlx::query("SELECT title, state FROM books WHERE id = $1 FOR UPDATE")
            .bind(book_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book_id)))?;

        // Sanction: any open overdue loan blocks new loans, whichever book
        let sanctioned: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM loans
                WHERE user_id = $1 AND return_date IS NULL
                  AND (manual_overdue OR due_date < $2)
            )
            "#,
        )
        .bind(user_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        if sanctioned {
            return Err(AppError::SanctionActive);
        }

        let state: BookState = book_row.get("state");
        if state != BookState::Available {
            return Err(AppError::BookUnavailable);
        }

        let due_date = now + loan_period;
        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (book_id, user_id, loan_date, due_date)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(book_id)
        .bind(user_id)
        .bind(now)
        .bind(due_date)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE books SET state = $1 WHERE id = $2")
            .bind(BookState::Loaned)
            .bind(book_id)
            .execute(&mut *tx)
            .await?;

        let borrower = sqlx::query("SELECT username, email, first_name FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", user_id)))?;

        tx.commit().await?;

        Ok(CreatedLoan {
            loan,
            book_title: book_row.get("title"),
            borrower_email: borrower.get("email"),
            borrower_name: display_name(borrower.get("first_name"), borrower.get("username")),
        })
    }

    /// Close a loan and resolve the reservation queue for its book.
    ///
    /// The book always goes back to `available`, even when a reservation is
    /// fulfilled in the same transaction; at most one reservation (oldest
    /// `reserved_at`, record id as tie-break) is marked fulfilled.
    pub async fn return_loan(&self, loan_id: i32) -> AppResult<ReturnedLoan> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(loan_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", loan_id)))?;

        if loan.return_date.is_some() {
            return Err(AppError::Conflict("Loan already returned".to_string()));
        }

        let book_row = sqlx::query("SELECT title FROM books WHERE id = $1 FOR UPDATE")
            .bind(loan.book_id)
            .fetch_one(&mut *tx)
            .await?;
        let book_title: String = book_row.get("title");

        let loan = sqlx::query_as::<_, Loan>(
            "UPDATE loans SET return_date = $1 WHERE id = $2 RETURNING *",
        )
        .bind(now)
        .bind(loan_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE books SET state = $1 WHERE id = $2")
            .bind(BookState::Available)
            .bind(loan.book_id)
            .execute(&mut *tx)
            .await?;

        // Oldest active reservation claims the return
        let next = sqlx::query(
            r#"
            SELECT r.id, r.book_id, r.user_id, r.reserved_at, r.expires_at, r.fulfilled,
                   u.email, u.first_name, u.username
            FROM reservations r
            JOIN users u ON u.id = r.user_id
            WHERE r.book_id = $1 AND NOT r.fulfilled AND r.expires_at > $2
            ORDER BY r.reserved_at, r.id
            LIMIT 1
            FOR UPDATE OF r
            "#,
        )
        .bind(loan.book_id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let fulfilled = if let Some(row) = next {
            let reservation_id: i32 = row.get("id");
            let reservation = sqlx::query_as::<_, Reservation>(
                "UPDATE reservations SET fulfilled = TRUE WHERE id = $1 RETURNING *",
            )
            .bind(reservation_id)
            .fetch_one(&mut *tx)
            .await?;

            Some(FulfilledReservation {
                reservation,
                holder_email: row.get("email"),
                holder_name: display_name(row.get("first_name"), row.get("username")),
            })
        } else {
            None
        };

        tx.commit().await?;

        Ok(ReturnedLoan {
            loan,
            book_title,
            fulfilled,
        })
    }

    /// Flag an open loan as overdue by hand
    pub async fn mark_overdue(&self, loan_id: i32) -> AppResult<Loan> {
        let loan = self.get_by_id(loan_id).await?;

        if loan.return_date.is_some() {
            return Err(AppError::Conflict(
                "Cannot flag a returned loan as overdue".to_string(),
            ));
        }

        let loan = sqlx::query_as::<_, Loan>(
            "UPDATE loans SET manual_overdue = TRUE WHERE id = $1 RETURNING *",
        )
        .bind(loan_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(loan)
    }

    /// Loans of one user, most recent first
    pub async fn get_user_loans(&self, user_id: i32) -> AppResult<Vec<LoanDetails>> {
        let mut loans = sqlx::query_as::<_, LoanDetails>(
            r#"
            SELECT l.id, l.book_id, b.title AS book_title, l.user_id, u.username,
                   l.loan_date, l.due_date, l.return_date, l.manual_overdue
            FROM loans l
            JOIN books b ON b.id = l.book_id
            JOIN users u ON u.id = l.user_id
            WHERE l.user_id = $1
            ORDER BY l.loan_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let now = Utc::now();
        for loan in &mut loans {
            loan.is_overdue =
                loan.return_date.is_none() && (loan.manual_overdue || now > loan.due_date);
        }

        Ok(loans)
    }

    /// All loans for the management view, open loans first
    pub async fn list_all(&self) -> AppResult<Vec<LoanDetails>> {
        let mut loans = sqlx::query_as::<_, LoanDetails>(
            r#"
            SELECT l.id, l.book_id, b.title AS book_title, l.user_id, u.username,
                   l.loan_date, l.due_date, l.return_date, l.manual_overdue
            FROM loans l
            JOIN books b ON b.id = l.book_id
            JOIN users u ON u.id = l.user_id
            ORDER BY l.return_date NULLS FIRST, l.loan_date DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let now = Utc::now();
        for loan in &mut loans {
            loan.is_overdue =
                loan.return_date.is_none() && (loan.manual_overdue || now > loan.due_date);
        }

        Ok(loans)
    }

    /// Open loans whose due date falls inside [from, to), for the reminder sweep
    pub async fn due_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<DueSoonLoan>> {
        let loans = sqlx::query_as::<_, DueSoonLoan>(
            r#"
            SELECT l.id AS loan_id, b.title AS book_title, l.due_date,
                   u.email AS borrower_email, u.first_name AS borrower_first_name,
                   u.username AS borrower_username
            FROM loans l
            JOIN books b ON b.id = l.book_id
            JOIN users u ON u.id = l.user_id
            WHERE l.return_date IS NULL AND l.due_date >= $1 AND l.due_date < $2
            ORDER BY l.due_date
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(loans)
    }

    /// Count open loans
    pub async fn count_active(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE return_date IS NULL")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Count open loans currently overdue
    pub async fn count_overdue(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE return_date IS NULL AND (manual_overdue OR due_date < NOW())",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Loans grouped by calendar month, for the dashboard chart
    pub async fn per_month(&self) -> AppResult<Vec<MonthlyLoans>> {
        let rows = sqlx::query_as::<_, MonthlyLoans>(
            r#"
            SELECT date_trunc('month', loan_date) AS month, COUNT(*) AS total
            FROM loans
            GROUP BY month
            ORDER BY month
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
