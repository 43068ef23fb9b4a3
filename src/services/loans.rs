//! Loan lifecycle service
//!
//! Orchestrates the circulation operations: role gating, the transactional
//! repository calls, and the best-effort notifications that follow them.

use chrono::Duration;
use std::sync::Arc;

use crate::{
    config::CirculationConfig,
    error::AppResult,
    models::{
        loan::{Loan, LoanDetails},
        user::UserClaims,
    },
    repository::Repository,
    services::email::{notify_best_effort, Notifier},
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    notifier: Arc<dyn Notifier>,
    policy: CirculationConfig,
}

/// Successful loan creation, with an optional delivery warning
#[derive(Debug, Clone)]
pub struct LoanCreated {
    pub loan: Loan,
    pub book_title: String,
    pub warning: Option<String>,
}

/// Successful return, reporting whether a reservation claimed the book
#[derive(Debug, Clone)]
pub struct LoanReturned {
    pub loan: Loan,
    pub book_title: String,
    pub reservation_fulfilled: bool,
    pub warning: Option<String>,
}

impl LoansService {
    pub fn new(
        repository: Repository,
        notifier: Arc<dyn Notifier>,
        policy: CirculationConfig,
    ) -> Self {
        Self {
            repository,
            notifier,
            policy,
        }
    }

    /// Borrow a book for the authenticated user.
    ///
    /// The committed loan is the durable success signal; the confirmation
    /// email is best-effort and its failure only produces a warning.
    pub async fn create_loan(&self, book_id: i32, claims: &UserClaims) -> AppResult<LoanCreated> {
        let created = self
            .repository
            .loans
            .create(
                claims.user_id,
                book_id,
                Duration::days(self.policy.loan_period_days),
            )
            .await?;

        tracing::info!(
            loan_id = created.loan.id,
            book_id,
            user_id = claims.user_id,
            "loan created"
        );

        let body = format!(
            "Hello {},\n\n\
             This confirms you have borrowed \"{}\".\n\
             The due date is {}.\n\n\
             Thank you for using Biblioteca Digital!",
            created.borrower_name,
            created.book_title,
            created.loan.due_date.format("%Y-%m-%d"),
        );
        let warning = notify_best_effort(
            self.notifier.as_ref(),
            &created.borrower_email,
            "Loan Confirmation - Biblioteca Digital",
            &body,
        )
        .await
        .map(|e| format!("Loan registered, but the confirmation email failed: {}", e));

        Ok(LoanCreated {
            loan: created.loan,
            book_title: created.book_title,
            warning,
        })
    }

    /// Return a borrowed book. Librarian-only.
    ///
    /// At most one active reservation is fulfilled by the return; its holder
    /// gets a best-effort "reservation ready" notification.
    pub async fn return_loan(&self, loan_id: i32, claims: &UserClaims) -> AppResult<LoanReturned> {
        claims.require_librarian()?;

        let returned = self.repository.loans.return_loan(loan_id).await?;

        tracing::info!(
            loan_id,
            book_id = returned.loan.book_id,
            reservation_fulfilled = returned.fulfilled.is_some(),
            "loan returned"
        );

        let mut warning = None;
        if let Some(ref fulfilled) = returned.fulfilled {
            let body = format!(
                "Hello {},\n\n\
                 \"{}\" is now available for loan. \
                 You have until {} to pick it up.",
                fulfilled.holder_name,
                returned.book_title,
                fulfilled.reservation.expires_at.format("%Y-%m-%d %H:%M"),
            );
            warning = notify_best_effort(
                self.notifier.as_ref(),
                &fulfilled.holder_email,
                "Your reservation is ready",
                &body,
            )
            .await
            .map(|e| format!("Return registered, but the reservation notice failed: {}", e));
        }

        Ok(LoanReturned {
            loan: returned.loan,
            book_title: returned.book_title,
            reservation_fulfilled: returned.fulfilled.is_some(),
            warning,
        })
    }

    /// Flag a loan as overdue ahead of its due date. Librarian-only.
    pub async fn mark_overdue(&self, loan_id: i32, claims: &UserClaims) -> AppResult<Loan> {
        claims.require_librarian()?;
        self.repository.loans.mark_overdue(loan_id).await
    }

    /// Loans of the authenticated user
    pub async fn get_user_loans(&self, claims: &UserClaims) -> AppResult<Vec<LoanDetails>> {
        self.repository.loans.get_user_loans(claims.user_id).await
    }

    /// All loans for the management view. Librarian-only.
    pub async fn list_loans(&self, claims: &UserClaims) -> AppResult<Vec<LoanDetails>> {
        claims.require_librarian()?;
        self.repository.loans.list_all().await
    }
}
