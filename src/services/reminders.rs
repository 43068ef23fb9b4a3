//! Scheduled notification sweeps
//!
//! Both sweeps are short, idempotent and re-runnable: a read-only query plus
//! one best-effort email per record. A failed send is logged and counted,
//! never aborts the batch, and mutates nothing.

use chrono::{Duration, NaiveTime, TimeZone, Utc};
use std::sync::Arc;

use crate::{
    config::CirculationConfig,
    error::AppResult,
    repository::Repository,
    services::email::Notifier,
};

#[derive(Clone)]
pub struct RemindersService {
    repository: Repository,
    notifier: Arc<dyn Notifier>,
    policy: CirculationConfig,
}

/// Outcome counters for one sweep run
#[derive(Debug, Clone, Copy, Default)]
pub struct SweepReport {
    pub matched: usize,
    pub sent: usize,
    pub failed: usize,
}

impl RemindersService {
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

    /// Remind borrowers of open loans that fall due tomorrow (UTC calendar day)
    pub async fn send_due_soon_reminders(&self) -> AppResult<SweepReport> {
        let tomorrow = (Utc::now() + Duration::days(1)).date_naive();
        let from = Utc.from_utc_datetime(&tomorrow.and_time(NaiveTime::MIN));
        let to = from + Duration::days(1);

        let due = self.repository.loans.due_between(from, to).await?;
        let mut report = SweepReport {
            matched: due.len(),
            ..Default::default()
        };

        if due.is_empty() {
            tracing::info!("No loans due tomorrow");
            return Ok(report);
        }

        tracing::info!("Sending {} due-date reminder(s)", due.len());

        for loan in &due {
            let name = loan
                .borrower_first_name
                .as_deref()
                .filter(|n| !n.is_empty())
                .unwrap_or(&loan.borrower_username);
            let body = format!(
                "Hello {},\n\n\
                 This is a friendly reminder that your loan of \"{}\" is due tomorrow, {}.\n\n\
                 Please return it on time to avoid sanctions.\n\n\
                 Thank you for using Biblioteca Digital!",
                name,
                loan.book_title,
                loan.due_date.format("%Y-%m-%d"),
            );

            match self
                .notifier
                .send(
                    &loan.borrower_email,
                    "Due Date Reminder - Biblioteca Digital",
                    &body,
                )
                .await
            {
                Ok(()) => {
                    tracing::info!(
                        loan_id = loan.loan_id,
                        "Reminder sent to {} for \"{}\"",
                        loan.borrower_email,
                        loan.book_title
                    );
                    report.sent += 1;
                }
                Err(e) => {
                    tracing::error!(
                        loan_id = loan.loan_id,
                        "Failed to send reminder to {}: {}",
                        loan.borrower_email,
                        e
                    );
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Notify holders whose reservations expired inside the look-back window
    pub async fn send_expiry_notices(&self) -> AppResult<SweepReport> {
        let cutoff = Utc::now() - Duration::hours(self.policy.expiry_sweep_window_hours);
        let expired = self.repository.reservations.expired_since(cutoff).await?;
        let mut report = SweepReport {
            matched: expired.len(),
            ..Default::default()
        };

        if expired.is_empty() {
            tracing::info!("No reservations expired in the window");
            return Ok(report);
        }

        tracing::info!("Sending {} reservation-expiry notice(s)", expired.len());

        for reservation in &expired {
            let name = reservation
                .holder_first_name
                .as_deref()
                .filter(|n| !n.is_empty())
                .unwrap_or(&reservation.holder_username);
            let body = format!(
                "Hello {},\n\n\
                 Your reservation for \"{}\" expired on {}.\n\
                 You can place a new reservation if the book is still unavailable.",
                name,
                reservation.book_title,
                reservation.expires_at.format("%Y-%m-%d %H:%M"),
            );

            match self
                .notifier
                .send(
                    &reservation.holder_email,
                    "Your reservation has expired",
                    &body,
                )
                .await
            {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    tracing::error!(
                        reservation_id = reservation.reservation_id,
                        "Failed to send expiry notice to {}: {}",
                        reservation.holder_email,
                        e
                    );
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}
