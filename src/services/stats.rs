//! Statistics service for the librarian dashboard

use crate::{
    api::stats::{MonthlyLoansEntry, StatsResponse},
    error::AppResult,
    repository::Repository,
};

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Dashboard numbers: totals, loans per month, most-borrowed books
    pub async fn get_stats(&self) -> AppResult<StatsResponse> {
        let total_books = self.repository.books.count().await?;
        let total_readers = self.repository.users.count_readers().await?;
        let active_loans = self.repository.loans.count_active().await?;
        let overdue_loans = self.repository.loans.count_overdue().await?;

        let loans_per_month = self
            .repository
            .loans
            .per_month()
            .await?
            .into_iter()
            .map(|m| MonthlyLoansEntry {
                month: m.month.format("%b %Y").to_string(),
                total: m.total,
            })
            .collect();

        let top_books = self.repository.books.top_borrowed(5).await?;

        Ok(StatsResponse {
            total_books,
            total_readers,
            active_loans,
            overdue_loans,
            loans_per_month,
            top_books,
        })
    }
}
