//! Book (catalog entry) model and related types

use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::author::Author;
use super::category::Category;

/// Availability state of a book.
///
/// `Overdue` is part of the stored domain but no circulation operation ever
/// assigns it; overdue is tracked per loan (see [`crate::models::Loan`]) and
/// the book stays `Loaned` until returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookState {
    Available,
    Loaned,
    Overdue,
}

impl BookState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookState::Available => "available",
            BookState::Loaned => "loaned",
            BookState::Overdue => "overdue",
        }
    }
}

impl std::fmt::Display for BookState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BookState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "available" => Ok(BookState::Available),
            "loaned" => Ok(BookState::Loaned),
            "overdue" => Ok(BookState::Overdue),
            _ => Err(format!("Invalid book state: {}", s)),
        }
    }
}

// SQLx conversion: states are stored as plain text
impl sqlx::Type<Postgres> for BookState {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for BookState {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for BookState {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author_id: i32,
    pub category_id: Option<i32>,
    pub isbn: String,
    pub summary: Option<String>,
    pub cover_url: Option<String>,
    pub state: BookState,
}

/// Internal row for list queries joining author and category names
#[derive(Debug, Clone, FromRow)]
pub struct BookSummaryRow {
    pub id: i32,
    pub title: String,
    pub isbn: String,
    pub state: BookState,
    pub author_first_name: String,
    pub author_last_name: String,
    pub category_name: Option<String>,
}

/// Short book representation for lists and reports
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookSummary {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub category: Option<String>,
    pub isbn: String,
    pub state: BookState,
}

impl From<BookSummaryRow> for BookSummary {
    fn from(row: BookSummaryRow) -> Self {
        BookSummary {
            id: row.id,
            title: row.title,
            author: format!("{} {}", row.author_first_name, row.author_last_name),
            category: row.category_name,
            isbn: row.isbn,
            state: row.state,
        }
    }
}

/// Full book details with related records
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetails {
    pub id: i32,
    pub title: String,
    pub author: Author,
    pub category: Option<Category>,
    pub isbn: String,
    pub summary: Option<String>,
    pub cover_url: Option<String>,
    pub state: BookState,
    /// Reservations only make sense while the book cannot be borrowed
    pub can_reserve: bool,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: String,
    pub author_id: i32,
    pub category_id: Option<i32>,
    #[validate(length(equal = 13, message = "ISBN must be 13 characters"))]
    pub isbn: String,
    pub summary: Option<String>,
    pub cover_url: Option<String>,
}

/// Update book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    pub title: Option<String>,
    pub author_id: Option<i32>,
    pub category_id: Option<i32>,
    #[validate(length(equal = 13, message = "ISBN must be 13 characters"))]
    pub isbn: Option<String>,
    pub summary: Option<String>,
    pub cover_url: Option<String>,
}

/// Book list query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Matches title, ISBN or author name
    pub q: Option<String>,
    pub state: Option<BookState>,
    pub category_id: Option<i32>,
    pub author_id: Option<i32>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_round_trips_through_text() {
        assert_eq!("loaned".parse::<BookState>().unwrap(), BookState::Loaned);
        assert_eq!(BookState::Overdue.as_str(), "overdue");
        assert!("lost".parse::<BookState>().is_err());
    }

    #[test]
    fn summary_joins_author_name() {
        let summary: BookSummary = BookSummaryRow {
            id: 1,
            title: "Cien años de soledad".to_string(),
            isbn: "9780307474728".to_string(),
            state: BookState::Available,
            author_first_name: "Gabriel".to_string(),
            author_last_name: "García Márquez".to_string(),
            category_name: None,
        }
        .into();
        assert_eq!(summary.author, "Gabriel García Márquez");
        assert!(summary.category.is_none());
    }
}
