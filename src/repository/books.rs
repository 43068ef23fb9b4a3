//! Books repository for database operations

use sqlx::{Pool, Postgres, QueryBuilder};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, BookSummary, BookSummaryRow, CreateBook, UpdateBook},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

/// Most-borrowed book entry for statistics
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize, utoipa::ToSchema)]
pub struct TopBook {
    pub title: String,
    pub loan_count: i64,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Check if an ISBN already exists
    pub async fn isbn_exists(&self, isbn: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = if let Some(id) = exclude_id {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1 AND id != $2)")
                .bind(isbn)
                .bind(id)
                .fetch_one(&self.pool)
                .await?
        } else {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1)")
                .bind(isbn)
                .fetch_one(&self.pool)
                .await?
        };
        Ok(exists)
    }

    fn push_filters<'a>(qb: &mut QueryBuilder<'a, Postgres>, query: &'a BookQuery) {
        if let Some(ref q) = query.q {
            qb.push(" AND (b.title ILIKE '%' || ");
            qb.push_bind(q);
            qb.push(" || '%' OR b.isbn ILIKE '%' || ");
            qb.push_bind(q);
            qb.push(" || '%' OR a.first_name ILIKE '%' || ");
            qb.push_bind(q);
            qb.push(" || '%' OR a.last_name ILIKE '%' || ");
            qb.push_bind(q);
            qb.push(" || '%')");
        }
        if let Some(state) = query.state {
            qb.push(" AND b.state = ");
            qb.push_bind(state.as_str());
        }
        if let Some(category_id) = query.category_id {
            qb.push(" AND b.category_id = ");
            qb.push_bind(category_id);
        }
        if let Some(author_id) = query.author_id {
            qb.push(" AND b.author_id = ");
            qb.push_bind(author_id);
        }
    }

    /// Search books with filters and pagination, ordered by title
    pub async fn search(&self, query: &BookQuery) -> AppResult<(Vec<BookSummary>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT b.id, b.title, b.isbn, b.state,
                   a.first_name AS author_first_name, a.last_name AS author_last_name,
                   c.name AS category_name
            FROM books b
            JOIN authors a ON a.id = b.author_id
            LEFT JOIN categories c ON c.id = b.category_id
            WHERE 1 = 1
            "#,
        );
        Self::push_filters(&mut qb, query);
        qb.push(" ORDER BY b.title LIMIT ");
        qb.push_bind(per_page);
        qb.push(" OFFSET ");
        qb.push_bind((page - 1) * per_page);

        let rows = qb
            .build_query_as::<BookSummaryRow>()
            .fetch_all(&self.pool)
            .await?;

        let mut count_qb = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM books b JOIN authors a ON a.id = b.author_id WHERE 1 = 1",
        );
        Self::push_filters(&mut count_qb, query);

        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        Ok((rows.into_iter().map(BookSummary::from).collect(), total))
    }

    /// All books as summaries, for report rendering
    pub async fn list_all_summaries(&self) -> AppResult<Vec<BookSummary>> {
        let rows = sqlx::query_as::<_, BookSummaryRow>(
            r#"
            SELECT b.id, b.title, b.isbn, b.state,
                   a.first_name AS author_first_name, a.last_name AS author_last_name,
                   c.name AS category_name
            FROM books b
            JOIN authors a ON a.id = b.author_id
            LEFT JOIN categories c ON c.id = b.category_id
            ORDER BY b.title
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(BookSummary::from).collect())
    }

    /// Create a new book, initially available
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author_id, category_id, isbn, summary, cover_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(book.author_id)
        .bind(book.category_id)
        .bind(&book.isbn)
        .bind(&book.summary)
        .bind(&book.cover_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(book)
    }

    /// Update a book's catalog fields. Availability state is owned by the
    /// circulation operations and cannot be set here.
    pub async fn update(&self, id: i32, update: &UpdateBook) -> AppResult<Book> {
        let current = self.get_by_id(id).await?;

        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $1, author_id = $2, category_id = $3, isbn = $4, summary = $5, cover_url = $6
            WHERE id = $7
            RETURNING *
            "#,
        )
        .bind(update.title.as_ref().unwrap_or(&current.title))
        .bind(update.author_id.unwrap_or(current.author_id))
        .bind(update.category_id.or(current.category_id))
        .bind(update.isbn.as_ref().unwrap_or(&current.isbn))
        .bind(update.summary.as_ref().or(current.summary.as_ref()))
        .bind(update.cover_url.as_ref().or(current.cover_url.as_ref()))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(book)
    }

    /// Delete a book. Loan and reservation history goes with it by cascade.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }

        Ok(())
    }

    /// Count all books
    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Most-borrowed books, for the dashboard
    pub async fn top_borrowed(&self, limit: i64) -> AppResult<Vec<TopBook>> {
        let top = sqlx::query_as::<_, TopBook>(
            r#"
            SELECT b.title, COUNT(l.id) AS loan_count
            FROM books b
            JOIN loans l ON l.book_id = b.id
            GROUP BY b.id, b.title
            ORDER BY loan_count DESC, b.title
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(top)
    }
}
