//! Authors repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::author::{Author, CreateAuthor, UpdateAuthor},
};

#[derive(Clone)]
pub struct AuthorsRepository {
    pool: Pool<Postgres>,
}

impl AuthorsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get author by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Author> {
        sqlx::query_as::<_, Author>("SELECT * FROM authors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Author with id {} not found", id)))
    }

    /// List authors, optionally filtered by name
    pub async fn list(&self, q: Option<&str>) -> AppResult<Vec<Author>> {
        let authors = if let Some(q) = q {
            sqlx::query_as::<_, Author>(
                r#"
                SELECT * FROM authors
                WHERE first_name ILIKE '%' || $1 || '%' OR last_name ILIKE '%' || $1 || '%'
                ORDER BY last_name, first_name
                "#,
            )
            .bind(q)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, Author>("SELECT * FROM authors ORDER BY last_name, first_name")
                .fetch_all(&self.pool)
                .await?
        };

        Ok(authors)
    }

    /// Create a new author
    pub async fn create(&self, author: &CreateAuthor) -> AppResult<Author> {
        let author = sqlx::query_as::<_, Author>(
            "INSERT INTO authors (first_name, last_name) VALUES ($1, $2) RETURNING *",
        )
        .bind(&author.first_name)
        .bind(&author.last_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(author)
    }

    /// Update an author
    pub async fn update(&self, id: i32, update: &UpdateAuthor) -> AppResult<Author> {
        let current = self.get_by_id(id).await?;

        let author = sqlx::query_as::<_, Author>(
            "UPDATE authors SET first_name = $1, last_name = $2 WHERE id = $3 RETURNING *",
        )
        .bind(update.first_name.as_ref().unwrap_or(&current.first_name))
        .bind(update.last_name.as_ref().unwrap_or(&current.last_name))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(author)
    }

    /// Delete an author. Books referencing it are removed by cascade.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Author with id {} not found", id)));
        }

        Ok(())
    }
}
