//! Catalog service: books, authors and categories

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{Author, CreateAuthor, UpdateAuthor},
        book::{Book, BookDetails, BookQuery, BookState, BookSummary, CreateBook, UpdateBook},
        category::Category,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    // ------------------------------------------------------------------
    // Books
    // ------------------------------------------------------------------

    /// Search books with filters and pagination
    pub async fn search_books(&self, query: &BookQuery) -> AppResult<(Vec<BookSummary>, i64)> {
        self.repository.books.search(query).await
    }

    /// Get full book details including author and category
    pub async fn get_book_details(&self, id: i32) -> AppResult<BookDetails> {
        let book = self.repository.books.get_by_id(id).await?;
        let author = self.repository.authors.get_by_id(book.author_id).await?;
        let category = match book.category_id {
            Some(category_id) => Some(self.repository.categories.get_by_id(category_id).await?),
            None => None,
        };

        Ok(BookDetails {
            id: book.id,
            title: book.title,
            author,
            category,
            isbn: book.isbn,
            summary: book.summary,
            cover_url: book.cover_url,
            state: book.state,
            can_reserve: book.state != BookState::Available,
        })
    }

    /// Create a new book
    pub async fn create_book(&self, book: CreateBook) -> AppResult<Book> {
        // Referenced records must exist
        self.repository.authors.get_by_id(book.author_id).await?;
        if let Some(category_id) = book.category_id {
            self.repository.categories.get_by_id(category_id).await?;
        }

        if self.repository.books.isbn_exists(&book.isbn, None).await? {
            return Err(AppError::Conflict("ISBN already exists".to_string()));
        }

        self.repository.books.create(&book).await
    }

    /// Update a book
    pub async fn update_book(&self, id: i32, update: UpdateBook) -> AppResult<Book> {
        if let Some(author_id) = update.author_id {
            self.repository.authors.get_by_id(author_id).await?;
        }
        if let Some(category_id) = update.category_id {
            self.repository.categories.get_by_id(category_id).await?;
        }
        if let Some(ref isbn) = update.isbn {
            if self.repository.books.isbn_exists(isbn, Some(id)).await? {
                return Err(AppError::Conflict("ISBN already exists".to_string()));
            }
        }

        self.repository.books.update(id, &update).await
    }

    /// Delete a book
    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await
    }

    // ------------------------------------------------------------------
    // Authors
    // ------------------------------------------------------------------

    pub async fn list_authors(&self, q: Option<&str>) -> AppResult<Vec<Author>> {
        self.repository.authors.list(q).await
    }

    pub async fn create_author(&self, author: CreateAuthor) -> AppResult<Author> {
        self.repository.authors.create(&author).await
    }

    pub async fn update_author(&self, id: i32, update: UpdateAuthor) -> AppResult<Author> {
        self.repository.authors.update(id, &update).await
    }

    /// Delete an author and, by cascade, all of their books
    pub async fn delete_author(&self, id: i32) -> AppResult<()> {
        self.repository.authors.delete(id).await
    }

    // ------------------------------------------------------------------
    // Categories
    // ------------------------------------------------------------------

    pub async fn list_categories(&self, q: Option<&str>) -> AppResult<Vec<Category>> {
        self.repository.categories.list(q).await
    }

    pub async fn create_category(&self, name: &str) -> AppResult<Category> {
        if self.repository.categories.name_exists(name, None).await? {
            return Err(AppError::Conflict("Category name already exists".to_string()));
        }
        self.repository.categories.create(name).await
    }

    pub async fn update_category(&self, id: i32, name: &str) -> AppResult<Category> {
        if self.repository.categories.name_exists(name, Some(id)).await? {
            return Err(AppError::Conflict("Category name already exists".to_string()));
        }
        self.repository.categories.update(id, name).await
    }

    /// Delete a category; books referencing it are left uncategorized
    pub async fn delete_category(&self, id: i32) -> AppResult<()> {
        self.repository.categories.delete(id).await
    }
}
