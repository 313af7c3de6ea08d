//! Catalog management service

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{CreateBook, UpdateBook},
        Book, BookListQuery,
    },
    repository::BookStore,
};

#[derive(Clone)]
pub struct CatalogService {
    books: Arc<dyn BookStore>,
}

impl CatalogService {
    pub fn new(books: Arc<dyn BookStore>) -> Self {
        Self { books }
    }

    /// List books with filter, sort and pagination
    pub async fn list_books(&self, query: BookListQuery) -> AppResult<(Vec<Book>, i64)> {
        self.books.list(query).await
    }

    /// Get a book by ID
    pub async fn get_book(&self, id: Uuid) -> AppResult<Book> {
        self.books
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Create a new book
    pub async fn create_book(&self, request: CreateBook) -> AppResult<Book> {
        let book = self.books.create(request.into()).await?;
        tracing::info!(book_id = %book.id, isbn = %book.isbn, copies = book.copies, "book created");
        Ok(book)
    }

    /// Update a book; a change of `copies` re-derives availability
    pub async fn update_book(&self, id: Uuid, request: UpdateBook) -> AppResult<Book> {
        let book = self.books.update(id, request.into()).await?;
        tracing::debug!(book_id = %book.id, copies = book.copies, available = book.available, "book updated");
        Ok(book)
    }

    /// Delete a book. Ledger entries referencing it are kept.
    pub async fn delete_book(&self, id: Uuid) -> AppResult<()> {
        self.books.delete(id).await?;
        tracing::info!(book_id = %id, "book deleted");
        Ok(())
    }
}
