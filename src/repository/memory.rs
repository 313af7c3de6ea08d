//! In-memory store with the same semantics as the PostgreSQL backend
//!
//! Readers take a short shared guard. A borrow transaction holds the
//! exclusive guard from `begin` until commit or drop, so check-and-decrement
//! never interleaves with another writer.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};
use uuid::Uuid;

use super::{BookStore, BorrowLedger, Decrement, InventoryStore, InventoryTx};
use crate::{
    error::{AppError, AppResult},
    models::{Book, BookListQuery, BookPatch, Borrow, NewBook, NewBorrow},
};

#[derive(Debug, Default)]
struct MemoryState {
    books: IndexMap<Uuid, Book>,
    borrows: Vec<Borrow>,
}

impl MemoryState {
    fn ensure_isbn_free(&self, isbn: &str, except: Option<Uuid>) -> AppResult<()> {
        let taken = self
            .books
            .values()
            .any(|b| b.isbn == isbn && Some(b.id) != except);
        if taken {
            return Err(AppError::DuplicateKey {
                field: "isbn".to_string(),
                value: isbn.to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Book>> {
        Ok(self.state.read().await.books.get(&id).cloned())
    }

    async fn find_many(&self, ids: Vec<Uuid>) -> AppResult<Vec<Book>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.books.get(id).cloned())
            .collect())
    }

    async fn create(&self, new: NewBook) -> AppResult<Book> {
        let mut state = self.state.write().await;
        state.ensure_isbn_free(&new.isbn, None)?;

        let book = Book::from_new(Uuid::new_v4(), new, Utc::now());
        state.books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn update(&self, id: Uuid, patch: BookPatch) -> AppResult<Book> {
        let mut state = self.state.write().await;

        let mut book = state
            .books
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;
        book.apply_patch(patch, Utc::now());
        state.ensure_isbn_free(&book.isbn, Some(id))?;

        state.books.insert(id, book.clone());
        Ok(book)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut state = self.state.write().await;
        state
            .books
            .shift_remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    async fn list(&self, query: BookListQuery) -> AppResult<(Vec<Book>, i64)> {
        let state = self.state.read().await;

        let mut matching: Vec<&Book> = state.books.values().filter(|b| query.matches(b)).collect();
        // Stable sort: ties keep insertion order
        matching.sort_by(|a, b| query.compare(a, b));

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(usize::try_from(query.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(query.limit).unwrap_or(0))
            .cloned()
            .collect();

        Ok((page, total))
    }
}

#[async_trait]
impl BorrowLedger for MemoryStore {
    async fn all(&self) -> AppResult<Vec<Borrow>> {
        Ok(self.state.read().await.borrows.clone())
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn InventoryTx>> {
        let guard = Arc::clone(&self.state).write_owned().await;
        Ok(Box::new(MemoryTx {
            guard: Some(guard),
            staged_books: IndexMap::new(),
            staged_borrows: Vec::new(),
        }))
    }
}

/// Stages writes next to the exclusive guard; `commit` applies them in one go.
pub struct MemoryTx {
    guard: Option<OwnedRwLockWriteGuard<MemoryState>>,
    staged_books: IndexMap<Uuid, Book>,
    staged_borrows: Vec<Borrow>,
}

fn closed() -> AppError {
    AppError::Internal("Borrow transaction already committed".to_string())
}

#[async_trait]
impl InventoryTx for MemoryTx {
    async fn decrement_copies(&mut self, book_id: Uuid, quantity: i32) -> AppResult<Decrement> {
        let state = self.guard.as_ref().ok_or_else(closed)?;

        let current = self
            .staged_books
            .get(&book_id)
            .or_else(|| state.books.get(&book_id))
            .cloned();
        let Some(mut book) = current else {
            return Ok(Decrement::Missing);
        };

        if !book.take_copies(quantity) {
            return Ok(Decrement::Insufficient {
                available: book.copies,
            });
        }
        book.updated_at = Utc::now();

        self.staged_books.insert(book_id, book.clone());
        Ok(Decrement::Applied(book))
    }

    async fn append_borrow(&mut self, borrow: NewBorrow) -> AppResult<Borrow> {
        if self.guard.is_none() {
            return Err(closed());
        }
        let record = Borrow::record(borrow, Utc::now());
        self.staged_borrows.push(record.clone());
        Ok(record)
    }

    async fn commit(&mut self) -> AppResult<()> {
        let mut guard = self.guard.take().ok_or_else(closed)?;
        for (id, book) in self.staged_books.drain(..) {
            guard.books.insert(id, book);
        }
        guard.borrows.append(&mut self.staged_borrows);
        Ok(())
    }
}
