//! Repository layer: store contracts and their PostgreSQL / in-memory backends

pub mod books;
pub mod inventory;
pub mod ledger;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Book, BookListQuery, BookPatch, Borrow, NewBook, NewBorrow},
};

/// Persistent keyed store of book records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Book>>;

    /// Fetch every existing book among `ids`; missing ids are skipped
    async fn find_many(&self, ids: Vec<Uuid>) -> AppResult<Vec<Book>>;

    /// Fails with `DuplicateKey` when the ISBN is already catalogued
    async fn create(&self, book: NewBook) -> AppResult<Book>;

    /// Fails with `NotFound` when absent, `DuplicateKey` on ISBN collision
    async fn update(&self, id: Uuid, patch: BookPatch) -> AppResult<Book>;

    /// Fails with `NotFound` when absent
    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// One page of books plus the total count matching the filter
    async fn list(&self, query: BookListQuery) -> AppResult<(Vec<Book>, i64)>;
}

/// Read side of the append-only borrow ledger. Appends only happen inside
/// an [`InventoryTx`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BorrowLedger: Send + Sync {
    /// All ledger entries in insertion order
    async fn all(&self) -> AppResult<Vec<Borrow>>;
}

/// Result of an atomic check-and-decrement
#[derive(Debug, Clone, PartialEq)]
pub enum Decrement {
    /// Copies were taken; carries the book as it will be persisted
    Applied(Book),
    /// No book with that id
    Missing,
    /// Not enough copies; nothing was changed
    Insufficient { available: i32 },
}

/// Opens borrow transactions spanning the book row and the ledger
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn begin(&self) -> AppResult<Box<dyn InventoryTx>>;
}

/// A borrow transaction. Nothing staged here is visible to readers until
/// [`InventoryTx::commit`]; dropping the transaction rolls everything back.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InventoryTx: Send {
    /// Check `copies >= quantity` and subtract, as one indivisible step
    async fn decrement_copies(&mut self, book_id: Uuid, quantity: i32) -> AppResult<Decrement>;

    async fn append_borrow(&mut self, borrow: NewBorrow) -> AppResult<Borrow>;

    async fn commit(&mut self) -> AppResult<()>;
}

/// Main repository struct holding the store collaborators
#[derive(Clone)]
pub struct Repository {
    pub books: Arc<dyn BookStore>,
    pub borrows: Arc<dyn BorrowLedger>,
    pub inventory: Arc<dyn InventoryStore>,
}

impl Repository {
    /// Create a repository backed by the given database pool
    pub fn postgres(pool: Pool<Postgres>) -> Self {
        Self {
            books: Arc::new(books::BooksRepository::new(pool.clone())),
            borrows: Arc::new(ledger::LedgerRepository::new(pool.clone())),
            inventory: Arc::new(inventory::InventoryRepository::new(pool)),
        }
    }

    /// Create a repository whose collaborators all share one in-memory store
    pub fn in_memory() -> Self {
        Self::from_memory(memory::MemoryStore::new())
    }

    pub fn from_memory(store: memory::MemoryStore) -> Self {
        Self {
            books: Arc::new(store.clone()),
            borrows: Arc::new(store.clone()),
            inventory: Arc::new(store),
        }
    }
}
