//! Inventory service: the borrow transaction

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Borrowed, NewBorrow},
    repository::{Decrement, InventoryStore},
};

#[derive(Clone)]
pub struct InventoryService {
    store: Arc<dyn InventoryStore>,
}

impl InventoryService {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    /// Borrow `quantity` copies of a book.
    ///
    /// The copy check, the decrement and the ledger append run in one store
    /// transaction: either the book loses `quantity` copies and the ledger
    /// gains one entry, or nothing changes. `due_date` is stored as given.
    ///
    /// # Errors
    ///
    /// - `NotFound` when the book does not exist
    /// - `InsufficientCopies` when fewer than `quantity` copies are held
    /// - `Validation` when `quantity` is not positive
    pub async fn borrow(
        &self,
        book_id: Uuid,
        quantity: i32,
        due_date: DateTime<Utc>,
    ) -> AppResult<Borrowed> {
        if quantity <= 0 {
            return Err(AppError::invalid("quantity", "Quantity must be a positive integer"));
        }

        let mut tx = self.store.begin().await?;

        let book = match tx.decrement_copies(book_id, quantity).await? {
            Decrement::Applied(book) => book,
            Decrement::Missing => {
                return Err(AppError::NotFound(format!("Book with id {} not found", book_id)))
            }
            Decrement::Insufficient { available } => {
                return Err(AppError::InsufficientCopies {
                    requested: quantity,
                    available,
                })
            }
        };

        let borrow = tx
            .append_borrow(NewBorrow {
                book: book_id,
                quantity,
                due_date,
            })
            .await?;

        tx.commit().await?;

        tracing::info!(
            book_id = %book_id,
            quantity,
            copies_left = book.copies,
            "book borrowed"
        );

        Ok(Borrowed { book, borrow })
    }
}
