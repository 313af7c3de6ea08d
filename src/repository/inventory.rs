//! Borrow transactions against PostgreSQL
//!
//! The book row is locked with `SELECT ... FOR UPDATE`, so concurrent
//! borrows of the same book queue behind each other and each one sees the
//! copy count left by the previous commit.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Transaction};
use uuid::Uuid;

use super::{ledger::BORROW_COLUMNS, Decrement, InventoryStore, InventoryTx};
use crate::{
    error::{AppError, AppResult},
    models::{book::BookRow, Book, Borrow, NewBorrow},
};

#[derive(Clone)]
pub struct InventoryRepository {
    pool: Pool<Postgres>,
}

impl InventoryRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InventoryStore for InventoryRepository {
    async fn begin(&self) -> AppResult<Box<dyn InventoryTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgInventoryTx { tx: Some(tx) }))
    }
}

pub struct PgInventoryTx {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgInventoryTx {
    fn tx(&mut self) -> AppResult<&mut Transaction<'static, Postgres>> {
        self.tx
            .as_mut()
            .ok_or_else(|| AppError::Internal("Borrow transaction already committed".to_string()))
    }
}

#[async_trait]
impl InventoryTx for PgInventoryTx {
    async fn decrement_copies(&mut self, book_id: Uuid, quantity: i32) -> AppResult<Decrement> {
        let tx = self.tx()?;

        let row = sqlx::query_as::<_, BookRow>(
            r#"
            SELECT id, title, author, genre, isbn, description, copies, available, created_at, updated_at
            FROM books
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(book_id)
        .fetch_optional(&mut **tx)
        .await?;

        let Some(row) = row else {
            return Ok(Decrement::Missing);
        };

        let mut book = Book::try_from(row)?;
        if !book.take_copies(quantity) {
            return Ok(Decrement::Insufficient {
                available: book.copies,
            });
        }
        book.updated_at = Utc::now();

        sqlx::query("UPDATE books SET copies = $2, available = $3, updated_at = $4 WHERE id = $1")
            .bind(book.id)
            .bind(book.copies)
            .bind(book.available)
            .bind(book.updated_at)
            .execute(&mut **tx)
            .await?;

        Ok(Decrement::Applied(book))
    }

    async fn append_borrow(&mut self, borrow: NewBorrow) -> AppResult<Borrow> {
        let tx = self.tx()?;
        let record = Borrow::record(borrow, Utc::now());

        let query = format!(
            r#"
            INSERT INTO borrows ({})
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            BORROW_COLUMNS, BORROW_COLUMNS
        );

        let row = sqlx::query_as::<_, Borrow>(&query)
            .bind(record.id)
            .bind(record.book)
            .bind(record.quantity)
            .bind(record.due_date)
            .bind(record.created_at)
            .bind(record.updated_at)
            .fetch_one(&mut **tx)
            .await?;

        Ok(row)
    }

    async fn commit(&mut self) -> AppResult<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| AppError::Internal("Borrow transaction already committed".to_string()))?;
        tx.commit().await?;
        Ok(())
    }
}
