//! Borrow ledger repository (read side)

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::BorrowLedger;
use crate::{error::AppResult, models::Borrow};

pub(crate) const BORROW_COLUMNS: &str = "id, book_id, quantity, due_date, created_at, updated_at";

#[derive(Clone)]
pub struct LedgerRepository {
    pool: Pool<Postgres>,
}

impl LedgerRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BorrowLedger for LedgerRepository {
    async fn all(&self) -> AppResult<Vec<Borrow>> {
        let query = format!("SELECT {} FROM borrows ORDER BY created_at, id", BORROW_COLUMNS);
        let rows = sqlx::query_as::<_, Borrow>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
