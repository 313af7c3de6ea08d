//! Books repository for database operations

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::BookStore;
use crate::{
    error::{AppError, AppResult},
    models::{book::BookRow, Book, BookListQuery, BookPatch, NewBook},
};

const BOOK_COLUMNS: &str =
    "id, title, author, genre, isbn, description, copies, available, created_at, updated_at";

/// Map a unique violation on `isbn` to `DuplicateKey`, anything else to a database error
pub(crate) fn map_isbn_conflict(err: sqlx::Error, isbn: &str) -> AppError {
    if let sqlx::Error::Database(ref db) = err {
        if db.is_unique_violation() {
            return AppError::DuplicateKey {
                field: "isbn".to_string(),
                value: isbn.to_string(),
            };
        }
    }
    AppError::Database(err)
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for BooksRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Book>> {
        let query = format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS);
        sqlx::query_as::<_, BookRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Book::try_from)
            .transpose()
    }

    async fn find_many(&self, ids: Vec<Uuid>) -> AppResult<Vec<Book>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!("SELECT {} FROM books WHERE id = ANY($1)", BOOK_COLUMNS);
        sqlx::query_as::<_, BookRow>(&query)
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Book::try_from)
            .collect()
    }

    async fn create(&self, new: NewBook) -> AppResult<Book> {
        let book = Book::from_new(Uuid::new_v4(), new, Utc::now());

        let query = format!(
            r#"
            INSERT INTO books ({})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            BOOK_COLUMNS, BOOK_COLUMNS
        );

        let row = sqlx::query_as::<_, BookRow>(&query)
            .bind(book.id)
            .bind(&book.title)
            .bind(&book.author)
            .bind(book.genre.as_str())
            .bind(&book.isbn)
            .bind(&book.description)
            .bind(book.copies)
            .bind(book.available)
            .bind(book.created_at)
            .bind(book.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_isbn_conflict(e, &book.isbn))?;

        row.try_into()
    }

    async fn update(&self, id: Uuid, patch: BookPatch) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let select = format!("SELECT {} FROM books WHERE id = $1 FOR UPDATE", BOOK_COLUMNS);
        let mut book: Book = sqlx::query_as::<_, BookRow>(&select)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?
            .try_into()?;

        book.apply_patch(patch, Utc::now());

        let update = format!(
            r#"
            UPDATE books SET
                title = $2,
                author = $3,
                genre = $4,
                isbn = $5,
                description = $6,
                copies = $7,
                available = $8,
                updated_at = $9
            WHERE id = $1
            RETURNING {}
            "#,
            BOOK_COLUMNS
        );

        let row = sqlx::query_as::<_, BookRow>(&update)
            .bind(book.id)
            .bind(&book.title)
            .bind(&book.author)
            .bind(book.genre.as_str())
            .bind(&book.isbn)
            .bind(&book.description)
            .bind(book.copies)
            .bind(book.available)
            .bind(book.updated_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_isbn_conflict(e, &book.isbn))?;

        tx.commit().await?;
        row.try_into()
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }

    async fn list(&self, query: BookListQuery) -> AppResult<(Vec<Book>, i64)> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM books WHERE ($1::text IS NULL OR genre = $1)",
        )
        .bind(&query.genre)
        .fetch_one(&self.pool)
        .await?;

        // Column and direction come from closed enums, never from raw input
        let select = format!(
            r#"
            SELECT {}
            FROM books
            WHERE ($1::text IS NULL OR genre = $1)
            ORDER BY {} {}, id
            LIMIT $2 OFFSET $3
            "#,
            BOOK_COLUMNS,
            query.sort_by.column(),
            query.order.as_sql()
        );

        let books = sqlx::query_as::<_, BookRow>(&select)
            .bind(&query.genre)
            .bind(query.limit)
            .bind(query.offset())
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Book::try_from)
            .collect::<AppResult<Vec<_>>>()?;

        Ok((books, total))
    }
}
