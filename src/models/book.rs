//! Book (catalog entry) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::enums::{Genre, SortField, SortOrder};
use crate::error::AppError;

/// Availability is derived from the copy count and never stored independently.
pub fn is_available(copies: i32) -> bool {
    copies > 0
}

/// Full book model (store + API)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub genre: Genre,
    pub isbn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Copies currently in the catalog's possession
    pub copies: i32,
    /// Always `copies > 0`
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Build a fresh record from creation input
    pub fn from_new(id: Uuid, new: NewBook, now: DateTime<Utc>) -> Self {
        let mut book = Self {
            id,
            title: new.title,
            author: new.author,
            genre: new.genre,
            isbn: new.isbn,
            description: new.description,
            copies: new.copies,
            available: false,
            created_at: now,
            updated_at: now,
        };
        book.enforce_availability();
        book
    }

    /// Re-derive `available` from `copies`. Every write path calls this.
    pub fn enforce_availability(&mut self) {
        self.available = is_available(self.copies);
    }

    /// Remove `quantity` copies from circulation.
    ///
    /// Returns `false` and leaves the book untouched when fewer than
    /// `quantity` copies are held.
    pub fn take_copies(&mut self, quantity: i32) -> bool {
        if quantity <= 0 || self.copies < quantity {
            return false;
        }
        self.copies -= quantity;
        self.enforce_availability();
        true
    }

    /// Apply a partial update and re-derive availability
    pub fn apply_patch(&mut self, patch: BookPatch, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(author) = patch.author {
            self.author = author;
        }
        if let Some(genre) = patch.genre {
            self.genre = genre;
        }
        if let Some(isbn) = patch.isbn {
            self.isbn = isbn;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(copies) = patch.copies {
            self.copies = copies;
        }
        self.enforce_availability();
        self.updated_at = now;
    }
}

/// Row shape of the `books` table
#[derive(Debug, Clone, FromRow)]
pub struct BookRow {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub isbn: String,
    pub description: Option<String>,
    pub copies: i32,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<BookRow> for Book {
    type Error = AppError;

    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        let genre = row.genre.parse::<Genre>().map_err(AppError::Internal)?;
        Ok(Self {
            id: row.id,
            title: row.title,
            author: row.author,
            genre,
            isbn: row.isbn,
            description: row.description,
            copies: row.copies,
            available: row.available,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Validated input for creating a book
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub genre: Genre,
    pub isbn: String,
    pub description: Option<String>,
    pub copies: i32,
}

/// Validated partial update; `None` leaves the field unchanged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<Genre>,
    pub isbn: Option<String>,
    /// `Some(None)` clears the description
    pub description: Option<Option<String>>,
    pub copies: Option<i32>,
}

/// Tells an explicit `null` (`Some(None)`) apart from an absent field (`None`)
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("not_blank");
        err.message = Some("Must not be empty".into());
        return Err(err);
    }
    Ok(())
}

fn trimmed(value: String) -> String {
    value.trim().to_string()
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(custom(function = "not_blank"))]
    pub title: String,
    #[validate(custom(function = "not_blank"))]
    pub author: String,
    pub genre: Genre,
    #[validate(custom(function = "not_blank"))]
    pub isbn: String,
    pub description: Option<String>,
    #[validate(range(min = 0, message = "Copies must be a non-negative number"))]
    pub copies: i32,
    /// Accepted for compatibility; availability is always derived from `copies`
    pub available: Option<bool>,
}

impl From<CreateBook> for NewBook {
    fn from(req: CreateBook) -> Self {
        Self {
            title: trimmed(req.title),
            author: trimmed(req.author),
            genre: req.genre,
            isbn: trimmed(req.isbn),
            description: req.description.map(trimmed),
            copies: req.copies,
        }
    }
}

/// Update book request (every field optional)
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(custom(function = "not_blank"))]
    pub title: Option<String>,
    #[validate(custom(function = "not_blank"))]
    pub author: Option<String>,
    pub genre: Option<Genre>,
    #[validate(custom(function = "not_blank"))]
    pub isbn: Option<String>,
    /// Omit to keep, `null` to clear
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[validate(range(min = 0, message = "Copies must be a non-negative number"))]
    pub copies: Option<i32>,
    /// Accepted for compatibility; availability is always derived from `copies`
    pub available: Option<bool>,
}

impl From<UpdateBook> for BookPatch {
    fn from(req: UpdateBook) -> Self {
        Self {
            title: req.title.map(trimmed),
            author: req.author.map(trimmed),
            genre: req.genre,
            isbn: req.isbn.map(trimmed),
            description: req.description.map(|d| d.map(trimmed)),
            copies: req.copies,
        }
    }
}

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;

/// Book list query parameters (API). All values arrive as raw strings and
/// fall back to defaults when missing or unusable.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct BookListParams {
    /// Genre to match exactly; empty means no filter
    pub filter: Option<String>,
    /// `asc` (default), `desc` or `-1`
    pub sort: Option<String>,
    /// Field to sort by (default `createdAt`)
    pub sort_by: Option<String>,
    /// Page number (default 1)
    pub page: Option<String>,
    /// Page size (default 10)
    pub limit: Option<String>,
}

fn positive_or(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

impl BookListParams {
    pub fn into_query(self) -> BookListQuery {
        let genre = self
            .filter
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty());

        BookListQuery {
            genre,
            sort_by: SortField::parse(self.sort_by.as_deref()),
            order: SortOrder::parse(self.sort.as_deref()),
            page: positive_or(self.page.as_deref(), DEFAULT_PAGE),
            limit: positive_or(self.limit.as_deref(), DEFAULT_LIMIT),
        }
    }
}

/// Normalized catalog listing request handed to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookListQuery {
    /// Raw genre name; a value that is not a genre matches nothing
    pub genre: Option<String>,
    pub sort_by: SortField,
    pub order: SortOrder,
    pub page: i64,
    pub limit: i64,
}

impl Default for BookListQuery {
    fn default() -> Self {
        Self {
            genre: None,
            sort_by: SortField::default(),
            order: SortOrder::default(),
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl BookListQuery {
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn matches(&self, book: &Book) -> bool {
        self.genre
            .as_deref()
            .map_or(true, |genre| book.genre.as_str() == genre)
    }

    /// In-process ordering equivalent to the SQL `ORDER BY`
    pub fn compare(&self, a: &Book, b: &Book) -> std::cmp::Ordering {
        let ordering = match self.sort_by {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortField::Title => a.title.cmp(&b.title),
            SortField::Author => a.author.cmp(&b.author),
            SortField::Genre => a.genre.as_str().cmp(b.genre.as_str()),
            SortField::Isbn => a.isbn.cmp(&b.isbn),
            SortField::Copies => a.copies.cmp(&b.copies),
            SortField::Available => a.available.cmp(&b.available),
        };
        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// Pagination block of the list envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(total: i64, page: i64, limit: i64) -> Self {
        // Ceiling division without `total + limit - 1`, which overflows for huge limits
        let total_pages = if limit > 0 {
            total / limit + i64::from(total % limit != 0)
        } else {
            0
        };
        Self {
            total,
            page,
            limit,
            total_pages,
        }
    }
}
