//! Borrow (ledger entry) model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::book::Book;

/// Borrow record. Append-only: never updated or deleted once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Borrow {
    pub id: Uuid,
    /// Borrowed book id (not enforced by a foreign key)
    #[sqlx(rename = "book_id")]
    pub book: Uuid,
    pub quantity: i32,
    pub due_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Borrow {
    pub fn record(new: NewBorrow, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            book: new.book,
            quantity: new.quantity,
            due_date: new.due_date,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Ledger entry to append as part of a borrow transaction
#[derive(Debug, Clone, PartialEq)]
pub struct NewBorrow {
    pub book: Uuid,
    pub quantity: i32,
    pub due_date: DateTime<Utc>,
}

/// Outcome of a successful borrow transaction
#[derive(Debug, Clone)]
pub struct Borrowed {
    /// Book after the decrement
    pub book: Book,
    /// Ledger entry written in the same transaction
    pub borrow: Borrow,
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC).
fn deserialize_due_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_due_date(&raw).ok_or_else(|| serde::de::Error::custom("Invalid date format"))
}

pub fn parse_due_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn in_future(value: &DateTime<Utc>) -> Result<(), ValidationError> {
    if *value <= Utc::now() {
        let mut err = ValidationError::new("in_future");
        err.message = Some("Due date must be in the future".into());
        return Err(err);
    }
    Ok(())
}

/// Create borrow request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBorrow {
    /// Id of the book to borrow
    pub book: Uuid,
    #[validate(range(min = 1, message = "Quantity must be a positive integer"))]
    pub quantity: i32,
    #[serde(deserialize_with = "deserialize_due_date")]
    #[validate(custom(function = "in_future"))]
    pub due_date: DateTime<Utc>,
}

/// Book reference projected into a summary row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BookRef {
    pub title: String,
    pub isbn: String,
}

/// One row of the borrowed-books summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BorrowedSummary {
    pub book: BookRef,
    pub total_quantity: i64,
}
