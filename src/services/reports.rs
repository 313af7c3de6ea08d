//! Borrowed-books summary

use std::{collections::HashMap, sync::Arc};

use indexmap::IndexMap;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{borrow::BookRef, Book, Borrow, BorrowedSummary},
    repository::{BookStore, BorrowLedger},
};

#[derive(Clone)]
pub struct ReportAggregator {
    books: Arc<dyn BookStore>,
    ledger: Arc<dyn BorrowLedger>,
}

impl ReportAggregator {
    pub fn new(books: Arc<dyn BookStore>, ledger: Arc<dyn BorrowLedger>) -> Self {
        Self { books, ledger }
    }

    /// Total borrowed quantity per book, with the book's title and ISBN.
    ///
    /// Rows come out in the order their book first appears in the ledger.
    /// Books deleted since they were borrowed are left out.
    pub async fn borrowed_summary(&self) -> AppResult<Vec<BorrowedSummary>> {
        let borrows = self.ledger.all().await?;
        let totals = group_totals(&borrows);

        let books = self.books.find_many(totals.keys().copied().collect()).await?;

        Ok(project(totals, books))
    }
}

/// Sum quantities per book id, keeping first-seen order
pub fn group_totals(borrows: &[Borrow]) -> IndexMap<Uuid, i64> {
    let mut totals: IndexMap<Uuid, i64> = IndexMap::new();
    for borrow in borrows {
        *totals.entry(borrow.book).or_insert(0) += i64::from(borrow.quantity);
    }
    totals
}

/// Join totals with resolved books; totals without a book produce no row
pub fn project(totals: IndexMap<Uuid, i64>, books: Vec<Book>) -> Vec<BorrowedSummary> {
    let mut by_id: HashMap<Uuid, Book> = books.into_iter().map(|b| (b.id, b)).collect();

    totals
        .into_iter()
        .filter_map(|(id, total_quantity)| {
            by_id.remove(&id).map(|book| BorrowedSummary {
                book: BookRef {
                    title: book.title,
                    isbn: book.isbn,
                },
                total_quantity,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Genre, NewBook, NewBorrow};
    use crate::repository::{MockBookStore, MockBorrowLedger};
    use chrono::{Duration, Utc};

    fn book(title: &str, isbn: &str) -> Book {
        Book::from_new(
            Uuid::new_v4(),
            NewBook {
                title: title.to_string(),
                author: "Someone".to_string(),
                genre: Genre::History,
                isbn: isbn.to_string(),
                description: None,
                copies: 10,
            },
            Utc::now(),
        )
    }

    fn borrow(book: Uuid, quantity: i32) -> Borrow {
        Borrow::record(
            NewBorrow {
                book,
                quantity,
                due_date: Utc::now() + Duration::days(3),
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_group_totals_keeps_discovery_order() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let totals = group_totals(&[borrow(b, 1), borrow(a, 2), borrow(b, 3)]);

        assert_eq!(totals.into_iter().collect::<Vec<_>>(), vec![(b, 4), (a, 2)]);
    }

    #[test]
    fn test_project_drops_missing_books() {
        let kept = book("SPQR", "9781631492228");
        let mut totals = IndexMap::new();
        totals.insert(Uuid::new_v4(), 5);
        totals.insert(kept.id, 2);

        let rows = project(totals, vec![kept]);
        assert_eq!(
            rows,
            vec![BorrowedSummary {
                book: BookRef {
                    title: "SPQR".to_string(),
                    isbn: "9781631492228".to_string(),
                },
                total_quantity: 2,
            }]
        );
    }

    #[tokio::test]
    async fn test_summary_joins_ledger_with_catalog() {
        let spqr = book("SPQR", "9781631492228");
        let gone = Uuid::new_v4();
        let ledger_rows = vec![borrow(spqr.id, 1), borrow(gone, 4), borrow(spqr.id, 1)];
        let spqr_id = spqr.id;

        let mut ledger = MockBorrowLedger::new();
        ledger
            .expect_all()
            .times(1)
            .return_once(move || Ok(ledger_rows));

        let mut books = MockBookStore::new();
        books
            .expect_find_many()
            .withf(move |ids| ids == &vec![spqr_id, gone])
            .times(1)
            .return_once(move |_| Ok(vec![spqr]));

        let rows = ReportAggregator::new(Arc::new(books), Arc::new(ledger))
            .borrowed_summary()
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].book.title, "SPQR");
        assert_eq!(rows[0].total_quantity, 2);
    }

    #[tokio::test]
    async fn test_empty_ledger_yields_empty_summary() {
        let mut ledger = MockBorrowLedger::new();
        ledger.expect_all().returning(|| Ok(Vec::new()));

        let mut books = MockBookStore::new();
        books
            .expect_find_many()
            .returning(|_| Ok(Vec::new()));

        let rows = ReportAggregator::new(Arc::new(books), Arc::new(ledger))
            .borrowed_summary()
            .await
            .unwrap();
        assert!(rows.is_empty());
    }
}
