//! PostgreSQL-backed store tests
//!
//! Run with: DATABASE_URL=postgres://... cargo test -- --ignored

mod common;

use std::sync::Arc;

use shelfy_server::{
    error::AppError,
    repository::Repository,
    services::Services,
};
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};
use uuid::Uuid;

use common::{due_in_days, new_book};

async fn pool() -> Pool<Postgres> {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(&url)
        .await
        .expect("Failed to connect to database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// ISBNs are unique, so every test run uses fresh ones
fn unique_isbn() -> String {
    Uuid::new_v4().simple().to_string()
}

#[tokio::test]
#[ignore]
async fn test_pg_create_and_duplicate_isbn() {
    let repository = Repository::postgres(pool().await);
    let isbn = unique_isbn();

    let book = repository.books.create(new_book(&isbn, 2)).await.unwrap();
    assert!(book.available);

    let err = repository.books.create(new_book(&isbn, 1)).await.unwrap_err();
    assert!(matches!(err, AppError::DuplicateKey { .. }));

    repository.books.delete(book.id).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn test_pg_concurrent_borrows_never_oversell() {
    let repository = Repository::postgres(pool().await);
    let book = repository
        .books
        .create(new_book(&unique_isbn(), 3))
        .await
        .unwrap();
    let services = Arc::new(Services::new(repository.clone()));

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let services = Arc::clone(&services);
            tokio::spawn(async move { services.inventory.borrow(book.id, 1, due_in_days(5)).await })
        })
        .collect();

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(AppError::InsufficientCopies { .. }) => {}
            Err(e) => panic!("unexpected error: {:?}", e),
        }
    }
    assert_eq!(succeeded, 3);

    let stored = repository.books.find_by_id(book.id).await.unwrap().unwrap();
    assert_eq!(stored.copies, 0);
    assert!(!stored.available);

    let rows = services.reports.borrowed_summary().await.unwrap();
    let row = rows.iter().find(|r| r.book.isbn == book.isbn).unwrap();
    assert_eq!(row.total_quantity, 3);
}

#[tokio::test]
#[ignore]
async fn test_pg_update_rederives_availability() {
    let repository = Repository::postgres(pool().await);
    let book = repository
        .books
        .create(new_book(&unique_isbn(), 1))
        .await
        .unwrap();

    let patch = shelfy_server::models::BookPatch {
        copies: Some(0),
        ..Default::default()
    };
    let updated = repository.books.update(book.id, patch).await.unwrap();
    assert_eq!(updated.copies, 0);
    assert!(!updated.available);

    let err = repository
        .books
        .update(Uuid::new_v4(), Default::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
