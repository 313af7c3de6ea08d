//! Shared helpers for integration tests

#![allow(dead_code)]

use chrono::{Duration, Utc};
use shelfy_server::{
    api,
    config::{AppConfig, StorageBackend},
    models::{Genre, NewBook},
    repository::Repository,
    AppState,
};

pub fn memory_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.storage.backend = StorageBackend::Memory;
    config
}

/// Serve the full router on an ephemeral port; returns the base URL
pub async fn spawn_app(repository: Repository) -> String {
    let app = api::router(AppState::new(memory_config(), repository));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local address");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server failed");
    });

    format!("http://{}", addr)
}

pub fn new_book(isbn: &str, copies: i32) -> NewBook {
    NewBook {
        title: format!("Title {}", isbn),
        author: "Test Author".to_string(),
        genre: Genre::Science,
        isbn: isbn.to_string(),
        description: None,
        copies,
    }
}

pub fn due_in_days(days: i64) -> chrono::DateTime<Utc> {
    Utc::now() + Duration::days(days)
}
