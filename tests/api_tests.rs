//! API integration tests against a router served on an ephemeral port

mod common;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use shelfy_server::repository::Repository;

use common::spawn_app;

async fn create_book(client: &Client, base: &str, body: Value) -> Value {
    let response = client
        .post(format!("{}/api/books", base))
        .json(&body)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.expect("Failed to parse response")
}

fn dune() -> Value {
    json!({
        "title": "Dune",
        "author": "Frank Herbert",
        "genre": "FICTION",
        "isbn": "9780441172719",
        "copies": 3
    })
}

#[tokio::test]
async fn test_root_and_health() {
    let base = spawn_app(Repository::in_memory()).await;
    let client = Client::new();

    let response = client.get(&base).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "Server connected successfully");

    let body: Value = client
        .get(format!("{}/api/health", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_unknown_route() {
    let base = spawn_app(Repository::in_memory()).await;

    let response = Client::new()
        .get(format!("{}/api/nowhere", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Route not found");
}

#[tokio::test]
async fn test_create_and_get_book() {
    let base = spawn_app(Repository::in_memory()).await;
    let client = Client::new();

    let mut request = dune();
    request["available"] = json!(false);
    let body = create_book(&client, &base, request).await;

    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Book created successfully");
    assert_eq!(body["data"]["copies"], 3);
    // Client-supplied availability is ignored
    assert_eq!(body["data"]["available"], true);

    let id = body["data"]["id"].as_str().unwrap();
    let body: Value = client
        .get(format!("{}/api/books/{}", base, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["message"], "Book retrieved successfully");
    assert_eq!(body["data"]["isbn"], "9780441172719");
    assert!(body["data"]["createdAt"].is_string());
}

#[tokio::test]
async fn test_create_book_validation() {
    let base = spawn_app(Repository::in_memory()).await;

    let response = Client::new()
        .post(format!("{}/api/books", base))
        .json(&json!({
            "title": "  ",
            "author": "Nobody",
            "genre": "FICTION",
            "isbn": "1",
            "copies": -1
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(body["error"]["name"], "ValidationError");
    let fields: Vec<&str> = body["error"]["issues"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["copies", "title"]);
}

#[tokio::test]
async fn test_duplicate_isbn() {
    let base = spawn_app(Repository::in_memory()).await;
    let client = Client::new();
    create_book(&client, &base, dune()).await;

    let response = client
        .post(format!("{}/api/books", base))
        .json(&dune())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Duplicate key error");
    assert_eq!(body["error"]["field"], "isbn");
}

#[tokio::test]
async fn test_missing_and_malformed_book_ids() {
    let base = spawn_app(Repository::in_memory()).await;
    let client = Client::new();

    let response = client
        .get(format!("{}/api/books/{}", base, uuid::Uuid::new_v4()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Book not found");

    let response = client
        .delete(format!("{}/api/books/not-an-id", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_books_filter_sort_paginate() {
    let base = spawn_app(Repository::in_memory()).await;
    let client = Client::new();

    for (isbn, genre, copies) in [
        ("111", "SCIENCE", 4),
        ("222", "FICTION", 1),
        ("333", "SCIENCE", 9),
        ("444", "SCIENCE", 2),
    ] {
        create_book(
            &client,
            &base,
            json!({
                "title": format!("Book {}", isbn),
                "author": "Author",
                "genre": genre,
                "isbn": isbn,
                "copies": copies
            }),
        )
        .await;
    }

    let body: Value = client
        .get(format!(
            "{}/api/books?filter=SCIENCE&sortBy=copies&sort=desc&limit=2&page=1",
            base
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["message"], "Books retrieved successfully");
    let copies: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["copies"].as_i64().unwrap())
        .collect();
    assert_eq!(copies, vec![9, 4]);
    assert_eq!(
        body["pagination"],
        json!({ "total": 3, "page": 1, "limit": 2, "totalPages": 2 })
    );

    // Unusable paging values fall back to defaults
    let body: Value = client
        .get(format!("{}/api/books?page=abc&limit=0", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["limit"], 10);
    assert_eq!(body["data"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_update_and_delete_book() {
    let base = spawn_app(Repository::in_memory()).await;
    let client = Client::new();
    let created = create_book(&client, &base, dune()).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let body: Value = client
        .put(format!("{}/api/books/{}", base, id))
        .json(&json!({ "copies": 0, "available": true }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["message"], "Book updated successfully");
    assert_eq!(body["data"]["copies"], 0);
    assert_eq!(body["data"]["available"], false);
    assert_eq!(body["data"]["title"], "Dune");

    let response = client
        .delete(format!("{}/api/books/{}", base, id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Book deleted successfully");
    assert!(body["data"].is_null());

    let response = client
        .delete(format!("{}/api/books/{}", base, id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_borrow_flow_and_summary() {
    let base = spawn_app(Repository::in_memory()).await;
    let client = Client::new();
    let created = create_book(&client, &base, dune()).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    for _ in 0..2 {
        let response = client
            .post(format!("{}/api/borrow", base))
            .json(&json!({ "book": id, "quantity": 1, "dueDate": "2999-01-01" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["message"], "Book borrowed successfully");
        assert_eq!(body["data"]["book"], json!(id));
        assert_eq!(body["data"]["quantity"], 1);
    }

    let response = client
        .post(format!("{}/api/borrow", base))
        .json(&json!({ "book": id, "quantity": 2, "dueDate": "2999-01-01" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Not enough copies available to borrow");
    assert_eq!(body["error"]["requested"], 2);
    assert_eq!(body["error"]["available"], 1);

    let body: Value = client
        .get(format!("{}/api/borrow", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["message"], "Borrowed books summary retrieved successfully");
    assert_eq!(
        body["data"],
        json!([{ "book": { "title": "Dune", "isbn": "9780441172719" }, "totalQuantity": 2 }])
    );

    let book: Value = client
        .get(format!("{}/api/books/{}", base, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(book["data"]["copies"], 1);
}

#[tokio::test]
async fn test_borrow_validation() {
    let base = spawn_app(Repository::in_memory()).await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/borrow", base))
        .json(&json!({
            "book": uuid::Uuid::new_v4(),
            "quantity": 1,
            "dueDate": "2000-01-01"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["issues"][0]["field"], "dueDate");

    let response = client
        .post(format!("{}/api/borrow", base))
        .json(&json!({
            "book": uuid::Uuid::new_v4(),
            "quantity": 1,
            "dueDate": "2999-01-01"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client
        .post(format!("{}/api/borrow", base))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["name"], "ValidationError");
}
