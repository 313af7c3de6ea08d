//! Book (catalog) endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    error::{AppResult, ErrorResponse},
    models::{
        book::{BookListParams, CreateBook, UpdateBook},
        Book, Pagination,
    },
};

use super::{parse_book_id, ApiResponse, ValidatedJson};

/// List books with genre filter, sorting and pagination
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(BookListParams),
    responses(
        (status = 200, description = "Page of books with pagination block", body = Vec<Book>)
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    Query(params): Query<BookListParams>,
) -> AppResult<ApiResponse<Vec<Book>>> {
    let query = params.into_query();
    let (page, limit) = (query.page, query.limit);

    let (books, total) = state.services.catalog.list_books(query).await?;

    Ok(ApiResponse::ok("Books retrieved successfully", books)
        .with_pagination(Pagination::new(total, page, limit)))
}

/// Get book details by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = String, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 400, description = "Malformed book ID", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Book>> {
    let id = parse_book_id(&id)?;
    let book = state.services.catalog.get_book(id).await?;
    Ok(ApiResponse::ok("Book retrieved successfully", book))
}

/// Create a new book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid input or duplicate ISBN", body = ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    ValidatedJson(request): ValidatedJson<CreateBook>,
) -> AppResult<(StatusCode, ApiResponse<Book>)> {
    let book = state.services.catalog.create_book(request).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok("Book created successfully", book),
    ))
}

/// Update a book
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = String, Path, description = "Book ID")
    ),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Invalid input or duplicate ISBN", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateBook>,
) -> AppResult<ApiResponse<Book>> {
    let id = parse_book_id(&id)?;
    let book = state.services.catalog.update_book(id, request).await?;
    Ok(ApiResponse::ok("Book updated successfully", book))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = String, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book deleted"),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    let id = parse_book_id(&id)?;
    state.services.catalog.delete_book(id).await?;
    Ok(ApiResponse::empty("Book deleted successfully"))
}
