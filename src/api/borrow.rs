//! Borrow endpoints

use axum::{extract::State, http::StatusCode};

use crate::{
    error::{AppResult, ErrorResponse},
    models::{borrow::CreateBorrow, Borrow, BorrowedSummary},
};

use super::{ApiResponse, ValidatedJson};

/// Total borrowed quantity per book
#[utoipa::path(
    get,
    path = "/borrow",
    tag = "borrow",
    responses(
        (status = 200, description = "Borrowed books summary", body = Vec<BorrowedSummary>)
    )
)]
pub async fn borrowed_summary(
    State(state): State<crate::AppState>,
) -> AppResult<ApiResponse<Vec<BorrowedSummary>>> {
    let rows = state.services.reports.borrowed_summary().await?;
    Ok(ApiResponse::ok(
        "Borrowed books summary retrieved successfully",
        rows,
    ))
}

/// Borrow copies of a book
#[utoipa::path(
    post,
    path = "/borrow",
    tag = "borrow",
    request_body = CreateBorrow,
    responses(
        (status = 201, description = "Book borrowed", body = Borrow),
        (status = 400, description = "Invalid input or not enough copies", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn create_borrow(
    State(state): State<crate::AppState>,
    ValidatedJson(request): ValidatedJson<CreateBorrow>,
) -> AppResult<(StatusCode, ApiResponse<Borrow>)> {
    let borrowed = state
        .services
        .inventory
        .borrow(request.book, request.quantity, request.due_date)
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok("Book borrowed successfully", borrowed.borrow),
    ))
}
