//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, borrow, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Shelfy API",
        version = "0.1.0",
        description = "Library catalog and lending REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api", description = "API")
    ),
    paths(
        // Health
        health::health_check,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Borrows
        borrow::borrowed_summary,
        borrow::create_borrow,
    ),
    components(
        schemas(
            // Books
            crate::models::Book,
            crate::models::Genre,
            crate::models::Pagination,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            // Borrows
            crate::models::Borrow,
            crate::models::BorrowedSummary,
            crate::models::borrow::BookRef,
            crate::models::borrow::CreateBorrow,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
            crate::error::ErrorDetail,
            crate::error::FieldIssue,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Catalog management"),
        (name = "borrow", description = "Lending and borrowed-books summary")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
