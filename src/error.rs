//! Error types for Shelfy server

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

/// A single problem found while validating a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldIssue {
    /// Offending field (camelCase, as sent on the wire)
    pub field: String,
    pub message: String,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed ({} issue(s))", .0.len())]
    Validation(Vec<FieldIssue>),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not enough copies available to borrow (requested {requested}, available {available})")]
    InsufficientCopies { requested: i32, available: i32 },

    #[error("Duplicate value for field {field}")]
    DuplicateKey { field: String, value: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for a validation failure on one field
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation(vec![FieldIssue::new(field, message)])
    }

    /// Error name reported in the response envelope
    pub fn name(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "ValidationError",
            AppError::NotFound(_) => "NotFound",
            AppError::InsufficientCopies { .. } => "InsufficientCopies",
            AppError::DuplicateKey { .. } => "DuplicateKey",
            AppError::Database(_) | AppError::Internal(_) => "InternalError",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::InsufficientCopies { .. }
            | AppError::DuplicateKey { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut issues: Vec<FieldIssue> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                let field = camel_case(&field.to_string());
                errs.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    FieldIssue::new(field.clone(), message)
                })
            })
            .collect();
        issues.sort_by(|a, b| a.field.cmp(&b.field));
        AppError::Validation(issues)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::invalid("body", rejection.body_text())
    }
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Error details carried in the envelope's `error` member
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorDetail {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues: Option<Vec<FieldIssue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ErrorDetail {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            issues: None,
            description: None,
            requested: None,
            available: None,
            field: None,
            value: None,
        }
    }
}

/// Error response body (same envelope as successful responses, with `data: null`)
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    pub data: Option<serde_json::Value>,
    pub error: ErrorDetail,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut detail = ErrorDetail::named(self.name());

        let message = match self {
            AppError::Validation(issues) => {
                detail.issues = Some(issues);
                "Validation failed".to_string()
            }
            AppError::NotFound(msg) => {
                detail.description = Some(msg);
                "Book not found".to_string()
            }
            AppError::InsufficientCopies { requested, available } => {
                detail.requested = Some(requested);
                detail.available = Some(available);
                detail.description = Some(format!(
                    "Requested {} copies but only {} available",
                    requested, available
                ));
                "Not enough copies available to borrow".to_string()
            }
            AppError::DuplicateKey { field, value } => {
                detail.description = Some(format!("Duplicate value for field {}", field));
                detail.field = Some(field);
                detail.value = Some(value);
                "Duplicate key error".to_string()
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Something went wrong".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Something went wrong".to_string()
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            message,
            data: None,
            error: detail,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
