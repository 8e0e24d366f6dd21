// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

// --- Custom Error Handling ---
// Internal errors (e.g., from the database) are turned into HTTP responses
// here: JSON bodies for the API, rendered error pages for the HTML views.

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::FieldErrors;

/// Error type of the JSON API handlers.
#[derive(Debug)]
pub struct AppError {
    pub code: StatusCode,
    pub message: String,
    pub fields: Option<FieldErrors>,
}

impl AppError {
    pub fn new(code: StatusCode, message: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
            fields: None,
        }
    }

    pub fn not_found(what: &str, id: i64) -> Self {
        Self::new(StatusCode::NOT_FOUND, &format!("{what} with ID {id} not found."))
    }

    /// 400 carrying per-field messages.
    pub fn validation(fields: FieldErrors) -> Self {
        Self {
            code: StatusCode::BAD_REQUEST,
            message: "Invalid input.".to_string(),
            fields: Some(fields),
        }
    }
}

/// Allows converting an `anyhow::Error` (coming from `database.rs`)
/// into our `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        // Log the internal error for debugging.
        tracing::error!("Internal server error: {:?}", err);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "An internal error occurred.")
    }
}

impl From<FieldErrors> for AppError {
    fn from(fields: FieldErrors) -> Self {
        Self::validation(fields)
    }
}

/// Malformed or mistyped JSON bodies are client errors.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, &rejection.body_text())
    }
}

/// An id that is not a number can't name any record.
impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!("Unmatched path parameters: {}", rejection.body_text());
        Self::new(StatusCode::NOT_FOUND, "Not found.")
    }
}

/// Allows Axum to convert our `AppError` into an HTTP `Response`.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(
            "Responding with error: status_code={}, message={}",
            self.code.as_u16(),
            self.message
        );
        let body = match self.fields {
            Some(fields) => serde_json::json!({ "error": self.message, "fields": fields }),
            None => serde_json::json!({ "error": self.message }),
        };
        (self.code, Json(body)).into_response()
    }
}

/// Error type of the HTML views.
///
/// The response it produces has an empty body and carries the error in its
/// extensions; `pages::render_error_pages` fills in the rendered error page.
#[derive(Debug, Clone)]
pub struct PageError {
    pub code: StatusCode,
    pub message: String,
}

impl PageError {
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "The page you are looking for does not exist.")
    }
}

impl From<anyhow::Error> for PageError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!("Internal server error: {:?}", err);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "An internal error occurred.")
    }
}

impl From<PathRejection> for PageError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!("Unmatched path parameters: {}", rejection.body_text());
        Self::not_found()
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        tracing::warn!(
            "Responding with error page: status_code={}, message={}",
            self.code.as_u16(),
            self.message
        );
        let mut response = self.code.into_response();
        response.extensions_mut().insert(self);
        response
    }
}
