//! API error responses
//!
//! Every failure maps to the response envelope: `error` for not-found
//! and unexpected failures, `errors` for field-level validation.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Field name to list of messages
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Validation(FieldErrors),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(error) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "success": false, "error": error })),
            )
                .into_response(),
            ApiError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "success": false, "errors": errors })),
            )
                .into_response(),
            // Unexpected failures surface the message verbatim
            ApiError::Internal(error) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": error })),
            )
                .into_response(),
        }
    }
}

impl From<tarefas_core::Error> for ApiError {
    fn from(err: tarefas_core::Error) -> Self {
        match err {
            tarefas_core::Error::TaskNotFound(id) => {
                ApiError::NotFound(format!("Task {} not found", id))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}
