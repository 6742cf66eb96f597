/*
 * Responsibility
 * - Application-wide AppError
 * - IntoResponse (HTTP status / JSON error body)
 * - Maps admission rejections onto status codes; the authorizer itself knows no HTTP
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::authorizer::Rejection;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Rejected(#[from] Rejection),
    #[error("not found: {resource}")]
    NotFound { resource: &'static str },
}

impl AppError {
    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Rejected(rejection) => {
                let (status, code) = match rejection {
                    Rejection::NoSession => (StatusCode::UNAUTHORIZED, "NO_SESSION"),
                    Rejection::ExpiredSession => (StatusCode::UNAUTHORIZED, "EXPIRED_SESSION"),
                    Rejection::InsufficientLevel => (StatusCode::FORBIDDEN, "INSUFFICIENT_LEVEL"),
                };
                (status, code, rejection.to_string())
            }
            AppError::NotFound { resource } => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{resource} not found."),
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}
