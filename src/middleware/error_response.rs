//! Error response normalization middleware
//!
//! Framework rejections (malformed JSON, missing fields, wrong content type,
//! unknown routes) come back from axum as `text/plain` with parser details.
//! This layer replaces them with the same `{error, message}` body `AppError`
//! produces.

use crate::error::AppError;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Rewrite non-JSON 4xx/5xx responses into the JSON error envelope.
pub async fn normalize_error_response(request: Request<Body>, next: Next) -> Response {
    let response = next.run(request).await;

    let status = response.status();
    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|content_type| content_type.contains("application/json"));
    if is_json {
        return response;
    }

    generic_error_response(status)
}

fn generic_error_response(status: StatusCode) -> Response {
    let error = match status {
        StatusCode::BAD_REQUEST => AppError::BadRequest("Invalid request body".to_string()),
        StatusCode::UNAUTHORIZED => AppError::Unauthorized("Authentication required".to_string()),
        StatusCode::FORBIDDEN => AppError::Forbidden("Access denied".to_string()),
        StatusCode::NOT_FOUND => AppError::NotFound("Not found".to_string()),
        StatusCode::CONFLICT => AppError::Conflict("Resource conflict".to_string()),
        StatusCode::UNPROCESSABLE_ENTITY => {
            AppError::Validation("Request body does not match the expected shape".to_string())
        }
        _ => {
            let (error_type, message) = match status {
                StatusCode::METHOD_NOT_ALLOWED => ("method_not_allowed", "Method not allowed"),
                StatusCode::UNSUPPORTED_MEDIA_TYPE => {
                    ("unsupported_media_type", "Unsupported content type")
                }
                _ if status.is_client_error() => ("client_error", "Client error"),
                _ => ("internal_error", "An internal error occurred"),
            };
            return (status, Json(json!({ "error": error_type, "message": message })))
                .into_response();
        }
    };

    error.into_response()
}
