//! HTTP middleware

pub mod auth;
pub mod error_response;

pub use auth::{require_role_middleware, AuthMiddlewareState, AuthUser};
pub use error_response::normalize_error_response;
