//! Role guard for the user administration routes
//!
//! Provides:
//! - `AuthUser`, the caller identity taken from a verified bearer token
//! - `require_role_middleware`, rejecting callers without the admin role

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use crate::jwt::TokenVerifier;

/// Authenticated caller, inserted into request extensions by the guard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    /// Keycloak user ID from the token's `sub` claim
    pub subject: Option<String>,
    pub username: Option<String>,
    /// Realm roles plus the roles granted on the resource client
    pub roles: Vec<String>,
}

impl AuthUser {
    /// Check if user has a specific role
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Name used in logs
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .or(self.subject.as_deref())
            .unwrap_or("unknown")
    }
}

/// Authentication and authorization errors
#[derive(Debug, Clone)]
pub enum AuthError {
    /// No Authorization header present
    MissingToken,
    /// Invalid Authorization header format
    InvalidHeader(String),
    /// Token validation failed
    InvalidToken(String),
    /// Token is valid but lacks the required role
    MissingRole(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message, code) = match self {
            AuthError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "Missing authorization token",
                "UNAUTHORIZED",
            ),
            AuthError::InvalidHeader(_) => (
                StatusCode::UNAUTHORIZED,
                "Invalid authorization header",
                "UNAUTHORIZED",
            ),
            AuthError::InvalidToken(_) => {
                (StatusCode::UNAUTHORIZED, "Invalid or expired token", "UNAUTHORIZED")
            }
            AuthError::MissingRole(_) => {
                (StatusCode::FORBIDDEN, "Insufficient role", "FORBIDDEN")
            }
        };

        (status, Json(json!({ "error": message, "code": code }))).into_response()
    }
}

/// Shared state for the role guard
#[derive(Clone)]
pub struct AuthMiddlewareState {
    verifier: Arc<TokenVerifier>,
}

impl AuthMiddlewareState {
    pub fn new(verifier: Arc<TokenVerifier>) -> Self {
        Self { verifier }
    }

    /// Verify a bearer token and require the configured role
    pub fn authorize(&self, headers: &HeaderMap) -> Result<AuthUser, AuthError> {
        let token = extract_bearer_token(headers)?;
        let claims = self
            .verifier
            .verify(token)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let user = AuthUser {
            subject: claims.sub.clone(),
            username: claims.preferred_username.clone(),
            roles: claims.roles(self.verifier.resource_client_id()),
        };

        let required = self.verifier.required_role();
        if !user.has_role(required) {
            debug!(caller = %user.display_name(), role = %required, "Caller lacks required role");
            return Err(AuthError::MissingRole(required.to_string()));
        }

        Ok(user)
    }
}

/// Extract the Bearer token from the Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidHeader("Invalid header encoding".to_string()))?;

    auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        AuthError::InvalidHeader("Authorization header must use Bearer scheme".to_string())
    })
}

/// Role guard evaluated before every user administration handler.
///
/// Missing or invalid tokens get 401, tokens without the role get 403.
pub async fn require_role_middleware(
    State(auth_state): State<AuthMiddlewareState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    match auth_state.authorize(request.headers()) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}
