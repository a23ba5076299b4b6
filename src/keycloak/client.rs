//! Keycloak Admin API client
//!
//! Handles admin token acquisition and caching, and the realm-scoped user and
//! role endpoints the service needs.

use crate::config::KeycloakConfig;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

use super::types::*;
use super::KeycloakAdmin;

/// Keycloak Admin API client
#[derive(Clone)]
pub struct KeycloakClient {
    config: KeycloakConfig,
    http_client: Client,
    token: Arc<RwLock<Option<AdminToken>>>,
}

#[derive(Debug, Clone)]
struct AdminToken {
    access_token: String,
    expires_at: chrono::DateTime<chrono::Utc>,
}

impl KeycloakClient {
    /// Create a new Keycloak client
    pub fn new(config: KeycloakConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
            token: Arc::new(RwLock::new(None)),
        })
    }

    /// Get the managed realm name
    pub fn realm(&self) -> &str {
        &self.config.realm
    }

    /// Get admin access token (with caching)
    async fn get_admin_token(&self) -> Result<String> {
        {
            let token = self.token.read().await;
            if let Some(ref t) = *token {
                if t.expires_at > chrono::Utc::now() + chrono::Duration::seconds(30) {
                    return Ok(t.access_token.clone());
                }
            }
        }

        let token_url = format!(
            "{}/realms/{}/protocol/openid-connect/token",
            self.config.url, self.config.admin_realm
        );

        let mut params = vec![("client_id", self.config.admin_client_id.as_str())];
        match self.config.admin_username.as_deref() {
            Some(username) => {
                params.push(("grant_type", "password"));
                params.push(("username", username));
                params.push(("password", self.config.admin_password.as_str()));
            }
            None => params.push(("grant_type", "client_credentials")),
        }
        if !self.config.admin_client_secret.is_empty() {
            params.push(("client_secret", self.config.admin_client_secret.as_str()));
        }

        let response = self
            .http_client
            .post(&token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::Keycloak(format!("Failed to get admin token: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Keycloak(format!(
                "Failed to get admin token: {} - {}",
                status, body
            )));
        }

        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
            expires_in: i64,
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Keycloak(format!("Failed to parse token response: {}", e)))?;

        let admin_token = AdminToken {
            access_token: token_response.access_token.clone(),
            expires_at: chrono::Utc::now() + chrono::Duration::seconds(token_response.expires_in),
        };

        {
            let mut token = self.token.write().await;
            *token = Some(admin_token);
        }
        debug!("Obtained Keycloak admin token");

        Ok(token_response.access_token)
    }

    /// URL of a resource below `/admin/realms/{realm}`; segments are percent-encoded
    fn realm_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.config.url)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid Keycloak URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Keycloak URL cannot be a base")))?
            .pop_if_empty()
            .extend(["admin", "realms", self.config.realm.as_str()])
            .extend(segments);
        Ok(url)
    }

    /// URL of the realm's users collection
    fn users_url(&self) -> Result<Url> {
        self.realm_url(&["users"])
    }
}

/// Turn a non-success response into an error; 404 becomes `NotFound`
async fn ensure_success(response: Response, action: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::NOT_FOUND {
        return Err(AppError::NotFound(format!(
            "Failed to {}: not found in Keycloak",
            action
        )));
    }
    Err(AppError::Keycloak(format!(
        "Failed to {}: {} - {}",
        action, status, body
    )))
}

/// Last path segment of a `Location` header, absolute or relative
pub(crate) fn user_id_from_location(location: &str) -> Option<String> {
    let path = match Url::parse(location) {
        Ok(url) => url.path().to_string(),
        Err(_) => location.to_string(),
    };
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl KeycloakAdmin for KeycloakClient {
    async fn list_users(&self) -> Result<Vec<UserRepresentation>> {
        let token = self.get_admin_token().await?;
        let url = self.users_url()?;

        let response = self
            .http_client
            .get(url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| AppError::Keycloak(format!("Failed to list users: {}", e)))?;
        let response = ensure_success(response, "list users").await?;

        response
            .json()
            .await
            .map_err(|e| AppError::Keycloak(format!("Failed to parse users: {}", e)))
    }

    async fn search_users_by_username(
        &self,
        username: &str,
        exact: bool,
    ) -> Result<Vec<UserRepresentation>> {
        let token = self.get_admin_token().await?;
        let url = self.users_url()?;
        let exact = if exact { "true" } else { "false" };

        let response = self
            .http_client
            .get(url)
            .bearer_auth(&token)
            .query(&[("username", username), ("exact", exact)])
            .send()
            .await
            .map_err(|e| AppError::Keycloak(format!("Failed to search users: {}", e)))?;
        let response = ensure_success(response, "search users").await?;

        response
            .json()
            .await
            .map_err(|e| AppError::Keycloak(format!("Failed to parse users: {}", e)))
    }

    async fn create_user(&self, user: &UserRepresentation) -> Result<UserCreation> {
        let token = self.get_admin_token().await?;
        let url = self.users_url()?;

        let response = self
            .http_client
            .post(url)
            .bearer_auth(&token)
            .json(user)
            .send()
            .await
            .map_err(|e| AppError::Keycloak(format!("Failed to create user: {}", e)))?;

        match response.status() {
            StatusCode::CREATED => {
                let location = response
                    .headers()
                    .get(reqwest::header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| AppError::Keycloak("Missing location header".to_string()))?;

                let id = user_id_from_location(location)
                    .ok_or_else(|| AppError::Keycloak("Invalid location header".to_string()))?;

                Ok(UserCreation::Created { id })
            }
            StatusCode::CONFLICT => Ok(UserCreation::Conflict),
            status => {
                let body = response.text().await.unwrap_or_default();
                debug!("Keycloak rejected user creation: {} - {}", status, body);
                Ok(UserCreation::Rejected {
                    status: status.as_u16(),
                })
            }
        }
    }

    async fn reset_password(
        &self,
        user_id: &str,
        credential: &CredentialRepresentation,
    ) -> Result<()> {
        let token = self.get_admin_token().await?;
        let url = self.realm_url(&["users", user_id, "reset-password"])?;

        let response = self
            .http_client
            .put(url)
            .bearer_auth(&token)
            .json(credential)
            .send()
            .await
            .map_err(|e| AppError::Keycloak(format!("Failed to reset password: {}", e)))?;
        ensure_success(response, "reset password").await?;

        Ok(())
    }

    async fn update_user(&self, user_id: &str, user: &UserRepresentation) -> Result<()> {
        let token = self.get_admin_token().await?;
        let url = self.realm_url(&["users", user_id])?;

        let response = self
            .http_client
            .put(url)
            .bearer_auth(&token)
            .json(user)
            .send()
            .await
            .map_err(|e| AppError::Keycloak(format!("Failed to update user: {}", e)))?;
        ensure_success(response, "update user").await?;

        Ok(())
    }

    async fn delete_user(&self, user_id: &str) -> Result<()> {
        let token = self.get_admin_token().await?;
        let url = self.realm_url(&["users", user_id])?;

        let response = self
            .http_client
            .delete(url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| AppError::Keycloak(format!("Failed to delete user: {}", e)))?;
        ensure_success(response, "delete user").await?;

        Ok(())
    }

    async fn list_realm_roles(&self) -> Result<Vec<RoleRepresentation>> {
        let token = self.get_admin_token().await?;
        let url = self.realm_url(&["roles"])?;

        let response = self
            .http_client
            .get(url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| AppError::Keycloak(format!("Failed to list realm roles: {}", e)))?;
        let response = ensure_success(response, "list realm roles").await?;

        response
            .json()
            .await
            .map_err(|e| AppError::Keycloak(format!("Failed to parse roles: {}", e)))
    }

    async fn get_realm_role(&self, name: &str) -> Result<RoleRepresentation> {
        let token = self.get_admin_token().await?;
        let url = self.realm_url(&["roles", name])?;

        let response = self
            .http_client
            .get(url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| AppError::Keycloak(format!("Failed to get realm role: {}", e)))?;
        let response = ensure_success(response, "get realm role").await?;

        response
            .json()
            .await
            .map_err(|e| AppError::Keycloak(format!("Failed to parse role: {}", e)))
    }

    async fn add_realm_role_mappings(
        &self,
        user_id: &str,
        roles: &[RoleRepresentation],
    ) -> Result<()> {
        let token = self.get_admin_token().await?;
        let url = self.realm_url(&["users", user_id, "role-mappings", "realm"])?;

        let response = self
            .http_client
            .post(url)
            .bearer_auth(&token)
            .json(roles)
            .send()
            .await
            .map_err(|e| AppError::Keycloak(format!("Failed to assign realm roles: {}", e)))?;
        ensure_success(response, "assign realm roles").await?;

        Ok(())
    }
}
