//! Keycloak Admin API integration
//!
//! `KeycloakAdmin` is the seam the user service depends on; `KeycloakClient`
//! is the REST implementation with admin token caching.

mod client;
mod types;

pub use client::KeycloakClient;
pub use types::*;

use crate::error::Result;
use async_trait::async_trait;

/// Realm-scoped user and role operations against the identity provider
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeycloakAdmin: Send + Sync {
    /// List users of the realm as the provider returns them
    async fn list_users(&self) -> Result<Vec<UserRepresentation>>;

    /// Search users by username
    async fn search_users_by_username(
        &self,
        username: &str,
        exact: bool,
    ) -> Result<Vec<UserRepresentation>>;

    /// Submit a new user. Conflicts and provider rejections are outcomes, not errors.
    async fn create_user(&self, user: &UserRepresentation) -> Result<UserCreation>;

    async fn reset_password(
        &self,
        user_id: &str,
        credential: &CredentialRepresentation,
    ) -> Result<()>;

    /// Overwrite a user representation
    async fn update_user(&self, user_id: &str, user: &UserRepresentation) -> Result<()>;

    async fn delete_user(&self, user_id: &str) -> Result<()>;

    async fn list_realm_roles(&self) -> Result<Vec<RoleRepresentation>>;

    async fn get_realm_role(&self, name: &str) -> Result<RoleRepresentation>;

    /// Assign realm-level roles to a user
    async fn add_realm_role_mappings(
        &self,
        user_id: &str,
        roles: &[RoleRepresentation],
    ) -> Result<()>;
}
