//! User administration on top of the Keycloak Admin API

use crate::domain::{CreateUserOutcome, UserDto};
use crate::error::Result;
use crate::keycloak::{
    CredentialRepresentation, KeycloakAdmin, RoleRepresentation, UserCreation, UserRepresentation,
};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, warn};
use validator::Validate;

/// Realm role assigned when a create request names no roles
pub const DEFAULT_REALM_ROLE: &str = "user";

/// The operations the HTTP layer needs
#[async_trait]
pub trait UserAdminService: Send + Sync {
    async fn find_all_users(&self) -> Result<Vec<UserRepresentation>>;
    async fn search_user_by_username(&self, username: &str) -> Result<Vec<UserRepresentation>>;
    async fn create_user(&self, dto: UserDto) -> Result<CreateUserOutcome>;
    async fn update_user(&self, user_id: &str, dto: UserDto) -> Result<()>;
    async fn delete_user(&self, user_id: &str) -> Result<()>;
}

pub struct KeycloakUserService<K: KeycloakAdmin> {
    keycloak: Arc<K>,
}

impl<K: KeycloakAdmin> KeycloakUserService<K> {
    pub fn new(keycloak: Arc<K>) -> Self {
        Self { keycloak }
    }

    async fn realm_roles_for(&self, requested: &HashSet<String>) -> Result<Vec<RoleRepresentation>> {
        if requested.is_empty() {
            let role = self.keycloak.get_realm_role(DEFAULT_REALM_ROLE).await?;
            return Ok(vec![role]);
        }
        let available = self.keycloak.list_realm_roles().await?;
        Ok(resolve_realm_roles(requested, available))
    }
}

/// Representation sent on create and update. Enabled and verified are always set.
fn user_representation(dto: &UserDto) -> UserRepresentation {
    UserRepresentation {
        username: Some(dto.username.clone()),
        email: dto.email.clone(),
        first_name: dto.first_name.clone(),
        last_name: dto.last_name.clone(),
        enabled: Some(true),
        email_verified: Some(true),
        ..Default::default()
    }
}

/// Realm roles whose name matches a requested name, ignoring case.
///
/// Keeps the provider's order; requested names with no match are dropped.
pub fn resolve_realm_roles(
    requested: &HashSet<String>,
    available: Vec<RoleRepresentation>,
) -> Vec<RoleRepresentation> {
    let requested: HashSet<String> = requested.iter().map(|name| name.to_lowercase()).collect();
    available
        .into_iter()
        .filter(|role| requested.contains(&role.name.to_lowercase()))
        .collect()
}

#[async_trait]
impl<K: KeycloakAdmin + 'static> UserAdminService for KeycloakUserService<K> {
    async fn find_all_users(&self) -> Result<Vec<UserRepresentation>> {
        self.keycloak.list_users().await
    }

    async fn search_user_by_username(&self, username: &str) -> Result<Vec<UserRepresentation>> {
        self.keycloak.search_users_by_username(username, true).await
    }

    async fn create_user(&self, dto: UserDto) -> Result<CreateUserOutcome> {
        dto.validate()?;

        let representation = user_representation(&dto);
        match self.keycloak.create_user(&representation).await? {
            UserCreation::Created { id } => {
                // No rollback below: a failure leaves the user created in Keycloak.
                let credential = CredentialRepresentation::password(dto.password.as_str());
                self.keycloak.reset_password(&id, &credential).await?;

                let roles = self.realm_roles_for(&dto.requested_roles()).await?;
                self.keycloak.add_realm_role_mappings(&id, &roles).await?;

                info!(
                    user_id = %id,
                    username = %dto.username,
                    roles = roles.len(),
                    "User created in Keycloak"
                );
                Ok(CreateUserOutcome::Created)
            }
            UserCreation::Conflict => {
                error!(username = %dto.username, "User exist already");
                Ok(CreateUserOutcome::AlreadyExists)
            }
            UserCreation::Rejected { status } => {
                error!(username = %dto.username, status, "Server internal Error");
                Ok(CreateUserOutcome::ServerError)
            }
        }
    }

    async fn update_user(&self, user_id: &str, dto: UserDto) -> Result<()> {
        dto.validate()?;

        let mut representation = user_representation(&dto);
        representation.credentials = Some(vec![CredentialRepresentation::password(
            dto.password.as_str(),
        )]);

        self.keycloak.update_user(user_id, &representation).await?;
        info!(user_id = %user_id, "User overwritten in Keycloak");
        Ok(())
    }

    async fn delete_user(&self, user_id: &str) -> Result<()> {
        if let Err(err) = self.keycloak.delete_user(user_id).await {
            warn!(user_id = %user_id, "Failed to delete user: {}", err);
            return Err(err);
        }
        info!(user_id = %user_id, "User deleted from Keycloak");
        Ok(())
    }
}
