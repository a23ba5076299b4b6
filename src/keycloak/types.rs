//! Keycloak type definitions
//!
//! Representations exchanged with the Keycloak Admin API. Fields this service
//! does not interpret are kept in `extra` so provider responses are relayed
//! to callers unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Credential type for password credentials
pub const PASSWORD_CREDENTIAL: &str = "password";

/// Keycloak user representation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRepresentation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Vec<CredentialRepresentation>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Keycloak credential representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRepresentation {
    #[serde(rename = "type")]
    pub credential_type: String,
    pub value: String,
    pub temporary: bool,
}

impl CredentialRepresentation {
    /// Non-temporary password credential
    pub fn password(value: impl Into<String>) -> Self {
        Self {
            credential_type: PASSWORD_CREDENTIAL.to_string(),
            value: value.into(),
            temporary: false,
        }
    }
}

/// Keycloak role representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRepresentation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub composite: bool,
    #[serde(default)]
    pub client_role: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of submitting a new user to Keycloak
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCreation {
    /// 201, carrying the id taken from the `Location` header
    Created { id: String },
    /// 409, a user with the same username or email exists
    Conflict,
    /// Any other status the provider answered with
    Rejected { status: u16 },
}
