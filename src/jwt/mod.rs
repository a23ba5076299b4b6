//! Verification of Keycloak-issued access tokens

use crate::config::AuthConfig;
use crate::error::{AppError, Result};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Roles container used by both `realm_access` and `resource_access` entries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleClaims {
    #[serde(default)]
    pub roles: Vec<String>,
}

/// The subset of a Keycloak access token this service reads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject (Keycloak user ID)
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub realm_access: Option<RoleClaims>,
    #[serde(default)]
    pub resource_access: HashMap<String, RoleClaims>,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

impl AccessTokenClaims {
    /// Realm roles plus the roles granted on `resource_client_id`, deduplicated
    pub fn roles(&self, resource_client_id: Option<&str>) -> Vec<String> {
        let mut roles: Vec<String> = self
            .realm_access
            .as_ref()
            .map(|access| access.roles.clone())
            .unwrap_or_default();

        if let Some(client) = resource_client_id.and_then(|id| self.resource_access.get(id)) {
            roles.extend(client.roles.iter().cloned());
        }

        roles.sort();
        roles.dedup();
        roles
    }
}

/// Verifies bearer tokens against the realm key
#[derive(Clone)]
pub struct TokenVerifier {
    config: AuthConfig,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
}

impl TokenVerifier {
    pub fn new(config: AuthConfig) -> Result<Self> {
        let (decoding_key, algorithm) = match (config.public_key_pem.as_ref(), config.secret.as_ref()) {
            (Some(public_key), _) => {
                let pem = normalize_public_key(public_key);
                let key = DecodingKey::from_rsa_pem(pem.as_bytes()).map_err(|e| {
                    AppError::Internal(anyhow::anyhow!("Failed to load JWT public key: {}", e))
                })?;
                (key, Algorithm::RS256)
            }
            (None, Some(secret)) => (DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256),
            (None, None) => {
                return Err(AppError::Internal(anyhow::anyhow!(
                    "No JWT public key or secret configured"
                )))
            }
        };

        Ok(Self {
            config,
            decoding_key,
            algorithm,
        })
    }

    /// Strict leeway (5 seconds) instead of the default 60 seconds.
    fn validation(&self) -> Validation {
        let mut v = Validation::new(self.algorithm);
        v.leeway = 5;
        if let Some(issuer) = self.config.issuer.as_deref() {
            v.set_issuer(&[issuer]);
        }
        match self.config.audience.as_deref() {
            Some(audience) => v.set_audience(&[audience]),
            None => v.validate_aud = false,
        }
        v
    }

    /// Verify signature, expiry and the configured issuer/audience
    pub fn verify(&self, token: &str) -> Result<AccessTokenClaims> {
        let token_data = decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation())
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;
        Ok(token_data.claims)
    }

    pub fn required_role(&self) -> &str {
        &self.config.required_role
    }

    pub fn resource_client_id(&self) -> Option<&str> {
        self.config.resource_client_id.as_deref()
    }

    pub fn uses_rsa(&self) -> bool {
        self.algorithm == Algorithm::RS256
    }
}

/// Keycloak shows realm keys as bare base64; wrap those in PEM armor
fn normalize_public_key(key: &str) -> String {
    let key = key.trim();
    if key.starts_with("-----BEGIN") {
        return key.to_string();
    }
    let body: String = key.split_whitespace().collect();
    let lines: Vec<&str> = body
        .as_bytes()
        .chunks(64)
        .filter_map(|chunk| std::str::from_utf8(chunk).ok())
        .collect();
    format!(
        "-----BEGIN PUBLIC KEY-----\n{}\n-----END PUBLIC KEY-----",
        lines.join("\n")
    )
}
