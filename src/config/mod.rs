//! Configuration management for the Keycloak user admin service

use anyhow::{bail, Context, Result};
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server host
    pub http_host: String,
    /// HTTP server port
    pub http_port: u16,
    /// Keycloak Admin API configuration
    pub keycloak: KeycloakConfig,
    /// Bearer token verification for incoming requests
    pub auth: AuthConfig,
    /// Logging configuration
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone)]
pub struct KeycloakConfig {
    /// Base URL for server-to-server communication (e.g., http://keycloak:8080)
    pub url: String,
    /// Realm whose users are managed
    pub realm: String,
    /// Realm used to obtain the admin token (usually "master")
    pub admin_realm: String,
    pub admin_client_id: String,
    pub admin_client_secret: String,
    /// Admin username. When unset the client credentials grant is used.
    pub admin_username: Option<String>,
    pub admin_password: String,
    /// Request timeout for the Admin API HTTP client
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Realm RS256 public key, PEM or the bare base64 body Keycloak shows in realm keys
    pub public_key_pem: Option<String>,
    /// HS256 shared secret, only used when no public key is configured
    pub secret: Option<String>,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    /// Client whose `resource_access` roles count towards the guard
    pub resource_client_id: Option<String>,
    /// Role every `/keycloak/user` caller must hold
    pub required_role: String,
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// "text" or "json"
    pub log_format: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let auth = AuthConfig {
            public_key_pem: env::var("AUTH_JWT_PUBLIC_KEY")
                .ok()
                .filter(|value| !value.trim().is_empty())
                .map(|value| value.replace("\\n", "\n")),
            secret: optional_env("AUTH_JWT_SECRET"),
            issuer: optional_env("AUTH_JWT_ISSUER"),
            audience: optional_env("AUTH_JWT_AUDIENCE"),
            resource_client_id: optional_env("AUTH_RESOURCE_CLIENT_ID"),
            required_role: env::var("AUTH_REQUIRED_ROLE")
                .unwrap_or_else(|_| "admin_client_role".to_string()),
        };
        if auth.public_key_pem.is_none() && auth.secret.is_none() {
            bail!("Either AUTH_JWT_PUBLIC_KEY or AUTH_JWT_SECRET is required");
        }

        Ok(Self {
            http_host: env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid HTTP_PORT")?,
            keycloak: KeycloakConfig {
                url: env::var("KEYCLOAK_URL")
                    .unwrap_or_else(|_| "http://localhost:8081".to_string())
                    .trim_end_matches('/')
                    .to_string(),
                realm: env::var("KEYCLOAK_REALM").context("KEYCLOAK_REALM is required")?,
                admin_realm: env::var("KEYCLOAK_ADMIN_REALM")
                    .unwrap_or_else(|_| "master".to_string()),
                admin_client_id: env::var("KEYCLOAK_ADMIN_CLIENT_ID")
                    .unwrap_or_else(|_| "admin-cli".to_string()),
                admin_client_secret: env::var("KEYCLOAK_ADMIN_CLIENT_SECRET")
                    .unwrap_or_else(|_| String::new()),
                admin_username: optional_env("KEYCLOAK_ADMIN"),
                admin_password: env::var("KEYCLOAK_ADMIN_PASSWORD")
                    .unwrap_or_else(|_| String::new()),
                timeout_secs: env::var("KEYCLOAK_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .context("Invalid KEYCLOAK_TIMEOUT_SECS")?,
            },
            auth,
            telemetry: TelemetryConfig {
                log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string()),
            },
        })
    }

    /// Get HTTP server address
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

/// Unset and blank variables both read as `None`
fn optional_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}
