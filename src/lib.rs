//! Keycloak User Admin - administrative HTTP facade over Keycloak
//!
//! Exposes list, search, create, update and delete of realm users behind a
//! single role check, delegating storage, credentials and roles to the
//! Keycloak Admin REST API.

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod jwt;
pub mod keycloak;
pub mod middleware;
pub mod server;
pub mod service;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
