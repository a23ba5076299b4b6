//! Business logic layer

pub mod user;

pub use user::{resolve_realm_roles, KeycloakUserService, UserAdminService, DEFAULT_REALM_ROLE};
