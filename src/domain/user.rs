//! User domain model

use crate::error::Result;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use validator::Validate;

/// User payload accepted by the create and update endpoints.
///
/// The password is plaintext and only lives for the duration of a request.
#[derive(Clone, PartialEq, Eq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    #[validate(length(min = 1, max = 255))]
    pub username: String,
    #[validate(email)]
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[validate(length(min = 1))]
    pub password: String,
    /// Requested realm role names; absent and empty mean the same thing
    #[serde(default)]
    pub roles: Option<HashSet<String>>,
}

impl UserDto {
    /// Build a validated DTO
    pub fn new<I, R>(
        username: impl Into<String>,
        email: Option<String>,
        first_name: Option<String>,
        last_name: Option<String>,
        password: impl Into<String>,
        roles: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        let dto = Self {
            username: username.into(),
            email,
            first_name,
            last_name,
            password: password.into(),
            roles: Some(roles.into_iter().map(Into::into).collect()),
        };
        dto.validate()?;
        Ok(dto)
    }

    /// Requested role names, empty when none were given
    pub fn requested_roles(&self) -> HashSet<String> {
        self.roles.clone().unwrap_or_default()
    }
}

impl fmt::Debug for UserDto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserDto")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("password", &"[REDACTED]")
            .field("roles", &self.roles)
            .finish()
    }
}

/// What happened to a create request.
///
/// Every variant is answered with 201 by the HTTP layer; callers tell them
/// apart by the message only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateUserOutcome {
    Created,
    AlreadyExists,
    ServerError,
}

impl CreateUserOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            CreateUserOutcome::Created => "User created successfully",
            CreateUserOutcome::AlreadyExists => "User exist already",
            CreateUserOutcome::ServerError => "Server internal Error, check logs",
        }
    }
}
