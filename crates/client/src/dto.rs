//! Wire types for the QuizHub API.

use serde::{Deserialize, Serialize};

use quizhub_auth::{Identity, Role};
use quizhub_core::{DomainResult, validate};

/// Every API response is wrapped in this envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Option<serde_json::Value>,
    #[serde(default)]
    pub path: Option<String>,
}

/// Payload of login and registration responses.
///
/// `refresh_token` is accepted for wire compatibility but never stored: the
/// server also sets it as a cookie, which the transport keeps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub token: String,
    #[serde(default, skip_serializing)]
    pub refresh_token: Option<String>,
    pub user: Identity,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl AuthPayload {
    /// The user, with the top-level role list filled in when the user object
    /// carried none.
    pub fn into_identity(self) -> Identity {
        let mut identity = self.user;
        if identity.roles.is_empty() {
            identity.roles = self.roles;
        }
        identity
    }
}

/// Payload of the renewal response. A missing token is a failed renewal.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenPayload {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into().trim().to_string(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        validate::email("email", &self.email)?;
        validate::required("password", &self.password)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

impl RegisterRequest {
    /// Checks fields in form order and reports the first violation.
    pub fn validate(&self) -> DomainResult<()> {
        validate::length("firstName", &self.first_name, 2, 50)?;
        validate::length("lastName", &self.last_name, 2, 50)?;
        validate::email("email", &self.email)?;
        validate::username("username", &self.username)?;
        validate::strong_password("password", &self.password)?;
        validate::required("confirmPassword", &self.confirm_password)?;
        if self.password != self.confirm_password {
            return Err(quizhub_core::DomainError::validation(
                "confirmPassword",
                "passwords do not match",
            ));
        }
        if let Some(phone) = &self.phone_number {
            validate::phone_number("phoneNumber", phone)?;
        }
        Ok(())
    }
}
