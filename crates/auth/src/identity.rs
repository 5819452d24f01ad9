use serde::{Deserialize, Serialize};

use quizhub_core::UserId;

use crate::Role;

/// The authenticated principal, as returned by the server.
///
/// Identities are never decoded from the bearer credential; the credential is
/// opaque to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default = "active_by_default")]
    pub active: bool,
    #[serde(default)]
    pub roles: Vec<Role>,
}

fn active_by_default() -> bool {
    true
}

impl Identity {
    /// Full name when the server sent one, otherwise the username.
    pub fn display_name(&self) -> &str {
        if self.full_name.trim().is_empty() {
            &self.username
        } else {
            &self.full_name
        }
    }

    pub fn snapshot(&self) -> IdentitySnapshot {
        IdentitySnapshot {
            id: self.id,
            display_name: self.display_name().to_string(),
            email: self.email.clone(),
            roles: self.roles.clone(),
        }
    }
}

/// Minimal identity persisted for optimistic rendering before the live
/// identity has been fetched.
///
/// A snapshot is a display hint only. It must never feed an authorization
/// decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentitySnapshot {
    pub id: UserId,
    pub display_name: String,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<Role>,
}
