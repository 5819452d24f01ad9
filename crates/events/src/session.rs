use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quizhub_core::UserId;

/// Severity of a user-facing notice (toast).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// A user-visible message raised by the client core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            raised_at: Utc::now(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }
}

/// Why the client left the signed-in state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignOutReason {
    /// The user asked to sign out.
    Logout,
    /// Sign-in, registration or identity fetch failed.
    Failed,
    /// The credential expired and could not be renewed.
    Expired,
}

/// Events broadcast by the client core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    SignedIn { user_id: UserId, display_name: String },
    SignedOut { reason: SignOutReason },
    /// The credential could not be renewed; the session is gone.
    SessionExpired,
    /// A new bearer credential replaced the expired one.
    CredentialRenewed,
    Notice(Notice),
}

impl SessionEvent {
    pub fn notice(&self) -> Option<&Notice> {
        match self {
            SessionEvent::Notice(notice) => Some(notice),
            _ => None,
        }
    }
}
