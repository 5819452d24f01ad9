//! Authentication state machine.
//!
//! ```text
//! SignedOut --Start--> Loading --Success--> SignedIn
//!     ^                   |                    |
//!     +-----Failure-------+                    |
//!     +-----------------Logout-----------------+
//! ```
//!
//! `reduce` is pure and total: every (state, action) pair has a result.

use quizhub_auth::Identity;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    SignedOut,
    /// An authentication call or identity fetch is in flight.
    Loading,
    SignedIn { identity: Identity },
}

impl AuthState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthState::SignedIn { identity } => Some(identity),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::SignedIn { .. })
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, AuthState::Loading)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthAction {
    Start,
    Success(Identity),
    Failure,
    Logout,
}

/// Next state for `action`, independent of the current one.
pub fn reduce(_state: &AuthState, action: AuthAction) -> AuthState {
    match action {
        AuthAction::Start => AuthState::Loading,
        AuthAction::Success(identity) => AuthState::SignedIn { identity },
        AuthAction::Failure | AuthAction::Logout => AuthState::SignedOut,
    }
}
