//! Sign-in surface: login, registration, logout and identity refresh, each
//! driving the auth state machine.

use std::sync::Arc;

use quizhub_auth::Identity;
use quizhub_events::{Notice, SessionEvent, SignOutReason};

use crate::auth_api::AuthApi;
use crate::context::SessionContext;
use crate::dto::{AuthPayload, LoginRequest, RegisterRequest};
use crate::error::ApiError;
use crate::pipeline::ApiClient;
use crate::state::{AuthAction, AuthState};
use crate::store::Credential;

pub const LOGIN_SUCCESS: &str = "Login successful!";
pub const LOGIN_FAILED: &str = "Login failed";
pub const REGISTER_SUCCESS: &str = "Registration successful!";
pub const REGISTER_FAILED: &str = "Registration failed";
pub const LOGOUT_SUCCESS: &str = "Logged out successfully";
pub const LOGOUT_LOCAL: &str = "Logged out locally";

#[derive(Debug, Clone)]
pub struct AuthSession {
    api: AuthApi,
    context: Arc<SessionContext>,
}

impl AuthSession {
    pub fn new(client: ApiClient) -> Self {
        let context = Arc::clone(client.context());
        Self {
            api: AuthApi::new(client),
            context,
        }
    }

    pub fn state(&self) -> AuthState {
        self.context.state()
    }

    /// Resolve the initial state: fetch the identity when a credential was
    /// persisted, otherwise settle on `SignedOut`.
    pub async fn start(&self) {
        if self.context.store().has_credential() {
            self.refetch_identity().await;
        } else {
            self.context.dispatch(AuthAction::Failure);
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(), ApiError> {
        let request = LoginRequest::new(email, password);
        request.validate()?;

        self.context.dispatch(AuthAction::Start);
        tracing::info!(email = %request.email, "signing in");

        match self.api.login(&request).await {
            Ok(payload) => self.establish(payload, LOGIN_SUCCESS, LOGIN_FAILED),
            Err(err) => Err(self.reject(err, LOGIN_FAILED)),
        }
    }

    pub async fn register(&self, profile: RegisterRequest) -> Result<(), ApiError> {
        profile.validate()?;

        self.context.dispatch(AuthAction::Start);
        tracing::info!(username = %profile.username, "registering");

        match self.api.register(&profile).await {
            Ok(payload) => self.establish(payload, REGISTER_SUCCESS, REGISTER_FAILED),
            Err(err) => Err(self.reject(err, REGISTER_FAILED)),
        }
    }

    /// Sign out locally, whatever the server says.
    ///
    /// Calling this while already signed out does nothing.
    pub async fn logout(&self) {
        if self.context.state() == AuthState::SignedOut && !self.context.store().has_credential() {
            tracing::debug!("logout requested while signed out; nothing to do");
            return;
        }

        let remote = self.api.logout().await;

        self.context.store().clear();
        self.context.dispatch(AuthAction::Logout);

        match remote {
            Ok(()) => {
                tracing::info!("signed out");
                self.signed_out();
                self.context.notify(Notice::success(LOGOUT_SUCCESS));
            }
            // Expiry already signed the user out and told them so.
            Err(err @ (ApiError::Renewal(_) | ApiError::Unauthorized(_))) => {
                tracing::warn!(error = %err, "logout raced with session expiry");
            }
            Err(err) => {
                tracing::error!(error = %err, "remote logout failed; signed out locally");
                self.signed_out();
                self.context.notify(Notice::info(LOGOUT_LOCAL));
            }
        }
    }

    fn signed_out(&self) {
        self.context.publish(SessionEvent::SignedOut {
            reason: SignOutReason::Logout,
        });
    }

    /// Re-read the live identity from the server.
    ///
    /// Failure of any kind leaves the session signed out with the credential
    /// cleared. Success only signs in if the credential survived the call.
    pub async fn refetch_identity(&self) {
        self.context.dispatch(AuthAction::Start);

        match self.api.current_identity().await {
            Ok(identity) if self.context.store().has_credential() => {
                self.signed_in(identity);
            }
            Ok(_) => {
                tracing::warn!("identity arrived after the credential was cleared; staying signed out");
                self.context.dispatch(AuthAction::Failure);
            }
            Err(err) => {
                tracing::warn!(error = %err, "identity refresh failed");
                let had_credential = self.context.store().has_credential();
                self.context.store().clear();
                self.context.dispatch(AuthAction::Failure);
                if had_credential {
                    self.context.publish(SessionEvent::SignedOut {
                        reason: SignOutReason::Failed,
                    });
                }
            }
        }
    }

    /// Persist the credential, then sign in. No suspension point separates
    /// the two, so no observer sees one without the other.
    fn establish(&self, payload: AuthPayload, success: &str, failure: &str) -> Result<(), ApiError> {
        let credential = Credential::new(payload.token.clone());
        if let Err(err) = self.context.store().set_credential(&credential) {
            return Err(self.reject(err.into(), failure));
        }

        self.signed_in(payload.into_identity());
        self.context.notify(Notice::success(success));
        Ok(())
    }

    fn signed_in(&self, identity: Identity) {
        self.context.store().save_snapshot(&identity);
        tracing::info!(user_id = %identity.id, roles = identity.roles.len(), "signed in");

        let event = SessionEvent::SignedIn {
            user_id: identity.id,
            display_name: identity.display_name().to_string(),
        };
        self.context.dispatch(AuthAction::Success(identity));
        self.context.publish(event);
    }

    fn reject(&self, err: ApiError, fallback: &str) -> ApiError {
        tracing::warn!(error = %err, "authentication failed");

        self.context.store().clear();
        self.context.dispatch(AuthAction::Failure);
        self.context.publish(SessionEvent::SignedOut {
            reason: SignOutReason::Failed,
        });

        let message = err.server_message().unwrap_or(fallback).to_string();
        self.context.notify(Notice::error(message));
        err
    }
}
