//! Route guard for protected views.

use quizhub_auth::{Authorizer, PermissionTable, Role};

use crate::config::Routes;
use crate::navigation::sign_in_redirect;
use crate::state::AuthState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Identity not resolved yet; show a loading indicator.
    Loading,
    Render,
    RedirectToLogin { target: String },
    Forbidden { target: String },
}

/// Guard for one route. Without required roles any signed-in user passes;
/// with them, holding any one of them is enough.
#[derive(Debug, Clone, Default)]
pub struct RouteGuard {
    required_roles: Vec<Role>,
}

impl RouteGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.required_roles.extend(roles);
        self
    }

    pub fn decide(
        &self,
        state: &AuthState,
        path: &str,
        routes: &Routes,
        table: &PermissionTable,
    ) -> RouteDecision {
        let identity = match state {
            AuthState::Loading => return RouteDecision::Loading,
            AuthState::SignedOut => {
                return RouteDecision::RedirectToLogin {
                    target: sign_in_redirect(path, &routes.login),
                };
            }
            AuthState::SignedIn { identity } => identity,
        };

        if self.required_roles.is_empty() {
            return RouteDecision::Render;
        }

        let authz = Authorizer::new(Some(identity), table);
        if authz.has_any_role(self.required_roles.iter().map(Role::as_str)) {
            RouteDecision::Render
        } else {
            tracing::debug!(path, "route denied: missing required role");
            RouteDecision::Forbidden {
                target: routes.forbidden.clone(),
            }
        }
    }
}
