//! Capability gate: composes role, permission and action/resource checks.

use crate::{Authorizer, Permission, Role};

/// How the individual check results are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Combine {
    /// Any true check grants access (OR).
    #[default]
    Any,
    /// Every check must be true (AND).
    All,
}

/// Combine check results. No checks means no restriction was requested.
pub fn evaluate(checks: &[bool], mode: Combine) -> bool {
    if checks.is_empty() {
        return true;
    }
    match mode {
        Combine::All => checks.iter().all(|c| *c),
        Combine::Any => checks.iter().any(|c| *c),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    Denied,
}

impl Access {
    pub fn is_granted(self) -> bool {
        self == Access::Granted
    }
}

/// Declarative guard around protected content.
///
/// Each supplied check contributes one boolean: the role check passes if any
/// listed role is held, the permission check if all listed permissions are
/// held, the action check if `resource:action` is held. Results are combined
/// with [`Combine::All`] when `require_all` is set, otherwise
/// [`Combine::Any`]. Anonymous callers are always denied.
///
/// ```
/// use quizhub_auth::{Authorizer, CapabilityGate, PermissionTable, Role};
///
/// let authz = Authorizer::for_roles(vec![Role::USER], PermissionTable::builtin());
/// let gate = CapabilityGate::new().roles([Role::ADMIN]).action("take", "quiz");
/// assert!(gate.check(&authz).is_granted());
/// assert!(!gate.require_all(true).check(&authz).is_granted());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilityGate {
    roles: Option<Vec<Role>>,
    permissions: Option<Vec<Permission>>,
    action: Option<(String, String)>,
    require_all: bool,
}

impl CapabilityGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.roles = Some(roles.into_iter().collect());
        self
    }

    pub fn permissions(mut self, permissions: impl IntoIterator<Item = Permission>) -> Self {
        self.permissions = Some(permissions.into_iter().collect());
        self
    }

    pub fn action(mut self, action: impl Into<String>, resource: impl Into<String>) -> Self {
        self.action = Some((action.into(), resource.into()));
        self
    }

    pub fn require_all(mut self, require_all: bool) -> Self {
        self.require_all = require_all;
        self
    }

    /// One boolean per supplied check, in role, permission, action order.
    pub fn checks(&self, authz: &Authorizer) -> Vec<bool> {
        let mut checks = Vec::with_capacity(3);
        if let Some(roles) = &self.roles {
            checks.push(authz.has_any_role(roles.iter().map(Role::as_str)));
        }
        if let Some(permissions) = &self.permissions {
            checks.push(authz.has_all_permissions(permissions.iter().map(Permission::as_str)));
        }
        if let Some((action, resource)) = &self.action {
            checks.push(authz.can(action, resource));
        }
        checks
    }

    /// Every permission the gate asks about, the action check included.
    pub fn required_permissions(&self) -> Vec<Permission> {
        let mut required = self.permissions.clone().unwrap_or_default();
        if let Some((action, resource)) = &self.action {
            required.push(Permission::of(resource, action));
        }
        required
    }

    pub fn check(&self, authz: &Authorizer) -> Access {
        if !authz.is_authenticated() {
            return Access::Denied;
        }

        let mode = if self.require_all {
            Combine::All
        } else {
            Combine::Any
        };

        if evaluate(&self.checks(authz), mode) {
            Access::Granted
        } else {
            tracing::debug!(roles = ?authz.roles(), gate = ?self, "capability gate denied access");
            Access::Denied
        }
    }

    /// Produce `content` when access is granted, `fallback` otherwise.
    pub fn render<T>(
        &self,
        authz: &Authorizer,
        content: impl FnOnce() -> T,
        fallback: impl FnOnce() -> T,
    ) -> T {
        match self.check(authz) {
            Access::Granted => content(),
            Access::Denied => fallback(),
        }
    }
}
