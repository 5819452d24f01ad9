use serde::Serialize;

use crate::{EffectivePermissions, Identity, Permission, PermissionTable, Role};

/// Authorization view of the current identity.
///
/// Built from the live identity (never from a cached snapshot) and a
/// [`PermissionTable`]. The effective permission set is computed once on
/// construction; rebuild the authorizer whenever the identity changes.
///
/// - No IO
/// - No panics
/// - Every query is a pure function of the role set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Authorizer {
    authenticated: bool,
    roles: Vec<Role>,
    permissions: EffectivePermissions,
}

impl Authorizer {
    pub fn new(identity: Option<&Identity>, table: &PermissionTable) -> Self {
        match identity {
            Some(identity) => Self::for_roles(identity.roles.clone(), table),
            None => Self::anonymous(),
        }
    }

    /// An authenticated principal holding exactly `roles`.
    pub fn for_roles(roles: Vec<Role>, table: &PermissionTable) -> Self {
        let permissions = table.effective_permissions(&roles);
        Self {
            authenticated: true,
            roles,
            permissions,
        }
    }

    /// Nobody is signed in: every query is false.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn permissions(&self) -> &EffectivePermissions {
        &self.permissions
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.as_str() == role)
    }

    /// True if *any* of `roles` is held. An empty query is false.
    pub fn has_any_role<I, S>(&self, roles: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        roles.into_iter().any(|r| self.has_role(r.as_ref()))
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    /// True if *all* of `permissions` are held. An empty query is vacuously
    /// true.
    pub fn has_all_permissions<I, S>(&self, permissions: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        permissions
            .into_iter()
            .all(|p| self.has_permission(p.as_ref()))
    }

    /// `resource:action` is held.
    pub fn can(&self, action: &str, resource: &str) -> bool {
        self.has_permission(Permission::of(resource, action).as_str())
    }

    pub fn cannot(&self, action: &str, resource: &str) -> bool {
        !self.can(action, resource)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::ADMIN.as_str())
    }

    pub fn is_user(&self) -> bool {
        self.has_role(Role::USER.as_str())
    }

    /// Explain why `required` is (or is not) granted.
    ///
    /// `table` should be the table this authorizer was built from; it is used
    /// to name the roles that would grant a missing permission.
    pub fn explain(&self, required: &Permission, table: &PermissionTable) -> AuthorizationExplanation {
        let required_str = required.as_str().to_string();
        let held_roles: Vec<String> = self.roles.iter().map(|r| r.as_str().to_string()).collect();

        if !self.authenticated {
            return AuthorizationExplanation {
                required_permission: required_str,
                granted: false,
                reason: "No identity is signed in".to_string(),
                roles: held_roles,
                granting_roles: Vec::new(),
            };
        }

        if self.has_permission(required.as_str()) {
            let mut granting: Vec<String> = self
                .roles
                .iter()
                .filter(|r| table.grants(r, required.as_str()))
                .map(|r| r.as_str().to_string())
                .collect();
            granting.sort();

            return AuthorizationExplanation {
                reason: format!("Granted by role(s) {granting:?}"),
                required_permission: required_str,
                granted: true,
                roles: held_roles,
                granting_roles: granting,
            };
        }

        // Roles that exist in the table and would grant the permission.
        let mut granting: Vec<String> = table
            .roles()
            .filter(|r| table.grants(r, required.as_str()))
            .map(|r| r.as_str().to_string())
            .collect();
        granting.sort();

        AuthorizationExplanation {
            reason: format!(
                "Missing permission '{}'. Current permissions: {:?}",
                required_str,
                self.permissions.to_strings()
            ),
            required_permission: required_str,
            granted: false,
            roles: held_roles,
            granting_roles: granting,
        }
    }
}

/// Detailed, loggable explanation of an authorization decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationExplanation {
    pub required_permission: String,
    pub granted: bool,
    pub reason: String,
    /// Roles held by the principal.
    pub roles: Vec<String>,
    /// Granted: the held roles that grant it. Denied: the roles that would.
    pub granting_roles: Vec<String>,
}
