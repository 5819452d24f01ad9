//! Static role → permission mapping.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use crate::{EffectivePermissions, Permission, Role};

const ADMIN_PERMISSIONS: &[&str] = &[
    "quiz:view",
    "quiz:create",
    "quiz:edit",
    "quiz:delete",
    "question:view",
    "question:create",
    "question:edit",
    "question:delete",
    "user:view",
    "user:create",
    "user:edit",
    "user:delete",
    "role:view",
    "role:create",
    "role:edit",
    "role:delete",
    "dashboard:view",
];

const USER_PERMISSIONS: &[&str] = &["quiz:view", "quiz:take"];

static BUILTIN: LazyLock<PermissionTable> = LazyLock::new(|| {
    PermissionTable::new()
        .with_role(Role::ADMIN, ADMIN_PERMISSIONS.iter().copied().map(Permission::new))
        .with_role(Role::USER, USER_PERMISSIONS.iter().copied().map(Permission::new))
});

/// Maps role identifiers to the permissions they grant.
///
/// Unknown roles grant nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionTable {
    grants: HashMap<Role, BTreeSet<Permission>>,
}

impl PermissionTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The QuizHub table (`ROLE_ADMIN`, `ROLE_USER`), built once per process.
    pub fn builtin() -> &'static PermissionTable {
        &BUILTIN
    }

    /// Add permissions to `role` (merged with anything already granted).
    pub fn with_role(
        mut self,
        role: Role,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Self {
        self.grants.entry(role).or_default().extend(permissions);
        self
    }

    pub fn permissions_for(&self, role: &Role) -> impl Iterator<Item = &Permission> {
        self.grants.get(role).into_iter().flatten()
    }

    pub fn grants(&self, role: &Role, permission: &str) -> bool {
        self.permissions_for(role).any(|p| p.as_str() == permission)
    }

    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.grants.keys()
    }

    /// Union of the permission sets of every role in `roles`.
    pub fn effective_permissions<'a>(
        &self,
        roles: impl IntoIterator<Item = &'a Role>,
    ) -> EffectivePermissions {
        roles
            .into_iter()
            .flat_map(|role| self.permissions_for(role))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_user_role() {
        let table = PermissionTable::builtin();
        let perms = table.effective_permissions([&Role::USER]);
        assert_eq!(perms.to_strings(), vec!["quiz:take", "quiz:view"]);
    }

    #[test]
    fn builtin_admin_role_cannot_take_quizzes() {
        let table = PermissionTable::builtin();
        assert!(table.grants(&Role::ADMIN, "dashboard:view"));
        assert!(!table.grants(&Role::ADMIN, "quiz:take"));
        assert_eq!(table.permissions_for(&Role::ADMIN).count(), 17);
    }

    #[test]
    fn unknown_role_grants_nothing() {
        let table = PermissionTable::builtin();
        let perms = table.effective_permissions([&Role::new("ROLE_GHOST")]);
        assert!(perms.is_empty());
    }

    #[test]
    fn with_role_merges() {
        let table = PermissionTable::new()
            .with_role(Role::USER, [Permission::new("quiz:view")])
            .with_role(Role::USER, [Permission::new("quiz:take")]);
        assert_eq!(table.permissions_for(&Role::USER).count(), 2);
    }

    #[test]
    fn no_roles_no_permissions() {
        let perms = PermissionTable::builtin().effective_permissions(std::iter::empty());
        assert!(perms.is_empty());
    }
}
