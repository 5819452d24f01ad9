use std::borrow::Cow;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Permission identifier of the shape `resource:action` (e.g. `quiz:create`).
///
/// Permissions are compared as whole strings; the split accessors exist for
/// display and for building permissions from an action/resource pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Build `resource:action`.
    pub fn of(resource: &str, action: &str) -> Self {
        Self(Cow::Owned(format!("{resource}:{action}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part before the first `:` (the whole string if there is none).
    pub fn resource(&self) -> &str {
        self.as_str().split_once(':').map_or(self.as_str(), |(r, _)| r)
    }

    /// The part after the first `:`, if any.
    pub fn action(&self) -> Option<&str> {
        self.as_str().split_once(':').map(|(_, a)| a)
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Permission {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

/// The union of permissions granted by every role an identity holds.
///
/// Built once per identity and never mutated; a role change produces a new
/// set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EffectivePermissions(BTreeSet<Permission>);

impl EffectivePermissions {
    pub fn contains(&self, permission: &str) -> bool {
        self.0.iter().any(|p| p.as_str() == permission)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Sorted iteration.
    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.0.iter()
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(|p| p.as_str().to_string()).collect()
    }
}

impl FromIterator<Permission> for EffectivePermissions {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
