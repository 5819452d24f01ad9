//! `quizhub-auth`: pure authorization engine (role → permission mapping).
//!
//! This crate is intentionally decoupled from HTTP, storage and session
//! state: every decision is a function of an identity's roles and a
//! [`PermissionTable`].

pub mod authorize;
pub mod gate;
pub mod identity;
pub mod permissions;
pub mod roles;
pub mod table;

pub use authorize::{AuthorizationExplanation, Authorizer};
pub use gate::{Access, CapabilityGate, Combine, evaluate};
pub use identity::{Identity, IdentitySnapshot};
pub use permissions::{EffectivePermissions, Permission};
pub use roles::Role;
pub use table::PermissionTable;
