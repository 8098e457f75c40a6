//! # bms-identity
//!
//! Identity management contracts for the blog management system.
//!
//! This crate defines the unified identity-manager interface implemented by
//! both backends (Keycloak-backed and local/proxy-backed), split into seven
//! narrow capability traits so callers only depend on the concerns they use:
//!
//! - [`UserManagement`] - user CRUD and password reset
//! - [`RoleManagement`] - role CRUD
//! - [`UserRoleManagement`] - user/role assignment
//! - [`GroupManagement`] - group CRUD
//! - [`UserGroupManagement`] - user/group membership
//! - [`GroupRoleManagement`] - group/role assignment
//! - [`IdentitySynchronization`] - bulk synchronization
//!
//! [`IdentityManager`] is their union and the sole interface the rest of the
//! application sees. [`ManagerFactory`] selects the active backend at runtime
//! from a persisted mode flag.
//!
//! The crate also defines the local storage provider traits ([`store`]) that
//! concrete backends (PostgreSQL, in-memory) implement, and the
//! [`Principal`] claim-set model consumed by claims enrichment.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod error;
pub mod factory;
pub mod manager;
pub mod principal;
pub mod store;
pub mod types;

pub use error::{IdentityError, IdentityResult, StoreError, StoreResult};
pub use factory::{IdentityMode, ManagerFactory, MODE_SETTING_KEY};
pub use manager::{
    GroupManagement, GroupRoleManagement, IdentityManager, IdentitySynchronization,
    RoleManagement, UserGroupManagement, UserManagement, UserRoleManagement,
};
pub use principal::{claims, Claim, Principal};
pub use store::{GroupStore, RoleStore, SettingStore, UserStore};
pub use types::{
    CredentialRepresentation, GroupRepresentation, RoleRepresentation, UserRepresentation,
};
