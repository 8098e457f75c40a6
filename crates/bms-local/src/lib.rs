//! # bms-local
//!
//! Local storage backends for the identity layer.
//!
//! The store traits from `bms-identity` are implemented twice:
//!
//! - [`PgUserStore`] / [`PgRoleStore`] / [`PgGroupStore`] /
//!   [`PgSettingStore`] over PostgreSQL via `sqlx`
//! - [`MemoryStore`], a thread-safe in-memory backend used by tests and
//!   embedded setups
//!
//! [`LocalIdentityManager`] implements the full identity-manager contract
//! on top of the store traits and is the authoritative backend in proxy
//! mode.

#![forbid(unsafe_code)]

pub mod entities;
pub mod error;
pub mod group;
pub mod manager;
pub mod memory;
pub mod pool;
pub mod role;
pub mod schema;
pub mod setting;
pub mod user;

pub use group::PgGroupStore;
pub use manager::LocalIdentityManager;
pub use memory::MemoryStore;
pub use pool::{create_pool, PoolConfig};
pub use role::PgRoleStore;
pub use schema::run_migrations;
pub use setting::PgSettingStore;
pub use user::PgUserStore;
