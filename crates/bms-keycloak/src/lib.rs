//! # bms-keycloak
//!
//! Keycloak-backed implementation of the identity-manager contract.
//!
//! [`KeycloakAdminClient`] talks to the Keycloak admin REST API using a
//! password-grant bearer token that is refreshed lazily with a safety
//! margin before expiry. [`KeycloakIdentityManager`] implements the unified
//! contract on top of it; operations the admin API does not cover in this
//! deployment (role/group mutation, group-role mappings) fail with an
//! explicit unsupported-operation error. [`SafeKeycloakManager`] wraps the
//! manager and converts those failures into harmless defaults so callers
//! written against the unified contract need no mode-specific error
//! handling.

#![forbid(unsafe_code)]

pub mod adapter;
pub mod client;
pub mod config;
pub mod error;
pub mod manager;
pub mod models;

pub use adapter::SafeKeycloakManager;
pub use client::KeycloakAdminClient;
pub use config::KeycloakConfig;
pub use error::{KeycloakError, KeycloakResult};
pub use manager::KeycloakIdentityManager;
