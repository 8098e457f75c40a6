//! # bms-app
//!
//! Application services sitting on top of the identity layer:
//!
//! - [`ClaimsEnricher`] - post-authentication hook that, in proxy mode,
//!   upserts the authenticated user into local storage and augments the
//!   principal with locally resolved roles
//! - [`permissions`] - pure policy functions computing post
//!   visibility/edit/workflow permissions from role claims

#![forbid(unsafe_code)]

pub mod enrichment;
pub mod permissions;

pub use enrichment::ClaimsEnricher;
