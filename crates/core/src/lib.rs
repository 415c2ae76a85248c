//! `navgate-core` — shared identifiers and the configuration error model.
//!
//! This crate is free of policy logic; it only defines the vocabulary the
//! other crates agree on.

pub mod error;
pub mod id;

pub use error::{ConfigError, ConfigResult};
pub use id::{MenuNodeId, RouteKey, SubjectId};
