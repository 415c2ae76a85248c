//! Configuration error model.

use thiserror::Error;

/// Result type used while loading static navigation configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Fatal configuration error.
///
/// Raised only while building the route registry, menu tree or permission
/// catalog. Policy outcomes (forbidden, redirect, lookup miss) are never
/// reported through this type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Two route declarations registered the same key.
    #[error("duplicate route key '{0}'")]
    DuplicateRouteKey(String),

    /// Two route keys resolve to the same path pattern.
    #[error("duplicate route path '{path}' (keys '{first}' and '{second}')")]
    DuplicatePath {
        path: String,
        first: String,
        second: String,
    },

    /// A path pattern could not be parsed.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// A route declaration without a key has no children to carry.
    #[error("route declaration at '{0}' has neither a key nor children")]
    KeylessRouteLeaf(String),

    /// Two menu nodes share an id.
    #[error("duplicate menu node id '{0}'")]
    DuplicateMenuNodeId(String),

    /// A category node was declared without children.
    #[error("menu category '{0}' has no children")]
    EmptyCategory(String),

    /// A menu node (or requirement) references a route key the registry does not know.
    #[error("'{owner}' references unknown route key '{route_key}'")]
    UnknownRouteKey { owner: String, route_key: String },

    /// A permission key is outside the configured catalog.
    #[error("'{owner}' references permission '{permission}' outside the catalog")]
    UnknownPermission { owner: String, permission: String },

    /// A permission key failed validation.
    #[error("invalid permission key '{0}'")]
    InvalidPermissionKey(String),

    /// An identifier (route key, node id) failed validation.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// An external menu link is not an absolute URL.
    #[error("menu node '{id}' has non-absolute url '{url}'")]
    InvalidExternalUrl { id: String, url: String },

    /// The configuration document could not be decoded.
    #[error("malformed configuration: {0}")]
    Malformed(String),

    /// The configuration document could not be read.
    #[error("failed to read configuration '{path}': {message}")]
    Io { path: String, message: String },
}

impl ConfigError {
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn unknown_route_key(owner: impl Into<String>, route_key: impl Into<String>) -> Self {
        Self::UnknownRouteKey {
            owner: owner.into(),
            route_key: route_key.into(),
        }
    }

    pub fn unknown_permission(owner: impl Into<String>, permission: impl Into<String>) -> Self {
        Self::UnknownPermission {
            owner: owner.into(),
            permission: permission.into(),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Malformed(value.to_string())
    }
}
