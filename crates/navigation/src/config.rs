//! Static navigation configuration.
//!
//! The route tree, menu forest, permission catalog and the handful of fixed
//! paths are loaded once at startup. Anything malformed aborts loading with a
//! [`ConfigError`]; nothing is repaired silently.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use navgate_auth::{IdentityContext, PermissionCatalog, PermissionKey};
use navgate_core::{ConfigError, ConfigResult, RouteKey};

use crate::guard::RouteGuard;
use crate::menu::{MenuNode, MenuTree};
use crate::registry::{PathPattern, RouteDeclaration, RouteRegistry};
use crate::session::SessionSlot;

/// Environment variable holding the configuration file path.
pub const CONFIG_PATH_ENV: &str = "NAVGATE_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationPaths {
    #[serde(default = "NavigationPaths::default_login_path")]
    pub login_path: String,
    #[serde(default = "NavigationPaths::default_root_path")]
    pub root_path: String,
    #[serde(default = "NavigationPaths::default_no_access_path")]
    pub no_access_path: String,
}

impl Default for NavigationPaths {
    fn default() -> Self {
        Self {
            login_path: Self::default_login_path(),
            root_path: Self::default_root_path(),
            no_access_path: Self::default_no_access_path(),
        }
    }
}

impl NavigationPaths {
    pub fn default_login_path() -> String {
        "/login".to_string()
    }

    pub fn default_root_path() -> String {
        "/".to_string()
    }

    pub fn default_no_access_path() -> String {
        "/no-access".to_string()
    }

    /// Each path must be absolute and free of parameters.
    pub fn validate(&self) -> ConfigResult<()> {
        for path in [&self.login_path, &self.root_path, &self.no_access_path] {
            if !PathPattern::parse(path)?.is_static() {
                return Err(ConfigError::invalid_path(path.as_str(), "must not contain parameters"));
            }
        }
        Ok(())
    }
}

/// Configuration document, as read from JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationConfig {
    #[serde(flatten)]
    pub paths: NavigationPaths,
    /// Closed permission catalog. When absent, requirements are not cross-checked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<PermissionKey>>,
    #[serde(default)]
    pub routes: Vec<RouteDeclaration>,
    #[serde(default)]
    pub menu: Vec<MenuNode>,
}

impl NavigationConfig {
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&contents)
    }

    /// Load from the file named by `NAVGATE_CONFIG`.
    pub fn from_env() -> ConfigResult<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).map_err(|_| ConfigError::Io {
            path: CONFIG_PATH_ENV.to_string(),
            message: "environment variable not set".to_string(),
        })?;
        Self::from_path(path)
    }
}

/// Identity fields that reference things the configuration does not know.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityAudit {
    pub unknown_permissions: Vec<PermissionKey>,
    pub unknown_route_keys: Vec<RouteKey>,
}

impl IdentityAudit {
    pub fn is_clean(&self) -> bool {
        self.unknown_permissions.is_empty() && self.unknown_route_keys.is_empty()
    }
}

/// Validated, immutable navigation configuration.
#[derive(Debug, Clone)]
pub struct Navigation {
    paths: NavigationPaths,
    registry: Arc<RouteRegistry>,
    menu: MenuTree,
    catalog: Option<PermissionCatalog>,
}

impl Navigation {
    pub fn from_config(config: NavigationConfig) -> ConfigResult<Self> {
        config.paths.validate()?;

        let catalog = config.permissions.map(PermissionCatalog::new);
        let registry = RouteRegistry::from_declarations(&config.routes)?;
        let menu = MenuTree::new(config.menu)?;
        menu.check_references(&registry, catalog.as_ref())?;

        tracing::info!(
            routes = registry.len(),
            menu_nodes = menu.len(),
            catalog = catalog.as_ref().map(PermissionCatalog::len),
            "navigation configuration loaded"
        );

        Ok(Self {
            paths: config.paths,
            registry: Arc::new(registry),
            menu,
            catalog,
        })
    }

    pub fn paths(&self) -> &NavigationPaths {
        &self.paths
    }

    pub fn registry(&self) -> &Arc<RouteRegistry> {
        &self.registry
    }

    pub fn menu(&self) -> &MenuTree {
        &self.menu
    }

    pub fn catalog(&self) -> Option<&PermissionCatalog> {
        self.catalog.as_ref()
    }

    pub fn route_guard(&self) -> RouteGuard {
        RouteGuard::new(Arc::clone(&self.registry), self.paths.login_path.clone())
    }

    pub fn session_slot(&self) -> SessionSlot {
        SessionSlot::new(Arc::clone(&self.registry), self.paths.clone())
    }

    /// Menu the identity should see: permission/grade pruning plus the
    /// accessible-route overlay.
    pub fn visible_menu(&self, identity: &IdentityContext) -> MenuTree {
        self.menu.filter_with_policy(identity)
    }

    /// Report (and log) identity references unknown to this configuration.
    pub fn audit_identity(&self, identity: &IdentityContext) -> IdentityAudit {
        let unknown_permissions = self
            .catalog
            .as_ref()
            .map(|catalog| {
                catalog
                    .unknown(identity.permissions())
                    .into_iter()
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        let unknown_route_keys: Vec<RouteKey> = identity
            .accessible_route_keys()
            .iter()
            .chain(identity.default_landing_route_key())
            .filter(|key| !self.registry.contains_key(key))
            .cloned()
            .collect();

        let audit = IdentityAudit {
            unknown_permissions,
            unknown_route_keys,
        };
        if !audit.is_clean() {
            tracing::warn!(
                subject = ?identity.subject(),
                unknown_permissions = audit.unknown_permissions.len(),
                unknown_route_keys = audit.unknown_route_keys.len(),
                "identity references unknown configuration"
            );
        }
        audit
    }
}
