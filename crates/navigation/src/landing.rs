//! Landing resolver: where to send an identity right after authentication.
//!
//! Fallback chain, first applicable wins:
//! 1. the path recorded at login ("came from"), if its route key is
//!    accessible or it maps to no route key
//! 2. the identity's default landing route key, if accessible
//! 3. the first accessible route key that resolves to a path
//! 4. the dedicated no-access destination
//!
//! Resolution fires at most once per session and only on the root path.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

use navgate_auth::IdentityContext;
use navgate_core::RouteKey;

use crate::config::NavigationPaths;
use crate::registry::{RouteRegistry, normalize_path};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Landing {
    pub target: String,
    pub source: LandingSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "routeKey", rename_all = "camelCase")]
pub enum LandingSource {
    CameFrom,
    DefaultRoute(RouteKey),
    FirstAccessible(RouteKey),
    NoAccess,
}

/// Pure fallback-chain selection, without the one-shot guard.
pub fn select_landing(
    registry: &RouteRegistry,
    paths: &NavigationPaths,
    identity: &IdentityContext,
    came_from: Option<&str>,
) -> Landing {
    if let Some(from) = came_from.filter(|p| is_returnable(p, paths)) {
        let accessible = registry
            .route_key_of(from)
            .is_none_or(|key| identity.can_access_route(key));
        if accessible {
            return Landing {
                target: from.to_string(),
                source: LandingSource::CameFrom,
            };
        }
    }

    if let Some(key) = identity.default_landing_route_key() {
        if identity.can_access_route(key) {
            if let Some(path) = registry.path_of(key) {
                return Landing {
                    target: path.to_string(),
                    source: LandingSource::DefaultRoute(key.clone()),
                };
            }
        }
    }

    let first = identity
        .accessible_route_keys()
        .iter()
        .find_map(|key| registry.path_of(key).map(|path| (key, path)));
    if let Some((key, path)) = first {
        return Landing {
            target: path.to_string(),
            source: LandingSource::FirstAccessible(key.clone()),
        };
    }

    Landing {
        target: paths.no_access_path.clone(),
        source: LandingSource::NoAccess,
    }
}

/// A came-from path pointing back at the entry or login page would loop.
fn is_returnable(path: &str, paths: &NavigationPaths) -> bool {
    if path.trim().is_empty() {
        return false;
    }
    let normalized = normalize_path(path);
    normalized != normalize_path(&paths.root_path) && normalized != normalize_path(&paths.login_path)
}

/// One-shot landing resolution for a single session.
#[derive(Debug)]
pub struct LandingResolver {
    registry: Arc<RouteRegistry>,
    paths: NavigationPaths,
    fired: AtomicBool,
}

impl LandingResolver {
    pub fn new(registry: Arc<RouteRegistry>, paths: NavigationPaths) -> Self {
        Self {
            registry,
            paths,
            fired: AtomicBool::new(false),
        }
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    /// Resolve the landing redirect, or `None` when not on the root path or
    /// when this session already redirected.
    pub fn resolve(
        &self,
        current_path: &str,
        identity: &IdentityContext,
        came_from: Option<&str>,
    ) -> Option<Landing> {
        if normalize_path(current_path) != normalize_path(&self.paths.root_path) {
            return None;
        }
        // Check-and-set in one step: concurrent callers see exactly one `false`.
        if self.fired.swap(true, Ordering::AcqRel) {
            return None;
        }

        let landing = select_landing(&self.registry, &self.paths, identity, came_from);
        tracing::info!(target_path = %landing.target, source = ?landing.source, "landing redirect");
        Some(landing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RouteDeclaration;

    fn key(s: &str) -> RouteKey {
        RouteKey::parse(s).unwrap()
    }

    fn registry() -> Arc<RouteRegistry> {
        Arc::new(
            RouteRegistry::from_declarations(&[
                RouteDeclaration::route(key("dashboard"), "/dashboard"),
                RouteDeclaration::route(key("users"), "/users"),
                RouteDeclaration::route(key("reports"), "/reports"),
            ])
            .unwrap(),
        )
    }

    fn paths() -> NavigationPaths {
        NavigationPaths::default()
    }

    #[test]
    fn came_from_wins_when_accessible_or_unmapped() {
        let identity = IdentityContext::builder().accessible_route(key("users")).build();

        let landing = select_landing(&registry(), &paths(), &identity, Some("/users?page=2"));
        assert_eq!(landing.target, "/users?page=2");
        assert_eq!(landing.source, LandingSource::CameFrom);

        let landing = select_landing(&registry(), &paths(), &identity, Some("/help"));
        assert_eq!(landing.source, LandingSource::CameFrom);

        let landing = select_landing(&registry(), &paths(), &identity, Some("/reports"));
        assert_eq!(landing.source, LandingSource::FirstAccessible(key("users")));
    }

    #[test]
    fn came_from_root_or_login_is_ignored() {
        let identity = IdentityContext::builder().accessible_route(key("users")).build();
        for from in ["/", "/login", "/login/"] {
            let landing = select_landing(&registry(), &paths(), &identity, Some(from));
            assert_eq!(landing.source, LandingSource::FirstAccessible(key("users")));
        }
    }

    #[test]
    fn default_landing_used_when_accessible() {
        let identity = IdentityContext::builder()
            .accessible_routes([key("dashboard"), key("reports")])
            .default_landing(key("reports"))
            .build();

        let landing = select_landing(&registry(), &paths(), &identity, None);
        assert_eq!(landing.target, "/reports");
        assert_eq!(landing.source, LandingSource::DefaultRoute(key("reports")));
    }

    #[test]
    fn inaccessible_default_falls_through_to_first_accessible() {
        let identity = IdentityContext::builder()
            .accessible_routes([key("dashboard"), key("users")])
            .default_landing(key("reports"))
            .build();

        let landing = select_landing(&registry(), &paths(), &identity, None);
        assert_eq!(landing.target, "/dashboard");
        assert_eq!(landing.source, LandingSource::FirstAccessible(key("dashboard")));
    }

    #[test]
    fn unregistered_accessible_keys_are_skipped() {
        let identity = IdentityContext::builder()
            .accessible_routes([key("legacy"), key("users")])
            .build();
        let landing = select_landing(&registry(), &paths(), &identity, None);
        assert_eq!(landing.target, "/users");
    }

    #[test]
    fn no_accessible_routes_lands_on_no_access() {
        let landing = select_landing(&registry(), &paths(), &IdentityContext::default(), None);
        assert_eq!(landing.target, "/no-access");
        assert_eq!(landing.source, LandingSource::NoAccess);
    }

    #[test]
    fn resolver_fires_once_and_only_on_root() {
        let resolver = LandingResolver::new(registry(), paths());
        let identity = IdentityContext::builder().accessible_route(key("users")).build();

        assert!(resolver.resolve("/users", &identity, None).is_none());
        assert!(!resolver.has_fired());

        assert!(resolver.resolve("/", &identity, None).is_some());
        assert!(resolver.resolve("/", &identity, None).is_none());
        assert!(resolver.has_fired());
    }

    #[test]
    fn concurrent_resolution_redirects_once() {
        let resolver = Arc::new(LandingResolver::new(registry(), paths()));
        let identity = Arc::new(IdentityContext::builder().accessible_route(key("users")).build());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let resolver = Arc::clone(&resolver);
                let identity = Arc::clone(&identity);
                std::thread::spawn(move || resolver.resolve("/", &identity, None).is_some())
            })
            .collect();

        let fired = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|fired| *fired)
            .count();
        assert_eq!(fired, 1);
    }
}
