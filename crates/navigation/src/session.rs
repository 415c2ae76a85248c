//! Session-scoped identity holder.
//!
//! Identities are copy-on-write: login, logout and permission refresh swap
//! the whole [`Session`] behind an `Arc`. Readers take a snapshot and never
//! hold a reference into mutable state.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};

use navgate_auth::IdentityContext;

use crate::config::NavigationPaths;
use crate::landing::{Landing, LandingResolver};
use crate::registry::RouteRegistry;

#[derive(Debug)]
pub struct Session {
    identity: Arc<IdentityContext>,
    // Shared by every snapshot of one session, across identity refreshes.
    landing: Arc<LandingResolver>,
    started_at: DateTime<Utc>,
}

impl Session {
    pub fn identity(&self) -> &Arc<IdentityContext> {
        &self.identity
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn landing_fired(&self) -> bool {
        self.landing.has_fired()
    }

    /// One-shot landing redirect for this session.
    pub fn resolve_landing(&self, current_path: &str, came_from: Option<&str>) -> Option<Landing> {
        self.landing.resolve(current_path, &self.identity, came_from)
    }
}

#[derive(Debug)]
pub struct SessionSlot {
    registry: Arc<RouteRegistry>,
    paths: NavigationPaths,
    current: RwLock<Option<Arc<Session>>>,
}

impl SessionSlot {
    pub fn new(registry: Arc<RouteRegistry>, paths: NavigationPaths) -> Self {
        Self {
            registry,
            paths,
            current: RwLock::new(None),
        }
    }

    /// Start a fresh session; any previous one is discarded.
    pub fn login(&self, identity: IdentityContext) -> Arc<Session> {
        let session = Arc::new(Session {
            identity: Arc::new(identity),
            landing: Arc::new(LandingResolver::new(
                Arc::clone(&self.registry),
                self.paths.clone(),
            )),
            started_at: Utc::now(),
        });
        tracing::info!(
            subject = ?session.identity.subject(),
            routes = session.identity.accessible_route_keys().len(),
            "session started"
        );
        self.store(Some(Arc::clone(&session)));
        session
    }

    pub fn logout(&self) {
        if self.take().is_some() {
            tracing::info!("session ended");
        }
    }

    /// Replace the identity of the current session (e.g. after a permission
    /// refresh). The refreshed session keeps the same one-shot landing
    /// resolver, so older snapshots and the new one redirect at most once
    /// between them. Returns `None` when nobody is logged in.
    pub fn refresh_identity(&self, identity: IdentityContext) -> Option<Arc<Session>> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let previous = guard.as_ref()?;

        let session = Arc::new(Session {
            identity: Arc::new(identity),
            landing: Arc::clone(&previous.landing),
            started_at: previous.started_at,
        });
        *guard = Some(Arc::clone(&session));
        tracing::debug!("session identity refreshed");
        Some(session)
    }

    pub fn current(&self) -> Option<Arc<Session>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn identity(&self) -> Option<Arc<IdentityContext>> {
        self.current().map(|s| Arc::clone(s.identity()))
    }

    fn store(&self, session: Option<Arc<Session>>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = session;
    }

    fn take(&self) -> Option<Arc<Session>> {
        self.current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RouteDeclaration;
    use navgate_auth::{PermissionKey, Role};
    use navgate_core::RouteKey;

    fn key(s: &str) -> RouteKey {
        RouteKey::parse(s).unwrap()
    }

    fn slot() -> SessionSlot {
        let registry = RouteRegistry::from_declarations(&[
            RouteDeclaration::route(key("dashboard"), "/dashboard"),
        ])
        .unwrap();
        SessionSlot::new(Arc::new(registry), NavigationPaths::default())
    }

    #[test]
    fn login_replaces_previous_session_wholesale() {
        let slot = slot();
        let first = slot.login(IdentityContext::builder().role(Role::new("user")).build());
        assert!(first.resolve_landing("/", None).is_some());

        let second = slot.login(IdentityContext::builder().role(Role::new("admin")).build());
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(
            slot.identity().unwrap().role().map(Role::as_str),
            Some("admin")
        );
        assert!(second.resolve_landing("/", None).is_some());

        // Old snapshot is unaffected.
        assert_eq!(first.identity().role().map(Role::as_str), Some("user"));
    }

    #[test]
    fn refresh_keeps_landing_spent() {
        let slot = slot();
        let session = slot.login(IdentityContext::default());
        assert!(session.resolve_landing("/", None).is_some());

        let refreshed = slot
            .refresh_identity(
                IdentityContext::builder()
                    .permission(PermissionKey::from_static("users:view"))
                    .build(),
            )
            .unwrap();
        assert!(refreshed.landing_fired());
        assert!(refreshed.resolve_landing("/", None).is_none());
        assert_eq!(refreshed.started_at(), session.started_at());
        assert!(slot.identity().unwrap().has_permission(&PermissionKey::from_static("users:view")));
    }

    #[test]
    fn refresh_before_landing_still_allows_it() {
        let slot = slot();
        slot.login(IdentityContext::default());
        let refreshed = slot.refresh_identity(IdentityContext::default()).unwrap();
        assert!(refreshed.resolve_landing("/", None).is_some());
    }

    #[test]
    fn stale_snapshot_and_refreshed_session_share_one_landing() {
        let slot = slot();
        let before = slot.login(IdentityContext::default());
        let after = slot.refresh_identity(IdentityContext::default()).unwrap();

        assert!(before.resolve_landing("/", None).is_some());
        assert!(after.landing_fired());
        assert!(after.resolve_landing("/", None).is_none());
        assert!(before.resolve_landing("/", None).is_none());
    }

    #[test]
    fn concurrent_resolution_across_refreshes_redirects_once() {
        let slot = Arc::new(slot());
        let before = slot.login(IdentityContext::default());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let slot = Arc::clone(&slot);
                let before = Arc::clone(&before);
                std::thread::spawn(move || {
                    if i % 2 == 0 {
                        before.resolve_landing("/", None).is_some()
                    } else {
                        slot.refresh_identity(IdentityContext::default())
                            .is_some_and(|s| s.resolve_landing("/", None).is_some())
                    }
                })
            })
            .collect();

        let fired = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|fired| *fired)
            .count();
        assert_eq!(fired, 1);
        assert!(slot.current().unwrap().landing_fired());
    }

    #[test]
    fn logout_clears_and_refresh_requires_session() {
        let slot = slot();
        slot.login(IdentityContext::default());
        slot.logout();
        assert!(slot.current().is_none());
        assert!(slot.refresh_identity(IdentityContext::default()).is_none());
    }
}
