//! Route guard: may this identity enter this path?
//!
//! Ordered, short-circuiting checks; the first failure decides:
//! 1. authentication (redirect to login, remembering the requested path)
//! 2. explicit required permissions (all must be held)
//! 3. explicit required route key (must be in the accessible-route overlay)
//! 4. route key derived from the path (only when an overlay is configured)
//!
//! The guard is a pure function of its inputs. Navigating is the caller's job.

use std::sync::Arc;

use serde::Serialize;

use navgate_auth::{IdentityContext, PermissionKey};
use navgate_core::RouteKey;

use crate::registry::RouteRegistry;

/// Static requirements a call site attaches to a guarded route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteRequirements {
    pub permissions: Vec<PermissionKey>,
    pub route_key: Option<RouteKey>,
}

impl RouteRequirements {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn permission(mut self, key: PermissionKey) -> Self {
        self.permissions.push(key);
        self
    }

    pub fn route_key(mut self, key: RouteKey) -> Self {
        self.route_key = Some(key);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "camelCase")]
pub enum AccessDecision {
    Allow,
    Redirect {
        to: String,
        /// Requested path to come back to after login.
        #[serde(skip_serializing_if = "Option::is_none")]
        from: Option<String>,
    },
    Forbidden { reason: ForbiddenReason },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ForbiddenReason {
    MissingPermissions {
        required: Vec<PermissionKey>,
        missing: Vec<PermissionKey>,
    },
    RouteKey { route_key: RouteKey },
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allow)
    }
}

#[derive(Debug, Clone)]
pub struct RouteGuard {
    registry: Arc<RouteRegistry>,
    login_path: String,
}

impl RouteGuard {
    pub fn new(registry: Arc<RouteRegistry>, login_path: impl Into<String>) -> Self {
        Self {
            registry,
            login_path: login_path.into(),
        }
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Decide with no call-site requirements.
    pub fn check_path(&self, path: &str, identity: Option<&IdentityContext>) -> AccessDecision {
        self.check(path, identity, &RouteRequirements::none())
    }

    pub fn check(
        &self,
        path: &str,
        identity: Option<&IdentityContext>,
        requirements: &RouteRequirements,
    ) -> AccessDecision {
        let Some(identity) = identity else {
            tracing::debug!(path, "unauthenticated; redirecting to login");
            return AccessDecision::Redirect {
                to: self.login_path.clone(),
                from: Some(path.to_string()),
            };
        };

        if !identity.has_all_permissions(&requirements.permissions) {
            let missing: Vec<PermissionKey> = requirements
                .permissions
                .iter()
                .filter(|k| !identity.has_permission(k))
                .cloned()
                .collect();
            tracing::debug!(path, missing = missing.len(), "forbidden: missing permissions");
            return AccessDecision::Forbidden {
                reason: ForbiddenReason::MissingPermissions {
                    required: requirements.permissions.clone(),
                    missing,
                },
            };
        }

        if let Some(key) = &requirements.route_key {
            if !identity.can_access_route(key) {
                tracing::debug!(path, route_key = %key, "forbidden: required route key not accessible");
                return AccessDecision::Forbidden {
                    reason: ForbiddenReason::RouteKey {
                        route_key: key.clone(),
                    },
                };
            }
        }

        if identity.has_route_policy() {
            if let Some(key) = self.registry.route_key_of(path) {
                if !identity.can_access_route(key) {
                    tracing::debug!(path, route_key = %key, "forbidden: route key not accessible");
                    return AccessDecision::Forbidden {
                        reason: ForbiddenReason::RouteKey {
                            route_key: key.clone(),
                        },
                    };
                }
            }
        }

        AccessDecision::Allow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RouteDeclaration;
    use proptest::prelude::*;

    fn key(s: &str) -> RouteKey {
        RouteKey::parse(s).unwrap()
    }

    fn guard() -> RouteGuard {
        let registry = RouteRegistry::from_declarations(&[
            RouteDeclaration::route(key("dashboard"), "/dashboard"),
            RouteDeclaration::route(key("users"), "/users"),
            RouteDeclaration::route(key("reports"), "/reports"),
        ])
        .unwrap();
        RouteGuard::new(Arc::new(registry), "/login")
    }

    const USERS_EDIT: PermissionKey = PermissionKey::from_static("users:edit");

    #[test]
    fn unauthenticated_is_redirected_to_login_with_return_path() {
        assert_eq!(
            guard().check_path("/reports", None),
            AccessDecision::Redirect {
                to: "/login".to_string(),
                from: Some("/reports".to_string()),
            }
        );
    }

    #[test]
    fn missing_explicit_permissions_are_reported() {
        let identity = IdentityContext::builder()
            .permission(PermissionKey::from_static("users:view"))
            .build();
        let requirements = RouteRequirements::none()
            .permission(PermissionKey::from_static("users:view"))
            .permission(USERS_EDIT);

        assert_eq!(
            guard().check("/users", Some(&identity), &requirements),
            AccessDecision::Forbidden {
                reason: ForbiddenReason::MissingPermissions {
                    required: vec![PermissionKey::from_static("users:view"), USERS_EDIT],
                    missing: vec![USERS_EDIT],
                },
            }
        );
    }

    #[test]
    fn explicit_route_key_must_be_accessible() {
        let identity = IdentityContext::builder().accessible_route(key("dashboard")).build();
        let requirements = RouteRequirements::none().route_key(key("users"));

        assert_eq!(
            guard().check("/anything", Some(&identity), &requirements),
            AccessDecision::Forbidden {
                reason: ForbiddenReason::RouteKey { route_key: key("users") },
            }
        );
    }

    #[test]
    fn path_derived_route_key_outside_overlay_is_forbidden() {
        let identity = IdentityContext::builder().accessible_route(key("dashboard")).build();

        assert_eq!(
            guard().check_path("/reports", Some(&identity)),
            AccessDecision::Forbidden {
                reason: ForbiddenReason::RouteKey { route_key: key("reports") },
            }
        );
        assert!(guard().check_path("/dashboard", Some(&identity)).is_allowed());
        assert!(guard().check_path("/unmapped", Some(&identity)).is_allowed());
    }

    #[test]
    fn permission_check_runs_before_route_checks() {
        let identity = IdentityContext::builder().accessible_route(key("dashboard")).build();
        let requirements = RouteRequirements::none().permission(USERS_EDIT);

        let decision = guard().check("/reports", Some(&identity), &requirements);
        assert!(matches!(
            decision,
            AccessDecision::Forbidden {
                reason: ForbiddenReason::MissingPermissions { .. }
            }
        ));
    }

    #[test]
    fn decisions_serialize_with_tags() {
        let decision = AccessDecision::Forbidden {
            reason: ForbiddenReason::RouteKey { route_key: key("reports") },
        };
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "decision": "forbidden",
                "reason": { "kind": "routeKey", "routeKey": "reports" }
            })
        );
    }

    proptest! {
        /// Property: no identity always means a login redirect.
        #[test]
        fn unauthenticated_always_redirects(
            path in "/[a-z]{0,8}(/[a-z0-9]{1,4}){0,3}",
            perms in prop::collection::vec("[a-z]{1,5}:[a-z]{1,5}", 0..3),
            route in prop::option::of("[a-z]{1,8}"),
        ) {
            let mut requirements = RouteRequirements::none();
            for p in perms {
                requirements = requirements.permission(PermissionKey::parse(p).unwrap());
            }
            if let Some(r) = route {
                requirements = requirements.route_key(key(&r));
            }

            let decision = guard().check(&path, None, &requirements);
            prop_assert_eq!(decision, AccessDecision::Redirect { to: "/login".to_string(), from: Some(path.clone()) });
        }

        /// Property: an empty overlay never denies on the path-derived check.
        #[test]
        fn empty_overlay_never_denies_by_path(path in "/[a-z]{0,8}(/[a-z0-9]{1,4}){0,3}") {
            let identity = IdentityContext::default();
            prop_assert!(guard().check_path(&path, Some(&identity)).is_allowed());
        }
    }
}
