use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use navgate_core::{RouteKey, SubjectId};

use crate::{Grade, PermissionKey, Role};

/// Authenticated identity as materialised by the session layer.
///
/// Created at login and replaced wholesale on re-authentication or a
/// permission refresh. The engine only ever reads it.
///
/// `accessible_route_keys` keeps the order it was populated in (duplicates
/// dropped); the landing resolver relies on that order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "IdentityRecord", into = "IdentityRecord")]
pub struct IdentityContext {
    subject: Option<SubjectId>,
    role: Option<Role>,
    grade: Option<Grade>,
    permissions: HashSet<PermissionKey>,
    accessible_route_keys: Vec<RouteKey>,
    default_landing_route_key: Option<RouteKey>,
}

/// Wire shape of an identity record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentityRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subject: Option<SubjectId>,
    #[serde(default)]
    role: Option<Role>,
    #[serde(default)]
    grade: Option<Grade>,
    #[serde(default)]
    permissions: Vec<PermissionKey>,
    #[serde(default)]
    accessible_route_keys: Vec<RouteKey>,
    #[serde(default)]
    default_landing_route_key: Option<RouteKey>,
}

impl From<IdentityRecord> for IdentityContext {
    fn from(record: IdentityRecord) -> Self {
        IdentityContext::builder()
            .maybe_subject(record.subject)
            .maybe_role(record.role)
            .maybe_grade(record.grade)
            .permissions(record.permissions)
            .accessible_routes(record.accessible_route_keys)
            .maybe_default_landing(record.default_landing_route_key)
            .build()
    }
}

impl From<IdentityContext> for IdentityRecord {
    fn from(identity: IdentityContext) -> Self {
        let mut permissions: Vec<_> = identity.permissions.into_iter().collect();
        permissions.sort();
        Self {
            subject: identity.subject,
            role: identity.role,
            grade: identity.grade,
            permissions,
            accessible_route_keys: identity.accessible_route_keys,
            default_landing_route_key: identity.default_landing_route_key,
        }
    }
}

impl IdentityContext {
    pub fn builder() -> IdentityBuilder {
        IdentityBuilder::default()
    }

    pub fn subject(&self) -> Option<SubjectId> {
        self.subject
    }

    pub fn role(&self) -> Option<&Role> {
        self.role.as_ref()
    }

    pub fn grade(&self) -> Option<Grade> {
        self.grade
    }

    pub fn permissions(&self) -> &HashSet<PermissionKey> {
        &self.permissions
    }

    /// Accessible route keys in population order.
    pub fn accessible_route_keys(&self) -> &[RouteKey] {
        &self.accessible_route_keys
    }

    pub fn default_landing_route_key(&self) -> Option<&RouteKey> {
        self.default_landing_route_key.as_ref()
    }

    /// Exact membership in the accessible-route overlay.
    pub fn can_access_route(&self, key: &RouteKey) -> bool {
        self.accessible_route_keys.contains(key)
    }

    /// An empty overlay means no menu policy is configured for this identity.
    pub fn has_route_policy(&self) -> bool {
        !self.accessible_route_keys.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct IdentityBuilder {
    identity: IdentityContext,
}

impl IdentityBuilder {
    pub fn subject(self, subject: SubjectId) -> Self {
        self.maybe_subject(Some(subject))
    }

    pub fn maybe_subject(mut self, subject: Option<SubjectId>) -> Self {
        self.identity.subject = subject;
        self
    }

    pub fn role(self, role: Role) -> Self {
        self.maybe_role(Some(role))
    }

    pub fn maybe_role(mut self, role: Option<Role>) -> Self {
        self.identity.role = role;
        self
    }

    pub fn grade(self, grade: Grade) -> Self {
        self.maybe_grade(Some(grade))
    }

    pub fn maybe_grade(mut self, grade: Option<Grade>) -> Self {
        self.identity.grade = grade;
        self
    }

    pub fn permission(mut self, key: PermissionKey) -> Self {
        self.identity.permissions.insert(key);
        self
    }

    pub fn permissions(mut self, keys: impl IntoIterator<Item = PermissionKey>) -> Self {
        self.identity.permissions.extend(keys);
        self
    }

    /// Append a route key to the overlay; repeated keys keep their first position.
    pub fn accessible_route(mut self, key: RouteKey) -> Self {
        if !self.identity.accessible_route_keys.contains(&key) {
            self.identity.accessible_route_keys.push(key);
        }
        self
    }

    pub fn accessible_routes(self, keys: impl IntoIterator<Item = RouteKey>) -> Self {
        keys.into_iter()
            .fold(self, |builder, key| builder.accessible_route(key))
    }

    pub fn default_landing(self, key: RouteKey) -> Self {
        self.maybe_default_landing(Some(key))
    }

    pub fn maybe_default_landing(mut self, key: Option<RouteKey>) -> Self {
        self.identity.default_landing_route_key = key;
        self
    }

    pub fn build(self) -> IdentityContext {
        self.identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> RouteKey {
        RouteKey::parse(s).unwrap()
    }

    #[test]
    fn accessible_routes_keep_first_position() {
        let identity = IdentityContext::builder()
            .accessible_routes([key("dashboard"), key("users"), key("dashboard")])
            .build();

        assert_eq!(identity.accessible_route_keys(), &[key("dashboard"), key("users")]);
        assert!(identity.has_route_policy());
        assert!(identity.can_access_route(&key("users")));
        assert!(!identity.can_access_route(&key("reports")));
    }

    #[test]
    fn deserializes_session_record() {
        let json = r#"{
            "role": "manager",
            "grade": "SENIOR",
            "permissions": ["users:view", "users:view", "reports:view"],
            "accessibleRouteKeys": ["dashboard", "users"],
            "defaultLandingRouteKey": "users"
        }"#;

        let identity: IdentityContext = serde_json::from_str(json).unwrap();
        assert_eq!(identity.role().map(Role::as_str), Some("manager"));
        assert_eq!(identity.grade(), Some(Grade::Senior));
        assert_eq!(identity.permissions().len(), 2);
        assert_eq!(identity.default_landing_route_key(), Some(&key("users")));
    }

    #[test]
    fn session_record_goes_through_builder() {
        let json = r#"{
            "subject": "0190f5a8-7c1e-7d2a-9b3c-4d5e6f708192",
            "role": "analyst",
            "grade": "JUNIOR",
            "permissions": ["reports:view"],
            "accessibleRouteKeys": ["reports", "dashboard", "reports"],
            "defaultLandingRouteKey": "dashboard"
        }"#;

        let identity: IdentityContext = serde_json::from_str(json).unwrap();
        assert_eq!(
            identity.subject().map(|s| s.to_string()).as_deref(),
            Some("0190f5a8-7c1e-7d2a-9b3c-4d5e6f708192")
        );
        assert_eq!(identity.role().map(Role::as_str), Some("analyst"));
        assert_eq!(identity.grade(), Some(Grade::Junior));
        assert_eq!(identity.accessible_route_keys(), &[key("reports"), key("dashboard")]);
        assert_eq!(identity.default_landing_route_key(), Some(&key("dashboard")));

        let expected = IdentityContext::builder()
            .maybe_subject(identity.subject())
            .role(Role::new("analyst"))
            .grade(Grade::Junior)
            .permission(PermissionKey::from_static("reports:view"))
            .accessible_routes([key("reports"), key("dashboard")])
            .default_landing(key("dashboard"))
            .build();
        assert_eq!(identity, expected);
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let identity: IdentityContext = serde_json::from_str("{}").unwrap();
        assert_eq!(identity, IdentityContext::default());
        assert!(!identity.has_route_policy());
    }
}
