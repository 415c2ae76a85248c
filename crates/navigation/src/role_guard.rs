use serde::Serialize;

use navgate_auth::{IdentityContext, Role};

/// Role-name-only gate, independent of route keys and menu policy.
///
/// Allows when the identity is authenticated and either no roles are
/// configured or its role is one of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleGuard {
    allowed_roles: Vec<Role>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleOutcome {
    Granted,
    /// No identity; callers should send the user to login, not show a denial.
    Unauthenticated,
    Denied,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleCheck {
    pub outcome: RoleOutcome,
    /// Roles that would have satisfied the guard, for display.
    pub allowed_roles: Vec<Role>,
}

impl RoleCheck {
    pub fn is_allowed(&self) -> bool {
        self.outcome == RoleOutcome::Granted
    }
}

impl RoleGuard {
    pub fn new(allowed_roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            allowed_roles: allowed_roles.into_iter().collect(),
        }
    }

    pub fn allowed_roles(&self) -> &[Role] {
        &self.allowed_roles
    }

    pub fn check(&self, identity: Option<&IdentityContext>) -> RoleCheck {
        let outcome = match identity {
            None => RoleOutcome::Unauthenticated,
            Some(_) if self.allowed_roles.is_empty() => RoleOutcome::Granted,
            Some(identity) => match identity.role() {
                Some(role) if self.allowed_roles.contains(role) => RoleOutcome::Granted,
                _ => RoleOutcome::Denied,
            },
        };

        if outcome == RoleOutcome::Denied {
            tracing::debug!(
                role = identity.and_then(IdentityContext::role).map(Role::as_str),
                allowed = self.allowed_roles.len(),
                "role guard denied"
            );
        }

        RoleCheck {
            outcome,
            allowed_roles: self.allowed_roles.clone(),
        }
    }

    pub fn allows(&self, identity: Option<&IdentityContext>) -> bool {
        self.check(identity).is_allowed()
    }
}
