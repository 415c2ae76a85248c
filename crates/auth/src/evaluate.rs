//! Permission evaluation.
//!
//! - No IO
//! - No panics
//! - Open by default: a requirement only restricts when it is attached

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::grade::{self, Grade};
use crate::{IdentityContext, PermissionKey};

/// Exact set membership.
pub fn has(permissions: &HashSet<PermissionKey>, key: &PermissionKey) -> bool {
    permissions.contains(key)
}

/// True iff at least one key is held. An empty requirement passes.
pub fn has_any(permissions: &HashSet<PermissionKey>, keys: &[PermissionKey]) -> bool {
    keys.is_empty() || keys.iter().any(|k| permissions.contains(k))
}

/// True iff every key is held. An empty requirement passes.
pub fn has_all(permissions: &HashSet<PermissionKey>, keys: &[PermissionKey]) -> bool {
    keys.iter().all(|k| permissions.contains(k))
}

/// Single-permission action gate.
///
/// Fails when a required permission is given and absent, or a minimum grade
/// is given and not met. Button state and action enforcement both go through
/// here so they cannot disagree.
pub fn can_perform_action(
    permissions: &HashSet<PermissionKey>,
    grade: Option<Grade>,
    required_permission: Option<&PermissionKey>,
    min_required_grade: Option<Grade>,
) -> bool {
    let requirement = ActionRequirement {
        permissions: required_permission.into_iter().cloned().collect(),
        min_grade: min_required_grade,
    };
    requirement.is_satisfied(permissions, grade)
}

/// Requirement attached to an action or menu node (AND over permissions).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequirement {
    #[serde(
        default,
        rename = "requiredPermissions",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub permissions: Vec<PermissionKey>,
    #[serde(default, rename = "requiredGrade", skip_serializing_if = "Option::is_none")]
    pub min_grade: Option<Grade>,
}

impl ActionRequirement {
    pub fn permission(key: PermissionKey) -> Self {
        Self {
            permissions: vec![key],
            min_grade: None,
        }
    }

    pub fn with_min_grade(mut self, grade: Grade) -> Self {
        self.min_grade = Some(grade);
        self
    }

    pub fn is_unrestricted(&self) -> bool {
        self.permissions.is_empty() && self.min_grade.is_none()
    }

    pub fn is_satisfied(&self, permissions: &HashSet<PermissionKey>, grade: Option<Grade>) -> bool {
        has_all(permissions, &self.permissions)
            && self
                .min_grade
                .is_none_or(|min| grade::meets_minimum(grade, min))
    }

    /// Same check as [`is_satisfied`](Self::is_satisfied), against an identity.
    pub fn allows(&self, identity: &IdentityContext) -> bool {
        self.is_satisfied(identity.permissions(), identity.grade())
    }

    /// Required keys the holder lacks, in declaration order.
    pub fn missing_permissions(&self, permissions: &HashSet<PermissionKey>) -> Vec<PermissionKey> {
        self.permissions
            .iter()
            .filter(|k| !permissions.contains(*k))
            .cloned()
            .collect()
    }
}

impl IdentityContext {
    pub fn has_permission(&self, key: &PermissionKey) -> bool {
        has(self.permissions(), key)
    }

    pub fn has_any_permission(&self, keys: &[PermissionKey]) -> bool {
        has_any(self.permissions(), keys)
    }

    pub fn has_all_permissions(&self, keys: &[PermissionKey]) -> bool {
        has_all(self.permissions(), keys)
    }

    pub fn can_perform_action(
        &self,
        required_permission: Option<&PermissionKey>,
        min_required_grade: Option<Grade>,
    ) -> bool {
        can_perform_action(
            self.permissions(),
            self.grade(),
            required_permission,
            min_required_grade,
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Action Explanation
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed explanation of an action decision, for informative UI messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionExplanation {
    pub granted: bool,

    /// Human-readable reason for the decision.
    pub reason: String,

    pub requirement: ActionRequirement,

    /// If denied, what was missing.
    pub denial: Option<ActionDenial>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDenial {
    pub missing_permissions: Vec<PermissionKey>,
    pub grade_shortfall: Option<GradeShortfall>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeShortfall {
    pub required: Grade,
    pub actual: Option<Grade>,
}

/// Explain why an action would be allowed or denied.
///
/// The `granted` flag always agrees with [`ActionRequirement::allows`].
pub fn explain_action(identity: &IdentityContext, requirement: &ActionRequirement) -> ActionExplanation {
    let granted = requirement.allows(identity);

    if granted {
        let reason = if requirement.is_unrestricted() {
            "No requirement attached".to_string()
        } else {
            "All requirements met".to_string()
        };
        return ActionExplanation {
            granted,
            reason,
            requirement: requirement.clone(),
            denial: None,
        };
    }

    let missing_permissions = requirement.missing_permissions(identity.permissions());
    let grade_shortfall = requirement
        .min_grade
        .filter(|min| !grade::meets_minimum(identity.grade(), *min))
        .map(|required| GradeShortfall {
            required,
            actual: identity.grade(),
        });

    let mut parts = Vec::new();
    if !missing_permissions.is_empty() {
        let keys: Vec<&str> = missing_permissions.iter().map(PermissionKey::as_str).collect();
        parts.push(format!("missing permission(s) {}", keys.join(", ")));
    }
    if let Some(shortfall) = grade_shortfall {
        match shortfall.actual {
            Some(actual) => parts.push(format!(
                "grade {actual} is below required {}",
                shortfall.required
            )),
            None => parts.push(format!("no grade assigned, {} required", shortfall.required)),
        }
    }

    tracing::debug!(
        missing = missing_permissions.len(),
        grade_short = grade_shortfall.is_some(),
        "action denied"
    );

    ActionExplanation {
        granted,
        reason: format!("Denied: {}", parts.join("; ")),
        requirement: requirement.clone(),
        denial: Some(ActionDenial {
            missing_permissions,
            grade_shortfall,
        }),
    }
}
