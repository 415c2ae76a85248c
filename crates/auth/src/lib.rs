//! `navgate-auth` — identity context and policy evaluation.
//!
//! This crate is intentionally decoupled from routing and storage: it only
//! answers "may this identity do that" over data already in memory.

pub mod evaluate;
pub mod grade;
pub mod identity;
pub mod permissions;
pub mod roles;

pub use evaluate::{
    ActionDenial, ActionExplanation, ActionRequirement, GradeShortfall, can_perform_action,
    explain_action, has, has_all, has_any,
};
pub use grade::{Grade, UnknownGrade};
pub use identity::{IdentityBuilder, IdentityContext};
pub use permissions::{PermissionCatalog, PermissionKey};
pub use roles::Role;
