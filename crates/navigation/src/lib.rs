//! `navgate-navigation` — route registry, menu filtering, guards and landing.
//!
//! Everything here is synchronous and works over data already in memory:
//! a validated [`Navigation`] configuration and an [`IdentityContext`]
//! snapshot passed in explicitly.
//!
//! [`IdentityContext`]: navgate_auth::IdentityContext

pub mod config;
pub mod filter;
pub mod guard;
pub mod landing;
pub mod menu;
pub mod registry;
pub mod role_guard;
pub mod session;

pub use config::{IdentityAudit, Navigation, NavigationConfig, NavigationPaths};
pub use guard::{AccessDecision, ForbiddenReason, RouteGuard, RouteRequirements};
pub use landing::{Landing, LandingResolver, LandingSource, select_landing};
pub use menu::{MenuNode, MenuNodeKind, MenuTree};
pub use registry::{PathPattern, RouteDeclaration, RouteEntry, RouteRegistry, normalize_path};
pub use role_guard::{RoleCheck, RoleGuard, RoleOutcome};
pub use session::{Session, SessionSlot};
