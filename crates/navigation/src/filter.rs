//! Menu tree filtering.
//!
//! Post-order pruning against an identity. The input tree is never mutated;
//! a new tree is returned. Every surviving node is either navigable itself or
//! a container with at least one surviving descendant, and sibling order is
//! preserved.

use navgate_auth::IdentityContext;

use crate::menu::{MenuNode, MenuNodeKind, MenuTree};

struct FilterPolicy<'a> {
    identity: &'a IdentityContext,
    /// Also prune route keys outside the identity's accessible-route overlay.
    route_overlay: bool,
}

impl FilterPolicy<'_> {
    fn route_blocked(&self, node: &MenuNode) -> bool {
        self.route_overlay
            && self.identity.has_route_policy()
            && node
                .route_key()
                .is_some_and(|key| !self.identity.can_access_route(key))
    }
}

impl MenuTree {
    /// Prune by `hidden`, required permissions and required grade.
    pub fn filter(&self, identity: &IdentityContext) -> MenuTree {
        self.filter_by(&FilterPolicy {
            identity,
            route_overlay: false,
        })
    }

    /// Like [`filter`](Self::filter), additionally dropping pages whose route
    /// key is outside the identity's accessible-route overlay. A group with
    /// such a key loses it and survives only as a container for its
    /// remaining children. An empty overlay restricts nothing.
    pub fn filter_with_policy(&self, identity: &IdentityContext) -> MenuTree {
        self.filter_by(&FilterPolicy {
            identity,
            route_overlay: true,
        })
    }

    fn filter_by(&self, policy: &FilterPolicy<'_>) -> MenuTree {
        let roots = filter_nodes(self.roots(), policy);
        tracing::debug!(
            before = self.roots().len(),
            after = roots.len(),
            overlay = policy.route_overlay,
            "menu filtered"
        );
        MenuTree::from_trusted(roots)
    }
}

fn filter_nodes(nodes: &[MenuNode], policy: &FilterPolicy<'_>) -> Vec<MenuNode> {
    nodes
        .iter()
        .filter_map(|node| filter_node(node, policy))
        .collect()
}

fn filter_node(node: &MenuNode, policy: &FilterPolicy<'_>) -> Option<MenuNode> {
    if node.hidden {
        return None;
    }
    if !node.requirement.allows(policy.identity) {
        return None;
    }

    let kind = match &node.kind {
        MenuNodeKind::Page { .. } => {
            if policy.route_blocked(node) {
                return None;
            }
            node.kind.clone()
        }
        MenuNodeKind::External { .. } => node.kind.clone(),
        MenuNodeKind::Category { children } => {
            let children = filter_nodes(children, policy);
            if children.is_empty() {
                return None;
            }
            MenuNodeKind::Category { children }
        }
        MenuNodeKind::Group { route_key, children } => {
            let children = filter_nodes(children, policy);
            let route_key = route_key.clone().filter(|_| !policy.route_blocked(node));
            if children.is_empty() && route_key.is_none() {
                return None;
            }
            MenuNodeKind::Group { route_key, children }
        }
    };

    Some(MenuNode {
        id: node.id.clone(),
        label: node.label.clone(),
        icon: node.icon.clone(),
        hidden: node.hidden,
        requirement: node.requirement.clone(),
        kind,
    })
}
