//! Menu tree model.
//!
//! A forest of tagged nodes. Categories group, groups group and may navigate,
//! pages navigate to a route key, external nodes link out. Trees are owned
//! values, so they are acyclic by construction; [`MenuTree::new`] checks the
//! remaining structural invariants.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use navgate_auth::{ActionRequirement, Grade, PermissionCatalog, PermissionKey};
use navgate_core::{ConfigError, ConfigResult, MenuNodeId, RouteKey};

use crate::registry::RouteRegistry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuNode {
    pub id: MenuNodeId,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
    #[serde(flatten)]
    pub requirement: ActionRequirement,
    #[serde(flatten)]
    pub kind: MenuNodeKind,
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum MenuNodeKind {
    /// Label-only grouping; never a leaf, never navigable.
    Category { children: Vec<MenuNode> },
    /// Togglable section; navigable when it carries a route key.
    Group {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        route_key: Option<RouteKey>,
        #[serde(default)]
        children: Vec<MenuNode>,
    },
    /// Leaf pointing at a registered route.
    Page { route_key: RouteKey },
    /// Leaf pointing at an absolute URL.
    External { url: String },
}

impl MenuNode {
    fn with_kind(id: MenuNodeId, label: impl Into<String>, kind: MenuNodeKind) -> Self {
        Self {
            id,
            label: label.into(),
            icon: None,
            hidden: false,
            requirement: ActionRequirement::default(),
            kind,
        }
    }

    pub fn category(id: MenuNodeId, label: impl Into<String>, children: Vec<MenuNode>) -> Self {
        Self::with_kind(id, label, MenuNodeKind::Category { children })
    }

    pub fn group(
        id: MenuNodeId,
        label: impl Into<String>,
        route_key: Option<RouteKey>,
        children: Vec<MenuNode>,
    ) -> Self {
        Self::with_kind(id, label, MenuNodeKind::Group { route_key, children })
    }

    pub fn page(id: MenuNodeId, label: impl Into<String>, route_key: RouteKey) -> Self {
        Self::with_kind(id, label, MenuNodeKind::Page { route_key })
    }

    pub fn external(id: MenuNodeId, label: impl Into<String>, url: impl Into<String>) -> Self {
        Self::with_kind(id, label, MenuNodeKind::External { url: url.into() })
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_permission(mut self, key: PermissionKey) -> Self {
        self.requirement.permissions.push(key);
        self
    }

    pub fn with_min_grade(mut self, grade: Grade) -> Self {
        self.requirement.min_grade = Some(grade);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn children(&self) -> &[MenuNode] {
        match &self.kind {
            MenuNodeKind::Category { children } | MenuNodeKind::Group { children, .. } => {
                children.as_slice()
            }
            MenuNodeKind::Page { .. } | MenuNodeKind::External { .. } => &[],
        }
    }

    pub fn route_key(&self) -> Option<&RouteKey> {
        match &self.kind {
            MenuNodeKind::Group { route_key, .. } => route_key.as_ref(),
            MenuNodeKind::Page { route_key } => Some(route_key),
            MenuNodeKind::Category { .. } | MenuNodeKind::External { .. } => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, MenuNodeKind::Page { .. } | MenuNodeKind::External { .. })
    }

    /// Whether the node is actionable on its own, regardless of children.
    pub fn is_navigable(&self) -> bool {
        match &self.kind {
            MenuNodeKind::Category { .. } => false,
            MenuNodeKind::Group { route_key, .. } => route_key.is_some(),
            MenuNodeKind::Page { .. } | MenuNodeKind::External { .. } => true,
        }
    }
}

/// Validated menu forest; sibling order is display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MenuTree {
    roots: Vec<MenuNode>,
}

impl MenuTree {
    /// Check structural invariants: unique ids, non-empty categories,
    /// absolute external URLs.
    pub fn new(roots: Vec<MenuNode>) -> ConfigResult<Self> {
        let mut ids = HashSet::new();
        for node in &roots {
            check_structure(node, &mut ids)?;
        }
        Ok(Self { roots })
    }

    /// Built from nodes already known to satisfy the invariants.
    pub(crate) fn from_trusted(roots: Vec<MenuNode>) -> Self {
        Self { roots }
    }

    /// Check that every route key is registered and, when a catalog is
    /// configured, that every required permission is cataloged.
    pub fn check_references(
        &self,
        registry: &RouteRegistry,
        catalog: Option<&PermissionCatalog>,
    ) -> ConfigResult<()> {
        for node in self.iter() {
            if let Some(key) = node.route_key() {
                if !registry.contains_key(key) {
                    return Err(ConfigError::unknown_route_key(
                        format!("menu node '{}'", node.id),
                        key.as_str(),
                    ));
                }
            }
            if let Some(catalog) = catalog {
                for permission in &node.requirement.permissions {
                    catalog.check(&format!("menu node '{}'", node.id), permission)?;
                }
            }
        }
        Ok(())
    }

    pub fn roots(&self) -> &[MenuNode] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Pre-order traversal.
    pub fn iter(&self) -> MenuIter<'_> {
        MenuIter {
            stack: self.roots.iter().rev().collect(),
        }
    }

    pub fn find(&self, id: &MenuNodeId) -> Option<&MenuNode> {
        self.iter().find(|node| &node.id == id)
    }

    /// Route keys referenced by the tree, in pre-order.
    pub fn route_keys(&self) -> Vec<&RouteKey> {
        self.iter().filter_map(MenuNode::route_key).collect()
    }

    pub fn into_roots(self) -> Vec<MenuNode> {
        self.roots
    }
}

pub struct MenuIter<'a> {
    stack: Vec<&'a MenuNode>,
}

impl<'a> Iterator for MenuIter<'a> {
    type Item = &'a MenuNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}

fn check_structure(node: &MenuNode, ids: &mut HashSet<MenuNodeId>) -> ConfigResult<()> {
    if !ids.insert(node.id.clone()) {
        return Err(ConfigError::DuplicateMenuNodeId(node.id.to_string()));
    }

    match &node.kind {
        MenuNodeKind::Category { children } if children.is_empty() => {
            return Err(ConfigError::EmptyCategory(node.id.to_string()));
        }
        MenuNodeKind::External { url } if !is_absolute_url(url) => {
            return Err(ConfigError::InvalidExternalUrl {
                id: node.id.to_string(),
                url: url.clone(),
            });
        }
        _ => {}
    }

    for child in node.children() {
        check_structure(child, ids)?;
    }
    Ok(())
}

fn is_absolute_url(url: &str) -> bool {
    let Some((scheme, rest)) = url.split_once("://") else {
        return false;
    };
    !rest.is_empty()
        && scheme
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
