//! Route registry: route key <-> path pattern.
//!
//! Built once from a declarative route tree. Lookups never fail with an
//! error; a miss simply means no restriction can be derived from the path.
//!
//! Path resolution order:
//! 1. exact match on a fully static pattern
//! 2. full-length pattern match (`:param` segments, trailing `*`)
//! 3. prefix match on segment boundaries
//!
//! Within a tier the candidate with more matched segments wins, then the one
//! with more static segments, then the earliest registered. The root pattern
//! `/` only matches exactly.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use navgate_core::{ConfigError, ConfigResult, RouteKey};

/// One node of the declarative route tree.
///
/// A path starting with `/` is absolute, anything else is joined onto the
/// parent's path. Nodes without a key are layout nodes: they only lend their
/// prefix to children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDeclaration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<RouteKey>,
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RouteDeclaration>,
}

impl RouteDeclaration {
    pub fn route(key: RouteKey, path: impl Into<String>) -> Self {
        Self {
            key: Some(key),
            path: path.into(),
            children: Vec::new(),
        }
    }

    pub fn layout(path: impl Into<String>) -> Self {
        Self {
            key: None,
            path: path.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<RouteDeclaration>) -> Self {
        self.children = children;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param(String),
    Rest,
}

/// A parsed, normalised path pattern (e.g. `/users/:id`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(path: &str) -> ConfigResult<Self> {
        if !path.starts_with('/') {
            return Err(ConfigError::invalid_path(path, "must be absolute"));
        }

        let parts = split_segments(path);
        let mut segments = Vec::with_capacity(parts.len());
        for (i, part) in parts.iter().enumerate() {
            let segment = if *part == "*" {
                if i + 1 != parts.len() {
                    return Err(ConfigError::invalid_path(path, "'*' must be the last segment"));
                }
                Segment::Rest
            } else if let Some(name) = part.strip_prefix(':') {
                if name.is_empty() {
                    return Err(ConfigError::invalid_path(path, "unnamed parameter"));
                }
                Segment::Param(name.to_string())
            } else {
                Segment::Static((*part).to_string())
            };
            segments.push(segment);
        }

        let raw = if parts.is_empty() {
            "/".to_string()
        } else {
            format!("/{}", parts.join("/"))
        };

        Ok(Self { raw, segments })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn is_static(&self) -> bool {
        self.segments.iter().all(|s| matches!(s, Segment::Static(_)))
    }

    fn ends_with_rest(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::Rest))
    }

    /// Pattern shape with parameter names erased; two patterns with the same
    /// shape match exactly the same paths.
    fn shape(&self) -> String {
        let parts: Vec<&str> = self
            .segments
            .iter()
            .map(|s| match s {
                Segment::Static(v) => v.as_str(),
                Segment::Param(_) => ":",
                Segment::Rest => "*",
            })
            .collect();
        format!("/{}", parts.join("/"))
    }

    fn static_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Static(_)))
            .count()
    }

    /// Join a child path onto this pattern.
    fn join(&self, child: &str) -> ConfigResult<PathPattern> {
        if child.starts_with('/') {
            return PathPattern::parse(child);
        }
        if self.ends_with_rest() {
            return Err(ConfigError::invalid_path(
                child,
                format!("cannot nest under catch-all '{}'", self.raw),
            ));
        }
        if child.is_empty() {
            return Ok(self.clone());
        }
        let base = self.raw.trim_end_matches('/');
        PathPattern::parse(&format!("{base}/{child}"))
    }

    fn matches(&self, path: &[&str]) -> Option<Match> {
        let mut matched = 0;
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Rest => {
                    return Some(Match {
                        tier: Tier::Pattern,
                        segments: path.len(),
                        statics: self.static_count(),
                    });
                }
                Segment::Static(v) => {
                    if path.get(i) != Some(&v.as_str()) {
                        return None;
                    }
                }
                Segment::Param(_) => {
                    path.get(i)?;
                }
            }
            matched += 1;
        }

        let tier = if matched == path.len() {
            if self.is_static() { Tier::Exact } else { Tier::Pattern }
        } else if self.is_root() {
            return None;
        } else {
            Tier::Prefix
        };

        Some(Match {
            tier,
            segments: matched,
            statics: self.static_count(),
        })
    }
}

impl core::fmt::Display for PathPattern {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Tier {
    Prefix,
    Pattern,
    Exact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Match {
    tier: Tier,
    segments: usize,
    statics: usize,
}

/// Strip query/fragment and split into non-empty segments.
fn split_segments(path: &str) -> Vec<&str> {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    path[..end].split('/').filter(|s| !s.is_empty()).collect()
}

/// Normalise a concrete request path (`/users/?tab=1` -> `/users`).
pub fn normalize_path(path: &str) -> String {
    let parts = split_segments(path);
    if parts.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", parts.join("/"))
    }
}

/// One registered `(route key, path pattern)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub key: RouteKey,
    pub pattern: PathPattern,
}

#[derive(Debug, Clone, Default)]
pub struct RouteRegistry {
    entries: Vec<RouteEntry>,
    by_key: HashMap<RouteKey, usize>,
    by_static_path: HashMap<String, usize>,
}

impl RouteRegistry {
    /// Flatten a route tree depth-first, in declaration order.
    pub fn from_declarations(routes: &[RouteDeclaration]) -> ConfigResult<Self> {
        let mut registry = Self::default();
        let mut shapes: HashMap<String, RouteKey> = HashMap::new();
        let root = PathPattern::parse("/")?;

        for route in routes {
            registry.flatten(route, &root, &mut shapes)?;
        }

        tracing::info!(routes = registry.entries.len(), "route registry built");
        Ok(registry)
    }

    fn flatten(
        &mut self,
        route: &RouteDeclaration,
        parent: &PathPattern,
        shapes: &mut HashMap<String, RouteKey>,
    ) -> ConfigResult<()> {
        let pattern = parent.join(&route.path)?;

        match &route.key {
            Some(key) => {
                if self.by_key.contains_key(key) {
                    return Err(ConfigError::DuplicateRouteKey(key.to_string()));
                }
                let shape = pattern.shape();
                if let Some(first) = shapes.get(&shape) {
                    return Err(ConfigError::DuplicatePath {
                        path: pattern.as_str().to_string(),
                        first: first.to_string(),
                        second: key.to_string(),
                    });
                }
                shapes.insert(shape, key.clone());

                let idx = self.entries.len();
                if pattern.is_static() {
                    self.by_static_path.insert(pattern.as_str().to_string(), idx);
                }
                self.by_key.insert(key.clone(), idx);
                self.entries.push(RouteEntry {
                    key: key.clone(),
                    pattern: pattern.clone(),
                });
            }
            None if route.children.is_empty() => {
                return Err(ConfigError::KeylessRouteLeaf(pattern.as_str().to_string()));
            }
            None => {}
        }

        for child in &route.children {
            self.flatten(child, &pattern, shapes)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &RouteKey) -> bool {
        self.by_key.contains_key(key)
    }

    /// Registered entries in registration order.
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn pattern_of(&self, key: &RouteKey) -> Option<&PathPattern> {
        self.by_key.get(key).map(|idx| &self.entries[*idx].pattern)
    }

    pub fn path_of(&self, key: &RouteKey) -> Option<&str> {
        self.pattern_of(key).map(PathPattern::as_str)
    }

    /// Resolve a concrete path to the route key that owns it.
    pub fn route_key_of(&self, path: &str) -> Option<&RouteKey> {
        let normalized = normalize_path(path);
        if let Some(idx) = self.by_static_path.get(&normalized) {
            return Some(&self.entries[*idx].key);
        }

        let segments = split_segments(path);
        let mut best: Option<(Match, usize)> = None;
        for (idx, entry) in self.entries.iter().enumerate() {
            let Some(m) = entry.pattern.matches(&segments) else {
                continue;
            };
            // Strictly greater keeps the earliest registration on ties.
            if best.is_none_or(|(current, _)| m > current) {
                best = Some((m, idx));
            }
        }

        best.map(|(_, idx)| &self.entries[idx].key)
    }
}
