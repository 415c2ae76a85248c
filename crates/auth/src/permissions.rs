use std::borrow::Cow;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use navgate_core::{ConfigError, ConfigResult};

/// Permission identifier.
///
/// Permission keys are opaque strings (e.g. "action:users:create") drawn from
/// a closed catalog. Nothing past equality is assumed about their shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionKey(Cow<'static, str>);

impl PermissionKey {
    /// Wrap a compile-time key without validation.
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Validate and wrap a key: non-empty, no whitespace.
    pub fn parse(name: impl Into<Cow<'static, str>>) -> ConfigResult<Self> {
        let name = name.into();
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidPermissionKey(name.into_owned()));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PermissionKey {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<PermissionKey> for String {
    fn from(value: PermissionKey) -> Self {
        value.0.into_owned()
    }
}

/// Closed catalog of every permission key the deployment knows about.
///
/// Menu requirements are checked against it once, at load time, so
/// evaluation never has to guess at unknown keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionCatalog {
    keys: HashSet<PermissionKey>,
}

impl PermissionCatalog {
    pub fn new(keys: impl IntoIterator<Item = PermissionKey>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    pub fn contains(&self, key: &PermissionKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Fail with `UnknownPermission` if `key` is not cataloged.
    pub fn check(&self, owner: &str, key: &PermissionKey) -> ConfigResult<()> {
        if self.contains(key) {
            Ok(())
        } else {
            Err(ConfigError::unknown_permission(owner, key.as_str()))
        }
    }

    /// Keys from `keys` that are not in the catalog, sorted.
    pub fn unknown<'a>(
        &self,
        keys: impl IntoIterator<Item = &'a PermissionKey>,
    ) -> Vec<&'a PermissionKey> {
        let mut unknown: Vec<_> = keys.into_iter().filter(|k| !self.contains(k)).collect();
        unknown.sort();
        unknown
    }
}
