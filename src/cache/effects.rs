//! Declarative cache effects.
//!
//! A [`CacheEffectSet`] is what a successful mutation asks the cache to do.
//! It carries no behaviour of its own; the executor interprets it.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use super::keys::{KeyPath, QueryKey};

/// How a cached value is replaced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Updater {
    /// Store `value` regardless of what was cached before.
    Replace { value: Value },
    /// Swap the element of `previous[list_field]` whose `id_field` equals
    /// `id` for `value`. Leaves the entry untouched when there is no cached
    /// value, no such list, or no matching element.
    ReplaceListElement {
        list_field: &'static str,
        id_field: &'static str,
        id: String,
        value: Value,
    },
}

impl Updater {
    pub fn replace(value: Value) -> Self {
        Self::Replace { value }
    }

    /// New value for the entry, or `None` when it must not change.
    pub fn apply(&self, previous: Option<&Value>) -> Option<Value> {
        match self {
            Updater::Replace { value } => Some(value.clone()),
            Updater::ReplaceListElement {
                list_field,
                id_field,
                id,
                value,
            } => {
                let mut next = previous?.clone();
                let list = next.get_mut(*list_field)?.as_array_mut()?;
                let slot = list.iter_mut().find(|element| {
                    element.get(*id_field).and_then(Value::as_str) == Some(id.as_str())
                })?;
                *slot = value.clone();
                Some(next)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheUpdate {
    pub key: QueryKey,
    pub updater: Updater,
}

impl CacheUpdate {
    pub fn replace(key: QueryKey, value: Value) -> Self {
        Self {
            key,
            updater: Updater::replace(value),
        }
    }
}

/// Target of an invalidate or remove effect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "match", content = "key", rename_all = "snake_case")]
pub enum KeyMatch {
    /// Exactly this key, parameters included.
    Exact(QueryKey),
    /// Every key at exactly this path, whatever its parameters.
    Path(KeyPath),
    /// Every key whose path starts with this path.
    Prefix(KeyPath),
}

impl KeyMatch {
    pub fn matches(&self, key: &QueryKey) -> bool {
        match self {
            KeyMatch::Exact(exact) => exact == key,
            KeyMatch::Path(path) => key.path() == path,
            KeyMatch::Prefix(prefix) => key.matches_path(prefix),
        }
    }

    /// Path the match is anchored on.
    pub fn path(&self) -> &KeyPath {
        match self {
            KeyMatch::Exact(key) => key.path(),
            KeyMatch::Path(path) | KeyMatch::Prefix(path) => path,
        }
    }
}

impl fmt::Display for KeyMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyMatch::Exact(key) => write!(f, "{key}"),
            KeyMatch::Path(path) => write!(f, "{path}"),
            KeyMatch::Prefix(path) => write!(f, "{path}*"),
        }
    }
}

/// Updates, invalidations and removals produced by one successful mutation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheEffectSet {
    pub update: Vec<CacheUpdate>,
    pub invalidate: Vec<KeyMatch>,
    pub remove: Vec<KeyMatch>,
}

impl fmt::Display for CacheEffectSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheEffectSet {{ update: {}, invalidate: {}, remove: {} }}",
            self.update.len(),
            self.invalidate.len(),
            self.remove.len(),
        )
    }
}

impl CacheEffectSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.update.is_empty() && self.invalidate.is_empty() && self.remove.is_empty()
    }

    #[must_use]
    pub fn with_update(mut self, update: CacheUpdate) -> Self {
        self.update.push(update);
        self
    }

    #[must_use]
    pub fn with_invalidate(mut self, target: KeyMatch) -> Self {
        self.invalidate.push(target);
        self
    }

    #[must_use]
    pub fn with_remove(mut self, target: KeyMatch) -> Self {
        self.remove.push(target);
        self
    }

    /// Append every effect of `other`, keeping order.
    #[must_use]
    pub fn merge(mut self, other: CacheEffectSet) -> Self {
        self.update.extend(other.update);
        self.invalidate.extend(other.invalidate);
        self.remove.extend(other.remove);
        self
    }

    /// Every path any effect in the set is anchored on.
    pub fn paths(&self) -> impl Iterator<Item = &KeyPath> {
        self.update
            .iter()
            .map(|update| update.key.path())
            .chain(self.invalidate.iter().map(KeyMatch::path))
            .chain(self.remove.iter().map(KeyMatch::path))
    }
}
