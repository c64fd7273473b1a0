//! Query cache configuration.
//!
//! Controlled by the `[cache]` section of `storefront.toml`.

use std::num::NonZeroUsize;

use serde::Deserialize;

const DEFAULT_MAX_ENTRIES: usize = 1000;
const DEFAULT_EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// When false, reads always go to the API and mutations apply no effects.
    pub enabled: bool,
    /// Maximum entries before least-recently-used eviction.
    pub max_entries: usize,
    /// Buffered change notifications per subscriber before it lags.
    pub event_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: DEFAULT_MAX_ENTRIES,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl CacheConfig {
    /// Returns the entry limit as NonZeroUsize, clamping to 1 if zero.
    pub fn max_entries_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.max_entries).unwrap_or(NonZeroUsize::MIN)
    }

    /// Broadcast capacity; tokio rejects zero so it is clamped to 1.
    pub fn event_capacity_non_zero(&self) -> usize {
        self.event_capacity.max(1)
    }
}
