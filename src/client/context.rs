//! Cache lifetime: explicit setup and teardown.

use std::sync::Arc;

use tracing::info;

use crate::cache::{CacheConfig, QueryCache};

/// Owner of one query cache.
///
/// Every [`super::QueryClient`] built from the same context shares its cache.
/// Nothing is global: two contexts never see each other's entries.
pub struct QueryContext {
    cache: Arc<QueryCache>,
    config: CacheConfig,
}

impl QueryContext {
    pub fn new(config: CacheConfig) -> Self {
        info!(
            enabled = config.enabled,
            max_entries = config.max_entries,
            "Query cache initialized"
        );
        Self {
            cache: Arc::new(QueryCache::new(&config)),
            config,
        }
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Drop every cached entry. Subscribers see a `Cleared` event.
    pub fn teardown(&self) {
        let entries = self.cache.len();
        self.cache.clear();
        info!(entries, "Query cache torn down");
    }
}

impl Default for QueryContext {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::cache::{KeyPath, QueryKey};
    use crate::params::Params;

    #[test]
    fn contexts_do_not_share_entries() {
        let first = QueryContext::default();
        let second = QueryContext::default();
        let key = QueryKey::new(KeyPath::root(), Params::new());

        first.cache().set(key.clone(), json!(1));

        assert!(second.cache().peek(&key).is_none());
        first.teardown();
        assert!(first.cache().is_empty());
    }
}
