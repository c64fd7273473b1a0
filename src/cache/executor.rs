//! Cache executor for applying effect sets.

use std::sync::Arc;
use std::time::Instant;

use metrics::histogram;
use tracing::{debug, info};

use super::effects::CacheEffectSet;
use super::store::QueryCache;

const METRIC_CACHE_APPLY_MS: &str = "storefront_cache_apply_ms";

/// Outcome of one [`CacheExecutor::apply`] call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ApplyReport {
    /// Updates that wrote a value.
    pub updated: usize,
    /// Updates whose updater declined (e.g. element not in a cached list).
    pub skipped: usize,
    /// Entries marked stale.
    pub invalidated: usize,
    /// Entries deleted.
    pub removed: usize,
}

/// Applies [`CacheEffectSet`]s to a [`QueryCache`].
///
/// One call is one critical section: the write lock is held from the first
/// update to the last removal, so no other effect set interleaves with it.
/// Within a set the order is fixed: updates, then invalidations, then
/// removals.
#[derive(Clone)]
pub struct CacheExecutor {
    cache: Arc<QueryCache>,
}

impl CacheExecutor {
    pub fn new(cache: Arc<QueryCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn apply(&self, effects: &CacheEffectSet) -> ApplyReport {
        let mut report = ApplyReport::default();
        if effects.is_empty() {
            debug!("Cache effect set empty, nothing to apply");
            return report;
        }

        let started_at = Instant::now();
        let mut writer = self.cache.write();

        for update in &effects.update {
            if writer.update(update.key.clone(), &update.updater) {
                report.updated += 1;
            } else {
                report.skipped += 1;
            }
        }
        for target in &effects.invalidate {
            report.invalidated += writer.invalidate(target);
        }
        for target in &effects.remove {
            report.removed += writer.remove(target);
        }

        writer.commit();

        info!(
            effects = %effects,
            updated = report.updated,
            skipped = report.skipped,
            invalidated = report.invalidated,
            removed = report.removed,
            "Cache effects applied"
        );
        histogram!(METRIC_CACHE_APPLY_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);

        report
    }
}
