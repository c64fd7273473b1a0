//! Per-key change notifications and self-refreshing query observers.

use serde_json::Value;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use super::QueryClient;
use crate::api::Query;
use crate::cache::{CacheEvent, EventKind, QueryKey};
use crate::error::QueryError;
use crate::params::Params;

/// Cache events concerning one key.
pub struct QuerySubscription {
    key: QueryKey,
    receiver: broadcast::Receiver<CacheEvent>,
}

impl QuerySubscription {
    pub(super) fn new(key: QueryKey, receiver: broadcast::Receiver<CacheEvent>) -> Self {
        Self { key, receiver }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Next event for this key; `None` once the cache is gone.
    pub async fn next(&mut self) -> Option<CacheEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.affects(&self.key) => return Some(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(key = %self.key, skipped, "Query subscription lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

/// What a [`QueryObserver`] saw.
#[derive(Debug, Clone, PartialEq)]
pub enum Observed {
    /// Current cached value.
    Data(Value),
    /// The entry was removed or the cache cleared.
    Removed,
}

/// Keeps one query current: refetches it whenever it is invalidated.
pub struct QueryObserver {
    client: QueryClient,
    query: Query,
    params: Params,
    subscription: QuerySubscription,
}

impl QueryObserver {
    pub(super) fn new(
        client: QueryClient,
        query: Query,
        params: Params,
        subscription: QuerySubscription,
    ) -> Self {
        Self {
            client,
            query,
            params,
            subscription,
        }
    }

    pub fn key(&self) -> &QueryKey {
        self.subscription.key()
    }

    /// Wait for the next change of the observed query.
    ///
    /// Invalidation triggers a refetch whose result arrives as the following
    /// [`Observed::Data`]; with the cache disabled the refetched value is
    /// returned directly. A failed refetch is returned as the error.
    pub async fn next(&mut self) -> Option<Result<Observed, QueryError>> {
        loop {
            let event = self.subscription.next().await?;
            match event.kind {
                EventKind::Updated { .. } => {
                    if let Some(entry) = self.client.cache().peek(self.key()) {
                        return Some(Ok(Observed::Data(entry.value)));
                    }
                }
                EventKind::Invalidated { .. } => {
                    debug!(key = %self.key(), "Observed query invalidated, refetching");
                    match self.client.refetch(self.query, &self.params).await {
                        Err(err) => return Some(Err(err)),
                        // No entry is written, so no update event will follow.
                        Ok(value) if !self.client.cache_enabled() => {
                            return Some(Ok(Observed::Data(value)));
                        }
                        Ok(_) => {}
                    }
                }
                EventKind::Removed { .. } | EventKind::Cleared => {
                    return Some(Ok(Observed::Removed));
                }
            }
        }
    }
}
