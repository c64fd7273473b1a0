//! Query and mutation entry points.
//!
//! [`QueryClient`] reads through the query cache and, after every successful
//! mutation, applies the mutation's cache effects. Transport is delegated to
//! an [`ApiClient`].

mod context;
mod mutation;
mod observer;

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

pub use context::QueryContext;
pub use mutation::MutationHandle;
pub use observer::{Observed, QueryObserver, QuerySubscription};

use crate::api::{Mutation, Query, QueryDefinition, RequestOptions};
use crate::cache::{CacheConfig, CacheEntry, CacheExecutor, QueryCache, QueryKey};
use crate::error::{ClientError, QueryError};
use crate::identity::IdentityProvider;
use crate::params::{Params, ensure_required, merge};

/// Generated shopper API client.
///
/// `options.parameters` arrive narrowed to the operation's allow-list.
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn call(
        &self,
        operation: &'static str,
        options: &RequestOptions,
    ) -> Result<Value, ClientError>;
}

#[derive(Clone)]
pub struct QueryClient {
    api: Arc<dyn ApiClient>,
    executor: CacheExecutor,
    identity: Arc<dyn IdentityProvider>,
    defaults: Params,
    config: CacheConfig,
}

impl QueryClient {
    pub fn new(
        context: &QueryContext,
        api: Arc<dyn ApiClient>,
        identity: Arc<dyn IdentityProvider>,
        defaults: Params,
    ) -> Self {
        Self {
            api,
            executor: CacheExecutor::new(Arc::clone(context.cache())),
            identity,
            defaults,
            config: context.config().clone(),
        }
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        self.executor.cache()
    }

    pub fn defaults(&self) -> &Params {
        &self.defaults
    }

    /// Key `query` would be cached under for `params`.
    pub fn key(&self, query: impl Into<Query>, params: &Params) -> Result<QueryKey, QueryError> {
        let query = query.into();
        let merged = merge(&self.defaults, params);
        ensure_required(&merged, query.schema())?;
        Ok(query.key(&merged))
    }

    /// Read-through fetch: a fresh cached value is returned as is, anything
    /// else goes to the API and is cached on success.
    pub async fn fetch(
        &self,
        query: impl Into<Query>,
        params: &Params,
    ) -> Result<Value, QueryError> {
        self.fetch_query(query.into(), params).await
    }

    /// [`QueryClient::fetch`] decoded into `T`.
    pub async fn fetch_as<T: DeserializeOwned>(
        &self,
        query: impl Into<Query>,
        params: &Params,
    ) -> Result<T, QueryError> {
        let value = self.fetch(query, params).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Fetch from the API regardless of what is cached.
    pub async fn refetch(
        &self,
        query: impl Into<Query>,
        params: &Params,
    ) -> Result<Value, QueryError> {
        let query = query.into();
        let key = self.key(query, params)?;
        self.load(query, key).await
    }

    /// Cached entry for `query`, if any, without fetching.
    pub fn cached(
        &self,
        query: impl Into<Query>,
        params: &Params,
    ) -> Result<Option<CacheEntry>, QueryError> {
        let key = self.key(query, params)?;
        Ok(self.cache().peek(&key))
    }

    /// Change notifications for one query key.
    pub fn subscribe(
        &self,
        query: impl Into<Query>,
        params: &Params,
    ) -> Result<QuerySubscription, QueryError> {
        let key = self.key(query, params)?;
        Ok(QuerySubscription::new(key, self.cache().subscribe()))
    }

    /// Subscription that refetches the query whenever it is invalidated.
    pub fn observe(
        &self,
        query: impl Into<Query>,
        params: &Params,
    ) -> Result<QueryObserver, QueryError> {
        let query = query.into();
        let subscription = self.subscribe(query, params)?;
        Ok(QueryObserver::new(
            self.clone(),
            query,
            params.clone(),
            subscription,
        ))
    }

    /// Handle for the mutation called `name`.
    ///
    /// Fails with [`QueryError::UnimplementedMutation`] when the name has no
    /// cache maintenance entry; no request is ever sent for such a name.
    pub fn mutation(&self, name: &str) -> Result<MutationHandle, QueryError> {
        let mutation = Mutation::from_name(name)?;
        Ok(self.mutate(mutation))
    }

    pub fn mutate(&self, mutation: impl Into<Mutation>) -> MutationHandle {
        MutationHandle::new(self.clone(), mutation.into())
    }

    pub(crate) fn executor(&self) -> &CacheExecutor {
        &self.executor
    }

    pub(crate) fn api(&self) -> &dyn ApiClient {
        self.api.as_ref()
    }

    pub(crate) fn customer_id(&self) -> Option<String> {
        self.identity.customer_id()
    }

    pub(crate) fn cache_enabled(&self) -> bool {
        self.config.enabled
    }

    #[instrument(skip_all, fields(query = %query))]
    async fn fetch_query(&self, query: Query, params: &Params) -> Result<Value, QueryError> {
        let key = self.key(query, params)?;

        if self.config.enabled {
            match self.cache().get(&key) {
                Some(entry) if entry.is_fresh() => {
                    debug!(key = %key, "Query served from cache");
                    return Ok(entry.value);
                }
                Some(_) => debug!(key = %key, "Cached query is stale, refetching"),
                None => debug!(key = %key, "Query not cached"),
            }
        }

        self.load(query, key).await
    }

    /// The entry is written after the response arrived; a dropped future
    /// writes nothing.
    async fn load(&self, query: Query, key: QueryKey) -> Result<Value, QueryError> {
        let request = RequestOptions::new(key.params().clone());
        let value = self.api.call(query.name(), &request).await?;

        if self.config.enabled {
            self.cache().set(key, value.clone());
        }
        Ok(value)
    }
}
