//! Mutation execution and cache maintenance after a successful call.

use metrics::counter;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::QueryClient;
use crate::api::{CacheUpdateMatrix, Mutation, RequestOptions};
use crate::cache::{ApplyReport, CacheEffectSet};
use crate::error::QueryError;
use crate::params::{ensure_required, merge, narrow};

const METRIC_MUTATION_FAILED: &str = "storefront_mutation_failed_total";

/// A mutation bound to a client.
#[derive(Clone)]
pub struct MutationHandle {
    client: QueryClient,
    mutation: Mutation,
}

impl MutationHandle {
    pub(super) fn new(client: QueryClient, mutation: Mutation) -> Self {
        Self { client, mutation }
    }

    pub fn mutation(&self) -> Mutation {
        self.mutation
    }

    /// Send the mutation and, on success, bring the cache in line with it.
    ///
    /// Missing required parameters fail before anything is sent. A failed
    /// call leaves the cache untouched.
    #[instrument(skip_all, fields(mutation = %self.mutation))]
    pub async fn execute(&self, options: RequestOptions) -> Result<Value, QueryError> {
        let schema = self.mutation.schema();
        let merged = merge(self.client.defaults(), &options.parameters);
        ensure_required(&merged, schema)?;

        let request = options.with_parameters(narrow(&merged, schema));
        let response = match self.client.api().call(schema.name, &request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "Mutation failed, cache left untouched");
                counter!(METRIC_MUTATION_FAILED, "operation" => schema.name).increment(1);
                return Err(err.into());
            }
        };

        let customer_id = self.client.customer_id();
        let effects = self.mutation.cache_effects(
            customer_id.as_deref(),
            &options.with_parameters(merged),
            &response,
        );
        self.apply(&effects);

        Ok(response)
    }

    fn apply(&self, effects: &CacheEffectSet) -> ApplyReport {
        if !self.client.cache_enabled() {
            debug!(effects = %effects, "Query cache disabled, effects dropped");
            return ApplyReport::default();
        }
        self.client.executor().apply(effects)
    }
}
