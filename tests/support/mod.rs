//! Scripted in-memory API client shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use storefront_query::cache::CacheConfig;
use storefront_query::{
    ApiClient, ClientError, IdentityProvider, Params, QueryClient, QueryContext, RequestOptions,
};

#[derive(Debug, Clone)]
pub struct Call {
    pub operation: &'static str,
    pub options: RequestOptions,
}

/// Answers each operation from a per-operation queue of scripted results.
#[derive(Default)]
pub struct ScriptedApi {
    responses: Mutex<HashMap<&'static str, VecDeque<Result<Value, ClientError>>>>,
    stalled: Mutex<HashSet<&'static str>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, operation: &'static str, value: Value) {
        self.push(operation, Ok(value));
    }

    pub fn fail(&self, operation: &'static str, error: ClientError) {
        self.push(operation, Err(error));
    }

    /// Calls to `operation` never complete.
    pub fn stall(&self, operation: &'static str) {
        self.stalled
            .lock()
            .expect("stalled lock")
            .insert(operation);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.operation == operation)
            .count()
    }

    fn push(&self, operation: &'static str, result: Result<Value, ClientError>) {
        self.responses
            .lock()
            .expect("responses lock")
            .entry(operation)
            .or_default()
            .push_back(result);
    }
}

#[async_trait]
impl ApiClient for ScriptedApi {
    async fn call(
        &self,
        operation: &'static str,
        options: &RequestOptions,
    ) -> Result<Value, ClientError> {
        self.calls.lock().expect("calls lock").push(Call {
            operation,
            options: options.clone(),
        });

        let stalled = self
            .stalled
            .lock()
            .expect("stalled lock")
            .contains(operation);
        if stalled {
            futures::future::pending::<()>().await;
        }

        self.responses
            .lock()
            .expect("responses lock")
            .get_mut(operation)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(ClientError::status(404, format!("no script for {operation}"))))
    }
}

pub fn defaults() -> Params {
    Params::new()
        .with("organizationId", "f_ecom_zzrf_001")
        .with("siteId", "RefArch")
        .with("locale", "en-US")
        .with("currency", "USD")
}

pub fn client_with(
    config: CacheConfig,
    api: Arc<ScriptedApi>,
    identity: Arc<dyn IdentityProvider>,
) -> (QueryContext, QueryClient) {
    let context = QueryContext::new(config);
    let client = QueryClient::new(&context, api, identity, defaults());
    (context, client)
}

pub fn client(
    api: Arc<ScriptedApi>,
    identity: Arc<dyn IdentityProvider>,
) -> (QueryContext, QueryClient) {
    client_with(CacheConfig::default(), api, identity)
}
