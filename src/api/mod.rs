//! Operation catalogue.
//!
//! Queries describe how a read is addressed in the cache ([`QueryDefinition`]).
//! Mutations describe what a successful write does to the cache
//! ([`CacheUpdateMatrix`]). Both are closed enums per resource family, so a
//! new operation without a cache entry does not compile.

pub mod baskets;
pub mod customers;
pub mod orders;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;

pub use baskets::{BasketMutation, BasketQuery};
pub use customers::{CustomerMutation, CustomerQuery};
pub use orders::{OrderMutation, OrderQuery};

use crate::cache::{CacheEffectSet, KeyPath, QueryKey};
use crate::error::QueryError;
use crate::params::{OperationSchema, Params, narrow};

/// Options handed to the API client for one call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequestOptions {
    pub parameters: Params,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl RequestOptions {
    pub fn new(parameters: Params) -> Self {
        Self {
            parameters,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Same headers and body, different parameters.
    pub(crate) fn with_parameters(&self, parameters: Params) -> Self {
        Self {
            parameters,
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }
}

/// A read operation and the shape of its cache key.
pub trait QueryDefinition {
    fn schema(&self) -> &'static OperationSchema;

    /// Literal/identifier part of the key.
    fn path(&self, params: &Params) -> KeyPath;

    /// Full key: `path` plus `params` narrowed to the schema.
    fn key(&self, params: &Params) -> QueryKey {
        QueryKey::new(self.path(params), narrow(params, self.schema()))
    }

    fn name(&self) -> &'static str {
        self.schema().name
    }
}

/// Cache maintenance of one mutating operation.
pub trait CacheUpdateMatrix {
    fn schema(&self) -> &'static OperationSchema;

    /// Effects of a successful call.
    ///
    /// `request.parameters` holds the merged, not narrowed, parameters so that
    /// keys of other queries keep parameters this operation does not accept.
    /// Must be pure: the same inputs always yield the same set.
    fn cache_effects(
        &self,
        customer_id: Option<&str>,
        request: &RequestOptions,
        response: &Value,
    ) -> CacheEffectSet;

    fn name(&self) -> &'static str {
        self.schema().name
    }
}

/// Any read operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Query {
    Basket(BasketQuery),
    Order(OrderQuery),
    Customer(CustomerQuery),
}

impl Query {
    pub fn all() -> impl Iterator<Item = Query> {
        BasketQuery::ALL
            .iter()
            .copied()
            .map(Query::Basket)
            .chain(OrderQuery::ALL.iter().copied().map(Query::Order))
            .chain(CustomerQuery::ALL.iter().copied().map(Query::Customer))
    }

    pub fn from_name(name: &str) -> Result<Self, QueryError> {
        Self::all()
            .find(|query| query.name() == name)
            .ok_or_else(|| QueryError::UnknownQuery(name.to_string()))
    }
}

impl QueryDefinition for Query {
    fn schema(&self) -> &'static OperationSchema {
        match self {
            Query::Basket(query) => query.schema(),
            Query::Order(query) => query.schema(),
            Query::Customer(query) => query.schema(),
        }
    }

    fn path(&self, params: &Params) -> KeyPath {
        match self {
            Query::Basket(query) => query.path(params),
            Query::Order(query) => query.path(params),
            Query::Customer(query) => query.path(params),
        }
    }
}

impl From<BasketQuery> for Query {
    fn from(query: BasketQuery) -> Self {
        Query::Basket(query)
    }
}

impl From<OrderQuery> for Query {
    fn from(query: OrderQuery) -> Self {
        Query::Order(query)
    }
}

impl From<CustomerQuery> for Query {
    fn from(query: CustomerQuery) -> Self {
        Query::Customer(query)
    }
}

impl FromStr for Query {
    type Err = QueryError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::from_name(name)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Any write operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutation {
    Basket(BasketMutation),
    Order(OrderMutation),
    Customer(CustomerMutation),
}

impl Mutation {
    pub fn all() -> impl Iterator<Item = Mutation> {
        BasketMutation::ALL
            .iter()
            .copied()
            .map(Mutation::Basket)
            .chain(OrderMutation::ALL.iter().copied().map(Mutation::Order))
            .chain(CustomerMutation::ALL.iter().copied().map(Mutation::Customer))
    }

    /// Look up a mutation by operation name.
    ///
    /// Names without a matrix entry fail with
    /// [`QueryError::UnimplementedMutation`].
    pub fn from_name(name: &str) -> Result<Self, QueryError> {
        Self::all()
            .find(|mutation| mutation.name() == name)
            .ok_or_else(|| QueryError::UnimplementedMutation(name.to_string()))
    }
}

impl CacheUpdateMatrix for Mutation {
    fn schema(&self) -> &'static OperationSchema {
        match self {
            Mutation::Basket(mutation) => mutation.schema(),
            Mutation::Order(mutation) => mutation.schema(),
            Mutation::Customer(mutation) => mutation.schema(),
        }
    }

    fn cache_effects(
        &self,
        customer_id: Option<&str>,
        request: &RequestOptions,
        response: &Value,
    ) -> CacheEffectSet {
        match self {
            Mutation::Basket(mutation) => mutation.cache_effects(customer_id, request, response),
            Mutation::Order(mutation) => mutation.cache_effects(customer_id, request, response),
            Mutation::Customer(mutation) => mutation.cache_effects(customer_id, request, response),
        }
    }
}

impl From<BasketMutation> for Mutation {
    fn from(mutation: BasketMutation) -> Self {
        Mutation::Basket(mutation)
    }
}

impl From<OrderMutation> for Mutation {
    fn from(mutation: OrderMutation) -> Self {
        Mutation::Order(mutation)
    }
}

impl From<CustomerMutation> for Mutation {
    fn from(mutation: CustomerMutation) -> Self {
        Mutation::Customer(mutation)
    }
}

impl FromStr for Mutation {
    type Err = QueryError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::from_name(name)
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
