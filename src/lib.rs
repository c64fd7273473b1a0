//! Query hooks and cache-coherence maintenance for a generated shopper
//! commerce API client.
//!
//! Reads go through [`client::QueryClient::fetch`], which caches results under
//! hierarchical [`cache::QueryKey`]s. Every successful mutation is mapped by
//! [`api::CacheUpdateMatrix`] to a [`cache::CacheEffectSet`] that the
//! [`cache::CacheExecutor`] applies in one critical section.

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod identity;
pub mod infra;
pub mod params;

pub use api::{CacheUpdateMatrix, Mutation, Query, QueryDefinition, RequestOptions};
pub use client::{ApiClient, MutationHandle, QueryClient, QueryContext};
pub use error::{ClientError, QueryError};
pub use identity::{CustomerSession, Guest, IdentityProvider};
pub use params::{ParamValue, Params};
