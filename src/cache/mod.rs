//! Query cache.
//!
//! - [`QueryCache`]: in-memory LRU store of query results with staleness
//! - [`CacheEffectSet`]: declarative update/invalidate/remove effects
//! - [`CacheExecutor`]: applies effect sets as one critical section
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! max_entries = 1000
//! event_capacity = 256
//! ```

mod config;
mod effects;
mod events;
mod executor;
mod keys;
pub(crate) mod lock;
mod store;

pub use config::CacheConfig;
pub use effects::{CacheEffectSet, CacheUpdate, KeyMatch, Updater};
pub use events::{CacheEvent, CacheNotifier, Epoch, EventKind};
pub use executor::{ApplyReport, CacheExecutor};
pub use keys::{KeyPath, KeySegment, ORGANIZATIONS, QueryKey, ROOT};
pub use store::{CacheEntry, CacheWriter, EntryState, QueryCache};
