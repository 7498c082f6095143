//! Forest coordinate resolution.
//!
//! [`GeocodeResolver`] runs a cached, retrying cascade over the official
//! forest-boundary service, Google, and Nominatim, filtering implausible
//! answers and keeping a full attempt trail for every forest.

pub mod budget;
pub mod cache;
pub mod error;
pub mod providers;
pub mod query;
pub mod resolver;
pub(crate) mod retry;
pub mod types;

pub use budget::LookupBudget;
pub use cache::{CacheKey, GeocodeCache, KeyValueStore, MemoryStore, SqliteStore};
pub use error::{GeocodeError, StoreError};
pub use providers::nominatim::LocalInstance;
pub use query::query_candidates;
pub use resolver::{ForestResolution, GeocodeResolver, GeocodeSettings};
pub use types::{
    ForestCoordinates, ForestQuery, GeocodeHit, GeocodeProvider, LookupAttempt, LookupOutcome,
};
