//! Geocode hit cache with query and alias key namespaces.
//!
//! A hit is stored under `query:<query text>` for the exact string sent to a
//! provider and under `alias:<forest key>` for the forest it resolved. TTL is
//! enforced on read. Writes that hit a corrupted store trigger one store
//! recreation and retry before failing. Store calls run on the blocking pool.

mod store;

use std::fmt;
use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use firesite_matching::normalize_name;

use crate::error::{GeocodeError, StoreError};
use crate::types::GeocodeHit;

pub use store::{KeyValueStore, MemoryStore, SqliteStore};

/// A cache key in one of the two namespaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Normalized query text sent to a provider.
    Query(String),
    /// Normalized forest identity.
    Alias(String),
}

impl CacheKey {
    /// Query key: lowercased with whitespace collapsed. Suffixes are kept
    /// because providers answer "X" and "X State Forest" differently.
    #[must_use]
    pub fn query(text: &str) -> Self {
        CacheKey::Query(
            text.to_lowercase()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" "),
        )
    }

    #[must_use]
    pub fn alias(forest_name: &str) -> Self {
        CacheKey::Alias(normalize_name(forest_name))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            CacheKey::Query(k) | CacheKey::Alias(k) => k.is_empty(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Query(k) => write!(f, "query:{k}"),
            CacheKey::Alias(k) => write!(f, "alias:{k}"),
        }
    }
}

pub struct GeocodeCache<S> {
    store: Arc<S>,
    ttl: Option<TimeDelta>,
}

impl<S: KeyValueStore + 'static> GeocodeCache<S> {
    /// `ttl_secs = None` keeps entries until explicitly deleted.
    #[must_use]
    pub fn new(store: S, ttl_secs: Option<u64>) -> Self {
        let ttl = ttl_secs
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(TimeDelta::try_seconds);
        Self {
            store: Arc::new(store),
            ttl,
        }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the hit for `key`, or `None` if missing, expired, or unreadable.
    ///
    /// Expired and undecodable entries are deleted. Store read failures are
    /// logged and treated as a miss.
    pub async fn get(&self, key: &CacheKey) -> Option<GeocodeHit> {
        let storage_key = key.to_string();
        let lookup_key = storage_key.clone();
        let raw = match self.with_store(move |store| store.get(&lookup_key)).await {
            Ok(raw) => raw?,
            Err(err) => {
                tracing::warn!(key = %storage_key, error = %err, "geocode cache read failed");
                return None;
            }
        };

        let hit: GeocodeHit = match serde_json::from_str(&raw) {
            Ok(hit) => hit,
            Err(err) => {
                tracing::warn!(key = %storage_key, error = %err, "discarding undecodable cache entry");
                self.delete(key).await;
                return None;
            }
        };

        if self.is_expired(&hit) {
            tracing::debug!(key = %storage_key, updated_at = %hit.updated_at, "cache entry expired");
            self.delete(key).await;
            return None;
        }

        Some(hit)
    }

    /// Upserts `hit` under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::StorageCorruption`] if the write still fails
    /// after the store was recreated, or [`GeocodeError::Cache`] for other
    /// store failures.
    pub async fn put(&self, key: &CacheKey, hit: &GeocodeHit) -> Result<(), GeocodeError> {
        let storage_key = key.to_string();
        let value = serde_json::to_string(hit).map_err(|e| GeocodeError::Deserialize {
            context: format!("encode cache entry {storage_key}"),
            source: e,
        })?;

        let (k, v) = (storage_key.clone(), value.clone());
        match self.with_store(move |store| store.put(&k, &v)).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_corruption() => {
                tracing::warn!(
                    key = %storage_key,
                    error = %err,
                    "geocode cache store corrupted; recreating and retrying once"
                );
                self.with_store(move |store| {
                    store.reset()?;
                    store.put(&storage_key, &value)
                })
                .await
                .map_err(GeocodeError::StorageCorruption)
            }
            Err(err) => Err(GeocodeError::Cache(err)),
        }
    }

    /// Removes `key`. Failures are logged; a stale entry left behind is
    /// caught again on the next read.
    pub async fn delete(&self, key: &CacheKey) {
        let storage_key = key.to_string();
        let delete_key = storage_key.clone();
        if let Err(err) = self.with_store(move |store| store.delete(&delete_key)).await {
            tracing::warn!(key = %storage_key, error = %err, "geocode cache delete failed");
        }
    }

    /// Copies the hit stored under `query` to `alias`, returning it.
    ///
    /// The alias copy is authoritative from then on. Returns `Ok(None)` if
    /// `query` has no live entry.
    ///
    /// # Errors
    ///
    /// Propagates [`GeocodeCache::put`] failures.
    pub async fn promote_to_alias(
        &self,
        query: &CacheKey,
        alias: &CacheKey,
    ) -> Result<Option<GeocodeHit>, GeocodeError> {
        let Some(hit) = self.get(query).await else {
            return Ok(None);
        };
        self.put(alias, &hit).await?;
        Ok(Some(hit))
    }

    async fn with_store<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        F: FnOnce(&S) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(&store))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }

    fn is_expired(&self, hit: &GeocodeHit) -> bool {
        self.ttl
            .is_some_and(|ttl| Utc::now().signed_duration_since(hit.updated_at) > ttl)
    }
}

#[cfg(test)]
#[path = "cache_test.rs"]
mod tests;
