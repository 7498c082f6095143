use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use chrono::{TimeDelta, Utc};

use super::*;
use crate::error::StoreError;
use crate::types::GeocodeProvider;

fn badja_hit() -> GeocodeHit {
    GeocodeHit::new(
        -35.89,
        149.57,
        "Badja State Forest",
        1.0,
        GeocodeProvider::ForestService,
    )
}

/// Reports corruption on the first `failures` puts, then behaves.
struct FlakyStore {
    inner: MemoryStore,
    failures: AtomicU32,
    resets: AtomicU32,
}

impl FlakyStore {
    fn new(failures: u32) -> Self {
        Self {
            inner: MemoryStore::new(),
            failures: AtomicU32::new(failures),
            resets: AtomicU32::new(0),
        }
    }
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(StoreError::Corrupt("attempt to write a readonly database".into()));
        }
        self.inner.put(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.inner.delete(key)
    }

    fn reset(&self) -> Result<(), StoreError> {
        self.resets.fetch_add(1, Ordering::SeqCst);
        self.inner.reset()
    }
}

#[test]
fn keys_are_namespaced_and_normalized() {
    assert_eq!(
        CacheKey::query("  Badja   State Forest ").to_string(),
        "query:badja state forest"
    );
    assert_eq!(
        CacheKey::alias("Badja State Forest (Pine Plantations)").to_string(),
        "alias:badja"
    );
    assert!(CacheKey::alias("State Forest").to_string().starts_with("alias:"));
}

#[tokio::test]
async fn round_trip_before_ttl_expiry() {
    let cache = GeocodeCache::new(MemoryStore::new(), Some(3_600));
    let key = CacheKey::query("Badja State Forest");
    let hit = badja_hit();
    cache.put(&key, &hit).await.unwrap();
    assert_eq!(cache.get(&key).await, Some(hit));
}

#[tokio::test]
async fn expired_entry_is_absent_and_deleted() {
    let cache = GeocodeCache::new(MemoryStore::new(), Some(60));
    let key = CacheKey::alias("Badja");
    let mut hit = badja_hit();
    hit.updated_at = Utc::now() - TimeDelta::seconds(120);
    cache.put(&key, &hit).await.unwrap();

    assert_eq!(cache.get(&key).await, None);
    assert!(cache.store().is_empty());
}

#[tokio::test]
async fn no_ttl_keeps_old_entries() {
    let cache = GeocodeCache::new(MemoryStore::new(), None);
    let key = CacheKey::alias("Badja");
    let mut hit = badja_hit();
    hit.updated_at = Utc::now() - TimeDelta::days(3_650);
    cache.put(&key, &hit).await.unwrap();
    assert_eq!(cache.get(&key).await, Some(hit));
}

#[tokio::test]
async fn undecodable_entry_is_discarded() {
    let cache = GeocodeCache::new(MemoryStore::new(), None);
    cache.store().put("alias:badja", "not json").unwrap();
    assert_eq!(cache.get(&CacheKey::alias("Badja")).await, None);
    assert!(cache.store().is_empty());
}

#[tokio::test]
async fn promote_copies_query_hit_to_alias() {
    let cache = GeocodeCache::new(MemoryStore::new(), None);
    let query = CacheKey::query("Badja");
    let alias = CacheKey::alias("Badja State Forest");
    assert_eq!(cache.promote_to_alias(&query, &alias).await.unwrap(), None);

    cache.put(&query, &badja_hit()).await.unwrap();
    let promoted = cache.promote_to_alias(&query, &alias).await.unwrap();
    assert_eq!(promoted, cache.get(&query).await);
    assert_eq!(cache.get(&alias).await, cache.get(&query).await);
}

#[tokio::test]
async fn corrupted_write_recreates_store_and_retries_once() {
    let store = Arc::new(FlakyStore::new(1));
    let cache = GeocodeCache::new(Arc::clone(&store), None);
    let key = CacheKey::alias("Badja");

    cache.put(&key, &badja_hit()).await.unwrap();
    assert_eq!(store.resets.load(Ordering::SeqCst), 1);
    assert!(cache.get(&key).await.is_some());
}

#[tokio::test]
async fn persistent_corruption_propagates() {
    let store = Arc::new(FlakyStore::new(2));
    let cache = GeocodeCache::new(Arc::clone(&store), None);

    let err = cache
        .put(&CacheKey::alias("Badja"), &badja_hit())
        .await
        .unwrap_err();
    assert!(matches!(err, GeocodeError::StorageCorruption(_)));
    assert_eq!(store.resets.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn sqlite_backed_cache_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("geocode-cache.sqlite");
    let key = CacheKey::query("Badja State Forest");
    let hit = badja_hit();
    {
        let cache = GeocodeCache::new(SqliteStore::open(&path).unwrap(), None);
        cache.put(&key, &hit).await.unwrap();
    }
    let cache = GeocodeCache::new(SqliteStore::open(&path).unwrap(), None);
    assert_eq!(cache.get(&key).await, Some(hit));
}

/// Records which thread served the last read.
#[derive(Default)]
struct ThreadRecordingStore {
    inner: MemoryStore,
    reader: std::sync::Mutex<Option<std::thread::ThreadId>>,
}

impl KeyValueStore for ThreadRecordingStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        *self.reader.lock().unwrap() = Some(std::thread::current().id());
        self.inner.get(key)
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner.put(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.inner.delete(key)
    }

    fn reset(&self) -> Result<(), StoreError> {
        self.inner.reset()
    }
}

#[tokio::test]
async fn store_calls_run_off_the_async_thread() {
    let cache = GeocodeCache::new(ThreadRecordingStore::default(), None);
    assert_eq!(cache.get(&CacheKey::alias("Badja")).await, None);

    let reader = cache.store().reader.lock().unwrap().expect("store was read");
    assert_ne!(reader, std::thread::current().id());
}
