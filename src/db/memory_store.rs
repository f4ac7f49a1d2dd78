// src/db/memory_store.rs
// DOCUMENTATION: In-memory place cache
// PURPOSE: LocalCacheStore without a database, for tests and ephemeral runs

use crate::db::LocalCacheStore;
use crate::errors::PlacesError;
use crate::models::CacheEntry;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Thread-safe map of place id to cache entry
/// DOCUMENTATION: Readers share the lock, writers take it exclusively.
/// Entries live until overwritten or deleted.
#[derive(Clone, Default)]
pub struct MemoryCacheStore {
    store: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LocalCacheStore for MemoryCacheStore {
    async fn get(&self, place_id: &str) -> Option<CacheEntry> {
        let store = self.store.read().await;

        match store.get(place_id) {
            Some(entry) => {
                log::debug!("Cache HIT for place: {}", place_id);
                Some(entry.clone())
            }
            None => {
                log::debug!("Cache MISS for place: {}", place_id);
                None
            }
        }
    }

    async fn put(&self, entry: CacheEntry) -> Result<(), PlacesError> {
        let mut store = self.store.write().await;
        log::debug!("Cache SET for place: {}", entry.id());
        store.insert(entry.id().to_string(), entry);
        Ok(())
    }

    async fn delete(&self, place_id: &str) -> Result<(), PlacesError> {
        let mut store = self.store.write().await;
        if store.remove(place_id).is_some() {
            log::debug!("Cache DELETE for place: {}", place_id);
        }
        Ok(())
    }

    async fn len(&self) -> usize {
        self.store.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Place;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_cache_put_get() {
        let cache = MemoryCacheStore::new();
        let entry = CacheEntry::new(Place::new("ChIJ1", "Library").with_tags(["library"]));

        cache.put(entry.clone()).await.unwrap();

        assert_eq!(cache.get("ChIJ1").await, Some(entry));
        assert_eq!(cache.get("ChIJ2").await, None);
    }

    #[tokio::test]
    async fn test_cache_overwrite_keeps_single_entry() {
        let cache = MemoryCacheStore::new();
        cache
            .put(CacheEntry::new(Place::new("ChIJ1", "Old name")))
            .await
            .unwrap();
        cache
            .put(CacheEntry::new(Place::new("ChIJ1", "New name")))
            .await
            .unwrap();

        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("ChIJ1").await.unwrap().place.name, "New name");
    }

    #[tokio::test]
    async fn test_cache_delete_is_idempotent() {
        let cache = MemoryCacheStore::new();
        cache
            .put(CacheEntry::new(Place::new("ChIJ1", "Park")))
            .await
            .unwrap();

        assert_ok!(cache.delete("ChIJ1").await);
        assert_ok!(cache.delete("ChIJ1").await);
        assert_ok!(cache.delete("never-stored").await);

        assert!(cache.is_empty().await);
    }
}
