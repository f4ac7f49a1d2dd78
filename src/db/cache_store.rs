// src/db/cache_store.rs
// DOCUMENTATION: Local cache of fetched places
// PURPOSE: Key-value persistence of CacheEntry records keyed by place id

use crate::errors::PlacesError;
use crate::models::{CacheEntry, PhotoReference, Place};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use std::collections::BTreeSet;
use tokio::sync::Mutex;

/// Key-value store of previously fetched places
/// DOCUMENTATION: Lookup by identifier only. Absence is a normal outcome,
/// never an error. Implementations allow concurrent reads and serialize
/// writes.
#[async_trait]
pub trait LocalCacheStore: Send + Sync {
    /// Entry for the place, if one was stored
    async fn get(&self, place_id: &str) -> Option<CacheEntry>;

    /// Insert or overwrite the entry for `entry.place.id()`
    async fn put(&self, entry: CacheEntry) -> Result<(), PlacesError>;

    /// Remove the entry; a missing entry is not an error
    async fn delete(&self, place_id: &str) -> Result<(), PlacesError>;

    /// Number of stored entries
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Row of the cached_places table
/// DOCUMENTATION: Tags and photo references are stored as JSON text.
/// Photo bytes are never stored.
#[derive(Debug, FromRow)]
struct CachedPlaceRow {
    id: String,
    name: String,
    tags: String,
    photos: String,
    fetched_at: DateTime<Utc>,
}

impl CachedPlaceRow {
    fn into_entry(self) -> Result<CacheEntry, serde_json::Error> {
        let tags: BTreeSet<String> = serde_json::from_str(&self.tags)?;
        let photos: Vec<PhotoReference> = serde_json::from_str(&self.photos)?;
        let place = Place::new(self.id, self.name).with_tags(tags).with_photos(photos);
        Ok(CacheEntry::with_timestamp(place, self.fetched_at))
    }
}

/// SQLite-backed LocalCacheStore
/// DOCUMENTATION: One table, primary key on the place id. Writers queue on
/// a mutex so only one write is in flight at a time; reads go straight to
/// the pool.
pub struct SqliteCacheStore {
    pool: SqlitePool,
    write_lock: Mutex<()>,
}

impl SqliteCacheStore {
    /// Wrap a pool, creating the table when missing
    pub async fn new(pool: SqlitePool) -> Result<Self, PlacesError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cached_places (
                id          TEXT PRIMARY KEY NOT NULL,
                name        TEXT NOT NULL,
                tags        TEXT NOT NULL,
                photos      TEXT NOT NULL,
                fetched_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| {
            log::error!("Failed to create cached_places table: {}", e);
            PlacesError::Storage(e.to_string())
        })?;

        Ok(Self {
            pool,
            write_lock: Mutex::new(()),
        })
    }
}

#[async_trait]
impl LocalCacheStore for SqliteCacheStore {
    async fn get(&self, place_id: &str) -> Option<CacheEntry> {
        let row = sqlx::query_as::<_, CachedPlaceRow>(
            "SELECT id, name, tags, photos, fetched_at FROM cached_places WHERE id = ?",
        )
        .bind(place_id)
        .fetch_optional(&self.pool)
        .await;

        match row {
            Ok(Some(row)) => match row.into_entry() {
                Ok(entry) => {
                    log::debug!("Cache HIT for place: {}", place_id);
                    Some(entry)
                }
                Err(e) => {
                    log::warn!("Discarding unreadable cache row {}: {}", place_id, e);
                    None
                }
            },
            Ok(None) => {
                log::debug!("Cache MISS for place: {}", place_id);
                None
            }
            Err(e) => {
                log::error!("Cache read failed for {}: {}", place_id, e);
                None
            }
        }
    }

    async fn put(&self, entry: CacheEntry) -> Result<(), PlacesError> {
        let tags = serde_json::to_string(&entry.place.tags)
            .map_err(|e| PlacesError::Storage(format!("Encode tags failed: {}", e)))?;
        let photos = serde_json::to_string(&entry.place.photos)
            .map_err(|e| PlacesError::Storage(format!("Encode photos failed: {}", e)))?;

        let _guard = self.write_lock.lock().await;

        sqlx::query(
            r#"
            INSERT INTO cached_places (id, name, tags, photos, fetched_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE
            SET name = excluded.name,
                tags = excluded.tags,
                photos = excluded.photos,
                fetched_at = excluded.fetched_at
            "#,
        )
        .bind(entry.id())
        .bind(&entry.place.name)
        .bind(tags)
        .bind(photos)
        .bind(entry.fetched_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            log::error!("Failed to cache place {}: {}", entry.id(), e);
            PlacesError::Storage(format!("Write failed: {}", e))
        })?;

        log::debug!("Cache SET for place: {}", entry.id());
        Ok(())
    }

    async fn delete(&self, place_id: &str) -> Result<(), PlacesError> {
        let _guard = self.write_lock.lock().await;

        let result = sqlx::query("DELETE FROM cached_places WHERE id = ?")
            .bind(place_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                log::error!("Failed to delete cached place {}: {}", place_id, e);
                PlacesError::Storage(format!("Delete failed: {}", e))
            })?;

        if result.rows_affected() > 0 {
            log::debug!("Cache DELETE for place: {}", place_id);
        }
        Ok(())
    }

    async fn len(&self) -> usize {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM cached_places")
            .fetch_one(&self.pool)
            .await
            .map(|count| count as usize)
            .unwrap_or_else(|e| {
                log::error!("Cache count failed: {}", e);
                0
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{init_db_pool, Config};
    use chrono::TimeZone;

    async fn memory_store() -> SqliteCacheStore {
        let config = Config {
            database_url: "sqlite::memory:".to_string(),
            ..Config::default()
        };
        let pool = init_db_pool(&config).await.unwrap();
        SqliteCacheStore::new(pool).await.unwrap()
    }

    fn sample_entry() -> CacheEntry {
        let place = Place::new("ChIJWV3PC2PzT0YR-_gAuGdqTNQ", "Kamppi")
            .with_tags(["shopping_mall", "point_of_interest"])
            .with_photos(vec![PhotoReference {
                name: "places/ChIJWV3PC2PzT0YR-_gAuGdqTNQ/photos/AUc7".to_string(),
                attribution: Some("Jane Doe".to_string()),
                width_px: Some(4032),
                height_px: Some(3024),
            }]);
        let fetched_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        CacheEntry::with_timestamp(place, fetched_at)
    }

    #[tokio::test]
    async fn test_put_then_get_returns_same_entry() {
        let store = memory_store().await;
        let entry = sample_entry();

        store.put(entry.clone()).await.unwrap();

        assert_eq!(store.get(entry.id()).await, Some(entry));
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let store = memory_store().await;
        assert!(store.get("ChIJnothing").await.is_none());
    }

    #[tokio::test]
    async fn test_repeated_put_is_idempotent() {
        let store = memory_store().await;
        let entry = sample_entry();

        store.put(entry.clone()).await.unwrap();
        let after_one = (store.len().await, store.get(entry.id()).await);

        store.put(entry.clone()).await.unwrap();
        let after_two = (store.len().await, store.get(entry.id()).await);

        assert_eq!(after_one, after_two);
        assert_eq!(after_two.0, 1);
    }

    #[tokio::test]
    async fn test_put_overwrites_by_id() {
        let store = memory_store().await;
        let entry = sample_entry();
        store.put(entry.clone()).await.unwrap();

        let mut renamed = entry.place.clone();
        renamed.name = "Kamppi Center".to_string();
        renamed.photos.clear();
        store.put(CacheEntry::new(renamed.clone())).await.unwrap();

        let stored = store.get(entry.id()).await.unwrap();
        assert_eq!(stored.place, renamed);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_delete_absent_key_leaves_store_unchanged() {
        let store = memory_store().await;
        let entry = sample_entry();
        store.put(entry.clone()).await.unwrap();

        store.delete("ChIJnothing").await.unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(store.get(entry.id()).await, Some(entry.clone()));

        store.delete(entry.id()).await.unwrap();
        store.delete(entry.id()).await.unwrap();
        assert!(store.is_empty().await);
    }
}
