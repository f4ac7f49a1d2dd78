// src/services/lookup_orchestrator.rs
// DOCUMENTATION: Sequences lookups through the cache store and the Places client
// PURPOSE: Own the observable lookup state and hand out async result handles

use crate::db::LocalCacheStore;
use crate::errors::PlacesError;
use crate::models::{CacheEntry, NearbyQuery, PhotoData, PhotoReference, Place, PlaceField};
use crate::services::PlaceClient;
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Single-place lookup state
/// DOCUMENTATION: Errors are returned to the caller and never stored here
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "state", content = "place", rename_all = "snake_case")]
pub enum LookupState {
    #[default]
    Idle,
    Loaded(Arc<Place>),
}

impl LookupState {
    pub fn place(&self) -> Option<&Place> {
        match self {
            LookupState::Idle => None,
            LookupState::Loaded(place) => Some(&**place),
        }
    }
}

/// Photo currently on display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayedPhoto {
    /// Place the photo belongs to
    pub place_id: String,
    #[serde(skip)]
    pub data: Arc<PhotoData>,
    pub content_type: Option<String>,
    pub attribution: Option<String>,
    pub size_bytes: usize,
}

/// Everything a caller can observe
/// DOCUMENTATION: Each field is replaced wholesale by the operation that owns
/// it; nothing is patched in place
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LookupSnapshot {
    #[serde(rename = "lookup")]
    pub state: LookupState,
    pub nearby: Arc<Vec<Place>>,
    pub photo: Option<DisplayedPhoto>,
}

/// Handle to an in-flight lookup
/// DOCUMENTATION: Resolves exactly once with the operation's result.
/// Dropping the handle does not cancel the lookup.
pub struct LookupHandle<T> {
    inner: JoinHandle<Result<T, PlacesError>>,
}

impl<T> Future for LookupHandle<T> {
    type Output = Result<T, PlacesError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.inner).poll(cx).map(|joined| match joined {
            Ok(result) => result,
            Err(e) => {
                log::error!("Lookup task failed: {}", e);
                Err(PlacesError::Internal(e.to_string()))
            }
        })
    }
}

struct Inner {
    client: Arc<dyn PlaceClient>,
    cache: Arc<dyn LocalCacheStore>,
    state: watch::Sender<LookupSnapshot>,
    photo_max_width: u32,
    photo_max_height: u32,
}

/// Lookup orchestrator
/// DOCUMENTATION: Cheap to clone; clones share state. Every operation is
/// spawned onto the runtime and returns a LookupHandle. Concurrent calls are
/// not ordered: whichever finishes last owns the observable state. No retry,
/// one failure ends that call and leaves the state untouched.
#[derive(Clone)]
pub struct LookupOrchestrator {
    inner: Arc<Inner>,
}

impl LookupOrchestrator {
    pub fn new(client: Arc<dyn PlaceClient>, cache: Arc<dyn LocalCacheStore>) -> Self {
        let (state, _) = watch::channel(LookupSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                client,
                cache,
                state,
                photo_max_width: 500,
                photo_max_height: 300,
            }),
        }
    }

    /// Bounding box used by get_place_photo
    /// DOCUMENTATION: Must be set before the orchestrator is cloned
    pub fn with_photo_bounds(mut self, max_width: u32, max_height: u32) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.photo_max_width = max_width;
            inner.photo_max_height = max_height;
        } else {
            log::warn!("Photo bounds ignored: orchestrator already shared");
        }
        self
    }

    /// Current observable state
    pub fn snapshot(&self) -> LookupSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<LookupSnapshot> {
        self.inner.state.subscribe()
    }

    /// Look up a place, cache first
    /// DOCUMENTATION: Cache hit → Loaded with the cached place. Miss → fetch
    /// summary fields, write through, Loaded. A failed cache write is logged
    /// and does not fail the lookup.
    pub fn get_place_by_id(&self, place_id: impl Into<String>) -> LookupHandle<Place> {
        self.spawn_place_lookup(place_id.into(), true)
    }

    /// Look up a place, skipping the cache read; the fetched place
    /// overwrites any cached entry
    pub fn refresh_place(&self, place_id: impl Into<String>) -> LookupHandle<Place> {
        self.spawn_place_lookup(place_id.into(), false)
    }

    fn spawn_place_lookup(&self, place_id: String, use_cache: bool) -> LookupHandle<Place> {
        let inner = self.inner.clone();
        let inner_task = tokio::spawn(async move {
            let result = inner.load_place(&place_id, use_cache).await;
            match result {
                Ok(place) => {
                    let place = Arc::new(place);
                    inner.state.send_modify(|snapshot| {
                        snapshot.state = LookupState::Loaded(place.clone());
                    });
                    Ok(Place::clone(&place))
                }
                Err(e) => {
                    log::error!("Place lookup failed for {}: {}", place_id, e);
                    Err(e)
                }
            }
        });
        LookupHandle { inner: inner_task }
    }

    /// Nearby search
    /// DOCUMENTATION: Replaces the nearby list on success. Results are written
    /// through to the cache one by one; the nearby list itself is not cached.
    pub fn get_nearby_places(&self, query: NearbyQuery) -> LookupHandle<Vec<Place>> {
        let inner = self.inner.clone();
        let inner_task = tokio::spawn(async move {
            let places = match inner.client.search_nearby(&query).await {
                Ok(places) => places,
                Err(e) => {
                    log::error!("Nearby search failed: {}", e);
                    return Err(e);
                }
            };

            for place in &places {
                inner.write_through(place).await;
            }

            let list = Arc::new(places.clone());
            inner.state.send_modify(|snapshot| snapshot.nearby = list);

            log::info!("Nearby search loaded {} places", places.len());
            Ok(places)
        });
        LookupHandle { inner: inner_task }
    }

    /// Resolve a photo reference to bytes
    /// DOCUMENTATION: Independent of the lookup state; bytes are returned to
    /// the caller and never cached
    pub fn get_photo(
        &self,
        reference: PhotoReference,
        max_width: u32,
        max_height: u32,
    ) -> LookupHandle<PhotoData> {
        let inner = self.inner.clone();
        let inner_task = tokio::spawn(async move {
            inner
                .client
                .fetch_photo(&reference, max_width, max_height)
                .await
                .map_err(|e| {
                    log::error!("Photo fetch failed for {}: {}", reference.name, e);
                    e
                })
        });
        LookupHandle { inner: inner_task }
    }

    /// Fetch the first photo of a place and put it on display
    /// DOCUMENTATION: Asks the vendor for photo metadata only, takes the
    /// first reference and downloads it within the configured bounds.
    /// A place without photo metadata is NotFound.
    pub fn get_place_photo(&self, place_id: impl Into<String>) -> LookupHandle<PhotoData> {
        let place_id = place_id.into();
        let inner = self.inner.clone();
        let inner_task = tokio::spawn(async move {
            let result = inner.load_primary_photo(&place_id).await;
            match result {
                Ok(photo) => {
                    let data = Arc::new(photo.clone());
                    inner.state.send_modify(|snapshot| {
                        snapshot.photo = Some(DisplayedPhoto {
                            place_id: place_id.clone(),
                            content_type: data.content_type.clone(),
                            attribution: data.attribution.clone(),
                            size_bytes: data.len(),
                            data,
                        });
                    });
                    Ok(photo)
                }
                Err(e) => {
                    log::error!("Place photo lookup failed for {}: {}", place_id, e);
                    Err(e)
                }
            }
        });
        LookupHandle { inner: inner_task }
    }
}

impl Inner {
    async fn load_place(&self, place_id: &str, use_cache: bool) -> Result<Place, PlacesError> {
        if use_cache {
            if let Some(entry) = self.cache.get(place_id).await {
                log::debug!(
                    "Serving {} from cache (fetched {})",
                    place_id,
                    entry.fetched_at.to_rfc3339()
                );
                return Ok(entry.place);
            }
        }

        let place = self.client.fetch_place(place_id, PlaceField::SUMMARY).await?;
        self.write_through(&place).await;
        Ok(place)
    }

    async fn load_primary_photo(&self, place_id: &str) -> Result<PhotoData, PlacesError> {
        let place = self.client.fetch_place(place_id, PlaceField::PHOTOS).await?;

        let reference = place.primary_photo().ok_or_else(|| {
            log::warn!("No photo metadata for place {}", place_id);
            PlacesError::NotFound(format!("photo metadata for place {}", place_id))
        })?;

        self.client
            .fetch_photo(reference, self.photo_max_width, self.photo_max_height)
            .await
    }

    async fn write_through(&self, place: &Place) {
        if let Err(e) = self.cache.put(CacheEntry::new(place.clone())).await {
            log::warn!("Could not cache place {}: {}", place.id(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryCacheStore;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const TEST_PLACE_ID: &str = "ChIJWV3PC2PzT0YR-_gAuGdqTNQ";

    /// Canned client: places by id, optional per-id delay, call counter
    #[derive(Default)]
    struct FakeClient {
        places: HashMap<String, Place>,
        delays: HashMap<String, Duration>,
        fetches: AtomicUsize,
        fail_with: Option<PlacesError>,
    }

    impl FakeClient {
        fn with_place(mut self, place: Place) -> Self {
            self.places.insert(place.id().to_string(), place);
            self
        }

        fn with_delay(mut self, id: &str, delay: Duration) -> Self {
            self.delays.insert(id.to_string(), delay);
            self
        }
    }

    #[async_trait]
    impl PlaceClient for FakeClient {
        async fn search_nearby(&self, _query: &NearbyQuery) -> Result<Vec<Place>, PlacesError> {
            if let Some(e) = &self.fail_with {
                return Err(e.clone());
            }
            let mut places: Vec<Place> = self.places.values().cloned().collect();
            places.sort_by(|a, b| a.id().cmp(b.id()));
            Ok(places)
        }

        async fn fetch_place(
            &self,
            place_id: &str,
            fields: &[PlaceField],
        ) -> Result<Place, PlacesError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delays.get(place_id) {
                tokio::time::sleep(*delay).await;
            }
            if let Some(e) = &self.fail_with {
                return Err(e.clone());
            }
            let place = self
                .places
                .get(place_id)
                .cloned()
                .ok_or_else(|| PlacesError::NotFound(place_id.to_string()))?;
            if fields.contains(&PlaceField::PhotoMetadatas) {
                Ok(place)
            } else {
                Ok(place.with_photos(Vec::new()))
            }
        }

        async fn fetch_photo(
            &self,
            reference: &PhotoReference,
            max_width: u32,
            max_height: u32,
        ) -> Result<PhotoData, PlacesError> {
            Ok(PhotoData {
                bytes: format!("{}@{}x{}", reference.name, max_width, max_height).into_bytes(),
                content_type: Some("image/jpeg".to_string()),
                attribution: reference.attribution.clone(),
            })
        }
    }

    /// Store whose writes always fail and which never has anything
    struct FailingStore {
        puts: AtomicUsize,
    }

    #[async_trait]
    impl LocalCacheStore for FailingStore {
        async fn get(&self, _place_id: &str) -> Option<CacheEntry> {
            None
        }

        async fn put(&self, _entry: CacheEntry) -> Result<(), PlacesError> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            Err(PlacesError::Storage("disk I/O error".to_string()))
        }

        async fn delete(&self, _place_id: &str) -> Result<(), PlacesError> {
            Err(PlacesError::Storage("disk I/O error".to_string()))
        }

        async fn len(&self) -> usize {
            0
        }
    }

    fn test_place() -> Place {
        Place::new(TEST_PLACE_ID, "Kamppi").with_tags(["shopping_mall"])
    }

    fn orchestrator(client: FakeClient) -> (LookupOrchestrator, Arc<FakeClient>, MemoryCacheStore) {
        let client = Arc::new(client);
        let cache = MemoryCacheStore::new();
        let orchestrator = LookupOrchestrator::new(client.clone(), Arc::new(cache.clone()));
        (orchestrator, client, cache)
    }

    #[tokio::test]
    async fn test_get_place_transitions_to_loaded() {
        let (orchestrator, _, _) = orchestrator(FakeClient::default().with_place(test_place()));
        assert_eq!(orchestrator.snapshot().state, LookupState::Idle);

        let place = orchestrator.get_place_by_id(TEST_PLACE_ID).await.unwrap();

        assert_eq!(place.id(), TEST_PLACE_ID);
        let snapshot = orchestrator.snapshot();
        assert_eq!(snapshot.state.place().map(Place::id), Some(TEST_PLACE_ID));
    }

    #[tokio::test]
    async fn test_fetched_place_is_written_through() {
        let (orchestrator, _, cache) = orchestrator(FakeClient::default().with_place(test_place()));

        let place = orchestrator.get_place_by_id(TEST_PLACE_ID).await.unwrap();

        let entry = cache.get(TEST_PLACE_ID).await.unwrap();
        assert_eq!(entry.place, place);
    }

    #[tokio::test]
    async fn test_failed_cache_write_still_loads() {
        let store = Arc::new(FailingStore {
            puts: AtomicUsize::new(0),
        });
        let client = Arc::new(FakeClient::default().with_place(test_place()));
        let orchestrator = LookupOrchestrator::new(client.clone(), store.clone());

        let place = orchestrator.get_place_by_id(TEST_PLACE_ID).await.unwrap();

        assert_eq!(place.id(), TEST_PLACE_ID);
        assert_eq!(store.puts.load(Ordering::SeqCst), 1);
        assert_eq!(
            orchestrator.snapshot().state.place().map(Place::id),
            Some(TEST_PLACE_ID)
        );

        // nothing was cached, so the next lookup goes back to the client
        orchestrator.get_place_by_id(TEST_PLACE_ID).await.unwrap();
        assert_eq!(client.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_client() {
        let (orchestrator, client, cache) =
            orchestrator(FakeClient::default().with_place(test_place()));
        cache
            .put(CacheEntry::new(Place::new(TEST_PLACE_ID, "Cached Kamppi")))
            .await
            .unwrap();

        let place = orchestrator.get_place_by_id(TEST_PLACE_ID).await.unwrap();

        assert_eq!(place.name, "Cached Kamppi");
        assert_eq!(client.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_refresh_bypasses_and_overwrites_cache() {
        let (orchestrator, client, cache) =
            orchestrator(FakeClient::default().with_place(test_place()));
        cache
            .put(CacheEntry::new(Place::new(TEST_PLACE_ID, "Stale")))
            .await
            .unwrap();

        let place = orchestrator.refresh_place(TEST_PLACE_ID).await.unwrap();

        assert_eq!(place.name, "Kamppi");
        assert_eq!(client.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get(TEST_PLACE_ID).await.unwrap().place.name, "Kamppi");
    }

    #[tokio::test]
    async fn test_failure_leaves_state_unchanged() {
        let (orchestrator, _, _) = orchestrator(FakeClient::default().with_place(test_place()));
        orchestrator.get_place_by_id(TEST_PLACE_ID).await.unwrap();
        let before = orchestrator.snapshot();

        let err = orchestrator.get_place_by_id("ChIJmissing").await.unwrap_err();

        assert!(matches!(err, PlacesError::NotFound(_)));
        assert_eq!(orchestrator.snapshot(), before);
    }

    #[tokio::test]
    async fn test_service_error_surfaces_to_caller() {
        let client = FakeClient {
            fail_with: Some(PlacesError::Service {
                status: Some(429),
                vendor_status: Some("RESOURCE_EXHAUSTED".to_string()),
                message: "Quota exceeded".to_string(),
            }),
            ..FakeClient::default()
        };
        let (orchestrator, client, _) = orchestrator(client);

        let err = orchestrator.get_place_by_id(TEST_PLACE_ID).await.unwrap_err();

        assert_eq!(err.service_status(), Some(429));
        assert_eq!(client.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(orchestrator.snapshot().state, LookupState::Idle);
    }

    #[tokio::test]
    async fn test_concurrent_lookups_last_writer_wins() {
        let client = FakeClient::default()
            .with_place(Place::new("ChIJfast", "Fast"))
            .with_place(Place::new("ChIJslow", "Slow"))
            .with_delay("ChIJslow", Duration::from_millis(50));
        let (orchestrator, _, _) = orchestrator(client);

        let slow = orchestrator.get_place_by_id("ChIJslow");
        let fast = orchestrator.get_place_by_id("ChIJfast");
        let (slow, fast) = tokio::join!(slow, fast);

        assert_eq!(slow.unwrap().id(), "ChIJslow");
        assert_eq!(fast.unwrap().id(), "ChIJfast");

        let final_id = orchestrator
            .snapshot()
            .state
            .place()
            .map(|p| p.id().to_string())
            .unwrap();
        assert!(final_id == "ChIJslow" || final_id == "ChIJfast");
    }

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let (orchestrator, _, _) = orchestrator(FakeClient::default().with_place(test_place()));
        let mut rx = orchestrator.subscribe();

        orchestrator.get_place_by_id(TEST_PLACE_ID).await.unwrap();

        assert!(rx.has_changed().unwrap());
        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(snapshot.state.place().map(Place::id), Some(TEST_PLACE_ID));
    }

    #[tokio::test]
    async fn test_nearby_replaces_list() {
        let client = FakeClient::default()
            .with_place(Place::new("ChIJa", "A"))
            .with_place(Place::new("ChIJb", "B"));
        let (orchestrator, _, cache) = orchestrator(client);

        let places = orchestrator
            .get_nearby_places(NearbyQuery::new(60.17, 24.94))
            .await
            .unwrap();

        assert_eq!(places.len(), 2);
        assert_eq!(orchestrator.snapshot().nearby.len(), 2);
        assert_eq!(orchestrator.snapshot().state, LookupState::Idle);
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_place_photo_without_metadata_is_not_found() {
        let (orchestrator, _, _) = orchestrator(FakeClient::default().with_place(test_place()));

        let err = orchestrator.get_place_photo(TEST_PLACE_ID).await.unwrap_err();

        assert!(matches!(err, PlacesError::NotFound(_)));
        assert!(orchestrator.snapshot().photo.is_none());
    }

    #[tokio::test]
    async fn test_place_photo_uses_first_reference_and_bounds() {
        let place = test_place().with_photos(vec![
            PhotoReference::new("places/x/photos/first").with_attribution("Jane Doe"),
            PhotoReference::new("places/x/photos/second"),
        ]);
        let (orchestrator, _, cache) = orchestrator(FakeClient::default().with_place(place));
        let orchestrator = orchestrator.with_photo_bounds(640, 480);

        let photo = orchestrator.get_place_photo(TEST_PLACE_ID).await.unwrap();

        assert_eq!(photo.bytes, b"places/x/photos/first@640x480".to_vec());
        assert_eq!(photo.attribution.as_deref(), Some("Jane Doe"));

        let displayed = orchestrator.snapshot().photo.unwrap();
        assert_eq!(displayed.place_id, TEST_PLACE_ID);
        assert_eq!(displayed.size_bytes, photo.len());
        // photo lookups never touch the cache or the place state
        assert!(cache.is_empty().await);
        assert_eq!(orchestrator.snapshot().state, LookupState::Idle);
    }

    #[tokio::test]
    async fn test_get_photo_is_independent_of_state() {
        let (orchestrator, _, _) = orchestrator(FakeClient::default());

        let photo = orchestrator
            .get_photo(PhotoReference::new("places/y/photos/z"), 100, 100)
            .await
            .unwrap();

        assert!(!photo.is_empty());
        assert_eq!(orchestrator.snapshot(), LookupSnapshot::default());
    }
}
