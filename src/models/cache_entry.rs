// src/models/cache_entry.rs
// DOCUMENTATION: Locally persisted snapshot of a place
// PURPOSE: Unit of storage for the local cache store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Place;

/// A fetched place plus the moment it was fetched
/// DOCUMENTATION: Keyed by the place identifier; a re-fetch overwrites the
/// previous entry. There is no expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub place: Place,
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Snapshot a place fetched just now
    pub fn new(place: Place) -> Self {
        Self::with_timestamp(place, Utc::now())
    }

    pub fn with_timestamp(place: Place, fetched_at: DateTime<Utc>) -> Self {
        Self { place, fetched_at }
    }

    /// Cache key
    pub fn id(&self) -> &str {
        self.place.id()
    }
}
