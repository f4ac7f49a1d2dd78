// src/models/place.rs
// DOCUMENTATION: Core data structures for places
// PURPOSE: Place record, vendor field selection and nearby search query

use geo_types::Point;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use validator::{Validate, ValidationError};

use super::PhotoReference;

/// A vendor-identified point of interest
/// DOCUMENTATION: The identifier is fixed at construction and has no setter;
/// everything else is plain data. Replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    /// Google Place ID (e.g. "ChIJWV3PC2PzT0YR-_gAuGdqTNQ")
    id: String,

    /// Display name, empty when the name field was not requested
    pub name: String,

    /// Category tags (the vendor `types`, e.g. "restaurant", "point_of_interest")
    #[serde(default)]
    pub tags: BTreeSet<String>,

    /// Photo metadata in vendor order, empty when none or not requested
    #[serde(default)]
    pub photos: Vec<PhotoReference>,
}

impl Place {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tags: BTreeSet::new(),
            photos: Vec::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_photos(mut self, photos: Vec<PhotoReference>) -> Self {
        self.photos = photos;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// First photo in vendor order, the one shown for the place
    pub fn primary_photo(&self) -> Option<&PhotoReference> {
        self.photos.first()
    }
}

/// Field selection sent to the Places API
/// DOCUMENTATION: Narrows the response payload; unrequested fields come back
/// empty. Mirrors the field lists the mobile SDK takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlaceField {
    Id,
    Name,
    Types,
    PhotoMetadatas,
}

impl PlaceField {
    /// Identifier, name and types: what a place lookup asks for
    pub const SUMMARY: &'static [PlaceField] = &[PlaceField::Id, PlaceField::Name, PlaceField::Types];

    /// Photo requests must always ask for the photo metadata
    pub const PHOTOS: &'static [PlaceField] = &[PlaceField::Id, PlaceField::PhotoMetadatas];

    /// Path of this field inside a vendor Place resource
    pub fn mask_path(self) -> &'static str {
        match self {
            PlaceField::Id => "id",
            PlaceField::Name => "displayName",
            PlaceField::Types => "types",
            PlaceField::PhotoMetadatas => "photos",
        }
    }

    /// Build an X-Goog-FieldMask value
    /// DOCUMENTATION: Duplicates are dropped and the order is stable.
    /// `prefix` is "places" for search responses, where each place is nested
    pub fn field_mask(fields: &[PlaceField], prefix: Option<&str>) -> String {
        let unique: BTreeSet<PlaceField> = fields.iter().copied().collect();
        unique
            .into_iter()
            .map(|field| match prefix {
                Some(p) => format!("{}.{}", p, field.mask_path()),
                None => field.mask_path().to_string(),
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Nearby search query
/// DOCUMENTATION: Circle around a point; validated before any request is sent.
/// Only the first page of results is ever requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NearbyQuery {
    #[validate(custom = "finite", range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(custom = "finite", range(min = -180.0, max = 180.0))]
    pub longitude: f64,

    /// Search radius in meters (vendor maximum 50 km)
    #[validate(custom = "finite", range(min = 1.0, max = 50000.0))]
    pub radius_m: f64,

    /// Restrict to these place types (e.g. "restaurant"); empty means any
    #[serde(default)]
    pub included_types: Vec<String>,

    #[validate(range(min = 1, max = 20))]
    pub max_results: u32,
}

/// Range checks let NaN through, so coordinates are checked separately
fn finite(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::new("finite"))
    }
}

impl NearbyQuery {
    pub const DEFAULT_RADIUS_M: f64 = 1000.0;
    pub const DEFAULT_MAX_RESULTS: u32 = 10;

    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            radius_m: Self::DEFAULT_RADIUS_M,
            included_types: Vec::new(),
            max_results: Self::DEFAULT_MAX_RESULTS,
        }
    }

    /// Search centre as a geographic point (x = longitude, y = latitude)
    pub fn center(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}
