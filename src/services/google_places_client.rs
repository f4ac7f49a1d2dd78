// src/services/google_places_client.rs
// DOCUMENTATION: Google Places API (New) client
// PURPOSE: Nearby search, place details and photo media requests

use crate::config::Config;
use crate::errors::PlacesError;
use crate::models::{NearbyQuery, PhotoData, PhotoReference, Place, PlaceField};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

const API_KEY_HEADER: &str = "X-Goog-Api-Key";
const FIELD_MASK_HEADER: &str = "X-Goog-FieldMask";

/// Vendor lookup operations
/// DOCUMENTATION: Stateless; every call is an independent request.
/// No pagination, no retry.
#[async_trait]
pub trait PlaceClient: Send + Sync {
    /// First page of places around the query centre
    async fn search_nearby(&self, query: &NearbyQuery) -> Result<Vec<Place>, PlacesError>;

    /// Single place restricted to the requested fields
    async fn fetch_place(&self, place_id: &str, fields: &[PlaceField])
        -> Result<Place, PlacesError>;

    /// Resolve a photo reference to image bytes bounded by the given size
    async fn fetch_photo(
        &self,
        reference: &PhotoReference,
        max_width: u32,
        max_height: u32,
    ) -> Result<PhotoData, PlacesError>;
}

/// Google Places API client
/// DOCUMENTATION: Handles authentication and API calls to Google Places
pub struct GooglePlacesClient {
    /// HTTP client for making requests
    client: Client,
    /// Google Places API key
    api_key: String,
    /// Base URL for the Places API, overridable for tests
    base_url: String,
}

/// Nearby search request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchNearbyRequest {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    included_types: Vec<String>,
    max_result_count: u32,
    location_restriction: LocationRestriction,
}

#[derive(Debug, Serialize)]
struct LocationRestriction {
    circle: Circle,
}

#[derive(Debug, Serialize)]
struct Circle {
    center: LatLng,
    radius: f64,
}

#[derive(Debug, Serialize)]
struct LatLng {
    latitude: f64,
    longitude: f64,
}

/// Response from Nearby Search
/// DOCUMENTATION: The vendor omits `places` entirely when nothing matched
#[derive(Debug, Deserialize)]
struct SearchNearbyResponse {
    #[serde(default)]
    places: Vec<GooglePlace>,
}

/// Place resource as returned by the API
/// DOCUMENTATION: Every field is optional because the field mask decides
/// what is present
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GooglePlace {
    pub id: Option<String>,
    pub display_name: Option<GoogleLocalizedText>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub photos: Vec<GooglePhoto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleLocalizedText {
    pub text: String,
    pub language_code: Option<String>,
}

/// Photo metadata
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GooglePhoto {
    /// Resource name: places/{place_id}/photos/{photo_token}
    pub name: String,
    pub width_px: Option<u32>,
    pub height_px: Option<u32>,
    #[serde(default)]
    pub author_attributions: Vec<GoogleAuthorAttribution>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleAuthorAttribution {
    pub display_name: Option<String>,
    pub uri: Option<String>,
}

/// Error envelope: {"error": {"code": 404, "message": "...", "status": "NOT_FOUND"}}
#[derive(Debug, Deserialize)]
struct GoogleErrorEnvelope {
    error: GoogleErrorBody,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    message: Option<String>,
    status: Option<String>,
}

impl GooglePlace {
    /// Convert the API resource to a Place
    /// DOCUMENTATION: `requested_id` fills in the identifier when the mask
    /// left it out
    fn into_place(self, requested_id: Option<&str>) -> Result<Place, PlacesError> {
        let id = match (self.id, requested_id) {
            (Some(id), _) => id,
            (None, Some(id)) => id.to_string(),
            (None, None) => {
                return Err(PlacesError::Service {
                    status: None,
                    vendor_status: None,
                    message: "Place in response has no id".to_string(),
                })
            }
        };

        let name = self.display_name.map(|n| n.text).unwrap_or_default();
        let photos = self.photos.into_iter().map(GooglePhoto::into_reference).collect();

        Ok(Place::new(id, name).with_tags(self.types).with_photos(photos))
    }
}

impl GooglePhoto {
    fn into_reference(self) -> PhotoReference {
        let names: Vec<String> = self
            .author_attributions
            .into_iter()
            .filter_map(|a| a.display_name)
            .collect();

        PhotoReference {
            name: self.name,
            attribution: (!names.is_empty()).then(|| names.join(", ")),
            width_px: self.width_px,
            height_px: self.height_px,
        }
    }
}

impl GooglePlacesClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://places.googleapis.com/v1";

    /// Create new Google Places API client
    /// DOCUMENTATION: Initializes client with API key
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Build a client from application configuration
    pub fn from_config(config: &Config) -> Result<Self, PlacesError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| PlacesError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.places_api_key.clone(),
            base_url: config.places_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Point the client at another endpoint (mock servers, proxies)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Turn a non-success response into a typed error
    /// DOCUMENTATION: 404 or vendor NOT_FOUND is absence; anything else is a
    /// service error carrying the HTTP status and the vendor status string.
    /// Statuses are not interpreted any further and never retried.
    async fn error_from_response(response: Response, what: &str) -> PlacesError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<GoogleErrorEnvelope>(&body).ok();
        let vendor_status = parsed.as_ref().and_then(|e| e.error.status.clone());

        if status == StatusCode::NOT_FOUND || vendor_status.as_deref() == Some("NOT_FOUND") {
            log::warn!("Google Places reported {} as not found", what);
            return PlacesError::NotFound(what.to_string());
        }

        let message = parsed
            .and_then(|e| e.error.message)
            .unwrap_or_else(|| if body.is_empty() { status.to_string() } else { body });

        log::error!("Google Places API error {} for {}: {}", status, what, message);
        PlacesError::Service {
            status: Some(status.as_u16()),
            vendor_status,
            message,
        }
    }

    /// Append path segments to the base URL
    /// DOCUMENTATION: Each segment is percent-encoded on its own, so an id
    /// containing `/`, `?` or `#` stays inside its segment
    fn endpoint<'a, I>(&self, segments: I) -> Result<Url, PlacesError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| PlacesError::Configuration(format!("Invalid base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| {
                PlacesError::Configuration(format!("Base URL cannot take a path: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn transport_error(e: reqwest::Error) -> PlacesError {
        log::error!("Google Places API request failed: {}", e);
        PlacesError::transport(format!("Request failed: {}", e))
    }

    fn parse_error(e: reqwest::Error) -> PlacesError {
        log::error!("Failed to parse Google Places response: {}", e);
        PlacesError::transport(format!("Parse error: {}", e))
    }
}

#[async_trait]
impl PlaceClient for GooglePlacesClient {
    /// Perform nearby search for places
    /// DOCUMENTATION: Searches inside a circle around the query centre.
    /// Returns only the first page; an empty response is an empty list.
    async fn search_nearby(&self, query: &NearbyQuery) -> Result<Vec<Place>, PlacesError> {
        query.validate()?;

        let url = self.endpoint(["places:searchNearby"])?;
        let center = query.center();
        let body = SearchNearbyRequest {
            included_types: query.included_types.clone(),
            max_result_count: query.max_results,
            location_restriction: LocationRestriction {
                circle: Circle {
                    center: LatLng {
                        latitude: center.y(),
                        longitude: center.x(),
                    },
                    radius: query.radius_m,
                },
            },
        };

        log::debug!(
            "Google Places nearby search: lat={}, lng={}, radius={}",
            center.y(),
            center.x(),
            query.radius_m
        );

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(
                FIELD_MASK_HEADER,
                PlaceField::field_mask(PlaceField::SUMMARY, Some("places")),
            )
            .json(&body)
            .send()
            .await
            .map_err(Self::transport_error)?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response, "nearby search").await);
        }

        let api_response: SearchNearbyResponse =
            response.json().await.map_err(Self::parse_error)?;

        log::info!(
            "Google Places search returned {} results",
            api_response.places.len()
        );

        api_response
            .places
            .into_iter()
            .map(|p| p.into_place(None))
            .collect()
    }

    /// Get a place by its Google Place ID
    /// DOCUMENTATION: Only the requested fields are populated; Id is always
    /// part of the mask so the returned place carries the identifier.
    async fn fetch_place(
        &self,
        place_id: &str,
        fields: &[PlaceField],
    ) -> Result<Place, PlacesError> {
        if place_id.trim().is_empty() {
            return Err(PlacesError::InvalidInput("place id is empty".to_string()));
        }

        let mut mask_fields = vec![PlaceField::Id];
        mask_fields.extend_from_slice(fields);

        let url = self.endpoint(["places", place_id])?;

        log::debug!("Google Places details lookup: place_id={}", place_id);

        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(FIELD_MASK_HEADER, PlaceField::field_mask(&mask_fields, None))
            .send()
            .await
            .map_err(Self::transport_error)?;

        if !response.status().is_success() {
            return Err(
                Self::error_from_response(response, &format!("place {}", place_id)).await,
            );
        }

        let google_place: GooglePlace = response.json().await.map_err(Self::parse_error)?;
        let place = google_place.into_place(Some(place_id))?;

        log::info!(
            "Place found: {}, ID: {}, Types: {:?}",
            place.name,
            place.id(),
            place.tags
        );
        Ok(place)
    }

    /// Download photo media
    /// DOCUMENTATION: The media endpoint redirects to the image; the client
    /// follows the redirect and returns the raw bytes.
    async fn fetch_photo(
        &self,
        reference: &PhotoReference,
        max_width: u32,
        max_height: u32,
    ) -> Result<PhotoData, PlacesError> {
        if reference.name.trim().is_empty() {
            return Err(PlacesError::NotFound("photo metadata".to_string()));
        }
        if max_width == 0 || max_height == 0 {
            return Err(PlacesError::InvalidInput(
                "photo bounds must be at least 1px".to_string(),
            ));
        }

        // name is places/{place_id}/photos/{photo_token}
        let url = self.endpoint(reference.name.split('/').chain(["media"]))?;

        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(&[
                ("maxWidthPx", max_width.to_string()),
                ("maxHeightPx", max_height.to_string()),
            ])
            .send()
            .await
            .map_err(Self::transport_error)?;

        if !response.status().is_success() {
            return Err(
                Self::error_from_response(response, &format!("photo {}", reference.name)).await,
            );
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response.bytes().await.map_err(Self::parse_error)?;

        log::debug!("Fetched photo {} ({} bytes)", reference.name, bytes.len());

        Ok(PhotoData {
            bytes: bytes.to_vec(),
            content_type,
            attribution: reference.attribution.clone(),
        })
    }
}
