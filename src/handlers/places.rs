// src/handlers/places.rs
// DOCUMENTATION: HTTP handlers for place lookups
// PURPOSE: Parse requests, hand them to the orchestrator, return responses

use crate::errors::PlacesError;
use crate::models::NearbyQuery;
use crate::services::LookupOrchestrator;
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

/// Query string for GET /places/nearby
#[derive(Debug, Deserialize)]
pub struct NearbyParams {
    pub lat: f64,
    pub lng: f64,
    pub radius_m: Option<f64>,
    /// Single place type filter (e.g. "restaurant")
    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub max_results: Option<u32>,
}

impl NearbyParams {
    fn into_query(self) -> NearbyQuery {
        let mut query = NearbyQuery::new(self.lat, self.lng);
        if let Some(radius) = self.radius_m {
            query.radius_m = radius;
        }
        if let Some(max) = self.max_results {
            query.max_results = max;
        }
        query.included_types = self.type_.into_iter().collect();
        query
    }
}

/// Query string for GET /places/{id}
#[derive(Debug, Deserialize)]
pub struct PlaceParams {
    /// Skip the local cache and re-fetch from the vendor
    #[serde(default)]
    pub refresh: bool,
}

/// GET /places/nearby
/// First page of places around a point
pub async fn nearby_places(
    orchestrator: web::Data<LookupOrchestrator>,
    params: web::Query<NearbyParams>,
) -> Result<impl Responder, PlacesError> {
    let query = params.into_inner().into_query();
    query.validate()?;

    let places = orchestrator.get_nearby_places(query).await?;
    Ok(HttpResponse::Ok().json(json!({
        "count": places.len(),
        "places": places,
    })))
}

/// GET /places/{id}
/// Place by Google Place ID, served from the local cache when present
pub async fn get_place(
    orchestrator: web::Data<LookupOrchestrator>,
    path: web::Path<String>,
    params: web::Query<PlaceParams>,
) -> Result<impl Responder, PlacesError> {
    let place_id = path.into_inner();
    let place = if params.refresh {
        orchestrator.refresh_place(place_id).await?
    } else {
        orchestrator.get_place_by_id(place_id).await?
    };
    Ok(HttpResponse::Ok().json(place))
}

/// GET /places/{id}/photo
/// First photo of the place as raw image bytes
pub async fn get_place_photo(
    orchestrator: web::Data<LookupOrchestrator>,
    path: web::Path<String>,
) -> Result<impl Responder, PlacesError> {
    let photo = orchestrator.get_place_photo(path.into_inner()).await?;

    let mut response = HttpResponse::Ok();
    response.content_type(
        photo
            .content_type
            .clone()
            .unwrap_or_else(|| "application/octet-stream".to_string()),
    );
    // Attribution must travel with the image; header values must be ASCII
    if let Some(attribution) = photo.attribution.as_ref().filter(|a| a.is_ascii()) {
        response.insert_header(("X-Photo-Attribution", attribution.clone()));
    }
    Ok(response.body(photo.bytes))
}

/// GET /lookup/state
/// Current observable lookup state
pub async fn lookup_state(orchestrator: web::Data<LookupOrchestrator>) -> impl Responder {
    HttpResponse::Ok().json(orchestrator.snapshot())
}

/// Configuration for place routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/places")
            .route("/nearby", web::get().to(nearby_places))
            .route("/{id}", web::get().to(get_place))
            .route("/{id}/photo", web::get().to(get_place_photo)),
    )
    .route("/lookup/state", web::get().to(lookup_state));
}
