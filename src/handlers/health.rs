// src/handlers/health.rs
// DOCUMENTATION: Health check handler
// PURPOSE: Report liveness plus a summary of what the lookup currently shows

use crate::services::LookupOrchestrator;
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

/// Liveness plus lookup summary
/// DOCUMENTATION: Reads the in-memory snapshot only; no vendor or cache calls
pub async fn health_check(orchestrator: web::Data<LookupOrchestrator>) -> impl Responder {
    let snapshot = orchestrator.snapshot();

    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "lookup": {
            "loaded_place": snapshot.state.place().map(|p| p.id()),
            "nearby_count": snapshot.nearby.len(),
            "photo_on_display": snapshot.photo.is_some()
        }
    }))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}
