// src/errors.rs
// DOCUMENTATION: Custom error types and HTTP responses
// PURPOSE: Centralized error handling for client, cache store and orchestrator

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;

/// Application-specific error types
/// DOCUMENTATION: One enum shared by every layer of the lookup pipeline
/// Each variant maps to an HTTP status code when surfaced through a handler
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlacesError {
    /// Vendor reported that the place or photo does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transport, auth or quota failure talking to the vendor
    /// `status` is the HTTP status the vendor answered with (None when the
    /// request never got a response), `vendor_status` the vendor's own code
    #[error("Places service error ({}): {}", status_label(.status, .vendor_status), .message)]
    Service {
        status: Option<u16>,
        vendor_status: Option<String>,
        message: String,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A spawned lookup task panicked or was aborted
    #[error("Internal error: {0}")]
    Internal(String),
}

fn status_label(status: &Option<u16>, vendor_status: &Option<String>) -> String {
    match (status, vendor_status) {
        (Some(code), Some(vendor)) => format!("{} {}", code, vendor),
        (Some(code), None) => code.to_string(),
        (None, Some(vendor)) => vendor.clone(),
        (None, None) => "no response".to_string(),
    }
}

impl PlacesError {
    /// Build a service error for a request that never produced a response
    pub fn transport(message: impl Into<String>) -> Self {
        PlacesError::Service {
            status: None,
            vendor_status: None,
            message: message.into(),
        }
    }

    /// Vendor HTTP status carried by a service error
    pub fn service_status(&self) -> Option<u16> {
        match self {
            PlacesError::Service { status, .. } => *status,
            _ => None,
        }
    }

    /// Vendor status string (e.g. "PERMISSION_DENIED") carried by a service error
    pub fn vendor_status(&self) -> Option<&str> {
        match self {
            PlacesError::Service { vendor_status, .. } => vendor_status.as_deref(),
            _ => None,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            PlacesError::NotFound(_) => "NOT_FOUND",
            PlacesError::Service { .. } => "PLACES_SERVICE_ERROR",
            PlacesError::Storage(_) => "STORAGE_ERROR",
            PlacesError::InvalidInput(_) => "INVALID_INPUT",
            PlacesError::Configuration(_) => "CONFIGURATION_ERROR",
            PlacesError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<validator::ValidationErrors> for PlacesError {
    fn from(e: validator::ValidationErrors) -> Self {
        PlacesError::InvalidInput(e.to_string())
    }
}

/// Convert PlacesError to HTTP response
/// DOCUMENTATION: Maps error types to HTTP status codes and JSON responses
impl ResponseError for PlacesError {
    fn error_response(&self) -> HttpResponse {
        let body = json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
                "http_status": self.service_status(),
                "vendor_status": self.vendor_status(),
                "timestamp": chrono::Utc::now().to_rfc3339()
            }
        });

        HttpResponse::build(self.status_code()).json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            PlacesError::NotFound(_) => StatusCode::NOT_FOUND,
            PlacesError::Service { .. } => StatusCode::BAD_GATEWAY,
            PlacesError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PlacesError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            PlacesError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
            PlacesError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
