// src/models/photo.rs

use serde::{Deserialize, Serialize};

/// Opaque handle to a place photo
/// `name` is the vendor resource name (places/{place_id}/photos/{token});
/// it is resolved to bytes with a second request and never stored as bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoReference {
    pub name: String,
    pub attribution: Option<String>,
    pub width_px: Option<u32>,
    pub height_px: Option<u32>,
}

impl PhotoReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attribution: None,
            width_px: None,
            height_px: None,
        }
    }

    pub fn with_attribution(mut self, attribution: impl Into<String>) -> Self {
        self.attribution = Some(attribution.into());
        self
    }
}

/// Image bytes for a resolved photo reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoData {
    pub bytes: Vec<u8>,
    /// Content type reported by the vendor (image/jpeg, image/png, ...)
    pub content_type: Option<String>,
    /// Attribution that must be displayed with the image
    pub attribution: Option<String>,
}

impl PhotoData {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
