// src/models/mod.rs
// DOCUMENTATION: Models module organization
// PURPOSE: Re-export model components

pub mod cache_entry;
pub mod photo;
pub mod place;

pub use cache_entry::*;
pub use photo::*;
pub use place::*;
