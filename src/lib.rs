// src/lib.rs
// DOCUMENTATION: Library root
// PURPOSE: Expose the lookup pipeline to the server binary and integration tests

pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;

pub use errors::PlacesError;
