// src/db/mod.rs
// DOCUMENTATION: Local persistence module organization
// PURPOSE: Re-export cache store components

pub mod cache_store;
pub mod memory_store;

pub use cache_store::*;
pub use memory_store::*;
