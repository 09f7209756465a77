// src/models/mod.rs
// DOCUMENTATION: Models module organization
// PURPOSE: Re-export model components

pub mod business;
pub mod geo;
pub mod scan;

pub use business::*;
pub use geo::*;
pub use scan::*;
