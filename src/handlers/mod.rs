// src/handlers/mod.rs
// DOCUMENTATION: Handlers module organization
// PURPOSE: Re-export handler components

pub mod health;
pub mod scan;

pub use health::config as health_config;
pub use scan::config as scan_config;
