// src/services/mod.rs
// DOCUMENTATION: Services module organization
// PURPOSE: Re-export service components

pub mod directory_client;
pub mod grid_generator;
pub mod job_runner;
pub mod region_resolver;
pub mod report_sink;
pub mod scan_coordinator;

pub use directory_client::*;
pub use grid_generator::*;
pub use job_runner::*;
pub use region_resolver::*;
pub use report_sink::*;
pub use scan_coordinator::*;
