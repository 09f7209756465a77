// src/config/http.rs
// DOCUMENTATION: Outbound HTTP client initialization
// PURPOSE: Build the one reqwest client shared by the geocoder and directory clients

use crate::config::Config;
use reqwest::Client;

/// Initialize the shared HTTP client
/// DOCUMENTATION: Called once during application startup in main.rs
/// Every outbound call inherits the configured timeout (30s by default),
/// so a hung provider surfaces as an error instead of stalling a scan
pub fn init_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    log::info!(
        "Initializing HTTP client (timeout: {}s)",
        config.http_timeout_secs
    );

    Client::builder()
        .timeout(config.http_timeout())
        .connect_timeout(config.http_timeout())
        .build()
}
