// src/services/directory_client.rs
// DOCUMENTATION: Business directory API client
// PURPOSE: Query the directory at one grid point and normalize its listings

use crate::config::Config;
use crate::errors::ScanError;
use crate::models::{BusinessListing, GridPoint};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};

/// Fetches the businesses near one grid point
/// DOCUMENTATION: One outbound call per invocation, no retry. The caller
/// decides how to react to an error.
#[async_trait]
pub trait BusinessFetcher: Send + Sync {
    async fn fetch(
        &self,
        point: GridPoint,
        category: &str,
        radius: u32,
    ) -> Result<Vec<BusinessListing>, ScanError>;
}

/// Directory API client
/// DOCUMENTATION: Handles authentication and lat/long searches against the directory
pub struct DirectoryClient {
    /// HTTP client for making requests (carries the request timeout)
    client: Client,
    /// Search endpoint
    base_url: String,
    /// Header name the credential is sent in
    api_key_header: String,
    /// Directory credential
    api_key: String,
}

impl DirectoryClient {
    pub fn new(client: Client, base_url: String, api_key_header: String, api_key: String) -> Self {
        Self {
            client,
            base_url,
            api_key_header,
            api_key,
        }
    }

    pub fn from_config(client: Client, config: &Config) -> Self {
        Self::new(
            client,
            config.directory_api_url.clone(),
            config.directory_api_key_header.clone(),
            config.directory_api_key.clone(),
        )
    }

    /// Extract the listings from a decoded response body
    /// DOCUMENTATION: The body must be a JSON object. Its `data` list may be
    /// missing or of the wrong type, which both mean "no businesses here".
    /// Entries that are not objects are skipped.
    pub fn parse_listings(body: &Value) -> Result<Vec<BusinessListing>, ScanError> {
        let object = body.as_object().ok_or_else(|| {
            ScanError::FetchFailed("response body is not a JSON object".to_string())
        })?;

        let Some(entries) = object.get("data").and_then(Value::as_array) else {
            return Ok(Vec::new());
        };

        let listings = entries
            .iter()
            .filter_map(|entry| match entry.as_object() {
                Some(fields) => Some(Self::listing_from(fields)),
                None => {
                    log::warn!("Skipping non-object directory entry: {}", entry);
                    None
                }
            })
            .collect();

        Ok(listings)
    }

    fn listing_from(fields: &Map<String, Value>) -> BusinessListing {
        BusinessListing {
            name: text_field(fields, "name"),
            category: text_field(fields, "category"),
            address: text_field(fields, "address"),
            phone: text_field(fields, "phone"),
            lat: coordinate_field(fields, "lat"),
            long: coordinate_field(fields, "long"),
        }
    }
}

/// Strings are kept as-is and numbers stringified (phone numbers often arrive
/// as numbers); anything else, including null, is absent
fn text_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn coordinate_field(fields: &Map<String, Value>, key: &str) -> Option<f64> {
    match fields.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[async_trait]
impl BusinessFetcher for DirectoryClient {
    async fn fetch(
        &self,
        point: GridPoint,
        category: &str,
        radius: u32,
    ) -> Result<Vec<BusinessListing>, ScanError> {
        log::debug!(
            "Directory search: lat={}, long={}, cat={}, radius={}",
            point.lat,
            point.lon,
            category,
            radius
        );

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("lat", point.lat.to_string()),
                ("long", point.lon.to_string()),
                ("cat", category.to_string()),
                ("radius", radius.to_string()),
            ])
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header("X-Requested-With", "XMLHttpRequest")
            .header(self.api_key_header.as_str(), &self.api_key)
            .send()
            .await
            .map_err(|e| ScanError::FetchFailed(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ScanError::FetchFailed(format!(
                "API error {}: {}",
                status, body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ScanError::FetchFailed(format!("Parse error: {}", e)))?;

        let listings = Self::parse_listings(&body)?;
        log::debug!("Directory search at {} returned {} listings", point, listings.len());

        Ok(listings)
    }
}
