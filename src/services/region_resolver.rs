// src/services/region_resolver.rs
// DOCUMENTATION: Geocoding client for region bounding boxes
// PURPOSE: Turn a region name into the bounding box the scan grid is laid over

use crate::config::Config;
use crate::errors::ScanError;
use crate::models::BoundingBox;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

/// Resolves a region name to its bounding box
/// DOCUMENTATION: `Ok(None)` means the provider has no match for the region,
/// which is a normal outcome; `Err` means the lookup itself failed.
#[async_trait]
pub trait RegionResolver: Send + Sync {
    async fn resolve(&self, region: &str) -> Result<Option<BoundingBox>, ScanError>;
}

/// One match from a Nominatim search
/// DOCUMENTATION: Only the bounding box is used.
/// Nominatim encodes it as `[min_lat, max_lat, min_lon, max_lon]` strings.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    boundingbox: Option<Vec<Value>>,
    display_name: Option<String>,
}

/// Nominatim geocoding client
/// DOCUMENTATION: Issues one search per region, asking for the single best match
pub struct NominatimResolver {
    /// HTTP client for making requests (carries the request timeout)
    client: Client,
    /// Search endpoint
    search_url: String,
    /// Identifies this service to the provider (required by its usage policy)
    user_agent: String,
    /// Appended to every region name, e.g. "India"
    country: String,
}

impl NominatimResolver {
    pub fn new(client: Client, search_url: String, user_agent: String, country: String) -> Self {
        Self {
            client,
            search_url,
            user_agent,
            country,
        }
    }

    pub fn from_config(client: Client, config: &Config) -> Self {
        Self::new(
            client,
            config.geocoder_url.clone(),
            config.geocoder_user_agent.clone(),
            config.region_country.clone(),
        )
    }

    /// Country-qualified query string
    fn query_for(&self, region: &str) -> String {
        if self.country.is_empty() {
            region.to_string()
        } else {
            format!("{}, {}", region, self.country)
        }
    }

    fn parse_bound(value: &Value) -> Option<f64> {
        match value {
            Value::String(s) => s.trim().parse().ok(),
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    fn bounding_box_of(place: &NominatimPlace) -> Result<BoundingBox, ScanError> {
        let raw = place.boundingbox.as_ref().ok_or_else(|| {
            ScanError::ResolutionFailed("match has no boundingbox".to_string())
        })?;

        let bounds: Vec<f64> = raw.iter().filter_map(Self::parse_bound).collect();
        if raw.len() != 4 || bounds.len() != 4 {
            return Err(ScanError::ResolutionFailed(format!(
                "malformed boundingbox: {:?}",
                raw
            )));
        }

        BoundingBox::new(bounds[0], bounds[1], bounds[2], bounds[3])
            .map_err(|e| ScanError::ResolutionFailed(e.to_string()))
    }
}

#[async_trait]
impl RegionResolver for NominatimResolver {
    async fn resolve(&self, region: &str) -> Result<Option<BoundingBox>, ScanError> {
        let query = self.query_for(region);
        log::debug!("Geocoding region: {}", query);

        let response = self
            .client
            .get(&self.search_url)
            .query(&[("q", query.as_str()), ("format", "json"), ("limit", "1")])
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| {
                log::error!("Geocoder request failed for {}: {}", region, e);
                ScanError::ResolutionFailed(format!("Request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            log::error!("Geocoder error {} for {}: {}", status, region, body);
            return Err(ScanError::ResolutionFailed(format!(
                "API error {}: {}",
                status, body
            )));
        }

        let places: Vec<NominatimPlace> = response.json().await.map_err(|e| {
            log::error!("Failed to parse geocoder response for {}: {}", region, e);
            ScanError::ResolutionFailed(format!("Parse error: {}", e))
        })?;

        let Some(place) = places.first() else {
            log::warn!("No geocoder match for region: {}", query);
            return Ok(None);
        };

        let bbox = Self::bounding_box_of(place)?;
        log::info!(
            "Resolved {} to {} (lat {}..{}, lon {}..{})",
            region,
            place.display_name.as_deref().unwrap_or("unnamed match"),
            bbox.min_lat(),
            bbox.max_lat(),
            bbox.min_lon(),
            bbox.max_lon()
        );

        Ok(Some(bbox))
    }
}
