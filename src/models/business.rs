// src/models/business.rs
// DOCUMENTATION: Business data discovered by a region scan
// PURPOSE: Directory listings, provenance-tagged records and the per-region result set

use super::GridPoint;
use serde::{Deserialize, Serialize};

/// One business entry as returned by the directory provider
/// DOCUMENTATION: Every field is independently optional; a missing field stays None
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessListing {
    pub name: Option<String>,
    pub category: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub lat: Option<f64>,
    pub long: Option<f64>,
}

/// Business record tagged with the grid point that discovered it
/// DOCUMENTATION: One record per listing per fetch call. Records are never
/// merged, so a business seen from overlapping grid points appears once per point.
/// Field order here is the column order of the CSV report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessRecord {
    /// Region that was being scanned
    pub region: String,

    /// Grid point latitude the query was issued from
    pub scan_lat: f64,

    /// Grid point longitude the query was issued from
    pub scan_lon: f64,

    #[serde(rename = "business_name")]
    pub name: Option<String>,

    pub category: Option<String>,

    pub address: Option<String>,

    pub phone: Option<String>,

    pub business_lat: Option<f64>,

    pub business_lon: Option<f64>,
}

impl BusinessRecord {
    /// Tag a directory listing with its provenance
    pub fn from_listing(region: &str, point: GridPoint, listing: BusinessListing) -> Self {
        Self {
            region: region.to_string(),
            scan_lat: point.lat,
            scan_lon: point.lon,
            name: listing.name,
            category: listing.category,
            address: listing.address,
            phone: listing.phone,
            business_lat: listing.lat,
            business_lon: listing.long,
        }
    }
}

/// Ordered records collected for one region
/// DOCUMENTATION: Owned by the scan coordinator while the region is scanned,
/// then moved into the report sink
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanResult {
    records: Vec<BusinessRecord>,
}

impl ScanResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every listing of one fetch, tagged with region and point
    pub fn extend_from_listings(
        &mut self,
        region: &str,
        point: GridPoint,
        listings: Vec<BusinessListing>,
    ) {
        self.records.extend(
            listings
                .into_iter()
                .map(|listing| BusinessRecord::from_listing(region, point, listing)),
        );
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[BusinessRecord] {
        &self.records
    }
}
