// src/models/geo.rs
// DOCUMENTATION: Geographic primitives for region scans
// PURPOSE: Bounding boxes produced by the resolver and grid points produced by the generator

use crate::errors::ScanError;
use geo_types::{coord, Rect};
use serde::{Deserialize, Serialize};

/// Decimal digits kept on every grid coordinate
pub const GRID_PRECISION_DIGITS: i32 = 4;

/// Largest distance a rounded coordinate can move from its exact value
pub const ROUNDING_TOLERANCE: f64 = 0.5e-4 + 1e-9;

/// Valid latitude range in degrees
pub const LAT_RANGE: std::ops::RangeInclusive<f64> = -90.0..=90.0;

/// Valid longitude range in degrees
pub const LON_RANGE: std::ops::RangeInclusive<f64> = -180.0..=180.0;

/// Round a coordinate to the grid precision
pub fn round_coordinate(value: f64) -> f64 {
    let factor = 10f64.powi(GRID_PRECISION_DIGITS);
    (value * factor).round() / factor
}

/// Region boundary definition
/// DOCUMENTATION: Minimal latitude/longitude rectangle covering a region
/// Always satisfies min_lat <= max_lat and min_lon <= max_lon
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    min_lat: f64,
    max_lat: f64,
    min_lon: f64,
    max_lon: f64,
}

impl BoundingBox {
    /// Build a box, rejecting non-finite, out-of-range or inverted bounds
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Result<Self, ScanError> {
        let bounds = [min_lat, max_lat, min_lon, max_lon];
        if bounds.iter().any(|b| !b.is_finite()) {
            return Err(ScanError::InvalidInput(format!(
                "bounding box has non-finite bounds: {:?}",
                bounds
            )));
        }

        if !LAT_RANGE.contains(&min_lat)
            || !LAT_RANGE.contains(&max_lat)
            || !LON_RANGE.contains(&min_lon)
            || !LON_RANGE.contains(&max_lon)
        {
            return Err(ScanError::InvalidInput(format!(
                "bounding box is outside valid degrees: lat [{}, {}], lon [{}, {}]",
                min_lat, max_lat, min_lon, max_lon
            )));
        }

        if min_lat > max_lat || min_lon > max_lon {
            return Err(ScanError::InvalidInput(format!(
                "bounding box is inverted: lat [{}, {}], lon [{}, {}]",
                min_lat, max_lat, min_lon, max_lon
            )));
        }

        Ok(Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        })
    }

    pub fn min_lat(&self) -> f64 {
        self.min_lat
    }

    pub fn max_lat(&self) -> f64 {
        self.max_lat
    }

    pub fn min_lon(&self) -> f64 {
        self.min_lon
    }

    pub fn max_lon(&self) -> f64 {
        self.max_lon
    }

    /// The box as a geo-types rectangle (x = longitude, y = latitude)
    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            coord! { x: self.min_lon, y: self.min_lat },
            coord! { x: self.max_lon, y: self.max_lat },
        )
    }

    /// Whether a point lies inside the box, allowing for grid rounding
    #[allow(dead_code)]
    pub fn contains(&self, point: &GridPoint) -> bool {
        let rect = self.to_rect();
        point.lat >= rect.min().y - ROUNDING_TOLERANCE
            && point.lat <= rect.max().y + ROUNDING_TOLERANCE
            && point.lon >= rect.min().x - ROUNDING_TOLERANCE
            && point.lon <= rect.max().x + ROUNDING_TOLERANCE
    }

    /// Calculate approximate area coverage in km²
    /// DOCUMENTATION: Rough estimate used for logging only
    pub fn area_km2(&self) -> f64 {
        let rect = self.to_rect();
        let center_lat = rect.center().y;
        let lat_km = rect.height() * 111.0;
        let lon_km = rect.width() * 111.0 * center_lat.to_radians().cos();

        lat_km * lon_km
    }
}

/// One coordinate sampled on the scan grid
/// DOCUMENTATION: Always rounded to GRID_PRECISION_DIGITS so repeated runs compare equal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GridPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat: round_coordinate(lat),
            lon: round_coordinate(lon),
        }
    }
}

impl std::fmt::Display for GridPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.lat, self.lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverted_box_rejected() {
        assert!(BoundingBox::new(13.5, 8.0, 76.2, 80.3).is_err());
        assert!(BoundingBox::new(8.0, 13.5, 80.3, 76.2).is_err());
        assert!(BoundingBox::new(f64::NAN, 13.5, 76.2, 80.3).is_err());
    }

    #[test]
    fn test_out_of_range_box_rejected() {
        assert!(BoundingBox::new(0.0, 1e300, 0.0, 0.0).is_err());
        assert!(BoundingBox::new(-91.0, 10.0, 0.0, 0.0).is_err());
        assert!(BoundingBox::new(0.0, 10.0, -180.5, 0.0).is_err());
        assert!(BoundingBox::new(0.0, 10.0, 0.0, 181.0).is_err());
        assert!(BoundingBox::new(-90.0, 90.0, -180.0, 180.0).is_ok());
    }

    #[test]
    fn test_degenerate_box_allowed() {
        let bbox = BoundingBox::new(10.0, 10.0, 77.0, 77.0).unwrap();
        assert_eq!(bbox.area_km2(), 0.0);
        assert!(bbox.contains(&GridPoint::new(10.0, 77.0)));
    }

    #[test]
    fn test_grid_point_rounding() {
        let point = GridPoint::new(8.300000000000001, 76.49999999);
        assert_eq!(point.lat, 8.3);
        assert_eq!(point.lon, 76.5);
        assert_eq!(point.to_string(), "8.3, 76.5");
    }

    #[test]
    fn test_contains_with_tolerance() {
        let bbox = BoundingBox::new(40.0, 40.1, -3.7, -3.6).unwrap();
        assert!(bbox.contains(&GridPoint::new(40.05, -3.65)));
        assert!(bbox.contains(&GridPoint { lat: 40.10004, lon: -3.6 }));
        assert!(!bbox.contains(&GridPoint::new(40.2, -3.65)));
    }

    #[test]
    fn test_area_calculation() {
        let bbox = BoundingBox::new(40.0, 40.1, -3.7, -3.6).unwrap();
        let area = bbox.area_km2();
        // Roughly 11 km x 8.5 km at this latitude
        assert!(area > 50.0 && area < 200.0);
    }
}
