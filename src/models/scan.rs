// src/models/scan.rs
// DOCUMENTATION: Outcome tracking for region scans and batch runs
// PURPOSE: Diagnostics, per-region reports and run summaries exposed by the status endpoint

use super::GridPoint;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Terminal state of one region's scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionStatus {
    /// Bounding box could not be resolved or gridded; no grid point was fetched
    Skipped,
    /// Every grid point was visited
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    NotFound,
    ResolutionFailure,
    /// Box resolved but no usable grid could be laid over it
    InvalidGrid,
    FetchFailure,
    DeliveryFailure,
}

/// One recorded problem during a region scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Grid point involved, for per-point failures
    pub point: Option<GridPoint>,
    pub message: String,
}

impl Diagnostic {
    pub fn region(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            point: None,
            message: message.into(),
        }
    }

    pub fn at_point(kind: DiagnosticKind, point: GridPoint, message: impl Into<String>) -> Self {
        Self {
            kind,
            point: Some(point),
            message: message.into(),
        }
    }
}

/// What happened to a region's report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Region was skipped before scanning
    NotAttempted,
    /// Scan completed without records; nothing was sent
    NoData,
    Delivered,
    Failed,
}

/// Per-region outcome of a run
/// DOCUMENTATION: Tracks results of scanning and reporting one region
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionReport {
    pub region: String,
    pub status: RegionStatus,
    /// Number of grid points generated for the region
    pub grid_points: usize,
    /// Records collected across all successful points
    pub records: usize,
    /// Grid points whose fetch failed
    pub failed_points: usize,
    pub delivery: DeliveryStatus,
    pub diagnostics: Vec<Diagnostic>,
}

/// Batch run statistics
/// DOCUMENTATION: Tracks results of one triggered run over a list of regions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub regions: Vec<RegionReport>,
    /// Total sync duration in seconds
    pub duration_seconds: u64,
    /// Timestamp when the run started
    pub started_at: String,
    /// Timestamp when the run completed
    pub completed_at: Option<String>,
}

impl RunSummary {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            regions: Vec::new(),
            duration_seconds: 0,
            started_at: Utc::now().to_rfc3339(),
            completed_at: None,
        }
    }

    /// Mark run as completed
    pub fn complete(&mut self, duration: u64) {
        self.duration_seconds = duration;
        self.completed_at = Some(Utc::now().to_rfc3339());
    }

    pub fn total_records(&self) -> usize {
        self.regions.iter().map(|r| r.records).sum()
    }

    pub fn reports_delivered(&self) -> usize {
        self.regions
            .iter()
            .filter(|r| r.delivery == DeliveryStatus::Delivered)
            .count()
    }

    pub fn regions_skipped(&self) -> usize {
        self.regions
            .iter()
            .filter(|r| r.status == RegionStatus::Skipped)
            .count()
    }
}
