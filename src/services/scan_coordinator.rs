// src/services/scan_coordinator.rs
// DOCUMENTATION: Region scan orchestration
// PURPOSE: Resolve, grid, fetch and report each region with per-point failure isolation

use crate::models::{
    DeliveryStatus, Diagnostic, DiagnosticKind, RegionReport, RegionStatus, RunSummary, ScanResult,
};
use crate::services::{BusinessFetcher, GridGenerator, RegionResolver, ReportSink};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Fixed parameters applied to every region of a run
#[derive(Debug, Clone)]
pub struct ScanSettings {
    /// Grid spacing in degrees
    pub grid_step: f64,
    /// Directory category filter
    pub category: String,
    /// Directory search radius
    pub radius: u32,
    /// Pause after every grid point, success or failure
    pub pace_interval: Duration,
}

/// Everything one region's scan produced
/// DOCUMENTATION: `result` is still owned here; `process_region` moves it
/// into the report sink when it is non-empty
#[derive(Debug)]
pub struct RegionScan {
    pub region: String,
    pub status: RegionStatus,
    pub grid_points: usize,
    pub result: ScanResult,
    pub diagnostics: Vec<Diagnostic>,
}

impl RegionScan {
    fn skipped(region: &str, diagnostic: Diagnostic) -> Self {
        Self {
            region: region.to_string(),
            status: RegionStatus::Skipped,
            grid_points: 0,
            result: ScanResult::new(),
            diagnostics: vec![diagnostic],
        }
    }

    /// Number of grid points whose fetch failed
    pub fn failed_points(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::FetchFailure)
            .count()
    }
}

/// Scan coordinator
/// DOCUMENTATION: Drives regions through Resolving -> (Skipped | Scanning -> Completed)
///
/// Outbound calls are strictly sequential: one region at a time, one grid
/// point at a time, so at most one request is ever in flight. Errors from the
/// resolver, fetcher and sink are turned into diagnostics and never abort the
/// batch.
pub struct ScanCoordinator {
    resolver: Arc<dyn RegionResolver>,
    fetcher: Arc<dyn BusinessFetcher>,
    sink: Arc<dyn ReportSink>,
    settings: ScanSettings,
}

impl ScanCoordinator {
    pub fn new(
        resolver: Arc<dyn RegionResolver>,
        fetcher: Arc<dyn BusinessFetcher>,
        sink: Arc<dyn ReportSink>,
        settings: ScanSettings,
    ) -> Self {
        Self {
            resolver,
            fetcher,
            sink,
            settings,
        }
    }

    /// Scan one region
    /// DOCUMENTATION: Main scan method - resolves the region, generates its
    /// grid and fetches every point in row-major order
    ///
    /// Process:
    /// 1. Resolve the bounding box (not found or failed => Skipped, no fetches)
    /// 2. Generate the grid (unusable grid => Skipped, no fetches)
    /// 3. For each point, fetch and append tagged records; a failed fetch is
    ///    recorded as a diagnostic and the scan moves on
    /// 4. Pause for the pacing interval after every point
    pub async fn scan_region(&self, region: &str) -> RegionScan {
        log::info!("Processing {}", region);

        let bbox = match self.resolver.resolve(region).await {
            Ok(Some(bbox)) => bbox,
            Ok(None) => {
                log::warn!("Could not find a bounding box for {}, skipping", region);
                return RegionScan::skipped(
                    region,
                    Diagnostic::region(
                        DiagnosticKind::NotFound,
                        format!("no geocoder match for {}", region),
                    ),
                );
            }
            Err(e) => {
                log::error!("Failed to resolve {}: {}", region, e);
                return RegionScan::skipped(
                    region,
                    Diagnostic::region(DiagnosticKind::ResolutionFailure, e.to_string()),
                );
            }
        };

        let grid = match GridGenerator::generate(&bbox, self.settings.grid_step) {
            Ok(grid) => grid,
            Err(e) => {
                log::error!("Failed to generate grid for {}: {}", region, e);
                return RegionScan::skipped(
                    region,
                    Diagnostic::region(DiagnosticKind::InvalidGrid, e.to_string()),
                );
            }
        };

        let total = grid.len();
        log::info!(
            "Grid points for {}: {} ({} rows x {} cols)",
            region,
            total,
            grid.rows(),
            grid.cols()
        );

        let mut result = ScanResult::new();
        let mut diagnostics = Vec::new();

        for (idx, point) in grid.iter().enumerate() {
            log::info!("{} -> {}/{} : {}", region, idx + 1, total, point);

            match self
                .fetcher
                .fetch(point, &self.settings.category, self.settings.radius)
                .await
            {
                Ok(listings) => {
                    log::debug!("{} listings at {}", listings.len(), point);
                    result.extend_from_listings(region, point, listings);
                }
                Err(e) => {
                    log::warn!("Fetch failed for {} at {}: {}", region, point, e);
                    diagnostics.push(Diagnostic::at_point(
                        DiagnosticKind::FetchFailure,
                        point,
                        e.to_string(),
                    ));
                }
            }

            tokio::time::sleep(self.settings.pace_interval).await;
        }

        log::info!(
            "Scan completed for {}: {} records, {} failed points",
            region,
            result.len(),
            diagnostics.len()
        );

        RegionScan {
            region: region.to_string(),
            status: RegionStatus::Completed,
            grid_points: total,
            result,
            diagnostics,
        }
    }

    /// Scan one region and hand a non-empty result to the report sink
    pub async fn process_region(&self, region: &str) -> RegionReport {
        let scan = self.scan_region(region).await;
        let failed_points = scan.failed_points();
        let records = scan.result.len();
        let mut diagnostics = scan.diagnostics;

        let delivery = match scan.status {
            RegionStatus::Skipped => DeliveryStatus::NotAttempted,
            RegionStatus::Completed if scan.result.is_empty() => {
                log::info!("No data found for {}", region);
                DeliveryStatus::NoData
            }
            RegionStatus::Completed => match self.sink.deliver(region, scan.result).await {
                Ok(()) => {
                    log::info!("Report sent for {}", region);
                    DeliveryStatus::Delivered
                }
                Err(e) => {
                    log::error!("Report delivery failed for {}: {}", region, e);
                    diagnostics.push(Diagnostic::region(
                        DiagnosticKind::DeliveryFailure,
                        e.to_string(),
                    ));
                    DeliveryStatus::Failed
                }
            },
        };

        RegionReport {
            region: scan.region,
            status: scan.status,
            grid_points: scan.grid_points,
            records,
            failed_points,
            delivery,
            diagnostics,
        }
    }

    /// Process a list of regions in order
    /// DOCUMENTATION: Each region reaches Skipped or Completed (and is reported)
    /// before the next one starts
    ///
    /// # Returns
    /// RunSummary with one RegionReport per region, in input order
    pub async fn run_batch(&self, run_id: Uuid, regions: &[String]) -> RunSummary {
        let start_time = Instant::now();
        let mut summary = RunSummary::new(run_id);

        log::info!("Run {} started for {} regions", run_id, regions.len());

        for region in regions {
            let report = self.process_region(region).await;
            summary.regions.push(report);
        }

        summary.complete(start_time.elapsed().as_secs());

        log::info!(
            "ALL REGIONS COMPLETED (run {}): {} records, {} reports delivered, {} regions skipped in {}s",
            run_id,
            summary.total_records(),
            summary.reports_delivered(),
            summary.regions_skipped(),
            summary.duration_seconds
        );

        summary
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::errors::ScanError;
    use crate::models::{BoundingBox, BusinessListing, GridPoint};
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    /// Resolver backed by a fixed table; unknown regions are not found and
    /// regions listed in `failing` return a transport error
    pub(crate) struct FakeResolver {
        pub boxes: HashMap<String, BoundingBox>,
        pub failing: HashSet<String>,
    }

    #[async_trait]
    impl RegionResolver for FakeResolver {
        async fn resolve(&self, region: &str) -> Result<Option<BoundingBox>, ScanError> {
            if self.failing.contains(region) {
                return Err(ScanError::ResolutionFailed("timed out".to_string()));
            }
            Ok(self.boxes.get(region).copied())
        }
    }

    /// Fetcher returning one listing per point, failing on selected points
    #[derive(Default)]
    pub(crate) struct FakeFetcher {
        pub failing: Vec<GridPoint>,
        pub fail_all: bool,
        pub calls: Mutex<Vec<GridPoint>>,
    }

    #[async_trait]
    impl BusinessFetcher for FakeFetcher {
        async fn fetch(
            &self,
            point: GridPoint,
            _category: &str,
            _radius: u32,
        ) -> Result<Vec<BusinessListing>, ScanError> {
            self.calls.lock().unwrap().push(point);
            if self.fail_all || self.failing.contains(&point) {
                return Err(ScanError::FetchFailed("connection reset".to_string()));
            }
            Ok(vec![BusinessListing {
                name: Some(format!("Shop at {}", point)),
                ..Default::default()
            }])
        }
    }

    /// Sink recording deliveries; regions in `failing` are rejected
    #[derive(Default)]
    pub(crate) struct FakeSink {
        pub failing: HashSet<String>,
        pub delivered: Mutex<Vec<(String, ScanResult)>>,
    }

    #[async_trait]
    impl ReportSink for FakeSink {
        async fn deliver(&self, region: &str, result: ScanResult) -> Result<(), ScanError> {
            if self.failing.contains(region) {
                return Err(ScanError::DeliveryFailed("authentication failed".to_string()));
            }
            self.delivered.lock().unwrap().push((region.to_string(), result));
            Ok(())
        }
    }

    pub(crate) fn settings() -> ScanSettings {
        ScanSettings {
            grid_step: 0.3,
            category: "stationery".to_string(),
            radius: 20,
            pace_interval: Duration::ZERO,
        }
    }

    pub(crate) fn resolver_with(regions: &[(&str, BoundingBox)]) -> FakeResolver {
        FakeResolver {
            boxes: regions
                .iter()
                .map(|(name, bbox)| (name.to_string(), *bbox))
                .collect(),
            failing: HashSet::new(),
        }
    }

    /// 2 x 2 grid at step 0.3
    pub(crate) fn small_box() -> BoundingBox {
        BoundingBox::new(12.0, 12.3, 77.0, 77.3).unwrap()
    }

    fn coordinator(
        resolver: FakeResolver,
        fetcher: Arc<FakeFetcher>,
        sink: Arc<FakeSink>,
        settings: ScanSettings,
    ) -> ScanCoordinator {
        ScanCoordinator::new(Arc::new(resolver), fetcher, sink, settings)
    }

    #[tokio::test]
    async fn test_scan_collects_every_point() {
        let fetcher = Arc::new(FakeFetcher::default());
        let sink = Arc::new(FakeSink::default());
        let coordinator = coordinator(
            resolver_with(&[("Karnataka", small_box())]),
            fetcher.clone(),
            sink,
            settings(),
        );

        let scan = coordinator.scan_region("Karnataka").await;

        assert_eq!(scan.status, RegionStatus::Completed);
        assert_eq!(scan.grid_points, 4);
        assert_eq!(scan.result.len(), 4);
        assert!(scan.diagnostics.is_empty());

        let calls = fetcher.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                GridPoint::new(12.0, 77.0),
                GridPoint::new(12.0, 77.3),
                GridPoint::new(12.3, 77.0),
                GridPoint::new(12.3, 77.3),
            ]
        );

        let first = &scan.result.records()[0];
        assert_eq!(first.region, "Karnataka");
        assert_eq!((first.scan_lat, first.scan_lon), (12.0, 77.0));
    }

    #[tokio::test]
    async fn test_partial_failures_are_isolated() {
        let fetcher = Arc::new(FakeFetcher {
            failing: vec![GridPoint::new(12.0, 77.3), GridPoint::new(12.3, 77.0)],
            ..Default::default()
        });
        let sink = Arc::new(FakeSink::default());
        let coordinator = coordinator(
            resolver_with(&[("Karnataka", small_box())]),
            fetcher.clone(),
            sink.clone(),
            settings(),
        );

        let report = coordinator.process_region("Karnataka").await;

        assert_eq!(report.status, RegionStatus::Completed);
        assert_eq!(report.records, 2);
        assert_eq!(report.failed_points, 2);
        assert_eq!(report.delivery, DeliveryStatus::Delivered);
        assert_eq!(fetcher.calls.lock().unwrap().len(), 4);

        let failed: Vec<GridPoint> = report.diagnostics.iter().filter_map(|d| d.point).collect();
        assert_eq!(failed, vec![GridPoint::new(12.0, 77.3), GridPoint::new(12.3, 77.0)]);

        let delivered = sink.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].0, "Karnataka");
        assert_eq!(delivered[0].1.len(), 2);
    }

    #[tokio::test]
    async fn test_not_found_skips_without_fetching() {
        let fetcher = Arc::new(FakeFetcher::default());
        let sink = Arc::new(FakeSink::default());
        let coordinator = coordinator(resolver_with(&[]), fetcher.clone(), sink.clone(), settings());

        let report = coordinator.process_region("Atlantis").await;

        assert_eq!(report.status, RegionStatus::Skipped);
        assert_eq!(report.delivery, DeliveryStatus::NotAttempted);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].kind, DiagnosticKind::NotFound);
        assert!(fetcher.calls.lock().unwrap().is_empty());
        assert!(sink.delivered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resolution_failure_skips_region() {
        let mut resolver = resolver_with(&[("Kerala", small_box())]);
        resolver.failing.insert("Kerala".to_string());
        let fetcher = Arc::new(FakeFetcher::default());
        let coordinator = coordinator(resolver, fetcher.clone(), Arc::new(FakeSink::default()), settings());

        let report = coordinator.process_region("Kerala").await;

        assert_eq!(report.status, RegionStatus::Skipped);
        assert_eq!(report.diagnostics[0].kind, DiagnosticKind::ResolutionFailure);
        assert!(fetcher.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unusable_grid_skips_region() {
        let mut bad_step = settings();
        bad_step.grid_step = 0.0;
        let fetcher = Arc::new(FakeFetcher::default());
        let coordinator = coordinator(
            resolver_with(&[("Karnataka", small_box())]),
            fetcher.clone(),
            Arc::new(FakeSink::default()),
            bad_step,
        );

        let report = coordinator.process_region("Karnataka").await;

        assert_eq!(report.status, RegionStatus::Skipped);
        assert_eq!(report.delivery, DeliveryStatus::NotAttempted);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].kind, DiagnosticKind::InvalidGrid);
        assert!(fetcher.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_all_points_failing_emits_no_report() {
        let fetcher = Arc::new(FakeFetcher {
            fail_all: true,
            ..Default::default()
        });
        let sink = Arc::new(FakeSink::default());
        let coordinator = coordinator(
            resolver_with(&[("Karnataka", small_box())]),
            fetcher,
            sink.clone(),
            settings(),
        );

        let report = coordinator.process_region("Karnataka").await;

        assert_eq!(report.status, RegionStatus::Completed);
        assert_eq!(report.records, 0);
        assert_eq!(report.delivery, DeliveryStatus::NoData);
        assert_eq!(report.diagnostics.len(), report.grid_points);
        assert!(sink.delivered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delivery_failure_does_not_stop_batch() {
        let resolver = resolver_with(&[("Tamil Nadu", small_box()), ("Karnataka", small_box())]);
        let sink = Arc::new(FakeSink {
            failing: HashSet::from(["Tamil Nadu".to_string()]),
            ..Default::default()
        });
        let coordinator = coordinator(
            resolver,
            Arc::new(FakeFetcher::default()),
            sink.clone(),
            settings(),
        );

        let regions = vec![
            "Tamil Nadu".to_string(),
            "Atlantis".to_string(),
            "Karnataka".to_string(),
        ];
        let summary = coordinator.run_batch(Uuid::new_v4(), &regions).await;

        let order: Vec<&str> = summary.regions.iter().map(|r| r.region.as_str()).collect();
        assert_eq!(order, vec!["Tamil Nadu", "Atlantis", "Karnataka"]);

        assert_eq!(summary.regions[0].delivery, DeliveryStatus::Failed);
        assert_eq!(
            summary.regions[0].diagnostics.last().unwrap().kind,
            DiagnosticKind::DeliveryFailure
        );
        assert_eq!(summary.regions[1].status, RegionStatus::Skipped);
        assert_eq!(summary.regions[2].delivery, DeliveryStatus::Delivered);
        assert_eq!(summary.reports_delivered(), 1);
        assert!(summary.completed_at.is_some());

        let delivered = sink.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].0, "Karnataka");
    }

    #[tokio::test]
    async fn test_pacing_after_every_point() {
        let mut paced = settings();
        paced.pace_interval = Duration::from_millis(20);
        let fetcher = Arc::new(FakeFetcher {
            fail_all: true,
            ..Default::default()
        });
        let coordinator = coordinator(
            resolver_with(&[("Karnataka", small_box())]),
            fetcher,
            Arc::new(FakeSink::default()),
            paced,
        );

        let started = Instant::now();
        let scan = coordinator.scan_region("Karnataka").await;

        // The pause is not skipped for failed points
        assert_eq!(scan.failed_points(), 4);
        assert!(started.elapsed() >= Duration::from_millis(80));
    }
}
