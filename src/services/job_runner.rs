// src/services/job_runner.rs
// DOCUMENTATION: Background worker for scan runs
// PURPOSE: Accept run requests without blocking the caller and execute them one at a time

use crate::errors::ScanError;
use crate::models::RunSummary;
use crate::services::ScanCoordinator;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

/// One queued batch run
#[derive(Debug)]
struct ScanJob {
    run_id: Uuid,
    regions: Vec<String>,
}

#[derive(Debug, Default)]
struct RunnerState {
    /// Run that is queued or executing
    active_run: Option<Uuid>,
    /// Summary of the most recently finished run
    last_run: Option<RunSummary>,
}

/// Acknowledgment returned to the caller of `trigger`
#[derive(Debug, Clone, Serialize)]
pub struct TriggeredRun {
    pub run_id: Uuid,
    pub regions: Vec<String>,
}

/// Snapshot of the worker state
#[derive(Debug, Clone, Serialize)]
pub struct RunnerStatus {
    /// "running" or "idle"
    pub status: &'static str,
    pub active_run_id: Option<Uuid>,
    pub last_run: Option<RunSummary>,
}

/// Handle to the scan worker
/// DOCUMENTATION: Cheap to clone; shared with the HTTP handlers.
/// At most one run is active at a time. A trigger while a run is queued or
/// executing is rejected rather than interleaved.
#[derive(Clone)]
pub struct ScanJobRunner {
    sender: mpsc::UnboundedSender<ScanJob>,
    state: Arc<RwLock<RunnerState>>,
    default_regions: Arc<Vec<String>>,
}

impl ScanJobRunner {
    /// Start the background worker
    /// DOCUMENTATION: Spawns the single worker task on the current runtime.
    /// The worker lives as long as any handle does.
    pub fn start(coordinator: Arc<ScanCoordinator>, default_regions: Vec<String>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let state = Arc::new(RwLock::new(RunnerState::default()));

        tokio::spawn(run_worker(coordinator, receiver, state.clone()));

        Self {
            sender,
            state,
            default_regions: Arc::new(default_regions),
        }
    }

    /// Queue a run and return immediately
    ///
    /// # Arguments
    /// * `regions` - Regions to scan in order, or None for the configured list
    ///
    /// # Returns
    /// The run id, or `ScanInProgress` when another run is active
    pub async fn trigger(&self, regions: Option<Vec<String>>) -> Result<TriggeredRun, ScanError> {
        let regions = regions.unwrap_or_else(|| self.default_regions.to_vec());

        let mut state = self.state.write().await;
        if let Some(active) = state.active_run {
            log::warn!("Rejecting trigger: run {} is still active", active);
            return Err(ScanError::ScanInProgress);
        }

        let run_id = Uuid::new_v4();
        self.sender
            .send(ScanJob {
                run_id,
                regions: regions.clone(),
            })
            .map_err(|_| {
                log::error!("Scan worker is not running");
                ScanError::InternalError
            })?;

        state.active_run = Some(run_id);
        log::info!("Queued run {} for {} regions", run_id, regions.len());

        Ok(TriggeredRun { run_id, regions })
    }

    pub async fn status(&self) -> RunnerStatus {
        let state = self.state.read().await;

        RunnerStatus {
            status: if state.active_run.is_some() { "running" } else { "idle" },
            active_run_id: state.active_run,
            last_run: state.last_run.clone(),
        }
    }
}

/// Worker loop
/// DOCUMENTATION: Runs each job in its own task so a panic inside a scan is
/// reported here instead of killing the worker; the active flag is cleared
/// whatever the outcome
async fn run_worker(
    coordinator: Arc<ScanCoordinator>,
    mut receiver: mpsc::UnboundedReceiver<ScanJob>,
    state: Arc<RwLock<RunnerState>>,
) {
    log::info!("Scan worker started");

    while let Some(job) = receiver.recv().await {
        let run_id = job.run_id;
        let coordinator = coordinator.clone();

        let handle =
            tokio::spawn(async move { coordinator.run_batch(job.run_id, &job.regions).await });

        let summary = match handle.await {
            Ok(summary) => Some(summary),
            Err(e) => {
                log::error!("Run {} aborted: {}", run_id, e);
                None
            }
        };

        let mut guard = state.write().await;
        guard.active_run = None;
        if summary.is_some() {
            guard.last_run = summary;
        }
    }

    log::info!("Scan worker stopped");
}
