// src/services/grid_generator.rs
// DOCUMENTATION: Geographic grid generation for region coverage
// PURPOSE: Tile a bounding box into an ordered sequence of scan coordinates

use crate::config::env::MIN_GRID_STEP;
use crate::errors::ScanError;
use crate::models::{BoundingBox, GridPoint};

/// Slack added before flooring the row/column count so that a bound that
/// sits exactly on a step (e.g. 0.3 / 0.1) is not lost to float error
const STEP_EPSILON: f64 = 1e-7;

/// Regular lattice covering one bounding box
/// DOCUMENTATION: A finite, restartable, deterministic sequence of grid points
///
/// Points are visited row-major: latitude advances from `min_lat` to `max_lat`
/// in increments of `step`; within each row longitude advances from `min_lon`
/// to `max_lon`. Both ends are inclusive. Each coordinate is computed from its
/// index (`min + i * step`) instead of by repeated addition, so drift never
/// accumulates across long rows.
#[derive(Debug, Clone)]
pub struct Grid {
    bbox: BoundingBox,
    step: f64,
    rows: usize,
    cols: usize,
}

impl Grid {
    /// Number of points in the grid (always at least one)
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Point at a row-major index
    fn point_at(&self, index: usize) -> GridPoint {
        let row = index / self.cols;
        let col = index % self.cols;

        GridPoint::new(
            self.bbox.min_lat() + row as f64 * self.step,
            self.bbox.min_lon() + col as f64 * self.step,
        )
    }

    /// Iterate the points in row-major order; every call starts over
    pub fn iter(&self) -> GridIter<'_> {
        GridIter {
            grid: self,
            next: 0,
        }
    }

    /// Materialize every point
    #[allow(dead_code)]
    pub fn points(&self) -> Vec<GridPoint> {
        self.iter().collect()
    }
}

impl<'a> IntoIterator for &'a Grid {
    type Item = GridPoint;
    type IntoIter = GridIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct GridIter<'a> {
    grid: &'a Grid,
    next: usize,
}

impl Iterator for GridIter<'_> {
    type Item = GridPoint;

    fn next(&mut self) -> Option<GridPoint> {
        if self.next >= self.grid.len() {
            return None;
        }

        let point = self.grid.point_at(self.next);
        self.next += 1;
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.grid.len() - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for GridIter<'_> {}

/// Grid generator service
/// DOCUMENTATION: Generates systematic grid coverage for regions
pub struct GridGenerator;

impl GridGenerator {
    /// Generate the scan grid for a bounding box
    /// DOCUMENTATION: Creates a lattice of search points covering the whole box
    ///
    /// A step wider than the box still yields the box's minimum corner, so a
    /// valid box always produces at least one point.
    ///
    /// # Arguments
    /// * `bbox` - Region geographic boundaries
    /// * `step` - Grid spacing in degrees (at least 0.0001, the rounding precision)
    ///
    /// # Returns
    /// The grid, or `InvalidInput` for a step that is not a usable spacing
    pub fn generate(bbox: &BoundingBox, step: f64) -> Result<Grid, ScanError> {
        if !step.is_finite() || step < MIN_GRID_STEP {
            return Err(ScanError::InvalidInput(format!(
                "grid step must be a finite value of at least {}, got {}",
                MIN_GRID_STEP, step
            )));
        }

        let rows = Self::steps_within(bbox.max_lat() - bbox.min_lat(), step)?;
        let cols = Self::steps_within(bbox.max_lon() - bbox.min_lon(), step)?;

        if rows.checked_mul(cols).is_none() {
            return Err(ScanError::InvalidInput(format!(
                "grid of {} x {} points is too large",
                rows, cols
            )));
        }

        let grid = Grid {
            bbox: *bbox,
            step,
            rows,
            cols,
        };

        log::info!(
            "Generated {} grid points ({} rows x {} cols, step {}°, coverage: {:.2} km²)",
            grid.len(),
            rows,
            cols,
            step,
            bbox.area_km2()
        );

        Ok(grid)
    }

    /// Count of lattice positions in `[0, span]` at the given step
    fn steps_within(span: f64, step: f64) -> Result<usize, ScanError> {
        let steps = (span / step + STEP_EPSILON).floor();

        if !steps.is_finite() || steps < 0.0 || steps >= usize::MAX as f64 {
            return Err(ScanError::InvalidInput(format!(
                "span of {} degrees at step {} gives an unusable grid",
                span, step
            )));
        }

        (steps as usize).checked_add(1).ok_or_else(|| {
            ScanError::InvalidInput(format!("span of {} degrees is too large", span))
        })
    }
}
