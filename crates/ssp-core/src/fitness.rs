//! Comfort (fitness) of a path on the grid.

use serde::{Deserialize, Serialize};

/// Raw measurements of an individual's path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathMetrics {
    /// Sum of the step costs along the path
    pub cost: u32,
    /// Number of steps (path points minus one)
    pub length: u32,
    /// Manhattan distance from the current position to the goal
    pub dist: u32,
}

/// Grid-wide constants entering the comfort formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComfortModel {
    /// Maximum cell cost on the grid (at least 1)
    pub cmax: u32,
    pub columns: u32,
    pub rows: u32,
    /// Exponent applied to both comfort factors
    pub sensitivity: i32,
}

impl ComfortModel {
    pub fn new(cmax: u32, columns: u32, rows: u32, sensitivity: i32) -> Self {
        Self {
            cmax,
            columns,
            rows,
            sensitivity,
        }
    }

    /// Efficiency factor: how close `cost` is to `length` relative to the
    /// worst case `cmax * length`.
    pub fn efficiency(&self, metrics: &PathMetrics) -> f64 {
        let excess = metrics.cost as f64 - metrics.length as f64 + 2.0;
        let worst = (self.cmax as f64 - 1.0) * metrics.length as f64 + 3.0;
        1.0 - excess / worst
    }

    /// Proximity factor: 1 at the goal, approaching 0 far away.
    pub fn proximity(&self, metrics: &PathMetrics) -> f64 {
        1.0 - metrics.dist as f64 / (self.columns as f64 + self.rows as f64 + 1.0)
    }

    /// Comfort in (0, 1) for well-formed metrics
    /// (`length <= cost <= cmax * length`, `dist < columns + rows`).
    pub fn comfort(&self, metrics: &PathMetrics) -> f64 {
        self.efficiency(metrics).powi(self.sensitivity)
            * self.proximity(metrics).powi(self.sensitivity)
    }
}
