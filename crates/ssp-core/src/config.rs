//! Configuration types for the simulation.

use crate::error::{Error, Result};
use crate::types::{Obstacle, Point, SpecialZone};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Grid configuration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// Number of columns (x runs over `1..=columns`)
    pub columns: i32,
    /// Number of rows (y runs over `1..=rows`)
    pub rows: i32,
    /// Impassable cells
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
    /// Rectangles whose border carries a surcharge
    #[serde(default)]
    pub special_zones: Vec<SpecialZone>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: 5,
            rows: 4,
            obstacles: vec![
                Obstacle::new(2, 1),
                Obstacle::new(2, 3),
                Obstacle::new(2, 4),
                Obstacle::new(4, 2),
            ],
            special_zones: vec![SpecialZone::new(4, Point::new(3, 2), Point::new(4, 4))],
        }
    }
}

impl GridConfig {
    pub fn contains(&self, point: Point) -> bool {
        (1..=self.columns).contains(&point.x) && (1..=self.rows).contains(&point.y)
    }

    pub fn is_obstacle(&self, point: Point) -> bool {
        self.obstacles.iter().any(|o| o.position() == point)
    }
}

/// Population parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Individuals placed at the origin when the run starts
    pub initial_size: usize,
    /// Population size at which an epidemic is triggered
    pub max_size: usize,
    /// Exponent of the comfort formula
    pub comfort_sensitivity: i32,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            initial_size: 10,
            max_size: 100,
            comfort_sensitivity: 3,
        }
    }
}

/// Scaling parameters of the exponential waiting times
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateConfig {
    pub death: f64,
    #[serde(rename = "move")]
    pub movement: f64,
    pub reproduction: f64,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            death: 10.0,
            movement: 1.0,
            reproduction: 1.0,
        }
    }
}

/// Complete description of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Simulation horizon
    pub final_instant: f64,
    /// Random seed for reproducibility
    #[serde(default)]
    pub seed: u64,
    pub origin: Point,
    pub goal: Point,
    pub grid: GridConfig,
    pub population: PopulationConfig,
    pub rates: RateConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            final_instant: 100.0,
            seed: 0,
            origin: Point::new(1, 1),
            goal: Point::new(5, 4),
            grid: GridConfig::default(),
            population: PopulationConfig::default(),
            rates: RateConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SimulationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        debug!(path = %path.display(), "Loaded simulation configuration");
        Ok(config)
    }

    /// Check every constraint the engine relies on
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(Error::InvalidConfiguration(msg));

        if self.grid.columns < 1 || self.grid.rows < 1 {
            return invalid(format!(
                "grid must be at least 1x1, got {}x{}",
                self.grid.columns, self.grid.rows
            ));
        }
        if self.grid.columns.checked_mul(self.grid.rows).is_none() {
            return invalid(format!(
                "grid of {}x{} cells is too large",
                self.grid.columns, self.grid.rows
            ));
        }

        for obstacle in &self.grid.obstacles {
            if !self.grid.contains(obstacle.position()) {
                return invalid(format!("obstacle {} lies outside the grid", obstacle.position()));
            }
        }

        for zone in &self.grid.special_zones {
            if zone.cost < 1 {
                return invalid(format!("special zone [{}] has a cost below 1", zone));
            }
        }

        for (name, point) in [("origin", self.origin), ("goal", self.goal)] {
            if !self.grid.contains(point) {
                return invalid(format!("{} {} lies outside the grid", name, point));
            }
            if self.grid.is_obstacle(point) {
                return invalid(format!("{} {} is an obstacle", name, point));
            }
        }

        if self.population.max_size < 1 {
            return invalid("maximum population must be at least 1".to_string());
        }

        if self.population.comfort_sensitivity < 1 {
            return invalid(format!(
                "comfort sensitivity must be positive, got {}",
                self.population.comfort_sensitivity
            ));
        }

        for (name, value) in [
            ("death", self.rates.death),
            ("move", self.rates.movement),
            ("reproduction", self.rates.reproduction),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return invalid(format!("{} parameter must be positive, got {}", name, value));
            }
        }

        if !(self.final_instant.is_finite() && self.final_instant > 0.0) {
            return invalid(format!(
                "final instant must be positive, got {}",
                self.final_instant
            ));
        }

        Ok(())
    }
}
