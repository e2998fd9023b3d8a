//! Cost-weighted 2D grid.

use crate::individual::Individual;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use ssp_core::{ComfortModel, Direction, Error, GridConfig, Obstacle, Point, Result, SpecialZone};
use std::collections::HashSet;

/// Row-major offset of an in-bounds point on a grid `columns` cells wide
pub fn cell_index(columns: i32, point: Point) -> usize {
    (point.y - 1) as usize * columns as usize + (point.x - 1) as usize
}

/// A bounded grid with 1-based coordinates.
///
/// Every cell costs at least 1; the border cells of special zones carry the
/// zone's cost (the maximum one where zones overlap).
#[derive(Debug, Clone)]
pub struct Grid {
    columns: i32,
    rows: i32,
    cmax: u32,
    costs: Vec<u32>,
    obstacles: HashSet<Point>,
    goal: Option<Point>,
}

impl Grid {
    pub fn new(
        columns: i32,
        rows: i32,
        obstacles: &[Obstacle],
        zones: &[SpecialZone],
    ) -> Result<Self> {
        if columns < 1 || rows < 1 {
            return Err(Error::InvalidConfiguration(format!(
                "grid must be at least 1x1, got {}x{}",
                columns, rows
            )));
        }
        if columns.checked_mul(rows).is_none() {
            return Err(Error::InvalidConfiguration(format!(
                "grid of {}x{} cells is too large",
                columns, rows
            )));
        }

        let mut grid = Self {
            columns,
            rows,
            cmax: 1,
            costs: Vec::new(),
            obstacles: obstacles.iter().map(Obstacle::position).collect(),
            goal: None,
        };
        grid.build_cost_map(zones);

        Ok(grid)
    }

    /// Create a grid from its configuration
    pub fn from_config(config: &GridConfig) -> Result<Self> {
        Self::new(
            config.columns,
            config.rows,
            &config.obstacles,
            &config.special_zones,
        )
    }

    /// Reset every cell to cost 1, then raise the border cells of each zone.
    pub fn build_cost_map(&mut self, zones: &[SpecialZone]) {
        self.costs = vec![1; self.columns as usize * self.rows as usize];
        self.cmax = 1;

        for zone in zones {
            let (min_x, min_y, max_x, max_y) = zone.bounds();
            for y in min_y.max(1)..=max_y.min(self.rows) {
                for x in min_x.max(1)..=max_x.min(self.columns) {
                    let point = Point::new(x, y);
                    if !zone.on_border(point) {
                        continue;
                    }
                    let index = self.index(point);
                    self.costs[index] = self.costs[index].max(zone.cost);
                }
            }
        }

        self.cmax = self.costs.iter().copied().max().unwrap_or(1);
    }

    pub fn columns(&self) -> i32 {
        self.columns
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    /// Number of cells
    pub fn area(&self) -> usize {
        self.costs.len()
    }

    /// Highest cell cost on the grid
    pub fn cmax(&self) -> u32 {
        self.cmax
    }

    pub fn goal(&self) -> Option<Point> {
        self.goal
    }

    pub fn set_goal(&mut self, goal: Point) {
        self.goal = Some(goal);
    }

    /// Comfort constants for individuals living on this grid
    pub fn comfort_model(&self, sensitivity: i32) -> ComfortModel {
        ComfortModel::new(self.cmax, self.columns as u32, self.rows as u32, sensitivity)
    }

    pub fn contains(&self, point: Point) -> bool {
        (1..=self.columns).contains(&point.x) && (1..=self.rows).contains(&point.y)
    }

    pub fn is_obstacle(&self, point: Point) -> bool {
        self.obstacles.contains(&point)
    }

    /// Cost of a cell. Panics if `point` is outside the grid.
    pub fn cost(&self, point: Point) -> u32 {
        self.costs[self.index(point)]
    }

    /// Row-major offset of an in-bounds point
    pub fn index(&self, point: Point) -> usize {
        cell_index(self.columns, point)
    }

    /// Directions leading to an in-bounds, non-obstacle cell, in
    /// up/right/down/left order.
    pub fn valid_moves(&self, point: Point) -> Vec<Direction> {
        Direction::all()
            .into_iter()
            .filter(|&direction| {
                let next = point.towards(direction);
                self.contains(next) && !self.is_obstacle(next)
            })
            .collect()
    }

    /// Cost of the hop `origin -> destination`.
    ///
    /// A hop only pays a surcharge when both ends are premium cells.
    pub fn step_cost(&self, origin: Point, destination: Point) -> u32 {
        let to = self.cost(destination);
        if self.cost(origin) == 1 || to == 1 {
            1
        } else {
            to
        }
    }

    /// Manhattan distance to the goal, ignoring obstacles. Zero when no goal is set.
    pub fn distance_to_goal(&self, point: Point) -> u32 {
        self.goal
            .map_or(0, |goal| goal.manhattan_distance(&point))
    }

    /// Move `individual` one cell in a uniformly drawn valid direction.
    ///
    /// An individual with no valid move stays put and no random number is drawn.
    pub fn step(&self, individual: &mut Individual, rng: &mut ChaCha8Rng) -> Option<Direction> {
        let moves = self.valid_moves(individual.position());
        if moves.is_empty() {
            return None;
        }

        let direction = moves[rng.gen_range(0..moves.len())];
        individual.set_position(individual.position().towards(direction));
        Some(direction)
    }

    /// Iterator over all cells with their costs
    pub fn iter(&self) -> impl Iterator<Item = (Point, u32)> + '_ {
        self.costs.iter().enumerate().map(move |(i, &cost)| {
            let x = (i as i32) % self.columns + 1;
            let y = (i as i32) / self.columns + 1;
            (Point::new(x, y), cost)
        })
    }
}
