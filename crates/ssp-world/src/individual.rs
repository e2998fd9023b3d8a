//! Individual state and path bookkeeping.

use crate::grid::{cell_index, Grid};
use serde::{Deserialize, Serialize};
use ssp_core::{ComfortModel, PathMetrics, Point};
use std::fmt;

/// Stable handle of an individual.
///
/// Keys are never reused within a run, unlike [`Individual::id`], which is
/// reassigned by every epidemic. Pending events refer to their owner by key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndividualKey(pub u64);

impl fmt::Display for IndividualKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What an individual needs to know about its surroundings when it updates.
#[derive(Debug, Clone, Copy)]
pub struct Habitat<'a> {
    pub grid: &'a Grid,
    pub model: ComfortModel,
    pub goal: Option<Point>,
}

impl<'a> Habitat<'a> {
    pub fn new(grid: &'a Grid, sensitivity: i32, goal: Option<Point>) -> Self {
        Self {
            grid,
            model: grid.comfort_model(sensitivity),
            goal,
        }
    }
}

/// Number of leading path points a child inherits from a parent with the
/// given path length and comfort.
pub fn inherited_chunk(path_len: usize, comfort: f64) -> usize {
    let len = path_len as f64;
    let chunk = (0.9 * len + comfort * 0.1 * len).ceil() as usize;
    chunk.min(path_len)
}

/// A path-finding agent
#[derive(Debug, Clone)]
pub struct Individual {
    key: IndividualKey,
    id: u32,
    position: Point,
    path: Vec<Point>,
    visited: Vec<bool>,
    columns: i32,
    metrics: PathMetrics,
    comfort: f64,
    death_time: f64,
    reached_goal: bool,
}

impl Individual {
    /// A fresh individual standing at `position` with an empty path.
    ///
    /// Nothing is recorded until the first [`Individual::update`].
    pub fn new(key: IndividualKey, id: u32, position: Point, grid: &Grid) -> Self {
        Self {
            key,
            id,
            position,
            path: Vec::new(),
            visited: vec![false; grid.area()],
            columns: grid.columns(),
            metrics: PathMetrics::default(),
            comfort: 0.0,
            death_time: f64::INFINITY,
            reached_goal: false,
        }
    }

    pub fn key(&self) -> IndividualKey {
        self.key
    }

    /// Population-local id. Not stable across epidemics.
    pub fn id(&self) -> u32 {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: u32) {
        self.id = id;
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    pub fn path(&self) -> &[Point] {
        &self.path
    }

    pub fn copy_path(&self) -> Vec<Point> {
        self.path.clone()
    }

    pub fn metrics(&self) -> PathMetrics {
        self.metrics
    }

    pub fn cost(&self) -> u32 {
        self.metrics.cost
    }

    pub fn length(&self) -> u32 {
        self.metrics.length
    }

    pub fn dist(&self) -> u32 {
        self.metrics.dist
    }

    pub fn comfort(&self) -> f64 {
        self.comfort
    }

    /// Instant of the scheduled death; infinite until a death is scheduled.
    pub fn death_time(&self) -> f64 {
        self.death_time
    }

    pub(crate) fn set_death_time(&mut self, time: f64) {
        self.death_time = time;
    }

    /// Whether this individual has ever stood on the goal
    pub fn reached_goal(&self) -> bool {
        self.reached_goal
    }

    pub fn has_visited(&self, point: Point) -> bool {
        self.visited[self.visited_index(point)]
    }

    fn visited_index(&self, point: Point) -> usize {
        cell_index(self.columns, point)
    }

    /// Record the current position.
    ///
    /// Revisiting a cell collapses the loop back to its first occurrence;
    /// otherwise the position is appended and the step cost accumulated.
    /// Distance and comfort are always recomputed. Returns whether the goal
    /// has ever been reached.
    pub fn update(&mut self, habitat: &Habitat<'_>) -> bool {
        let grid = habitat.grid;

        if self.has_visited(self.position) {
            self.remove_loop(grid);
        } else {
            let index = self.visited_index(self.position);
            self.visited[index] = true;
            self.path.push(self.position);

            if self.path.len() == 1 {
                self.metrics.length = 0;
            } else {
                self.metrics.length += 1;
                let n = self.path.len();
                self.metrics.cost += grid.step_cost(self.path[n - 2], self.path[n - 1]);
            }
        }

        self.metrics.dist = grid.distance_to_goal(self.position);
        self.comfort = habitat.model.comfort(&self.metrics);

        if !self.reached_goal && habitat.goal == Some(self.position) {
            self.reached_goal = true;
        }

        self.reached_goal
    }

    /// Truncate the path just after the first occurrence of the current
    /// position and recompute length and cost from scratch.
    pub fn remove_loop(&mut self, grid: &Grid) {
        let Some(start) = self.path.iter().position(|&p| p == self.position) else {
            return;
        };

        let columns = self.columns;
        for point in self.path.drain(start + 1..) {
            self.visited[cell_index(columns, point)] = false;
        }

        self.metrics.length = (self.path.len() - 1) as u32;
        self.metrics.cost = self
            .path
            .windows(2)
            .map(|hop| grid.step_cost(hop[0], hop[1]))
            .sum();
    }

    /// Build a child at this individual's position that replays the
    /// inherited prefix of this individual's path.
    ///
    /// The child derives its own visited set, cost and comfort through
    /// [`Individual::update`]. Registering it is up to the caller.
    pub fn spawn_child(&self, key: IndividualKey, id: u32, habitat: &Habitat<'_>) -> Individual {
        let mut child = Individual::new(key, id, self.position, habitat.grid);
        let chunk = inherited_chunk(self.path.len(), self.comfort);

        for &point in &self.path[..chunk] {
            child.set_position(point);
            child.update(habitat);
        }

        child
    }
}

impl fmt::Display for Individual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {}; Cost: {}; Comf: {}; Pos: {}",
            self.id, self.metrics.cost, self.comfort, self.position
        )
    }
}
