//! Population membership and epidemic culling.

use crate::grid::Grid;
use crate::individual::{Habitat, Individual, IndividualKey};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use ssp_core::{Error, Point, PopulationConfig, Result};
use std::collections::HashMap;
use std::fmt;

/// Individuals an epidemic always spares, ranked by comfort.
pub const EPIDEMIC_SURVIVORS: usize = 5;

/// The live individuals of a run.
///
/// Ids are population-local: they are handed out incrementally and
/// renumbered `0..len` after every epidemic. Use [`IndividualKey`] for a
/// stable identity.
#[derive(Debug, Clone)]
pub struct Population {
    individuals: HashMap<IndividualKey, Individual>,
    order: Vec<IndividualKey>,
    vmax: usize,
    comfort_sensitivity: i32,
    next_id: u32,
    next_key: u64,
    goal: Option<Point>,
}

impl Population {
    pub fn new(vmax: usize, comfort_sensitivity: i32) -> Self {
        Self {
            individuals: HashMap::new(),
            order: Vec::new(),
            vmax,
            comfort_sensitivity,
            next_id: 0,
            next_key: 0,
            goal: None,
        }
    }

    pub fn from_config(config: &PopulationConfig) -> Self {
        Self::new(config.max_size, config.comfort_sensitivity)
    }

    /// Place `count` fresh individuals at `origin`
    pub fn populate(&mut self, count: usize, origin: Point, grid: &Grid) -> Vec<IndividualKey> {
        (0..count).map(|_| self.spawn_at(origin, grid)).collect()
    }

    /// Create, record and register a new individual at `position`
    pub fn spawn_at(&mut self, position: Point, grid: &Grid) -> IndividualKey {
        let (key, id) = self.allocate();
        let mut individual = Individual::new(key, id, position, grid);
        individual.update(&self.habitat(grid));
        self.add(individual)
    }

    fn allocate(&mut self) -> (IndividualKey, u32) {
        let key = IndividualKey(self.next_key);
        let id = self.next_id;
        self.next_key += 1;
        self.next_id += 1;
        (key, id)
    }

    pub fn habitat<'a>(&self, grid: &'a Grid) -> Habitat<'a> {
        Habitat::new(grid, self.comfort_sensitivity, self.goal)
    }

    pub fn goal(&self) -> Option<Point> {
        self.goal
    }

    pub fn set_goal(&mut self, goal: Point) {
        self.goal = Some(goal);
    }

    /// Current size (`v`)
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Size at which an epidemic is due
    pub fn vmax(&self) -> usize {
        self.vmax
    }

    pub fn comfort_sensitivity(&self) -> i32 {
        self.comfort_sensitivity
    }

    pub fn is_crowded(&self) -> bool {
        self.len() >= self.vmax
    }

    pub fn contains(&self, key: IndividualKey) -> bool {
        self.individuals.contains_key(&key)
    }

    pub fn get(&self, key: IndividualKey) -> Option<&Individual> {
        self.individuals.get(&key)
    }

    pub fn get_mut(&mut self, key: IndividualKey) -> Option<&mut Individual> {
        self.individuals.get_mut(&key)
    }

    /// Individuals in population order
    pub fn iter(&self) -> impl Iterator<Item = &Individual> + '_ {
        self.order.iter().filter_map(move |key| self.individuals.get(key))
    }

    pub fn add(&mut self, individual: Individual) -> IndividualKey {
        let key = individual.key();
        self.order.push(key);
        self.individuals.insert(key, individual);
        key
    }

    pub fn remove(&mut self, key: IndividualKey) -> Option<Individual> {
        let individual = self.individuals.remove(&key)?;
        self.order.retain(|&k| k != key);
        Some(individual)
    }

    /// Create a child of `parent` and register it.
    pub fn make_child(&mut self, parent: IndividualKey, grid: &Grid) -> Result<IndividualKey> {
        if !self.contains(parent) {
            return Err(Error::InvalidState(format!(
                "individual {} cannot reproduce: not in the population",
                parent
            )));
        }

        let (key, id) = self.allocate();
        let habitat = self.habitat(grid);
        let child = self.individuals[&parent].spawn_child(key, id, &habitat);
        Ok(self.add(child))
    }

    /// Thin the population.
    ///
    /// The [`EPIDEMIC_SURVIVORS`] most comfortable individuals are kept;
    /// every other one survives with probability equal to its comfort.
    /// Survivors are renumbered `0..len` in comfort order. Returns the
    /// removed individuals so their pending events can be purged.
    pub fn epidemic_cull(&mut self, rng: &mut ChaCha8Rng) -> Vec<Individual> {
        let individuals = &self.individuals;
        self.order
            .sort_by(|a, b| individuals[b].comfort().total_cmp(&individuals[a].comfort()));

        let mut survivors = Vec::with_capacity(self.order.len());
        let mut removed = Vec::new();

        for (rank, key) in std::mem::take(&mut self.order).into_iter().enumerate() {
            if rank < EPIDEMIC_SURVIVORS {
                survivors.push(key);
                continue;
            }

            let draw: f64 = rng.gen();
            if draw > self.individuals[&key].comfort() {
                if let Some(individual) = self.individuals.remove(&key) {
                    removed.push(individual);
                }
            } else {
                survivors.push(key);
            }
        }

        self.order = survivors;
        for (id, key) in self.order.iter().enumerate() {
            if let Some(individual) = self.individuals.get_mut(key) {
                individual.set_id(id as u32);
            }
        }
        self.next_id = self.order.len() as u32;

        removed
    }
}

impl fmt::Display for Population {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v: {}; vmax: {}; Individuals:", self.len(), self.vmax)?;
        for individual in self.iter() {
            write!(f, "\n{}", individual)?;
        }
        Ok(())
    }
}
