//! Simulation events and the state they act on.

use crate::grid::Grid;
use crate::individual::{Individual, IndividualKey};
use crate::observation::{ObservationReport, ObservationSink};
use crate::pec::Pec;
use crate::population::Population;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use ssp_core::{Error, RateConfig, Result, SimulationConfig};
use tracing::{debug, info, trace};

/// Mutable state shared by every event of a run.
#[derive(Debug)]
pub struct SimContext {
    pub grid: Grid,
    pub population: Population,
    pub pec: Pec,
    pub rates: RateConfig,
    pub rng: ChaCha8Rng,
    pub current_time: f64,
    /// Death, Move and Reproduction events executed so far
    pub event_count: u64,
    /// Whether any individual has ever stood on the goal
    pub goal_reached: bool,
}

impl SimContext {
    /// Empty population on the configured grid, clock at zero.
    pub fn new(config: &SimulationConfig) -> Result<Self> {
        let mut grid = Grid::from_config(&config.grid)?;
        grid.set_goal(config.goal);

        let mut population = Population::from_config(&config.population);
        population.set_goal(config.goal);

        Ok(Self {
            grid,
            population,
            pec: Pec::new(),
            rates: config.rates.clone(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            current_time: 0.0,
            event_count: 0,
            goal_reached: false,
        })
    }

    pub fn individual(&self, key: IndividualKey) -> Result<&Individual> {
        self.population.get(key).ok_or_else(|| missing(key))
    }

    /// Current time plus an exponential waiting time of the given mean
    fn sample_after(&mut self, mean: f64) -> f64 {
        let u: f64 = self.rng.gen();
        self.current_time - mean * (1.0 - u).ln()
    }

    /// Schedule the Death, first Move and first Reproduction of `owner`,
    /// drawn in that order.
    pub fn schedule_lifecycle(&mut self, owner: IndividualKey) -> Result<()> {
        let death = Event::death(self, owner)?;
        self.pec.insert(death);
        let movement = Event::movement(self, owner)?;
        self.pec.insert(movement);
        let reproduction = Event::reproduction(self, owner)?;
        self.pec.insert(reproduction);
        Ok(())
    }
}

fn missing(key: IndividualKey) -> Error {
    Error::InvalidState(format!("individual {} is not in the population", key))
}

/// Everything that can happen during a run.
///
/// Death, Move and Reproduction are owned by an individual and timestamped by
/// sampling when constructed. Epidemic and Observation are triggered by the
/// driver and never queued.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Death { owner: IndividualKey, time: f64 },
    Move { owner: IndividualKey, time: f64 },
    Reproduction { owner: IndividualKey, time: f64 },
    Epidemic { time: f64 },
    Observation(ObservationReport),
}

impl Event {
    /// Draw the death of `owner` and stamp it on the individual.
    pub fn death(ctx: &mut SimContext, owner: IndividualKey) -> Result<Self> {
        let comfort = ctx.individual(owner)?.comfort();
        let time = ctx.sample_after((1.0 - (1.0 - comfort).ln()) * ctx.rates.death);

        if let Some(individual) = ctx.population.get_mut(owner) {
            individual.set_death_time(time);
        }
        Ok(Event::Death { owner, time })
    }

    /// Draw the next move of `owner`. A move at or after its death is
    /// suppressed with a negative timestamp.
    pub fn movement(ctx: &mut SimContext, owner: IndividualKey) -> Result<Self> {
        let individual = ctx.individual(owner)?;
        let (comfort, death_time) = (individual.comfort(), individual.death_time());

        let mut time = ctx.sample_after((1.0 - comfort.ln()) * ctx.rates.movement);
        if time >= death_time {
            trace!(%owner, time, death_time, "Move falls after death");
            time = -1.0;
        }
        Ok(Event::Move { owner, time })
    }

    /// Draw the next reproduction of `owner`. A reproduction after its death
    /// is suppressed with a negative timestamp.
    pub fn reproduction(ctx: &mut SimContext, owner: IndividualKey) -> Result<Self> {
        let individual = ctx.individual(owner)?;
        let (comfort, death_time) = (individual.comfort(), individual.death_time());

        let mut time = ctx.sample_after((1.0 - comfort.ln()) * ctx.rates.reproduction);
        if time > death_time {
            trace!(%owner, time, death_time, "Reproduction falls after death");
            time = -1.0;
        }
        Ok(Event::Reproduction { owner, time })
    }

    pub fn epidemic(ctx: &SimContext) -> Self {
        Event::Epidemic {
            time: ctx.current_time,
        }
    }

    pub fn observation(report: ObservationReport) -> Self {
        Event::Observation(report)
    }

    pub fn time(&self) -> f64 {
        match self {
            Event::Death { time, .. }
            | Event::Move { time, .. }
            | Event::Reproduction { time, .. }
            | Event::Epidemic { time } => *time,
            Event::Observation(report) => report.instant,
        }
    }

    /// The individual this event belongs to, if any
    pub fn owner(&self) -> Option<IndividualKey> {
        match self {
            Event::Death { owner, .. }
            | Event::Move { owner, .. }
            | Event::Reproduction { owner, .. } => Some(*owner),
            Event::Epidemic { .. } | Event::Observation(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Event::Death { .. } => "death",
            Event::Move { .. } => "move",
            Event::Reproduction { .. } => "reproduction",
            Event::Epidemic { .. } => "epidemic",
            Event::Observation(_) => "observation",
        }
    }

    /// Apply the event to the run. A Death hands back the individual it
    /// removed.
    pub fn execute(
        self,
        ctx: &mut SimContext,
        sink: &mut dyn ObservationSink,
    ) -> Result<Option<Individual>> {
        match self {
            Event::Death { owner, time } => {
                ctx.event_count += 1;
                let departed = ctx.population.remove(owner).ok_or_else(|| missing(owner))?;
                let purged = ctx.pec.remove_owned_by(owner);
                debug!(%owner, time, purged, "Individual died");
                return Ok(Some(departed));
            }

            Event::Move { owner, time } => {
                ctx.event_count += 1;
                let next = Event::movement(ctx, owner)?;
                ctx.pec.insert(next);

                let habitat = ctx.population.habitat(&ctx.grid);
                let individual = ctx.population.get_mut(owner).ok_or_else(|| missing(owner))?;
                let direction = ctx.grid.step(individual, &mut ctx.rng);
                if individual.update(&habitat) {
                    ctx.goal_reached = true;
                }
                trace!(%owner, time, ?direction, position = %individual.position(), "Individual moved");
            }

            Event::Reproduction { owner, time } => {
                ctx.event_count += 1;
                let next = Event::reproduction(ctx, owner)?;
                ctx.pec.insert(next);

                let child = ctx.population.make_child(owner, &ctx.grid)?;
                if ctx.individual(child)?.reached_goal() {
                    ctx.goal_reached = true;
                }
                ctx.schedule_lifecycle(child)?;
                debug!(parent = %owner, %child, time, "Individual born");
            }

            Event::Epidemic { time } => {
                let before = ctx.population.len();
                let removed = ctx.population.epidemic_cull(&mut ctx.rng);

                let mut purged = 0;
                for individual in &removed {
                    purged += ctx.pec.remove_owned_by(individual.key());
                    debug!(key = %individual.key(), comfort = individual.comfort(), "Individual culled");
                }
                info!(
                    time,
                    before,
                    survivors = ctx.population.len(),
                    purged,
                    "Epidemic"
                );
            }

            Event::Observation(report) => sink.observe(&report)?,
        }
        Ok(None)
    }
}
