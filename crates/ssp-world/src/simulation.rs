//! Discrete-event driver searching for a low-cost path.

use crate::event::{Event, SimContext};
use crate::individual::{Individual, IndividualKey};
use crate::observation::{BestMeasure, ObservationReport, ObservationSink, EXTENDED_REPORT_AT};
use serde::{Deserialize, Serialize};
use ssp_core::{PathDisplay, Point, Result, SimulationConfig};
use tracing::{debug, info, instrument, trace};

/// Best path found so far.
///
/// Until the goal is reached anywhere, paths are ranked by comfort. Once it
/// has been reached, ranking switches for good to the lowest cost among
/// individuals that have reached it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BestPath {
    pub comfort: f64,
    pub cost: Option<u32>,
    pub path: Vec<Point>,
}

impl BestPath {
    /// Offer `individual` as a candidate; returns whether it became the best.
    pub fn consider(&mut self, individual: &Individual, goal_reached: bool) -> bool {
        let improved = if !goal_reached {
            if individual.comfort() > self.comfort {
                self.comfort = individual.comfort();
                true
            } else {
                false
            }
        } else if individual.reached_goal()
            && self.cost.map_or(true, |best| individual.cost() < best)
        {
            self.cost = Some(individual.cost());
            true
        } else {
            false
        };

        if improved {
            self.path = individual.copy_path();
        }
        improved
    }

    pub fn measure(&self, goal_reached: bool) -> BestMeasure {
        if goal_reached {
            BestMeasure::Cost(self.cost)
        } else {
            BestMeasure::Comfort(self.comfort)
        }
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Clock value when the loop stopped
    pub final_instant: f64,
    pub event_count: u64,
    pub population: usize,
    pub observations: u32,
    pub goal_reached: bool,
    pub best_cost: Option<u32>,
    pub best_comfort: f64,
    pub best_path: Vec<Point>,
}

pub struct Simulation<S> {
    ctx: SimContext,
    best: BestPath,
    final_instant: f64,
    seed: u64,
    goal: Point,
    observations: u32,
    last_observation: f64,
    sink: S,
}

impl<S: ObservationSink> Simulation<S> {
    /// Validate `config` and place the initial population at its origin.
    pub fn new(config: &SimulationConfig, sink: S) -> Result<Self> {
        config.validate()?;

        let mut ctx = SimContext::new(config)?;
        ctx.population
            .populate(config.population.initial_size, config.origin, &ctx.grid);

        Ok(Self {
            ctx,
            best: BestPath::default(),
            final_instant: config.final_instant,
            seed: config.seed,
            goal: config.goal,
            observations: 0,
            last_observation: 0.0,
            sink,
        })
    }

    /// Run the event loop until the horizon or until no event is pending
    #[instrument(skip(self), fields(final_instant = self.final_instant, seed = self.seed))]
    pub fn run(&mut self) -> Result<RunSummary> {
        info!(
            population = self.ctx.population.len(),
            goal = %self.goal,
            "Starting simulation"
        );

        let founders: Vec<IndividualKey> =
            self.ctx.population.iter().map(Individual::key).collect();
        for key in founders {
            self.ctx.schedule_lifecycle(key)?;
        }

        if self.ctx.pec.is_empty() {
            info!("No events to simulate");
            return Ok(self.summary());
        }

        let mut current = self.ctx.pec.pop_min()?;
        self.ctx.current_time = current.time();

        while self.ctx.current_time < self.final_instant {
            if self.ctx.population.is_crowded() {
                Event::epidemic(&self.ctx).execute(&mut self.ctx, &mut self.sink)?;
            }

            self.process(current)?;

            if self.ctx.pec.is_empty() {
                debug!(time = self.ctx.current_time, "Event queue exhausted");
                break;
            }

            current = self.ctx.pec.pop_min()?;
            self.ctx.current_time = current.time();

            if self.ctx.current_time - self.last_observation >= self.final_instant / 20.0
                || self.ctx.current_time > self.final_instant
            {
                self.observe()?;
                self.last_observation = self.ctx.current_time.floor();
            }
        }

        let summary = self.summary();
        info!(
            time = summary.final_instant,
            events = summary.event_count,
            population = summary.population,
            goal_reached = summary.goal_reached,
            best_cost = ?summary.best_cost,
            path = %PathDisplay(&summary.best_path),
            "Simulation complete"
        );
        Ok(summary)
    }

    /// Execute a popped event, then offer its owner to the best-path record.
    ///
    /// Events of individuals culled since they were popped are discarded.
    fn process(&mut self, event: Event) -> Result<()> {
        let owner = event.owner();
        if let Some(key) = owner {
            if !self.ctx.population.contains(key) {
                trace!(owner = %key, kind = event.kind(), "Skipping event of culled individual");
                return Ok(());
            }
        }

        let departed = event.execute(&mut self.ctx, &mut self.sink)?;
        if let Some(key) = owner {
            self.save_best(key, departed.as_ref());
        }
        Ok(())
    }

    /// Offer `key` to the best-path record, falling back to `departed` when it
    /// has just died. Once the goal is reached only individuals standing on
    /// it are considered.
    fn save_best(&mut self, key: IndividualKey, departed: Option<&Individual>) {
        let Some(individual) = departed.or_else(|| self.ctx.population.get(key)) else {
            return;
        };
        if self.ctx.goal_reached && individual.position() != self.goal {
            return;
        }

        if self.best.consider(individual, self.ctx.goal_reached) {
            debug!(
                owner = %key,
                cost = individual.cost(),
                comfort = individual.comfort(),
                "New best path"
            );
        }
    }

    fn observe(&mut self) -> Result<()> {
        self.observations += 1;
        let report = ObservationReport {
            number: self.observations,
            instant: self.ctx.current_time,
            event_count: self.ctx.event_count,
            population: self.ctx.population.len(),
            goal_reached: self.ctx.goal_reached,
            best_path: self.best.path.clone(),
            measure: self.best.measure(self.ctx.goal_reached),
            extended: self.observations == EXTENDED_REPORT_AT,
        };
        Event::observation(report).execute(&mut self.ctx, &mut self.sink)?;
        Ok(())
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            final_instant: self.ctx.current_time,
            event_count: self.ctx.event_count,
            population: self.ctx.population.len(),
            observations: self.observations,
            goal_reached: self.ctx.goal_reached,
            best_cost: self.best.cost,
            best_comfort: self.best.comfort,
            best_path: self.best.path.clone(),
        }
    }

    pub fn context(&self) -> &SimContext {
        &self.ctx
    }

    pub fn best(&self) -> &BestPath {
        &self.best
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

/// Search for a path from `origin` to `goal` on the grid described by
/// `config`, reporting progress to `sink`.
pub fn find_best_path<S: ObservationSink>(
    origin: Point,
    goal: Point,
    config: &SimulationConfig,
    sink: S,
) -> Result<RunSummary> {
    let mut config = config.clone();
    config.origin = origin;
    config.goal = goal;

    Simulation::new(&config, sink)?.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use crate::individual::Habitat;
    use ssp_core::{Error, GridConfig, PopulationConfig, RateConfig};

    fn open_config(columns: i32, rows: i32, seed: u64) -> SimulationConfig {
        SimulationConfig {
            final_instant: 200.0,
            seed,
            origin: Point::new(1, 1),
            goal: Point::new(columns, rows),
            grid: GridConfig {
                columns,
                rows,
                obstacles: Vec::new(),
                special_zones: Vec::new(),
            },
            population: PopulationConfig {
                initial_size: 10,
                max_size: 60,
                comfort_sensitivity: 1,
            },
            rates: RateConfig {
                death: 20.0,
                movement: 1.0,
                reproduction: 2.0,
            },
        }
    }

    fn walker(grid: &Grid, steps: &[(i32, i32)]) -> Individual {
        let habitat = Habitat::new(grid, 1, grid.goal());
        let mut individual = Individual::new(IndividualKey(0), 0, Point::new(1, 1), grid);
        for &(x, y) in steps {
            individual.set_position(Point::new(x, y));
            individual.update(&habitat);
        }
        individual
    }

    #[test]
    fn test_best_path_tracks_comfort_then_cost() {
        let mut grid = Grid::new(3, 3, &[], &[]).unwrap();
        grid.set_goal(Point::new(3, 3));
        let mut best = BestPath::default();

        let near = walker(&grid, &[(1, 1), (2, 1), (2, 2)]);
        let far = walker(&grid, &[(1, 1)]);
        assert!(best.consider(&far, false));
        assert!(best.consider(&near, false));
        assert!(!best.consider(&far, false));
        assert_eq!(best.path, near.path());
        assert_eq!(best.cost, None);

        // After the switch, only goal-reaching individuals count
        assert!(!best.consider(&near, true));
        let long = walker(&grid, &[(1, 1), (1, 2), (2, 2), (2, 1), (3, 1), (3, 2), (3, 3)]);
        let short = walker(&grid, &[(1, 1), (2, 1), (3, 1), (3, 2), (3, 3)]);
        assert!(best.consider(&long, true));
        assert_eq!(best.cost, Some(6));
        assert!(best.consider(&short, true));
        assert!(!best.consider(&long, true));
        assert_eq!(best.cost, Some(4));
        assert_eq!(best.path, short.path());
        assert_eq!(best.measure(true), BestMeasure::Cost(Some(4)));
    }

    #[test]
    fn test_death_on_goal_records_cost() {
        let mut config = open_config(3, 3, 2);
        config.population.initial_size = 0;
        let mut simulation = Simulation::new(&config, Vec::<ObservationReport>::new()).unwrap();

        let goal = Point::new(3, 3);
        let key = simulation
            .ctx
            .population
            .spawn_at(goal, &simulation.ctx.grid);
        simulation.ctx.goal_reached = true;

        simulation.process(Event::Death { owner: key, time: 1.0 }).unwrap();

        assert!(!simulation.context().population.contains(key));
        assert_eq!(simulation.best().cost, Some(0));
        assert_eq!(simulation.best().path, vec![goal]);
    }

    #[test]
    fn test_death_before_goal_records_comfort() {
        let mut config = open_config(3, 3, 2);
        config.population.initial_size = 0;
        let mut simulation = Simulation::new(&config, Vec::<ObservationReport>::new()).unwrap();

        let key = simulation
            .ctx
            .population
            .spawn_at(Point::new(2, 2), &simulation.ctx.grid);
        let comfort = simulation.context().individual(key).unwrap().comfort();

        simulation.process(Event::Death { owner: key, time: 1.0 }).unwrap();

        assert_eq!(simulation.best().comfort, comfort);
        assert_eq!(simulation.best().path, vec![Point::new(2, 2)]);
    }

    #[test]
    fn test_event_of_culled_owner_is_skipped() {
        let mut config = open_config(3, 3, 2);
        config.population.initial_size = 0;
        let mut simulation = Simulation::new(&config, Vec::<ObservationReport>::new()).unwrap();

        simulation
            .process(Event::Move { owner: IndividualKey(7), time: 1.0 })
            .unwrap();

        assert_eq!(simulation.context().event_count, 0);
        assert!(simulation.best().path.is_empty());
    }

    #[test]
    fn test_simulation_creation() {
        let config = open_config(4, 4, 1);
        let simulation = Simulation::new(&config, Vec::<ObservationReport>::new()).unwrap();

        assert_eq!(simulation.context().population.len(), 10);
        assert!(simulation.context().pec.is_empty());
        assert_eq!(simulation.best().cost, None);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = open_config(4, 4, 1);
        config.goal = Point::new(9, 9);
        let result = Simulation::new(&config, Vec::<ObservationReport>::new());
        assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
    }

    #[test]
    fn test_run_on_tiny_grid() {
        let config = open_config(2, 2, 11);
        let mut simulation = Simulation::new(&config, Vec::<ObservationReport>::new()).unwrap();
        let summary = simulation.run().unwrap();

        assert!(summary.goal_reached);
        assert_eq!(summary.best_cost, Some(2));
        assert_eq!(summary.best_path.first(), Some(&Point::new(1, 1)));
        assert_eq!(summary.best_path.last(), Some(&Point::new(2, 2)));
        assert!(summary.event_count > 0);
    }

    #[test]
    fn test_observations_are_numbered_and_sent() {
        let config = open_config(4, 4, 3);
        let mut simulation = Simulation::new(&config, Vec::<ObservationReport>::new()).unwrap();
        let summary = simulation.run().unwrap();
        let reports = simulation.into_sink();

        assert_eq!(reports.len() as u32, summary.observations);
        assert!(!reports.is_empty());
        for (i, report) in reports.iter().enumerate() {
            assert_eq!(report.number as usize, i + 1);
            assert_eq!(report.extended, report.number == EXTENDED_REPORT_AT);
        }
        assert!(reports.windows(2).all(|w| w[0].instant <= w[1].instant));
        assert!(reports.windows(2).all(|w| w[0].event_count <= w[1].event_count));
    }

    #[test]
    fn test_empty_population_runs_nothing() {
        let mut config = open_config(3, 3, 5);
        config.population.initial_size = 0;
        let sink = Vec::<ObservationReport>::new();
        let summary = find_best_path(Point::new(1, 1), Point::new(3, 3), &config, sink).unwrap();

        assert_eq!(summary.event_count, 0);
        assert_eq!(summary.observations, 0);
        assert!(!summary.goal_reached);
        assert!(summary.best_path.is_empty());
    }

    #[test]
    fn test_find_best_path_overrides_endpoints() {
        let config = open_config(3, 3, 8);
        let mut reports: Vec<ObservationReport> = Vec::new();
        let summary =
            find_best_path(Point::new(3, 3), Point::new(1, 1), &config, &mut reports).unwrap();

        if let Some(first) = summary.best_path.first() {
            assert_eq!(*first, Point::new(3, 3));
        }
        if summary.best_cost.is_some() {
            assert_eq!(summary.best_path.last(), Some(&Point::new(1, 1)));
        }
        assert_eq!(reports.len() as u32, summary.observations);
    }
}
