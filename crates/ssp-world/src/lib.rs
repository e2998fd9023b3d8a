//! Stochastic shortest-path engine.
//!
//! Individuals wander a cost-weighted grid, reproduce, die and get culled by
//! epidemics, all driven by a discrete-event loop. The cheapest path found to
//! the goal is reported through periodic observations.

pub mod event;
pub mod grid;
pub mod individual;
pub mod observation;
pub mod pec;
pub mod population;
pub mod simulation;

pub use event::{Event, SimContext};
pub use grid::Grid;
pub use individual::{Habitat, Individual, IndividualKey};
pub use observation::{BestMeasure, ObservationReport, ObservationSink, TracingSink, WriterSink};
pub use pec::Pec;
pub use population::Population;
pub use simulation::{find_best_path, BestPath, RunSummary, Simulation};
