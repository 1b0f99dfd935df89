mod domain;
mod factory;
mod grid;
mod parameters;
mod topology;
mod wave;

pub use domain::Domain;
pub use factory::SimulationFactory;
pub use grid::{Grid, TimeStepBuffers};
pub use parameters::WaveParameters;
pub use topology::{Direction, Neighbors, ProcessTopology, TopologyPolicy};
pub use wave::{initial_condition, RunSummary, SimulationContext, WaveSimulation};
