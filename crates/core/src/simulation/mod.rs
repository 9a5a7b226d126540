//! Fixed-timestep driver
//!
//! `GliderSimulation` runs the flight model, instruments and wind layers in a
//! deterministic order each tick.

mod glider_simulation;

pub use glider_simulation::{GliderSimulation, SimulationConfig, TickReport};
