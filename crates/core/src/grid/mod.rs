//! Grid-based wind simulation

mod boundary;
pub mod cells;
pub mod fluid_grid;
pub mod scheduler;
mod stages;

// Re-export main types
pub use cells::{Cell, GridDims};
pub use fluid_grid::{FluidGrid, FluidGridConfig, MAX_CELLS, MIN_CELLS_PER_AXIS};
pub use scheduler::StepScheduler;
