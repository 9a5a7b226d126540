//! Atmosphere: thermals, localized wind sources and the composited wind field.
//!
//! The wind a glider feels is layered:
//! - a uniform static wind,
//! - the slowly evolving [`FluidGrid`](crate::grid::FluidGrid) sample,
//! - any number of localized [`WindSource`]s (thermals).
//!
//! Thermals can be placed directly or released by the [`ThermalSpawner`]
//! solar-heating heuristic.

mod heating;
mod thermal;
mod wind_field;
mod wind_source;

pub use heating::{
    FlatTerrain, TerrainHeight, ThermalSpawner, ThermalSpawnerConfig, MAX_HEATING_RADIUS,
};
pub use thermal::{Thermal, ThermalColumn, ThermalParams};
pub use wind_field::{AmbientWind, UniformWind, WindField};
pub use wind_source::WindSource;
