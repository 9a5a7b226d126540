//! Glider Simulation Core Library
//!
//! Flight dynamics for a sailplane flying through a layered wind model.
//! Produces forces for an external rigid-body integrator and plain telemetry
//! for the cockpit; rendering and input handling live elsewhere.
//!
//! ## Wind
//!
//! - Static ambient wind
//! - A coarse 3D stable-fluids grid (diffusion, projection, semi-Lagrangian
//!   advection) stepped on a slow deterministic cadence
//! - Localized sources such as thermals, placed by hand or released by a
//!   solar heating heuristic
//!
//! ## Flight
//!
//! - Six-face drag, glide push, per-wingtip lift and tail weathervaning
//! - Control authority that fades below the lockup airspeed
//! - Smoothed control surfaces and a battery-limited sustainer
//! - Total-energy variometer and glide ratio instruments

// Core types and utilities
pub mod core_types;
pub mod error;

// Wind simulation
pub mod atmosphere;
pub mod grid;

// Aircraft
pub mod flight;
pub mod instruments;
pub mod simulation;

// Re-export core types
pub use core_types::{CurveKey, FalloffCurve, Vec3};
pub use error::ConfigError;

// Re-export wind types
pub use atmosphere::{
    AmbientWind, FlatTerrain, TerrainHeight, Thermal, ThermalColumn, ThermalParams,
    ThermalSpawner, ThermalSpawnerConfig, UniformWind, WindField, WindSource,
};
pub use grid::{Cell, FluidGrid, FluidGridConfig, GridDims, StepScheduler};

// Re-export flight types
pub use flight::{
    AirData, AircraftState, AirframeGeometry, ControlConfig, ControlState, ControlTargets,
    FlightModel, FlightModelConfig, ForceKind, ForceSet, RigidBody, Smoothing, SustainerConfig,
};
pub use instruments::{GlideRatio, InstrumentPanel, Telemetry};
pub use simulation::{GliderSimulation, SimulationConfig, TickReport};
