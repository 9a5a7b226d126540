//! Glider flight: controls, airframe state and the force model.

pub mod aircraft;
pub mod controls;
pub mod model;
pub mod rigid_body;

pub use aircraft::{AircraftState, AirframeGeometry};
pub use controls::{
    ControlConfig, ControlState, ControlTargets, Smoothing, Sustainer, SustainerConfig,
};
pub use model::{
    AirData, AppliedForce, DragCoefficients, FlightModel, FlightModelConfig, ForceKind, ForceSet,
};
pub use rigid_body::RigidBody;
