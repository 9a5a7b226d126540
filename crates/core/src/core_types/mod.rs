//! Core types and utilities

pub mod curve;
pub mod vec3;

pub use curve::{CurveKey, FalloffCurve};
pub use vec3::Vec3;
