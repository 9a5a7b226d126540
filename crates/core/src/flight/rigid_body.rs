//! Seam to the rigid-body integrator.

use crate::core_types::Vec3;

/// Force sink implemented by whatever integrates the aircraft.
///
/// Forces are world-space; relative torques are body-space.
pub trait RigidBody {
    /// Apply a force through the centre of mass.
    fn add_force(&mut self, force: Vec3);

    /// Apply a force at a world-space point.
    fn add_force_at_position(&mut self, force: Vec3, position: Vec3);

    /// Apply a torque expressed in the body frame.
    fn add_relative_torque(&mut self, torque: Vec3);
}
