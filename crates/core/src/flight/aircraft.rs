//! Aircraft state and airframe geometry.

use crate::core_types::Vec3;
use crate::error::{require_positive, ConfigError};
use nalgebra::UnitQuaternion;
use serde::{Deserialize, Serialize};

/// Rigid-body state read from the integrator each tick.
///
/// The body frame is y-up: +x is the right wing, +y the canopy, +z the nose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AircraftState {
    /// Centre of mass in world space (m)
    pub position: Vec3,
    /// Velocity in world space (m/s)
    pub velocity: Vec3,
    /// Body-to-world rotation
    pub orientation: UnitQuaternion<f32>,
    /// Angular velocity in world space (rad/s)
    pub angular_velocity: Vec3,
    /// Mass (kg)
    pub mass: f32,
}

impl Default for AircraftState {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            velocity: Vec3::zeros(),
            orientation: UnitQuaternion::identity(),
            angular_velocity: Vec3::zeros(),
            mass: 300.0,
        }
    }
}

impl AircraftState {
    /// Nose direction in world space.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::z()
    }

    /// Canopy direction in world space.
    #[must_use]
    pub fn up(&self) -> Vec3 {
        self.orientation * Vec3::y()
    }

    /// Right wing direction in world space.
    #[must_use]
    pub fn right(&self) -> Vec3 {
        self.orientation * Vec3::x()
    }

    /// World position of a point given in body coordinates.
    #[must_use]
    pub fn body_to_world(&self, offset: Vec3) -> Vec3 {
        self.position + self.orientation * offset
    }
}

/// Where the aerodynamic forces attach, in body coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AirframeGeometry {
    /// Left wingtip
    pub left_tip: Vec3,
    /// Right wingtip
    pub right_tip: Vec3,
    /// Tail surfaces
    pub tail: Vec3,
}

impl Default for AirframeGeometry {
    fn default() -> Self {
        Self {
            left_tip: Vec3::new(-7.5, 0.0, 0.0),
            right_tip: Vec3::new(7.5, 0.0, 0.0),
            tail: Vec3::new(0.0, 0.0, -6.0),
        }
    }
}

impl AirframeGeometry {
    /// Check that the tips sit either side of the centre line and the tail is aft.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] when a tip is on the wrong side or the tail is
    /// not behind the centre of mass.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("geometry.right_tip.x", self.right_tip.x)?;
        require_positive("geometry.left_tip.x (negated)", -self.left_tip.x)?;
        require_positive("geometry.tail.z (negated)", -self.tail.z)?;
        Ok(())
    }

    /// Wingtip positions in world space, left then right.
    #[must_use]
    pub fn tips(&self, state: &AircraftState) -> (Vec3, Vec3) {
        (
            state.body_to_world(self.left_tip),
            state.body_to_world(self.right_tip),
        )
    }

    /// Tail position in world space.
    #[must_use]
    pub fn tail(&self, state: &AircraftState) -> Vec3 {
        state.body_to_world(self.tail)
    }
}
