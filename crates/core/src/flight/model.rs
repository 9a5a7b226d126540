//! Glider force model.
//!
//! A pure per-tick function from aircraft state, smoothed controls and the
//! ambient wind to a set of forces and a body torque. Nothing here integrates
//! motion; the result is handed to a [`RigidBody`] integrator.
//!
//! # Model
//!
//! Everything scales with the *signed* square of forward airspeed
//!
//! ```text
//! air    = -velocity + static_wind + mean(local wind at both wingtips)
//! fwd_sq = dot(forward, -air_dir) * |air|²
//! ```
//!
//! so flying backwards through the air produces negative lift rather than an
//! absolute-valued one.
//!
//! - **Drag** is summed over the six body faces, each with its own
//!   coefficient; faces turned away from the airflow contribute nothing.
//! - **Glide** converts the vertical part of the drag into forward push.
//! - **Lift** is applied per wingtip, slightly aft of the tip, plus the aileron
//!   contribution scaled by the control authority factor.
//! - **Tail** forces (trim bias, weathervane centering, elevator, rudder) act
//!   at the tail point.
//! - **Airbrake** and **sustainer thrust** act through the centre of mass.
//! - A roll torque follows the difference in vertical wind between the tips,
//!   so flying with one wing in a thermal banks the glider away from it.
//!
//! # Control authority
//!
//! Surfaces lose authority as forward airspeed drops below the lockup speed:
//!
//! ```text
//! authority = clamp(fwd_sq / lockup², 0, 1)
//! ```

use super::aircraft::{AircraftState, AirframeGeometry};
use super::controls::ControlState;
use super::rigid_body::RigidBody;
use crate::atmosphere::AmbientWind;
use crate::core_types::vec3::{normalize_or_zero, NORMALIZE_EPSILON};
use crate::core_types::Vec3;
use crate::error::{require_non_negative, ConfigError};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Drag coefficient per body face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DragCoefficients {
    /// Nose
    pub forward: f32,
    /// Tail end
    pub back: f32,
    /// Left and right sides
    pub sides: f32,
    /// Canopy and belly
    pub top_bottom: f32,
}

impl Default for DragCoefficients {
    fn default() -> Self {
        Self {
            forward: 0.01,
            back: 0.3,
            sides: 0.5,
            top_bottom: 1.0,
        }
    }
}

/// Aerodynamic tuning for a [`FlightModel`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlightModelConfig {
    /// Per-face drag
    pub drag: DragCoefficients,
    /// Wing area factor (each wing gets half)
    pub wing_area_factor: f32,
    /// Aerofoil lift coefficient
    pub lift_coeff: f32,
    /// Aileron force per unit deflection
    pub aileron_strength: f32,
    /// Elevator force per unit deflection
    pub elevator_strength: f32,
    /// Rudder force per unit deflection
    pub rudder_strength: f32,
    /// Backward drag per unit of control surface force
    pub control_drag_coeff: f32,
    /// Fraction of vertical drag turned into forward push
    pub glide_coeff: f32,
    /// Weathervane strength of the tail
    pub tail_coeff: f32,
    /// Downforce on the tail per unit `fwd_sq` (pitch trim)
    pub tail_bias_factor: f32,
    /// Roll torque per m/s of vertical wind difference between the tips
    pub wing_lift_torque: f32,
    /// Airbrake force per unit deflection
    pub airbrake_strength: f32,
    /// Sustainer thrust at full throttle and zero airspeed (N)
    pub sustainer_strength: f32,
    /// Forward airspeed at which the sustainer stops producing thrust (m/s)
    pub sustainer_max_speed: f32,
    /// Forward airspeed below which the control surfaces lose authority (m/s)
    pub lockup_speed: f32,
    /// How far aft of each tip the wing's lift acts (m)
    pub wing_offset: f32,
    /// Gravitational acceleration (m/s²)
    pub gravity: f32,
    /// Force attachment points
    pub geometry: AirframeGeometry,
}

impl Default for FlightModelConfig {
    fn default() -> Self {
        Self {
            drag: DragCoefficients::default(),
            wing_area_factor: 1.0,
            lift_coeff: 4.0,
            aileron_strength: 2.0,
            elevator_strength: 1.0,
            rudder_strength: 0.5,
            control_drag_coeff: 0.1,
            glide_coeff: 0.5,
            tail_coeff: 1.0,
            tail_bias_factor: 0.05,
            wing_lift_torque: 50.0,
            airbrake_strength: 2.0,
            sustainer_strength: 1500.0,
            sustainer_max_speed: 40.0,
            lockup_speed: 12.0,
            wing_offset: 0.1,
            gravity: 9.8,
            geometry: AirframeGeometry::default(),
        }
    }
}

impl FlightModelConfig {
    /// Check every parameter.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] for any negative or non-finite coefficient or
    /// an invalid airframe geometry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("drag.forward", self.drag.forward),
            ("drag.back", self.drag.back),
            ("drag.sides", self.drag.sides),
            ("drag.top_bottom", self.drag.top_bottom),
            ("wing_area_factor", self.wing_area_factor),
            ("lift_coeff", self.lift_coeff),
            ("aileron_strength", self.aileron_strength),
            ("elevator_strength", self.elevator_strength),
            ("rudder_strength", self.rudder_strength),
            ("control_drag_coeff", self.control_drag_coeff),
            ("glide_coeff", self.glide_coeff),
            ("tail_coeff", self.tail_coeff),
            ("tail_bias_factor", self.tail_bias_factor),
            ("wing_lift_torque", self.wing_lift_torque),
            ("airbrake_strength", self.airbrake_strength),
            ("sustainer_strength", self.sustainer_strength),
            ("sustainer_max_speed", self.sustainer_max_speed),
            ("lockup_speed", self.lockup_speed),
            ("wing_offset", self.wing_offset),
            ("gravity", self.gravity),
        ] {
            require_non_negative(name, value)?;
        }
        self.geometry.validate()
    }
}

/// What produced an [`AppliedForce`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ForceKind {
    /// Weight
    Gravity,
    /// Six-face body drag
    Drag,
    /// Drag converted into forward push
    Glide,
    /// Wing lift including aileron
    Lift,
    /// Induced drag of deflected surfaces
    ControlDrag,
    /// Tail trim, centering, elevator and rudder
    Tail,
    /// Airbrake
    Airbrake,
    /// Sustainer thrust
    Thrust,
}

/// One world-space force, optionally at a world-space point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AppliedForce {
    /// Force (N)
    pub vector: Vec3,
    /// Application point; `None` acts through the centre of mass
    pub point: Option<Vec3>,
    /// Source of the force
    pub kind: ForceKind,
}

/// Airflow quantities derived while computing forces.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AirData {
    /// Air velocity relative to the aircraft, world frame (m/s)
    pub air_velocity: Vec3,
    /// Magnitude of `air_velocity` (m/s)
    pub airspeed: f32,
    /// Signed forward component of airspeed (m/s)
    pub forward_airspeed: f32,
    /// Signed square used to scale the aerodynamic forces
    pub forward_airspeed_sq: f32,
    /// Control authority in `[0, 1]`
    pub control_authority: f32,
    /// Sustainer effectiveness in `[0, 1]`
    pub sustainer_effectiveness: f32,
    /// Local wind sampled at the left tip (m/s)
    pub left_tip_wind: Vec3,
    /// Local wind sampled at the right tip (m/s)
    pub right_tip_wind: Vec3,
}

/// Everything the integrator should apply this tick.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ForceSet {
    /// World-space forces
    pub forces: Vec<AppliedForce>,
    /// Body-frame torque
    pub relative_torque: Vec3,
    /// Airflow used to compute the forces
    pub air: AirData,
}

impl ForceSet {
    fn push(&mut self, kind: ForceKind, vector: Vec3, point: Option<Vec3>) {
        self.forces.push(AppliedForce {
            vector,
            point,
            kind,
        });
    }

    /// Sum of every force.
    #[must_use]
    pub fn net_force(&self) -> Vec3 {
        self.forces.iter().map(|f| f.vector).sum()
    }

    /// Sum of the forces of one kind.
    #[must_use]
    pub fn total(&self, kind: ForceKind) -> Vec3 {
        self.forces
            .iter()
            .filter(|f| f.kind == kind)
            .map(|f| f.vector)
            .sum()
    }

    /// World-space torque about `point`, including the relative torque.
    #[must_use]
    pub fn torque_about(&self, point: Vec3, state: &AircraftState) -> Vec3 {
        let from_forces: Vec3 = self
            .forces
            .iter()
            .map(|f| (f.point.unwrap_or(state.position) - point).cross(&f.vector))
            .sum();
        from_forces + state.orientation * self.relative_torque
    }

    /// Hand every force and the torque to an integrator.
    pub fn apply_to(&self, body: &mut (impl RigidBody + ?Sized)) {
        for force in &self.forces {
            match force.point {
                Some(point) => body.add_force_at_position(force.vector, point),
                None => body.add_force(force.vector),
            }
        }
        body.add_relative_torque(self.relative_torque);
    }
}

/// Computes glider forces from a validated configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightModel {
    config: FlightModelConfig,
}

impl FlightModel {
    /// Create a force model.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] when the configuration fails
    /// [`FlightModelConfig::validate`].
    pub fn new(config: FlightModelConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Model configuration.
    #[must_use]
    pub fn config(&self) -> &FlightModelConfig {
        &self.config
    }

    /// Control authority for a signed squared forward airspeed.
    ///
    /// A zero lockup speed means the surfaces never lose authority.
    #[must_use]
    pub fn control_authority(&self, forward_airspeed_sq: f32) -> f32 {
        let lockup_sq = self.config.lockup_speed * self.config.lockup_speed;
        if lockup_sq <= NORMALIZE_EPSILON {
            return 1.0;
        }
        (1.0 - (lockup_sq - forward_airspeed_sq) / lockup_sq).clamp(0.0, 1.0)
    }

    /// Sustainer effectiveness, falling linearly to zero at the max speed.
    ///
    /// A zero max speed means the sustainer never produces thrust.
    #[must_use]
    pub fn sustainer_effectiveness(&self, forward_airspeed_sq: f32) -> f32 {
        let max_speed = self.config.sustainer_max_speed;
        if max_speed <= NORMALIZE_EPSILON {
            return 0.0;
        }
        let speed = forward_airspeed_sq.max(0.0).sqrt();
        ((max_speed - speed) / max_speed).clamp(0.0, 1.0)
    }

    /// Forces and torque for this tick. Never mutates `state`.
    #[must_use]
    pub fn compute_forces(
        &self,
        state: &AircraftState,
        controls: &ControlState,
        wind: &(impl AmbientWind + ?Sized),
    ) -> ForceSet {
        let c = &self.config;
        let forward = state.forward();
        let up = state.up();
        let right = state.right();
        let (left_tip, right_tip) = c.geometry.tips(state);

        let left_wind = wind.local_wind_at(left_tip);
        let right_wind = wind.local_wind_at(right_tip);
        let air = -state.velocity + wind.static_wind() + (left_wind + right_wind) * 0.5;
        let air_sq = air.norm_squared();
        let air_dir = normalize_or_zero(air);
        let facing = forward.dot(&-air_dir);
        let fwd_sq = facing * air_sq;
        let authority = self.control_authority(fwd_sq);
        let effectiveness = self.sustainer_effectiveness(fwd_sq);

        let mut set = ForceSet {
            forces: Vec::with_capacity(10),
            relative_torque: Vec3::zeros(),
            air: AirData {
                air_velocity: air,
                airspeed: air_sq.sqrt(),
                forward_airspeed: facing * air_sq.sqrt(),
                forward_airspeed_sq: fwd_sq,
                control_authority: authority,
                sustainer_effectiveness: effectiveness,
                left_tip_wind: left_wind,
                right_tip_wind: right_wind,
            },
        };

        set.push(
            ForceKind::Gravity,
            Vec3::new(0.0, -c.gravity * state.mass, 0.0),
            None,
        );

        let mut drag = Vec3::zeros();
        for (axis, coeff) in [
            (forward, c.drag.forward),
            (-forward, c.drag.back),
            (up, c.drag.top_bottom),
            (-up, c.drag.top_bottom),
            (right, c.drag.sides),
            (-right, c.drag.sides),
        ] {
            let relevance = axis.dot(&-air_dir);
            if relevance <= 0.0 {
                continue;
            }
            drag -= axis * (air_sq * relevance * coeff);
        }
        set.push(ForceKind::Drag, drag, None);

        let drag_alignment = up.dot(&normalize_or_zero(drag)).abs();
        let glide = forward * (drag_alignment * drag.norm() * c.glide_coeff);
        set.push(ForceKind::Glide, glide, None);

        // Wings
        let wing_offset = -forward * c.wing_offset;
        let wing_lift = fwd_sq * 0.5 * c.wing_area_factor * c.lift_coeff;
        for (tip, aileron) in [
            (left_tip, controls.left_aileron),
            (right_tip, controls.right_aileron),
        ] {
            let aileron_force = aileron * fwd_sq * c.aileron_strength * authority;
            let point = tip + wing_offset;
            let lift = up * (wing_lift + aileron_force);
            set.push(ForceKind::Lift, lift, Some(point));
            set.push(
                ForceKind::ControlDrag,
                -forward * (aileron_force.abs() * c.control_drag_coeff),
                Some(point),
            );
        }
        let roll = (up.dot(&right_wind) - up.dot(&left_wind)) * c.wing_lift_torque;
        set.relative_torque = Vec3::new(0.0, 0.0, roll);

        // Tail
        let back = -forward;
        let alignment = air_dir.dot(&back);
        let centering = normalize_or_zero(air_dir * alignment - back);
        let elevator_force = fwd_sq * controls.elevator * c.elevator_strength * authority;
        let rudder_force = fwd_sq * controls.rudder * c.rudder_strength * authority;
        let tail = -up * (c.tail_bias_factor * fwd_sq)
            + centering * (fwd_sq * c.tail_coeff * (1.0 - alignment.abs()))
            + up * elevator_force
            - right * rudder_force;
        set.push(
            ForceKind::ControlDrag,
            -forward * ((elevator_force.abs() + rudder_force.abs()) * c.control_drag_coeff),
            None,
        );
        set.push(ForceKind::Tail, tail, Some(c.geometry.tail(state)));

        set.push(
            ForceKind::Airbrake,
            -forward * (fwd_sq * controls.airbrake * c.airbrake_strength),
            None,
        );
        set.push(
            ForceKind::Thrust,
            forward * (effectiveness * controls.throttle * c.sustainer_strength),
            None,
        );

        trace!(
            "Forces: airspeed {:.1} m/s (fwd {:.1}), authority {:.2}, net {:?}",
            set.air.airspeed,
            set.air.forward_airspeed,
            authority,
            set.net_force()
        );
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atmosphere::UniformWind;
    use crate::flight::controls::ControlConfig;
    use approx::assert_relative_eq;

    fn model() -> FlightModel {
        FlightModel::new(FlightModelConfig::default()).unwrap()
    }

    fn neutral() -> ControlState {
        ControlState::new(ControlConfig::default()).unwrap()
    }

    fn flying_at(speed: f32) -> AircraftState {
        AircraftState {
            position: Vec3::new(0.0, 500.0, 0.0),
            velocity: Vec3::new(0.0, 0.0, speed),
            ..AircraftState::default()
        }
    }

    #[test]
    fn test_still_aircraft_in_still_air_only_falls() {
        let state = AircraftState::default();
        let set = model().compute_forces(&state, &neutral(), &UniformWind(Vec3::zeros()));
        let weight = Vec3::new(0.0, -9.8 * 300.0, 0.0);
        assert_relative_eq!(set.net_force(), weight, epsilon = 1e-3);
        assert_eq!(set.air.forward_airspeed_sq, 0.0);
        assert_eq!(set.relative_torque, Vec3::zeros());
    }

    #[test]
    fn test_forward_flight_produces_lift_and_drag() {
        let still = UniformWind(Vec3::zeros());
        let set = model().compute_forces(&flying_at(20.0), &neutral(), &still);
        assert_relative_eq!(set.air.forward_airspeed_sq, 400.0, epsilon = 1e-3);
        assert_relative_eq!(set.air.forward_airspeed, 20.0, epsilon = 1e-4);
        // Lift = 400 * 0.5 * 1 * 4 per wing
        assert_relative_eq!(
            set.total(ForceKind::Lift),
            Vec3::new(0.0, 1600.0, 0.0),
            epsilon = 1e-2
        );
        // Only the nose faces the airflow
        assert_relative_eq!(
            set.total(ForceKind::Drag),
            Vec3::new(0.0, 0.0, -4.0),
            epsilon = 1e-4
        );
        assert_eq!(set.total(ForceKind::Glide), Vec3::zeros());
    }

    #[test]
    fn test_headwind_counts_as_airspeed() {
        let set = model().compute_forces(
            &AircraftState::default(),
            &neutral(),
            &UniformWind(Vec3::new(0.0, 0.0, -10.0)),
        );
        assert_relative_eq!(set.air.forward_airspeed_sq, 100.0, epsilon = 1e-3);
    }

    #[test]
    fn test_tailwind_gives_negative_lift() {
        let set = model().compute_forces(
            &AircraftState::default(),
            &neutral(),
            &UniformWind(Vec3::new(0.0, 0.0, 10.0)),
        );
        assert!(set.air.forward_airspeed_sq < 0.0);
        assert!(set.total(ForceKind::Lift).y < 0.0);
    }

    #[test]
    fn test_symmetric_lift_has_no_roll() {
        let state = flying_at(10.0);
        let breeze = UniformWind(Vec3::new(1.0, 0.5, 0.0));
        let set = model().compute_forces(&state, &neutral(), &breeze);
        let roll = set.torque_about(state.position, &state).dot(&state.forward());
        assert_relative_eq!(roll, 0.0, epsilon = 1e-2);
    }

    #[test]
    fn test_sinking_glider_gets_glide_push() {
        let state = AircraftState {
            velocity: Vec3::new(0.0, -3.0, 20.0),
            ..AircraftState::default()
        };
        let set = model().compute_forces(&state, &neutral(), &UniformWind(Vec3::zeros()));
        let glide = set.total(ForceKind::Glide);
        assert!(glide.z > 0.0);
        assert_relative_eq!(glide.x, 0.0);
        // Belly drag pushes up
        assert!(set.total(ForceKind::Drag).y > 0.0);
    }

    #[test]
    fn test_authority_ramps_to_lockup() {
        let config = FlightModelConfig {
            lockup_speed: 10.0,
            ..FlightModelConfig::default()
        };
        let m = FlightModel::new(config).unwrap();
        assert_relative_eq!(m.control_authority(25.0), 0.25);
        assert_eq!(m.control_authority(900.0), 1.0);
        assert_eq!(m.control_authority(-50.0), 0.0);

        let no_lockup = FlightModel::new(FlightModelConfig {
            lockup_speed: 0.0,
            ..FlightModelConfig::default()
        })
        .unwrap();
        assert_eq!(no_lockup.control_authority(0.0), 1.0);
    }

    #[test]
    fn test_sustainer_fades_with_speed() {
        let m = model();
        assert_eq!(m.sustainer_effectiveness(0.0), 1.0);
        assert_relative_eq!(m.sustainer_effectiveness(400.0), 0.5);
        assert_eq!(m.sustainer_effectiveness(2500.0), 0.0);
        assert_eq!(m.sustainer_effectiveness(-100.0), 1.0);

        let none = FlightModel::new(FlightModelConfig {
            sustainer_max_speed: 0.0,
            ..FlightModelConfig::default()
        })
        .unwrap();
        assert_eq!(none.sustainer_effectiveness(0.0), 0.0);
    }

    #[test]
    fn test_thermal_under_one_wing_rolls_away() {
        struct RightWingLift;
        impl AmbientWind for RightWingLift {
            fn static_wind(&self) -> Vec3 {
                Vec3::zeros()
            }
            fn local_wind_at(&self, position: Vec3) -> Vec3 {
                if position.x > 0.0 {
                    Vec3::new(0.0, 2.0, 0.0)
                } else {
                    Vec3::zeros()
                }
            }
        }
        let set = model().compute_forces(&flying_at(20.0), &neutral(), &RightWingLift);
        assert_relative_eq!(set.relative_torque, Vec3::new(0.0, 0.0, 100.0));
        assert_eq!(set.air.right_tip_wind, Vec3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn test_airbrake_and_thrust_along_axis() {
        let mut controls = neutral();
        controls.airbrake = 0.5;
        controls.throttle = 1.0;
        let still = UniformWind(Vec3::zeros());
        let set = model().compute_forces(&flying_at(20.0), &controls, &still);
        assert_relative_eq!(
            set.total(ForceKind::Airbrake),
            Vec3::new(0.0, 0.0, -400.0),
            epsilon = 1e-2
        );
        assert_relative_eq!(
            set.total(ForceKind::Thrust),
            Vec3::new(0.0, 0.0, 750.0),
            epsilon = 1e-2
        );
    }

    #[test]
    fn test_apply_to_forwards_everything() {
        #[derive(Default)]
        struct Recorder {
            at_com: usize,
            at_point: usize,
            torque: Vec3,
        }
        impl RigidBody for Recorder {
            fn add_force(&mut self, _force: Vec3) {
                self.at_com += 1;
            }
            fn add_force_at_position(&mut self, _force: Vec3, _position: Vec3) {
                self.at_point += 1;
            }
            fn add_relative_torque(&mut self, torque: Vec3) {
                self.torque += torque;
            }
        }

        let set = model().compute_forces(&flying_at(15.0), &neutral(), &UniformWind(Vec3::zeros()));
        let mut body = Recorder::default();
        set.apply_to(&mut body);
        assert_eq!(body.at_com + body.at_point, set.forces.len());
        // Two lifts, two aileron drags, one tail
        assert_eq!(body.at_point, 5);
    }

    #[test]
    fn test_rejects_negative_coefficient() {
        let config = FlightModelConfig {
            glide_coeff: -0.5,
            ..FlightModelConfig::default()
        };
        assert!(FlightModel::new(config).is_err());
    }
}
