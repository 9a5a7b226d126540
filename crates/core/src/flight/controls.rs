//! Control surface smoothing and the sustainer motor.
//!
//! Raw pilot targets never reach the aerodynamics directly. Each surface eases
//! toward its target with a first-order low-pass:
//!
//! ```text
//! value += (target - value) * blend
//! ```
//!
//! With [`Smoothing::PerTick`] the blend is a fixed fraction per update, so
//! the effective time constant depends on the tick rate (at 50 Hz a factor of
//! 0.1 settles in roughly half a second). [`Smoothing::TimeConstant`] uses
//! `1 - exp(-dt / tau)` and feels the same at any tick rate.

use crate::error::{require_non_negative, require_positive, ConfigError};
use serde::{Deserialize, Serialize};

/// How control positions chase their targets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Smoothing {
    /// Fixed blend fraction applied every update regardless of `dt`.
    PerTick {
        /// Fraction of the remaining gap closed per update
        factor: f32,
    },
    /// Frame-rate independent exponential approach.
    TimeConstant {
        /// Seconds to close about 63% of the gap
        tau_s: f32,
    },
}

impl Default for Smoothing {
    fn default() -> Self {
        Smoothing::PerTick { factor: 0.1 }
    }
}

impl Smoothing {
    /// Fraction of the gap to close this update.
    #[must_use]
    pub fn blend(&self, dt: f32) -> f32 {
        match *self {
            Smoothing::PerTick { factor } => factor.clamp(0.0, 1.0),
            Smoothing::TimeConstant { tau_s } => {
                if tau_s <= 0.0 {
                    1.0
                } else {
                    (1.0 - (-dt.max(0.0) / tau_s).exp()).clamp(0.0, 1.0)
                }
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Smoothing::PerTick { factor } => {
                require_positive("smoothing.factor", factor)?;
                if factor > 1.0 {
                    return Err(ConfigError::InvalidRange {
                        name: "smoothing.factor",
                        min: factor,
                        max: 1.0,
                    });
                }
                Ok(())
            }
            Smoothing::TimeConstant { tau_s } => require_positive("smoothing.tau_s", tau_s),
        }
    }
}

/// Raw control targets for one tick.
///
/// Surface values are in "force units" (the fraction of full authority), not
/// deflection angles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlTargets {
    /// Left aileron target (positive pushes the left wing up)
    pub left_aileron: f32,
    /// Right aileron target (positive pushes the right wing up)
    pub right_aileron: f32,
    /// Elevator target (positive pushes the tail up, pitching nose down)
    pub elevator: f32,
    /// Rudder target (positive pushes the tail left, yawing right)
    pub rudder: f32,
    /// Airbrake target
    pub airbrake: f32,
    /// Request to flip the sustainer latch this tick
    pub toggle_sustainer: bool,
}

impl ControlTargets {
    /// Set both ailerons from one roll input; positive banks right.
    #[must_use]
    pub fn with_roll(mut self, roll: f32) -> Self {
        self.left_aileron = roll;
        self.right_aileron = -roll;
        self
    }

    /// Set the elevator target.
    #[must_use]
    pub fn with_elevator(mut self, elevator: f32) -> Self {
        self.elevator = elevator;
        self
    }

    /// Set the rudder target.
    #[must_use]
    pub fn with_rudder(mut self, rudder: f32) -> Self {
        self.rudder = rudder;
        self
    }

    /// Set the airbrake target.
    #[must_use]
    pub fn with_airbrake(mut self, airbrake: f32) -> Self {
        self.airbrake = airbrake;
        self
    }
}

/// Battery parameters for the sustainer motor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SustainerConfig {
    /// Full battery charge
    pub battery_max: f32,
    /// Charge used per second while running
    pub drain: f32,
    /// Charge regained per second while off
    pub regen: f32,
    /// Charge at or below which the motor cuts out
    pub cutoff: f32,
}

impl Default for SustainerConfig {
    fn default() -> Self {
        Self {
            battery_max: 100.0,
            drain: 2.0,
            regen: 0.25,
            cutoff: 0.1,
        }
    }
}

/// Limits and smoothing for [`ControlState`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Smoothing applied to every surface
    pub smoothing: Smoothing,
    /// Aileron, elevator and rudder targets are clamped to `±surface_limit`
    pub surface_limit: f32,
    /// Airbrake targets are clamped to `[0, airbrake_limit]`
    pub airbrake_limit: f32,
    /// Sustainer battery
    pub sustainer: SustainerConfig,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            smoothing: Smoothing::default(),
            surface_limit: 0.5,
            airbrake_limit: 0.5,
            sustainer: SustainerConfig::default(),
        }
    }
}

impl ControlConfig {
    /// Check every parameter.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] for an out-of-range smoothing value, negative
    /// limits or rates, or a non-positive battery capacity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.smoothing.validate()?;
        require_non_negative("surface_limit", self.surface_limit)?;
        require_non_negative("airbrake_limit", self.airbrake_limit)?;
        require_positive("sustainer.battery_max", self.sustainer.battery_max)?;
        require_non_negative("sustainer.drain", self.sustainer.drain)?;
        require_non_negative("sustainer.regen", self.sustainer.regen)?;
        require_non_negative("sustainer.cutoff", self.sustainer.cutoff)?;
        Ok(())
    }
}

/// Sustainer battery and on/off latch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sustainer {
    battery: f32,
    config: SustainerConfig,
    on: bool,
}

impl Sustainer {
    /// Fully charged, switched off.
    #[must_use]
    pub fn new(config: SustainerConfig) -> Self {
        Self {
            battery: config.battery_max,
            config,
            on: false,
        }
    }

    /// Current charge.
    #[must_use]
    pub fn battery(&self) -> f32 {
        self.battery
    }

    /// Full charge.
    #[must_use]
    pub fn battery_max(&self) -> f32 {
        self.config.battery_max
    }

    /// Charge as a fraction of full.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        (self.battery / self.config.battery_max).clamp(0.0, 1.0)
    }

    /// Whether the motor is latched on.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Flip the latch. The motor only switches on with charge left.
    pub fn toggle(&mut self) {
        if self.battery > 0.0 {
            self.on = !self.on;
        }
    }

    /// Latch handling for one tick: honour a toggle request, otherwise cut
    /// the motor once the battery is nearly flat.
    fn update_latch(&mut self, toggle_requested: bool) {
        if toggle_requested && self.battery > 0.0 {
            self.on = !self.on;
        } else if self.battery <= self.config.cutoff {
            self.on = false;
        }
    }

    /// Drain while running, regenerate while off.
    fn integrate(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        if self.on {
            self.battery -= dt * self.config.drain;
        } else {
            self.battery += dt * self.config.regen;
        }
        self.battery = self.battery.clamp(0.0, self.config.battery_max);
    }
}

/// Smoothed control surface positions plus the sustainer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlState {
    /// Left aileron position
    pub left_aileron: f32,
    /// Right aileron position
    pub right_aileron: f32,
    /// Elevator position
    pub elevator: f32,
    /// Rudder position
    pub rudder: f32,
    /// Airbrake position
    pub airbrake: f32,
    /// Sustainer throttle position in `[0, 1]`
    pub throttle: f32,
    /// Sustainer battery and latch
    pub sustainer: Sustainer,
    config: ControlConfig,
}

impl ControlState {
    /// Neutral controls with a full battery.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] when the configuration fails
    /// [`ControlConfig::validate`].
    pub fn new(config: ControlConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            left_aileron: 0.0,
            right_aileron: 0.0,
            elevator: 0.0,
            rudder: 0.0,
            airbrake: 0.0,
            throttle: 0.0,
            sustainer: Sustainer::new(config.sustainer),
            config,
        })
    }

    /// Control configuration.
    #[must_use]
    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    /// Ease every surface toward `targets` and run the sustainer for `dt` seconds.
    pub fn update(&mut self, targets: &ControlTargets, dt: f32) {
        let blend = self.config.smoothing.blend(dt);
        let limit = self.config.surface_limit;
        let ease = |value: f32, target: f32| value + (target - value) * blend;

        self.left_aileron = ease(
            self.left_aileron,
            clamp_target(targets.left_aileron, -limit, limit),
        );
        self.right_aileron = ease(
            self.right_aileron,
            clamp_target(targets.right_aileron, -limit, limit),
        );
        self.elevator = ease(self.elevator, clamp_target(targets.elevator, -limit, limit));
        self.rudder = ease(self.rudder, clamp_target(targets.rudder, -limit, limit));
        self.airbrake = ease(
            self.airbrake,
            clamp_target(targets.airbrake, 0.0, self.config.airbrake_limit),
        );

        self.sustainer.update_latch(targets.toggle_sustainer);
        self.sustainer.integrate(dt);
        let throttle_target = if self.sustainer.is_on() { 1.0 } else { 0.0 };
        self.throttle = ease(self.throttle, throttle_target);
    }
}

/// Clamp a raw target, treating NaN as neutral.
fn clamp_target(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        0.0_f32.clamp(min, max)
    } else {
        value.clamp(min, max)
    }
}
