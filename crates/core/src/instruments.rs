//! Cockpit instruments as plain telemetry.
//!
//! The panel turns successive aircraft states into the numbers a glider pilot
//! reads: airspeed, altitude, raw and total-energy compensated climb rate,
//! glide ratio and battery charge. Formatting and display are left to the
//! caller.
//!
//! # Total-energy variometer
//!
//! A raw variometer shows climb whenever the pilot pulls up and trades speed
//! for height. The compensated reading adds back the kinetic energy change:
//!
//! ```text
//! climb       = Δaltitude / dt
//! speed_rate  = Δ|velocity| / dt
//! compensated = climb + speed_rate * |speed_rate| / (2g)
//! ```
//!
//! # Glide ratio
//!
//! Measured from the highest point reached: horizontal distance flown since
//! then divided by height lost. A new high point resets the measurement.

use crate::core_types::Vec3;
use crate::flight::{AirData, AircraftState};
use serde::{Deserialize, Serialize};

/// Glide performance since the last high point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GlideRatio {
    /// At or above the highest point so far
    Climbing,
    /// Not enough history to measure yet
    Unknown,
    /// Horizontal distance per unit of height lost
    Ratio(f32),
}

/// One tick of instrument readings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    /// Signed forward airspeed (m/s)
    pub airspeed: f32,
    /// Speed over the ground (m/s)
    pub ground_speed: f32,
    /// Height (m)
    pub altitude: f32,
    /// Raw climb rate (m/s); `None` on the first reading
    pub climb_rate: Option<f32>,
    /// Total-energy compensated climb rate (m/s); `None` on the first reading
    pub compensated_climb: Option<f32>,
    /// Glide ratio since the last high point
    pub glide_ratio: GlideRatio,
    /// Sustainer battery charge in `[0, 1]`
    pub battery_fraction: f32,
}

/// Stateful instrument panel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InstrumentPanel {
    gravity: f32,
    previous: Option<(AircraftState, f32)>,
    highest: Option<f32>,
    last_position: Option<Vec3>,
    distance_since_high: f32,
}

impl InstrumentPanel {
    /// Panel using `gravity` (m/s²) for energy compensation.
    #[must_use]
    pub fn new(gravity: f32) -> Self {
        Self {
            gravity,
            previous: None,
            highest: None,
            last_position: None,
            distance_since_high: 0.0,
        }
    }

    /// Take a reading.
    ///
    /// # Arguments
    ///
    /// * `state` - Aircraft state this tick
    /// * `air` - Airflow from the force model this tick
    /// * `battery_fraction` - Sustainer charge in `[0, 1]`
    /// * `dt` - Seconds since the previous reading
    pub fn update(
        &mut self,
        state: &AircraftState,
        air: &AirData,
        battery_fraction: f32,
        dt: f32,
    ) -> Telemetry {
        let speed = state.velocity.norm();
        let (climb_rate, compensated_climb) = match self.previous {
            Some((prev, prev_speed)) if dt > 0.0 => {
                let climb = (state.position.y - prev.position.y) / dt;
                let speed_rate = (speed - prev_speed) / dt;
                let compensated = if self.gravity > 0.0 {
                    climb + speed_rate * speed_rate.abs() / (2.0 * self.gravity)
                } else {
                    climb
                };
                (Some(climb), Some(compensated))
            }
            _ => (None, None),
        };
        self.previous = Some((*state, speed));

        Telemetry {
            airspeed: air.forward_airspeed,
            ground_speed: speed,
            altitude: state.position.y,
            climb_rate,
            compensated_climb,
            glide_ratio: self.update_glide_ratio(state),
            battery_fraction: battery_fraction.clamp(0.0, 1.0),
        }
    }

    fn update_glide_ratio(&mut self, state: &AircraftState) -> GlideRatio {
        let altitude = state.position.y;
        let new_high = match self.highest {
            Some(high) => altitude > high,
            None => true,
        };
        if new_high {
            self.highest = Some(altitude);
            self.distance_since_high = 0.0;
            self.last_position = Some(state.position);
            return GlideRatio::Climbing;
        }
        let Some(last) = self.last_position.replace(state.position) else {
            return GlideRatio::Unknown;
        };
        let step = state.position - last;
        self.distance_since_high += step.x.hypot(step.z);

        let lost = self.highest.unwrap_or(altitude) - altitude;
        if lost > 0.0 {
            GlideRatio::Ratio(self.distance_since_high / lost)
        } else {
            GlideRatio::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn at(position: Vec3, velocity: Vec3) -> AircraftState {
        AircraftState {
            position,
            velocity,
            ..AircraftState::default()
        }
    }

    #[test]
    fn test_first_reading_has_no_vario() {
        let mut panel = InstrumentPanel::new(9.8);
        let t = panel.update(
            &at(Vec3::new(0.0, 300.0, 0.0), Vec3::new(0.0, 0.0, 20.0)),
            &AirData::default(),
            0.5,
            0.02,
        );
        assert_eq!(t.climb_rate, None);
        assert_eq!(t.compensated_climb, None);
        assert_eq!(t.altitude, 300.0);
        assert_relative_eq!(t.ground_speed, 20.0);
        assert_eq!(t.glide_ratio, GlideRatio::Climbing);
    }

    #[test]
    fn test_compensated_climb_formula() {
        let mut panel = InstrumentPanel::new(10.0);
        let air = AirData::default();
        let fast = at(Vec3::new(0.0, 100.0, 0.0), Vec3::new(0.0, 0.0, 30.0));
        let slower = at(Vec3::new(0.0, 102.0, 0.0), Vec3::new(0.0, 0.0, 20.0));
        panel.update(&fast, &air, 1.0, 1.0);
        let t = panel.update(&slower, &air, 1.0, 1.0);
        // climb 2 m/s, speed rate -10 m/s²: 2 - 100 / 20
        assert_relative_eq!(t.climb_rate.unwrap(), 2.0);
        assert_relative_eq!(t.compensated_climb.unwrap(), -3.0);
    }

    #[test]
    fn test_glide_ratio_since_high_point() {
        let mut panel = InstrumentPanel::new(9.8);
        let air = AirData::default();
        let v = Vec3::new(0.0, 0.0, 20.0);
        let t = panel.update(&at(Vec3::new(0.0, 500.0, 0.0), v), &air, 1.0, 1.0);
        assert_eq!(t.glide_ratio, GlideRatio::Climbing);
        let t = panel.update(&at(Vec3::new(0.0, 499.0, 30.0), v), &air, 1.0, 1.0);
        assert_eq!(t.glide_ratio, GlideRatio::Ratio(30.0));
        let t = panel.update(&at(Vec3::new(40.0, 498.0, 30.0), v), &air, 1.0, 1.0);
        assert_eq!(t.glide_ratio, GlideRatio::Ratio(35.0));
        // A new high point starts over
        let t = panel.update(&at(Vec3::new(40.0, 510.0, 30.0), v), &air, 1.0, 1.0);
        assert_eq!(t.glide_ratio, GlideRatio::Climbing);
    }

    #[test]
    fn test_glide_distance_ignores_climb_and_sink() {
        let mut panel = InstrumentPanel::new(9.8);
        let air = AirData::default();
        let v = Vec3::new(0.0, 0.0, 20.0);
        panel.update(&at(Vec3::new(0.0, 500.0, 0.0), v), &air, 1.0, 1.0);
        panel.update(&at(Vec3::new(0.0, 496.0, 3.0), v), &air, 1.0, 1.0);
        let t = panel.update(&at(Vec3::new(4.0, 495.0, 6.0), v), &air, 1.0, 1.0);
        // Horizontal legs of 3 and 5 over 5 m lost
        assert_eq!(t.glide_ratio, GlideRatio::Ratio(8.0 / 5.0));
    }

    #[test]
    fn test_level_flight_ratio_is_unknown() {
        let mut panel = InstrumentPanel::new(9.8);
        let air = AirData::default();
        let v = Vec3::new(0.0, 0.0, 20.0);
        panel.update(&at(Vec3::new(0.0, 500.0, 0.0), v), &air, 1.0, 1.0);
        let t = panel.update(&at(Vec3::new(0.0, 500.0, 20.0), v), &air, 1.0, 1.0);
        assert_eq!(t.glide_ratio, GlideRatio::Unknown);
    }

    #[test]
    fn test_battery_fraction_clamped() {
        let mut panel = InstrumentPanel::new(9.8);
        let t = panel.update(&AircraftState::default(), &AirData::default(), 1.7, 0.02);
        assert_eq!(t.battery_fraction, 1.0);
    }
}
