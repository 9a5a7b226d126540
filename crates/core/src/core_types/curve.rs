//! Piecewise-linear falloff curves.
//!
//! Thermals look up their strength from a caller-supplied curve of normalized
//! radial distance. The curve is data, not a hardcoded profile: it is built from
//! keyframes, evaluated by linear interpolation, and clamped to its first/last
//! value outside the keyed range.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// One `(t, value)` keyframe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    /// Curve input (normalized distance)
    pub t: f32,
    /// Curve output (strength multiplier)
    pub value: f32,
}

/// Monotonic (non-increasing) piecewise-linear curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FalloffCurve {
    keys: Vec<CurveKey>,
}

impl FalloffCurve {
    /// Build a curve from `(t, value)` pairs.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidCurve`] when no keys are given, a key is not
    /// finite, `t` is not strictly increasing, or the values increase.
    pub fn from_keys(keys: &[(f32, f32)]) -> Result<Self, ConfigError> {
        if keys.is_empty() {
            return Err(ConfigError::InvalidCurve("curve has no keys".to_string()));
        }
        for (i, &(t, value)) in keys.iter().enumerate() {
            if !t.is_finite() || !value.is_finite() {
                return Err(ConfigError::InvalidCurve(format!("key {i} is not finite")));
            }
            if i > 0 {
                let (prev_t, prev_value) = keys[i - 1];
                if t <= prev_t {
                    return Err(ConfigError::InvalidCurve(format!(
                        "key {i} at t={t} does not follow t={prev_t}"
                    )));
                }
                if value > prev_value {
                    return Err(ConfigError::InvalidCurve(format!(
                        "key {i} increases from {prev_value} to {value}"
                    )));
                }
            }
        }
        Ok(Self {
            keys: keys.iter().map(|&(t, value)| CurveKey { t, value }).collect(),
        })
    }

    /// Linear ramp from 1 at the axis to 0 at one radius.
    #[must_use]
    pub fn linear() -> Self {
        Self {
            keys: vec![
                CurveKey { t: 0.0, value: 1.0 },
                CurveKey { t: 1.0, value: 0.0 },
            ],
        }
    }

    /// Soft-edged core: full strength to half a radius, tapering out by 1.2 radii.
    #[must_use]
    pub fn soft_core() -> Self {
        Self {
            keys: vec![
                CurveKey { t: 0.0, value: 1.0 },
                CurveKey { t: 0.5, value: 0.9 },
                CurveKey { t: 0.85, value: 0.35 },
                CurveKey { t: 1.2, value: 0.0 },
            ],
        }
    }

    /// Keyframes in ascending `t`.
    #[must_use]
    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }

    /// Evaluate the curve at `t`, clamping outside the keyed range.
    #[must_use]
    pub fn evaluate(&self, t: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 0.0,
        };
        if t.is_nan() || t <= first.t {
            return first.value;
        }
        if t >= last.t {
            return last.value;
        }
        // First key strictly after t; keys are sorted so this is the right segment.
        let hi = self.keys.partition_point(|k| k.t <= t);
        let a = self.keys[hi - 1];
        let b = self.keys[hi];
        let frac = (t - a.t) / (b.t - a.t);
        a.value + (b.value - a.value) * frac
    }
}

impl Default for FalloffCurve {
    fn default() -> Self {
        Self::linear()
    }
}
