//! Thermal updrafts.
//!
//! A thermal is a column of rising air anchored at a ground origin and leaning
//! downwind. Its axis points along `prevailing_wind + up * vertical_speed`, so a
//! strong thermal in a light breeze stands nearly upright while a weak one in a
//! strong breeze is blown over.
//!
//! # Wind profile
//!
//! ```text
//! closest = origin + axis * dot(p - origin, axis)
//! r       = |p - closest| / radius
//! wind    = up * vertical_speed * falloff(r)
//! ```
//!
//! The lift is always vertical even though the column leans: the lean only
//! decides *where* the lift is found.
//!
//! # Column geometry
//!
//! The column is a capsule from the origin up the axis, sized so that its top
//! reaches the cloud base plus one radius of margin at each end:
//!
//! ```text
//! length = (cloud_base - origin.y) + 2 * radius
//! slope  = atan(vertical_speed / |horizontal wind|)
//! height = length / sin(slope)      (length when there is no horizontal wind)
//! ```

use crate::core_types::vec3::{self, horizontal, normalize_or, NORMALIZE_EPSILON};
use crate::core_types::{FalloffCurve, Vec3};
use crate::error::{require_finite, require_non_negative, require_positive, ConfigError};
use serde::{Deserialize, Serialize};

/// Parameters for a new [`Thermal`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalParams {
    /// Ground anchor of the column (m)
    pub origin: Vec3,
    /// Wind the column leans with (m/s)
    pub prevailing_wind: Vec3,
    /// Peak vertical speed on the axis (m/s)
    pub vertical_speed: f32,
    /// Radius the falloff curve is normalized against (m)
    pub radius: f32,
    /// Strength multiplier by normalized radial distance
    pub falloff: FalloffCurve,
    /// World height of the cloud base (m)
    pub cloud_base_height: f32,
    /// Seconds until the thermal dies
    pub lifetime_s: f32,
}

impl Default for ThermalParams {
    fn default() -> Self {
        Self {
            origin: Vec3::zeros(),
            prevailing_wind: Vec3::zeros(),
            vertical_speed: 3.0,
            radius: 50.0,
            falloff: FalloffCurve::default(),
            cloud_base_height: 1500.0,
            lifetime_s: 600.0,
        }
    }
}

/// Capsule enclosing a thermal, from its ground origin to above the cloud base.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermalColumn {
    /// Bottom of the axis segment (the thermal origin)
    pub base: Vec3,
    /// Unit direction of the column
    pub axis: Vec3,
    /// Capsule radius (m)
    pub radius: f32,
    /// Total capsule height including both caps (m)
    pub height: f32,
    /// Where the cloud sits, at the top of the capsule
    pub cloud_position: Vec3,
}

impl ThermalColumn {
    /// Top of the axis segment (centre of the upper cap).
    #[must_use]
    pub fn top(&self) -> Vec3 {
        self.base + self.axis * (self.height - 2.0 * self.radius).max(0.0)
    }

    /// Whether `point` lies inside the capsule.
    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        let segment = (self.height - 2.0 * self.radius).max(0.0);
        let along = (point - self.base).dot(&self.axis).clamp(0.0, segment);
        let nearest = self.base + self.axis * along;
        (point - nearest).norm_squared() <= self.radius * self.radius
    }
}

/// A single thermal updraft with a finite lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thermal {
    origin: Vec3,
    prevailing_wind: Vec3,
    vertical_speed: f32,
    radius: f32,
    falloff: FalloffCurve,
    cloud_base_height: f32,
    lifetime_remaining: f32,
    axis: Vec3,
}

impl Thermal {
    /// Build a thermal from validated parameters.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] for non-finite values, a non-positive radius,
    /// a negative vertical speed or lifetime, or a cloud base below the origin.
    pub fn new(params: ThermalParams) -> Result<Self, ConfigError> {
        for (name, v) in [
            ("origin.x", params.origin.x),
            ("origin.y", params.origin.y),
            ("origin.z", params.origin.z),
            ("prevailing_wind.x", params.prevailing_wind.x),
            ("prevailing_wind.y", params.prevailing_wind.y),
            ("prevailing_wind.z", params.prevailing_wind.z),
        ] {
            require_finite(name, v)?;
        }
        require_positive("radius", params.radius)?;
        require_non_negative("vertical_speed", params.vertical_speed)?;
        require_non_negative("lifetime_s", params.lifetime_s)?;
        require_finite("cloud_base_height", params.cloud_base_height)?;
        if params.cloud_base_height < params.origin.y {
            return Err(ConfigError::InvalidRange {
                name: "cloud_base_height",
                min: params.origin.y,
                max: params.cloud_base_height,
            });
        }

        let axis = normalize_or(
            params.prevailing_wind + vec3::up() * params.vertical_speed,
            vec3::up(),
        );
        Ok(Self {
            origin: params.origin,
            prevailing_wind: params.prevailing_wind,
            vertical_speed: params.vertical_speed,
            radius: params.radius,
            falloff: params.falloff,
            cloud_base_height: params.cloud_base_height,
            lifetime_remaining: params.lifetime_s,
            axis,
        })
    }

    /// Ground anchor.
    #[must_use]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Unit column direction.
    #[must_use]
    pub fn axis(&self) -> Vec3 {
        self.axis
    }

    /// Peak vertical speed (m/s).
    #[must_use]
    pub fn vertical_speed(&self) -> f32 {
        self.vertical_speed
    }

    /// Falloff radius (m).
    #[must_use]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Wind the column leans with.
    #[must_use]
    pub fn prevailing_wind(&self) -> Vec3 {
        self.prevailing_wind
    }

    /// Seconds left to live.
    #[must_use]
    pub fn lifetime_remaining(&self) -> f32 {
        self.lifetime_remaining
    }

    /// Vertical wind this thermal contributes at `position`.
    #[must_use]
    pub fn wind_at(&self, position: Vec3) -> Vec3 {
        let to_point = position - self.origin;
        let closest = self.origin + self.axis * to_point.dot(&self.axis);
        let distance = (position - closest).norm();
        vec3::up() * self.vertical_speed * self.falloff.evaluate(distance / self.radius)
    }

    /// Capsule geometry of the column.
    #[must_use]
    pub fn column(&self) -> ThermalColumn {
        let length = (self.cloud_base_height - self.origin.y) + 2.0 * self.radius;
        let wind_speed = horizontal(self.prevailing_wind).norm();
        let height = if wind_speed > NORMALIZE_EPSILON {
            let slope = (self.vertical_speed / wind_speed).atan();
            let lean = slope.sin();
            // A column with no lift lies flat; keep its length instead of diverging.
            if lean > NORMALIZE_EPSILON {
                length / lean
            } else {
                length
            }
        } else {
            length
        };
        ThermalColumn {
            base: self.origin,
            axis: self.axis,
            radius: self.radius,
            height,
            cloud_position: self.origin + self.axis * (height - self.radius),
        }
    }

    /// Count down the lifetime by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        if dt.is_finite() && dt > 0.0 {
            self.lifetime_remaining -= dt;
        }
    }

    /// True while lifetime remains.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.lifetime_remaining > 0.0
    }
}
