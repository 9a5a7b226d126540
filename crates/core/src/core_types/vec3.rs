//! Vector type alias and small helpers for 3D positions and directions.

use nalgebra::Vector3;

/// 3D vector type for positions, velocities, forces and directions.
///
/// Alias for `nalgebra::Vector3<f32>`. World and body frames are y-up:
/// x = right, y = up, z = forward.
pub type Vec3 = Vector3<f32>;

/// Lengths below this are treated as zero when normalizing.
pub const NORMALIZE_EPSILON: f32 = 1e-6;

/// World up axis.
#[inline]
#[must_use]
pub fn up() -> Vec3 {
    Vec3::new(0.0, 1.0, 0.0)
}

/// Normalize `v`, returning the zero vector when it is too short to have a direction.
#[inline]
#[must_use]
pub fn normalize_or_zero(v: Vec3) -> Vec3 {
    v.try_normalize(NORMALIZE_EPSILON).unwrap_or_else(Vec3::zeros)
}

/// Normalize `v`, returning `fallback` when it is too short to have a direction.
#[inline]
#[must_use]
pub fn normalize_or(v: Vec3, fallback: Vec3) -> Vec3 {
    v.try_normalize(NORMALIZE_EPSILON).unwrap_or(fallback)
}

/// Drop the vertical component.
#[inline]
#[must_use]
pub fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize_zero_vector() {
        assert_eq!(normalize_or_zero(Vec3::zeros()), Vec3::zeros());
        assert_eq!(normalize_or(Vec3::zeros(), up()), up());
    }

    #[test]
    fn test_normalize_regular_vector() {
        let n = normalize_or_zero(Vec3::new(3.0, 0.0, 4.0));
        assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(n.x, 0.6, epsilon = 1e-6);
    }

    #[test]
    fn test_horizontal_strips_y() {
        assert_eq!(horizontal(Vec3::new(1.0, 5.0, 2.0)), Vec3::new(1.0, 0.0, 2.0));
    }
}
