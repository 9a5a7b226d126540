//! Localized wind contributors.

use super::thermal::Thermal;
use crate::core_types::Vec3;
use serde::{Deserialize, Serialize};

/// A localized source of wind layered on top of the ambient field.
///
/// New kinds (ridge lift, wave, sink) join as variants sharing the same
/// `wind_at` / lifetime interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WindSource {
    /// Buoyant updraft column
    Thermal(Thermal),
}

impl WindSource {
    /// Wind contributed at `position`.
    #[must_use]
    pub fn wind_at(&self, position: Vec3) -> Vec3 {
        match self {
            WindSource::Thermal(thermal) => thermal.wind_at(position),
        }
    }

    /// Count the source's lifetime down by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        match self {
            WindSource::Thermal(thermal) => thermal.advance(dt),
        }
    }

    /// True while the source still contributes.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        match self {
            WindSource::Thermal(thermal) => thermal.is_alive(),
        }
    }
}

impl From<Thermal> for WindSource {
    fn from(thermal: Thermal) -> Self {
        WindSource::Thermal(thermal)
    }
}
