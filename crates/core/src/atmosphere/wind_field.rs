//! Ambient wind compositing.
//!
//! The wind felt at a point is the sum of three layers:
//!
//! ```text
//! ambient(p) = static_wind + grid.sample_wind(p) + Σ live sources.wind_at(p)
//! ```
//!
//! The field is evaluated on demand with no caching, so it always reflects the
//! latest published grid step and the current set of sources.

use super::wind_source::WindSource;
use crate::core_types::Vec3;
use crate::grid::FluidGrid;
use tracing::debug;

/// Read side of a wind field, as consumed by the flight model.
pub trait AmbientWind {
    /// Uniform background wind.
    fn static_wind(&self) -> Vec3;

    /// Spatially varying wind at `position`, excluding the static component.
    fn local_wind_at(&self, position: Vec3) -> Vec3;

    /// Total wind at `position`.
    fn ambient_wind_at(&self, position: Vec3) -> Vec3 {
        self.static_wind() + self.local_wind_at(position)
    }
}

/// Constant wind everywhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformWind(pub Vec3);

impl AmbientWind for UniformWind {
    fn static_wind(&self) -> Vec3 {
        self.0
    }

    fn local_wind_at(&self, _position: Vec3) -> Vec3 {
        Vec3::zeros()
    }
}

/// Static wind plus an optional fluid grid plus localized sources.
#[derive(Debug, Clone, Default)]
pub struct WindField {
    static_wind: Vec3,
    grid: Option<FluidGrid>,
    sources: Vec<WindSource>,
}

impl WindField {
    /// Field with only a static wind.
    #[must_use]
    pub fn new(static_wind: Vec3) -> Self {
        Self {
            static_wind,
            grid: None,
            sources: Vec::new(),
        }
    }

    /// Attach a fluid grid.
    #[must_use]
    pub fn with_grid(mut self, grid: FluidGrid) -> Self {
        self.grid = Some(grid);
        self
    }

    /// Replace the static wind.
    pub fn set_static_wind(&mut self, wind: Vec3) {
        self.static_wind = wind;
    }

    /// Add a localized source.
    pub fn add_source(&mut self, source: impl Into<WindSource>) {
        self.sources.push(source.into());
    }

    /// Live sources.
    #[must_use]
    pub fn sources(&self) -> &[WindSource] {
        &self.sources
    }

    /// Attached grid, if any.
    #[must_use]
    pub fn grid(&self) -> Option<&FluidGrid> {
        self.grid.as_ref()
    }

    /// Attached grid for mutation (seeding, diagnostics).
    pub fn grid_mut(&mut self) -> Option<&mut FluidGrid> {
        self.grid.as_mut()
    }

    /// Count every source down by `dt` seconds and drop the dead ones.
    ///
    /// Returns how many sources were removed.
    pub fn advance_sources(&mut self, dt: f32) -> usize {
        for source in &mut self.sources {
            source.advance(dt);
        }
        let before = self.sources.len();
        self.sources.retain(WindSource::is_alive);
        let removed = before - self.sources.len();
        if removed > 0 {
            debug!(
                "Removed {} expired wind sources, {} remain",
                removed,
                self.sources.len()
            );
        }
        removed
    }

    /// Advance the attached grid by one macro-step. Returns `false` without a grid.
    pub fn step_grid(&mut self, dt: f32) -> bool {
        match self.grid.as_mut() {
            Some(grid) => {
                grid.step(dt);
                true
            }
            None => false,
        }
    }
}

impl AmbientWind for WindField {
    fn static_wind(&self) -> Vec3 {
        self.static_wind
    }

    fn local_wind_at(&self, position: Vec3) -> Vec3 {
        let grid_wind = self
            .grid
            .as_ref()
            .map_or_else(Vec3::zeros, |grid| grid.sample_wind(position));
        self.sources
            .iter()
            .filter(|source| source.is_alive())
            .fold(grid_wind, |acc, source| acc + source.wind_at(position))
    }
}
