//! Stable-fluids wind grid.
//!
//! A bounded 3D grid of cells, each holding a wind velocity and two passive
//! scalars (pressure and temperature), advanced with Stam's stable-fluids
//! scheme:
//!
//! ```text
//! velocity:  diffuse (viscosity) → project → advect → project
//! scalars:   diffuse (diffusion) → advect
//! ```
//!
//! # Buffers
//!
//! The grid owns one published buffer and two working buffers. Each stage
//! reads one buffer and writes the other, so the read side is never mutated
//! mid-stage. After the last stage the result is swapped into the published
//! slot: exactly one swap per step, and readers only ever see complete steps.
//!
//! # Coordinates
//!
//! World positions map to index space by
//! `(position - origin - 0.5 * cell_size) / cell_size`, so integer indices are
//! cell centres. The grid is `wide × tall × wide` cells.

use super::cells::{trilinear, Cell, Cells, GridDims};
use super::stages::{self, ProjectScratch};
use crate::core_types::Vec3;
use crate::error::{require_finite, require_non_negative, require_positive, ConfigError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Fewest cells per axis that leave an interior for the stencils.
pub const MIN_CELLS_PER_AXIS: usize = 3;

/// Most cells a grid may hold. Keeps every flat index exact as `f32`.
pub const MAX_CELLS: usize = 1 << 22;

/// Configuration for a [`FluidGrid`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluidGridConfig {
    /// World position of the grid's minimum corner (m)
    pub origin: Vec3,
    /// Horizontal extent along x and z (m)
    pub width: f32,
    /// Vertical extent (m)
    pub height: f32,
    /// Horizontal cell size (m)
    pub cell_width: f32,
    /// Vertical cell size (m)
    pub cell_height: f32,
    /// Scalar diffusion coefficient
    pub diffusion: f32,
    /// Velocity diffusion coefficient
    pub viscosity: f32,
    /// Multiplier applied to sampled wind
    pub wind_strength: f32,
    /// Seconds of simulated time per macro-step
    pub sim_period_s: f32,
    /// Gauss-Seidel passes per relaxation
    pub solver_iterations: usize,
    /// Value every cell starts with
    pub initial_cell: Cell,
}

impl Default for FluidGridConfig {
    fn default() -> Self {
        Self {
            origin: Vec3::zeros(),
            width: 200.0,
            height: 100.0,
            cell_width: 20.0,
            cell_height: 10.0,
            diffusion: 1e-5,
            viscosity: 1e-5,
            wind_strength: 1.0,
            sim_period_s: 5.0,
            solver_iterations: 20,
            initial_cell: Cell::default(),
        }
    }
}

impl FluidGridConfig {
    /// Cell counts implied by the extents (truncated toward zero).
    #[must_use]
    pub fn dims(&self) -> GridDims {
        let wide = (self.width / self.cell_width).max(0.0) as usize;
        let tall = (self.height / self.cell_height).max(0.0) as usize;
        GridDims {
            nx: wide,
            ny: tall,
            nz: wide,
        }
    }

    /// Cell edge lengths along x, y and z.
    #[must_use]
    pub fn cell_size(&self) -> Vec3 {
        Vec3::new(self.cell_width, self.cell_height, self.cell_width)
    }

    /// Check every parameter.
    ///
    /// # Errors
    /// Returns the first [`ConfigError`] found: non-finite values, non-positive
    /// extents or period, negative coefficients, or fewer than
    /// [`MIN_CELLS_PER_AXIS`] cells on an axis, or more than [`MAX_CELLS`]
    /// cells in total.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_finite("origin.x", self.origin.x)?;
        require_finite("origin.y", self.origin.y)?;
        require_finite("origin.z", self.origin.z)?;
        require_positive("width", self.width)?;
        require_positive("height", self.height)?;
        require_positive("cell_width", self.cell_width)?;
        require_positive("cell_height", self.cell_height)?;
        require_non_negative("diffusion", self.diffusion)?;
        require_non_negative("viscosity", self.viscosity)?;
        require_finite("wind_strength", self.wind_strength)?;
        require_positive("sim_period_s", self.sim_period_s)?;
        require_finite("initial_cell.pressure", self.initial_cell.pressure)?;
        require_finite("initial_cell.temperature", self.initial_cell.temperature)?;
        if !self.initial_cell.wind.iter().all(|c| c.is_finite()) {
            return Err(ConfigError::NotFinite {
                name: "initial_cell.wind",
            });
        }

        let dims = self.dims();
        for (axis, cells) in [("wide", dims.nx), ("tall", dims.ny)] {
            if cells < MIN_CELLS_PER_AXIS {
                return Err(ConfigError::GridTooSmall {
                    axis,
                    cells,
                    min: MIN_CELLS_PER_AXIS,
                });
            }
        }
        let cells = dims
            .nx
            .checked_mul(dims.ny)
            .and_then(|slab| slab.checked_mul(dims.nz));
        match cells {
            Some(cells) if cells <= MAX_CELLS => Ok(()),
            cells => Err(ConfigError::GridTooLarge {
                cells,
                max: MAX_CELLS,
            }),
        }
    }
}

/// Double-buffered stable-fluids grid.
#[derive(Debug, Clone)]
pub struct FluidGrid {
    config: FluidGridConfig,
    dims: GridDims,
    cell_size: Vec3,
    current: Cells,
    work_a: Cells,
    work_b: Cells,
    scratch: ProjectScratch,
    steps_taken: u64,
}

impl FluidGrid {
    /// Allocate a grid with every cell set to `config.initial_cell`.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] when the configuration fails
    /// [`FluidGridConfig::validate`].
    pub fn new(config: FluidGridConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let dims = config.dims();
        let current = Cells::filled(dims, config.initial_cell);
        info!(
            "Creating fluid grid {}x{}x{} ({} cells, {:.1}m x {:.1}m cells)",
            dims.nx,
            dims.ny,
            dims.nz,
            dims.len(),
            config.cell_width,
            config.cell_height
        );
        Ok(Self {
            cell_size: config.cell_size(),
            work_a: current.clone(),
            work_b: current.clone(),
            scratch: ProjectScratch::new(dims),
            current,
            dims,
            config,
            steps_taken: 0,
        })
    }

    /// Grid configuration.
    #[must_use]
    pub fn config(&self) -> &FluidGridConfig {
        &self.config
    }

    /// Cell counts per axis.
    #[must_use]
    pub fn dims(&self) -> GridDims {
        self.dims
    }

    /// Completed macro-steps since construction.
    #[must_use]
    pub fn steps_taken(&self) -> u64 {
        self.steps_taken
    }

    /// Advance the grid by one macro-step of `dt` seconds.
    ///
    /// Non-finite or non-positive `dt` leaves the grid untouched.
    pub fn step(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            warn!("Skipping fluid grid step with invalid dt {}", dt);
            return;
        }
        let iterations = self.config.solver_iterations;
        let viscous = stages::diffusion_rate(self.dims, self.config.viscosity, dt);
        let diffusive = stages::diffusion_rate(self.dims, self.config.diffusion, dt);
        let scale = stages::advection_scale(self.dims, self.cell_size, dt);

        let (a, b) = (&mut self.work_a, &mut self.work_b);
        stages::diffuse_velocity(&self.current, a, viscous, iterations);
        stages::project(a, b, &mut self.scratch, iterations);
        stages::advect_velocity(b, a, scale);
        stages::project(a, b, &mut self.scratch, iterations);
        stages::diffuse_scalars(b, a, diffusive, iterations);
        stages::advect_scalars(a, b, scale);
        std::mem::swap(&mut self.current, b);

        self.steps_taken += 1;
        debug!(
            "Fluid grid step {} (dt={:.2}s, max divergence {:.4})",
            self.steps_taken,
            dt,
            self.max_divergence()
        );
    }

    /// Position in fractional index space, where integers are cell centres.
    fn index_space(&self, position: Vec3) -> Vec3 {
        (position - self.config.origin - self.cell_size * 0.5).component_div(&self.cell_size)
    }

    /// Trilinearly interpolated wind at a world position, scaled by `wind_strength`.
    ///
    /// Outside the grid the sample fades to zero.
    #[must_use]
    pub fn sample_wind(&self, position: Vec3) -> Vec3 {
        trilinear(self.dims, &self.current.wind, self.index_space(position))
            * self.config.wind_strength
    }

    /// Trilinearly interpolated pressure at a world position.
    #[must_use]
    pub fn sample_pressure(&self, position: Vec3) -> f32 {
        let p = self.index_space(position);
        trilinear(self.dims, &self.current.pressure, p)
    }

    /// Trilinearly interpolated temperature at a world position.
    #[must_use]
    pub fn sample_temperature(&self, position: Vec3) -> f32 {
        let p = self.index_space(position);
        trilinear(self.dims, &self.current.temperature, p)
    }

    /// Copy of one published cell, or `None` outside the grid.
    #[must_use]
    pub fn cell(&self, x: usize, y: usize, z: usize) -> Option<Cell> {
        self.dims
            .contains(x, y, z)
            .then(|| self.current.get(self.dims.index(x, y, z)))
    }

    /// Overwrite one published cell. Returns `false` outside the grid.
    pub fn set_cell(&mut self, x: usize, y: usize, z: usize, cell: Cell) -> bool {
        if !self.dims.contains(x, y, z) {
            return false;
        }
        self.current.set(self.dims.index(x, y, z), cell);
        true
    }

    /// Add to one cell's wind. Returns `false` outside the grid.
    pub fn add_wind(&mut self, x: usize, y: usize, z: usize, delta: Vec3) -> bool {
        if !self.dims.contains(x, y, z) {
            return false;
        }
        self.current.wind[self.dims.index(x, y, z)] += delta;
        true
    }

    /// Add to one cell's pressure. Returns `false` outside the grid.
    pub fn add_pressure(&mut self, x: usize, y: usize, z: usize, delta: f32) -> bool {
        if !self.dims.contains(x, y, z) {
            return false;
        }
        self.current.pressure[self.dims.index(x, y, z)] += delta;
        true
    }

    /// Add to one cell's temperature. Returns `false` outside the grid.
    pub fn add_temperature(&mut self, x: usize, y: usize, z: usize, delta: f32) -> bool {
        if !self.dims.contains(x, y, z) {
            return false;
        }
        self.current.temperature[self.dims.index(x, y, z)] += delta;
        true
    }

    /// World position of a cell centre.
    #[must_use]
    pub fn cell_center(&self, x: usize, y: usize, z: usize) -> Vec3 {
        let index = Vec3::new(x as f32 + 0.5, y as f32 + 0.5, z as f32 + 0.5);
        self.config.origin + index.component_mul(&self.cell_size)
    }

    /// Indices of the cell containing a world position, or `None` outside the grid.
    #[must_use]
    pub fn cell_containing(&self, position: Vec3) -> Option<(usize, usize, usize)> {
        let local = (position - self.config.origin).component_div(&self.cell_size);
        if !local.iter().all(|c| c.is_finite() && *c >= 0.0) {
            return None;
        }
        let (x, y, z) = (
            local.x.floor() as usize,
            local.y.floor() as usize,
            local.z.floor() as usize,
        );
        self.dims.contains(x, y, z).then_some((x, y, z))
    }

    /// Central-difference divergence of the published wind at a cell, in
    /// index units. Boundary and out-of-grid cells report zero.
    #[must_use]
    pub fn divergence_at(&self, x: usize, y: usize, z: usize) -> f32 {
        if !self.dims.contains(x, y, z) || self.dims.is_boundary(x, y, z) {
            return 0.0;
        }
        0.5 * stages::central_divergence(self.dims, &self.current.wind, self.dims.index(x, y, z))
    }

    /// Largest absolute interior divergence of the published wind.
    #[must_use]
    pub fn max_divergence(&self) -> f32 {
        let mut max = 0.0_f32;
        for x in 1..self.dims.nx - 1 {
            for y in 1..self.dims.ny - 1 {
                for z in 1..self.dims.nz - 1 {
                    max = max.max(self.divergence_at(x, y, z).abs());
                }
            }
        }
        max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn small_config() -> FluidGridConfig {
        FluidGridConfig {
            width: 100.0,
            height: 50.0,
            cell_width: 10.0,
            cell_height: 10.0,
            ..FluidGridConfig::default()
        }
    }

    #[test]
    fn test_default_dims() {
        let grid = FluidGrid::new(FluidGridConfig::default()).unwrap();
        assert_eq!(
            grid.dims(),
            GridDims {
                nx: 10,
                ny: 10,
                nz: 10
            }
        );
        assert_eq!(grid.steps_taken(), 0);
    }

    #[test]
    fn test_rejects_tiny_grid() {
        let config = FluidGridConfig {
            height: 25.0,
            ..FluidGridConfig::default()
        };
        assert_eq!(
            FluidGrid::new(config).unwrap_err(),
            ConfigError::GridTooSmall {
                axis: "tall",
                cells: 2,
                min: 3
            }
        );
    }

    #[test]
    fn test_rejects_oversized_grid() {
        let overflowing = FluidGridConfig {
            width: 1e10,
            height: 1e10,
            cell_width: 1e-3,
            cell_height: 1e-3,
            ..FluidGridConfig::default()
        };
        assert_eq!(
            FluidGrid::new(overflowing).unwrap_err(),
            ConfigError::GridTooLarge {
                cells: None,
                max: MAX_CELLS
            }
        );

        // 200 x 200 x 200 fits in usize but exceeds the cap
        let huge = FluidGridConfig {
            width: 2000.0,
            height: 2000.0,
            cell_width: 10.0,
            cell_height: 10.0,
            ..FluidGridConfig::default()
        };
        assert_eq!(
            huge.validate(),
            Err(ConfigError::GridTooLarge {
                cells: Some(8_000_000),
                max: MAX_CELLS
            })
        );

        let largest = FluidGridConfig {
            width: 1280.0,
            height: 1000.0,
            cell_width: 10.0,
            cell_height: 10.0,
            ..FluidGridConfig::default()
        };
        assert!(largest.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_coefficients() {
        let negative = FluidGridConfig {
            viscosity: -1.0,
            ..FluidGridConfig::default()
        };
        assert!(matches!(
            negative.validate(),
            Err(ConfigError::Negative {
                name: "viscosity",
                ..
            })
        ));
        let zero_period = FluidGridConfig {
            sim_period_s: 0.0,
            ..FluidGridConfig::default()
        };
        assert!(zero_period.validate().is_err());
        let nan_cell = FluidGridConfig {
            cell_width: f32::NAN,
            ..FluidGridConfig::default()
        };
        assert!(nan_cell.validate().is_err());
    }

    #[test]
    fn test_uniform_wind_samples_uniformly_inside() {
        let mut config = small_config();
        config.initial_cell.wind = Vec3::new(3.0, 0.0, 1.0);
        config.wind_strength = 2.0;
        let grid = FluidGrid::new(config).unwrap();

        let centre = grid.cell_center(4, 2, 4);
        assert_relative_eq!(grid.sample_wind(centre), Vec3::new(6.0, 0.0, 2.0));
        let between = centre + Vec3::new(3.0, 4.0, -2.0);
        let wind = grid.sample_wind(between);
        assert_relative_eq!(wind, Vec3::new(6.0, 0.0, 2.0), epsilon = 1e-5);
    }

    #[test]
    fn test_sample_far_outside_is_zero() {
        let mut config = small_config();
        config.initial_cell.wind = Vec3::new(3.0, 0.0, 1.0);
        let grid = FluidGrid::new(config).unwrap();
        let outside = Vec3::new(-500.0, 10.0, 10.0);
        assert_eq!(grid.sample_wind(outside), Vec3::zeros());
        assert_eq!(grid.sample_pressure(Vec3::new(0.0, 1e4, 0.0)), 0.0);
    }

    #[test]
    fn test_cell_lookup_round_trips_centres() {
        let grid = FluidGrid::new(small_config()).unwrap();
        let centre = grid.cell_center(7, 3, 1);
        assert_eq!(grid.cell_containing(centre), Some((7, 3, 1)));
        assert_eq!(grid.cell_containing(Vec3::new(-1.0, 5.0, 5.0)), None);
        assert_eq!(grid.cell_containing(Vec3::new(5.0, 5.0, 100.0)), None);
    }

    #[test]
    fn test_edit_cells() {
        let mut grid = FluidGrid::new(small_config()).unwrap();
        assert!(grid.add_wind(2, 2, 2, Vec3::new(1.0, 0.0, 0.0)));
        assert!(grid.add_pressure(2, 2, 2, 0.5));
        assert!(!grid.add_wind(50, 0, 0, Vec3::new(1.0, 0.0, 0.0)));
        let cell = grid.cell(2, 2, 2).unwrap();
        assert_eq!(cell.wind, Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(cell.pressure, 1.5);
        assert!(grid.cell(10, 0, 0).is_none());

        assert!(grid.set_cell(1, 1, 1, Cell::zero()));
        assert_eq!(grid.cell(1, 1, 1), Some(Cell::zero()));
    }

    #[test]
    fn test_step_of_resting_air_is_identity() {
        let mut grid = FluidGrid::new(small_config()).unwrap();
        let before: Vec<Cell> = (0..10).map(|i| grid.cell(i, 2, 3).unwrap()).collect();
        grid.step(5.0);
        for (i, cell) in before.iter().enumerate() {
            let after = grid.cell(i, 2, 3).unwrap();
            assert_relative_eq!(after.wind, cell.wind, epsilon = 1e-6);
            assert_relative_eq!(after.pressure, cell.pressure, epsilon = 1e-6);
            assert_relative_eq!(after.temperature, cell.temperature, epsilon = 1e-6);
        }
        assert_eq!(grid.steps_taken(), 1);
    }

    #[test]
    fn test_invalid_dt_is_skipped() {
        let mut grid = FluidGrid::new(small_config()).unwrap();
        grid.step(0.0);
        grid.step(f32::NAN);
        assert_eq!(grid.steps_taken(), 0);
    }

    #[test]
    fn test_divergence_diagnostics() {
        let mut grid = FluidGrid::new(small_config()).unwrap();
        assert_eq!(grid.max_divergence(), 0.0);
        grid.add_wind(5, 2, 5, Vec3::new(2.0, 0.0, 0.0));
        assert_relative_eq!(grid.divergence_at(4, 2, 5), 1.0);
        assert_relative_eq!(grid.divergence_at(6, 2, 5), -1.0);
        assert_eq!(grid.divergence_at(0, 2, 5), 0.0);
        assert_relative_eq!(grid.max_divergence(), 1.0);
    }
}
