//! Stable-fluids stages.
//!
//! Every stage reads one buffer and writes another; the read buffer is never
//! mutated. Stages where each cell depends only on the read buffer (advection,
//! divergence, gradient subtraction) run in parallel over x slabs. The
//! Gauss-Seidel relaxations read their own partial output and stay sequential.

use super::boundary::{copy_boundaries, copy_boundary_values, neighbor_boundaries};
use super::cells::{trilinear, Cells, FieldValue, Fields, GridDims};
use crate::core_types::Vec3;
use rayon::prelude::*;

/// Reusable buffers for the pressure solve.
#[derive(Debug, Clone)]
pub(crate) struct ProjectScratch {
    pub(crate) divergence: Vec<f32>,
    pub(crate) potential: Vec<f32>,
}

impl ProjectScratch {
    pub(crate) fn new(dims: GridDims) -> Self {
        Self {
            divergence: vec![0.0; dims.len()],
            potential: vec![0.0; dims.len()],
        }
    }
}

/// Implicit diffusion strength for one step.
///
/// Uses the wide and tall extents of the grid, matching how the solver was
/// tuned: `coeff * dt * (nx - 1)^2 * (ny - 1)`.
pub(crate) fn diffusion_rate(dims: GridDims, coeff: f32, dt: f32) -> f32 {
    let wide = (dims.nx - 1) as f32;
    let tall = (dims.ny - 1) as f32;
    coeff * dt * wide * wide * tall
}

/// Backtrace scale per axis, in cells per (m/s).
pub(crate) fn advection_scale(dims: GridDims, cell_size: Vec3, dt: f32) -> Vec3 {
    Vec3::new(
        dt * (dims.nx - 1) as f32 / cell_size.x,
        dt * (dims.ny - 1) as f32 / cell_size.y,
        dt * (dims.nz - 1) as f32 / cell_size.z,
    )
}

/// Gauss-Seidel relaxation of `x` toward the implicit diffusion of `x0`.
///
/// Boundary values are restored from `x0` after every pass.
fn relax<T: FieldValue>(dims: GridDims, x0: &[T], x: &mut [T], rate: f32, iterations: usize) {
    let [sx, sy, sz] = dims.strides();
    let inv_denom = 1.0 / (1.0 + 6.0 * rate);
    for _ in 0..iterations {
        for i in 1..dims.nx - 1 {
            for j in 1..dims.ny - 1 {
                for k in 1..dims.nz - 1 {
                    let c = dims.index(i, j, k);
                    let neighbours =
                        x[c - sx] + x[c + sx] + x[c - sy] + x[c + sy] + x[c - sz] + x[c + sz];
                    x[c] = (x0[c] + neighbours * rate) * inv_denom;
                }
            }
        }
        copy_boundary_values(dims, x0, x);
    }
}

/// Diffuse the wind field; scalars are carried over unchanged.
pub(crate) fn diffuse_velocity(src: &Cells, dst: &mut Cells, rate: f32, iterations: usize) {
    dst.copy_from(src);
    relax(src.dims, &src.wind, &mut dst.wind, rate, iterations);
}

/// Diffuse pressure and temperature; wind is carried over unchanged.
pub(crate) fn diffuse_scalars(src: &Cells, dst: &mut Cells, rate: f32, iterations: usize) {
    dst.copy_from(src);
    let dims = src.dims;
    relax(dims, &src.pressure, &mut dst.pressure, rate, iterations);
    relax(dims, &src.temperature, &mut dst.temperature, rate, iterations);
}

/// Mean cell spacing in normalized grid units.
fn normalized_spacing(dims: GridDims) -> f32 {
    let inv = |n: usize| 1.0 / (n - 1) as f32;
    (inv(dims.nx) + inv(dims.ny) + inv(dims.nz)) / 3.0
}

/// Central-difference divergence of `wind` at an interior cell, in index units.
#[inline]
pub(crate) fn central_divergence(dims: GridDims, wind: &[Vec3], c: usize) -> f32 {
    let [sx, sy, sz] = dims.strides();
    (wind[c + sx].x - wind[c - sx].x)
        + (wind[c + sy].y - wind[c - sy].y)
        + (wind[c + sz].z - wind[c - sz].z)
}

/// Remove the divergent part of the wind field.
///
/// Solves a Poisson equation for a potential with neighbour-extrapolated
/// boundaries, then subtracts its gradient. Scalars are carried over.
pub(crate) fn project(
    src: &Cells,
    dst: &mut Cells,
    scratch: &mut ProjectScratch,
    iterations: usize,
) {
    let dims = src.dims;
    let slab = dims.slab();
    let [sx, sy, sz] = dims.strides();
    let h = normalized_spacing(dims);

    let wind = &src.wind;
    scratch
        .divergence
        .par_chunks_mut(slab)
        .enumerate()
        .for_each(|(x, div_slab)| {
            div_slab.fill(0.0);
            if x == 0 || x == dims.nx - 1 {
                return;
            }
            for y in 1..dims.ny - 1 {
                for z in 1..dims.nz - 1 {
                    let c = dims.index(x, y, z);
                    div_slab[y * dims.nz + z] = -0.5 * h * central_divergence(dims, wind, c);
                }
            }
        });

    let div = &mut scratch.divergence;
    let p = &mut scratch.potential;
    p.fill(0.0);
    neighbor_boundaries(dims, div);
    neighbor_boundaries(dims, p);

    for _ in 0..iterations {
        for i in 1..dims.nx - 1 {
            for j in 1..dims.ny - 1 {
                for k in 1..dims.nz - 1 {
                    let c = dims.index(i, j, k);
                    let neighbours =
                        p[c - sx] + p[c + sx] + p[c - sy] + p[c + sy] + p[c - sz] + p[c + sz];
                    p[c] = (div[c] + neighbours) / 6.0;
                }
            }
        }
        neighbor_boundaries(dims, p);
    }

    let p = &scratch.potential;
    let gradient_scale = 0.5 / h;
    dst.wind
        .par_chunks_mut(slab)
        .enumerate()
        .for_each(|(x, wind_slab)| {
            if x == 0 || x == dims.nx - 1 {
                return;
            }
            for y in 1..dims.ny - 1 {
                for z in 1..dims.nz - 1 {
                    let c = dims.index(x, y, z);
                    let gradient = Vec3::new(
                        p[c + sx] - p[c - sx],
                        p[c + sy] - p[c - sy],
                        p[c + sz] - p[c - sz],
                    );
                    wind_slab[y * dims.nz + z] = wind[c] - gradient * gradient_scale;
                }
            }
        });
    copy_boundaries(src, dst, Fields::Velocity);
    dst.pressure.copy_from_slice(&src.pressure);
    dst.temperature.copy_from_slice(&src.temperature);
}

/// Semi-Lagrangian transport of `field` along `velocity`, interior cells only.
fn advect_field<T: FieldValue>(
    dims: GridDims,
    field: &[T],
    velocity: &[Vec3],
    out: &mut [T],
    scale: Vec3,
) {
    let hi = Vec3::new(
        dims.nx as f32 - 0.5,
        dims.ny as f32 - 0.5,
        dims.nz as f32 - 0.5,
    );
    out.par_chunks_mut(dims.slab())
        .enumerate()
        .for_each(|(x, out_slab)| {
            if x == 0 || x == dims.nx - 1 {
                return;
            }
            for y in 1..dims.ny - 1 {
                for z in 1..dims.nz - 1 {
                    let c = dims.index(x, y, z);
                    let here = Vec3::new(x as f32, y as f32, z as f32);
                    let from = here - scale.component_mul(&velocity[c]);
                    let from = Vec3::new(
                        from.x.clamp(0.5, hi.x),
                        from.y.clamp(0.5, hi.y),
                        from.z.clamp(0.5, hi.z),
                    );
                    out_slab[y * dims.nz + z] = trilinear(dims, field, from);
                }
            }
        });
}

/// Move the wind field along itself; scalars are carried over.
pub(crate) fn advect_velocity(src: &Cells, dst: &mut Cells, scale: Vec3) {
    advect_field(src.dims, &src.wind, &src.wind, &mut dst.wind, scale);
    copy_boundaries(src, dst, Fields::Velocity);
    dst.pressure.copy_from_slice(&src.pressure);
    dst.temperature.copy_from_slice(&src.temperature);
}

/// Move pressure and temperature along the wind; wind is carried over.
pub(crate) fn advect_scalars(src: &Cells, dst: &mut Cells, scale: Vec3) {
    let dims = src.dims;
    let wind = &src.wind;
    advect_field(dims, &src.pressure, wind, &mut dst.pressure, scale);
    advect_field(dims, &src.temperature, wind, &mut dst.temperature, scale);
    copy_boundaries(src, dst, Fields::Scalars);
    dst.wind.copy_from_slice(&src.wind);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::cells::Cell;
    use approx::assert_relative_eq;

    fn cube(n: usize) -> GridDims {
        GridDims {
            nx: n,
            ny: n,
            nz: n,
        }
    }

    fn max_interior_divergence(cells: &Cells) -> f32 {
        let dims = cells.dims;
        let mut max = 0.0_f32;
        for x in 1..dims.nx - 1 {
            for y in 1..dims.ny - 1 {
                for z in 1..dims.nz - 1 {
                    let c = dims.index(x, y, z);
                    max = max.max(central_divergence(dims, &cells.wind, c).abs());
                }
            }
        }
        max
    }

    #[test]
    fn test_diffusion_keeps_uniform_field() {
        let dims = cube(6);
        let mut src = Cells::filled(dims, Cell::default());
        src.wind.fill(Vec3::new(2.0, 0.0, -1.0));
        let mut dst = Cells::filled(dims, Cell::zero());

        diffuse_velocity(&src, &mut dst, 3.0, 20);
        for w in &dst.wind {
            assert_relative_eq!(*w, Vec3::new(2.0, 0.0, -1.0), epsilon = 1e-5);
        }
        assert_eq!(dst.pressure, src.pressure);
    }

    #[test]
    fn test_diffusion_spreads_a_spike_without_growth() {
        let dims = cube(7);
        let mut src = Cells::filled(dims, Cell::zero());
        let centre = dims.index(3, 3, 3);
        src.temperature[centre] = 10.0;
        let mut dst = Cells::filled(dims, Cell::zero());

        diffuse_scalars(&src, &mut dst, 0.5, 20);
        assert!(dst.temperature[centre] < 10.0);
        assert!(dst.temperature[dims.index(4, 3, 3)] > 0.0);
        assert!(dst.temperature.iter().all(|t| t.is_finite() && *t <= 10.0));
    }

    #[test]
    fn test_projection_reduces_divergence() {
        let dims = cube(12);
        let mut src = Cells::filled(dims, Cell::default());
        // Outflow from a small block in the middle of the grid
        for x in 4..8 {
            for y in 4..8 {
                for z in 4..8 {
                    let offset = Vec3::new(x as f32 - 5.5, y as f32 - 5.5, z as f32 - 5.5);
                    src.wind[dims.index(x, y, z)] = offset;
                }
            }
        }
        let before = max_interior_divergence(&src);
        let mut dst = Cells::filled(dims, Cell::zero());
        let mut scratch = ProjectScratch::new(dims);

        project(&src, &mut dst, &mut scratch, 20);

        let after = max_interior_divergence(&dst);
        assert!(after < before, "divergence {before} -> {after}");
        assert_eq!(dst.temperature, src.temperature);
    }

    #[test]
    fn test_projection_of_still_air_is_still() {
        let dims = cube(5);
        let src = Cells::filled(dims, Cell::default());
        let mut dst = Cells::filled(dims, Cell::zero());
        let mut scratch = ProjectScratch::new(dims);
        project(&src, &mut dst, &mut scratch, 20);
        assert!(dst.wind.iter().all(|w| *w == Vec3::zeros()));
    }

    #[test]
    fn test_advection_moves_scalar_downwind() {
        let dims = cube(8);
        let mut src = Cells::filled(dims, Cell::zero());
        src.wind.fill(Vec3::new(1.0, 0.0, 0.0));
        src.pressure[dims.index(3, 4, 4)] = 1.0;
        let mut dst = Cells::filled(dims, Cell::zero());

        // One cell per step along +x
        advect_scalars(&src, &mut dst, Vec3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(dst.pressure[dims.index(4, 4, 4)], 1.0);
        assert_relative_eq!(dst.pressure[dims.index(3, 4, 4)], 0.0);
        assert_eq!(dst.wind, src.wind);
    }

    #[test]
    fn test_advection_clamps_backtrace() {
        let dims = cube(5);
        let mut src = Cells::filled(dims, Cell::zero());
        src.wind.fill(Vec3::new(1000.0, 0.0, 0.0));
        src.temperature.fill(1.0);
        let mut dst = Cells::filled(dims, Cell::zero());

        advect_scalars(&src, &mut dst, Vec3::new(1.0, 1.0, 1.0));
        // Backtrace clamps to x = 0.5, blending the first two columns
        assert_relative_eq!(dst.temperature[dims.index(2, 2, 2)], 1.0);
        assert!(dst.temperature.iter().all(|t| t.is_finite()));
    }

    #[test]
    fn test_rates_follow_grid_extent() {
        let dims = GridDims {
            nx: 11,
            ny: 6,
            nz: 11,
        };
        assert_relative_eq!(diffusion_rate(dims, 1e-3, 2.0), 1e-3 * 2.0 * 100.0 * 5.0);
        let scale = advection_scale(dims, Vec3::new(20.0, 10.0, 20.0), 4.0);
        assert_relative_eq!(scale, Vec3::new(2.0, 2.0, 2.0));
    }
}
