//! Flat cell storage for the fluid grid.
//!
//! Cells are stored structure-of-arrays in x-major order:
//! `index = (x * ny + y) * nz + z`, so each x index owns one contiguous slab of
//! `ny * nz` values. Stages that touch every cell independently parallelize over
//! those slabs.

use crate::core_types::Vec3;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// One grid unit: local wind velocity plus two advected scalars.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Wind velocity (m/s)
    pub wind: Vec3,
    /// Pressure (arbitrary units, advected/diffused scalar)
    pub pressure: f32,
    /// Temperature (arbitrary units, advected/diffused scalar)
    pub temperature: f32,
}

impl Cell {
    /// Still air, zero pressure, zero temperature.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            wind: Vec3::zeros(),
            pressure: 0.0,
            temperature: 0.0,
        }
    }
}

impl Default for Cell {
    /// Resting atmosphere: still air at unit pressure, mid temperature.
    fn default() -> Self {
        Self {
            wind: Vec3::zeros(),
            pressure: 1.0,
            temperature: 0.5,
        }
    }
}

/// Values the stencils operate on (`f32` scalars and `Vec3` velocities).
pub(crate) trait FieldValue:
    Copy + Send + Sync + Add<Output = Self> + Sub<Output = Self> + Mul<f32, Output = Self>
{
    fn zero() -> Self;
}

impl FieldValue for f32 {
    #[inline]
    fn zero() -> Self {
        0.0
    }
}

impl FieldValue for Vec3 {
    #[inline]
    fn zero() -> Self {
        Vec3::zeros()
    }
}

/// Cell counts per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDims {
    /// Cells along x (wide)
    pub nx: usize,
    /// Cells along y (tall)
    pub ny: usize,
    /// Cells along z (wide)
    pub nz: usize,
}

impl GridDims {
    /// Total number of cells.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    /// True when any axis has no cells.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat index of `(x, y, z)`.
    #[inline]
    #[must_use]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (x * self.ny + y) * self.nz + z
    }

    /// Values per x slab.
    #[inline]
    #[must_use]
    pub fn slab(&self) -> usize {
        self.ny * self.nz
    }

    /// Index strides for the x, y and z axes.
    #[inline]
    #[must_use]
    pub fn strides(&self) -> [usize; 3] {
        [self.ny * self.nz, self.nz, 1]
    }

    /// Cell count along `axis` (0 = x, 1 = y, 2 = z).
    #[inline]
    #[must_use]
    pub fn axis(&self, axis: usize) -> usize {
        match axis {
            0 => self.nx,
            1 => self.ny,
            _ => self.nz,
        }
    }

    /// True if the cell lies in `[0, n)` on every axis.
    #[inline]
    #[must_use]
    pub fn contains(&self, x: usize, y: usize, z: usize) -> bool {
        x < self.nx && y < self.ny && z < self.nz
    }

    /// True if any coordinate sits on the first or last index of its axis.
    #[inline]
    #[must_use]
    pub fn is_boundary(&self, x: usize, y: usize, z: usize) -> bool {
        x == 0 || y == 0 || z == 0 || x == self.nx - 1 || y == self.ny - 1 || z == self.nz - 1
    }
}

/// Which fields a boundary copy touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fields {
    Velocity,
    Scalars,
}

/// One complete grid buffer.
#[derive(Debug, Clone)]
pub(crate) struct Cells {
    pub(crate) dims: GridDims,
    pub(crate) wind: Vec<Vec3>,
    pub(crate) pressure: Vec<f32>,
    pub(crate) temperature: Vec<f32>,
}

impl Cells {
    /// Buffer with every cell set to `fill`.
    pub(crate) fn filled(dims: GridDims, fill: Cell) -> Self {
        let n = dims.len();
        Self {
            dims,
            wind: vec![fill.wind; n],
            pressure: vec![fill.pressure; n],
            temperature: vec![fill.temperature; n],
        }
    }

    pub(crate) fn copy_from(&mut self, other: &Cells) {
        self.wind.copy_from_slice(&other.wind);
        self.pressure.copy_from_slice(&other.pressure);
        self.temperature.copy_from_slice(&other.temperature);
    }

    pub(crate) fn get(&self, idx: usize) -> Cell {
        Cell {
            wind: self.wind[idx],
            pressure: self.pressure[idx],
            temperature: self.temperature[idx],
        }
    }

    pub(crate) fn set(&mut self, idx: usize, cell: Cell) {
        self.wind[idx] = cell.wind;
        self.pressure[idx] = cell.pressure;
        self.temperature[idx] = cell.temperature;
    }
}

/// Trilinear interpolation over the 8 index-space neighbours of `p`.
///
/// Corner weights are `Π(1 - |corner - p|)`. Corners outside the grid are
/// skipped, not clamped, so samples near or beyond the edge fade toward zero.
/// Non-finite positions sample to zero.
pub(crate) fn trilinear<T: FieldValue>(dims: GridDims, data: &[T], p: Vec3) -> T {
    if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) {
        return T::zero();
    }
    let floor = [p.x.floor(), p.y.floor(), p.z.floor()];
    let frac = [p.x - floor[0], p.y - floor[1], p.z - floor[2]];
    let base = [floor[0] as i64, floor[1] as i64, floor[2] as i64];

    let mut acc = T::zero();
    for corner in 0..8_usize {
        let offset = [(corner >> 2) & 1, (corner >> 1) & 1, corner & 1];
        let mut weight = 1.0_f32;
        let mut idx = [0_usize; 3];
        let mut inside = true;
        for axis in 0..3 {
            let i = base[axis] + offset[axis] as i64;
            if i < 0 || i >= dims.axis(axis) as i64 {
                inside = false;
                break;
            }
            idx[axis] = i as usize;
            weight *= if offset[axis] == 1 {
                frac[axis]
            } else {
                1.0 - frac[axis]
            };
        }
        if inside {
            acc = acc + data[dims.index(idx[0], idx[1], idx[2])] * weight;
        }
    }
    acc
}
