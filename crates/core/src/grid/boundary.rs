//! Boundary conditions for the fluid grid.
//!
//! Two policies are used:
//! - **Copy**: after every stage the boundary cells of the output buffer are
//!   overwritten with the input buffer's values at the same indices.
//! - **Neighbour extrapolation** (potential/divergence fields in the projection):
//!   faces take their inward neighbour, then edges average their two inward
//!   neighbours, then corners average their three inward neighbours.

use super::cells::{Cells, Fields, GridDims};

/// Overwrite `dst`'s boundary cells with `src`'s values for the selected fields.
pub(crate) fn copy_boundaries(src: &Cells, dst: &mut Cells, fields: Fields) {
    let dims = src.dims;
    match fields {
        Fields::Velocity => copy_boundary_values(dims, &src.wind, &mut dst.wind),
        Fields::Scalars => {
            copy_boundary_values(dims, &src.pressure, &mut dst.pressure);
            copy_boundary_values(dims, &src.temperature, &mut dst.temperature);
        }
    }
}

/// Copy the boundary shell of one field.
pub(crate) fn copy_boundary_values<T: Copy>(dims: GridDims, src: &[T], dst: &mut [T]) {
    for_each_boundary(dims, |x, y, z| {
        let i = dims.index(x, y, z);
        dst[i] = src[i];
    });
}

/// Extrapolate a scalar field's boundary from its interior.
///
/// Runs in three passes of increasing dimensionality so each pass only reads
/// cells the previous pass (or the interior) already settled.
pub(crate) fn neighbor_boundaries(dims: GridDims, field: &mut [f32]) {
    let last = [dims.nx - 1, dims.ny - 1, dims.nz - 1];
    for order in 1..=3_usize {
        for_each_boundary(dims, |x, y, z| {
            let pos = [x, y, z];
            let on_boundary = [
                x == 0 || x == last[0],
                y == 0 || y == last[1],
                z == 0 || z == last[2],
            ];
            if on_boundary.iter().filter(|&&b| b).count() != order {
                return;
            }

            let mut sum = 0.0_f32;
            for axis in 0..3 {
                if !on_boundary[axis] {
                    continue;
                }
                let mut inward = pos;
                inward[axis] = if pos[axis] == 0 { 1 } else { pos[axis] - 1 };
                sum += field[dims.index(inward[0], inward[1], inward[2])];
            }
            field[dims.index(x, y, z)] = sum / order as f32;
        });
    }
}

/// Visit every cell on the outer shell of the grid exactly once.
fn for_each_boundary(dims: GridDims, mut visit: impl FnMut(usize, usize, usize)) {
    for x in 0..dims.nx {
        let x_edge = x == 0 || x == dims.nx - 1;
        for y in 0..dims.ny {
            let y_edge = y == 0 || y == dims.ny - 1;
            if x_edge || y_edge {
                for z in 0..dims.nz {
                    visit(x, y, z);
                }
            } else {
                visit(x, y, 0);
                visit(x, y, dims.nz - 1);
            }
        }
    }
}
