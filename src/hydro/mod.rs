//! Per-tile kernels for the Lagrangian-Eulerian hydro cycle.
//!
//! Each kernel updates one tile's `FieldStore` in place, looping over global
//! (signed) indexes. Kernels never communicate; the guard zones they read
//! must have been refreshed by a halo exchange beforehand.

use crate::index_space::Axis;

pub mod accelerate;
pub mod advec_cell;
pub mod advec_mom;
pub mod calc_dt;
pub mod flux_calc;
pub mod generate;
pub mod ideal_gas;
pub mod pdv;
pub mod reset;
pub mod viscosity;

/// A number small enough to stand in for zero in denominators.
pub const G_SMALL: f64 = 1.0e-16;

/// A timestep larger than any criterion will produce.
pub const G_BIG: f64 = 1.0e+21;

/// Map an index along the sweep direction and an index across it to a
/// global `(j, k)` index.
pub(crate) fn at(dir: Axis, along: i64, across: i64) -> (i64, i64) {
    match dir {
        Axis::I => (along, across),
        Axis::J => (across, along),
    }
}

#[cfg(test)]
pub(crate) mod testing {

    use crate::field::FieldStore;
    use crate::grid::Grid;
    use crate::index_space::IndexSpace;

    use super::generate::initialise_chunk;

    /// A tile covering a whole 6 x 4 mesh with unit spacing, with uniform
    /// density, energy and velocity set everywhere, guard zones included.
    pub fn uniform_tile(density: f64, energy: f64, xvel: f64, yvel: f64) -> FieldStore {
        let grid = Grid::new(0.0, 6.0, 0.0, 4.0, 6, 4).unwrap();
        let mut fields = FieldStore::allocate(&IndexSpace::inclusive(1, 6, 1, 4));
        initialise_chunk(&mut fields, &grid);
        fields.density0.fill(density);
        fields.density1.fill(density);
        fields.energy0.fill(energy);
        fields.energy1.fill(energy);
        fields.xvel0.fill(xvel);
        fields.xvel1.fill(xvel);
        fields.yvel0.fill(yvel);
        fields.yvel1.fill(yvel);
        fields
    }
}
