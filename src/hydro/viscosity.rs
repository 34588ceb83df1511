use crate::field::FieldStore;

use super::G_SMALL;

/// Compute the artificial viscosity in every interior cell from the nodal
/// velocity gradients and the pressure gradient, with a limiter that turns it
/// off in expanding or shear-dominated cells.
///
pub fn viscosity(fields: &mut FieldStore) {
    let (x_min, x_max, y_min, y_max) = fields.bounds();
    let FieldStore {
        density0,
        pressure,
        viscosity,
        xvel0,
        yvel0,
        celldx,
        celldy,
        ..
    } = fields;

    for k in y_min..=y_max {
        for j in x_min..=x_max {
            let ugrad = (xvel0[(j + 1, k)] + xvel0[(j + 1, k + 1)]) - (xvel0[(j, k)] + xvel0[(j, k + 1)]);
            let vgrad = (yvel0[(j, k + 1)] + yvel0[(j + 1, k + 1)]) - (yvel0[(j, k)] + yvel0[(j + 1, k)]);
            let div = celldx[j] * ugrad + celldy[k] * vgrad;

            let strain2 = 0.5 * (xvel0[(j, k + 1)] + xvel0[(j + 1, k + 1)] - xvel0[(j, k)] - xvel0[(j + 1, k)]) / celldy[k]
                + 0.5 * (yvel0[(j + 1, k)] + yvel0[(j + 1, k + 1)] - yvel0[(j, k)] - yvel0[(j, k + 1)]) / celldx[j];

            let mut pgradx = (pressure[(j + 1, k)] - pressure[(j - 1, k)]) / (celldx[j] + celldx[j + 1]);
            let mut pgrady = (pressure[(j, k + 1)] - pressure[(j, k - 1)]) / (celldy[k] + celldy[k + 1]);
            let pgradx2 = pgradx * pgradx;
            let pgrady2 = pgrady * pgrady;

            let limiter = ((0.5 * ugrad / celldx[j]) * pgradx2 + (0.5 * vgrad / celldy[k]) * pgrady2 + strain2 * pgradx * pgrady)
                / (pgradx2 + pgrady2).max(G_SMALL);

            if limiter > 0.0 || div >= 0.0 {
                viscosity[(j, k)] = 0.0;
            } else {
                pgradx = G_SMALL.max(pgradx.abs()).copysign(pgradx);
                pgrady = G_SMALL.max(pgrady.abs()).copysign(pgrady);
                let pgrad = (pgradx * pgradx + pgrady * pgrady).sqrt();
                let xgrad = (celldx[j] * pgrad / pgradx).abs();
                let ygrad = (celldy[k] * pgrad / pgrady).abs();
                let grad = xgrad.min(ygrad);
                let grad2 = grad * grad;
                viscosity[(j, k)] = 2.0 * density0[(j, k)] * grad2 * limiter * limiter;
            }
        }
    }
}

#[cfg(test)]
mod test {

    use super::viscosity;
    use crate::hydro::ideal_gas::ideal_gas;
    use crate::hydro::testing::uniform_tile;

    #[test]
    fn uniform_motion_has_no_viscosity() {
        let mut fields = uniform_tile(1.0, 2.0, 0.3, -0.2);
        fields.viscosity.fill(9.0);
        ideal_gas(&mut fields, false);
        viscosity(&mut fields);
        assert_eq!(fields.viscosity[(1, 1)], 0.0);
        assert_eq!(fields.viscosity[(6, 4)], 0.0);
        assert_eq!(fields.viscosity[(0, 0)], 9.0);
    }

    #[test]
    fn expansion_has_no_viscosity() {
        let mut fields = uniform_tile(1.0, 2.0, 0.0, 0.0);
        for k in -1..=7 {
            for j in -1..=9 {
                fields.xvel0[(j, k)] = 0.1 * j as f64;
            }
        }
        fields.pressure[(4, 2)] = 5.0;
        viscosity(&mut fields);
        assert_eq!(fields.viscosity[(3, 2)], 0.0);
        assert_eq!(fields.viscosity[(5, 2)], 0.0);
    }

    #[test]
    fn compression_against_a_pressure_gradient_is_damped() {
        let mut fields = uniform_tile(1.0, 2.0, 0.0, 0.0);
        for k in -1..=7 {
            for j in -1..=9 {
                fields.xvel0[(j, k)] = -0.1 * j as f64;
                fields.pressure[(j.min(8), k.min(6))] = j as f64;
            }
        }
        viscosity(&mut fields);
        assert!(fields.viscosity[(3, 2)] > 0.0);
    }
}
