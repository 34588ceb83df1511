use crate::field::FieldStore;
use crate::patch::Patch;

/// Advance the nodal velocities over `dt` under the pressure and viscosity
/// gradients of the four cells around each node.
///
pub fn accelerate(fields: &mut FieldStore, dt: f64) {
    let (x_min, x_max, y_min, y_max) = fields.bounds();
    let FieldStore {
        density0,
        volume,
        xarea,
        yarea,
        pressure,
        viscosity,
        xvel0,
        yvel0,
        xvel1,
        yvel1,
        ..
    } = fields;

    let (pressure, viscosity) = (&*pressure, &*viscosity);
    let halfdt = 0.5 * dt;

    for k in y_min..=y_max + 1 {
        for j in x_min..=x_max + 1 {
            let nodal_mass = (density0[(j - 1, k - 1)] * volume[(j - 1, k - 1)]
                + density0[(j, k - 1)] * volume[(j, k - 1)]
                + density0[(j, k)] * volume[(j, k)]
                + density0[(j - 1, k)] * volume[(j - 1, k)])
                * 0.25;
            let stepbymass = halfdt / nodal_mass;

            let push_x = |p: &Patch| {
                xarea[(j, k)] * (p[(j, k)] - p[(j - 1, k)]) + xarea[(j, k - 1)] * (p[(j, k - 1)] - p[(j - 1, k - 1)])
            };
            let push_y = |p: &Patch| {
                yarea[(j, k)] * (p[(j, k)] - p[(j, k - 1)]) + yarea[(j - 1, k)] * (p[(j - 1, k)] - p[(j - 1, k - 1)])
            };

            xvel1[(j, k)] = xvel0[(j, k)] - stepbymass * push_x(pressure) - stepbymass * push_x(viscosity);
            yvel1[(j, k)] = yvel0[(j, k)] - stepbymass * push_y(pressure) - stepbymass * push_y(viscosity);
        }
    }
}

#[cfg(test)]
mod test {

    use super::accelerate;
    use crate::hydro::ideal_gas::ideal_gas;
    use crate::hydro::testing::uniform_tile;

    #[test]
    fn uniform_pressure_leaves_velocity_alone() {
        let mut fields = uniform_tile(1.0, 2.5, 0.3, -0.1);
        ideal_gas(&mut fields, false);
        fields.pressure.fill(1.0);
        accelerate(&mut fields, 0.1);
        assert_eq!(fields.xvel1[(3, 3)], 0.3);
        assert_eq!(fields.yvel1[(3, 3)], -0.1);
    }

    #[test]
    fn pressure_gradient_pushes_toward_low_pressure() {
        let mut fields = uniform_tile(1.0, 2.5, 0.0, 0.0);
        fields.pressure.fill(1.0);
        for k in -1..=6 {
            for j in 4..=8 {
                fields.pressure[(j, k)] = 2.0;
            }
        }
        accelerate(&mut fields, 0.1);

        // The node between the two regions feels a unit pressure jump on
        // both adjacent faces: 0.05 * (1 + 1).
        assert!((fields.xvel1[(4, 2)] + 0.1).abs() < 1e-14);
        assert_eq!(fields.yvel1[(4, 2)], 0.0);
        assert_eq!(fields.xvel1[(2, 2)], 0.0);
    }
}
