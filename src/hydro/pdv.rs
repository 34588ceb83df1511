use crate::error::{Error, Result};
use crate::field::FieldStore;

/// Apply the PdV work done by the face velocities over `dt`, writing the
/// time-advanced density and energy. The predictor uses only the start of
/// step velocities over a half step; the corrector averages the start and
/// end of step velocities over the full step.
///
/// Fails if any cell volume would become non-positive.
///
pub fn pdv(fields: &mut FieldStore, predict: bool, dt: f64) -> Result<()> {
    let (x_min, x_max, y_min, y_max) = fields.bounds();
    let FieldStore {
        density0,
        density1,
        energy0,
        energy1,
        pressure,
        viscosity,
        xvel0,
        xvel1,
        yvel0,
        yvel1,
        volume,
        xarea,
        yarea,
        ..
    } = fields;

    let (xvel_end, yvel_end, scale) = if predict {
        (&*xvel0, &*yvel0, 0.25 * dt * 0.5)
    } else {
        (&*xvel1, &*yvel1, 0.25 * dt)
    };

    for k in y_min..=y_max {
        for j in x_min..=x_max {
            let left_flux = xarea[(j, k)] * (xvel0[(j, k)] + xvel0[(j, k + 1)] + xvel_end[(j, k)] + xvel_end[(j, k + 1)]) * scale;
            let right_flux = xarea[(j + 1, k)]
                * (xvel0[(j + 1, k)] + xvel0[(j + 1, k + 1)] + xvel_end[(j + 1, k)] + xvel_end[(j + 1, k + 1)])
                * scale;
            let bottom_flux = yarea[(j, k)] * (yvel0[(j, k)] + yvel0[(j + 1, k)] + yvel_end[(j, k)] + yvel_end[(j + 1, k)]) * scale;
            let top_flux = yarea[(j, k + 1)]
                * (yvel0[(j, k + 1)] + yvel0[(j + 1, k + 1)] + yvel_end[(j, k + 1)] + yvel_end[(j + 1, k + 1)])
                * scale;

            let v = volume[(j, k)];
            let total_flux = right_flux - left_flux + top_flux - bottom_flux;
            let volume_change = v / (v + total_flux);
            let min_cell_volume = (v + right_flux - left_flux + top_flux - bottom_flux)
                .min(v + right_flux - left_flux)
                .min(v + top_flux - bottom_flux);

            if min_cell_volume <= 0.0 || volume_change <= 0.0 {
                return Err(Error::NegativeVolume {
                    volume: min_cell_volume.min(v + total_flux),
                    j,
                    k,
                });
            }

            let energy_change = (pressure[(j, k)] / density0[(j, k)] + viscosity[(j, k)] / density0[(j, k)]) * total_flux / v;
            energy1[(j, k)] = energy0[(j, k)] - energy_change;
            density1[(j, k)] = density0[(j, k)] * volume_change;
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {

    use super::pdv;
    use crate::error::Error;
    use crate::hydro::ideal_gas::ideal_gas;
    use crate::hydro::testing::uniform_tile;

    #[test]
    fn uniform_translation_does_no_work() {
        let mut fields = uniform_tile(1.0, 2.5, 0.4, 0.2);
        ideal_gas(&mut fields, false);
        pdv(&mut fields, true, 0.1).unwrap();
        assert!((fields.density1[(2, 2)] - 1.0).abs() < 1e-14);
        assert!((fields.energy1[(2, 2)] - 2.5).abs() < 1e-14);
    }

    #[test]
    fn compression_heats_and_densifies() {
        let mut fields = uniform_tile(1.0, 2.5, 0.0, 0.0);
        ideal_gas(&mut fields, false);
        for k in -1..=7 {
            fields.xvel0[(4, k)] = 1.0;
            fields.xvel1[(4, k)] = 1.0;
        }
        pdv(&mut fields, false, 0.1).unwrap();

        // The face between cells 3 and 4 moves right, expanding 3 into 4.
        assert!(fields.density1[(4, 2)] > 1.0);
        assert!(fields.energy1[(4, 2)] > 2.5);
        assert!(fields.density1[(3, 2)] < 1.0);
        assert!((fields.density1[(1, 2)] - 1.0).abs() < 1e-14);

        // flux through that face is 0.25 * 0.1 * (1 + 1 + 1 + 1) = 0.1
        assert!((fields.density1[(3, 2)] - 1.0 / 1.1).abs() < 1e-14);
        assert!((fields.density1[(4, 2)] - 1.0 / 0.9).abs() < 1e-14);
    }

    #[test]
    fn collapsing_cell_is_an_error() {
        let mut fields = uniform_tile(1.0, 2.5, 0.0, 0.0);
        for k in -1..=7 {
            fields.xvel0[(3, k)] = 20.0;
            fields.xvel1[(3, k)] = 20.0;
        }
        let result = pdv(&mut fields, false, 0.1);
        assert!(matches!(result, Err(Error::NegativeVolume { j: 3, k: 1, .. })));
    }
}
