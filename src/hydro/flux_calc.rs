use crate::field::FieldStore;

/// Compute the volume swept through each face over `dt`, from the face area
/// and the average of the start and end of step velocities at the face's
/// two nodes.
///
pub fn flux_calc(fields: &mut FieldStore, dt: f64) {
    let (x_min, x_max, y_min, y_max) = fields.bounds();
    let FieldStore {
        xarea,
        yarea,
        xvel0,
        yvel0,
        xvel1,
        yvel1,
        vol_flux_x,
        vol_flux_y,
        ..
    } = fields;

    for k in y_min..=y_max {
        for j in x_min..=x_max + 1 {
            vol_flux_x[(j, k)] = 0.25 * dt * xarea[(j, k)] * (xvel0[(j, k)] + xvel0[(j, k + 1)] + xvel1[(j, k)] + xvel1[(j, k + 1)]);
        }
    }

    for k in y_min..=y_max + 1 {
        for j in x_min..=x_max {
            vol_flux_y[(j, k)] = 0.25 * dt * yarea[(j, k)] * (yvel0[(j, k)] + yvel0[(j + 1, k)] + yvel1[(j, k)] + yvel1[(j + 1, k)]);
        }
    }
}
