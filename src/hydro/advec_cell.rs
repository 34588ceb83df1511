use crate::field::{FieldStore, WorkArrays};
use crate::index_space::Axis;

use super::at;

const ONE_BY_SIX: f64 = 1.0 / 6.0;

/// Remap density and energy through the faces normal to `dir`, using the
/// volume fluxes from the Lagrangian step and a second order van Leer
/// limited donor cell scheme. `sweep` is 1 for the first direction of a
/// step and 2 for the second; the first sweep starts from the volume the
/// cells had before either direction was remapped.
///
pub fn advec_cell(fields: &mut FieldStore, dir: Axis, sweep: u32) {
    let (x_min, x_max, y_min, y_max) = fields.bounds();
    let FieldStore {
        density1,
        energy1,
        volume,
        vol_flux_x,
        vol_flux_y,
        mass_flux_x,
        mass_flux_y,
        vertexdx,
        vertexdy,
        work,
        ..
    } = fields;
    let WorkArrays { pre_vol, ener_flux, .. } = work;

    for k in y_min - 2..=y_max + 2 {
        for j in x_min - 2..=x_max + 2 {
            let dfx = vol_flux_x[(j + 1, k)] - vol_flux_x[(j, k)];
            let dfy = vol_flux_y[(j, k + 1)] - vol_flux_y[(j, k)];
            pre_vol[(j, k)] = volume[(j, k)]
                + match (sweep, dir) {
                    (1, _) => dfx + dfy,
                    (_, Axis::I) => dfx,
                    (_, Axis::J) => dfy,
                };
        }
    }

    let (vol_flux, mass_flux, vertexd, (a_min, a_max), (b_min, b_max)) = match dir {
        Axis::I => (&*vol_flux_x, mass_flux_x, &*vertexdx, (x_min, x_max), (y_min, y_max)),
        Axis::J => (&*vol_flux_y, mass_flux_y, &*vertexdy, (y_min, y_max), (x_min, x_max)),
    };

    for b in b_min..=b_max {
        for a in a_min..=a_max + 2 {
            let face = at(dir, a, b);
            let (upwind, donor, downwind, dif) = if vol_flux[face] > 0.0 {
                (a - 2, a - 1, a, a - 1)
            } else {
                let upwind = (a + 1).min(a_max + 2);
                (upwind, a, a - 1, upwind)
            };
            let (upwind, donor_index, downwind) = (at(dir, upwind, b), at(dir, donor, b), at(dir, downwind, b));

            let sigmat = vol_flux[face].abs() / pre_vol[donor_index];
            let sigma3 = (1.0 + sigmat) * (vertexd[a] / vertexd[dif]);
            let sigma4 = 2.0 - sigmat;

            let limiter = van_leer(
                density1[upwind],
                density1[donor_index],
                density1[downwind],
                sigmat,
                sigma3,
                sigma4,
            );
            mass_flux[face] = vol_flux[face] * (density1[donor_index] + limiter);

            let sigmam = mass_flux[face].abs() / (density1[donor_index] * pre_vol[donor_index]);
            let limiter = van_leer(
                energy1[upwind],
                energy1[donor_index],
                energy1[downwind],
                sigmam,
                sigma3,
                sigma4,
            );
            ener_flux[face] = mass_flux[face] * (energy1[donor_index] + limiter);
        }
    }

    for b in b_min..=b_max {
        for a in a_min..=a_max {
            let cell = at(dir, a, b);
            let next = at(dir, a + 1, b);

            let pre_mass = density1[cell] * pre_vol[cell];
            let post_mass = pre_mass + mass_flux[cell] - mass_flux[next];
            let post_ener = (energy1[cell] * pre_mass + ener_flux[cell] - ener_flux[next]) / post_mass;
            let advec_vol = pre_vol[cell] + vol_flux[cell] - vol_flux[next];

            density1[cell] = post_mass / advec_vol;
            energy1[cell] = post_ener;
        }
    }
}

/// The limited correction to a donor cell value, given its upwind and
/// downwind neighbors and the Courant number `sigma` of the flux.
fn van_leer(upwind: f64, donor: f64, downwind: f64, sigma: f64, sigma3: f64, sigma4: f64) -> f64 {
    let diffuw = donor - upwind;
    let diffdw = downwind - donor;
    let wind = if diffdw <= 0.0 { -1.0 } else { 1.0 };

    if diffuw * diffdw > 0.0 {
        (1.0 - sigma)
            * wind
            * diffuw
                .abs()
                .min(diffdw.abs())
                .min(ONE_BY_SIX * (sigma3 * diffuw.abs() + sigma4 * diffdw.abs()))
    } else {
        0.0
    }
}
