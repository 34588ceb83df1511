use crate::field::{FieldStore, WorkArrays};
use crate::index_space::Axis;

use super::at;

/// Remap one nodal velocity component through the faces normal to `dir`.
/// The mass fluxes computed by the matching cell sweep are averaged onto the
/// node-centered control volumes and carry momentum with a limited donor
/// cell scheme. `which_vel` selects `xvel1` or `yvel1`.
///
pub fn advec_mom(fields: &mut FieldStore, which_vel: Axis, dir: Axis, sweep: u32) {
    let (x_min, x_max, y_min, y_max) = fields.bounds();
    let FieldStore {
        xvel1,
        yvel1,
        density1,
        volume,
        vol_flux_x,
        vol_flux_y,
        mass_flux_x,
        mass_flux_y,
        celldx,
        celldy,
        work,
        ..
    } = fields;
    let WorkArrays {
        post_vol,
        node_flux,
        node_mass_post,
        node_mass_pre,
        mom_flux,
        ..
    } = work;

    let vel1 = match which_vel {
        Axis::I => xvel1,
        Axis::J => yvel1,
    };

    for k in y_min - 2..=y_max + 2 {
        for j in x_min - 2..=x_max + 2 {
            post_vol[(j, k)] = volume[(j, k)]
                + match (sweep, dir) {
                    (1, Axis::I) => vol_flux_y[(j, k + 1)] - vol_flux_y[(j, k)],
                    (1, Axis::J) => vol_flux_x[(j + 1, k)] - vol_flux_x[(j, k)],
                    _ => 0.0,
                };
        }
    }

    let (mass_flux, celld, (a_min, a_max), (b_min, b_max)) = match dir {
        Axis::I => (&*mass_flux_x, &*celldx, (x_min, x_max), (y_min, y_max)),
        Axis::J => (&*mass_flux_y, &*celldy, (y_min, y_max), (x_min, x_max)),
    };

    for b in b_min..=b_max + 1 {
        for a in a_min - 2..=a_max + 2 {
            node_flux[at(dir, a, b)] = 0.25
                * (mass_flux[at(dir, a, b - 1)]
                    + mass_flux[at(dir, a, b)]
                    + mass_flux[at(dir, a + 1, b - 1)]
                    + mass_flux[at(dir, a + 1, b)]);
        }
    }

    for b in b_min..=b_max + 1 {
        for a in a_min - 1..=a_max + 2 {
            let (j, k) = at(dir, a, b);
            node_mass_post[(j, k)] = 0.25
                * (density1[(j, k - 1)] * post_vol[(j, k - 1)]
                    + density1[(j, k)] * post_vol[(j, k)]
                    + density1[(j - 1, k - 1)] * post_vol[(j - 1, k - 1)]
                    + density1[(j - 1, k)] * post_vol[(j - 1, k)]);
            node_mass_pre[(j, k)] = node_mass_post[(j, k)] - node_flux[at(dir, a - 1, b)] + node_flux[(j, k)];
        }
    }

    for b in b_min..=b_max + 1 {
        for a in a_min - 1..=a_max + 1 {
            let node = at(dir, a, b);
            let (upwind, donor, downwind, dif) = if node_flux[node] < 0.0 {
                (a + 2, a + 1, a, a + 1)
            } else {
                (a - 1, a, a + 1, a - 1)
            };

            let sigma = node_flux[node].abs() / node_mass_pre[at(dir, donor, b)];
            let width = celld[a];
            let vdiffuw = vel1[at(dir, donor, b)] - vel1[at(dir, upwind, b)];
            let vdiffdw = vel1[at(dir, downwind, b)] - vel1[at(dir, donor, b)];

            let limiter = if vdiffuw * vdiffdw > 0.0 {
                let auw = vdiffuw.abs();
                let adw = vdiffdw.abs();
                let wind = if vdiffdw <= 0.0 { -1.0 } else { 1.0 };
                wind * (width * ((2.0 - sigma) * adw / width + (1.0 + sigma) * auw / celld[dif]) / 6.0)
                    .min(auw)
                    .min(adw)
            } else {
                0.0
            };

            let advec_vel = vel1[at(dir, donor, b)] + (1.0 - sigma) * limiter;
            mom_flux[node] = advec_vel * node_flux[node];
        }
    }

    for b in b_min..=b_max + 1 {
        for a in a_min..=a_max + 1 {
            let node = at(dir, a, b);
            vel1[node] = (vel1[node] * node_mass_pre[node] + mom_flux[at(dir, a - 1, b)] - mom_flux[node]) / node_mass_post[node];
        }
    }
}

#[cfg(test)]
mod test {

    use super::advec_mom;
    use crate::hydro::advec_cell::advec_cell;
    use crate::hydro::testing::uniform_tile;
    use crate::index_space::Axis;

    #[test]
    fn uniform_velocity_is_unchanged() {
        let mut fields = uniform_tile(1.0, 1.0, 0.25, -0.5);
        fields.vol_flux_x.fill(0.025);
        fields.vol_flux_y.fill(-0.05);
        advec_cell(&mut fields, Axis::I, 1);
        advec_mom(&mut fields, Axis::I, Axis::I, 1);
        advec_mom(&mut fields, Axis::J, Axis::I, 1);
        for (j, k) in [(1, 1), (4, 3), (7, 5)] {
            assert!((fields.xvel1[(j, k)] - 0.25).abs() < 1e-12);
            assert!((fields.yvel1[(j, k)] + 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn momentum_is_carried_downstream() {
        let mut fields = uniform_tile(1.0, 1.0, 0.0, 0.0);
        for k in -1..=7 {
            fields.xvel1[(4, k)] = 1.0;
        }
        fields.vol_flux_x.fill(0.1);
        advec_cell(&mut fields, Axis::I, 2);
        advec_mom(&mut fields, Axis::I, Axis::I, 2);
        assert!(fields.xvel1[(4, 2)] < 1.0);
        assert!(fields.xvel1[(5, 2)] > 0.0);
        assert_eq!(fields.xvel1[(2, 2)], 0.0);
    }
}
