use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::field::FieldStore;

use super::{G_BIG, G_SMALL};

/// The stability criterion that limited a timestep.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Control {
    Sound,
    XVel,
    YVel,
    Divergence,
}

impl Control {
    pub fn label(self) -> &'static str {
        match self {
            Control::Sound => "sound",
            Control::XVel => "xvel",
            Control::YVel => "yvel",
            Control::Divergence => "div",
        }
    }
}

/// The smallest stable timestep found over some set of cells, with the cell
/// and criterion that produced it.
///
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DtCandidate {
    pub dt: f64,
    pub control: Control,
    pub j: i64,
    pub k: i64,
    pub x: f64,
    pub y: f64,
}

impl DtCandidate {
    /// A candidate that loses against any real one.
    pub fn unbounded() -> Self {
        Self {
            dt: G_BIG,
            control: Control::Sound,
            j: 0,
            k: 0,
            x: 0.0,
            y: 0.0,
        }
    }

    /// The more restrictive of two candidates. On a tie the receiver wins, so
    /// folding in a fixed order gives the same answer everywhere.
    pub fn min(self, other: Self) -> Self {
        if other.dt < self.dt {
            other
        } else {
            self
        }
    }
}

/// Find the smallest stable timestep over a tile's interior cells, taking
/// the minimum of the sound speed, velocity and divergence criteria.
///
pub fn calc_dt(fields: &FieldStore, config: &Config) -> DtCandidate {
    let (x_min, x_max, y_min, y_max) = fields.bounds();
    let FieldStore {
        density0,
        soundspeed,
        viscosity,
        xvel0,
        yvel0,
        xarea,
        yarea,
        volume,
        celldx,
        celldy,
        cellx,
        celly,
        ..
    } = fields;

    let mut best = DtCandidate::unbounded();

    for k in y_min..=y_max {
        for j in x_min..=x_max {
            let dsx = celldx[j];
            let dsy = celldy[k];
            let v = volume[(j, k)];

            let cc = soundspeed[(j, k)] * soundspeed[(j, k)] + 2.0 * viscosity[(j, k)] / density0[(j, k)];
            let cc = cc.sqrt().max(G_SMALL);
            let dtct = config.dtc_safe * dsx.min(dsy) / cc;

            let dv1 = (xvel0[(j, k)] + xvel0[(j, k + 1)]) * xarea[(j, k)];
            let dv2 = (xvel0[(j + 1, k)] + xvel0[(j + 1, k + 1)]) * xarea[(j + 1, k)];
            let mut div = dv2 - dv1;
            let dtut = config.dtu_safe * 2.0 * v / dv1.abs().max(dv2.abs()).max(G_SMALL * v);

            let dv1 = (yvel0[(j, k)] + yvel0[(j + 1, k)]) * yarea[(j, k)];
            let dv2 = (yvel0[(j, k + 1)] + yvel0[(j + 1, k + 1)]) * yarea[(j, k + 1)];
            div += dv2 - dv1;
            let dtvt = config.dtv_safe * 2.0 * v / dv1.abs().max(dv2.abs()).max(G_SMALL * v);

            div /= 2.0 * v;
            let dtdivt = if div < -G_SMALL {
                config.dtdiv_safe * (-1.0 / div)
            } else {
                G_BIG
            };

            let dt = dtct.min(dtut).min(dtvt).min(dtdivt);

            if dt < best.dt {
                let control = if dt == dtct {
                    Control::Sound
                } else if dt == dtut {
                    Control::XVel
                } else if dt == dtvt {
                    Control::YVel
                } else {
                    Control::Divergence
                };
                best = DtCandidate {
                    dt,
                    control,
                    j,
                    k,
                    x: cellx[j],
                    y: celly[k],
                };
            }
        }
    }
    best
}

#[cfg(test)]
mod test {

    use super::{calc_dt, Control, DtCandidate};
    use crate::config::Config;
    use crate::hydro::ideal_gas::ideal_gas;
    use crate::hydro::testing::uniform_tile;

    #[test]
    fn still_gas_is_limited_by_sound_speed() {
        let mut fields = uniform_tile(1.0, 2.5, 0.0, 0.0);
        ideal_gas(&mut fields, false);
        let config = Config::default();
        let candidate = calc_dt(&fields, &config);
        let c = (1.4f64 * 0.4 * 2.5).sqrt();
        assert_eq!(candidate.control, Control::Sound);
        assert!((candidate.dt - 0.7 / c).abs() < 1e-12);
        assert_eq!((candidate.j, candidate.k), (1, 1));
        assert_eq!((candidate.x, candidate.y), (0.5, 0.5));
    }

    #[test]
    fn fast_flow_is_limited_by_velocity() {
        let mut fields = uniform_tile(1.0, 1e-6, 10.0, 0.0);
        ideal_gas(&mut fields, false);
        let candidate = calc_dt(&fields, &Config::default());
        assert_eq!(candidate.control, Control::XVel);
        assert!((candidate.dt - 0.5 * 2.0 / 20.0).abs() < 1e-12);
    }

    #[test]
    fn compression_is_limited_by_divergence() {
        let mut fields = uniform_tile(1.0, 1e-6, 0.0, 0.0);
        ideal_gas(&mut fields, false);
        fields.xvel0.fill(1.0);
        for k in -1..=7 {
            fields.xvel0[(4, k)] = -1.0;
        }
        let candidate = calc_dt(&fields, &Config::default());
        assert_eq!(candidate.control, Control::Divergence);
        assert_eq!((candidate.j, candidate.k), (3, 1));
    }

    #[test]
    fn ties_keep_the_first_candidate() {
        let a = DtCandidate { j: 1, ..DtCandidate::unbounded() };
        let b = DtCandidate { j: 2, ..DtCandidate::unbounded() };
        assert_eq!(a.min(b).j, 1);
        assert_eq!(b.min(a).j, 2);
        let c = DtCandidate { dt: 0.5, ..b };
        assert_eq!(a.min(c).j, 2);
    }
}
