use crate::field::FieldStore;

/// Ratio of specific heats.
pub const GAMMA: f64 = 1.4;

/// Compute pressure and sound speed from density and specific internal
/// energy with an ideal gas equation of state. When `predict` is set, the
/// time-advanced density and energy are used.
///
pub fn ideal_gas(fields: &mut FieldStore, predict: bool) {
    let (x_min, x_max, y_min, y_max) = fields.bounds();
    let FieldStore {
        density0,
        density1,
        energy0,
        energy1,
        pressure,
        soundspeed,
        ..
    } = fields;

    let (density, energy) = if predict {
        (&*density1, &*energy1)
    } else {
        (&*density0, &*energy0)
    };

    for k in y_min..=y_max {
        for j in x_min..=x_max {
            let d = density[(j, k)];
            let v = 1.0 / d;
            let p = (GAMMA - 1.0) * d * energy[(j, k)];
            let pressurebyenergy = (GAMMA - 1.0) * d;
            let pressurebyvolume = -d * p;
            let sound_speed_squared = v * v * (p * pressurebyenergy - pressurebyvolume);

            pressure[(j, k)] = p;
            soundspeed[(j, k)] = sound_speed_squared.sqrt();
        }
    }
}

#[cfg(test)]
mod test {

    use super::ideal_gas;
    use crate::hydro::testing::uniform_tile;

    #[test]
    fn pressure_and_sound_speed_follow_the_gamma_law() {
        let mut fields = uniform_tile(2.0, 2.5, 0.0, 0.0);
        ideal_gas(&mut fields, false);
        assert!((fields.pressure[(3, 2)] - 2.0).abs() < 1e-14);
        let c2: f64 = 1.4 * 2.0 / 2.0;
        assert!((fields.soundspeed[(6, 4)] - c2.sqrt()).abs() < 1e-14);
        assert_eq!(fields.pressure[(0, 0)], 0.0);
    }

    #[test]
    fn predicted_state_uses_advanced_fields() {
        let mut fields = uniform_tile(1.0, 1.0, 0.0, 0.0);
        fields.density1[(2, 2)] = 4.0;
        ideal_gas(&mut fields, true);
        assert!((fields.pressure[(2, 2)] - 1.6).abs() < 1e-14);
        ideal_gas(&mut fields, false);
        assert!((fields.pressure[(2, 2)] - 0.4).abs() < 1e-14);
    }
}
