use crate::field::FieldStore;

/// Make the end of step state the start of step state for the next cycle.
pub fn reset_field(fields: &mut FieldStore) {
    let (x_min, x_max, y_min, y_max) = fields.bounds();
    let FieldStore {
        density0,
        density1,
        energy0,
        energy1,
        xvel0,
        xvel1,
        yvel0,
        yvel1,
        ..
    } = fields;

    for k in y_min..=y_max {
        for j in x_min..=x_max {
            density0[(j, k)] = density1[(j, k)];
            energy0[(j, k)] = energy1[(j, k)];
        }
    }

    for k in y_min..=y_max + 1 {
        for j in x_min..=x_max + 1 {
            xvel0[(j, k)] = xvel1[(j, k)];
            yvel0[(j, k)] = yvel1[(j, k)];
        }
    }
}

/// Discard the predicted density and energy, restoring the start of step
/// values.
pub fn revert(fields: &mut FieldStore) {
    let (x_min, x_max, y_min, y_max) = fields.bounds();
    let FieldStore {
        density0,
        density1,
        energy0,
        energy1,
        ..
    } = fields;

    for k in y_min..=y_max {
        for j in x_min..=x_max {
            density1[(j, k)] = density0[(j, k)];
            energy1[(j, k)] = energy0[(j, k)];
        }
    }
}

#[cfg(test)]
mod test {

    use super::{reset_field, revert};
    use crate::hydro::testing::uniform_tile;

    #[test]
    fn reset_copies_interior_only() {
        let mut fields = uniform_tile(1.0, 1.0, 0.0, 0.0);
        fields.density1.fill(3.0);
        fields.xvel1.fill(2.0);
        reset_field(&mut fields);
        assert_eq!(fields.density0[(1, 1)], 3.0);
        assert_eq!(fields.density0[(6, 4)], 3.0);
        assert_eq!(fields.density0[(0, 1)], 1.0);
        assert_eq!(fields.density0[(7, 4)], 1.0);
        assert_eq!(fields.xvel0[(7, 5)], 2.0);
        assert_eq!(fields.xvel0[(8, 5)], 0.0);
    }

    #[test]
    fn revert_restores_start_of_step() {
        let mut fields = uniform_tile(1.5, 2.0, 0.0, 0.0);
        fields.density1.fill(9.0);
        fields.energy1.fill(9.0);
        revert(&mut fields);
        assert_eq!(fields.density1[(3, 3)], 1.5);
        assert_eq!(fields.energy1[(3, 3)], 2.0);
        assert_eq!(fields.energy1[(-1, 3)], 9.0);
    }
}
