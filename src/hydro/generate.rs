use crate::config::{Geometry, State};
use crate::field::FieldStore;
use crate::grid::Grid;

/// Fill a tile's mesh geometry: vertex and cell coordinates and widths over
/// the guard zones, then cell volumes and face areas.
///
pub fn initialise_chunk(fields: &mut FieldStore, grid: &Grid) {
    let (dx, dy) = grid.cell_spacing();
    let FieldStore {
        cellx,
        celly,
        vertexx,
        vertexy,
        celldx,
        celldy,
        vertexdx,
        vertexdy,
        volume,
        xarea,
        yarea,
        ..
    } = fields;

    for j in vertexx.range() {
        vertexx[j] = grid.xmin + dx * (j - 1) as f64;
        vertexdx[j] = dx;
    }
    for k in vertexy.range() {
        vertexy[k] = grid.ymin + dy * (k - 1) as f64;
        vertexdy[k] = dy;
    }
    for j in cellx.range() {
        cellx[j] = 0.5 * (vertexx[j] + vertexx[j + 1]);
        celldx[j] = dx;
    }
    for k in celly.range() {
        celly[k] = 0.5 * (vertexy[k] + vertexy[k + 1]);
        celldy[k] = dy;
    }

    volume.fill(dx * dy);

    let space = xarea.index_space().clone();
    for (j, k) in space.iter() {
        xarea[(j, k)] = celldy[k];
    }
    let space = yarea.index_space().clone();
    for (j, k) in space.iter() {
        yarea[(j, k)] = celldx[j];
    }
}

/// Lay the initial states onto a tile. The background state fills every
/// cell and node, guard zones included; each later state then overwrites
/// the cells its geometry covers, along with those cells' corner nodes.
///
pub fn generate_chunk(fields: &mut FieldStore, states: &[State]) {
    let (x_min, x_max, y_min, y_max) = fields.bounds();
    let FieldStore {
        density0,
        energy0,
        xvel0,
        yvel0,
        vertexx,
        vertexy,
        cellx,
        celly,
        ..
    } = fields;

    let background = match states.first() {
        Some(state) => state,
        None => return,
    };
    density0.fill(background.density);
    energy0.fill(background.energy);
    xvel0.fill(background.xvel);
    yvel0.fill(background.yvel);

    for state in &states[1..] {
        for k in y_min - 2..=y_max + 2 {
            for j in x_min - 2..=x_max + 2 {
                let covered = match state.geometry {
                    Geometry::Rectangle => {
                        vertexx[j + 1] >= state.xmin
                            && vertexx[j] < state.xmax
                            && vertexy[k + 1] >= state.ymin
                            && vertexy[k] < state.ymax
                    }
                    Geometry::Circle => {
                        let radius = ((cellx[j] - state.xmin).powi(2) + (celly[k] - state.ymin).powi(2)).sqrt();
                        radius <= state.radius
                    }
                    Geometry::Point => vertexx[j] == state.xmin && vertexy[k] == state.ymin,
                };

                if covered {
                    density0[(j, k)] = state.density;
                    energy0[(j, k)] = state.energy;
                    for kt in k..=k + 1 {
                        for jt in j..=j + 1 {
                            xvel0[(jt, kt)] = state.xvel;
                            yvel0[(jt, kt)] = state.yvel;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod test {

    use super::{generate_chunk, initialise_chunk};
    use crate::config::{Geometry, State};
    use crate::field::FieldStore;
    use crate::grid::Grid;
    use crate::index_space::IndexSpace;

    fn tile(cells: IndexSpace) -> FieldStore {
        let grid = Grid::new(0.0, 10.0, 0.0, 10.0, 10, 10).unwrap();
        let mut fields = FieldStore::allocate(&cells);
        initialise_chunk(&mut fields, &grid);
        fields
    }

    #[test]
    fn geometry_follows_global_indexes() {
        let fields = tile(IndexSpace::inclusive(6, 10, 3, 7));
        assert_eq!(fields.vertexx[6], 5.0);
        assert_eq!(fields.vertexx[4], 3.0);
        assert_eq!(fields.vertexx[13], 12.0);
        assert_eq!(fields.cellx[10], 9.5);
        assert_eq!(fields.celly[1], 0.5);
        assert_eq!(fields.volume[(8, 5)], 1.0);
        assert_eq!(fields.xarea[(13, 9)], 1.0);
        assert_eq!(fields.yarea[(12, 10)], 1.0);
    }

    #[test]
    fn later_states_overwrite_earlier_ones() {
        let mut fields = tile(IndexSpace::inclusive(1, 10, 1, 10));
        let states = vec![
            State {
                density: 0.2,
                energy: 1.0,
                ..State::default()
            },
            State {
                density: 1.0,
                energy: 2.5,
                xvel: 0.5,
                geometry: Geometry::Rectangle,
                xmin: 0.0,
                xmax: 5.0,
                ymin: 0.0,
                ymax: 2.0,
                ..State::default()
            },
            State {
                density: 3.0,
                energy: 4.0,
                geometry: Geometry::Rectangle,
                xmin: 4.0,
                xmax: 5.0,
                ymin: 0.0,
                ymax: 10.0,
                ..State::default()
            },
        ];
        generate_chunk(&mut fields, &states);

        assert_eq!(fields.density0[(1, 1)], 1.0);
        assert_eq!(fields.density0[(5, 1)], 3.0);
        assert_eq!(fields.density0[(5, 9)], 3.0);
        assert_eq!(fields.density0[(7, 7)], 0.2);
        assert_eq!(fields.energy0[(3, 2)], 2.5);
        assert_eq!(fields.xvel0[(2, 2)], 0.5);
        assert_eq!(fields.xvel0[(8, 8)], 0.0);
    }

    #[test]
    fn circle_covers_cells_by_center_distance() {
        let mut fields = tile(IndexSpace::inclusive(1, 10, 1, 10));
        let states = vec![
            State::default(),
            State {
                density: 5.0,
                geometry: Geometry::Circle,
                xmin: 5.0,
                ymin: 5.0,
                radius: 1.0,
                ..State::default()
            },
        ];
        generate_chunk(&mut fields, &states);
        assert_eq!(fields.density0[(5, 5)], 5.0);
        assert_eq!(fields.density0[(6, 6)], 5.0);
        assert_eq!(fields.density0[(7, 5)], State::default().density);
    }

    #[test]
    fn point_covers_the_cell_at_its_lower_corner() {
        let mut fields = tile(IndexSpace::inclusive(1, 10, 1, 10));
        let states = vec![
            State::default(),
            State {
                density: 5.0,
                geometry: Geometry::Point,
                xmin: 3.0,
                ymin: 2.0,
                ..State::default()
            },
        ];
        generate_chunk(&mut fields, &states);
        assert_eq!(fields.density0[(4, 3)], 5.0);
        assert_eq!(fields.density0[(3, 3)], State::default().density);
    }
}
