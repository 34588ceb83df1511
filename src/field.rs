use serde::{Deserialize, Serialize};
use crate::index_space::{Axis, IndexSpace};
use crate::patch::{Line, Patch};

/// Number of guard zones kept on every side of a tile.
pub const NUM_GUARD: i64 = 2;

/// Where on the mesh a field's values live. Cell fields sit at cell centers;
/// vertex fields at cell corners, so they carry one extra index on each axis;
/// face fields sit on the faces normal to one axis and carry the extra index
/// only along that axis.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    Cell,
    Vertex,
    XFace,
    YFace,
}

impl FieldKind {
    /// Whether the field's indexes along the given axis are node (rather
    /// than cell) positions.
    pub fn staggered(self, axis: Axis) -> bool {
        match (self, axis) {
            (FieldKind::Cell, _) => false,
            (FieldKind::Vertex, _) => true,
            (FieldKind::XFace, Axis::I) => true,
            (FieldKind::XFace, Axis::J) => false,
            (FieldKind::YFace, Axis::I) => false,
            (FieldKind::YFace, Axis::J) => true,
        }
    }

    /// Return the indexes along one axis owned by a region with the given
    /// cells. Staggered fields own one more index than there are cells.
    pub fn interior(self, cells: &IndexSpace, axis: Axis) -> std::ops::Range<i64> {
        let range = cells.range(axis);
        if self.staggered(axis) {
            range.start .. range.end + 1
        } else {
            range
        }
    }

    /// Return the index space of this field over the given cells, without
    /// guard zones.
    pub fn interior_space(self, cells: &IndexSpace) -> IndexSpace {
        IndexSpace::new(self.interior(cells, Axis::I), self.interior(cells, Axis::J))
    }

    /// Return the index space allocated for this field over the given cells,
    /// guard zones included.
    pub fn allocated_space(self, cells: &IndexSpace) -> IndexSpace {
        self.interior_space(cells).extend_all(NUM_GUARD)
    }
}

/// The fields that take part in halo exchanges.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldId {
    Density0,
    Density1,
    Energy0,
    Energy1,
    Pressure,
    Viscosity,
    Soundspeed,
    XVel0,
    XVel1,
    YVel0,
    YVel1,
    VolFluxX,
    VolFluxY,
    MassFluxX,
    MassFluxY,
}

impl FieldId {
    pub const ALL: [FieldId; 15] = [
        FieldId::Density0,
        FieldId::Density1,
        FieldId::Energy0,
        FieldId::Energy1,
        FieldId::Pressure,
        FieldId::Viscosity,
        FieldId::Soundspeed,
        FieldId::XVel0,
        FieldId::XVel1,
        FieldId::YVel0,
        FieldId::YVel1,
        FieldId::VolFluxX,
        FieldId::VolFluxY,
        FieldId::MassFluxX,
        FieldId::MassFluxY,
    ];

    pub fn kind(self) -> FieldKind {
        use FieldId::*;

        match self {
            Density0 | Density1 | Energy0 | Energy1 | Pressure | Viscosity | Soundspeed => FieldKind::Cell,
            XVel0 | XVel1 | YVel0 | YVel1 => FieldKind::Vertex,
            VolFluxX | MassFluxX => FieldKind::XFace,
            VolFluxY | MassFluxY => FieldKind::YFace,
        }
    }

    /// The axis along which this field is a vector component, if it is one.
    /// Reflecting boundaries flip the sign of a field across faces normal to
    /// this axis.
    pub fn normal_axis(self) -> Option<Axis> {
        use FieldId::*;

        match self {
            XVel0 | XVel1 | VolFluxX | MassFluxX => Some(Axis::I),
            YVel0 | YVel1 | VolFluxY | MassFluxY => Some(Axis::J),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        use FieldId::*;

        match self {
            Density0 => "density0",
            Density1 => "density1",
            Energy0 => "energy0",
            Energy1 => "energy1",
            Pressure => "pressure",
            Viscosity => "viscosity",
            Soundspeed => "soundspeed",
            XVel0 => "xvel0",
            XVel1 => "xvel1",
            YVel0 => "yvel0",
            YVel1 => "yvel1",
            VolFluxX => "vol_flux_x",
            VolFluxY => "vol_flux_y",
            MassFluxX => "mass_flux_x",
            MassFluxY => "mass_flux_y",
        }
    }

    fn bit(self) -> u32 {
        1 << self as u32
    }
}

/// A set of field ids, used to select which fields a halo exchange refreshes.
///
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FieldSet(u32);

impl FieldSet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        FieldId::ALL.iter().copied().collect()
    }

    pub fn with(self, id: FieldId) -> Self {
        Self(self.0 | id.bit())
    }

    pub fn contains(&self, id: FieldId) -> bool {
        self.0 & id.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = FieldId> + '_ {
        FieldId::ALL.iter().copied().filter(move |&id| self.contains(id))
    }
}

impl std::iter::FromIterator<FieldId> for FieldSet {
    fn from_iter<I: IntoIterator<Item = FieldId>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

impl<const N: usize> From<[FieldId; N]> for FieldSet {
    fn from(ids: [FieldId; N]) -> Self {
        ids.into_iter().collect()
    }
}

/// Scratch arrays used by the advection kernels. They are sized like vertex
/// fields, which covers every index the kernels touch.
///
#[derive(Clone, Debug)]
pub struct WorkArrays {
    pub pre_vol: Patch,
    pub post_vol: Patch,
    pub ener_flux: Patch,
    pub node_flux: Patch,
    pub node_mass_post: Patch,
    pub node_mass_pre: Patch,
    pub mom_flux: Patch,
}

/// All the field data owned by one tile. Every array covers the tile's cells
/// plus `NUM_GUARD` guard zones on each side, in global indexes, and starts
/// out zeroed.
///
#[derive(Clone, Debug)]
pub struct FieldStore {
    cells: IndexSpace,

    pub density0: Patch,
    pub density1: Patch,
    pub energy0: Patch,
    pub energy1: Patch,
    pub pressure: Patch,
    pub viscosity: Patch,
    pub soundspeed: Patch,
    pub xvel0: Patch,
    pub xvel1: Patch,
    pub yvel0: Patch,
    pub yvel1: Patch,
    pub vol_flux_x: Patch,
    pub vol_flux_y: Patch,
    pub mass_flux_x: Patch,
    pub mass_flux_y: Patch,
    pub volume: Patch,
    pub xarea: Patch,
    pub yarea: Patch,
    pub work: WorkArrays,

    pub cellx: Line,
    pub celly: Line,
    pub vertexx: Line,
    pub vertexy: Line,
    pub celldx: Line,
    pub celldy: Line,
    pub vertexdx: Line,
    pub vertexdy: Line,
}

impl FieldStore {
    /// Allocate every array for a tile with the given cells.
    pub fn allocate(cells: &IndexSpace) -> Self {
        let cell = || Patch::zeros(FieldKind::Cell.allocated_space(cells));
        let vertex = || Patch::zeros(FieldKind::Vertex.allocated_space(cells));
        let xface = || Patch::zeros(FieldKind::XFace.allocated_space(cells));
        let yface = || Patch::zeros(FieldKind::YFace.allocated_space(cells));
        let cell_line = |axis| Line::zeros(FieldKind::Cell.allocated_space(cells).range(axis));
        let vertex_line = |axis| Line::zeros(FieldKind::Vertex.allocated_space(cells).range(axis));

        Self {
            cells: cells.clone(),
            density0: cell(),
            density1: cell(),
            energy0: cell(),
            energy1: cell(),
            pressure: cell(),
            viscosity: cell(),
            soundspeed: cell(),
            xvel0: vertex(),
            xvel1: vertex(),
            yvel0: vertex(),
            yvel1: vertex(),
            vol_flux_x: xface(),
            vol_flux_y: yface(),
            mass_flux_x: xface(),
            mass_flux_y: yface(),
            volume: cell(),
            xarea: xface(),
            yarea: yface(),
            work: WorkArrays {
                pre_vol: vertex(),
                post_vol: vertex(),
                ener_flux: vertex(),
                node_flux: vertex(),
                node_mass_post: vertex(),
                node_mass_pre: vertex(),
                mom_flux: vertex(),
            },
            cellx: cell_line(Axis::I),
            celly: cell_line(Axis::J),
            vertexx: vertex_line(Axis::I),
            vertexy: vertex_line(Axis::J),
            celldx: cell_line(Axis::I),
            celldy: cell_line(Axis::J),
            vertexdx: vertex_line(Axis::I),
            vertexdy: vertex_line(Axis::J),
        }
    }

    /// The cells this store was allocated for (guard zones excluded).
    pub fn cells(&self) -> &IndexSpace {
        &self.cells
    }

    /// Inclusive cell bounds `(x_min, x_max, y_min, y_max)`, the form the
    /// kernels loop over.
    pub fn bounds(&self) -> (i64, i64, i64, i64) {
        let (x_min, y_min) = self.cells.start();
        let (x_max, y_max) = self.cells.last();
        (x_min, x_max, y_min, y_max)
    }

    pub fn field(&self, id: FieldId) -> &Patch {
        use FieldId::*;

        match id {
            Density0 => &self.density0,
            Density1 => &self.density1,
            Energy0 => &self.energy0,
            Energy1 => &self.energy1,
            Pressure => &self.pressure,
            Viscosity => &self.viscosity,
            Soundspeed => &self.soundspeed,
            XVel0 => &self.xvel0,
            XVel1 => &self.xvel1,
            YVel0 => &self.yvel0,
            YVel1 => &self.yvel1,
            VolFluxX => &self.vol_flux_x,
            VolFluxY => &self.vol_flux_y,
            MassFluxX => &self.mass_flux_x,
            MassFluxY => &self.mass_flux_y,
        }
    }

    pub fn field_mut(&mut self, id: FieldId) -> &mut Patch {
        use FieldId::*;

        match id {
            Density0 => &mut self.density0,
            Density1 => &mut self.density1,
            Energy0 => &mut self.energy0,
            Energy1 => &mut self.energy1,
            Pressure => &mut self.pressure,
            Viscosity => &mut self.viscosity,
            Soundspeed => &mut self.soundspeed,
            XVel0 => &mut self.xvel0,
            XVel1 => &mut self.xvel1,
            YVel0 => &mut self.yvel0,
            YVel1 => &mut self.yvel1,
            VolFluxX => &mut self.vol_flux_x,
            VolFluxY => &mut self.vol_flux_y,
            MassFluxX => &mut self.mass_flux_x,
            MassFluxY => &mut self.mass_flux_y,
        }
    }
}

#[cfg(test)]
mod test {

    use super::{FieldId, FieldKind, FieldSet, FieldStore};
    use crate::index_space::{range2d, Axis, IndexSpace};

    #[test]
    fn arrays_are_zeroed_including_guard_zones() {
        let store = FieldStore::allocate(&IndexSpace::inclusive(1, 4, 3, 5));
        for id in FieldId::ALL {
            let patch = store.field(id);
            assert!(patch.data().iter().all(|&x| x == 0.0), "{} not zeroed", id.name());
            assert_eq!(patch[patch.index_space().start()], 0.0);
        }
        assert!(store.work.node_flux.data().iter().all(|&x| x == 0.0));
        assert_eq!(store.vertexx[-1], 0.0);
    }

    #[test]
    fn guard_extents_depend_on_the_field_kind() {
        let cells = IndexSpace::inclusive(1, 4, 3, 5);
        let store = FieldStore::allocate(&cells);
        assert_eq!(*store.density0.index_space(), range2d(-1..7, 1..8));
        assert_eq!(*store.xvel0.index_space(), range2d(-1..8, 1..9));
        assert_eq!(*store.vol_flux_x.index_space(), range2d(-1..8, 1..8));
        assert_eq!(*store.mass_flux_y.index_space(), range2d(-1..7, 1..9));
        assert_eq!(store.vertexx.range(), -1..8);
        assert_eq!(store.celly.range(), 1..8);
        assert_eq!(store.bounds(), (1, 4, 3, 5));
    }

    #[test]
    fn field_ids_address_the_matching_arrays() {
        let mut store = FieldStore::allocate(&IndexSpace::inclusive(1, 2, 1, 2));
        store.field_mut(FieldId::MassFluxX)[(3, 1)] = 7.0;
        assert_eq!(store.mass_flux_x[(3, 1)], 7.0);
        assert_eq!(FieldId::XVel1.kind(), FieldKind::Vertex);
        assert!(FieldKind::YFace.staggered(Axis::J));
        assert!(!FieldKind::YFace.staggered(Axis::I));
    }

    #[test]
    fn field_sets_hold_exactly_their_members() {
        let set = FieldSet::from([FieldId::Pressure, FieldId::YVel0]);
        assert!(set.contains(FieldId::Pressure));
        assert!(!set.contains(FieldId::Density0));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![FieldId::Pressure, FieldId::YVel0]);
        assert_eq!(FieldSet::all().iter().count(), 15);
        assert!(FieldSet::empty().is_empty());
    }
}
