use crate::decompose::{ChunkExtent, Neighbors};
use crate::error::Result;
use crate::field::{FieldId, FieldKind, FieldStore};
use crate::index_space::{Axis, IndexSpace};
use crate::tile::{partition_tiles, split_axis_of};

/// A rectangular piece of a chunk, with its own field data. Tiles are the
/// unit of work the kernels run over.
///
#[derive(Clone, Debug)]
pub struct Tile {
    pub cells: IndexSpace,
    pub neighbors: Neighbors,
    pub fields: FieldStore,
}

/// The part of the mesh owned by one worker: its cells, the chunks across
/// each face, and its tiles ordered along the split axis.
///
#[derive(Clone, Debug)]
pub struct Chunk {
    pub rank: usize,
    pub cells: IndexSpace,
    pub neighbors: Neighbors,
    pub split: Axis,
    pub tiles: Vec<Tile>,
}

impl Chunk {
    /// Partition a chunk into tiles and allocate their field data.
    pub fn new(extent: &ChunkExtent, tiles_per_chunk: usize) -> Result<Self> {
        let tiles = partition_tiles(&extent.cells, tiles_per_chunk)?
            .into_iter()
            .map(|t| Tile {
                fields: FieldStore::allocate(&t.cells),
                cells: t.cells,
                neighbors: t.neighbors,
            })
            .collect();

        Ok(Self {
            rank: extent.rank,
            cells: extent.cells.clone(),
            neighbors: extent.neighbors,
            split: split_axis_of(&extent.cells),
            tiles,
        })
    }

    /// Return the tile holding valid data for a field at the given index.
    /// Indexes inside the chunk belong to the tile whose interior contains
    /// them (the lower tile, for nodes two tiles share); indexes in the
    /// chunk's guard zones belong to the tile on that edge of the chunk.
    pub fn owner(&self, kind: FieldKind, index: (i64, i64)) -> &Tile {
        let c = self.split.component(index);
        let n = self
            .tiles
            .iter()
            .position(|t| c < kind.interior(&t.cells, self.split).end)
            .unwrap_or(self.tiles.len() - 1);
        &self.tiles[n]
    }

    /// Read a field value at a global index from whichever tile owns it.
    pub fn sample(&self, id: FieldId, index: (i64, i64)) -> f64 {
        self.owner(id.kind(), index).fields.field(id)[index]
    }
}

#[cfg(test)]
mod test {

    use super::Chunk;
    use crate::decompose::decompose;
    use crate::field::{FieldId, FieldKind};

    #[test]
    fn owner_lookup_follows_the_tile_slabs() {
        let layout = decompose(12, 4, 1).unwrap();
        let chunk = Chunk::new(&layout.chunks[0], 3).unwrap();
        assert_eq!(chunk.tiles.len(), 3);
        assert!(std::ptr::eq(chunk.owner(FieldKind::Cell, (-1, 2)), &chunk.tiles[0]));
        assert!(std::ptr::eq(chunk.owner(FieldKind::Cell, (5, 2)), &chunk.tiles[1]));
        assert!(std::ptr::eq(chunk.owner(FieldKind::Vertex, (5, 2)), &chunk.tiles[0]));
        assert!(std::ptr::eq(chunk.owner(FieldKind::Cell, (14, 2)), &chunk.tiles[2]));
    }

    #[test]
    fn sampling_reads_from_the_owning_tile() {
        let layout = decompose(12, 4, 1).unwrap();
        let mut chunk = Chunk::new(&layout.chunks[0], 2).unwrap();
        chunk.tiles[1].fields.density0[(9, 3)] = 2.5;
        assert_eq!(chunk.sample(FieldId::Density0, (9, 3)), 2.5);
    }
}
