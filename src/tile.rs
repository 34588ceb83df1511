use crate::decompose::{split_axis, Face, Neighbor, Neighbors};
use crate::error::{Error, Result};
use crate::index_space::{Axis, IndexSpace};

/// The cells and neighbors of one tile, in the same global index space as the
/// chunk it belongs to. Neighbor ids are tile indexes within the chunk;
/// faces on the chunk's edge are `Neighbor::Boundary`.
///
#[derive(Clone, Debug, PartialEq)]
pub struct TileExtent {
    pub cells: IndexSpace,
    pub neighbors: Neighbors,
}

/// Return the axis a chunk with the given cells is split along: the longer
/// one, or x when they are equal.
///
pub fn split_axis_of(cells: &IndexSpace) -> Axis {
    let (ni, nj) = cells.dim();
    if nj > ni {
        Axis::J
    } else {
        Axis::I
    }
}

/// Split a chunk's cells into `tiles_per_chunk` contiguous slabs along its
/// longer axis. Slab widths differ by at most one cell, wider slabs first.
///
pub fn partition_tiles(cells: &IndexSpace, tiles_per_chunk: usize) -> Result<Vec<TileExtent>> {
    let axis = split_axis_of(cells);
    let range = cells.range(axis);
    let length = range.end - range.start;

    if tiles_per_chunk == 0 {
        return Err(Error::InvalidConfiguration("tiles per chunk must be positive".into()));
    }
    if tiles_per_chunk as i64 > length {
        return Err(Error::InvalidConfiguration(format!(
            "{} tiles do not fit in a chunk {} cells wide",
            tiles_per_chunk, length
        )));
    }

    let [lower, upper] = Face::on_axis(axis);
    let tiles = split_axis(length, tiles_per_chunk)
        .into_iter()
        .enumerate()
        .map(|(n, (a, b))| {
            let offset = range.start - 1;
            let mut neighbors = Neighbors::boundary();

            if n > 0 {
                neighbors[lower] = Neighbor::Id(n - 1)
            }
            if n + 1 < tiles_per_chunk {
                neighbors[upper] = Neighbor::Id(n + 1)
            }
            TileExtent {
                cells: cells.with_range(axis, a + offset .. b + offset + 1),
                neighbors,
            }
        })
        .collect();

    Ok(tiles)
}

#[cfg(test)]
mod test {

    use super::partition_tiles;
    use crate::decompose::{Face, Neighbor};
    use crate::index_space::{range2d, IndexSpace};

    #[test]
    fn tiles_cover_the_chunk_exactly_once() {
        let chunk = IndexSpace::inclusive(11, 30, 5, 12);
        for n in 1..=20 {
            let tiles = partition_tiles(&chunk, n).unwrap();
            assert_eq!(tiles.len(), n);
            let mut covered = 0;
            for index in chunk.iter() {
                let owners = tiles.iter().filter(|t| t.cells.contains(index)).count();
                assert_eq!(owners, 1);
                covered += 1;
            }
            assert_eq!(covered, tiles.iter().map(|t| t.cells.len()).sum::<usize>());
        }
    }

    #[test]
    fn tall_chunks_are_split_along_y() {
        let tiles = partition_tiles(&range2d(1..3, 1..11), 3).unwrap();
        assert_eq!(tiles[0].cells, range2d(1..3, 1..5));
        assert_eq!(tiles[1].cells, range2d(1..3, 5..8));
        assert_eq!(tiles[2].cells, range2d(1..3, 8..11));
        assert_eq!(tiles[1].neighbors[Face::Bottom], Neighbor::Id(0));
        assert_eq!(tiles[1].neighbors[Face::Top], Neighbor::Id(2));
        assert_eq!(tiles[1].neighbors[Face::Left], Neighbor::Boundary);
    }

    #[test]
    fn too_many_tiles_is_an_error() {
        assert!(partition_tiles(&range2d(1..5, 1..3), 5).is_err());
        assert!(partition_tiles(&range2d(1..5, 1..3), 0).is_err());
    }
}
