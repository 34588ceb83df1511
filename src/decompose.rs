//! Splits the global mesh into one rectangular chunk per worker.
//!
//! The chunk grid is chosen so that chunks are as close to the aspect ratio
//! of the mesh as the worker count allows. Cells that don't divide evenly are
//! handed out one apiece to the first chunks along each axis.

use std::ops::{Index, IndexMut};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::index_space::{Axis, IndexSpace};

/// One of the four sides of a rectangular chunk or tile.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Face {
    Left,
    Right,
    Bottom,
    Top,
}

impl Face {
    pub const ALL: [Face; 4] = [Face::Left, Face::Right, Face::Bottom, Face::Top];

    /// The two faces normal to the given axis, lower one first.
    pub fn on_axis(axis: Axis) -> [Face; 2] {
        match axis {
            Axis::I => [Face::Left, Face::Right],
            Axis::J => [Face::Bottom, Face::Top],
        }
    }

    pub fn axis(self) -> Axis {
        match self {
            Face::Left | Face::Right => Axis::I,
            Face::Bottom | Face::Top => Axis::J,
        }
    }

    pub fn is_lower(self) -> bool {
        matches!(self, Face::Left | Face::Bottom)
    }

    pub fn opposite(self) -> Face {
        match self {
            Face::Left => Face::Right,
            Face::Right => Face::Left,
            Face::Bottom => Face::Top,
            Face::Top => Face::Bottom,
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// What lies across a face: another chunk (or tile), identified by its
/// 0-based id, or the edge of the domain.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Neighbor {
    Id(usize),
    Boundary,
}

impl Neighbor {
    pub fn id(self) -> Option<usize> {
        match self {
            Neighbor::Id(id) => Some(id),
            Neighbor::Boundary => None,
        }
    }

    pub fn is_boundary(self) -> bool {
        self == Neighbor::Boundary
    }
}

/// The neighbors across each of the four faces.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighbors([Neighbor; 4]);

impl Neighbors {
    pub fn boundary() -> Self {
        Self([Neighbor::Boundary; 4])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Face, Neighbor)> + '_ {
        Face::ALL.iter().map(move |&face| (face, self[face]))
    }
}

impl Index<Face> for Neighbors {
    type Output = Neighbor;

    fn index(&self, face: Face) -> &Neighbor {
        &self.0[face.slot()]
    }
}

impl IndexMut<Face> for Neighbors {
    fn index_mut(&mut self, face: Face) -> &mut Neighbor {
        &mut self.0[face.slot()]
    }
}

/// The cells and neighbors of one worker's chunk.
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChunkExtent {
    pub rank: usize,
    pub cells: IndexSpace,
    pub neighbors: Neighbors,
}

/// The result of a decomposition: the shape of the chunk grid, and the chunks
/// ordered by rank (x varies fastest).
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChunkLayout {
    pub chunks_x: usize,
    pub chunks_y: usize,
    pub chunks: Vec<ChunkExtent>,
}

/// Decompose an `x_cells` by `y_cells` mesh into `worker_count` chunks.
///
pub fn decompose(x_cells: i64, y_cells: i64, worker_count: usize) -> Result<ChunkLayout> {
    if worker_count == 0 {
        return Err(Error::InvalidConfiguration("worker count must be positive".into()));
    }
    if x_cells < 1 || y_cells < 1 {
        return Err(Error::InvalidConfiguration(format!(
            "cannot decompose a {} x {} mesh",
            x_cells, y_cells
        )));
    }

    let (chunks_x, chunks_y) = chunk_grid_shape(x_cells, y_cells, worker_count);

    if x_cells < chunks_x as i64 || y_cells < chunks_y as i64 {
        return Err(Error::InvalidConfiguration(format!(
            "{} x {} chunks do not fit on a {} x {} mesh",
            chunks_x, chunks_y, x_cells, y_cells
        )));
    }

    let xs = split_axis(x_cells, chunks_x);
    let ys = split_axis(y_cells, chunks_y);
    let mut chunks = Vec::with_capacity(worker_count);

    for (cy, (bottom, top)) in ys.iter().enumerate() {
        for (cx, (left, right)) in xs.iter().enumerate() {
            let rank = cy * chunks_x + cx;
            let mut neighbors = Neighbors::boundary();

            if cx > 0 {
                neighbors[Face::Left] = Neighbor::Id(rank - 1)
            }
            if cx + 1 < chunks_x {
                neighbors[Face::Right] = Neighbor::Id(rank + 1)
            }
            if cy > 0 {
                neighbors[Face::Bottom] = Neighbor::Id(rank - chunks_x)
            }
            if cy + 1 < chunks_y {
                neighbors[Face::Top] = Neighbor::Id(rank + chunks_x)
            }
            chunks.push(ChunkExtent {
                rank,
                cells: IndexSpace::inclusive(*left, *right, *bottom, *top),
                neighbors,
            });
        }
    }
    debug!(
        "decomposed {} x {} cells into {} x {} chunks",
        x_cells, y_cells, chunks_x, chunks_y
    );

    Ok(ChunkLayout {
        chunks_x,
        chunks_y,
        chunks,
    })
}

/// Pick the number of chunks along each axis. Divisors `c` of the worker
/// count are tried in increasing order as the chunk count along y; the first
/// whose x/y factor ratio does not exceed the mesh ratio is taken. When no
/// such divisor exists, or it would put every chunk along y, the chunks are
/// laid out in a single row or column along the longer mesh axis.
///
fn chunk_grid_shape(x_cells: i64, y_cells: i64, worker_count: usize) -> (usize, usize) {
    let mesh_ratio = x_cells as f64 / y_cells as f64;
    let split = (1..=worker_count)
        .filter(|c| worker_count % c == 0)
        .find(|&c| (worker_count as f64 / c as f64) / c as f64 <= mesh_ratio);

    match split {
        Some(c) if c != worker_count => (worker_count / c, c),
        _ if mesh_ratio >= 1.0 => (worker_count, 1),
        _ => (1, worker_count),
    }
}

/// Split `cells` (numbered from 1) into `chunks` contiguous inclusive ranges,
/// giving the remainder to the first ranges.
///
pub(crate) fn split_axis(cells: i64, chunks: usize) -> Vec<(i64, i64)> {
    let chunks = chunks as i64;
    let delta = cells / chunks;
    let rem = cells % chunks;
    let mut lower = 1;

    (0..chunks)
        .map(|c| {
            let width = delta + if c < rem { 1 } else { 0 };
            let range = (lower, lower + width - 1);
            lower += width;
            range
        })
        .collect()
}
