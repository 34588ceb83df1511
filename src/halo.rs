//! Fills the guard zones of every tile in a chunk.
//!
//! An exchange is done in two sweeps, first along x and then along y. The x
//! sweep fills guard columns beside each tile's interior rows. The y sweep
//! fills guard rows across the full width of the tile, x guard columns
//! included, so the corners end up consistent with what the x sweep put
//! there.
//!
//! Each guard zone is filled from one of three places: another tile in the
//! same chunk, a strip of data sent by the neighboring chunk, or, on the
//! edge of the domain, the tile's own interior reflected about the boundary.

use std::collections::HashMap;
use std::ops::Range;
use std::time::Instant;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::chunk::{Chunk, Tile};
use crate::decompose::{Face, Neighbor};
use crate::error::{Error, Result};
use crate::field::{FieldId, FieldSet, NUM_GUARD};
use crate::index_space::{Axis, IndexSpace};
use crate::message::Communicator;
use crate::patch::Patch;
use crate::profiler::{Phase, Profiler};

/// The data one chunk sends across a face: for each requested field, the
/// values that fill the receiver's guard zones on that face. The face is the
/// receiver's.
///
#[derive(Serialize, Deserialize)]
struct HaloMessage {
    face: Face,
    strips: Vec<(FieldId, Patch)>,
}

type Strips = HashMap<FieldId, Patch>;

/// Refresh the outer `depth` guard layers of the given fields, on every tile
/// of the chunk. Interior values are never written. Every worker must call
/// this the same number of times, since each call advances the
/// communicator's epoch.
///
pub fn update_halo<C: Communicator>(
    chunk: &mut Chunk,
    comm: &C,
    fields: FieldSet,
    depth: i64,
    profiler: &mut Profiler,
) -> Result<()> {
    if !(1..=NUM_GUARD).contains(&depth) {
        return Err(Error::InvalidConfiguration(format!(
            "halo depth must be between 1 and {}, got {}",
            NUM_GUARD, depth
        )));
    }

    for axis in [Axis::I, Axis::J] {
        let start = Instant::now();
        let strips = exchange_strips(chunk, comm, fields, depth, axis);
        profiler.add(Phase::MpiHaloExchange, start.elapsed());

        let bands = gather_bands(chunk, &strips?, fields, depth, axis, profiler)?;

        for (tile, bands) in chunk.tiles.iter_mut().zip(bands) {
            for (id, band) in bands {
                tile.fields.field_mut(id).copy_from(&band)
            }
        }
        comm.increment();
    }
    Ok(())
}

/// Send this chunk's boundary strips to the neighbors along one axis, and
/// receive theirs. Returns the received strips indexed by lower / upper
/// face.
///
fn exchange_strips<C: Communicator>(
    chunk: &Chunk,
    comm: &C,
    fields: FieldSet,
    depth: i64,
    axis: Axis,
) -> Result<[Option<Strips>; 2]> {
    let mut expected = 0;

    for face in Face::on_axis(axis) {
        if let Neighbor::Id(peer) = chunk.neighbors[face] {
            let strips = fields
                .iter()
                .map(|id| {
                    let space = outgoing_strip(&chunk.cells, id, face, depth, axis);
                    (id, Patch::from_function(space, |index| chunk.sample(id, index)))
                })
                .collect();
            let message = HaloMessage {
                face: face.opposite(),
                strips,
            };
            comm.send(peer, rmp_serde::to_vec(&message)?)?;
            expected += 1;
        }
    }

    let mut received = [None, None];

    for _ in 0..expected {
        let message: HaloMessage = rmp_serde::from_slice(&comm.recv()?)?;
        let slot = if message.face.is_lower() { 0 } else { 1 };

        if message.face.axis() != axis || chunk.neighbors[message.face].is_boundary() {
            return Err(Error::Transport(format!(
                "chunk {} received a halo strip for its {:?} face during the {:?} sweep",
                chunk.rank, message.face, axis
            )));
        }
        received[slot] = Some(message.strips.into_iter().collect());
    }
    if expected > 0 {
        debug!("chunk {} exchanged {} strip(s) along {:?}", chunk.rank, expected, axis);
    }
    Ok(received)
}

/// Build the new guard-zone values of every tile, without writing any of
/// them, so that tiles can read from one another freely.
///
fn gather_bands(
    chunk: &Chunk,
    strips: &[Option<Strips>; 2],
    fields: FieldSet,
    depth: i64,
    axis: Axis,
    profiler: &mut Profiler,
) -> Result<Vec<Vec<(FieldId, Patch)>>> {
    let mut result = Vec::with_capacity(chunk.tiles.len());

    for tile in &chunk.tiles {
        let mut bands = Vec::new();

        for (slot, face) in Face::on_axis(axis).into_iter().enumerate() {
            let start = Instant::now();

            let phase = match (tile.neighbors[face], chunk.neighbors[face]) {
                (Neighbor::Id(_), _) => {
                    for id in fields.iter() {
                        let space = tile_band(tile, id, face, depth, axis);
                        let mut band = Patch::zeros(space.clone());
                        for index in space.iter() {
                            band[index] = chunk_value(chunk, strips, id, axis, index)?
                        }
                        bands.push((id, band))
                    }
                    Phase::TileHaloExchange
                }
                (Neighbor::Boundary, Neighbor::Id(peer)) => {
                    for id in fields.iter() {
                        let strip = strips[slot].as_ref().and_then(|s| s.get(&id)).ok_or_else(|| {
                            Error::Transport(format!("no {} strip from chunk {}", id.name(), peer))
                        })?;
                        bands.push((id, strip.extract(&tile_band(tile, id, face, depth, axis))))
                    }
                    Phase::MpiHaloExchange
                }
                (Neighbor::Boundary, Neighbor::Boundary) => {
                    for id in fields.iter() {
                        let space = tile_band(tile, id, face, depth, axis);
                        bands.push((id, Patch::from_function(space, |index| reflect(chunk, id, face, index))))
                    }
                    Phase::SelfHaloExchange
                }
            };
            profiler.add(phase, start.elapsed());
        }
        result.push(bands);
    }
    Ok(result)
}

/// Return the value a field will hold at an index once this sweep is done.
/// Indexes inside the chunk along the sweep axis are read from the tile that
/// owns them. Indexes beyond the chunk's edge, which a narrow tile's guard
/// zone can reach, come from the neighbor's strip or the reflection that
/// fills the edge tile's guard zone in the same sweep.
///
fn chunk_value(chunk: &Chunk, strips: &[Option<Strips>; 2], id: FieldId, axis: Axis, index: (i64, i64)) -> Result<f64> {
    let interior = id.kind().interior(&chunk.cells, axis);
    let c = axis.component(index);
    let [lower, upper] = Face::on_axis(axis);

    let (slot, face) = if c < interior.start {
        (0, lower)
    } else if c >= interior.end {
        (1, upper)
    } else {
        return Ok(chunk.sample(id, index));
    };

    match chunk.neighbors[face] {
        Neighbor::Id(peer) => strips[slot]
            .as_ref()
            .and_then(|s| s.get(&id))
            .map(|strip| strip[index])
            .ok_or_else(|| Error::Transport(format!("no {} strip from chunk {}", id.name(), peer))),
        Neighbor::Boundary => Ok(reflect(chunk, id, face, index)),
    }
}

/// Return the guard indexes beyond a face, along the face's axis, for a
/// region with the given cells.
///
fn guard_range(cells: &IndexSpace, id: FieldId, face: Face, depth: i64) -> Range<i64> {
    let interior = id.kind().interior(cells, face.axis());

    if face.is_lower() {
        interior.start - depth .. interior.start
    } else {
        interior.end .. interior.end + depth
    }
}

/// Return the range covered across the sweep axis. The x sweep only covers
/// interior rows; the y sweep also covers the x guard columns.
///
fn across_range(cells: &IndexSpace, id: FieldId, depth: i64, axis: Axis) -> Range<i64> {
    let across = id.kind().interior(cells, axis.other());

    match axis {
        Axis::I => across,
        Axis::J => across.start - depth .. across.end + depth,
    }
}

fn tile_band(tile: &Tile, id: FieldId, face: Face, depth: i64, axis: Axis) -> IndexSpace {
    let along = guard_range(&tile.cells, id, face, depth);
    let across = across_range(&tile.cells, id, depth, axis);
    tile.cells.with_range(axis.other(), across).with_range(axis, along)
}

/// Return the indexes this chunk sends across one of its faces: the guard
/// zones of the neighbor on the other side, which lie in this chunk's
/// interior.
///
fn outgoing_strip(cells: &IndexSpace, id: FieldId, face: Face, depth: i64, axis: Axis) -> IndexSpace {
    let range = cells.range(axis);
    let along = if face.is_lower() {
        let first = range.start + id.kind().staggered(axis) as i64;
        first .. first + depth
    } else {
        range.end - depth .. range.end
    };
    let across = across_range(cells, id, depth, axis);
    cells.with_range(axis.other(), across).with_range(axis, along)
}

/// Return the reflected value of a field at a guard index beyond a domain
/// boundary. The index is mirrored about the boundary; vector components
/// normal to the boundary change sign.
///
fn reflect(chunk: &Chunk, id: FieldId, face: Face, index: (i64, i64)) -> f64 {
    let axis = face.axis();
    let range = chunk.cells.range(axis);
    let g = axis.component(index);

    let m = match (face.is_lower(), id.kind().staggered(axis)) {
        (true, false) => 2 * range.start - 1 - g,
        (true, true) => 2 * range.start - g,
        (false, false) => 2 * range.end - 1 - g,
        (false, true) => 2 * range.end - g,
    };
    let value = chunk.sample(id, axis.with_component(index, m));

    if id.normal_axis() == Some(axis) {
        -value
    } else {
        value
    }
}
