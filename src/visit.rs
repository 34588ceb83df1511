use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::chunk::Chunk;
use crate::error::{Error, Result};
use crate::field::{FieldKind, FieldStore};
use crate::patch::Patch;




/**
 * The interior of one tile's primary fields, as written to a visualization
 * snapshot.
 */
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TileSnapshot {
    pub density0: Patch,
    pub energy0: Patch,
    pub pressure: Patch,
    pub xvel0: Patch,
    pub yvel0: Patch,
}




/**
 * Everything one worker writes at a visit step.
 */
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub step: u64,
    pub time: f64,
    pub rank: usize,
    pub tiles: Vec<TileSnapshot>,
}




// ============================================================================
impl TileSnapshot {
    pub fn from_fields(fields: &FieldStore) -> Self {
        let cells = FieldKind::Cell.interior_space(fields.cells());
        let nodes = FieldKind::Vertex.interior_space(fields.cells());

        Self {
            density0: fields.density0.extract(&cells),
            energy0: fields.energy0.extract(&cells),
            pressure: fields.pressure.extract(&cells),
            xvel0: fields.xvel0.extract(&nodes),
            yvel0: fields.yvel0.extract(&nodes),
        }
    }
}




// ============================================================================
impl Snapshot {
    pub fn from_chunk(chunk: &Chunk, step: u64, time: f64) -> Self {
        Self {
            step,
            time,
            rank: chunk.rank,
            tiles: chunk.tiles.iter().map(|tile| TileSnapshot::from_fields(&tile.fields)).collect(),
        }
    }

    /// The file name a worker uses for a given step.
    pub fn file_name(step: u64, rank: usize) -> String {
        format!("clover.{}.{}.cbor", step, rank)
    }

    /**
     * Write this snapshot as CBOR into the given directory, creating the
     * directory if needed. Returns the path written.
     */
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(Self::file_name(self.step, self.rank));
        let file = File::create(&path)?;
        let mut buffer = BufWriter::new(file);
        ciborium::ser::into_writer(self, &mut buffer).map_err(|e| Error::Snapshot(e.to_string()))?;
        Ok(path)
    }

    pub fn read(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        ciborium::de::from_reader(std::io::BufReader::new(file)).map_err(|e| Error::Snapshot(e.to_string()))
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::Snapshot;
    use crate::chunk::Chunk;
    use crate::decompose::decompose;

    #[test]
    fn snapshot_holds_interior_values_only() {
        let layout = decompose(6, 4, 1).unwrap();
        let mut chunk = Chunk::new(&layout.chunks[0], 2).unwrap();
        for tile in &mut chunk.tiles {
            tile.fields.density0.fill(1.5);
        }
        let snapshot = Snapshot::from_chunk(&chunk, 3, 0.25);
        let cells: usize = snapshot.tiles.iter().map(|t| t.density0.data().len()).sum();
        let nodes: usize = snapshot.tiles.iter().map(|t| t.xvel0.data().len()).sum();
        assert_eq!(cells, 24);
        assert!(nodes > 24);
        assert!(snapshot.tiles.iter().all(|t| t.density0.data().iter().all(|&d| d == 1.5)));
    }

    #[test]
    fn snapshot_survives_a_trip_through_disk() {
        let layout = decompose(4, 4, 1).unwrap();
        let chunk = Chunk::new(&layout.chunks[0], 1).unwrap();
        let dir = std::env::temp_dir().join(format!("clover-visit-{}", std::process::id()));
        let path = Snapshot::from_chunk(&chunk, 10, 1.0).write(&dir).unwrap();
        assert!(path.ends_with("clover.10.0.cbor"));
        let back = Snapshot::read(&path).unwrap();
        assert_eq!(back.step, 10);
        assert_eq!(back.tiles[0].density0, chunk.tiles[0].fields.density0.extract(&chunk.tiles[0].cells));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
