use serde::{Deserialize, Serialize};
use crate::error::{Error, Result};
use crate::index_space::IndexSpace;

/// A uniform rectilinear mesh over a rectangle in physical space. Cells are
/// numbered from 1 on each axis, so the global cell index space is
/// `[1, x_cells] x [1, y_cells]`.
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
    pub x_cells: i64,
    pub y_cells: i64,
}

impl Grid {
    pub fn new(xmin: f64, xmax: f64, ymin: f64, ymax: f64, x_cells: i64, y_cells: i64) -> Result<Self> {
        let grid = Self { xmin, xmax, ymin, ymax, x_cells, y_cells };
        grid.validate()?;
        Ok(grid)
    }

    /// Check that the grid has positive extent and at least one cell on each
    /// axis.
    pub fn validate(&self) -> Result<()> {
        if self.x_cells < 1 || self.y_cells < 1 {
            return Err(Error::InvalidConfiguration(format!(
                "grid needs at least one cell per axis, got {} x {}",
                self.x_cells, self.y_cells
            )));
        }
        if !(self.xmax > self.xmin && self.ymax > self.ymin) {
            return Err(Error::InvalidConfiguration(format!(
                "grid extent [{}, {}] x [{}, {}] is empty",
                self.xmin, self.xmax, self.ymin, self.ymax
            )));
        }
        Ok(())
    }

    pub fn cell_spacing(&self) -> (f64, f64) {
        let dx = (self.xmax - self.xmin) / self.x_cells as f64;
        let dy = (self.ymax - self.ymin) / self.y_cells as f64;
        (dx, dy)
    }

    pub fn total_cells(&self) -> i64 {
        self.x_cells * self.y_cells
    }

    pub fn index_space(&self) -> IndexSpace {
        IndexSpace::inclusive(1, self.x_cells, 1, self.y_cells)
    }
}
