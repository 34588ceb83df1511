use std::ops::{Index, IndexMut, Range};
use serde::{Deserialize, Serialize};
use crate::index_space::IndexSpace;




/**
 * A patch is a mapping from a rectangular subset of a global index space to
 * field values. The mapping is backed by a contiguous array of data, with the
 * first (x) index running fastest. Indexes are global and signed: a patch
 * covering a tile's cells plus two guard zones on each side is addressed from
 * `left - 2` to `right + 2`, never from zero.
 */
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    space: IndexSpace,
    data: Vec<f64>,
}




// ============================================================================
impl Patch {

    /**
     * Generate a patch covering the given index space, with every value set
     * to zero.
     */
    pub fn zeros(space: IndexSpace) -> Self {
        let data = vec![0.0; space.len()];
        Self { space, data }
    }


    /**
     * Generate a patch covering the given index space, with values defined
     * from a closure.
     */
    pub fn from_function<F>(space: IndexSpace, f: F) -> Self
    where
        F: Fn((i64, i64)) -> f64
    {
        let data = space.iter().map(f).collect();
        Self { space, data }
    }


    /**
     * Return the index space covered by this patch, guard zones included.
     */
    pub fn index_space(&self) -> &IndexSpace {
        &self.space
    }


    /**
     * Return the backing data, in memory order.
     */
    pub fn data(&self) -> &[f64] {
        &self.data
    }


    /**
     * Set every value in the patch, guard zones included.
     */
    pub fn fill(&mut self, value: f64) {
        self.data.iter_mut().for_each(|x| *x = value)
    }


    /**
     * Return a new patch holding a copy of the data in a sub-region of this
     * one.
     */
    pub fn extract(&self, space: &IndexSpace) -> Self {
        Self::from_function(space.clone(), |index| self[index])
    }


    /**
     * Copy all of another patch's values into this one. The other patch must
     * lie within this patch's index space.
     */
    pub fn copy_from(&mut self, other: &Patch) {
        for (index, value) in other.space.iter().zip(&other.data) {
            self[index] = *value
        }
    }


    fn validate_index(&self, index: (i64, i64)) {
        if !self.space.contains(index) {
            let (i0, j0) = self.space.start();
            let (i1, j1) = self.space.end();
            panic!("index ({} {}) out of range on patch ({}..{} {}..{})",
                index.0,
                index.1,
                i0,
                i1,
                j0,
                j1);
        }
    }
}




// ============================================================================
impl Index<(i64, i64)> for Patch {
    type Output = f64;

    fn index(&self, index: (i64, i64)) -> &f64 {
        if cfg!(debug_assertions) {
            self.validate_index(index)
        }
        &self.data[self.space.offset(index)]
    }
}

impl IndexMut<(i64, i64)> for Patch {
    fn index_mut(&mut self, index: (i64, i64)) -> &mut f64 {
        if cfg!(debug_assertions) {
            self.validate_index(index)
        }
        let n = self.space.offset(index);
        &mut self.data[n]
    }
}




/**
 * A one-dimensional counterpart to `Patch`, for the per-axis mesh geometry
 * (cell centers, vertex positions and spacings). Indexes are global and
 * signed, exactly as for patches.
 */
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line {
    start: i64,
    data: Vec<f64>,
}




// ============================================================================
impl Line {

    pub fn zeros(range: Range<i64>) -> Self {
        Self {
            start: range.start,
            data: vec![0.0; (range.end - range.start).max(0) as usize],
        }
    }


    /**
     * Return the range of indexes this line covers.
     */
    pub fn range(&self) -> Range<i64> {
        self.start .. self.start + self.data.len() as i64
    }


    fn validate_index(&self, index: i64) {
        if !self.range().contains(&index) {
            panic!("index {} out of range on line ({}..{})",
                index,
                self.range().start,
                self.range().end);
        }
    }
}

impl Index<i64> for Line {
    type Output = f64;

    fn index(&self, index: i64) -> &f64 {
        if cfg!(debug_assertions) {
            self.validate_index(index)
        }
        &self.data[(index - self.start) as usize]
    }
}

impl IndexMut<i64> for Line {
    fn index_mut(&mut self, index: i64) -> &mut f64 {
        if cfg!(debug_assertions) {
            self.validate_index(index)
        }
        &mut self.data[(index - self.start) as usize]
    }
}
