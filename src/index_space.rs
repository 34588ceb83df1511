use core::ops::Range;
use serde::{Deserialize, Serialize};




/**
 * Identifier for a Cartesian axis. `I` runs along x, `J` along y.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    I,
    J,
}




// ============================================================================
impl Axis {

    /**
     * Return the other axis.
     */
    pub fn other(self) -> Self {
        match self {
            Axis::I => Axis::J,
            Axis::J => Axis::I,
        }
    }

    /**
     * Return the component of an index along this axis.
     */
    pub fn component(self, index: (i64, i64)) -> i64 {
        match self {
            Axis::I => index.0,
            Axis::J => index.1,
        }
    }

    /**
     * Return a copy of the index with the component along this axis replaced.
     */
    pub fn with_component(self, index: (i64, i64), value: i64) -> (i64, i64) {
        match self {
            Axis::I => (value, index.1),
            Axis::J => (index.0, value),
        }
    }
}




/**
 * Represents a rectangular region in a discrete index space. Indexes are
 * signed, so regions may extend below zero; this is how ghost zones are
 * addressed.
 */
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexSpace {
    di: Range<i64>,
    dj: Range<i64>,
}




// ============================================================================
impl IndexSpace {

    pub fn new(di: Range<i64>, dj: Range<i64>) -> Self {

        assert!(
            di.start <= di.end && dj.start <= dj.end,
            "index space has negative volume");

        Self { di, dj }
    }


    /**
     * Construct an index space from inclusive bounds on each axis, the way
     * cell ranges are usually written: `[left, right] x [bottom, top]`.
     */
    pub fn inclusive(left: i64, right: i64, bottom: i64, top: i64) -> Self {
        Self::new(left .. right + 1, bottom .. top + 1)
    }


    /**
     * Return the number of indexes on each axis.
     */
    pub fn dim(&self) -> (usize, usize) {
        ((self.di.end - self.di.start) as usize,
         (self.dj.end - self.dj.start) as usize)
    }


    /**
     * Return the number of elements in this index space.
     */
    pub fn len(&self) -> usize {
        let (l, m) = self.dim();
        l * m
    }


    /**
     * Determine whether this index space has no elements.
     */
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }


    /**
     * Return the minimum index (inclusive).
     */
    pub fn start(&self) -> (i64, i64) {
        (self.di.start, self.dj.start)
    }


    /**
     * Return the maximum index (exclusive).
     */
    pub fn end(&self) -> (i64, i64) {
        (self.di.end, self.dj.end)
    }


    /**
     * Return the maximum index (inclusive).
     */
    pub fn last(&self) -> (i64, i64) {
        (self.di.end - 1, self.dj.end - 1)
    }


    /**
     * Return the range of indexes along the given axis.
     */
    pub fn range(&self, axis: Axis) -> Range<i64> {
        match axis {
            Axis::I => self.di.clone(),
            Axis::J => self.dj.clone(),
        }
    }


    /**
     * Return a copy of this index space with the range on one axis replaced.
     */
    pub fn with_range(&self, axis: Axis, range: Range<i64>) -> Self {
        match axis {
            Axis::I => Self::new(range, self.dj.clone()),
            Axis::J => Self::new(self.di.clone(), range),
        }
    }


    /**
     * Determine whether this index space contains the given index.
     */
    pub fn contains(&self, index: (i64, i64)) -> bool {
        self.di.contains(&index.0) && self.dj.contains(&index.1)
    }


    /**
     * Expand this index space by the given number of elements on each axis.
     */
    pub fn extend_all(&self, delta: i64) -> Self {
        Self::new(
            self.di.start - delta .. self.di.end + delta,
            self.dj.start - delta .. self.dj.end + delta)
    }


    /**
     * Return the linear offset for the given index, in a memory buffer
     * aligned with the start of this index space. The first (x) index
     * increases fastest, so rows of constant y are contiguous.
     */
    pub fn offset(&self, index: (i64, i64)) -> usize {
        let i = (index.0 - self.di.start) as usize;
        let j = (index.1 - self.dj.start) as usize;
        let l = (self.di.end - self.di.start) as usize;
        j * l + i
    }


    /**
     * Return an iterator which traverses the index space in memory order
     * (the first index increases fastest).
     */
    pub fn iter(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.dj.clone().flat_map(move |j| self.di.clone().map(move |i| (i, j)))
    }
}




/**
 * Less imposing factory function to construct an IndexSpace object.
 */
pub fn range2d(di: Range<i64>, dj: Range<i64>) -> IndexSpace {
    IndexSpace::new(di, dj)
}
