//! Discontinuity flags along an ordered series.
//!
//! Pinch nodes mark true geological boundaries. The series sample nearest to
//! each marker is flagged, and no fitted plane may span a flagged position.

use crate::series::OrderedSeries;
use crate::spatial::{RTreeIndex, SpatialIndex};
use nalgebra::Vector3;

#[derive(Clone, Debug, Default)]
pub struct BreakIndex {
    flags: Vec<bool>,
    /// `prefix[i]` = number of flagged positions in `[0, i)`.
    prefix: Vec<u32>,
}

impl BreakIndex {
    /// Index without any break over a series of `len` samples.
    pub fn none(len: usize) -> Self {
        Self::from_flags(vec![false; len])
    }

    pub fn from_flags(flags: Vec<bool>) -> Self {
        let mut prefix = Vec::with_capacity(flags.len() + 1);
        let mut count = 0u32;
        prefix.push(count);
        for &f in &flags {
            count += u32::from(f);
            prefix.push(count);
        }
        Self { flags, prefix }
    }

    /// Flag the sample nearest to each marker. `index` must have been built
    /// over the series positions in sorted order.
    pub fn from_markers<I: SpatialIndex>(
        series: &OrderedSeries,
        markers: &[Vector3<f64>],
        index: &I,
    ) -> Self {
        let mut flags = vec![false; series.len()];
        for marker in markers {
            if let Some(nearest) = index.nearest(marker) {
                if let Some(flag) = flags.get_mut(nearest.index) {
                    *flag = true;
                }
            }
        }
        Self::from_flags(flags)
    }

    /// Convenience wrapper building an R-tree over the series.
    pub fn locate(series: &OrderedSeries, markers: &[Vector3<f64>]) -> Self {
        if markers.is_empty() {
            return Self::none(series.len());
        }
        let index = RTreeIndex::from_points(series.positions());
        Self::from_markers(series, markers, &index)
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    #[inline]
    pub fn is_break(&self, pos: usize) -> bool {
        self.flags.get(pos).copied().unwrap_or(false)
    }

    /// Number of flagged positions.
    pub fn count(&self) -> usize {
        self.prefix.last().copied().unwrap_or(0) as usize
    }

    /// Flagged sorted positions in ascending order.
    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.flags
            .iter()
            .enumerate()
            .filter_map(|(i, &f)| f.then_some(i))
    }

    /// True when `[lo, hi)` contains a flagged position.
    #[inline]
    pub fn spans_break(&self, lo: usize, hi: usize) -> bool {
        let hi = hi.min(self.flags.len());
        lo < hi && self.prefix[hi] > self.prefix[lo]
    }

    /// First flagged position inside `[lo, hi)`.
    pub fn first_in(&self, lo: usize, hi: usize) -> Option<usize> {
        if !self.spans_break(lo, hi) {
            return None;
        }
        (lo..hi.min(self.flags.len())).find(|&i| self.flags[i])
    }
}
