//! Row selections used when modifying or slicing a column.

use std::ops::Range;

use snafu::prelude::*;

use crate::error::{IndexSnafu, Result};

/// A `start:stop:step` slice with negative positions counted from the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowSlice {
    pub start: Option<isize>,
    pub stop: Option<isize>,
    pub step: Option<isize>,
}

impl RowSlice {
    pub fn new(start: Option<isize>, stop: Option<isize>, step: Option<isize>) -> Self {
        Self { start, stop, step }
    }

    /// Resolves the slice against a sequence of `len` rows, returning
    /// `(start, stop, step)` clamped into range.
    pub fn indices(&self, len: usize) -> Result<(isize, isize, isize)> {
        let step = self.step.unwrap_or(1);
        ensure!(
            step != 0,
            IndexSnafu {
                message: "slice step cannot be zero"
            }
        );
        let len = len as isize;
        let (lower, upper) = if step < 0 { (-1, len - 1) } else { (0, len) };
        let clamp = |bound: Option<isize>, default: isize| match bound {
            None => default,
            Some(v) if v < 0 => (v + len).max(lower),
            Some(v) => v.min(upper),
        };
        let start = clamp(self.start, if step < 0 { upper } else { lower });
        let stop = clamp(self.stop, if step < 0 { lower } else { upper });
        Ok((start, stop, step))
    }

    /// Explicit row positions selected out of `len` rows, in slice order.
    pub fn positions(&self, len: usize) -> Result<Vec<usize>> {
        let (start, stop, step) = self.indices(len)?;
        let mut out = Vec::new();
        let mut row = start;
        while (step > 0 && row < stop) || (step < 0 && row > stop) {
            out.push(row as usize);
            row += step;
        }
        Ok(out)
    }
}

impl From<Range<usize>> for RowSlice {
    fn from(range: Range<usize>) -> Self {
        Self::new(Some(range.start as isize), Some(range.end as isize), None)
    }
}

/// Rows affected by a column modification or kept by a slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowSelector {
    /// A contiguous (possibly strided) slice.
    Slice(RowSlice),
    /// A single row.
    Position(usize),
    /// A boolean mask with one entry per row.
    Mask(Vec<bool>),
    /// Explicit row positions.
    Positions(Vec<usize>),
}

impl RowSelector {
    /// Normalizes the selection into explicit row positions.
    pub fn positions(&self, len: usize) -> Result<Vec<usize>> {
        match self {
            RowSelector::Slice(slice) => slice.positions(len),
            RowSelector::Position(row) => Ok(vec![*row]),
            RowSelector::Mask(mask) => Ok(mask_positions(mask)),
            RowSelector::Positions(rows) => Ok(rows.clone()),
        }
    }
}

pub(crate) fn mask_positions(mask: &[bool]) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter_map(|(row, keep)| keep.then_some(row))
        .collect()
}

impl From<RowSlice> for RowSelector {
    fn from(slice: RowSlice) -> Self {
        RowSelector::Slice(slice)
    }
}

impl From<Range<usize>> for RowSelector {
    fn from(range: Range<usize>) -> Self {
        RowSelector::Slice(range.into())
    }
}

impl From<usize> for RowSelector {
    fn from(row: usize) -> Self {
        RowSelector::Position(row)
    }
}

impl From<Vec<bool>> for RowSelector {
    fn from(mask: Vec<bool>) -> Self {
        RowSelector::Mask(mask)
    }
}

impl From<Vec<usize>> for RowSelector {
    fn from(rows: Vec<usize>) -> Self {
        RowSelector::Positions(rows)
    }
}
