//! Operations of infos belonging to table columns: value rendering, upkeep
//! of row indices when the column changes, and attribute merging.

use std::{fmt, iter, rc::Rc};

use indexmap::IndexMap;
use itertools::Itertools;
use snafu::prelude::*;
use tracing::trace;

use super::{AttrValue, DataInfo, InfoAccess};
use crate::{
    config::config,
    error::{EmptyMergeSnafu, MergeShapeMismatchSnafu, Result},
    format::DefaultFormatter,
    merge::{MergeConflicts, merge},
    parent::{ColumnFormatter, DataObject, IndexRef},
    selector::RowSelector,
    types::{DataType, value::ScalarValue},
};

/// Per-row strings of a column, rendered on demand.
pub struct StrVals {
    column: Rc<dyn DataObject>,
    formatter: Rc<dyn ColumnFormatter>,
    row: usize,
    len: usize,
}

impl Iterator for StrVals {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.row >= self.len {
            return None;
        }
        let out = self.formatter.format_row(&*self.column, self.row);
        self.row += 1;
        Some(out)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.row;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for StrVals {}

impl DataInfo {
    /// Iterates over the parent's values as strings, formatted by the owning
    /// table when there is one.
    pub fn iter_str_vals(&self) -> Result<StrVals> {
        let column = self.parent()?;
        let formatter: Rc<dyn ColumnFormatter> = match self.parent_table()? {
            Some(table) => table.formatter(),
            None => Rc::new(DefaultFormatter),
        };
        let len = column.len().unwrap_or(0);
        Ok(StrVals {
            column,
            formatter,
            row: 0,
            len,
        })
    }

    /// Tells every row index that the rows at `selector` now hold `values`.
    ///
    /// A single value applies to every selected row.
    pub fn adjust_indices(
        &self,
        selector: impl Into<RowSelector>,
        values: &[ScalarValue],
        col_len: usize,
    ) -> Result<()> {
        let indices = self.indices()?;
        if indices.is_empty() {
            return Ok(());
        }
        let rows = selector.into().positions(col_len)?;
        let name = self.name()?.unwrap_or_default();
        let values: Box<dyn Iterator<Item = &ScalarValue> + '_> = match values {
            [single] => Box::new(iter::repeat(single)),
            many => Box::new(many.iter()),
        };
        for (row, value) in rows.into_iter().zip(values) {
            for index in &indices {
                index.borrow_mut().replace(row, &name, value)?;
            }
        }
        Ok(())
    }

    /// Gives `sliced`, the result of taking `item` out of this info's parent
    /// of `col_len` rows, row indices matching its rows.
    ///
    /// Indices over few retained rows, or backed by a sorted array, are built
    /// afresh; the others are copied and relabelled.
    pub fn slice_indices<T: DataObject + 'static>(
        &self,
        sliced: &Rc<T>,
        item: &RowSelector,
        col_len: usize,
    ) -> Result<()> {
        if !self.copy_indices() {
            return sliced.info_mut().set_indices(Vec::new());
        }
        let indices = self.indices()?;
        let new_indices = match item {
            RowSelector::Slice(slice) => indices
                .iter()
                .map(|index| index.borrow().slice(slice))
                .collect::<Result<Vec<_>>>()?,
            _ if indices.is_empty() => return Ok(()),
            _ => {
                let rows = item.positions(col_len)?;
                let small = rows.len() as f64 <= config().index_rebuild_threshold * col_len as f64;
                indices
                    .iter()
                    .map(|index| rebuild_or_relabel(index, &**sliced, &rows, small))
                    .collect::<Result<Vec<_>>>()?
            }
        };
        sliced.info_mut().set_indices(new_indices)
    }

    /// Merges the `attrs` of `cols` for a column called `name` built out of
    /// them. The result also holds the common `dtype` and the shared
    /// trailing `shape` of the inputs.
    pub fn merge_cols_attributes(
        cols: &[Rc<dyn DataObject>],
        conflicts: MergeConflicts,
        name: &str,
        attrs: &[&str],
    ) -> Result<IndexMap<String, AttrValue>> {
        let Some((first, rest)) = cols.split_first() else {
            return EmptyMergeSnafu.fail();
        };
        let conflict_message = |key: &str, left: &dyn fmt::Display, right: &dyn fmt::Display| {
            format!(
                "In merged column '{name}' the '{key}' attribute does not match \
                 ({left} != {right}).  Using {right} for merged output"
            )
        };
        let set_attrs = |col: &Rc<dyn DataObject>| -> IndexMap<String, AttrValue> {
            let info = col.info();
            attrs
                .iter()
                .filter_map(|attr| match info.get(attr) {
                    Ok(value) if !value.is_none() => Some((attr.to_string(), value)),
                    _ => None,
                })
                .collect()
        };

        let mut out = set_attrs(first);
        for col in rest {
            out = merge(out, set_attrs(col), conflicts, &conflict_message)?;
        }

        let dtypes = cols
            .iter()
            .map(|col| col.info().dtype())
            .collect::<Result<Vec<_>>>()?;
        out.insert(
            "dtype".to_string(),
            AttrValue::Dtype(DataType::common_supertype(dtypes)?),
        );

        let shapes = cols
            .iter()
            .map(|col| col.shape().get(1..).unwrap_or_default().to_vec())
            .unique()
            .collect_vec();
        ensure!(shapes.len() == 1, MergeShapeMismatchSnafu);
        out.insert(
            "shape".to_string(),
            AttrValue::Shape(shapes.into_iter().next().unwrap_or_default()),
        );
        Ok(out)
    }
}

fn rebuild_or_relabel(
    index: &IndexRef,
    sliced: &dyn DataObject,
    rows: &[usize],
    small: bool,
) -> Result<IndexRef> {
    let engine = index.borrow().engine();
    if small || engine.is_array_backed() {
        trace!("rebuilding {:?} index over {} rows", engine, rows.len());
        return index.borrow().get_slice(sliced, rows);
    }
    trace!("relabelling {:?} index to {} rows", engine, rows.len());
    let copy = index.borrow().deep_copy();
    copy.borrow_mut().replace_rows(rows)?;
    Ok(copy)
}
