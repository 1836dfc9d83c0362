use std::{cell::RefCell, rc::Rc};

use itertools::Itertools;
use snafu::prelude::*;

use crate::{
    error::{IndexSnafu, Result},
    parent::{DataObject, IndexEngine, IndexRef, RowIndex},
    selector::RowSlice,
    types::value::ScalarValue,
};

/// A row index over one column, kept as `(key, row)` pairs sorted by key.
#[derive(Debug, Clone, PartialEq)]
pub struct MemIndex {
    engine: IndexEngine,
    column: String,
    entries: Vec<(ScalarValue, usize)>,
}

impl MemIndex {
    /// Indexes every row of `data`, known in its table as `column`.
    pub fn build(data: &dyn DataObject, column: impl Into<String>, engine: IndexEngine) -> Self {
        let len = data.len().unwrap_or(0);
        let entries = (0..len)
            .map(|row| (data.value_at(row).unwrap_or(ScalarValue::Null), row))
            .sorted()
            .collect();
        Self {
            engine,
            column: column.into(),
            entries,
        }
    }

    pub fn into_ref(self) -> IndexRef {
        Rc::new(RefCell::new(self))
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// Rows holding `key`, in ascending order.
    pub fn find(&self, key: &ScalarValue) -> Vec<usize> {
        let start = self.entries.partition_point(|(k, _)| k < key);
        self.entries[start..]
            .iter()
            .take_while(|(k, _)| k == key)
            .map(|(_, row)| *row)
            .collect()
    }

    /// All rows in key order.
    pub fn sorted_rows(&self) -> Vec<usize> {
        self.entries.iter().map(|(_, row)| *row).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn relabel(&mut self, rows: &[usize]) {
        let keep = self
            .entries
            .drain(..)
            .filter_map(|(key, row)| {
                rows.iter()
                    .position(|kept| *kept == row)
                    .map(|new_row| (key, new_row))
            })
            .sorted()
            .collect();
        self.entries = keep;
    }
}

impl RowIndex for MemIndex {
    fn engine(&self) -> IndexEngine {
        self.engine
    }

    fn replace(&mut self, row: usize, column: &str, value: &ScalarValue) -> Result<()> {
        ensure!(
            column == self.column,
            IndexSnafu {
                message: format!("index over '{}' cannot update column '{column}'", self.column)
            }
        );
        let Some(at) = self.entries.iter().position(|(_, r)| *r == row) else {
            return IndexSnafu {
                message: format!("row {row} is not in the index"),
            }
            .fail();
        };
        self.entries.remove(at);
        let entry = (value.clone(), row);
        let at = self.entries.partition_point(|e| *e < entry);
        self.entries.insert(at, entry);
        Ok(())
    }

    fn get_slice(&self, column: &dyn DataObject, rows: &[usize]) -> Result<IndexRef> {
        ensure!(
            column.len() == Some(rows.len()),
            IndexSnafu {
                message: format!(
                    "sliced column has {:?} rows, expected {}",
                    column.len(),
                    rows.len()
                )
            }
        );
        Ok(MemIndex::build(column, self.column.clone(), self.engine).into_ref())
    }

    fn replace_rows(&mut self, rows: &[usize]) -> Result<()> {
        self.relabel(rows);
        Ok(())
    }

    fn slice(&self, slice: &RowSlice) -> Result<IndexRef> {
        let rows = slice.positions(self.entries.len())?;
        let mut out = self.clone();
        out.relabel(&rows);
        Ok(out.into_ref())
    }

    fn deep_copy(&self) -> IndexRef {
        self.clone().into_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(keys: &[i64]) -> MemIndex {
        MemIndex {
            engine: IndexEngine::Tree,
            column: "a".to_string(),
            entries: keys
                .iter()
                .enumerate()
                .map(|(row, key)| (ScalarValue::from(*key), row))
                .sorted()
                .collect(),
        }
    }

    #[test]
    fn test_replace_keeps_order() {
        let mut idx = index(&[5, 1, 3]);
        assert_eq!(idx.sorted_rows(), vec![1, 2, 0]);
        idx.replace(1, "a", &ScalarValue::from(9)).unwrap();
        assert_eq!(idx.sorted_rows(), vec![2, 0, 1]);
        assert_eq!(idx.find(&ScalarValue::from(9)), vec![1]);
        assert!(idx.replace(0, "b", &ScalarValue::from(1)).is_err());
        assert!(idx.replace(7, "a", &ScalarValue::from(1)).is_err());
    }

    #[test]
    fn test_replace_rows_relabels() {
        let mut idx = index(&[5, 1, 3, 2]);
        idx.replace_rows(&[3, 0]).unwrap();
        assert_eq!(idx.len(), 2);
        assert_eq!(idx.find(&ScalarValue::from(2)), vec![0]);
        assert_eq!(idx.find(&ScalarValue::from(5)), vec![1]);
        assert!(idx.find(&ScalarValue::from(1)).is_empty());
    }

    #[test]
    fn test_slice() {
        let idx = index(&[4, 3, 2, 1]);
        let sliced = idx.slice(&RowSlice::new(Some(1), Some(3), None)).unwrap();
        assert_eq!(sliced.borrow().engine(), IndexEngine::Tree);
        let copy = idx.deep_copy();
        assert!(!Rc::ptr_eq(&copy, &sliced));
    }
}
