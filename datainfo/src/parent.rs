//! Collaborators an info object talks to: the data object it describes, the
//! table owning that data object, and the table's row indices.

use std::{cell::RefCell, rc::Rc};

use indexmap::IndexMap;

use crate::{
    error::{AttributeNotFoundSnafu, ReadOnlyAttributeSnafu, Result, UnsupportedSnafu},
    info::{AttrValue, InfoCell, InfoClass},
    selector::RowSlice,
    types::value::ScalarValue,
};

/// A data-bearing object carrying an info object: a table column, or a
/// column-like wrapped value.
///
/// The object owns its [`InfoCell`]; the info bound into that cell only
/// keeps a weak reference back to the object.
pub trait DataObject {
    /// Type name shown by the `attributes` summary.
    fn class_name(&self) -> &str;

    /// The info class decorating this object's type.
    fn info_class(&self) -> &'static InfoClass;

    fn info_cell(&self) -> &InfoCell;

    /// Full shape; the first axis runs over rows.
    fn shape(&self) -> Vec<usize>;

    /// Number of rows, if the object has a length.
    fn len(&self) -> Option<usize> {
        self.shape().first().copied()
    }

    /// Mask with `true` for every masked element, if the object supports masking.
    fn mask(&self) -> Option<Vec<bool>> {
        None
    }

    /// Element values as floats, for NaN detection and statistics.
    fn values_f64(&self) -> Result<Vec<f64>> {
        UnsupportedSnafu {
            operation: "numeric view",
            class: self.class_name(),
        }
        .fail()
    }

    /// Value stored in `row`.
    fn value_at(&self, _row: usize) -> Option<ScalarValue> {
        None
    }

    /// Reads an attribute the info class delegates to the parent.
    fn get_attr(&self, attr: &str) -> Result<AttrValue> {
        AttributeNotFoundSnafu {
            class: self.class_name(),
            attr,
        }
        .fail()
    }

    /// Writes an attribute the info class delegates to the parent.
    fn set_attr(&self, attr: &str, _value: AttrValue) -> Result<()> {
        ReadOnlyAttributeSnafu { attr }.fail()
    }

    /// Invokes a zero-argument method by name, used by summary accessors.
    fn call_method(&self, method: &str) -> Result<ScalarValue> {
        AttributeNotFoundSnafu {
            class: self.class_name(),
            attr: method,
        }
        .fail()
    }
}

/// Rebuilds a data object from its dictionary representation.
pub trait FromRepresentation: Sized {
    fn construct_from_dict(map: IndexMap<String, AttrValue>) -> Result<Self>;
}

/// Table owning a set of columns.
pub trait ParentTable {
    /// Formatter rendering the rows of this table's columns.
    fn formatter(&self) -> Rc<dyn ColumnFormatter>;

    /// Renames a column in the column registry.
    fn rename_column(&self, old: &str, new: &str) -> Result<()>;
}

/// Renders the rows of a column as strings.
pub trait ColumnFormatter {
    fn format_row(&self, column: &dyn DataObject, row: usize) -> String;
}

/// Storage engine behind a row index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexEngine {
    /// Array-backed; cheap to rebuild for any subset.
    SortedArray,
    /// Tree-backed; relabelling beats rebuilding for large subsets.
    Tree,
}

impl IndexEngine {
    pub fn is_array_backed(&self) -> bool {
        matches!(self, IndexEngine::SortedArray)
    }
}

/// A row index over one or more columns of a table.
pub trait RowIndex {
    fn engine(&self) -> IndexEngine;

    /// Updates the key of `row` after `column` changed to `value`.
    fn replace(&mut self, row: usize, column: &str, value: &ScalarValue) -> Result<()>;

    /// Builds a fresh index over `column`, a subset holding `rows` of the original.
    fn get_slice(&self, column: &dyn DataObject, rows: &[usize]) -> Result<IndexRef>;

    /// Keeps only `rows`, relabelling them to their position in `rows`.
    fn replace_rows(&mut self, rows: &[usize]) -> Result<()>;

    /// Index over the rows kept by a contiguous slice.
    fn slice(&self, slice: &RowSlice) -> Result<IndexRef>;

    fn deep_copy(&self) -> IndexRef;
}

/// Shared handle to a row index; one index may cover several columns.
pub type IndexRef = Rc<RefCell<dyn RowIndex>>;
