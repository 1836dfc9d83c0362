use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use itertools::Itertools;
use snafu::prelude::*;

use crate::{
    error::{
        AttributeNotFoundSnafu, IndexSnafu, ReadOnlyAttributeSnafu, Result, TypeMismatchSnafu,
        UnsupportedSnafu,
    },
    info::{
        AttrName, AttrValue, InfoAccess, InfoCell, InfoClass, InfoOwner,
        class::BASE_COLUMN_INFO,
    },
    parent::DataObject,
    selector::RowSelector,
    summary::{nanmax, nanmean, nanmin, nanstd},
    types::{DataType, value::ScalarValue},
};

/// Info of [`MemColumn`]; the element type lives on the column.
pub const MEM_COLUMN_INFO: InfoClass = InfoClass {
    name: "ColumnInfo",
    attrs_from_parent: &[AttrName::Dtype],
    ..BASE_COLUMN_INFO
};

/// A column held in memory, one value per element.
pub struct MemColumn {
    values: RefCell<Vec<ScalarValue>>,
    /// Shape of one row; empty for scalar rows.
    row_shape: Vec<usize>,
    mask: RefCell<Option<Vec<bool>>>,
    dtype: Cell<DataType>,
    info: InfoCell,
}

impl MemColumn {
    /// A column of `values`, typed by their common type.
    pub fn new<V: Into<ScalarValue>>(values: impl IntoIterator<Item = V>) -> Self {
        let values = values.into_iter().map(Into::into).collect_vec();
        let dtype = DataType::common_supertype(values.iter().map(ScalarValue::data_type))
            .unwrap_or(DataType::Object);
        Self {
            values: RefCell::new(values),
            row_shape: Vec::new(),
            mask: RefCell::new(None),
            dtype: Cell::new(dtype),
            info: InfoCell::new(),
        }
    }

    pub fn with_dtype(self, dtype: DataType) -> Self {
        self.dtype.set(dtype);
        self
    }

    /// Marks elements as masked; `true` entries are masked.
    pub fn with_mask(self, mask: Vec<bool>) -> Self {
        *self.mask.borrow_mut() = Some(mask);
        self
    }

    /// Groups the values into rows of the given shape.
    pub fn with_row_shape(mut self, row_shape: Vec<usize>) -> Self {
        self.row_shape = row_shape;
        self
    }

    pub fn into_rc(self) -> Rc<Self> {
        Rc::new(self)
    }

    fn row_size(&self) -> usize {
        self.row_shape.iter().product()
    }

    pub fn values(&self) -> Vec<ScalarValue> {
        self.values.borrow().clone()
    }

    pub fn dtype(&self) -> DataType {
        self.dtype.get()
    }

    /// A new column with the rows picked by `item`, carrying a copy of this
    /// column's info and row indices matching the new rows.
    pub fn slice(self: &Rc<Self>, item: impl Into<RowSelector>) -> Result<Rc<MemColumn>> {
        let item = item.into();
        let len = self.len().unwrap_or(0);
        let rows = item.positions(len)?;
        let row_size = self.row_size();
        let pick = |rows: &[usize], data: &[ScalarValue]| -> Vec<ScalarValue> {
            rows.iter()
                .flat_map(|row| data[row * row_size..(row + 1) * row_size].iter().cloned())
                .collect()
        };
        if let Some(row) = rows.iter().find(|row| **row >= len) {
            return IndexSnafu {
                message: format!("row {row} is out of bounds for a column of {len} rows"),
            }
            .fail();
        }
        let values = pick(&rows, &self.values.borrow());
        let mask = self.mask.borrow().as_ref().map(|mask| {
            rows.iter()
                .flat_map(|row| {
                    mask.get(row * row_size..(row + 1) * row_size)
                        .unwrap_or_default()
                        .iter()
                        .copied()
                })
                .collect()
        });
        let sliced = Rc::new(MemColumn {
            values: RefCell::new(values),
            row_shape: self.row_shape.clone(),
            mask: RefCell::new(mask),
            dtype: Cell::new(self.dtype()),
            info: InfoCell::new(),
        });
        let info = self.info();
        sliced.set_info(&info)?;
        info.slice_indices(&sliced, &item, len)?;
        Ok(sliced)
    }

    /// Overwrites the rows at `selector` with `values` and updates the row
    /// indices. A single value is written to every selected row.
    pub fn set_values(
        self: &Rc<Self>,
        selector: impl Into<RowSelector>,
        values: Vec<ScalarValue>,
    ) -> Result<()> {
        ensure!(
            self.row_size() == 1,
            UnsupportedSnafu {
                operation: "row assignment",
                class: "multidimensional column",
            }
        );
        let selector = selector.into();
        let len = self.len().unwrap_or(0);
        let rows = selector.positions(len)?;
        ensure!(
            values.len() == 1 || values.len() == rows.len(),
            IndexSnafu {
                message: format!("cannot assign {} values to {} rows", values.len(), rows.len())
            }
        );
        {
            let mut data = self.values.borrow_mut();
            for (i, row) in rows.iter().enumerate() {
                let Some(slot) = data.get_mut(*row) else {
                    return IndexSnafu {
                        message: format!("row {row} is out of bounds for a column of {len} rows"),
                    }
                    .fail();
                };
                *slot = values[if values.len() == 1 { 0 } else { i }].clone();
            }
        }
        self.info().adjust_indices(selector, &values, len)
    }

    fn numeric(&self) -> Result<Vec<f64>> {
        self.values
            .borrow()
            .iter()
            .map(|value| match value {
                ScalarValue::Null => Some(f64::NAN),
                other => other.as_f64(),
            })
            .collect::<Option<Vec<_>>>()
            .context(UnsupportedSnafu {
                operation: "numeric view",
                class: self.class_name(),
            })
    }

    fn unmasked(&self) -> Result<Vec<f64>> {
        let values = self.numeric()?;
        Ok(match self.mask.borrow().as_ref() {
            Some(mask) => values
                .into_iter()
                .zip(mask)
                .filter_map(|(value, masked)| (!masked).then_some(value))
                .collect(),
            None => values,
        })
    }

    fn typed(&self, value: f64) -> ScalarValue {
        match self.dtype().kind() {
            'i' | 'u' if value.is_finite() => ScalarValue::Int64(value as i64),
            _ => ScalarValue::from(value),
        }
    }
}

impl DataObject for MemColumn {
    fn class_name(&self) -> &str {
        if self.mask.borrow().is_some() {
            "MaskedColumn"
        } else {
            "Column"
        }
    }

    fn info_class(&self) -> &'static InfoClass {
        &MEM_COLUMN_INFO
    }

    fn info_cell(&self) -> &InfoCell {
        &self.info
    }

    fn shape(&self) -> Vec<usize> {
        let rows = self.values.borrow().len() / self.row_size().max(1);
        let mut shape = vec![rows];
        shape.extend(&self.row_shape);
        shape
    }

    fn mask(&self) -> Option<Vec<bool>> {
        self.mask.borrow().clone()
    }

    fn values_f64(&self) -> Result<Vec<f64>> {
        self.numeric()
    }

    fn value_at(&self, row: usize) -> Option<ScalarValue> {
        if self.row_size() != 1 {
            return None;
        }
        self.values.borrow().get(row).cloned()
    }

    fn get_attr(&self, attr: &str) -> Result<AttrValue> {
        match attr {
            "dtype" => Ok(AttrValue::Dtype(self.dtype())),
            "shape" => Ok(AttrValue::Shape(self.shape())),
            _ => AttributeNotFoundSnafu {
                class: self.class_name(),
                attr,
            }
            .fail(),
        }
    }

    fn set_attr(&self, attr: &str, value: AttrValue) -> Result<()> {
        match (attr, value) {
            ("dtype", AttrValue::Dtype(dtype)) => self.dtype.set(dtype),
            ("dtype", AttrValue::Str(descriptor)) => self.dtype.set(descriptor.parse()?),
            ("dtype", other) => {
                return TypeMismatchSnafu {
                    attr,
                    expected: "dtype",
                    actual: other.kind_name(),
                }
                .fail();
            }
            _ => return ReadOnlyAttributeSnafu { attr }.fail(),
        }
        Ok(())
    }

    fn call_method(&self, method: &str) -> Result<ScalarValue> {
        match method {
            "min" => Ok(self.typed(nanmin(&self.unmasked()?)?)),
            "max" => Ok(self.typed(nanmax(&self.unmasked()?)?)),
            "mean" => Ok(ScalarValue::from(nanmean(&self.unmasked()?))),
            "std" => Ok(ScalarValue::from(nanstd(&self.unmasked()?))),
            "sum" => Ok(self.typed(self.unmasked()?.iter().sum())),
            _ => AttributeNotFoundSnafu {
                class: self.class_name(),
                attr: method,
            }
            .fail(),
        }
    }
}

impl InfoOwner for MemColumn {
    const INFO_CLASS: &'static InfoClass = &MEM_COLUMN_INFO;
}
