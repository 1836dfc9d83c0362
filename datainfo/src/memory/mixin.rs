use std::cell::RefCell;

use indexmap::IndexMap;
use itertools::Itertools;
use serde_json::Value;

use crate::{
    error::{AttributeNotFoundSnafu, ReadOnlyAttributeSnafu, Result, TypeMismatchSnafu},
    info::{AttrName, AttrValue, InfoCell, InfoClass, InfoOwner, class::PARENT_DTYPE_INFO},
    parent::{DataObject, FromRepresentation},
    summary::{nanmax, nanmean, nanmin, nanstd},
    types::{DataType, value::ScalarValue},
};

/// Info of [`MemQuantity`]: element type and unit belong to the quantity.
pub const MEM_QUANTITY_INFO: InfoClass = InfoClass {
    name: "QuantityInfo",
    attrs_from_parent: &[AttrName::Dtype, AttrName::Unit],
    represent_as_dict_attrs: &["value", "unit"],
    ..PARENT_DTYPE_INFO
};

/// A column-like float array with a physical unit.
pub struct MemQuantity {
    values: Vec<f64>,
    unit: RefCell<Option<String>>,
    info: InfoCell,
}

impl MemQuantity {
    pub fn new(values: Vec<f64>, unit: Option<&str>) -> Self {
        Self {
            values,
            unit: RefCell::new(unit.map(str::to_string)),
            info: InfoCell::new(),
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn unit(&self) -> Option<String> {
        self.unit.borrow().clone()
    }
}

impl DataObject for MemQuantity {
    fn class_name(&self) -> &str {
        "Quantity"
    }

    fn info_class(&self) -> &'static InfoClass {
        &MEM_QUANTITY_INFO
    }

    fn info_cell(&self) -> &InfoCell {
        &self.info
    }

    fn shape(&self) -> Vec<usize> {
        vec![self.values.len()]
    }

    fn values_f64(&self) -> Result<Vec<f64>> {
        Ok(self.values.clone())
    }

    fn value_at(&self, row: usize) -> Option<ScalarValue> {
        self.values.get(row).map(|v| ScalarValue::from(*v))
    }

    fn get_attr(&self, attr: &str) -> Result<AttrValue> {
        match attr {
            "dtype" => Ok(AttrValue::Dtype(DataType::Float64)),
            "unit" => Ok(AttrValue::from(self.unit())),
            "value" => Ok(AttrValue::Json(Value::from(self.values.clone()))),
            _ => AttributeNotFoundSnafu {
                class: self.class_name(),
                attr,
            }
            .fail(),
        }
    }

    fn set_attr(&self, attr: &str, value: AttrValue) -> Result<()> {
        match (attr, value) {
            ("unit", AttrValue::Str(unit)) => *self.unit.borrow_mut() = Some(unit),
            ("unit", AttrValue::None) => *self.unit.borrow_mut() = None,
            ("unit", other) => {
                return TypeMismatchSnafu {
                    attr,
                    expected: "str",
                    actual: other.kind_name(),
                }
                .fail();
            }
            _ => return ReadOnlyAttributeSnafu { attr }.fail(),
        }
        Ok(())
    }

    fn call_method(&self, method: &str) -> Result<ScalarValue> {
        let out = match method {
            "min" => nanmin(&self.values)?,
            "max" => nanmax(&self.values)?,
            "mean" => nanmean(&self.values),
            "std" => nanstd(&self.values),
            _ => {
                return AttributeNotFoundSnafu {
                    class: self.class_name(),
                    attr: method,
                }
                .fail();
            }
        };
        Ok(ScalarValue::from(out))
    }
}

impl FromRepresentation for MemQuantity {
    fn construct_from_dict(mut map: IndexMap<String, AttrValue>) -> Result<Self> {
        let values = match map.shift_remove("value") {
            Some(AttrValue::Json(Value::Array(items))) => items.iter().filter_map(Value::as_f64).collect_vec(),
            Some(other) => {
                return TypeMismatchSnafu {
                    attr: "value",
                    expected: "json",
                    actual: other.kind_name(),
                }
                .fail();
            }
            None => Vec::new(),
        };
        let unit = map.shift_remove("unit");
        Ok(MemQuantity::new(values, unit.as_ref().and_then(AttrValue::as_str)))
    }
}

impl InfoOwner for MemQuantity {
    const INFO_CLASS: &'static InfoClass = &MEM_QUANTITY_INFO;
}
