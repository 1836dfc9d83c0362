use std::{fmt, rc::Rc};

use itertools::Itertools;
use serde_json::Value;

use crate::{
    parent::{IndexRef, ParentTable},
    types::{DataType, dtype_info_name},
};

/// Free-form metadata attached to an info object.
pub type Meta = serde_json::Map<String, Value>;

/// The closed vocabulary of attributes an info object can store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttrName {
    Name,
    Unit,
    Dtype,
    Format,
    Description,
    Meta,
    ParentTable,
    Indices,
}

impl AttrName {
    /// Attributes every data object carries.
    pub const DATA: &'static [AttrName] = &[
        AttrName::Name,
        AttrName::Unit,
        AttrName::Dtype,
        AttrName::Format,
        AttrName::Description,
        AttrName::Meta,
    ];

    /// Attributes of anything that can live in a table.
    pub const COLUMN: &'static [AttrName] = &[
        AttrName::Name,
        AttrName::Unit,
        AttrName::Dtype,
        AttrName::Format,
        AttrName::Description,
        AttrName::Meta,
        AttrName::ParentTable,
        AttrName::Indices,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AttrName::Name => "name",
            AttrName::Unit => "unit",
            AttrName::Dtype => "dtype",
            AttrName::Format => "format",
            AttrName::Description => "description",
            AttrName::Meta => "meta",
            AttrName::ParentTable => "parent_table",
            AttrName::Indices => "indices",
        }
    }

    pub fn parse(attr: &str) -> Option<AttrName> {
        AttrName::COLUMN
            .iter()
            .find(|name| name.as_str() == attr)
            .copied()
    }
}

impl fmt::Display for AttrName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A value held by, or handed to, an info object.
#[derive(Clone, Default)]
pub enum AttrValue {
    /// Unset.
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Str(String),
    Dtype(DataType),
    Shape(Vec<usize>),
    Meta(Meta),
    Json(Value),
    Table(Rc<dyn ParentTable>),
    Indices(Vec<IndexRef>),
}

impl AttrValue {
    pub fn is_none(&self) -> bool {
        matches!(self, AttrValue::None)
    }

    /// Name of the variant, used in type mismatch errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            AttrValue::None => "none",
            AttrValue::Bool(_) => "bool",
            AttrValue::Int(_) => "int",
            AttrValue::Str(_) => "str",
            AttrValue::Dtype(_) => "dtype",
            AttrValue::Shape(_) => "shape",
            AttrValue::Meta(_) => "meta",
            AttrValue::Json(_) => "json",
            AttrValue::Table(_) => "table",
            AttrValue::Indices(_) => "indices",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_dtype(&self) -> Option<DataType> {
        match self {
            AttrValue::Dtype(dtype) => Some(*dtype),
            _ => None,
        }
    }

    pub fn as_meta(&self) -> Option<&Meta> {
        match self {
            AttrValue::Meta(meta) => Some(meta),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Rc<dyn ParentTable>> {
        match self {
            AttrValue::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn as_indices(&self) -> Option<&[IndexRef]> {
        match self {
            AttrValue::Indices(indices) => Some(indices),
            _ => None,
        }
    }

    /// Copy that shares nothing mutable with `self`: row indices are
    /// duplicated rather than shared. Table handles stay shared since the
    /// table is never owned through an attribute.
    pub fn deep_copy(&self) -> AttrValue {
        match self {
            AttrValue::Indices(indices) => AttrValue::Indices(
                indices
                    .iter()
                    .map(|index| index.borrow().deep_copy())
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Converts to JSON, for the attributes that can be serialized.
    pub fn to_json(&self) -> Option<Value> {
        match self {
            AttrValue::None => Some(Value::Null),
            AttrValue::Bool(b) => Some(Value::Bool(*b)),
            AttrValue::Int(i) => Some(Value::from(*i)),
            AttrValue::Str(s) => Some(Value::from(s.as_str())),
            AttrValue::Dtype(dtype) => Some(Value::from(dtype.descriptor())),
            AttrValue::Shape(shape) => Some(Value::from(shape.clone())),
            AttrValue::Meta(meta) => Some(Value::Object(meta.clone())),
            AttrValue::Json(value) => Some(value.clone()),
            AttrValue::Table(_) | AttrValue::Indices(_) => None,
        }
    }
}

impl fmt::Debug for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::None => write!(f, "None"),
            AttrValue::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            AttrValue::Int(i) => f.debug_tuple("Int").field(i).finish(),
            AttrValue::Str(s) => f.debug_tuple("Str").field(s).finish(),
            AttrValue::Dtype(dtype) => f.debug_tuple("Dtype").field(dtype).finish(),
            AttrValue::Shape(shape) => f.debug_tuple("Shape").field(shape).finish(),
            AttrValue::Meta(meta) => f.debug_tuple("Meta").field(meta).finish(),
            AttrValue::Json(value) => f.debug_tuple("Json").field(value).finish(),
            AttrValue::Table(table) => write!(f, "Table({:p})", Rc::as_ptr(table)),
            AttrValue::Indices(indices) => write!(f, "Indices(len={})", indices.len()),
        }
    }
}

impl PartialEq for AttrValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AttrValue::None, AttrValue::None) => true,
            (AttrValue::Bool(a), AttrValue::Bool(b)) => a == b,
            (AttrValue::Int(a), AttrValue::Int(b)) => a == b,
            (AttrValue::Str(a), AttrValue::Str(b)) => a == b,
            (AttrValue::Dtype(a), AttrValue::Dtype(b)) => a == b,
            (AttrValue::Shape(a), AttrValue::Shape(b)) => a == b,
            (AttrValue::Meta(a), AttrValue::Meta(b)) => a == b,
            (AttrValue::Json(a), AttrValue::Json(b)) => a == b,
            (AttrValue::Table(a), AttrValue::Table(b)) => Rc::ptr_eq(a, b),
            (AttrValue::Indices(a), AttrValue::Indices(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| Rc::ptr_eq(x, y))
            }
            _ => false,
        }
    }
}

/// Formats a shape the way tuples print: `()`, `(2,)`, `(2, 3)`.
pub(crate) fn format_shape(shape: &[usize]) -> String {
    match shape {
        [] => "()".to_string(),
        [n] => format!("({n},)"),
        dims => format!("({})", dims.iter().join(", ")),
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::None => Ok(()),
            AttrValue::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            AttrValue::Int(i) => write!(f, "{i}"),
            AttrValue::Str(s) => write!(f, "{s}"),
            AttrValue::Dtype(dtype) => match dtype_info_name(dtype) {
                Ok(name) => write!(f, "{name}"),
                Err(_) => write!(f, "{dtype}"),
            },
            AttrValue::Shape(shape) => write!(f, "{}", format_shape(shape)),
            AttrValue::Meta(meta) => write!(f, "{}", Value::Object(meta.clone())),
            AttrValue::Json(value) => write!(f, "{value}"),
            AttrValue::Table(_) => write!(f, "<table>"),
            AttrValue::Indices(indices) => write!(f, "<{} indices>", indices.len()),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<DataType> for AttrValue {
    fn from(value: DataType) -> Self {
        AttrValue::Dtype(value)
    }
}

impl From<Vec<usize>> for AttrValue {
    fn from(value: Vec<usize>) -> Self {
        AttrValue::Shape(value)
    }
}

impl From<Meta> for AttrValue {
    fn from(value: Meta) -> Self {
        AttrValue::Meta(value)
    }
}

impl From<Value> for AttrValue {
    fn from(value: Value) -> Self {
        AttrValue::Json(value)
    }
}

impl From<Rc<dyn ParentTable>> for AttrValue {
    fn from(value: Rc<dyn ParentTable>) -> Self {
        AttrValue::Table(value)
    }
}

impl From<Vec<IndexRef>> for AttrValue {
    fn from(value: Vec<IndexRef>) -> Self {
        AttrValue::Indices(value)
    }
}

impl<T: Into<AttrValue>> From<Option<T>> for AttrValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(AttrValue::None, Into::into)
    }
}
