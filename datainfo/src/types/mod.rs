//! A small element type system for the values an info object describes.
//!
//! The naming follows the array-library convention where text types carry
//! their width in bits (`str160` is five wide characters), which is why
//! [`dtype_info_name`] exists to present them in a human-oriented form.

pub mod value;

use std::{fmt, str::FromStr};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::{EmptyMergeSnafu, IncompatibleTypesSnafu, InvalidDataTypeSnafu, Result};

/// Element type descriptor of a data object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    /// Fixed-width byte string holding the given number of bytes.
    Bytes(usize),
    /// Fixed-width unicode string holding the given number of characters.
    Str(usize),
    /// Untyped storage of arbitrary values.
    Object,
}

/// Coarse grouping used to decide whether two types can share a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    Bool,
    Object,
    Number,
    Character,
}

/// Display names for fixed-width text types keyed by (wide characters, storage kind).
const STRING_TYPE_NAMES: [((bool, char), &str); 2] = [((false, 'S'), "bytes"), ((true, 'U'), "str")];

impl DataType {
    /// Single character classifier of the type.
    pub fn kind(&self) -> char {
        match self {
            DataType::Bool => 'b',
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => 'i',
            DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => 'u',
            DataType::Float32 | DataType::Float64 => 'f',
            DataType::Bytes(_) => 'S',
            DataType::Str(_) => 'U',
            DataType::Object => 'O',
        }
    }

    /// Size of one element in bytes.
    pub fn itemsize(&self) -> usize {
        match self {
            DataType::Bool | DataType::Int8 | DataType::UInt8 => 1,
            DataType::Int16 | DataType::UInt16 => 2,
            DataType::Int32 | DataType::UInt32 | DataType::Float32 => 4,
            DataType::Int64 | DataType::UInt64 | DataType::Float64 | DataType::Object => 8,
            DataType::Bytes(n) => *n,
            DataType::Str(n) => 4 * n,
        }
    }

    pub fn category(&self) -> TypeCategory {
        match self.kind() {
            'b' => TypeCategory::Bool,
            'O' => TypeCategory::Object,
            'S' | 'U' => TypeCategory::Character,
            _ => TypeCategory::Number,
        }
    }

    pub fn is_string(&self) -> bool {
        self.category() == TypeCategory::Character
    }

    /// Number of characters (or bytes) of a fixed-width text type.
    pub fn string_length(&self) -> Option<usize> {
        match self {
            DataType::Bytes(n) | DataType::Str(n) => Some(*n),
            _ => None,
        }
    }

    /// Library-native name, e.g. `int32`, `float64` or `str160`.
    pub fn name(&self) -> String {
        match self {
            DataType::Bool => "bool".to_string(),
            DataType::Bytes(_) | DataType::Str(_) => {
                let prefix = if self.kind() == 'U' { "str" } else { "bytes" };
                format!("{prefix}{}", 8 * self.itemsize())
            }
            DataType::Object => "object".to_string(),
            _ => {
                let prefix = match self.kind() {
                    'i' => "int",
                    'u' => "uint",
                    _ => "float",
                };
                format!("{prefix}{}", 8 * self.itemsize())
            }
        }
    }

    /// Byte-order qualified descriptor string, e.g. `<i4` or `<U5`.
    pub fn descriptor(&self) -> String {
        match self {
            DataType::Bytes(n) | DataType::Str(n) => {
                let order = if self.kind() == 'U' { '<' } else { '|' };
                format!("{order}{}{n}", self.kind())
            }
            DataType::Object => "|O".to_string(),
            _ => {
                let order = if self.itemsize() == 1 { '|' } else { '<' };
                format!("{order}{}{}", self.kind(), self.itemsize())
            }
        }
    }

    /// Smallest type every one of `types` can be represented in.
    ///
    /// Booleans, numbers, text and objects never mix: a list spanning more
    /// than one [`TypeCategory`] is rejected.
    pub fn common_supertype<I>(types: I) -> Result<DataType>
    where
        I: IntoIterator<Item = DataType>,
    {
        let types = types.into_iter().collect_vec();
        let Some(first) = types.first().copied() else {
            return EmptyMergeSnafu.fail();
        };
        if types.iter().map(DataType::category).unique().count() > 1 {
            return IncompatibleTypesSnafu {
                types: types.iter().map(dtype_info_name_of).collect_vec(),
            }
            .fail();
        }
        Ok(types[1..].iter().fold(first, |acc, ty| acc.promote(*ty)))
    }

    /// Promotes two types of the same category.
    fn promote(self, other: DataType) -> DataType {
        match self.category() {
            TypeCategory::Character => {
                let len = self.string_length().max(other.string_length()).unwrap_or(0);
                if self.kind() == 'U' || other.kind() == 'U' {
                    DataType::Str(len)
                } else {
                    DataType::Bytes(len)
                }
            }
            TypeCategory::Number => promote_numbers(self, other),
            _ => self,
        }
    }
}

fn int_of_size(bytes: usize, signed: bool) -> Option<DataType> {
    match (bytes, signed) {
        (1, true) => Some(DataType::Int8),
        (2, true) => Some(DataType::Int16),
        (4, true) => Some(DataType::Int32),
        (8, true) => Some(DataType::Int64),
        (1, false) => Some(DataType::UInt8),
        (2, false) => Some(DataType::UInt16),
        (4, false) => Some(DataType::UInt32),
        (8, false) => Some(DataType::UInt64),
        _ => None,
    }
}

fn promote_numbers(a: DataType, b: DataType) -> DataType {
    let larger = |x: DataType, y: DataType| if x.itemsize() >= y.itemsize() { x } else { y };
    match (a.kind(), b.kind()) {
        ('f', 'f') | ('i', 'i') | ('u', 'u') => larger(a, b),
        ('f', _) | (_, 'f') => {
            let (float, int) = if a.kind() == 'f' { (a, b) } else { (b, a) };
            // float32 holds 16 bit integers exactly, wider ones need float64.
            if int.itemsize() <= 2 {
                float
            } else {
                DataType::Float64
            }
        }
        _ => {
            let (signed, unsigned) = if a.kind() == 'i' { (a, b) } else { (b, a) };
            if signed.itemsize() > unsigned.itemsize() {
                signed
            } else {
                int_of_size(2 * unsigned.itemsize(), true).unwrap_or(DataType::Float64)
            }
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for DataType {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        let body = s.trim_start_matches(['<', '>', '=', '|']);
        let ty = match body {
            "bool" | "?" | "b1" => DataType::Bool,
            "int8" | "i1" => DataType::Int8,
            "int16" | "i2" => DataType::Int16,
            "int32" | "i4" => DataType::Int32,
            "int64" | "i8" | "int" => DataType::Int64,
            "uint8" | "u1" => DataType::UInt8,
            "uint16" | "u2" => DataType::UInt16,
            "uint32" | "u4" => DataType::UInt32,
            "uint64" | "u8" | "uint" => DataType::UInt64,
            "float32" | "f4" | "single" => DataType::Float32,
            "float64" | "f8" | "float" | "double" => DataType::Float64,
            "object" | "O" | "O8" => DataType::Object,
            "str" | "U" => DataType::Str(0),
            "bytes" | "S" => DataType::Bytes(0),
            _ => {
                let (kind, digits) = body.split_at(body.chars().next().map_or(0, char::len_utf8));
                let len = digits.parse::<usize>().ok();
                match (kind, len) {
                    ("U", Some(n)) => DataType::Str(n),
                    ("S" | "a", Some(n)) => DataType::Bytes(n),
                    _ => return InvalidDataTypeSnafu { descriptor: s }.fail(),
                }
            }
        };
        Ok(ty)
    }
}

/// Anything that can be turned into a [`DataType`].
pub trait AsDataType {
    fn as_data_type(&self) -> Result<DataType>;
}

impl AsDataType for DataType {
    fn as_data_type(&self) -> Result<DataType> {
        Ok(*self)
    }
}

impl AsDataType for str {
    fn as_data_type(&self) -> Result<DataType> {
        self.parse()
    }
}

impl AsDataType for String {
    fn as_data_type(&self) -> Result<DataType> {
        self.parse()
    }
}

impl AsDataType for value::ScalarValue {
    fn as_data_type(&self) -> Result<DataType> {
        Ok(self.data_type())
    }
}

impl<T: AsDataType + ?Sized> AsDataType for &T {
    fn as_data_type(&self) -> Result<DataType> {
        (**self).as_data_type()
    }
}

/// Returns a human-oriented name of `dtype`.
///
/// This is the native name except for fixed-width text types, which are
/// shown as `<kind-name><length>` where the length counts characters:
///
/// ```text
///   descriptor   S<N>       U<N>
///   name         bytes<N>   str<N>
/// ```
pub fn dtype_info_name<D: AsDataType + ?Sized>(dtype: &D) -> Result<String> {
    Ok(dtype_info_name_of(&dtype.as_data_type()?))
}

fn dtype_info_name_of(dtype: &DataType) -> String {
    let entry = STRING_TYPE_NAMES
        .iter()
        .find(|((_, kind), _)| *kind == dtype.kind());
    match (entry, dtype.string_length()) {
        (Some((_, type_name)), Some(length)) => format!("{type_name}{length}"),
        _ => dtype.name(),
    }
}
