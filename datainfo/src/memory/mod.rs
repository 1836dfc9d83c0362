//! In-memory data objects usable with info objects:
//! - a column [`MemColumn`] with optional mask and multidimensional rows,
//! - a column-like [`MemQuantity`] taking dtype and unit from itself,
//! - a table [`MemTable`] owning named columns,
//! - a sorted row index [`MemIndex`].

mod column;
mod index;
mod mixin;
mod table;

pub use column::{MEM_COLUMN_INFO, MemColumn};
pub use index::MemIndex;
pub use mixin::{MEM_QUANTITY_INFO, MemQuantity};
pub use table::MemTable;
