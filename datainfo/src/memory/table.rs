use std::{cell::RefCell, rc::Rc};

use indexmap::IndexMap;
use snafu::prelude::*;
use tracing::debug;

use crate::{
    error::{InvalidColumnNameSnafu, Result},
    format::DefaultFormatter,
    info::{AttrName, AttrValue, InfoAccess},
    parent::{ColumnFormatter, DataObject, ParentTable},
};

/// A table owning an ordered set of named columns.
pub struct MemTable {
    columns: RefCell<IndexMap<String, Rc<dyn DataObject>>>,
    formatter: Rc<dyn ColumnFormatter>,
}

impl MemTable {
    pub fn new() -> Rc<Self> {
        Self::with_formatter(Rc::new(DefaultFormatter))
    }

    pub fn with_formatter(formatter: Rc<dyn ColumnFormatter>) -> Rc<Self> {
        Rc::new(Self {
            columns: RefCell::new(IndexMap::new()),
            formatter,
        })
    }

    /// Adds `column` under `name`, naming the column and pointing its info at
    /// this table.
    pub fn add_column(self: &Rc<Self>, name: &str, column: Rc<dyn DataObject>) -> Result<()> {
        ensure!(
            !self.columns.borrow().contains_key(name),
            InvalidColumnNameSnafu {
                reason: format!("column '{name}' already exists")
            }
        );
        {
            let mut info = column.info_mut();
            info.set(AttrName::Name.as_str(), name)?;
            let table: Rc<dyn ParentTable> = self.clone();
            info.set(AttrName::ParentTable.as_str(), table)?;
        }
        self.columns.borrow_mut().insert(name.to_string(), column);
        Ok(())
    }

    /// Takes the column out of the table; its info no longer refers to the table.
    pub fn remove_column(&self, name: &str) -> Result<Option<Rc<dyn DataObject>>> {
        let removed = self.columns.borrow_mut().shift_remove(name);
        if let Some(column) = &removed {
            column
                .info_mut()
                .set(AttrName::ParentTable.as_str(), AttrValue::None)?;
        }
        Ok(removed)
    }

    pub fn column(&self, name: &str) -> Option<Rc<dyn DataObject>> {
        self.columns.borrow().get(name).cloned()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.columns.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.borrow().is_empty()
    }
}

impl ParentTable for MemTable {
    fn formatter(&self) -> Rc<dyn ColumnFormatter> {
        self.formatter.clone()
    }

    fn rename_column(&self, old: &str, new: &str) -> Result<()> {
        if old == new {
            return Ok(());
        }
        let mut columns = self.columns.borrow_mut();
        ensure!(
            !columns.contains_key(new),
            InvalidColumnNameSnafu {
                reason: format!("column '{new}' already exists")
            }
        );
        let Some((position, _, column)) = columns.shift_remove_full(old) else {
            return InvalidColumnNameSnafu {
                reason: format!("no column named '{old}'"),
            }
            .fail();
        };
        debug!("table column {} renamed to {}", old, new);
        columns.shift_insert(position, new.to_string(), column);
        Ok(())
    }
}
