//! The info container attached to data objects.
//!
//! A [`DataInfo`] is either *unbound*, describing the data type as a whole,
//! or *bound* to one data object, in which case it stores that object's
//! attributes and reads some of them through to the object itself. The
//! container never keeps its parent or the parent's table alive.

mod attrs;
mod cell;
pub mod class;
pub mod column;
pub mod describe;

use std::{
    fmt,
    rc::{Rc, Weak},
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use tracing::debug;

pub use self::{
    attrs::{AttrName, AttrValue, Meta},
    cell::{InfoAccess, InfoCell, InfoOwner, bound_info},
    class::{InfoClass, Property},
};
pub(crate) use self::attrs::format_shape;
use crate::{
    error::{
        AttributeNotFoundSnafu, DetachedParentSnafu, InvalidColumnNameSnafu,
        ReadOnlyAttributeSnafu, Result, TypeMismatchSnafu, UnboundWriteSnafu,
        UnrecognizedAttributeSnafu,
    },
    parent::{DataObject, FromRepresentation, IndexRef, ParentTable},
    summary::obj_attrs_map,
    types::DataType,
};

/// A stored attribute. The owning table is held weakly.
#[derive(Clone)]
enum Slot {
    Value(AttrValue),
    Table(Weak<dyn ParentTable>),
}

enum InfoState {
    Unbound {
        owner: &'static str,
    },
    Bound {
        attrs: IndexMap<AttrName, Slot>,
        internals: IndexMap<String, AttrValue>,
        parent: Option<Weak<dyn DataObject>>,
    },
}

pub struct DataInfo {
    class: &'static InfoClass,
    state: InfoState,
}

/// The serializable attributes of a bound info.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InfoSnapshot {
    pub name: Option<String>,
    pub unit: Option<String>,
    pub dtype: Option<DataType>,
    pub format: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub meta: Option<Meta>,
}

/// Validates a name about to become a table column name.
pub fn fix_column_name(value: &AttrValue) -> Result<String> {
    let AttrValue::Str(name) = value else {
        return TypeMismatchSnafu {
            attr: "name",
            expected: "str",
            actual: value.kind_name(),
        }
        .fail();
    };
    ensure!(
        !name.is_empty(),
        InvalidColumnNameSnafu {
            reason: "column names cannot be empty"
        }
    );
    Ok(name.clone())
}

impl DataInfo {
    /// Type-level info of a data type whose instances use `class`.
    pub fn unbound(class: &'static InfoClass, owner: &'static str) -> Self {
        Self {
            class,
            state: InfoState::Unbound { owner },
        }
    }

    /// A fresh bound info, every attribute unset.
    pub fn bound(class: &'static InfoClass, parent: Option<Weak<dyn DataObject>>) -> Self {
        let attrs = class
            .attr_names
            .iter()
            .map(|attr| (*attr, Slot::Value(AttrValue::None)))
            .collect();
        Self {
            class,
            state: InfoState::Bound {
                attrs,
                internals: IndexMap::new(),
                parent,
            },
        }
    }

    pub fn class(&self) -> &'static InfoClass {
        self.class
    }

    pub fn is_bound(&self) -> bool {
        matches!(self.state, InfoState::Bound { .. })
    }

    /// The data object this info describes, if it is still alive.
    pub fn parent(&self) -> Result<Rc<dyn DataObject>> {
        match &self.state {
            InfoState::Bound {
                parent: Some(parent),
                ..
            } => parent.upgrade().context(DetachedParentSnafu),
            _ => DetachedParentSnafu.fail(),
        }
    }

    fn not_found(&self, attr: &str) -> crate::Error {
        let class = match &self.state {
            InfoState::Unbound { owner } => format!("{} of {owner}", self.class.name),
            InfoState::Bound { .. } => self.class.name.to_string(),
        };
        AttributeNotFoundSnafu { class, attr }.build()
    }

    /// Reads attribute `attr`.
    pub fn get(&self, attr: &str) -> Result<AttrValue> {
        let InfoState::Bound {
            attrs, internals, ..
        } = &self.state
        else {
            return Err(self.not_found(attr));
        };
        if let Some(property) = self.class.property(attr) {
            return (property.get)(self);
        }
        if attr.starts_with('_') {
            return internals.get(attr).cloned().ok_or_else(|| self.not_found(attr));
        }
        let name = AttrName::parse(attr).filter(|name| self.class.handles(*name));
        let Some(name) = name else {
            return Err(self.not_found(attr));
        };
        if self.class.delegates(name) {
            return self.parent()?.get_attr(attr);
        }
        let value = match attrs.get(&name) {
            Some(Slot::Value(value)) => value.clone(),
            Some(Slot::Table(table)) => table.upgrade().map_or(AttrValue::None, AttrValue::Table),
            None => return Err(self.not_found(attr)),
        };
        match (name, value) {
            (AttrName::Dtype, AttrValue::None) => Ok(AttrValue::Dtype(DataType::Object)),
            (_, value) => Ok(value),
        }
    }

    /// Writes attribute `attr`.
    pub fn set(&mut self, attr: &str, value: impl Into<AttrValue>) -> Result<()> {
        let value = value.into();
        if let InfoState::Unbound { owner } = self.state {
            return UnboundWriteSnafu { owner }.fail();
        }
        if self.class.renames_in_table && attr == AttrName::Name.as_str() {
            self.rename_in_table(&value)?;
        }

        let name = AttrName::parse(attr).filter(|name| self.class.handles(*name));
        let property = self.class.property(attr);
        if property.is_none() && name.is_some_and(|name| self.class.delegates(name)) {
            return self.parent()?.set_attr(attr, value);
        }
        if let Some(property) = property {
            return match property.set {
                Some(set) => set(self, value),
                None => ReadOnlyAttributeSnafu { attr }.fail(),
            };
        }
        if attr.starts_with('_') {
            if let InfoState::Bound { internals, .. } = &mut self.state {
                internals.insert(attr.to_string(), value);
            }
            return Ok(());
        }
        let Some(name) = name else {
            return UnrecognizedAttributeSnafu {
                attr,
                allowed: self.class.allowed(),
            }
            .fail();
        };
        self.store(name, value)
    }

    /// Renames the parent's column in its table before the name changes.
    fn rename_in_table(&self, value: &AttrValue) -> Result<()> {
        let Some(table) = self.parent_table()? else {
            return Ok(());
        };
        let new_name = fix_column_name(value)?;
        let old_name = self.name()?.unwrap_or_default();
        debug!("renaming column {} to {} in parent table", old_name, new_name);
        table.rename_column(&old_name, &new_name)
    }

    fn store(&mut self, name: AttrName, value: AttrValue) -> Result<()> {
        let slot = match (name, value) {
            (AttrName::ParentTable, AttrValue::Table(table)) => Slot::Table(Rc::downgrade(&table)),
            (AttrName::ParentTable, AttrValue::None) => Slot::Value(AttrValue::None),
            (AttrName::Dtype, AttrValue::Str(descriptor)) => {
                Slot::Value(AttrValue::Dtype(descriptor.parse()?))
            }
            (name, value) => {
                check_kind(name, &value)?;
                Slot::Value(value)
            }
        };
        if let InfoState::Bound { attrs, .. } = &mut self.state {
            attrs.insert(name, slot);
        }
        Ok(())
    }

    /// Replaces this info's attributes with deep copies of `source`'s,
    /// skipping the delegated and no-copy attributes of this info's class.
    /// Attributes outside `source`'s vocabulary are left unset; any other
    /// read failure, including an unbound `source`, leaves this info as is.
    pub fn assign_from(&mut self, source: &DataInfo) -> Result<()> {
        let parent = match &self.state {
            InfoState::Bound { parent, .. } => parent.clone(),
            InfoState::Unbound { owner } => return UnboundWriteSnafu { owner: *owner }.fail(),
        };
        let mut fresh = DataInfo::bound(self.class, parent);
        for attr in self.class.copied_attrs() {
            let value = match source.get(attr.as_str()) {
                Ok(value) => value,
                Err(crate::Error::AttributeNotFound { .. })
                    if source.is_bound() && !source.class.handles(attr) =>
                {
                    AttrValue::None
                }
                Err(err) => return Err(err),
            };
            fresh.store(attr, value.deep_copy())?;
        }
        *self = fresh;
        Ok(())
    }

    fn get_str(&self, attr: AttrName) -> Result<Option<String>> {
        match self.get(attr.as_str())? {
            AttrValue::None => Ok(None),
            AttrValue::Str(s) => Ok(Some(s)),
            other => TypeMismatchSnafu {
                attr: attr.as_str(),
                expected: "str",
                actual: other.kind_name(),
            }
            .fail(),
        }
    }

    pub fn name(&self) -> Result<Option<String>> {
        self.get_str(AttrName::Name)
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<()> {
        self.set(AttrName::Name.as_str(), name.into())
    }

    pub fn unit(&self) -> Result<Option<String>> {
        self.get_str(AttrName::Unit)
    }

    pub fn format(&self) -> Result<Option<String>> {
        self.get_str(AttrName::Format)
    }

    pub fn description(&self) -> Result<Option<String>> {
        self.get_str(AttrName::Description)
    }

    pub fn dtype(&self) -> Result<DataType> {
        match self.get(AttrName::Dtype.as_str())? {
            AttrValue::Dtype(dtype) => Ok(dtype),
            AttrValue::None => Ok(DataType::Object),
            other => TypeMismatchSnafu {
                attr: "dtype",
                expected: "dtype",
                actual: other.kind_name(),
            }
            .fail(),
        }
    }

    pub fn meta(&self) -> Result<Option<Meta>> {
        match self.get(AttrName::Meta.as_str())? {
            AttrValue::Meta(meta) => Ok(Some(meta)),
            _ => Ok(None),
        }
    }

    /// The owning table, if it is still alive.
    pub fn parent_table(&self) -> Result<Option<Rc<dyn ParentTable>>> {
        if !self.class.handles(AttrName::ParentTable) {
            return Ok(None);
        }
        match self.get(AttrName::ParentTable.as_str())? {
            AttrValue::Table(table) => Ok(Some(table)),
            _ => Ok(None),
        }
    }

    pub fn indices(&self) -> Result<Vec<IndexRef>> {
        if !self.class.handles(AttrName::Indices) {
            return Ok(Vec::new());
        }
        match self.get(AttrName::Indices.as_str())? {
            AttrValue::Indices(indices) => Ok(indices),
            _ => Ok(Vec::new()),
        }
    }

    pub fn set_indices(&mut self, indices: Vec<IndexRef>) -> Result<()> {
        self.set(AttrName::Indices.as_str(), indices)
    }

    /// Whether slicing the parent carries its row indices over.
    pub fn copy_indices(&self) -> bool {
        self.get("_copy_indices")
            .ok()
            .and_then(|value| value.as_bool())
            .unwrap_or(true)
    }

    pub fn set_copy_indices(&mut self, copy: bool) -> Result<()> {
        self.set("_copy_indices", copy)
    }

    /// The parent's attributes making up its dictionary representation,
    /// leaving out unset ones.
    pub fn represent_as_dict(&self) -> Result<IndexMap<String, AttrValue>> {
        let parent = self.parent()?;
        Ok(obj_attrs_map(&*parent, self.class.represent_as_dict_attrs))
    }

    /// Rebuilds a parent object from its dictionary representation.
    pub fn construct_from_dict<T: FromRepresentation>(
        &self,
        map: IndexMap<String, AttrValue>,
    ) -> Result<T> {
        T::construct_from_dict(map)
    }

    /// Captures the serializable attributes.
    pub fn snapshot(&self) -> Result<InfoSnapshot> {
        Ok(InfoSnapshot {
            name: self.name()?,
            unit: self.unit()?,
            dtype: self.stored_dtype()?,
            format: self.format()?,
            description: self.description()?,
            meta: self.meta()?,
        })
    }

    /// The element type as set, without the `Object` fallback for an unset one.
    fn stored_dtype(&self) -> Result<Option<DataType>> {
        if self.class.delegates(AttrName::Dtype) {
            return self.dtype().map(Some);
        }
        match &self.state {
            InfoState::Bound { attrs, .. } => match attrs.get(&AttrName::Dtype) {
                Some(Slot::Value(AttrValue::Dtype(dtype))) => Ok(Some(*dtype)),
                _ => Ok(None),
            },
            InfoState::Unbound { .. } => Err(self.not_found(AttrName::Dtype.as_str())),
        }
    }

    /// Restores attributes captured by [`DataInfo::snapshot`].
    pub fn restore(&mut self, snapshot: InfoSnapshot) -> Result<()> {
        let InfoSnapshot {
            name,
            unit,
            dtype,
            format,
            description,
            meta,
        } = snapshot;
        let values = [
            (AttrName::Name, AttrValue::from(name)),
            (AttrName::Unit, AttrValue::from(unit)),
            (AttrName::Dtype, AttrValue::from(dtype)),
            (AttrName::Format, AttrValue::from(format)),
            (AttrName::Description, AttrValue::from(description)),
            (AttrName::Meta, AttrValue::from(meta)),
        ];
        for (name, value) in values {
            if self.class.delegates(name) {
                continue;
            }
            self.store(name, value)?;
        }
        Ok(())
    }
}

fn check_kind(name: AttrName, value: &AttrValue) -> Result<()> {
    let expected = match (name, value) {
        (_, AttrValue::None) => return Ok(()),
        (
            AttrName::Name | AttrName::Unit | AttrName::Format | AttrName::Description,
            AttrValue::Str(_),
        )
        | (AttrName::Dtype, AttrValue::Dtype(_))
        | (AttrName::Meta, AttrValue::Meta(_))
        | (AttrName::Indices, AttrValue::Indices(_)) => return Ok(()),
        (AttrName::Name | AttrName::Unit | AttrName::Format | AttrName::Description, _) => "str",
        (AttrName::Dtype, _) => "dtype",
        (AttrName::Meta, _) => "meta",
        (AttrName::ParentTable, _) => "table",
        (AttrName::Indices, _) => "indices",
    };
    TypeMismatchSnafu {
        attr: name.as_str(),
        expected,
        actual: value.kind_name(),
    }
    .fail()
}

impl fmt::Display for DataInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            InfoState::Unbound { owner } => write!(f, "<{} unbound for {owner}>", self.class.name),
            InfoState::Bound { .. } => match self.describe() {
                Ok(text) => write!(f, "{text}"),
                Err(_) => write!(f, "<{} detached>", self.class.name),
            },
        }
    }
}

impl fmt::Debug for DataInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("DataInfo");
        s.field("class", &self.class.name);
        match &self.state {
            InfoState::Unbound { owner } => s.field("unbound", owner),
            InfoState::Bound { attrs, .. } => s.field(
                "attrs",
                &attrs
                    .iter()
                    .map(|(name, slot)| match slot {
                        Slot::Value(value) => (name.as_str(), value.to_string()),
                        Slot::Table(_) => (name.as_str(), "<table>".to_string()),
                    })
                    .collect::<Vec<_>>(),
            ),
        };
        s.finish()
    }
}
