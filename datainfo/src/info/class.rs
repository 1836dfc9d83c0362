//! Static description of an info flavour: which attributes it stores, which
//! it reads through to the parent, and which survive an info copy.

use itertools::Itertools;

use super::{AttrName, AttrValue, DataInfo};
use crate::error::Result;

/// A computed attribute that shadows dynamic lookup.
pub struct Property {
    pub name: &'static str,
    pub get: fn(&DataInfo) -> Result<AttrValue>,
    /// `None` makes the attribute read-only.
    pub set: Option<fn(&mut DataInfo, AttrValue) -> Result<()>>,
}

/// Per-type configuration of an info object.
pub struct InfoClass {
    /// Type name, used in error messages and the unbound marker.
    pub name: &'static str,
    /// Attributes the info object handles.
    pub attr_names: &'static [AttrName],
    /// Attributes read from and written to the parent object instead.
    pub attrs_from_parent: &'static [AttrName],
    /// Attributes never carried over when one info is assigned from another.
    pub attrs_no_copy: &'static [AttrName],
    pub properties: &'static [Property],
    /// Parent attributes making up the parent's dictionary representation.
    pub represent_as_dict_attrs: &'static [&'static str],
    /// Renaming the info renames the parent's column in its table.
    pub renames_in_table: bool,
}

impl InfoClass {
    pub fn property(&self, attr: &str) -> Option<&'static Property> {
        self.properties.iter().find(|p| p.name == attr)
    }

    pub fn handles(&self, attr: AttrName) -> bool {
        self.attr_names.contains(&attr)
    }

    pub fn delegates(&self, attr: AttrName) -> bool {
        self.attrs_from_parent.contains(&attr)
    }

    /// Attributes copied by info assignment, in vocabulary order.
    pub fn copied_attrs(&self) -> impl Iterator<Item = AttrName> + '_ {
        self.attr_names
            .iter()
            .copied()
            .filter(|a| !self.attrs_from_parent.contains(a) && !self.attrs_no_copy.contains(a))
    }

    /// Comma separated vocabulary, for error messages.
    pub(crate) fn allowed(&self) -> String {
        self.attr_names.iter().map(AttrName::as_str).join(", ")
    }
}

/// Info of a plain data object.
pub const DATA_INFO: InfoClass = InfoClass {
    name: "DataInfo",
    attr_names: AttrName::DATA,
    attrs_from_parent: &[],
    attrs_no_copy: &[],
    properties: &[],
    represent_as_dict_attrs: &[],
    renames_in_table: false,
};

/// Info of anything that can be a table column.
pub const BASE_COLUMN_INFO: InfoClass = InfoClass {
    name: "BaseColumnInfo",
    attr_names: AttrName::COLUMN,
    attrs_no_copy: &[AttrName::ParentTable],
    ..DATA_INFO
};

/// Info of a column-like wrapped value living in a table.
pub const MIXIN_INFO: InfoClass = InfoClass {
    name: "MixinInfo",
    renames_in_table: true,
    ..BASE_COLUMN_INFO
};

/// Mixin info taking its element type from the parent.
pub const PARENT_DTYPE_INFO: InfoClass = InfoClass {
    name: "ParentDtypeInfo",
    attrs_from_parent: &[AttrName::Dtype],
    ..MIXIN_INFO
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copied_attrs() {
        let copied = PARENT_DTYPE_INFO.copied_attrs().collect_vec();
        assert!(!copied.contains(&AttrName::Dtype));
        assert!(!copied.contains(&AttrName::ParentTable));
        assert!(copied.contains(&AttrName::Indices));
        assert_eq!(DATA_INFO.copied_attrs().count(), 6);
    }

    #[test]
    fn test_class_chain() {
        assert!(MIXIN_INFO.renames_in_table);
        assert!(PARENT_DTYPE_INFO.renames_in_table);
        assert!(!BASE_COLUMN_INFO.renames_in_table);
        assert!(PARENT_DTYPE_INFO.delegates(AttrName::Dtype));
        assert!(!DATA_INFO.handles(AttrName::Indices));
    }
}
