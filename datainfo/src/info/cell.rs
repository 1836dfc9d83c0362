use std::{
    cell::{OnceCell, Ref, RefCell, RefMut},
    rc::{Rc, Weak},
};

use snafu::prelude::*;
use tracing::debug;

use super::{DataInfo, InfoClass};
use crate::{error::Result, parent::DataObject};

/// Slot a data object keeps its info in. Empty until the info is first
/// accessed through [`InfoAccess`].
#[derive(Default)]
pub struct InfoCell(OnceCell<RefCell<DataInfo>>);

impl InfoCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_bound(&self) -> bool {
        self.0.get().is_some()
    }

    fn get_or_bind(
        &self,
        class: &'static InfoClass,
        parent: impl FnOnce() -> Weak<dyn DataObject>,
    ) -> &RefCell<DataInfo> {
        self.0.get_or_init(|| {
            debug!("binding {} info", class.name);
            RefCell::new(DataInfo::bound(class, Some(parent())))
        })
    }
}

/// Instance-level access to the info of a shared data object.
pub trait InfoAccess {
    /// The bound info, created on first access.
    fn info(&self) -> Ref<'_, DataInfo>;

    fn info_mut(&self) -> RefMut<'_, DataInfo>;

    /// Replaces the info with a copy of `info`.
    fn set_info(&self, info: &DataInfo) -> Result<()>;
}

fn info_slot<'a>(
    object: &'a dyn DataObject,
    parent: impl FnOnce() -> Weak<dyn DataObject>,
) -> &'a RefCell<DataInfo> {
    object
        .info_cell()
        .get_or_bind(object.info_class(), parent)
}

fn assign(slot: &RefCell<DataInfo>, source: &DataInfo) -> Result<()> {
    let Ok(mut target) = slot.try_borrow_mut() else {
        whatever!("info is borrowed and cannot be replaced");
    };
    target.assign_from(source)
}

impl<T: DataObject + 'static> InfoAccess for Rc<T> {
    fn info(&self) -> Ref<'_, DataInfo> {
        info_slot(&**self, || {
            let weak: Weak<dyn DataObject> = Rc::<T>::downgrade(self);
            weak
        })
        .borrow()
    }

    fn info_mut(&self) -> RefMut<'_, DataInfo> {
        info_slot(&**self, || {
            let weak: Weak<dyn DataObject> = Rc::<T>::downgrade(self);
            weak
        })
        .borrow_mut()
    }

    fn set_info(&self, info: &DataInfo) -> Result<()> {
        let slot = info_slot(&**self, || {
            let weak: Weak<dyn DataObject> = Rc::<T>::downgrade(self);
            weak
        });
        assign(slot, info)
    }
}

impl InfoAccess for Rc<dyn DataObject> {
    fn info(&self) -> Ref<'_, DataInfo> {
        info_slot(&**self, || Rc::downgrade(self)).borrow()
    }

    fn info_mut(&self) -> RefMut<'_, DataInfo> {
        info_slot(&**self, || Rc::downgrade(self)).borrow_mut()
    }

    fn set_info(&self, info: &DataInfo) -> Result<()> {
        assign(info_slot(&**self, || Rc::downgrade(self)), info)
    }
}

/// Data types carrying an info object.
pub trait InfoOwner: DataObject + Sized + 'static {
    const INFO_CLASS: &'static InfoClass;

    /// The type-level info, which describes the type rather than any instance.
    fn type_info() -> DataInfo {
        DataInfo::unbound(Self::INFO_CLASS, short_type_name::<Self>())
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

/// The info of `object` if it has been bound already and is not being
/// modified.
pub fn bound_info(object: &dyn DataObject) -> Option<Ref<'_, DataInfo>> {
    object.info_cell().0.get()?.try_borrow().ok()
}
