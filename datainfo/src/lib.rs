pub mod config;
pub mod context;
pub mod error;
pub mod format;
pub mod info;
pub mod memory;
pub mod merge;
pub mod parent;
pub mod selector;
pub mod summary;
pub mod types;
pub mod warnings;

pub use error::{Error, Result};
pub use info::{AttrName, AttrValue, DataInfo, InfoAccess, InfoOwner};
pub use parent::DataObject;
