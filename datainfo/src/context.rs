//! Serialization context shared by every column info object.
//!
//! Writers for a given format enter a context so that downstream code (for
//! instance a time column deciding how to represent itself) can ask which
//! format it is being serialized into without threading the answer through
//! every call.

use std::{
    fmt,
    str::FromStr,
    sync::{Arc, PoisonError, RwLock},
};

use tracing::debug;

/// Format a column is currently being serialized into.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SerializeContext {
    Fits,
    Hdf5,
    Ecsv,
    Yaml,
    Other(Arc<str>),
}

impl fmt::Display for SerializeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerializeContext::Fits => write!(f, "fits"),
            SerializeContext::Hdf5 => write!(f, "hdf5"),
            SerializeContext::Ecsv => write!(f, "ecsv"),
            SerializeContext::Yaml => write!(f, "yaml"),
            SerializeContext::Other(name) => write!(f, "{name}"),
        }
    }
}

impl FromStr for SerializeContext {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "fits" => SerializeContext::Fits,
            "hdf5" => SerializeContext::Hdf5,
            "ecsv" => SerializeContext::Ecsv,
            "yaml" => SerializeContext::Yaml,
            other => SerializeContext::Other(Arc::from(other)),
        })
    }
}

impl From<&str> for SerializeContext {
    fn from(value: &str) -> Self {
        match value.parse() {
            Ok(context) => context,
            Err(never) => match never {},
        }
    }
}

impl PartialEq<&str> for SerializeContext {
    fn eq(&self, other: &&str) -> bool {
        self.to_string() == *other
    }
}

static SERIALIZE_CONTEXT: RwLock<Option<SerializeContext>> = RwLock::new(None);

/// The context entered by the innermost live [`SerializeContextGuard`].
pub fn serialize_context() -> Option<SerializeContext> {
    SERIALIZE_CONTEXT
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

fn replace_context(context: Option<SerializeContext>) -> Option<SerializeContext> {
    let mut current = SERIALIZE_CONTEXT
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    std::mem::replace(&mut *current, context)
}

/// Restores the previous serialization context when dropped.
///
/// The context is process-wide, so concurrent serializations into different
/// formats need external synchronization.
#[must_use = "the context is restored as soon as the guard is dropped"]
pub struct SerializeContextGuard {
    previous: Option<SerializeContext>,
}

impl fmt::Debug for SerializeContextGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializeContextGuard")
            .field("previous", &self.previous)
            .finish()
    }
}

impl Drop for SerializeContextGuard {
    fn drop(&mut self) {
        let restored = self.previous.take();
        debug!(context = ?restored, "restore serialize context");
        replace_context(restored);
    }
}

/// Sets the serialization context until the returned guard is dropped.
pub fn serialize_context_as(context: impl Into<SerializeContext>) -> SerializeContextGuard {
    let context = context.into();
    debug!(%context, "enter serialize context");
    SerializeContextGuard {
        previous: replace_context(Some(context)),
    }
}

/// Runs `f` with the serialization context set to `context`.
pub fn with_serialize_context<R>(context: impl Into<SerializeContext>, f: impl FnOnce() -> R) -> R {
    let _guard = serialize_context_as(context);
    f()
}
