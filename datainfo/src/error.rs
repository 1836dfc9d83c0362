use snafu::prelude::*;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("cannot set unbound descriptor on {owner}"))]
    UnboundWrite { owner: &'static str },
    #[snafu(display("attribute '{attr}' must be one of {allowed}"))]
    UnrecognizedAttribute { attr: String, allowed: String },
    #[snafu(display("'{class}' object has no attribute '{attr}'"))]
    AttributeNotFound { class: String, attr: String },
    #[snafu(display("can't set attribute '{attr}'"))]
    ReadOnlyAttribute { attr: String },
    #[snafu(display("attribute '{attr}' expected a {expected} value, got {actual}"))]
    TypeMismatch {
        attr: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[snafu(display("columns have different shapes"))]
    MergeShapeMismatch,
    #[snafu(display("{message}"))]
    MergeConflict { message: String },
    #[snafu(display("Arrays have incompatible types {types:?}"))]
    IncompatibleTypes { types: Vec<String> },
    #[snafu(display("metadata_conflicts must be one of 'warn', 'error' or 'silent', got '{value}'"))]
    InvalidConflictPolicy { value: String },
    #[snafu(display("cannot merge attributes of an empty column list"))]
    EmptyMerge,
    #[snafu(display("option={option} is not an allowed information type"))]
    UnknownSummaryOption { option: String },
    #[snafu(display("data type not understood: '{descriptor}'"))]
    InvalidDataType { descriptor: String },
    #[snafu(display("invalid column name: {reason}"))]
    InvalidColumnName { reason: String },
    #[snafu(display("info object is not attached to a live parent"))]
    DetachedParent,
    #[snafu(display("{operation} is not supported for {class}"))]
    Unsupported {
        operation: String,
        class: String,
    },
    #[snafu(display("{message}"))]
    Evaluation { message: String },
    #[snafu(display("index operation failed: {message}"))]
    Index { message: String },
    #[snafu(display("failed to write summary: {source}"))]
    Io { source: std::io::Error },
    #[snafu(whatever, display("{message}"))]
    Whatever {
        /// The error message.
        message: String,
        /// The underying error.
        #[snafu(source(from(Box<dyn std::error::Error + Send + Sync>, Some)))]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
