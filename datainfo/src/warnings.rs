//! Runtime warnings raised while evaluating data, with scoped filters.
//!
//! Statistics over empty or all-NaN data produce warnings that are expected
//! when summarizing a column. Summaries suppress exactly those; every other
//! warning reaches the log (or an active recorder).

use std::{cell::RefCell, fmt};

use tracing::warn as log_warn;

/// Message prefixes of the warnings a summary expects and silences.
pub const IGNORE_WARNINGS: &[&str] = &[
    "All-NaN",
    "Mean of empty slice",
    "Degrees of freedom <= 0",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataWarning {
    AllNanSlice,
    MeanOfEmptySlice,
    DegreesOfFreedom,
    MergeConflict(String),
    Other(String),
}

impl fmt::Display for DataWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataWarning::AllNanSlice => write!(f, "All-NaN slice encountered"),
            DataWarning::MeanOfEmptySlice => write!(f, "Mean of empty slice"),
            DataWarning::DegreesOfFreedom => write!(f, "Degrees of freedom <= 0 for slice."),
            DataWarning::MergeConflict(message) | DataWarning::Other(message) => {
                write!(f, "{message}")
            }
        }
    }
}

thread_local! {
    static FILTERS: RefCell<Vec<&'static [&'static str]>> = const { RefCell::new(Vec::new()) };
    static RECORDERS: RefCell<Vec<Vec<DataWarning>>> = const { RefCell::new(Vec::new()) };
}

fn is_suppressed(message: &str) -> bool {
    FILTERS.with_borrow(|filters| {
        filters
            .iter()
            .any(|patterns| patterns.iter().any(|p| message.starts_with(p)))
    })
}

/// Raises a data warning.
pub fn warn(warning: DataWarning) {
    let message = warning.to_string();
    if is_suppressed(&message) {
        return;
    }
    let recorded = RECORDERS.with_borrow_mut(|recorders| match recorders.last_mut() {
        Some(recorder) => {
            recorder.push(warning);
            true
        }
        None => false,
    });
    if !recorded {
        log_warn!(%message, "data warning");
    }
}

struct FilterGuard;

impl Drop for FilterGuard {
    fn drop(&mut self) {
        FILTERS.with_borrow_mut(|filters| filters.pop());
    }
}

/// Runs `f` with warnings whose message starts with one of `patterns` ignored.
pub fn suppress<R>(patterns: &'static [&'static str], f: impl FnOnce() -> R) -> R {
    FILTERS.with_borrow_mut(|filters| filters.push(patterns));
    let _guard = FilterGuard;
    f()
}

struct RecordGuard;

impl Drop for RecordGuard {
    fn drop(&mut self) {
        RECORDERS.with_borrow_mut(|recorders| recorders.pop());
    }
}

/// Runs `f` and returns the warnings it raised instead of logging them.
pub fn record<R>(f: impl FnOnce() -> R) -> (R, Vec<DataWarning>) {
    RECORDERS.with_borrow_mut(|recorders| recorders.push(Vec::new()));
    let guard = RecordGuard;
    let out = f();
    let warnings = RECORDERS
        .with_borrow_mut(|recorders| recorders.last_mut().map(std::mem::take))
        .unwrap_or_default();
    drop(guard);
    (out, warnings)
}
