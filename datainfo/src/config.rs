//! Process-wide tunables for info objects.
//!
//! Behavior is configurable via environment variables, read once the first
//! time [`config`] is called.

use std::sync::LazyLock;

use crate::merge::MergeConflicts;

/// Configuration for info object operations.
#[derive(Debug, Clone)]
pub struct InfoConfig {
    /// Fraction of retained rows at or below which sliced row indices are
    /// rebuilt instead of relabelled.
    pub index_rebuild_threshold: f64,
    /// Conflict policy used by `MergeConflicts::default()`.
    pub metadata_conflicts: MergeConflicts,
}

impl InfoConfig {
    pub const DEFAULT_INDEX_REBUILD_THRESHOLD: f64 = 0.6;
}

impl Default for InfoConfig {
    fn default() -> Self {
        Self {
            index_rebuild_threshold: std::env::var("DATAINFO_INDEX_REBUILD_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v: &f64| (0.0..=1.0).contains(v))
                .unwrap_or(Self::DEFAULT_INDEX_REBUILD_THRESHOLD),
            metadata_conflicts: std::env::var("DATAINFO_METADATA_CONFLICTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(MergeConflicts::Warn),
        }
    }
}

static CONFIG: LazyLock<InfoConfig> = LazyLock::new(InfoConfig::default);

/// The configuration shared by every info object in the process.
pub fn config() -> &'static InfoConfig {
    &CONFIG
}
