//! Merging of attribute maps when columns are combined.
//!
//! Keys present on one side only are taken as-is. Metadata maps are merged
//! recursively (nested arrays are concatenated), equal values are kept, and
//! any other disagreement is a conflict handled per [`MergeConflicts`]; the
//! right-hand value wins whenever the merge proceeds.

use std::{fmt, str::FromStr};

use indexmap::IndexMap;
use serde_json::Value;

use crate::{
    config::config,
    error::{InvalidConflictPolicySnafu, MergeConflictSnafu, Result},
    info::{AttrValue, Meta},
    warnings::{self, DataWarning},
};

/// How to handle attributes that disagree between merged columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeConflicts {
    /// Raise a merge-conflict warning and keep going.
    Warn,
    /// Abort the merge.
    Error,
    /// Keep going without telling anyone.
    Silent,
}

impl Default for MergeConflicts {
    fn default() -> Self {
        config().metadata_conflicts
    }
}

impl FromStr for MergeConflicts {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "warn" => Ok(MergeConflicts::Warn),
            "error" => Ok(MergeConflicts::Error),
            "silent" => Ok(MergeConflicts::Silent),
            _ => InvalidConflictPolicySnafu { value: s }.fail(),
        }
    }
}

/// Builds the message reported for a conflict on `key`.
pub type ConflictFormatter<'a> = dyn Fn(&str, &dyn fmt::Display, &dyn fmt::Display) -> String + 'a;

/// Default conflict message, used when no column context is available.
pub fn default_conflict_message(
    key: &str,
    left: &dyn fmt::Display,
    right: &dyn fmt::Display,
) -> String {
    format!("Cannot merge meta key '{key}' types {left} and {right}, choosing {key}={right}")
}

fn report_conflict(conflicts: MergeConflicts, message: String) -> Result<()> {
    match conflicts {
        MergeConflicts::Silent => Ok(()),
        MergeConflicts::Warn => {
            warnings::warn(DataWarning::MergeConflict(message));
            Ok(())
        }
        MergeConflicts::Error => MergeConflictSnafu { message }.fail(),
    }
}

/// Merges `right` into `left`.
pub fn merge(
    left: IndexMap<String, AttrValue>,
    right: IndexMap<String, AttrValue>,
    conflicts: MergeConflicts,
    conflict_message: &ConflictFormatter<'_>,
) -> Result<IndexMap<String, AttrValue>> {
    let mut out = left;
    for (key, right_value) in right {
        let merged = match (out.get(&key), right_value) {
            (None, right_value) => right_value,
            (Some(AttrValue::Meta(left_meta)), AttrValue::Meta(right_meta)) => AttrValue::Meta(
                merge_meta(left_meta.clone(), right_meta, conflicts, conflict_message)?,
            ),
            (Some(left_value), right_value) if *left_value == right_value => right_value,
            (Some(left_value), right_value) => {
                report_conflict(conflicts, conflict_message(&key, left_value, &right_value))?;
                right_value
            }
        };
        out.insert(key, merged);
    }
    Ok(out)
}

/// Recursively merges two metadata maps.
pub fn merge_meta(
    left: Meta,
    right: Meta,
    conflicts: MergeConflicts,
    conflict_message: &ConflictFormatter<'_>,
) -> Result<Meta> {
    let mut out = left;
    for (key, right_value) in right {
        let merged = match (out.get(&key).cloned(), right_value) {
            (None, right_value) => right_value,
            (Some(Value::Object(l)), Value::Object(r)) => {
                Value::Object(merge_meta(l, r, conflicts, conflict_message)?)
            }
            (Some(Value::Array(mut l)), Value::Array(r)) => {
                l.extend(r);
                Value::Array(l)
            }
            (Some(left_value), right_value) if left_value == right_value => right_value,
            (Some(left_value), right_value) => {
                report_conflict(conflicts, conflict_message(&key, &left_value, &right_value))?;
                right_value
            }
        };
        out.insert(key, merged);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> IndexMap<String, AttrValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), AttrValue::from(*v)))
            .collect()
    }

    fn meta(value: Value) -> Meta {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_merge_disjoint_and_equal() {
        let out = merge(
            attrs(&[("unit", "m"), ("format", "%d")]),
            attrs(&[("unit", "m"), ("description", "length")]),
            MergeConflicts::Error,
            &default_conflict_message,
        )
        .unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out["description"], AttrValue::from("length"));
    }

    #[test]
    fn test_merge_conflict_policies() {
        let left = attrs(&[("unit", "m")]);
        let right = attrs(&[("unit", "s")]);

        let err = merge(
            left.clone(),
            right.clone(),
            MergeConflicts::Error,
            &default_conflict_message,
        )
        .unwrap_err();
        assert!(matches!(err, crate::Error::MergeConflict { .. }));

        let (out, warned) = warnings::record(|| {
            merge(
                left.clone(),
                right.clone(),
                MergeConflicts::Warn,
                &default_conflict_message,
            )
        });
        assert_eq!(out.unwrap()["unit"], AttrValue::from("s"));
        assert_eq!(warned.len(), 1);

        let (out, warned) = warnings::record(|| {
            merge(left, right, MergeConflicts::Silent, &default_conflict_message)
        });
        assert_eq!(out.unwrap()["unit"], AttrValue::from("s"));
        assert!(warned.is_empty());
    }

    #[test]
    fn test_merge_meta_recursive() {
        let left = meta(json!({"a": 1, "nested": {"x": 1}, "list": [1, 2]}));
        let right = meta(json!({"b": 2, "nested": {"y": 2}, "list": [3]}));
        let out = merge_meta(left, right, MergeConflicts::Error, &default_conflict_message).unwrap();
        assert_eq!(
            Value::Object(out),
            json!({"a": 1, "nested": {"x": 1, "y": 2}, "list": [1, 2, 3], "b": 2})
        );
    }

    #[test]
    fn test_parse_policy() {
        assert_eq!("warn".parse::<MergeConflicts>().unwrap(), MergeConflicts::Warn);
        assert!("ignore".parse::<MergeConflicts>().is_err());
    }
}
