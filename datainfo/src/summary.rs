//! Summary options: functions turning a data object into an ordered map of
//! named, printable entries.

use std::{fmt, iter, rc::Rc};

use indexmap::IndexMap;
use itertools::Itertools;
use snafu::prelude::*;
use tracing::trace;

use crate::{
    error::{AttributeNotFoundSnafu, EvaluationSnafu, Result, UnknownSummaryOptionSnafu},
    info::{AttrValue, bound_info, format_shape},
    parent::DataObject,
    types::{dtype_info_name, value::ScalarValue},
    warnings::{self, DataWarning},
};

/// Ordered entries of a summary.
pub type Summary = IndexMap<String, String>;

/// A summary option evaluated against a data object.
pub type SummaryFn = Rc<dyn Fn(&dyn DataObject) -> Result<Summary>>;

/// Shown for entries whose accessor failed.
pub const PLACEHOLDER: &str = "--";

/// Attributes reported by the `attributes` option.
pub const INFO_SUMMARY_ATTRS: [&str; 6] = ["dtype", "shape", "unit", "format", "description", "class"];

/// Statistics reported by the `stats` option.
pub const INFO_SUMMARY_STATS: [&str; 4] = ["mean", "std", "min", "max"];

/// Computes one summary entry.
#[derive(Clone)]
pub enum Accessor {
    /// A zero-argument method of the data object.
    Method(String),
    Func(Rc<dyn Fn(&dyn DataObject) -> Result<String>>),
}

impl Accessor {
    pub fn method(name: impl Into<String>) -> Self {
        Accessor::Method(name.into())
    }

    pub fn func<F, T>(f: F) -> Self
    where
        F: Fn(&dyn DataObject) -> Result<T> + 'static,
        T: fmt::Display,
    {
        Accessor::Func(Rc::new(move |data: &dyn DataObject| {
            f(data).map(|out| out.to_string())
        }))
    }

    fn evaluate(&self, data: &dyn DataObject) -> Result<String> {
        match self {
            Accessor::Method(method) => data.call_method(method).map(|out| out.to_string()),
            Accessor::Func(f) => f(data),
        }
    }
}

impl From<&str> for Accessor {
    fn from(method: &str) -> Self {
        Accessor::method(method)
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accessor::Method(method) => f.debug_tuple("Method").field(method).finish(),
            Accessor::Func(_) => write!(f, "Func(..)"),
        }
    }
}

/// Builds a summary option pairing each of `names` with an accessor.
///
/// An accessor that fails yields [`PLACEHOLDER`] for its entry only.
pub fn make_summary<N, A>(names: N, accessors: A) -> SummaryFn
where
    N: IntoIterator,
    N::Item: Into<String>,
    A: IntoIterator,
    A::Item: Into<Accessor>,
{
    let entries = names
        .into_iter()
        .map(Into::into)
        .zip(accessors.into_iter().map(Into::into))
        .collect_vec();
    Rc::new(move |data: &dyn DataObject| {
        let mut out = Summary::new();
        for (name, accessor) in &entries {
            let value = accessor.evaluate(data).unwrap_or_else(|err| {
                trace!("summary entry {} failed: {}", name, err);
                PLACEHOLDER.to_string()
            });
            out.insert(name.clone(), value);
        }
        Ok(out)
    })
}

/// One option of a summary request.
#[derive(Clone)]
pub enum SummaryOption {
    /// A built-in option: `attributes` or `stats`.
    Named(String),
    Func(SummaryFn),
}

impl SummaryOption {
    pub(crate) fn resolve(&self) -> Result<SummaryFn> {
        match self {
            SummaryOption::Named(name) => builtin_option(name),
            SummaryOption::Func(f) => Ok(f.clone()),
        }
    }
}

/// Ordered list of options whose results are merged in turn.
#[derive(Clone)]
pub struct SummaryOptions(pub Vec<SummaryOption>);

impl Default for SummaryOptions {
    fn default() -> Self {
        "attributes".into()
    }
}

impl From<&str> for SummaryOption {
    fn from(name: &str) -> Self {
        SummaryOption::Named(name.to_string())
    }
}

impl From<SummaryFn> for SummaryOption {
    fn from(f: SummaryFn) -> Self {
        SummaryOption::Func(f)
    }
}

impl From<&str> for SummaryOptions {
    fn from(name: &str) -> Self {
        SummaryOptions(vec![name.into()])
    }
}

impl From<SummaryFn> for SummaryOptions {
    fn from(f: SummaryFn) -> Self {
        SummaryOptions(vec![f.into()])
    }
}

impl<T: Into<SummaryOption>> From<Vec<T>> for SummaryOptions {
    fn from(options: Vec<T>) -> Self {
        SummaryOptions(options.into_iter().map(Into::into).collect())
    }
}

fn builtin_option(name: &str) -> Result<SummaryFn> {
    match name {
        "attributes" => Ok(info_summary_attributes()),
        "stats" => Ok(info_summary_stats()),
        _ => UnknownSummaryOptionSnafu { option: name }.fail(),
    }
}

/// The `attributes` option.
pub fn info_summary_attributes() -> SummaryFn {
    make_summary(
        INFO_SUMMARY_ATTRS,
        INFO_SUMMARY_ATTRS.map(|attr| Accessor::func(move |data| data_attribute(data, attr))),
    )
}

/// The `stats` option, ignoring NaN values.
pub fn info_summary_stats() -> SummaryFn {
    make_summary(
        INFO_SUMMARY_STATS,
        [
            Accessor::func(|data| Ok(ScalarValue::from(nanmean(&unmasked_values(data)?)))),
            Accessor::func(|data| Ok(ScalarValue::from(nanstd(&unmasked_values(data)?)))),
            Accessor::func(|data| extremum(data, Extremum::Min)),
            Accessor::func(|data| extremum(data, Extremum::Max)),
        ],
    )
}

/// A data object attribute as shown by the `attributes` option; unset
/// attributes show as an empty string.
pub fn data_attribute(data: &dyn DataObject, attr: &str) -> Result<String> {
    if attr == "class" {
        return Ok(data.class_name().to_string());
    }
    if attr == "shape" {
        let shape = data.shape();
        return Ok(match shape.get(1..) {
            Some(trailing) if !trailing.is_empty() => format_shape(trailing),
            _ => String::new(),
        });
    }
    let info = bound_info(data).context(AttributeNotFoundSnafu {
        class: data.class_name(),
        attr: "info",
    })?;
    if attr == "dtype" {
        return dtype_info_name(&info.dtype()?);
    }
    Ok(info.get(attr)?.to_string())
}

/// The set attributes among `attrs` of `data`, read through the data object.
pub fn obj_attrs_map(data: &dyn DataObject, attrs: &[&str]) -> IndexMap<String, AttrValue> {
    attrs
        .iter()
        .filter_map(|attr| match data.get_attr(attr) {
            Ok(value) if !value.is_none() => Some((attr.to_string(), value)),
            _ => None,
        })
        .collect()
}

/// Float values of `data` with masked elements dropped.
fn unmasked_values(data: &dyn DataObject) -> Result<Vec<f64>> {
    let values = data.values_f64()?;
    Ok(match data.mask() {
        Some(mask) => values
            .into_iter()
            .zip(mask.into_iter().chain(iter::repeat(false)))
            .filter_map(|(value, masked)| (!masked).then_some(value))
            .collect(),
        None => values,
    })
}

/// Mean of the non-NaN `values`.
pub fn nanmean(values: &[f64]) -> f64 {
    let kept = values.iter().filter(|v| !v.is_nan()).collect_vec();
    if kept.is_empty() {
        warnings::warn(DataWarning::MeanOfEmptySlice);
        return f64::NAN;
    }
    kept.iter().copied().sum::<f64>() / kept.len() as f64
}

/// Population standard deviation of the non-NaN `values`.
pub fn nanstd(values: &[f64]) -> f64 {
    let kept = values.iter().copied().filter(|v| !v.is_nan()).collect_vec();
    if kept.is_empty() {
        warnings::warn(DataWarning::DegreesOfFreedom);
        return f64::NAN;
    }
    let n = kept.len() as f64;
    let mean = kept.iter().sum::<f64>() / n;
    (kept.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

#[derive(Clone, Copy)]
enum Extremum {
    Min,
    Max,
}

/// Minimum or maximum of the non-NaN `values`. Empty input has no identity
/// and fails; all-NaN input warns and yields NaN.
fn nan_extremum(values: &[f64], which: Extremum) -> Result<f64> {
    let name = match which {
        Extremum::Min => "minimum",
        Extremum::Max => "maximum",
    };
    ensure!(
        !values.is_empty(),
        EvaluationSnafu {
            message: format!("zero-size array to reduction operation {name} which has no identity")
        }
    );
    let kept = values.iter().copied().filter(|v| !v.is_nan());
    let out = match which {
        Extremum::Min => kept.reduce(f64::min),
        Extremum::Max => kept.reduce(f64::max),
    };
    Ok(out.unwrap_or_else(|| {
        warnings::warn(DataWarning::AllNanSlice);
        f64::NAN
    }))
}

pub fn nanmin(values: &[f64]) -> Result<f64> {
    nan_extremum(values, Extremum::Min)
}

pub fn nanmax(values: &[f64]) -> Result<f64> {
    nan_extremum(values, Extremum::Max)
}

/// Extremum of `data`, kept integral for integer data.
fn extremum(data: &dyn DataObject, which: Extremum) -> Result<ScalarValue> {
    let out = nan_extremum(&unmasked_values(data)?, which)?;
    let integral = bound_info(data)
        .and_then(|info| info.dtype().ok())
        .is_some_and(|dtype| matches!(dtype.kind(), 'i' | 'u'));
    if integral && out.is_finite() {
        return Ok(ScalarValue::Int64(out as i64));
    }
    Ok(ScalarValue::from(out))
}
