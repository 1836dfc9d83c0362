//! Rendering of single values for display, driven by an info's `format`.
//!
//! Three spellings of a format are understood: a brace field (`{:8.3f}`,
//! `{0:.2e}`), a printf conversion (`%5.1f`, optionally surrounded by
//! literal text) and a bare format spec (`.3f`).

use snafu::prelude::*;

use crate::{
    error::{EvaluationSnafu, Result},
    info::bound_info,
    parent::{ColumnFormatter, DataObject},
    types::value::ScalarValue,
};

/// Text shown for masked rows.
pub const MASKED: &str = "--";

/// Formatter used for columns that are not part of a table.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultFormatter;

impl ColumnFormatter for DefaultFormatter {
    fn format_row(&self, column: &dyn DataObject, row: usize) -> String {
        if column
            .mask()
            .and_then(|mask| mask.get(row).copied())
            .unwrap_or(false)
        {
            return MASKED.to_string();
        }
        let Some(value) = column.value_at(row) else {
            return String::new();
        };
        let format = bound_info(column).and_then(|info| info.format().ok().flatten());
        match format {
            Some(format) => apply_format(&format, &value).unwrap_or_else(|_| value.to_string()),
            None => value.to_string(),
        }
    }
}

#[derive(Debug, Default, PartialEq)]
struct FormatSpec {
    /// Explicit alignment, `true` for left. Numbers otherwise go right, text left.
    left: Option<bool>,
    width: usize,
    precision: Option<usize>,
    ty: Option<char>,
}

fn bad_format(format: &str) -> crate::Error {
    EvaluationSnafu {
        message: format!("invalid format string '{format}'"),
    }
    .build()
}

/// Parses `[align][width][.precision][type]`, `align` being `<` or `>`.
fn parse_spec(spec: &str) -> Result<FormatSpec> {
    let chars: Vec<char> = spec.chars().collect();
    let mut out = FormatSpec::default();
    let mut pos = 0;
    if let Some(align @ ('<' | '>')) = chars.first() {
        out.left = Some(*align == '<');
        pos = 1;
    }
    let digits = |from: usize| {
        chars[from..]
            .iter()
            .take_while(|c| c.is_ascii_digit())
            .count()
    };
    let n = digits(pos);
    if n > 0 {
        out.width = chars[pos..pos + n]
            .iter()
            .collect::<String>()
            .parse()
            .map_err(|_| bad_format(spec))?;
        pos += n;
    }
    if chars.get(pos) == Some(&'.') {
        let n = digits(pos + 1);
        ensure!(n > 0, EvaluationSnafu { message: format!("invalid format string '{spec}'") });
        out.precision = Some(
            chars[pos + 1..pos + 1 + n]
                .iter()
                .collect::<String>()
                .parse()
                .map_err(|_| bad_format(spec))?,
        );
        pos += 1 + n;
    }
    match &chars[pos..] {
        [] => {}
        [ty @ ('f' | 'e' | 'g' | 'd' | 's')] => out.ty = Some(*ty),
        _ => return Err(bad_format(spec)),
    }
    Ok(out)
}

/// Formats `value` according to `format`.
pub fn apply_format(format: &str, value: &ScalarValue) -> Result<String> {
    if let Some(field) = format.strip_prefix('{').and_then(|f| f.strip_suffix('}')) {
        let spec = field.split_once(':').map_or("", |(_, spec)| spec);
        return render(&parse_spec(spec)?, value);
    }
    if let Some(percent) = format.find('%') {
        let rest = &format[percent + 1..];
        let end = rest
            .find(|c: char| c.is_ascii_alphabetic())
            .ok_or_else(|| bad_format(format))?;
        let (flags, conversion) = rest[..=end].split_at(end);
        let (left, width_precision) = match flags.strip_prefix('-') {
            Some(stripped) => (true, stripped),
            None => (false, flags),
        };
        let conversion = match conversion {
            "i" => "d",
            other => other,
        };
        let mut spec = parse_spec(&format!("{width_precision}{conversion}"))?;
        if left {
            spec.left = Some(true);
        }
        let body = render(&spec, value)?;
        return Ok(format!("{}{body}{}", &format[..percent], &rest[end + 1..]));
    }
    render(&parse_spec(format)?, value)
}

fn render(spec: &FormatSpec, value: &ScalarValue) -> Result<String> {
    let number = value.as_f64();
    let body = match (spec.ty, number) {
        (Some('f'), Some(v)) => format!("{:.*}", spec.precision.unwrap_or(6), v),
        (Some('e'), Some(v)) => format_exponent(v, spec.precision.unwrap_or(6)),
        (Some('g'), Some(v)) => format_general(v, spec.precision.unwrap_or(6)),
        (None, Some(v)) if spec.precision.is_some() && matches!(value, ScalarValue::Float64(_)) => {
            format_general(v, spec.precision.unwrap_or(6))
        }
        (Some('d'), _) => match value {
            ScalarValue::Int64(_) | ScalarValue::UInt64(_) | ScalarValue::Boolean(_) => {
                format!("{}", number.unwrap_or_default() as i64)
            }
            _ => {
                return EvaluationSnafu {
                    message: format!("cannot format {value} as an integer"),
                }
                .fail();
            }
        },
        (Some('s') | None, _) => {
            let text = value.to_string();
            match spec.precision {
                Some(p) => text.chars().take(p).collect(),
                None => text,
            }
        }
        (Some(ty), _) => {
            return EvaluationSnafu {
                message: format!("cannot format {value} with '{ty}'"),
            }
            .fail();
        }
    };
    let width = spec.width;
    Ok(if spec.left.unwrap_or(number.is_none()) {
        format!("{body:<width$}")
    } else {
        format!("{body:>width$}")
    })
}

/// `1.500000e+00` style exponent notation.
fn format_exponent(v: f64, precision: usize) -> String {
    if !v.is_finite() {
        return crate::types::value::format_float(v);
    }
    let raw = format!("{v:.precision$e}");
    match raw.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exponent.abs())
        }
        None => raw,
    }
}

/// Shortest of fixed or exponent notation with `precision` significant
/// digits and trailing zeros removed.
pub fn format_general(v: f64, precision: usize) -> String {
    if !v.is_finite() {
        return crate::types::value::format_float(v);
    }
    let precision = precision.max(1);
    if v == 0.0 {
        return "0".to_string();
    }
    let exponent = format!("{:.*e}", precision - 1, v)
        .split_once('e')
        .and_then(|(_, e)| e.parse::<i32>().ok())
        .unwrap_or(0);
    if exponent < -4 || exponent >= precision as i32 {
        let out = format_exponent(v, precision - 1);
        match out.split_once('e') {
            Some((mantissa, exp)) => format!("{}e{exp}", trim_zeros(mantissa)),
            None => out,
        }
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        trim_zeros(&format!("{v:.decimals$}")).to_string()
    }
}

fn trim_zeros(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}
