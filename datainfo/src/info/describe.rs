//! Printable summaries of the data object an info is bound to.

use std::io::{self, Write};

use snafu::prelude::*;

use super::DataInfo;
use crate::{
    error::{IoSnafu, Result},
    parent::DataObject,
    summary::{Summary, SummaryOptions},
    warnings::{self, IGNORE_WARNINGS},
};

/// Terminator of every printed summary line.
#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";

/// Where a summary goes.
pub enum SummarySink<'a> {
    Stdout,
    Writer(&'a mut dyn Write),
    /// Hand the entries back instead of printing them.
    Return,
}

impl DataInfo {
    /// Summarizes the parent object.
    ///
    /// The entries of every option are merged in order, framed by the
    /// parent's `name` (when set) and followed by `n_bad` and `length`.
    /// Warnings expected from statistics over empty or all-NaN data are
    /// silenced while the options run.
    pub fn summarize(
        &self,
        options: impl Into<SummaryOptions>,
        sink: SummarySink<'_>,
    ) -> Result<Option<Summary>> {
        let options = options.into();
        let parent = self.parent()?;
        let data = &*parent;

        let mut out = Summary::new();
        if let Some(name) = self.name()?.filter(|name| !name.is_empty()) {
            out.insert("name".to_string(), name);
        }
        for option in &options.0 {
            let option = option.resolve()?;
            let entries = warnings::suppress(IGNORE_WARNINGS, || option(data))?;
            out.extend(entries);
        }
        out.insert("n_bad".to_string(), count_bad(data).to_string());
        if let Some(length) = data.len() {
            out.insert("length".to_string(), length.to_string());
        }

        match sink {
            SummarySink::Return => Ok(Some(out)),
            SummarySink::Stdout => {
                write_summary(&out, &mut io::stdout().lock())?;
                Ok(None)
            }
            SummarySink::Writer(writer) => {
                write_summary(&out, writer)?;
                Ok(None)
            }
        }
    }

    /// The default summary as text.
    pub fn describe(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.summarize(SummaryOptions::default(), SummarySink::Writer(&mut buf))?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Masked elements if the data has a mask, otherwise NaN and infinite ones.
fn count_bad(data: &dyn DataObject) -> usize {
    if let Some(mask) = data.mask() {
        return mask.iter().filter(|masked| **masked).count();
    }
    data.values_f64()
        .map(|values| values.iter().filter(|v| !v.is_finite()).count())
        .unwrap_or(0)
}

fn write_summary(summary: &Summary, writer: &mut dyn Write) -> Result<()> {
    for (key, value) in summary.iter().filter(|(_, value)| !value.is_empty()) {
        write!(writer, "{key} = {value}{LINE_ENDING}").context(IoSnafu)?;
    }
    Ok(())
}
