//! Changelog emission.
//!
//! An emitter receives the finished entry plan. [`FileEmitter`] writes GNU
//! style blocks into the nearest ChangeLog file; [`MemoryEmitter`] only
//! records what it was given.

use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::error::Result;
use crate::types::ChangelogEntry;

mod file;
pub mod format;
pub mod locate;

pub use file::{FileEmitter, RenderedChangelog};
pub use format::{
    ChangelogFormatter, DisplayEntry, FormatterRegistry, GnuFormatter, GNU_FORMATTER,
};
pub use locate::ChangelogLocator;

/// Consumer of an entry plan.
pub trait ChangelogEmitter {
    /// Write `entries` using the author and formatting details in `context`.
    ///
    /// Entries for one file are contiguous. I/O failures are returned;
    /// entries that have no target changelog are logged and skipped.
    fn emit(&mut self, entries: &[ChangelogEntry], context: &EmitContext) -> Result<()>;
}

impl<E: ChangelogEmitter + ?Sized> ChangelogEmitter for &mut E {
    fn emit(&mut self, entries: &[ChangelogEntry], context: &EmitContext) -> Result<()> {
        (**self).emit(entries, context)
    }
}

/// Author and formatting details for one emission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmitContext {
    pub author_name: String,
    pub author_email: String,
    /// Formatter name to use instead of the per-file-type default.
    pub formatter: Option<String>,
    pub date: NaiveDate,
}

impl EmitContext {
    /// Context dated today.
    pub fn new(author_name: impl Into<String>, author_email: impl Into<String>) -> Self {
        Self {
            author_name: author_name.into(),
            author_email: author_email.into(),
            formatter: None,
            date: Local::now().date_naive(),
        }
    }

    pub fn with_formatter(mut self, formatter: impl Into<String>) -> Self {
        self.formatter = Some(formatter.into());
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }
}

/// Emitter that keeps every emission in memory.
#[derive(Debug, Default)]
pub struct MemoryEmitter {
    emissions: Vec<(Vec<ChangelogEntry>, EmitContext)>,
}

impl MemoryEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `emit` was called.
    pub fn calls(&self) -> usize {
        self.emissions.len()
    }

    /// Entries of the most recent emission.
    pub fn last_entries(&self) -> Option<&[ChangelogEntry]> {
        self.emissions.last().map(|(entries, _)| entries.as_slice())
    }

    pub fn last_context(&self) -> Option<&EmitContext> {
        self.emissions.last().map(|(_, context)| context)
    }
}

impl ChangelogEmitter for MemoryEmitter {
    fn emit(&mut self, entries: &[ChangelogEntry], context: &EmitContext) -> Result<()> {
        self.emissions.push((entries.to_vec(), context.clone()));
        Ok(())
    }
}
