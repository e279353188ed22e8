//! Writing entry blocks into changelog files.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::format::{DisplayEntry, FormatterRegistry};
use super::locate::ChangelogLocator;
use super::{ChangelogEmitter, EmitContext};
use crate::error::{ChangelogError, Result};
use crate::types::{file_type_key, ChangelogEntry};

/// Block of text destined for one changelog file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RenderedChangelog {
    pub path: PathBuf,
    pub date_line: String,
    pub lines: Vec<String>,
}

impl RenderedChangelog {
    /// The block as it appears at the top of a fresh changelog.
    pub fn text(&self) -> String {
        let mut text = format!("{}\n\n", self.date_line);
        for line in &self.lines {
            text.push_str(line);
            text.push('\n');
        }
        text.push('\n');
        text
    }

    /// Prepend this block to `existing`.
    ///
    /// When `existing` already opens with the same date line, the new lines
    /// go directly under that header instead of repeating it.
    pub fn merge_into(&self, existing: &str) -> String {
        let Some(rest) = existing.strip_prefix(self.date_line.as_str()) else {
            return format!("{}{}", self.text(), existing);
        };
        let Some(body) = rest.strip_prefix('\n') else {
            return format!("{}{}", self.text(), existing);
        };
        let body = body.strip_prefix('\n').unwrap_or(body);

        let mut merged = format!("{}\n\n", self.date_line);
        for line in &self.lines {
            merged.push_str(line);
            merged.push('\n');
        }
        merged.push_str(body);
        merged
    }
}

/// Emitter writing into the nearest changelog file of each entry.
#[derive(Debug)]
pub struct FileEmitter {
    locator: ChangelogLocator,
    formatters: FormatterRegistry,
    written: Vec<PathBuf>,
}

impl FileEmitter {
    pub fn new(locator: ChangelogLocator) -> Self {
        Self {
            locator,
            formatters: FormatterRegistry::new(),
            written: Vec::new(),
        }
    }

    pub fn with_formatters(mut self, formatters: FormatterRegistry) -> Self {
        self.formatters = formatters;
        self
    }

    /// Changelog files written so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Render the blocks `emit` would write, without touching the disk.
    ///
    /// Blocks are returned in order of each changelog's first entry.
    pub fn render(
        &self,
        entries: &[ChangelogEntry],
        context: &EmitContext,
    ) -> Result<Vec<RenderedChangelog>> {
        let mut groups: Vec<(PathBuf, Vec<&ChangelogEntry>)> = Vec::new();
        let mut index: HashMap<PathBuf, usize> = HashMap::new();

        for entry in entries {
            let Some(target) = self.locator.locate(&entry.path) else {
                tracing::error!(
                    "No {} found for {}; skipping its entries",
                    self.locator.name(),
                    entry.path
                );
                continue;
            };
            let slot = *index.entry(target.clone()).or_insert_with(|| {
                groups.push((target, Vec::new()));
                groups.len() - 1
            });
            groups[slot].1.push(entry);
        }

        let header = self.formatters.primary(context.formatter.as_deref())?;
        let mut rendered = Vec::with_capacity(groups.len());
        for (path, group) in groups {
            let display_paths: Vec<String> = group
                .iter()
                .map(|entry| self.locator.display_path(&path, &entry.path))
                .collect();
            let display: Vec<DisplayEntry> = group
                .iter()
                .zip(&display_paths)
                .map(|(entry, path)| DisplayEntry { path, entry })
                .collect();

            // Each file's run of entries uses the formatter for its own type
            let mut lines = Vec::with_capacity(display.len());
            for run in display.chunk_by(|a, b| a.entry.path == b.entry.path) {
                let key = file_type_key(&run[0].entry.path);
                let formatter = self.formatters.select(&key, context.formatter.as_deref())?;
                lines.extend(formatter.entry_lines(run));
            }

            rendered.push(RenderedChangelog {
                date_line: header.date_line(context),
                lines,
                path,
            });
        }
        Ok(rendered)
    }

    fn write(&mut self, block: &RenderedChangelog) -> Result<()> {
        let existing = read_existing(&block.path)?;
        let merged = block.merge_into(&existing);
        fs::write(&block.path, merged).map_err(|e| ChangelogError::io(&block.path, e))?;

        tracing::info!(
            "Wrote {} entries to {}",
            block.lines.len(),
            block.path.display()
        );
        self.written.push(block.path.clone());
        Ok(())
    }
}

impl ChangelogEmitter for FileEmitter {
    fn emit(&mut self, entries: &[ChangelogEntry], context: &EmitContext) -> Result<()> {
        for block in self.render(entries, context)? {
            self.write(&block)?;
        }
        Ok(())
    }
}

fn read_existing(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(ChangelogError::io(path, e)),
    }
}
