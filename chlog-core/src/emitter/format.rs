//! Changelog text formatting.

use std::collections::HashMap;
use std::sync::Arc;

use super::EmitContext;
use crate::error::{ChangelogError, Result};
use crate::types::ChangelogEntry;

/// Name of the built-in GNU formatter.
pub const GNU_FORMATTER: &str = "gnu";

/// An entry paired with the path shown for it in the changelog.
#[derive(Clone, Copy, Debug)]
pub struct DisplayEntry<'a> {
    /// Path relative to the changelog's directory.
    pub path: &'a str,
    pub entry: &'a ChangelogEntry,
}

/// Renders entry blocks for one changelog style.
pub trait ChangelogFormatter: Send + Sync {
    fn name(&self) -> &str;

    /// Header line opening a block.
    fn date_line(&self, context: &EmitContext) -> String;

    /// Body lines of a block, without the header.
    fn entry_lines(&self, entries: &[DisplayEntry<'_>]) -> Vec<String>;
}

/// GNU ChangeLog style.
///
/// ```text
/// 2024-03-01  Jane Doe  <jane@example.com>
///
/// 	* src/parser.c (parse_expr):
/// 	(parse_term):
/// 	* src/lexer.c: new file.
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct GnuFormatter;

impl ChangelogFormatter for GnuFormatter {
    fn name(&self) -> &str {
        GNU_FORMATTER
    }

    fn date_line(&self, context: &EmitContext) -> String {
        format!(
            "{}  {}  <{}>",
            context.date.format("%Y-%m-%d"),
            context.author_name,
            context.author_email
        )
    }

    fn entry_lines(&self, entries: &[DisplayEntry<'_>]) -> Vec<String> {
        let mut lines = Vec::with_capacity(entries.len());
        let mut previous: Option<&str> = None;

        for item in entries {
            let entry = item.entry;
            let same_file = previous == Some(item.path);
            previous = Some(item.path);

            let line = match (&entry.default_note, entry.is_unnamed(), same_file) {
                (Some(note), _, _) => format!("\t* {}: {}", item.path, note.text()),
                (None, true, _) => format!("\t* {}: ", item.path),
                (None, false, true) => format!("\t({}): ", entry.function_name),
                (None, false, false) => {
                    format!("\t* {} ({}): ", item.path, entry.function_name)
                }
            };
            lines.push(line);
        }
        lines
    }
}

/// Formatters by name, with per-file-type defaults.
#[derive(Clone)]
pub struct FormatterRegistry {
    formatters: HashMap<String, Arc<dyn ChangelogFormatter>>,
    by_key: HashMap<String, String>,
    default_name: String,
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        let mut registry = Self {
            formatters: HashMap::new(),
            by_key: HashMap::new(),
            default_name: GNU_FORMATTER.to_string(),
        };
        registry.register(GnuFormatter);
        registry
    }
}

impl FormatterRegistry {
    /// Registry containing the GNU formatter as the default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `formatter` under its own name.
    pub fn register(&mut self, formatter: impl ChangelogFormatter + 'static) {
        let formatter: Arc<dyn ChangelogFormatter> = Arc::new(formatter);
        self.formatters.insert(formatter.name().to_string(), formatter);
    }

    /// Use the formatter called `name` for files with file-type `key`.
    pub fn map_key(&mut self, key: &str, name: &str) {
        self.by_key.insert(key.to_string(), name.to_string());
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.formatters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Formatter for text not tied to one file, such as the date line:
    /// `preference` if given, otherwise the default.
    pub fn primary(&self, preference: Option<&str>) -> Result<Arc<dyn ChangelogFormatter>> {
        self.lookup(preference.unwrap_or(&self.default_name))
    }

    /// Pick the formatter for file-type `key`.
    ///
    /// An explicit `preference` wins and must name a registered formatter.
    /// Otherwise the key mapping is consulted, then the default.
    pub fn select(
        &self,
        key: &str,
        preference: Option<&str>,
    ) -> Result<Arc<dyn ChangelogFormatter>> {
        let name = preference
            .or_else(|| self.by_key.get(key).map(String::as_str))
            .unwrap_or(&self.default_name);
        self.lookup(name)
    }

    fn lookup(&self, name: &str) -> Result<Arc<dyn ChangelogFormatter>> {
        self.formatters
            .get(name)
            .cloned()
            .ok_or_else(|| ChangelogError::UnknownFormatter {
                name: name.to_string(),
            })
    }
}

impl std::fmt::Debug for FormatterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatterRegistry")
            .field("formatters", &self.names())
            .field("by_key", &self.by_key)
            .finish()
    }
}
