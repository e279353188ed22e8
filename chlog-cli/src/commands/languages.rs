//! Languages command - List the built-in function resolvers

use colored::Colorize;
use serde::Serialize;

use chlog_core::resolver::LANGUAGES;

use crate::config::ChlogConfig;
use crate::output::{Output, OutputFormat, TableDisplay, TableOutput};

/// One built-in resolver language.
#[derive(Debug, Serialize)]
pub struct LanguageInfo {
    pub name: String,
    pub extensions: Vec<String>,
    /// Disabled by the `[resolver] languages` setting.
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct LanguagesReport {
    pub languages: Vec<LanguageInfo>,
}

impl LanguagesReport {
    pub fn collect(config: &ChlogConfig) -> Self {
        let languages = LANGUAGES
            .iter()
            .map(|spec| LanguageInfo {
                name: spec.name.to_string(),
                extensions: spec.extensions.iter().map(|e| e.to_string()).collect(),
                enabled: config.should_resolve_language(spec.name),
            })
            .collect();
        Self { languages }
    }
}

impl TableDisplay for LanguagesReport {
    fn to_table(&self) -> String {
        let rows: Vec<Vec<String>> = self
            .languages
            .iter()
            .map(|lang| {
                let status = if lang.enabled {
                    "yes".green().to_string()
                } else {
                    "no".dimmed().to_string()
                };
                vec![
                    lang.name.clone(),
                    lang.extensions
                        .iter()
                        .map(|e| format!(".{}", e))
                        .collect::<Vec<_>>()
                        .join(" "),
                    status,
                ]
            })
            .collect();

        TableOutput::from_rows(&["Language", "Extensions", "Enabled"], &rows)
    }
}

pub fn run(config: &ChlogConfig, format: OutputFormat) -> anyhow::Result<()> {
    Output::new(LanguagesReport::collect(config), format).render()
}
