//! Prepare command - Write ChangeLog entries for the working copy's changes
//!
//! Runs the classify/extract/plan/emit pipeline over `git status` on a
//! blocking worker while a spinner reports progress. Ctrl-C cancels the run
//! before anything is written.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::NaiveDate;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use chlog_core::emitter::{ChangelogEmitter, ChangelogLocator, FileEmitter, RenderedChangelog};
use chlog_core::pipeline::{Pipeline, PipelineConfig, ProgressMonitor, SharedProgress};
use chlog_core::resolver::ResolverRegistry;
use chlog_core::source::git::GitSource;
use chlog_core::types::{ChangeKind, ChangelogEntry};
use chlog_core::ChangelogError;

use crate::config::ChlogConfig;
use crate::output::{Output, OutputFormat, TableDisplay, TableOutput};

/// How often the spinner refreshes its progress message.
const SPINNER_TICK: Duration = Duration::from_millis(100);

/// Options of one `chlog prepare` invocation.
#[derive(Debug, Clone, Default)]
pub struct PrepareOptions {
    pub path: String,
    pub dry_run: bool,
    /// Create a top-level changelog when none exists.
    pub create: bool,
    /// Fail on configuration errors instead of using defaults.
    pub strict: bool,
    /// Date to stamp the entries with instead of today.
    pub date: Option<NaiveDate>,
    /// Formatter name, overriding the configuration.
    pub formatter: Option<String>,
}

/// Result of a prepare run.
#[derive(Debug, Serialize)]
pub struct PrepareReport {
    pub root: PathBuf,
    pub author: String,
    pub dry_run: bool,
    pub entries: Vec<ChangelogEntry>,
    /// Blocks that were (or, in a dry run, would be) written.
    pub changelogs: Vec<RenderedChangelog>,
    pub duration_ms: u64,
}

impl PrepareReport {
    fn written(&self) -> bool {
        !self.dry_run && !self.changelogs.is_empty()
    }
}

impl TableDisplay for PrepareReport {
    fn to_table(&self) -> String {
        if self.entries.is_empty() {
            return format!("{} No changes detected", "INFO:".yellow().bold());
        }

        let mut output = TableOutput::key_value(&[
            ("Root", self.root.display().to_string()),
            ("Author", self.author.clone()),
            ("Entries", self.entries.len().to_string()),
        ]);
        output.push('\n');

        let rows: Vec<Vec<String>> = self
            .entries
            .iter()
            .map(|entry| {
                let indicator = entry.kind.indicator().to_string();
                let indicator = match entry.kind {
                    ChangeKind::Added => indicator.green(),
                    ChangeKind::Removed => indicator.red(),
                    ChangeKind::Modified => indicator.yellow(),
                };
                let detail = match &entry.default_note {
                    Some(note) => note.text().dimmed().to_string(),
                    None if entry.is_unnamed() => "-".dimmed().to_string(),
                    None => entry.function_name.cyan().to_string(),
                };
                vec![indicator.to_string(), entry.path.clone(), detail]
            })
            .collect();
        output.push_str(&TableOutput::from_rows(&["", "Path", "Function"], &rows));
        output.push('\n');

        if self.changelogs.is_empty() {
            output.push_str(&format!(
                "\n{} No changelog found; rerun with --create to start one",
                "WARNING:".yellow().bold()
            ));
        } else if self.dry_run {
            for changelog in &self.changelogs {
                output.push_str(&format!(
                    "\n{} {}\n",
                    "Would write to".cyan().bold(),
                    changelog.path.display()
                ));
                output.push_str(&changelog.text());
            }
        } else if self.written() {
            for changelog in &self.changelogs {
                output.push_str(&format!(
                    "\n{} {} ({} lines)",
                    "Updated".green().bold(),
                    changelog.path.display(),
                    changelog.lines.len()
                ));
            }
        }
        output
    }
}

/// Name and email entries are attributed to.
///
/// Configuration wins, then git's `user.name`/`user.email`, then the login
/// name from the environment.
pub fn resolve_author(config: &ChlogConfig, source: &GitSource) -> (String, String) {
    let login = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let name = config
        .author
        .name
        .clone()
        .or_else(|| source.config_value("user.name"))
        .unwrap_or_else(|| login.clone());
    let email = config
        .author
        .email
        .clone()
        .or_else(|| source.config_value("user.email"))
        .unwrap_or_else(|| format!("{}@localhost", login));
    (name, email)
}

pub async fn run(options: PrepareOptions, format: OutputFormat) -> anyhow::Result<()> {
    let start = std::time::Instant::now();

    let source = GitSource::open(&options.path)
        .with_context(|| format!("Cannot prepare a changelog for {}", options.path))?;
    let root = source.root().to_path_buf();

    let config = if options.strict {
        ChlogConfig::try_load(&root)?
    } else {
        ChlogConfig::load(&root)
    };

    let (author_name, author_email) = resolve_author(&config, &source);
    let pipeline_config = PipelineConfig {
        author_name,
        author_email,
        formatter: options
            .formatter
            .clone()
            .or_else(|| config.changelog.formatter.clone()),
        changelog_name: config.changelog.name.clone(),
    };
    let author = format!(
        "{} <{}>",
        pipeline_config.author_name, pipeline_config.author_email
    );

    let resolvers = ResolverRegistry::with_languages(|lang| config.should_resolve_language(lang));
    let formatters = config.formatter_registry();
    let locator = ChangelogLocator::new(&root)
        .with_name(&config.changelog.name)
        .create_missing(options.create || config.changelog.create_missing);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(SPINNER_TICK);
    spinner.set_message("Reading git status...");

    let progress = SharedProgress::new();
    let worker_progress = progress.clone();
    let dry_run = options.dry_run;
    let date = options.date;

    type Planned = (Vec<ChangelogEntry>, Vec<RenderedChangelog>);
    let mut handle = tokio::task::spawn_blocking(move || -> chlog_core::Result<Planned> {
        let changes = source.changes()?;
        let pipeline = Pipeline::new(&source, &resolvers, pipeline_config);
        let mut context = pipeline.config().emit_context();
        if let Some(date) = date {
            context = context.with_date(date);
        }

        let Some(plan) = pipeline.prepare(changes, &worker_progress)? else {
            return Ok((Vec::new(), Vec::new()));
        };

        let mut emitter = FileEmitter::new(locator).with_formatters(formatters);
        let rendered = emitter.render(&plan.entries, &context)?;
        if !dry_run {
            if worker_progress.is_cancelled() {
                return Err(ChangelogError::Cancelled);
            }
            emitter.emit(&plan.entries, &context)?;
        }
        Ok((plan.entries, rendered))
    });

    let mut ticker = tokio::time::interval(SPINNER_TICK);
    let outcome = loop {
        tokio::select! {
            joined = &mut handle => break joined.context("Pipeline worker panicked")?,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupt received, cancelling");
                progress.cancel();
                spinner.set_message("Cancelling...");
            }
            _ = ticker.tick() => {
                let (done, total) = progress.position();
                if total > 0 {
                    spinner.set_message(format!("Planning entries ({}/{})", done, total));
                }
            }
        }
    };
    spinner.finish_and_clear();

    let (entries, changelogs) = match outcome {
        Ok(result) => result,
        Err(ChangelogError::Cancelled) => anyhow::bail!("Cancelled; no changelog was written"),
        Err(e) => return Err(e).context("Failed to prepare changelog entries"),
    };

    let report = PrepareReport {
        root,
        author,
        dry_run,
        entries,
        changelogs,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    Output::new(report, format).render()
}

/// Parse a `YYYY-MM-DD` date argument.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| format!("'{}' is not a YYYY-MM-DD date: {}", s, e))
}
