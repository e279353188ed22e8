//! The classify, extract, plan, emit pipeline.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::classifier::classify;
use crate::emitter::{ChangelogEmitter, EmitContext};
use crate::error::{ChangelogError, Result};
use crate::extractor::ChangeExtractor;
use crate::planner::EntryPlanner;
use crate::resolver::ResolverRegistry;
use crate::source::SnapshotSource;
use crate::types::{ChangelogEntry, FileChange, RawChange};
use crate::DEFAULT_CHANGELOG_NAME;

/// Progress sink and cancellation source for a pipeline run.
pub trait ProgressMonitor: Sync {
    /// Called once the amount of work is known.
    fn begin(&self, _total: usize) {}

    /// `units` more units of work are done.
    fn report_progress(&self, units: usize);

    /// Whether the run should stop at the next checkpoint.
    fn is_cancelled(&self) -> bool;
}

/// Monitor that ignores progress and never cancels.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressMonitor for NoProgress {
    fn report_progress(&self, _units: usize) {}

    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Thread-safe monitor whose clones share one state.
///
/// One clone drives the pipeline while another displays progress or
/// requests cancellation.
#[derive(Clone, Debug, Default)]
pub struct SharedProgress {
    inner: Arc<ProgressState>,
}

#[derive(Debug, Default)]
struct ProgressState {
    total: AtomicUsize,
    done: AtomicUsize,
    cancelled: AtomicBool,
}

impl SharedProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
    }

    /// `(done, total)` units.
    pub fn position(&self) -> (usize, usize) {
        (
            self.inner.done.load(Ordering::Relaxed),
            self.inner.total.load(Ordering::Relaxed),
        )
    }
}

impl ProgressMonitor for SharedProgress {
    fn begin(&self, total: usize) {
        self.inner.total.store(total, Ordering::Relaxed);
        self.inner.done.store(0, Ordering::Relaxed);
    }

    fn report_progress(&self, units: usize) {
        self.inner.done.fetch_add(units, Ordering::Relaxed);
    }

    fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }
}

/// Run-wide settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    pub author_name: String,
    pub author_email: String,
    /// Formatter preference passed through to the emitter.
    pub formatter: Option<String>,
    /// Changelog file name; changes to such files are never reported.
    pub changelog_name: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            author_name: String::new(),
            author_email: String::new(),
            formatter: None,
            changelog_name: DEFAULT_CHANGELOG_NAME.to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn emit_context(&self) -> EmitContext {
        let context = EmitContext::new(&self.author_name, &self.author_email);
        match &self.formatter {
            Some(name) => context.with_formatter(name),
            None => context,
        }
    }
}

/// Outcome of planning: the ordered files and their entries.
#[derive(Clone, Debug, Serialize)]
pub struct Plan {
    pub files: Vec<FileChange>,
    pub entries: Vec<ChangelogEntry>,
}

/// Pipeline over a snapshot source and a resolver registry.
pub struct Pipeline<'a, S> {
    source: S,
    resolvers: &'a ResolverRegistry,
    config: PipelineConfig,
}

impl<'a, S: SnapshotSource> Pipeline<'a, S> {
    pub fn new(source: S, resolvers: &'a ResolverRegistry, config: PipelineConfig) -> Self {
        Self {
            source,
            resolvers,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Classify, extract and plan `raw` changes.
    ///
    /// Returns `Ok(None)` when nothing (besides changelog files) changed.
    pub fn prepare<I>(&self, raw: I, monitor: &dyn ProgressMonitor) -> Result<Option<Plan>>
    where
        I: IntoIterator<Item = RawChange>,
    {
        let groups = classify(raw, &self.config.changelog_name);
        if groups.is_empty() {
            tracing::info!("No changes detected");
            return Ok(None);
        }
        tracing::info!(
            "Classified {} removed, {} added, {} modified files",
            groups.removed.len(),
            groups.added.len(),
            groups.modified.len()
        );

        let mut files = groups.into_ordered();
        monitor.begin(1 + 2 * files.len());
        checkpoint(monitor, 1)?;

        let extractor = ChangeExtractor::new(&self.source);
        for file in &mut files {
            extractor.extract(file);
            checkpoint(monitor, 1)?;
        }

        let planner = EntryPlanner::new(self.resolvers);
        let mut entries = Vec::new();
        for file in &files {
            entries.extend(planner.plan_file(file));
            checkpoint(monitor, 1)?;
        }

        tracing::debug!("Planned {} entries for {} files", entries.len(), files.len());
        Ok(Some(Plan { files, entries }))
    }

    /// Prepare `raw` changes and hand the entries to `emitter`.
    ///
    /// The emitter is not called when there are no changes.
    pub fn run<I, E>(
        &self,
        raw: I,
        emitter: &mut E,
        monitor: &dyn ProgressMonitor,
    ) -> Result<Option<Plan>>
    where
        I: IntoIterator<Item = RawChange>,
        E: ChangelogEmitter + ?Sized,
    {
        let Some(plan) = self.prepare(raw, monitor)? else {
            return Ok(None);
        };
        if monitor.is_cancelled() {
            return Err(ChangelogError::Cancelled);
        }

        emitter.emit(&plan.entries, &self.config.emit_context())?;
        Ok(Some(plan))
    }
}

fn checkpoint(monitor: &dyn ProgressMonitor, units: usize) -> Result<()> {
    monitor.report_progress(units);
    if monitor.is_cancelled() {
        tracing::info!("Pipeline cancelled");
        return Err(ChangelogError::Cancelled);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::MemoryEmitter;
    use crate::resolver::{FunctionResolver, Resolution};
    use crate::source::MemorySource;
    use crate::types::{DefaultNote, Document};

    /// Names each line after its first word.
    struct FirstWord;

    impl FunctionResolver for FirstWord {
        fn resolve(&self, document: &Document, offset: usize) -> Resolution {
            match document.text()[offset..].split_whitespace().next() {
                Some(word) => Resolution::Match(word.to_string()),
                None => Resolution::NoMatch,
            }
        }
    }

    fn registry() -> ResolverRegistry {
        let mut registry = ResolverRegistry::new();
        registry.register("c", FirstWord);
        registry
    }

    fn source() -> MemorySource {
        MemorySource::new()
            .with_file("src/a.c", "alpha 1\nbeta 1\n", "alpha 1\nbeta 2\n")
            .with_working("src/new.c", "fresh\n")
    }

    fn raw() -> Vec<RawChange> {
        vec![
            RawChange::modified("src/a.c"),
            RawChange::added("src/new.c"),
            RawChange::modified("ChangeLog"),
            RawChange::removed("src/gone.c"),
        ]
    }

    /// Cancels once `limit` units have been reported.
    struct CancelAfter {
        limit: usize,
        done: AtomicUsize,
    }

    impl ProgressMonitor for CancelAfter {
        fn report_progress(&self, units: usize) {
            self.done.fetch_add(units, Ordering::SeqCst);
        }

        fn is_cancelled(&self) -> bool {
            self.done.load(Ordering::SeqCst) >= self.limit
        }
    }

    #[test]
    fn test_prepare_orders_and_plans() {
        let registry = registry();
        let pipeline = Pipeline::new(source(), &registry, PipelineConfig::default());

        let plan = pipeline.prepare(raw(), &NoProgress).unwrap().unwrap();

        let paths: Vec<&str> = plan.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["src/gone.c", "src/new.c", "src/a.c"]);

        assert_eq!(plan.entries.len(), 3);
        assert_eq!(plan.entries[0].default_note, Some(DefaultNote::RemovedFile));
        assert_eq!(plan.entries[1].default_note, Some(DefaultNote::NewFile));
        // Probe covers the changed line and the one after it (past the end)
        assert_eq!(plan.entries[2].function_name, "beta");
    }

    #[test]
    fn test_prepare_is_idempotent() {
        let registry = registry();
        let pipeline = Pipeline::new(source(), &registry, PipelineConfig::default());

        let first = pipeline.prepare(raw(), &NoProgress).unwrap().unwrap();
        let mut reversed = raw();
        reversed.reverse();
        let second = pipeline.prepare(reversed, &NoProgress).unwrap().unwrap();

        assert_eq!(first.entries, second.entries);
    }

    #[test]
    fn test_no_changes_skips_emitter() {
        let registry = registry();
        let pipeline = Pipeline::new(source(), &registry, PipelineConfig::default());
        let mut emitter = MemoryEmitter::new();

        let only_changelog = vec![RawChange::modified("ChangeLog")];
        let result = pipeline.run(only_changelog, &mut emitter, &NoProgress).unwrap();

        assert!(result.is_none());
        assert_eq!(emitter.calls(), 0);
    }

    #[test]
    fn test_run_emits_with_config_context() {
        let registry = registry();
        let config = PipelineConfig {
            author_name: "Jane Doe".to_string(),
            author_email: "jane@example.com".to_string(),
            formatter: Some("gnu".to_string()),
            ..PipelineConfig::default()
        };
        let pipeline = Pipeline::new(source(), &registry, config);
        let mut emitter = MemoryEmitter::new();

        pipeline.run(raw(), &mut emitter, &NoProgress).unwrap();

        assert_eq!(emitter.calls(), 1);
        assert_eq!(emitter.last_entries().unwrap().len(), 3);
        let context = emitter.last_context().unwrap();
        assert_eq!(context.author_name, "Jane Doe");
        assert_eq!(context.formatter.as_deref(), Some("gnu"));
    }

    #[test]
    fn test_cancellation_discards_output() {
        let registry = registry();
        let pipeline = Pipeline::new(source(), &registry, PipelineConfig::default());
        let mut emitter = MemoryEmitter::new();
        let monitor = CancelAfter {
            limit: 2,
            done: AtomicUsize::new(0),
        };

        let result = pipeline.run(raw(), &mut emitter, &monitor);

        assert!(matches!(result, Err(ChangelogError::Cancelled)));
        assert_eq!(emitter.calls(), 0);
    }

    #[test]
    fn test_shared_progress_counts_units() {
        let registry = registry();
        let pipeline = Pipeline::new(source(), &registry, PipelineConfig::default());
        let progress = SharedProgress::new();

        pipeline.prepare(raw(), &progress).unwrap();

        // Classification plus extraction and planning of three files
        assert_eq!(progress.position(), (7, 7));
    }

    #[test]
    fn test_shared_progress_cancel() {
        let registry = registry();
        let pipeline = Pipeline::new(source(), &registry, PipelineConfig::default());
        let progress = SharedProgress::new();
        progress.clone().cancel();

        let result = pipeline.prepare(raw(), &progress);

        assert!(matches!(result, Err(ChangelogError::Cancelled)));
    }
}
