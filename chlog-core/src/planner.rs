//! Entry planning: changed ranges to changelog entries.

use std::collections::HashSet;

use crate::resolver::ResolverRegistry;
use crate::types::{ChangelogEntry, DefaultNote, FileChange};

/// Turns classified, extracted file changes into changelog entries.
pub struct EntryPlanner<'a> {
    registry: &'a ResolverRegistry,
}

impl<'a> EntryPlanner<'a> {
    pub fn new(registry: &'a ResolverRegistry) -> Self {
        Self { registry }
    }

    /// Plan entries for `files`, preserving their order.
    pub fn plan(&self, files: &[FileChange]) -> Vec<ChangelogEntry> {
        files.iter().flat_map(|file| self.plan_file(file)).collect()
    }

    /// Entries for a single file.
    ///
    /// Added and removed files get their fixed note and are never resolved.
    /// Modified files get one entry per distinct function name, or a single
    /// unnamed entry when nothing resolves.
    pub fn plan_file(&self, file: &FileChange) -> Vec<ChangelogEntry> {
        if let Some(note) = DefaultNote::for_kind(file.kind) {
            return vec![ChangelogEntry::with_note(file, note)];
        }

        let names = self.guess_function_names(file);
        if names.is_empty() {
            return vec![ChangelogEntry::for_function(file, "")];
        }
        names
            .into_iter()
            .map(|name| ChangelogEntry::for_function(file, name))
            .collect()
    }

    /// Distinct function names touched by `file`'s ranges, in first-seen order.
    pub fn guess_function_names(&self, file: &FileChange) -> Vec<String> {
        let key = file.file_type_key();
        if !self.registry.contains(&key) {
            return Vec::new();
        }

        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for range in &file.ranges {
            let Some(document) = file.document(range.side) else {
                continue;
            };
            for line in range.probe_lines() {
                if line >= document.line_count() {
                    continue;
                }
                let Some(offset) = document.line_offset(line) else {
                    continue;
                };
                if let Some(name) = self.registry.resolve(&key, document, offset) {
                    if seen.insert(name.clone()) {
                        names.push(name);
                    }
                }
            }
        }

        tracing::debug!("{}: {} function names", file.path, names.len());
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{FunctionResolver, Resolution};
    use crate::types::{ChangeKind, Document, LineRange, RawChange, Side};

    /// Resolves each line to the name written on it.
    struct LineNames;

    impl FunctionResolver for LineNames {
        fn resolve(&self, document: &Document, offset: usize) -> Resolution {
            let rest = &document.text()[offset..];
            let name = rest.lines().next().unwrap_or("").trim();
            match name {
                "" => Resolution::NoMatch,
                "!" => Resolution::Failed("bang".to_string()),
                name => Resolution::Match(name.to_string()),
            }
        }
    }

    fn registry() -> ResolverRegistry {
        let mut registry = ResolverRegistry::new();
        registry.register("c", LineNames);
        registry
    }

    fn modified(path: &str, working: &str, ranges: &[(usize, usize)]) -> FileChange {
        let mut file = FileChange::from(RawChange::modified(path));
        file.working = Some(Document::new(working));
        for &(start, len) in ranges {
            file.ranges.push(LineRange::new(start, len, Side::New));
        }
        file
    }

    fn names(entries: &[ChangelogEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.function_name.as_str()).collect()
    }

    #[test]
    fn test_dedup_preserves_first_seen_order() {
        let registry = registry();
        let planner = EntryPlanner::new(&registry);
        let file = modified("x.c", "foo\nbar\nfoo\nbaz\n\n", &[(0, 4)]);

        let entries = planner.plan(&[file]);

        assert_eq!(names(&entries), vec!["foo", "bar", "baz"]);
        assert!(entries.iter().all(|e| e.default_note.is_none()));
    }

    #[test]
    fn test_probe_includes_end_line() {
        let registry = registry();
        let planner = EntryPlanner::new(&registry);
        // Range covers line 0 only; line 1 is still probed
        let file = modified("x.c", "alpha\nbeta\ngamma\n", &[(0, 1)]);

        assert_eq!(planner.guess_function_names(&file), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_lines_past_document_end_are_skipped() {
        let registry = registry();
        let planner = EntryPlanner::new(&registry);
        let file = modified("x.c", "only", &[(0, 5)]);

        assert_eq!(planner.guess_function_names(&file), vec!["only"]);
    }

    #[test]
    fn test_old_ranges_use_ancestor() {
        let registry = registry();
        let planner = EntryPlanner::new(&registry);
        let mut file = modified("x.c", "kept\n", &[]);
        file.ancestor = Some(Document::new("gone\nkept\n"));
        file.ranges.push(LineRange::new(0, 1, Side::Old));

        assert_eq!(planner.guess_function_names(&file), vec!["gone", "kept"]);
    }

    #[test]
    fn test_old_ranges_without_ancestor_are_ignored() {
        let registry = registry();
        let planner = EntryPlanner::new(&registry);
        let mut file = modified("x.c", "kept\n", &[]);
        file.ranges.push(LineRange::new(0, 1, Side::Old));

        assert!(planner.guess_function_names(&file).is_empty());
    }

    #[test]
    fn test_failed_lookup_skips_only_that_line() {
        let registry = registry();
        let planner = EntryPlanner::new(&registry);
        let file = modified("x.c", "!\nmain\n", &[(0, 1)]);

        assert_eq!(planner.guess_function_names(&file), vec!["main"]);
    }

    #[test]
    fn test_no_resolver_yields_unnamed_entry() {
        let registry = registry();
        let planner = EntryPlanner::new(&registry);
        let file = modified("doc.txt", "text\nmore\n", &[(0, 2)]);

        let entries = planner.plan(&[file]);

        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_unnamed());
        assert_eq!(entries[0].default_note, None);
        assert_eq!(entries[0].kind, ChangeKind::Modified);
    }

    #[test]
    fn test_added_and_removed_never_resolve() {
        let registry = registry();
        let planner = EntryPlanner::new(&registry);

        let mut added = FileChange::from(RawChange::added("new.c"));
        added.working = Some(Document::new("foo\n"));
        added.ranges.push(LineRange::new(0, 1, Side::New));
        let removed = FileChange::from(RawChange::removed("old.c"));

        let entries = planner.plan(&[removed, added]);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].path, "old.c");
        assert_eq!(entries[0].default_note, Some(DefaultNote::RemovedFile));
        assert_eq!(entries[1].path, "new.c");
        assert_eq!(entries[1].default_note, Some(DefaultNote::NewFile));
        assert!(entries.iter().all(ChangelogEntry::is_unnamed));
    }

    #[test]
    fn test_output_follows_input_order() {
        let registry = registry();
        let planner = EntryPlanner::new(&registry);
        let files = vec![
            modified("b.c", "two\n", &[(0, 1)]),
            modified("a.c", "one\n", &[(0, 1)]),
        ];

        let entries = planner.plan(&files);
        let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();

        assert_eq!(paths, vec!["b.c", "a.c"]);
    }

    #[test]
    fn test_empty_plan() {
        let registry = registry();
        assert!(EntryPlanner::new(&registry).plan(&[]).is_empty());
    }
}
