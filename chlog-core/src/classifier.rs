//! Groups raw change notifications into removed, added and modified files.

use std::cmp::Ordering;

use serde::Serialize;

use crate::types::{ChangeKind, FileChange, RawChange};

/// Classified file changes, in emission order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct OrderedGroups {
    pub removed: Vec<FileChange>,
    pub added: Vec<FileChange>,
    pub modified: Vec<FileChange>,
}

impl OrderedGroups {
    pub fn len(&self) -> usize {
        self.removed.len() + self.added.len() + self.modified.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate removed, then added, then modified files.
    pub fn iter(&self) -> impl Iterator<Item = &FileChange> {
        self.removed
            .iter()
            .chain(self.added.iter())
            .chain(self.modified.iter())
    }

    /// Flatten into a single list: removed, then added, then modified.
    pub fn into_ordered(self) -> Vec<FileChange> {
        let mut files = self.removed;
        files.extend(self.added);
        files.extend(self.modified);
        files
    }
}

/// Classify raw changes into ordered groups.
///
/// Entries whose final path segment is `changelog_name` are dropped, so the
/// tool never reports on its own output.
pub fn classify<I>(raw_changes: I, changelog_name: &str) -> OrderedGroups
where
    I: IntoIterator<Item = RawChange>,
{
    let mut groups = OrderedGroups::default();

    for raw in raw_changes {
        if raw.file_name() == changelog_name {
            tracing::debug!("Skipping changelog file {}", raw.path);
            continue;
        }
        let bucket = match raw.kind {
            ChangeKind::Removed => &mut groups.removed,
            ChangeKind::Added => &mut groups.added,
            ChangeKind::Modified => &mut groups.modified,
        };
        bucket.push(FileChange::from(raw));
    }

    for bucket in [
        &mut groups.removed,
        &mut groups.added,
        &mut groups.modified,
    ] {
        // Ties on a path are broken so the record kept by dedup does not
        // depend on input order.
        bucket.sort_by(|a, b| {
            compare_paths(&a.path, &b.path)
                .then_with(|| a.direction.precedence().cmp(&b.direction.precedence()))
                .then_with(|| a.resource.cmp(&b.resource))
        });
        bucket.dedup_by(|a, b| a.path == b.path);
    }

    tracing::debug!(
        removed = groups.removed.len(),
        added = groups.added.len(),
        modified = groups.modified.len(),
        "Classified changes"
    );

    groups
}

/// Total order on slash-separated paths: segment by segment, then by the
/// full string.
pub fn compare_paths(a: &str, b: &str) -> Ordering {
    a.split('/').cmp(b.split('/')).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DiffDirection;

    fn paths(files: &[FileChange]) -> Vec<&str> {
        files.iter().map(|f| f.path.as_str()).collect()
    }

    #[test]
    fn test_classify_groups_and_drops_changelog() {
        let raw = vec![
            RawChange::modified("b.c"),
            RawChange::added("a.c"),
            RawChange::removed("c.c"),
            RawChange::modified("ChangeLog"),
        ];

        let groups = classify(raw, "ChangeLog");

        assert_eq!(paths(&groups.removed), vec!["c.c"]);
        assert_eq!(paths(&groups.added), vec!["a.c"]);
        assert_eq!(paths(&groups.modified), vec!["b.c"]);
    }

    #[test]
    fn test_nested_changelog_is_dropped() {
        let raw = vec![
            RawChange::modified("lib/ChangeLog"),
            RawChange::modified("lib/ChangeLog.old"),
        ];
        let groups = classify(raw, "ChangeLog");
        assert_eq!(paths(&groups.modified), vec!["lib/ChangeLog.old"]);
    }

    #[test]
    fn test_order_is_removed_added_modified() {
        let raw = vec![
            RawChange::modified("src/z.rs"),
            RawChange::modified("src/a.rs"),
            RawChange::added("src/new.rs"),
            RawChange::removed("src/old.rs"),
            RawChange::removed("docs/gone.md"),
        ];

        let ordered = classify(raw, "ChangeLog").into_ordered();

        assert_eq!(
            paths(&ordered),
            vec![
                "docs/gone.md",
                "src/old.rs",
                "src/new.rs",
                "src/a.rs",
                "src/z.rs"
            ]
        );
    }

    #[test]
    fn test_sort_is_segment_wise() {
        // Plain string order would put "a-b/x" before "a/b" ('-' < '/')
        let raw = vec![RawChange::added("a-b/x"), RawChange::added("a/b")];
        let groups = classify(raw, "ChangeLog");
        assert_eq!(paths(&groups.added), vec!["a/b", "a-b/x"]);
    }

    #[test]
    fn test_order_is_independent_of_input_order() {
        let raw = vec![
            RawChange::modified("b/x.py"),
            RawChange::added("a.py"),
            RawChange::modified("a/y.py"),
        ];
        let mut reversed = raw.clone();
        reversed.reverse();

        assert_eq!(classify(raw, "ChangeLog"), classify(reversed, "ChangeLog"));
    }

    #[test]
    fn test_duplicates_collapse() {
        let raw = vec![RawChange::modified("x.c"), RawChange::modified("x.c")];
        assert_eq!(classify(raw, "ChangeLog").modified.len(), 1);
    }

    #[test]
    fn test_duplicate_paths_keep_the_same_record_in_any_order() {
        let raw = vec![
            RawChange::modified("x.c"),
            RawChange::modified("x.c").with_direction(DiffDirection::Conflicting),
            RawChange::modified("x.c").with_resource("/work/x.c"),
        ];
        let mut reversed = raw.clone();
        reversed.reverse();

        let groups = classify(raw, "ChangeLog");

        assert_eq!(groups, classify(reversed, "ChangeLog"));
        assert_eq!(groups.modified.len(), 1);
        assert_eq!(groups.modified[0].direction, DiffDirection::Conflicting);
    }

    #[test]
    fn test_empty_input() {
        let groups = classify(Vec::new(), "ChangeLog");
        assert!(groups.is_empty());
        assert!(groups.removed.is_empty());
        assert!(groups.added.is_empty());
        assert!(groups.modified.is_empty());
        assert!(groups.into_ordered().is_empty());
    }
}
