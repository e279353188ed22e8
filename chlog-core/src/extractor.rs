//! Changed-line extraction for modified files.
//!
//! Uses the `similar` crate to run a Myers line diff between the ancestor
//! and the working copy. Every non-equal block is recorded on both sides:
//! new-side ranges locate edited code in the working copy, old-side ranges
//! locate code that only exists in the ancestor (removed functions).

use similar::{Algorithm, DiffTag, TextDiff};

use crate::source::{Fetched, SnapshotSource};
use crate::types::{DiffDirection, Document, FileChange, LineRange, Side};

/// Populates the range sets of modified files.
pub struct ChangeExtractor<S> {
    source: S,
}

impl<S: SnapshotSource> ChangeExtractor<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Fetch both revisions of `file` and record its changed ranges.
    ///
    /// Never fails: missing or undecodable content is logged and leaves the
    /// file with whatever ranges were already recorded, which degrades to an
    /// unnamed changelog entry.
    pub fn extract(&self, file: &mut FileChange) {
        if !file.is_modified() {
            return;
        }
        if file.direction != DiffDirection::Outgoing {
            tracing::debug!(
                "Skipping {}: {:?} change has no local divergence to attribute",
                file.path,
                file.direction
            );
            return;
        }

        let working = match self.source.working(&file.path) {
            Fetched::Found(snapshot) => match snapshot.decode() {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::warn!("Cannot decode working copy of {}: {}", file.path, e);
                    return;
                }
            },
            Fetched::Unavailable => {
                tracing::warn!("No working copy for modified file {}", file.path);
                return;
            }
            Fetched::Failed(reason) => {
                tracing::warn!("Failed to read working copy of {}: {}", file.path, reason);
                return;
            }
        };

        let ancestor = match self.source.ancestor(&file.path) {
            Fetched::Found(snapshot) => match snapshot.decode() {
                Ok(doc) => Some(doc),
                Err(e) => {
                    tracing::warn!("Cannot decode ancestor of {}: {}", file.path, e);
                    file.working = Some(working);
                    return;
                }
            },
            Fetched::Unavailable => None,
            Fetched::Failed(reason) => {
                tracing::warn!("Failed to read ancestor of {}: {}", file.path, reason);
                file.working = Some(working);
                return;
            }
        };

        file.ranges.extend(changed_ranges(ancestor.as_ref(), &working));
        tracing::debug!("{}: {} changed ranges", file.path, file.ranges.len());

        file.ancestor = ancestor;
        file.working = Some(working);
    }
}

/// Compute the changed line ranges between `ancestor` and `working`.
///
/// Without an ancestor the working copy is compared against empty text and
/// only new-side ranges are produced.
pub fn changed_ranges(ancestor: Option<&Document>, working: &Document) -> Vec<LineRange> {
    let old_text = ancestor.map(Document::text).unwrap_or("");
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_lines(old_text, working.text());

    let mut ranges = Vec::new();
    for op in diff.ops() {
        let (tag, old, new) = op.as_tag_tuple();
        if tag == DiffTag::Equal {
            continue;
        }
        ranges.push(LineRange::new(new.start, new.len(), Side::New));
        if ancestor.is_some() {
            ranges.push(LineRange::new(old.start, old.len(), Side::Old));
        }
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use crate::types::RawChange;

    fn modified(path: &str) -> FileChange {
        FileChange::from(RawChange::modified(path))
    }

    fn spans(ranges: &[LineRange], side: Side) -> Vec<(usize, usize)> {
        ranges
            .iter()
            .filter(|r| r.side == side)
            .map(|r| (r.start, r.end))
            .collect()
    }

    #[test]
    fn test_replaced_line() {
        let old = Document::new("a\nb\nc\n");
        let new = Document::new("a\nB\nc\n");

        let ranges = changed_ranges(Some(&old), &new);

        assert_eq!(spans(&ranges, Side::New), vec![(1, 2)]);
        assert_eq!(spans(&ranges, Side::Old), vec![(1, 2)]);
        // New side is recorded first for each block
        assert_eq!(ranges[0].side, Side::New);
    }

    #[test]
    fn test_pure_deletion_yields_one_line_new_range() {
        let old = Document::new("a\nb\nc\nd\ne\nf\ng\n");
        let new = Document::new("a\nb\nc\nd\ne\ng\n");

        let ranges = changed_ranges(Some(&old), &new);

        // Line "f" (old line 5) was removed; new side is empty at line 5
        assert_eq!(spans(&ranges, Side::Old), vec![(5, 6)]);
        assert_eq!(spans(&ranges, Side::New), vec![(5, 6)]);
    }

    #[test]
    fn test_pure_insertion_yields_one_line_old_range() {
        let old = Document::new("a\nb\n");
        let new = Document::new("a\nx\ny\nb\n");

        let ranges = changed_ranges(Some(&old), &new);

        assert_eq!(spans(&ranges, Side::New), vec![(1, 3)]);
        assert_eq!(spans(&ranges, Side::Old), vec![(1, 2)]);
    }

    #[test]
    fn test_identical_texts_have_no_ranges() {
        let doc = Document::new("same\ntext\n");
        assert!(changed_ranges(Some(&doc), &doc).is_empty());
    }

    #[test]
    fn test_without_ancestor_only_new_side() {
        let new = Document::new("a\nb\n");
        let ranges = changed_ranges(None, &new);
        assert!(!ranges.is_empty());
        assert!(ranges.iter().all(|r| r.side == Side::New));
    }

    #[test]
    fn test_extract_populates_documents() {
        let source = MemorySource::new().with_file("x.c", "int a;\n", "int b;\n");
        let extractor = ChangeExtractor::new(&source);

        let mut file = modified("x.c");
        extractor.extract(&mut file);

        assert_eq!(file.ranges.len(), 2);
        assert!(file.ancestor.is_some());
        assert!(file.working.is_some());
    }

    #[test]
    fn test_extract_missing_ancestor_records_new_side_only() {
        let source = MemorySource::new().with_working("x.c", "int a;\nint b;\n");
        let extractor = ChangeExtractor::new(&source);

        let mut file = modified("x.c");
        extractor.extract(&mut file);

        assert!(file.ancestor.is_none());
        assert!(!file.ranges.is_empty());
        assert_eq!(file.ranges.side(Side::Old).count(), 0);
    }

    #[test]
    fn test_extract_skips_non_outgoing() {
        let source = MemorySource::new().with_file("x.c", "a\n", "b\n");
        let extractor = ChangeExtractor::new(&source);

        let mut file = FileChange::from(
            RawChange::modified("x.c").with_direction(DiffDirection::Incoming),
        );
        extractor.extract(&mut file);

        assert!(file.ranges.is_empty());
    }

    #[test]
    fn test_extract_undecodable_working_copy() {
        let source = MemorySource::new()
            .with_ancestor("bin.dat", "a\n")
            .with_working("bin.dat", crate::source::Snapshot::new(vec![0xFF, 0xFE]));
        let extractor = ChangeExtractor::new(&source);

        let mut file = modified("bin.dat");
        extractor.extract(&mut file);

        assert!(file.ranges.is_empty());
        assert!(file.working.is_none());
    }

    /// Working copy readable, ancestor fetch always fails.
    struct BrokenHistory;

    impl SnapshotSource for BrokenHistory {
        fn ancestor(&self, _path: &str) -> Fetched<crate::source::Snapshot> {
            Fetched::Failed("bad revision".to_string())
        }

        fn working(&self, _path: &str) -> Fetched<crate::source::Snapshot> {
            Fetched::Found("int a;\nint b;\n".into())
        }
    }

    #[test]
    fn test_extract_ancestor_failure_records_no_ranges() {
        let extractor = ChangeExtractor::new(BrokenHistory);

        let mut file = modified("x.c");
        extractor.extract(&mut file);

        assert!(file.ranges.is_empty());
        assert!(file.ancestor.is_none());
        assert!(file.working.is_some());
    }

    #[test]
    fn test_extract_ignores_added_files() {
        let source = MemorySource::new().with_working("n.c", "new\n");
        let extractor = ChangeExtractor::new(&source);

        let mut file = FileChange::from(RawChange::added("n.c"));
        extractor.extract(&mut file);

        assert!(file.ranges.is_empty());
    }
}
