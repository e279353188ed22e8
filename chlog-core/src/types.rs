//! Data model shared by every pipeline stage.
//!
//! A run starts from [`RawChange`] notifications, turns them into
//! [`FileChange`] records carrying [`LineRange`]s, and ends with an ordered
//! list of [`ChangelogEntry`] items.

use std::ops::RangeInclusive;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

/// Kind of change detected for a file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Added => "added",
            ChangeKind::Removed => "removed",
            ChangeKind::Modified => "modified",
        }
    }

    /// Single-letter status indicator.
    pub fn indicator(&self) -> char {
        match self {
            ChangeKind::Added => 'A',
            ChangeKind::Removed => 'D',
            ChangeKind::Modified => 'M',
        }
    }
}

/// Direction of a three-way difference.
///
/// Only `Outgoing` changes (local edits relative to the common ancestor) are
/// diffed for function names.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffDirection {
    #[default]
    Outgoing,
    Incoming,
    Conflicting,
}

impl DiffDirection {
    /// Rank used when several records report the same path; lower wins.
    pub fn precedence(&self) -> u8 {
        match self {
            DiffDirection::Conflicting => 0,
            DiffDirection::Incoming => 1,
            DiffDirection::Outgoing => 2,
        }
    }
}

/// Which side of a diff a line range indexes into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The ancestor snapshot.
    Old,
    /// The working copy.
    New,
}

/// A contiguous span of changed lines on one side of a diff.
///
/// Zero-based and half-open; `start < end` always holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
    pub side: Side,
}

impl LineRange {
    /// Create a range of `len` lines starting at `start`.
    ///
    /// A zero length is widened to one line so that insert-only and
    /// delete-only hunks still point at a line on this side.
    pub fn new(start: usize, len: usize, side: Side) -> Self {
        Self {
            start,
            end: start + len.max(1),
            side,
        }
    }

    /// Number of lines covered.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains(&self, line: usize) -> bool {
        (self.start..self.end).contains(&line)
    }

    /// Lines probed for function names: `start` through `end`, both included.
    ///
    /// The trailing line is the first unchanged line after the hunk, which is
    /// where a deletion at the end of a function body still lands.
    pub fn probe_lines(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }
}

/// Ordered collection of line ranges for one file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RangeSet {
    ranges: Vec<LineRange>,
}

impl RangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, range: LineRange) {
        self.ranges.push(range);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LineRange> {
        self.ranges.iter()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Ranges recorded for one side only.
    pub fn side(&self, side: Side) -> impl Iterator<Item = &LineRange> {
        self.ranges.iter().filter(move |r| r.side == side)
    }
}

impl<'a> IntoIterator for &'a RangeSet {
    type Item = &'a LineRange;
    type IntoIter = std::slice::Iter<'a, LineRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}

impl Extend<LineRange> for RangeSet {
    fn extend<T: IntoIterator<Item = LineRange>>(&mut self, iter: T) {
        self.ranges.extend(iter);
    }
}

/// Decoded text of one file revision, indexed by line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    text: String,
    line_starts: Vec<usize>,
    fingerprint: u64,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        let fingerprint = xxh3_64(text.as_bytes());
        Self {
            text,
            line_starts,
            fingerprint,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of lines: line delimiters plus one.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Byte offset where `line` begins, or `None` past the end.
    pub fn line_offset(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line).copied()
    }

    /// Text of `line` without its terminator.
    pub fn line(&self, line: usize) -> Option<&str> {
        let start = self.line_offset(line)?;
        let end = self
            .line_offset(line + 1)
            .map(|next| next - 1)
            .unwrap_or(self.text.len());
        Some(self.text[start..end].trim_end_matches('\r'))
    }

    /// xxh3 hash of the text, used to key per-document caches.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }
}

/// A change notification as reported by a change source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawChange {
    /// Project-relative, slash-separated path.
    pub path: String,
    pub kind: ChangeKind,
    #[serde(default)]
    pub direction: DiffDirection,
    /// Location of the working file, when one exists.
    #[serde(default)]
    pub resource: Option<PathBuf>,
}

impl RawChange {
    pub fn new(path: impl Into<String>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
            direction: DiffDirection::Outgoing,
            resource: None,
        }
    }

    pub fn added(path: impl Into<String>) -> Self {
        Self::new(path, ChangeKind::Added)
    }

    pub fn removed(path: impl Into<String>) -> Self {
        Self::new(path, ChangeKind::Removed)
    }

    pub fn modified(path: impl Into<String>) -> Self {
        Self::new(path, ChangeKind::Modified)
    }

    pub fn with_direction(mut self, direction: DiffDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_resource(mut self, resource: impl Into<PathBuf>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Final path segment.
    pub fn file_name(&self) -> &str {
        file_name(&self.path)
    }
}

/// One file touched by the change set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileChange {
    pub path: String,
    pub kind: ChangeKind,
    pub direction: DiffDirection,
    #[serde(skip)]
    pub resource: Option<PathBuf>,
    pub ranges: RangeSet,
    #[serde(skip)]
    pub ancestor: Option<Document>,
    #[serde(skip)]
    pub working: Option<Document>,
}

impl FileChange {
    pub fn is_modified(&self) -> bool {
        self.kind == ChangeKind::Modified
    }

    /// Document a range on `side` indexes into.
    pub fn document(&self, side: Side) -> Option<&Document> {
        match side {
            Side::Old => self.ancestor.as_ref(),
            Side::New => self.working.as_ref(),
        }
    }

    /// Resolver dispatch key for this file.
    pub fn file_type_key(&self) -> String {
        file_type_key(&self.path)
    }
}

impl From<RawChange> for FileChange {
    fn from(raw: RawChange) -> Self {
        Self {
            path: raw.path,
            kind: raw.kind,
            direction: raw.direction,
            resource: raw.resource,
            ranges: RangeSet::new(),
            ancestor: None,
            working: None,
        }
    }
}

/// Fixed annotation replacing function attribution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultNote {
    NewFile,
    RemovedFile,
}

impl DefaultNote {
    pub fn text(&self) -> &'static str {
        match self {
            DefaultNote::NewFile => "new file.",
            DefaultNote::RemovedFile => "removed file.",
        }
    }

    /// Note attached to files of `kind`, if any.
    pub fn for_kind(kind: ChangeKind) -> Option<Self> {
        match kind {
            ChangeKind::Added => Some(DefaultNote::NewFile),
            ChangeKind::Removed => Some(DefaultNote::RemovedFile),
            ChangeKind::Modified => None,
        }
    }
}

/// One line item of the changelog plan.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangelogEntry {
    pub path: String,
    pub kind: ChangeKind,
    /// Empty for whole-file entries.
    pub function_name: String,
    pub default_note: Option<DefaultNote>,
}

impl ChangelogEntry {
    /// Entry for an added or removed file.
    pub fn with_note(file: &FileChange, note: DefaultNote) -> Self {
        Self {
            path: file.path.clone(),
            kind: file.kind,
            function_name: String::new(),
            default_note: Some(note),
        }
    }

    /// Entry naming a function of a modified file; an empty name is unnamed.
    pub fn for_function(file: &FileChange, function_name: impl Into<String>) -> Self {
        Self {
            path: file.path.clone(),
            kind: file.kind,
            function_name: function_name.into(),
            default_note: None,
        }
    }

    pub fn is_unnamed(&self) -> bool {
        self.function_name.is_empty()
    }
}

/// Final segment of a slash-separated path.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Dispatch key for resolvers and formatters: the lowercased extension, or
/// the file name itself when it has none (`Makefile`, `ChangeLog`).
pub fn file_type_key(path: &str) -> String {
    let name = file_name(path);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext.to_ascii_lowercase(),
        _ => name.to_string(),
    }
}
