//! Change sources: where raw changes and file snapshots come from.
//!
//! The pipeline never talks to a version-control system directly. It asks a
//! [`SnapshotSource`] for ancestor and working-copy contents, and receives
//! its [`RawChange`](crate::types::RawChange) list from the caller.

use std::collections::HashMap;

use crate::types::Document;

pub mod git;
pub mod tree;

/// Outcome of fetching content that may legitimately be absent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fetched<T> {
    /// Content was retrieved.
    Found(T),
    /// Nothing exists to fetch (e.g. a file with no ancestor revision).
    Unavailable,
    /// Fetching was attempted and failed.
    Failed(String),
}

/// Raw bytes of one file revision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    bytes: Vec<u8>,
}

impl Snapshot {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Decode as UTF-8, stripping a leading byte-order mark.
    pub fn decode(self) -> Result<Document, std::string::FromUtf8Error> {
        let mut bytes = self.bytes;
        if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
            bytes.drain(..3);
        }
        String::from_utf8(bytes).map(Document::new)
    }
}

impl From<&str> for Snapshot {
    fn from(text: &str) -> Self {
        Snapshot::new(text.as_bytes())
    }
}

/// Capability for reading both sides of a modified file.
pub trait SnapshotSource {
    /// Pre-change content of `path`.
    fn ancestor(&self, path: &str) -> Fetched<Snapshot>;

    /// Current working-copy content of `path`.
    fn working(&self, path: &str) -> Fetched<Snapshot>;
}

impl<S: SnapshotSource + ?Sized> SnapshotSource for &S {
    fn ancestor(&self, path: &str) -> Fetched<Snapshot> {
        (**self).ancestor(path)
    }

    fn working(&self, path: &str) -> Fetched<Snapshot> {
        (**self).working(path)
    }
}

/// In-memory snapshot source, keyed by path.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    ancestors: HashMap<String, Snapshot>,
    working: HashMap<String, Snapshot>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ancestor(mut self, path: &str, content: impl Into<Snapshot>) -> Self {
        self.ancestors.insert(path.to_string(), content.into());
        self
    }

    pub fn with_working(mut self, path: &str, content: impl Into<Snapshot>) -> Self {
        self.working.insert(path.to_string(), content.into());
        self
    }

    /// Register both revisions of a modified file.
    pub fn with_file(self, path: &str, ancestor: &str, working: &str) -> Self {
        self.with_ancestor(path, ancestor).with_working(path, working)
    }
}

impl SnapshotSource for MemorySource {
    fn ancestor(&self, path: &str) -> Fetched<Snapshot> {
        match self.ancestors.get(path) {
            Some(snapshot) => Fetched::Found(snapshot.clone()),
            None => Fetched::Unavailable,
        }
    }

    fn working(&self, path: &str) -> Fetched<Snapshot> {
        match self.working.get(path) {
            Some(snapshot) => Fetched::Found(snapshot.clone()),
            None => Fetched::Unavailable,
        }
    }
}
