//! Finding the changelog file responsible for a path.

use std::path::{Component, Path, PathBuf};

use crate::DEFAULT_CHANGELOG_NAME;

/// Resolves project paths to the changelog file that records them.
#[derive(Clone, Debug)]
pub struct ChangelogLocator {
    root: PathBuf,
    name: String,
    create_missing: bool,
}

impl ChangelogLocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            name: DEFAULT_CHANGELOG_NAME.to_string(),
            create_missing: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Fall back to `<root>/<name>` when no changelog exists yet.
    pub fn create_missing(mut self, create: bool) -> Self {
        self.create_missing = create;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Nearest changelog at or above the directory of `path`.
    ///
    /// `path` is project-relative. Removed files are looked up from their
    /// former directory, which may no longer exist.
    pub fn locate(&self, path: &str) -> Option<PathBuf> {
        let mut dir = self.root.join(path);
        while dir.pop() && dir.starts_with(&self.root) {
            let candidate = dir.join(&self.name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }

        self.create_missing.then(|| self.root.join(&self.name))
    }

    /// `path` as written in `changelog`: relative to its directory, slash
    /// separated.
    pub fn display_path(&self, changelog: &Path, path: &str) -> String {
        let absolute = self.root.join(path);
        let base = changelog.parent().unwrap_or(&self.root);
        match absolute.strip_prefix(base) {
            Ok(relative) => relative
                .components()
                .filter_map(|c| match c {
                    Component::Normal(part) => part.to_str(),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("/"),
            Err(_) => path.to_string(),
        }
    }
}
