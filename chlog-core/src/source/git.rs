//! Git-backed change source.
//!
//! Changes are the working copy's differences from `HEAD`, as reported by
//! `git status`. Ancestors are read with `git show HEAD:<path>`, working
//! files straight from disk.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{ChangelogError, Result};
use crate::types::{ChangeKind, DiffDirection, RawChange};

use super::{Fetched, Snapshot, SnapshotSource};

/// A git working copy.
#[derive(Clone, Debug)]
pub struct GitSource {
    root: PathBuf,
    revision: String,
}

impl GitSource {
    /// Open the working copy containing `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let output = Command::new("git")
            .arg("-C")
            .arg(dir)
            .args(["rev-parse", "--show-toplevel"])
            .output()
            .map_err(|source| ChangelogError::GitLaunch { source })?;

        if !output.status.success() {
            return Err(ChangelogError::NotARepository {
                path: dir.to_path_buf(),
            });
        }

        let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
        tracing::debug!("Opened git working copy at {}", root);

        Ok(Self {
            root: PathBuf::from(root),
            revision: "HEAD".to_string(),
        })
    }

    /// Top-level directory of the working copy.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List working-copy changes relative to `HEAD`.
    pub fn changes(&self) -> Result<Vec<RawChange>> {
        let stdout = self.git(&["status", "--porcelain=v1", "-z", "--untracked-files=all"])?;
        let changes = parse_porcelain(&stdout)?
            .into_iter()
            .map(|raw| {
                if raw.kind == ChangeKind::Removed {
                    raw
                } else {
                    let resource = self.root.join(&raw.path);
                    raw.with_resource(resource)
                }
            })
            .collect::<Vec<_>>();

        tracing::info!("git reported {} changed files", changes.len());
        Ok(changes)
    }

    /// Read a git configuration value such as `user.name`.
    pub fn config_value(&self, key: &str) -> Option<String> {
        let stdout = self.git(&["config", "--get", key]).ok()?;
        let value = String::from_utf8_lossy(&stdout).trim().to_string();
        (!value.is_empty()).then_some(value)
    }

    fn git(&self, args: &[&str]) -> Result<Vec<u8>> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.root)
            .args(args)
            // Untranslated messages, matched by `missing_at_revision`
            .env("LC_ALL", "C")
            .output()
            .map_err(|source| ChangelogError::GitLaunch { source })?;

        if !output.status.success() {
            return Err(ChangelogError::Git {
                command: args.first().copied().unwrap_or_default().to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }

    /// Whether the ancestor revision is an unborn `HEAD` (no commits yet).
    fn is_unborn(&self) -> bool {
        self.revision == "HEAD"
            && matches!(
                self.git(&["rev-parse", "--verify", "--quiet", "HEAD"]),
                Err(ChangelogError::Git { .. })
            )
    }
}

impl SnapshotSource for GitSource {
    fn ancestor(&self, path: &str) -> Fetched<Snapshot> {
        let spec = format!("{}:{}", self.revision, path);
        match self.git(&["show", &spec]) {
            Ok(bytes) => Fetched::Found(Snapshot::new(bytes)),
            Err(ChangelogError::Git { stderr, .. })
                if missing_at_revision(&stderr) || self.is_unborn() =>
            {
                tracing::debug!("No ancestor for {}: {}", path, stderr);
                Fetched::Unavailable
            }
            Err(e) => Fetched::Failed(e.to_string()),
        }
    }

    fn working(&self, path: &str) -> Fetched<Snapshot> {
        let full = self.root.join(path);
        match std::fs::read(&full) {
            Ok(bytes) => Fetched::Found(Snapshot::new(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Fetched::Unavailable,
            Err(e) => Fetched::Failed(format!("{}: {}", full.display(), e)),
        }
    }
}

/// Whether `git show REV:path` failed because the path is absent at `REV`.
fn missing_at_revision(stderr: &str) -> bool {
    stderr.contains("does not exist in") || stderr.contains("exists on disk, but not in")
}

/// Parse `git status --porcelain=v1 -z` output.
///
/// Renames and copies become a removal of the origin (renames only) plus an
/// addition of the destination. Unmerged paths are reported as conflicting
/// modifications. Ignored entries and additions deleted again before commit
/// are dropped, as are paths that are not valid UTF-8.
pub fn parse_porcelain(stdout: &[u8]) -> Result<Vec<RawChange>> {
    let mut fields = stdout.split(|&b| b == 0).filter(|f| !f.is_empty());
    let mut changes = Vec::new();

    while let Some(field) = fields.next() {
        if field.len() < 4 || field[2] != b' ' {
            return Err(ChangelogError::Parse {
                what: "git status".to_string(),
                message: format!("malformed entry {:?}", String::from_utf8_lossy(field)),
            });
        }
        let (x, y) = (char::from(field[0]), char::from(field[1]));
        let has_origin = matches!(x, 'R' | 'C') || matches!(y, 'R' | 'C');
        let origin = if has_origin {
            let origin = fields.next().ok_or_else(|| ChangelogError::Parse {
                what: "git status".to_string(),
                message: format!(
                    "rename of {} has no origin",
                    String::from_utf8_lossy(&field[3..])
                ),
            })?;
            Some(origin)
        } else {
            None
        };

        let Some(path) = decode_path(&field[3..]) else {
            continue;
        };

        match (x, y) {
            ('!', '!') => {}
            ('?', '?') => changes.push(RawChange::added(path)),
            ('D', 'D') => changes.push(
                RawChange::removed(path).with_direction(DiffDirection::Conflicting),
            ),
            ('U', _) | (_, 'U') | ('A', 'A') => changes.push(
                RawChange::modified(path).with_direction(DiffDirection::Conflicting),
            ),
            ('R', _) | (_, 'R') => {
                if let Some(origin) = origin.and_then(decode_path) {
                    changes.push(RawChange::removed(origin));
                }
                changes.push(RawChange::added(path));
            }
            // Origin path is unchanged
            ('C', _) | (_, 'C') => changes.push(RawChange::added(path)),
            ('A', 'D') => {}
            ('A', _) => changes.push(RawChange::added(path)),
            ('D', _) | (_, 'D') => changes.push(RawChange::removed(path)),
            ('M' | 'T', _) | (_, 'M' | 'T') => changes.push(RawChange::modified(path)),
            _ => {
                tracing::debug!("Ignoring status {}{} for {}", x, y, path);
            }
        }
    }

    Ok(changes)
}

fn decode_path(bytes: &[u8]) -> Option<String> {
    match std::str::from_utf8(bytes) {
        Ok(path) => Some(path.to_string()),
        Err(_) => {
            tracing::warn!(
                "Skipping non-UTF-8 path {}",
                String::from_utf8_lossy(bytes)
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::ChangeExtractor;
    use crate::types::FileChange;

    #[test]
    fn test_parse_porcelain_basic_states() {
        let stdout = b" M src/lib.rs\0A  src/new.rs\0 D old.txt\0?? notes.md\0!! target/x\0";
        let changes = parse_porcelain(stdout).unwrap();

        let summary: Vec<_> = changes
            .iter()
            .map(|c| (c.kind, c.path.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (ChangeKind::Modified, "src/lib.rs"),
                (ChangeKind::Added, "src/new.rs"),
                (ChangeKind::Removed, "old.txt"),
                (ChangeKind::Added, "notes.md"),
            ]
        );
        assert!(changes
            .iter()
            .all(|c| c.direction == DiffDirection::Outgoing));
    }

    #[test]
    fn test_parse_porcelain_rename() {
        let stdout = b"R  lib/new_name.c\0lib/old_name.c\0MM b.c\0";
        let changes = parse_porcelain(stdout).unwrap();

        assert_eq!(changes.len(), 3);
        assert_eq!(changes[0], RawChange::removed("lib/old_name.c"));
        assert_eq!(changes[1], RawChange::added("lib/new_name.c"));
        assert_eq!(changes[2], RawChange::modified("b.c"));
    }

    #[test]
    fn test_parse_porcelain_conflicts() {
        let stdout = b"UU merge.rs\0AA both.rs\0";
        let changes = parse_porcelain(stdout).unwrap();
        assert!(changes
            .iter()
            .all(|c| c.kind == ChangeKind::Modified && c.direction == DiffDirection::Conflicting));
    }

    #[test]
    fn test_parse_porcelain_added_then_deleted_is_dropped() {
        let changes = parse_porcelain(b"AD scratch.txt\0").unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn test_parse_porcelain_paths_with_spaces() {
        let changes = parse_porcelain(b" M docs/user guide.md\0").unwrap();
        assert_eq!(changes[0].path, "docs/user guide.md");
    }

    #[test]
    fn test_parse_porcelain_malformed() {
        assert!(parse_porcelain(b"garbage\0").is_err());
        assert!(parse_porcelain(b"R  only-new.c\0").is_err());
    }

    #[test]
    fn test_parse_porcelain_empty() {
        assert!(parse_porcelain(b"").unwrap().is_empty());
    }

    #[test]
    fn test_parse_porcelain_skips_non_utf8_paths() {
        let stdout = b" M bad\xFFname.c\0R  renamed.c\0old\xFE.c\0 M good.c\0";
        let changes = parse_porcelain(stdout).unwrap();

        assert_eq!(
            changes,
            vec![RawChange::added("renamed.c"), RawChange::modified("good.c")]
        );
    }

    #[test]
    fn test_missing_at_revision() {
        assert!(missing_at_revision(
            "fatal: path 'a.c' does not exist in 'HEAD'"
        ));
        assert!(missing_at_revision(
            "fatal: path 'a.c' exists on disk, but not in 'HEAD'"
        ));
        assert!(!missing_at_revision(
            "fatal: invalid object name 'no-such-rev'."
        ));
    }

    fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn run_git(dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .current_dir(dir)
            .args(["-c", "user.name=Test", "-c", "user.email=test@example.com"])
            .args(["-c", "commit.gpgsign=false"])
            .args(args)
            .output()
            .expect("Failed to run git")
            .status;
        assert!(status.success(), "git {:?} failed", args);
    }

    /// Repository with a committed five-line `a.c` whose third line is edited.
    fn edited_repo() -> tempfile::TempDir {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.c"), "l1\nl2\nl3\nl4\nl5\n").unwrap();
        run_git(dir.path(), &["init", "-q"]);
        run_git(dir.path(), &["add", "-A"]);
        run_git(dir.path(), &["commit", "-q", "-m", "initial"]);
        std::fs::write(dir.path().join("a.c"), "l1\nl2\nL3\nl4\nl5\n").unwrap();
        dir
    }

    #[test]
    fn test_ancestor_found_and_missing() {
        if !git_available() {
            return;
        }
        let dir = edited_repo();
        let source = GitSource::open(dir.path()).unwrap();

        assert_eq!(
            source.ancestor("a.c"),
            Fetched::Found(Snapshot::from("l1\nl2\nl3\nl4\nl5\n"))
        );
        assert_eq!(source.ancestor("missing.c"), Fetched::Unavailable);
    }

    #[test]
    fn test_ancestor_of_unborn_head_is_unavailable() {
        if !git_available() {
            return;
        }
        let dir = tempfile::TempDir::new().unwrap();
        run_git(dir.path(), &["init", "-q"]);
        std::fs::write(dir.path().join("a.c"), "int a;\n").unwrap();

        let source = GitSource::open(dir.path()).unwrap();
        assert_eq!(source.ancestor("a.c"), Fetched::Unavailable);
    }

    #[test]
    fn test_bad_revision_stops_extraction() {
        if !git_available() {
            return;
        }
        let dir = edited_repo();
        let source = GitSource {
            revision: "no-such-rev".to_string(),
            ..GitSource::open(dir.path()).unwrap()
        };

        assert!(matches!(source.ancestor("a.c"), Fetched::Failed(_)));

        let mut file = FileChange::from(RawChange::modified("a.c"));
        ChangeExtractor::new(&source).extract(&mut file);
        assert!(file.ranges.is_empty());
        assert!(file.ancestor.is_none());
    }
}
