//! chlog configuration loading from `.chlogrc.toml`.
//!
//! Configuration is optional; every setting has a default, and the author
//! falls back to git's `user.name` / `user.email`.
//!
//! # Example Configuration
//!
//! ```toml
//! [author]
//! name = "Jane Doe"
//! email = "jane@example.com"
//!
//! [changelog]
//! name = "ChangeLog"
//! formatter = "gnu"
//! create_missing = false
//!
//! [changelog.formatters]
//! py = "gnu"
//!
//! [resolver]
//! languages = ["rust", "python"]
//!
//! [output]
//! format = "table"
//! color = true
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use chlog_core::emitter::FormatterRegistry;
use chlog_core::source::git::GitSource;
use chlog_core::DEFAULT_CHANGELOG_NAME;

/// Name of the configuration file looked up in the project root.
pub const CONFIG_FILE: &str = ".chlogrc.toml";

/// Errors from strict configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Root configuration loaded from `.chlogrc.toml`.
#[derive(Debug, Deserialize, Default)]
pub struct ChlogConfig {
    /// Who the entries are attributed to.
    #[serde(default)]
    pub author: AuthorConfig,

    /// Changelog file naming and formatting.
    #[serde(default)]
    pub changelog: ChangelogConfig,

    /// Function resolver selection.
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Output formatting preferences.
    #[serde(default)]
    pub output: OutputSettings,
}

#[derive(Debug, Deserialize, Default)]
pub struct AuthorConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangelogConfig {
    /// Changelog file name.
    ///
    /// Default: `ChangeLog`
    #[serde(default = "default_changelog_name")]
    pub name: String,

    /// Formatter preference; unset means the per-file-type default.
    #[serde(default)]
    pub formatter: Option<String>,

    /// Create `<root>/<name>` when no changelog exists.
    #[serde(default)]
    pub create_missing: bool,

    /// Formatter per file-type key (lowercased extension).
    #[serde(default)]
    pub formatters: HashMap<String, String>,
}

fn default_changelog_name() -> String {
    DEFAULT_CHANGELOG_NAME.to_string()
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            name: default_changelog_name(),
            formatter: None,
            create_missing: false,
            formatters: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct ResolverConfig {
    /// Languages to resolve function names for.
    ///
    /// Unset resolves every built-in language: `rust`, `python`, `go`,
    /// `java`, `javascript`, `typescript`, `tsx`, `csharp`.
    #[serde(default)]
    pub languages: Option<Vec<String>>,
}

/// Output formatting preferences. Command-line flags win.
#[derive(Debug, Deserialize, Default)]
pub struct OutputSettings {
    /// `table` or `json`.
    #[serde(default)]
    pub format: Option<String>,

    #[serde(default)]
    pub color: Option<bool>,
}

impl ChlogConfig {
    /// Load `.chlogrc.toml` from `root`, falling back to defaults.
    ///
    /// Read and parse errors are logged as warnings.
    pub fn load(root: &Path) -> Self {
        match Self::try_load(root) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }

    /// Top level of the git working copy containing `dir`, or `dir` itself
    /// outside a repository.
    pub fn project_root(dir: &Path) -> PathBuf {
        GitSource::open(dir)
            .map(|source| source.root().to_path_buf())
            .unwrap_or_else(|_| dir.to_path_buf())
    }

    /// Load `.chlogrc.toml` from `root`, failing on unreadable or invalid
    /// files. A missing file yields the defaults.
    pub fn try_load(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Check if function names should be resolved for `lang`.
    pub fn should_resolve_language(&self, lang: &str) -> bool {
        match &self.resolver.languages {
            None => true,
            Some(langs) => langs.iter().any(|l| l.eq_ignore_ascii_case(lang)),
        }
    }

    /// Built-in formatters with the configured per-file-type choices.
    pub fn formatter_registry(&self) -> FormatterRegistry {
        let mut registry = FormatterRegistry::new();
        for (key, name) in &self.changelog.formatters {
            registry.map_key(&key.to_ascii_lowercase(), name);
        }
        registry
    }

    pub fn default_format(&self) -> Option<&str> {
        self.output.format.as_deref()
    }

    pub fn use_color(&self) -> Option<bool> {
        self.output.color
    }
}
