//! chlog core - turns working-copy changes into ChangeLog entries.
//!
//! The pipeline runs in four stages:
//!
//! - **Classification**: raw change notifications are grouped into removed,
//!   added and modified files, each group sorted by path
//! - **Extraction**: modified files are diffed line by line against their
//!   ancestor, producing old-side and new-side line ranges
//! - **Planning**: every changed line is mapped to its enclosing function by a
//!   per-language resolver, names are deduplicated in first-seen order
//! - **Emission**: the entry plan is formatted and written into the nearest
//!   ChangeLog file
//!
//! # Example
//!
//! ```no_run
//! use chlog_core::pipeline::{NoProgress, Pipeline, PipelineConfig};
//! use chlog_core::resolver::ResolverRegistry;
//! use chlog_core::source::git::GitSource;
//!
//! let source = GitSource::open(".")?;
//! let resolvers = ResolverRegistry::with_builtin();
//! let pipeline = Pipeline::new(&source, &resolvers, PipelineConfig::default());
//!
//! let changes = source.changes()?;
//! if let Some(plan) = pipeline.prepare(changes, &NoProgress)? {
//!     for entry in &plan.entries {
//!         println!("{} {}", entry.path, entry.function_name);
//!     }
//! }
//! # Ok::<(), chlog_core::ChangelogError>(())
//! ```

pub mod classifier;
pub mod emitter;
pub mod error;
pub mod extractor;
pub mod pipeline;
pub mod planner;
pub mod resolver;
pub mod source;
pub mod types;

pub use error::{ChangelogError, Result};

/// Default name of the changelog file, never reported on itself.
pub const DEFAULT_CHANGELOG_NAME: &str = "ChangeLog";
