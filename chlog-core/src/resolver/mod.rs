//! Function-name resolution for changed lines.
//!
//! A [`FunctionResolver`] answers "which function encloses this offset?" for
//! one kind of file. Resolvers are looked up in a [`ResolverRegistry`] by
//! file-type key (see [`file_type_key`](crate::types::file_type_key)); a key
//! with no resolver simply never matches.

use std::collections::HashMap;
use std::sync::Arc;

use crate::types::Document;

mod helpers;
pub mod languages;
pub mod treesitter;

pub use languages::{LanguageSpec, LANGUAGES};
pub use treesitter::TreeSitterResolver;

/// Result of a single lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Name of the enclosing function or unit.
    Match(String),
    /// The offset is not inside any named unit.
    NoMatch,
    /// The resolver could not process the document.
    Failed(String),
}

/// Maps an offset in a document to the name of its enclosing function.
pub trait FunctionResolver: Send + Sync {
    /// Resolve the unit enclosing byte `offset` of `document`.
    fn resolve(&self, document: &Document, offset: usize) -> Resolution;
}

/// Resolvers keyed by file-type key.
#[derive(Clone, Default)]
pub struct ResolverRegistry {
    resolvers: HashMap<String, Arc<dyn FunctionResolver>>,
}

impl ResolverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a tree-sitter resolver for every built-in language.
    pub fn with_builtin() -> Self {
        Self::with_languages(|_| true)
    }

    /// Registry with the built-in languages accepted by `include`.
    ///
    /// `include` receives the language name (`"rust"`, `"python"`, ...).
    pub fn with_languages(include: impl Fn(&str) -> bool) -> Self {
        let mut registry = Self::new();
        for spec in LANGUAGES.iter().filter(|spec| include(spec.name)) {
            let resolver: Arc<dyn FunctionResolver> = Arc::new(TreeSitterResolver::new(spec));
            for ext in spec.extensions {
                registry.register_shared(ext, resolver.clone());
            }
        }
        tracing::debug!("Registered resolvers for {} file types", registry.len());
        registry
    }

    /// Register `resolver` under `key`, replacing any previous one.
    pub fn register(&mut self, key: &str, resolver: impl FunctionResolver + 'static) {
        self.register_shared(key, Arc::new(resolver));
    }

    /// Register an already shared resolver under `key`.
    pub fn register_shared(&mut self, key: &str, resolver: Arc<dyn FunctionResolver>) {
        self.resolvers.insert(key.to_string(), resolver);
    }

    pub fn get(&self, key: &str) -> Option<&Arc<dyn FunctionResolver>> {
        self.resolvers.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.resolvers.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.resolvers.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Resolve `offset` in `document` with the resolver for `key`.
    ///
    /// Returns `None` when no resolver is registered, when nothing matches,
    /// or when the resolver fails (the failure is logged).
    pub fn resolve(&self, key: &str, document: &Document, offset: usize) -> Option<String> {
        let resolver = self.resolvers.get(key)?;
        match resolver.resolve(document, offset) {
            Resolution::Match(name) => {
                let name = name.trim();
                (!name.is_empty()).then(|| name.to_string())
            }
            Resolution::NoMatch => None,
            Resolution::Failed(reason) => {
                tracing::error!("Resolver for '{}' failed at offset {}: {}", key, offset, reason);
                None
            }
        }
    }
}

impl std::fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Resolution);

    impl FunctionResolver for Fixed {
        fn resolve(&self, _document: &Document, _offset: usize) -> Resolution {
            self.0.clone()
        }
    }

    #[test]
    fn test_missing_resolver_is_no_match() {
        let registry = ResolverRegistry::new();
        assert_eq!(registry.resolve("c", &Document::new("int x;"), 0), None);
    }

    #[test]
    fn test_failure_is_no_match() {
        let mut registry = ResolverRegistry::new();
        registry.register("c", Fixed(Resolution::Failed("bad tree".to_string())));
        assert_eq!(registry.resolve("c", &Document::new("int x;"), 0), None);
    }

    #[test]
    fn test_blank_match_is_no_match() {
        let mut registry = ResolverRegistry::new();
        registry.register("c", Fixed(Resolution::Match("  ".to_string())));
        assert_eq!(registry.resolve("c", &Document::new("int x;"), 0), None);
    }

    #[test]
    fn test_match_is_returned() {
        let mut registry = ResolverRegistry::new();
        registry.register("c", Fixed(Resolution::Match("main".to_string())));
        assert_eq!(
            registry.resolve("c", &Document::new("int main;"), 0),
            Some("main".to_string())
        );
    }

    #[test]
    fn test_builtin_keys() {
        let registry = ResolverRegistry::with_builtin();
        for key in ["rs", "py", "go", "java", "js", "ts", "tsx", "cs"] {
            assert!(registry.contains(key), "missing resolver for {}", key);
        }
        assert!(!registry.contains("c"));
    }

    #[test]
    fn test_language_filter() {
        let registry = ResolverRegistry::with_languages(|name| name == "python");
        assert_eq!(registry.keys(), vec!["py", "pyi"]);
    }
}
