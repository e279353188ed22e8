//! Tree-sitter based function resolver.
//!
//! Each document is parsed once; the named units it contains (functions and
//! their containers) are cached by document fingerprint, so resolving every
//! line of a large hunk costs one parse.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tree_sitter::{Node, Parser};

use super::helpers::{
    field_text, find_child_by_type, find_descendant_by_type, get_node_text, skip_indent,
    strip_generics,
};
use super::languages::LanguageSpec;
use super::{FunctionResolver, Resolution};
use crate::types::Document;

/// A named unit found in a syntax tree.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Unit {
    /// Qualified name (`Container.function`).
    name: String,
    start_byte: usize,
    end_byte: usize,
    is_function: bool,
}

impl Unit {
    fn contains(&self, offset: usize) -> bool {
        self.start_byte <= offset && offset < self.end_byte
    }

    fn span(&self) -> usize {
        self.end_byte - self.start_byte
    }
}

/// Resolver for one tree-sitter language.
pub struct TreeSitterResolver {
    spec: &'static LanguageSpec,
    cache: Mutex<HashMap<u64, Arc<Vec<Unit>>>>,
}

impl TreeSitterResolver {
    pub fn new(spec: &'static LanguageSpec) -> Self {
        Self {
            spec,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn units(&self, document: &Document) -> Result<Arc<Vec<Unit>>, String> {
        let key = document.fingerprint();
        if let Some(units) = self.lock_cache().get(&key) {
            return Ok(units.clone());
        }

        let units = Arc::new(self.collect_units(document.text())?);
        self.lock_cache().insert(key, units.clone());
        Ok(units)
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, HashMap<u64, Arc<Vec<Unit>>>> {
        self.cache.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Recovering from poisoned resolver cache");
            poisoned.into_inner()
        })
    }

    fn collect_units(&self, source: &str) -> Result<Vec<Unit>, String> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.spec.language())
            .map_err(|e| format!("Failed to set {} language: {}", self.spec.name, e))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| format!("Failed to parse {} source", self.spec.name))?;

        let mut units = Vec::new();
        self.walk(&tree.root_node(), source, None, &mut units);
        Ok(units)
    }

    fn walk(&self, node: &Node, source: &str, container: Option<&str>, units: &mut Vec<Unit>) {
        let kind = node.kind();
        let mut inner_container = container.map(str::to_string);

        if self.spec.is_function(kind) || self.is_function_declarator(node) {
            if let Some(name) = self.function_name(node, source) {
                let qualified = match (self.receiver_type(node, source), container) {
                    (Some(receiver), _) => format!("{}.{}", receiver, name),
                    (None, Some(container)) => format!("{}.{}", container, name),
                    (None, None) => name.to_string(),
                };
                units.push(self.unit(node, qualified, true));
            }
        } else if self.spec.is_container(kind) {
            if let Some(name) = self.container_name(node, source) {
                units.push(self.unit(node, name.to_string(), false));
                inner_container = Some(name.to_string());
            }
        }

        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        for child in children {
            self.walk(&child, source, inner_container.as_deref(), units);
        }
    }

    fn unit(&self, node: &Node, name: String, is_function: bool) -> Unit {
        Unit {
            name,
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            is_function,
        }
    }

    /// `const handler = () => {}` and friends.
    fn is_function_declarator(&self, node: &Node) -> bool {
        self.spec.is_declarator(node.kind())
            && node.child_by_field_name("value").is_some_and(|value| {
                matches!(
                    value.kind(),
                    "arrow_function" | "function_expression" | "function" | "generator_function"
                )
            })
    }

    fn function_name<'a>(&self, node: &Node, source: &'a str) -> Option<&'a str> {
        field_text(node, "name", source)
            .or_else(|| find_child_by_type(node, "identifier").map(|id| get_node_text(&id, source)))
    }

    fn container_name<'a>(&self, node: &Node, source: &'a str) -> Option<&'a str> {
        match node.kind() {
            // Rust: `impl Trait for Type` is named after the type
            "impl_item" => field_text(node, "type", source).map(strip_generics),
            // Go: `type ( A struct{}; B int )` takes the first spec's name
            "type_declaration" => find_child_by_type(node, "type_spec")
                .and_then(|spec| field_text(&spec, "name", source)),
            _ => field_text(node, "name", source),
        }
    }

    /// Receiver type of a Go method: `func (s *Server) Run()` gives `Server`.
    fn receiver_type<'a>(&self, node: &Node, source: &'a str) -> Option<&'a str> {
        if node.kind() != "method_declaration" {
            return None;
        }
        let receiver = node.child_by_field_name("receiver")?;
        if receiver.kind() != "parameter_list" {
            return None;
        }
        find_descendant_by_type(&receiver, "type_identifier").map(|t| get_node_text(&t, source))
    }
}

impl FunctionResolver for TreeSitterResolver {
    fn resolve(&self, document: &Document, offset: usize) -> Resolution {
        let units = match self.units(document) {
            Ok(units) => units,
            Err(reason) => return Resolution::Failed(reason),
        };

        let probe = skip_indent(document.text(), offset);
        let innermost = |want_function: bool| {
            units
                .iter()
                .filter(|u| u.is_function == want_function && u.contains(probe))
                .min_by_key(|u| u.span())
        };

        match innermost(true).or_else(|| innermost(false)) {
            Some(unit) => Resolution::Match(unit.name.clone()),
            None => Resolution::NoMatch,
        }
    }
}
