//! Built-in language table for the tree-sitter resolver.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use tree_sitter::Language;

/// How to find named units in one language's syntax tree.
pub struct LanguageSpec {
    /// Language name used in configuration.
    pub name: &'static str,
    /// File-type keys handled by this language.
    pub extensions: &'static [&'static str],
    grammar: fn() -> Language,
    /// Node kinds that define functions or methods.
    pub function_kinds: &'static [&'static str],
    /// Node kinds that group functions (classes, impls, modules).
    pub container_kinds: &'static [&'static str],
    /// Declarator node kinds that count as functions when their value is
    /// a function expression (`const f = () => {}`).
    pub declarator_kinds: &'static [&'static str],
}

impl LanguageSpec {
    pub fn language(&self) -> Language {
        (self.grammar)()
    }

    pub fn is_function(&self, kind: &str) -> bool {
        self.function_kinds.iter().any(|k| *k == kind)
    }

    pub fn is_container(&self, kind: &str) -> bool {
        self.container_kinds.iter().any(|k| *k == kind)
    }

    pub fn is_declarator(&self, kind: &str) -> bool {
        self.declarator_kinds.iter().any(|k| *k == kind)
    }
}

impl std::fmt::Debug for LanguageSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageSpec")
            .field("name", &self.name)
            .field("extensions", &self.extensions)
            .finish()
    }
}

fn rust() -> Language {
    tree_sitter_rust::LANGUAGE.into()
}

fn python() -> Language {
    tree_sitter_python::LANGUAGE.into()
}

fn go() -> Language {
    tree_sitter_go::LANGUAGE.into()
}

fn java() -> Language {
    tree_sitter_java::LANGUAGE.into()
}

fn javascript() -> Language {
    tree_sitter_javascript::LANGUAGE.into()
}

fn typescript() -> Language {
    tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
}

fn tsx() -> Language {
    tree_sitter_typescript::LANGUAGE_TSX.into()
}

fn csharp() -> Language {
    tree_sitter_c_sharp::LANGUAGE.into()
}

const JS_FUNCTIONS: &[&str] = &[
    "function_declaration",
    "generator_function_declaration",
    "method_definition",
];

const TS_CONTAINERS: &[&str] = &[
    "class_declaration",
    "abstract_class_declaration",
    "interface_declaration",
    "enum_declaration",
    "internal_module",
];

/// Every built-in language.
pub static LANGUAGES: &[LanguageSpec] = &[
    LanguageSpec {
        name: "rust",
        extensions: &["rs"],
        grammar: rust,
        function_kinds: &["function_item", "function_signature_item", "macro_definition"],
        container_kinds: &[
            "impl_item",
            "trait_item",
            "struct_item",
            "enum_item",
            "union_item",
            "mod_item",
        ],
        declarator_kinds: &[],
    },
    LanguageSpec {
        name: "python",
        extensions: &["py", "pyi"],
        grammar: python,
        function_kinds: &["function_definition"],
        container_kinds: &["class_definition"],
        declarator_kinds: &[],
    },
    LanguageSpec {
        name: "go",
        extensions: &["go"],
        grammar: go,
        function_kinds: &["function_declaration", "method_declaration"],
        container_kinds: &["type_declaration"],
        declarator_kinds: &[],
    },
    LanguageSpec {
        name: "java",
        extensions: &["java"],
        grammar: java,
        function_kinds: &["method_declaration", "constructor_declaration"],
        container_kinds: &[
            "class_declaration",
            "interface_declaration",
            "enum_declaration",
            "record_declaration",
        ],
        declarator_kinds: &[],
    },
    LanguageSpec {
        name: "javascript",
        extensions: &["js", "jsx", "mjs", "cjs"],
        grammar: javascript,
        function_kinds: JS_FUNCTIONS,
        container_kinds: &["class_declaration"],
        declarator_kinds: &["variable_declarator"],
    },
    LanguageSpec {
        name: "typescript",
        extensions: &["ts", "mts", "cts"],
        grammar: typescript,
        function_kinds: JS_FUNCTIONS,
        container_kinds: TS_CONTAINERS,
        declarator_kinds: &["variable_declarator"],
    },
    LanguageSpec {
        name: "tsx",
        extensions: &["tsx"],
        grammar: tsx,
        function_kinds: JS_FUNCTIONS,
        container_kinds: TS_CONTAINERS,
        declarator_kinds: &["variable_declarator"],
    },
    LanguageSpec {
        name: "csharp",
        extensions: &["cs"],
        grammar: csharp,
        function_kinds: &[
            "method_declaration",
            "constructor_declaration",
            "local_function_statement",
        ],
        container_kinds: &[
            "class_declaration",
            "struct_declaration",
            "interface_declaration",
            "record_declaration",
            "enum_declaration",
        ],
        declarator_kinds: &[],
    },
];

static BY_EXTENSION: Lazy<HashMap<&'static str, &'static LanguageSpec>> = Lazy::new(|| {
    LANGUAGES
        .iter()
        .flat_map(|spec| spec.extensions.iter().map(move |ext| (*ext, spec)))
        .collect()
});

/// Language handling the file-type key `ext`.
pub fn for_extension(ext: &str) -> Option<&'static LanguageSpec> {
    BY_EXTENSION.get(ext).copied()
}
