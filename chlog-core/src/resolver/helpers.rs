//! Helper functions for tree-sitter AST navigation.

use tree_sitter::Node;

/// Get the text content of a node.
pub fn get_node_text<'a>(node: &Node, source: &'a str) -> &'a str {
    let start = node.start_byte();
    let end = node.end_byte();
    if start < source.len() && end <= source.len() && start < end {
        &source[start..end]
    } else {
        ""
    }
}

/// Find the first child of a specific type.
pub fn find_child_by_type<'a>(node: &Node<'a>, type_name: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .find(|child| child.kind() == type_name);
    found
}

/// Find the first descendant (depth-first) of a specific type.
pub fn find_descendant_by_type<'a>(node: &Node<'a>, type_name: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    let children: Vec<Node<'a>> = node.children(&mut cursor).collect();
    for child in children {
        if child.kind() == type_name {
            return Some(child);
        }
        if let Some(found) = find_descendant_by_type(&child, type_name) {
            return Some(found);
        }
    }
    None
}

/// Text of the `field` child, if present and non-empty.
pub fn field_text<'a>(node: &Node, field: &str, source: &'a str) -> Option<&'a str> {
    let child = node.child_by_field_name(field)?;
    let text = get_node_text(&child, source).trim();
    (!text.is_empty()).then_some(text)
}

/// Strip generic parameters: `Vec<T>` becomes `Vec`.
pub fn strip_generics(name: &str) -> &str {
    match name.find('<') {
        Some(idx) => name[..idx].trim_end(),
        None => name,
    }
}

/// Advance `offset` past spaces and tabs, stopping at the end of the line.
pub fn skip_indent(source: &str, offset: usize) -> usize {
    let rest = source.get(offset..).unwrap_or("");
    offset + rest.len() - rest.trim_start_matches([' ', '\t']).len()
}
