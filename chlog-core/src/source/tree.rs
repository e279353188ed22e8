//! Flattening of hierarchical change views into raw changes.
//!
//! Some change sources present their results as a tree of directories and
//! files (a synchronize view, a review tool's file tree). [`collect_raw_changes`]
//! walks any such tree through the [`ChangeNode`] trait.

use std::path::PathBuf;

use crate::types::{ChangeKind, RawChange};

/// A node in a hierarchical change view.
pub trait ChangeNode {
    /// Path segment contributed by this node.
    fn name(&self) -> &str;

    /// Change kind for file nodes; `None` for pure containers.
    fn kind(&self) -> Option<ChangeKind>;

    /// Location of the working file backing this node.
    fn resource(&self) -> Option<PathBuf> {
        None
    }

    fn children(&self) -> Vec<&dyn ChangeNode>;
}

/// Collect every changed file below `root`, skipping `changelog_name` files.
///
/// The root's own name is not part of the produced paths. Nodes are visited
/// depth-first in child order.
pub fn collect_raw_changes(root: &dyn ChangeNode, changelog_name: &str) -> Vec<RawChange> {
    let mut changes = Vec::new();
    let mut worklist: Vec<(&dyn ChangeNode, String)> = root
        .children()
        .into_iter()
        .rev()
        .map(|child| (child, String::new()))
        .collect();

    while let Some((node, parent)) = worklist.pop() {
        let path = if parent.is_empty() {
            node.name().to_string()
        } else {
            format!("{}/{}", parent, node.name())
        };

        if let Some(kind) = node.kind() {
            if node.name() == changelog_name {
                continue;
            }
            let mut raw = RawChange::new(path.clone(), kind);
            if kind == ChangeKind::Modified {
                raw.resource = node.resource();
            }
            changes.push(raw);
        }

        for child in node.children().into_iter().rev() {
            worklist.push((child, path.clone()));
        }
    }

    changes
}

/// Owned change tree, built from slash-separated paths.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeTree {
    name: String,
    kind: Option<ChangeKind>,
    resource: Option<PathBuf>,
    children: Vec<ChangeTree>,
}

impl ChangeTree {
    /// Create an empty root.
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Insert a file change, creating intermediate directories as needed.
    pub fn insert(&mut self, path: &str, kind: ChangeKind, resource: Option<PathBuf>) {
        let mut node = self;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let index = match node.children.iter().position(|c| c.name == segment) {
                Some(index) => index,
                None => {
                    node.children.push(ChangeTree::root(segment));
                    node.children.len() - 1
                }
            };
            node = &mut node.children[index];
        }
        node.kind = Some(kind);
        node.resource = resource;
    }
}

impl ChangeNode for ChangeTree {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> Option<ChangeKind> {
        self.kind
    }

    fn resource(&self) -> Option<PathBuf> {
        self.resource.clone()
    }

    fn children(&self) -> Vec<&dyn ChangeNode> {
        self.children.iter().map(|c| c as &dyn ChangeNode).collect()
    }
}
