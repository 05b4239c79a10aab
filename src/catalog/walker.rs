//! Recursive traversal of message trees: flatten, read and write by path.

use indexmap::IndexSet;
use thiserror::Error;

use super::{
    DotPath,
    MessageMap,
    MessageTree,
};

/// Why a write could not be applied without changing the tree's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// An intermediate segment holds a leaf where a subtree is needed.
    LeafInPath,
    /// The terminal segment holds a subtree where a leaf is expected.
    SubtreeAtLeaf,
    /// The root itself cannot be replaced by a leaf.
    EmptyPath,
}

/// A write that would replace a subtree with a leaf or the other way round.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("structural conflict at '{path}': {}", describe(*.kind))]
pub struct StructuralConflict {
    /// The path where the conflicting node was found (a prefix of the written path).
    pub path: DotPath,
    /// What was found there.
    pub kind: ConflictKind,
}

/// Human-readable form of `kind`.
const fn describe(kind: ConflictKind) -> &'static str {
    match kind {
        ConflictKind::LeafInPath => "expected a subtree but found a leaf",
        ConflictKind::SubtreeAtLeaf => "expected a leaf but found a subtree",
        ConflictKind::EmptyPath => "cannot write a leaf at the root",
    }
}

/// Every leaf path in traversal (file) order. Intermediate subtrees are not included.
#[must_use]
pub fn flatten(tree: &MessageTree) -> IndexSet<DotPath> {
    flatten_entries(tree).into_iter().map(|(path, _)| path).collect()
}

/// Every leaf with its value, in traversal order.
#[must_use]
pub fn flatten_entries(tree: &MessageTree) -> Vec<(DotPath, &str)> {
    let mut result = Vec::new();
    if let MessageTree::Node(children) = tree {
        collect_leaves(children, &DotPath::default(), &mut result);
    }
    result
}

/// Depth-first leaf collection below `prefix`.
fn collect_leaves<'a>(children: &'a MessageMap, prefix: &DotPath, result: &mut Vec<(DotPath, &'a str)>) {
    for (key, child) in children {
        let path = prefix.child(key);
        match child {
            MessageTree::Leaf(text) => result.push((path, text.as_str())),
            MessageTree::Node(grandchildren) => collect_leaves(grandchildren, &path, result),
        }
    }
}

/// Returns the leaf value at `path`, or `None` if a segment is missing or the path
/// ends on a subtree.
#[must_use]
pub fn read_at<'a>(tree: &'a MessageTree, path: &DotPath) -> Option<&'a str> {
    let mut current = tree;
    for segment in path.segments() {
        current = current.as_node()?.get(segment)?;
    }
    current.as_leaf()
}

/// Sets the leaf at `path` to `value`, creating missing intermediate subtrees.
///
/// An existing leaf at `path` is overwritten. A leaf found where a subtree is needed,
/// or a subtree found where the leaf should go, is reported instead of being replaced.
pub fn write_at(
    tree: &mut MessageTree,
    path: &DotPath,
    value: impl Into<String>,
) -> Result<(), StructuralConflict> {
    let Some((last, parents)) = path.split_last() else {
        return Err(StructuralConflict { path: DotPath::default(), kind: ConflictKind::EmptyPath });
    };

    let mut current = tree;
    let mut walked = DotPath::default();
    for segment in parents {
        let MessageTree::Node(children) = current else {
            return Err(StructuralConflict { path: walked, kind: ConflictKind::LeafInPath });
        };
        walked = walked.child(segment);
        current = children.entry(segment.clone()).or_insert_with(MessageTree::empty);
    }

    let MessageTree::Node(children) = current else {
        return Err(StructuralConflict { path: walked, kind: ConflictKind::LeafInPath });
    };
    if matches!(children.get(last), Some(MessageTree::Node(_))) {
        return Err(StructuralConflict { path: path.clone(), kind: ConflictKind::SubtreeAtLeaf });
    }
    children.insert(last.clone(), MessageTree::Leaf(value.into()));
    Ok(())
}
