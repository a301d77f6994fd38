//! Slash-delimited folder paths

use super::tree::{InventoryTree, NodeId};

/// Path separator
pub const PATH_SEPARATOR: char = '/';

/// Full path of a node relative to the tree root
///
/// The root itself contributes nothing, so the root's path is empty and a
/// folder `Red` directly under it is `"Red"`.
pub fn full_path(tree: &InventoryTree, node: NodeId) -> String {
    let mut names: Vec<&str> = Vec::new();
    let mut current = Some(node);
    while let Some(id) = current {
        let parent = tree.parent(id);
        if parent.is_some() {
            names.push(tree.name(id));
        }
        current = parent;
    }
    names.reverse();
    names.join("/")
}

/// Number of separators in a node's full path
pub fn depth(tree: &InventoryTree, node: NodeId) -> usize {
    full_path(tree, node).matches(PATH_SEPARATOR).count()
}

/// Split a path into lower-cased segments, trimming outer slashes
pub fn path_segments(path: &str) -> Vec<String> {
    let trimmed = path.trim().trim_matches(PATH_SEPARATOR);
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed
        .split(PATH_SEPARATOR)
        .map(|s| s.trim().to_lowercase())
        .collect()
}

/// Resolve a folder path under `root`, case-insensitively
///
/// Depth-first: when several sibling folders share a name, each is tried in
/// order and the first complete match wins. Items never match. An empty path
/// resolves to `root`.
pub fn find_folder(tree: &InventoryTree, root: NodeId, path: &str) -> Option<NodeId> {
    let segments = path_segments(path);
    descend(tree, root, &segments)
}

fn descend(tree: &InventoryTree, folder: NodeId, segments: &[String]) -> Option<NodeId> {
    let Some((first, rest)) = segments.split_first() else {
        return Some(folder);
    };
    tree.child_folders(folder)
        .filter(|child| tree.name(*child).to_lowercase() == *first)
        .find_map(|child| descend(tree, child, rest))
}

/// Whether `path` equals `ancestor` or lies beneath it (case-insensitive)
pub fn is_within(path: &str, ancestor: &str) -> bool {
    let path = path_segments(path);
    let ancestor = path_segments(ancestor);
    path.len() >= ancestor.len() && path[..ancestor.len()] == ancestor[..]
}
