//! Keyword folder search

use super::path::depth;
use super::tree::{InventoryTree, NodeId};

/// Folders under `root` whose path segments contain every keyword
///
/// The path considered for a candidate is the lower-cased names of every
/// folder from below `root` down to the candidate itself. Each keyword must
/// equal a whole segment, and a keyword given twice needs two segments.
/// Folders starting with `hidden_prefix` are skipped with their subtree.
/// Results are in pre-order discovery order.
pub fn find_folders_by_keywords(
    tree: &InventoryTree,
    root: NodeId,
    keywords: &[&str],
    hidden_prefix: &str,
) -> Vec<NodeId> {
    let keywords: Vec<String> = keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();
    if keywords.is_empty() {
        return Vec::new();
    }
    collect_matches(tree, root, &[], &keywords, hidden_prefix)
}

fn collect_matches(
    tree: &InventoryTree,
    folder: NodeId,
    path: &[String],
    keywords: &[String],
    hidden_prefix: &str,
) -> Vec<NodeId> {
    let mut found = Vec::new();
    for child in tree.child_folders(folder) {
        let name = tree.name(child);
        if !hidden_prefix.is_empty() && name.starts_with(hidden_prefix) {
            continue;
        }

        let mut child_path = path.to_vec();
        child_path.push(name.to_lowercase());

        if contains_all(&child_path, keywords) {
            found.push(child);
        }
        found.extend(collect_matches(tree, child, &child_path, keywords, hidden_prefix));
    }
    found
}

/// Multiset containment: every keyword consumes one matching segment
fn contains_all(segments: &[String], keywords: &[String]) -> bool {
    let mut remaining: Vec<&String> = segments.iter().collect();
    keywords.iter().all(|keyword| {
        match remaining.iter().position(|s| *s == keyword) {
            Some(pos) => {
                remaining.swap_remove(pos);
                true
            }
            None => false,
        }
    })
}

/// Deepest of the given matches; the earliest wins among equals
pub fn best_match(tree: &InventoryTree, matches: &[NodeId]) -> Option<NodeId> {
    let mut best: Option<(NodeId, usize)> = None;
    for &candidate in matches {
        let d = depth(tree, candidate);
        match best {
            Some((_, best_depth)) if d <= best_depth => {}
            _ => best = Some((candidate, d)),
        }
    }
    best.map(|(id, _)| id)
}
