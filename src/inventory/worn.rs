//! Worn-state summaries for folder listings

use super::tree::{InventoryTree, NodeId};
use crate::core::ObjectId;

/// How much of a set of items is currently worn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WornSummary {
    /// No wearable items at all
    Empty,
    NoneWorn,
    SomeWorn,
    AllWorn,
}

impl WornSummary {
    /// Summarise the given item nodes
    pub fn of<F>(tree: &InventoryTree, items: &[NodeId], is_worn: F) -> Self
    where
        F: Fn(&ObjectId) -> bool,
    {
        let wearable: Vec<&ObjectId> = items
            .iter()
            .map(|id| tree.node(*id))
            .filter(|n| n.item_kind().map(|k| k.is_wearable()).unwrap_or(false))
            .map(|n| &n.id)
            .collect();

        if wearable.is_empty() {
            return WornSummary::Empty;
        }
        let worn = wearable.iter().filter(|id| is_worn(*id)).count();
        if worn == 0 {
            WornSummary::NoneWorn
        } else if worn == wearable.len() {
            WornSummary::AllWorn
        } else {
            WornSummary::SomeWorn
        }
    }

    /// Digit used in `@getinvworn` replies
    pub fn digit(&self) -> char {
        match self {
            WornSummary::Empty => '0',
            WornSummary::NoneWorn => '1',
            WornSummary::SomeWorn => '2',
            WornSummary::AllWorn => '3',
        }
    }
}

/// Two-digit code for a folder: its own items, then everything below it
pub fn folder_worn_code<F>(tree: &InventoryTree, folder: NodeId, is_worn: F) -> String
where
    F: Fn(&ObjectId) -> bool,
{
    let own: Vec<NodeId> = tree.items_in(folder).collect();
    let below: Vec<NodeId> = tree
        .child_folders(folder)
        .flat_map(|f| tree.items_recursive(f))
        .collect();

    let mut code = String::with_capacity(2);
    code.push(WornSummary::of(tree, &own, &is_worn).digit());
    code.push(WornSummary::of(tree, &below, &is_worn).digit());
    code
}
