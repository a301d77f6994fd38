//! Inventory path resolution and folder search
//!
//! The outfit collaborator supplies an [`InventoryTree`] rooted at the shared
//! restriction folder; everything here reads it without mutation:
//! - `full_path` / `find_folder` - slash-delimited paths
//! - `find_folders_by_keywords` / `best_match` - keyword search
//! - `folder_worn_code` - worn-state digits for folder listings

mod path;
mod search;
mod tree;
mod worn;

pub use path::{depth, find_folder, full_path, is_within, path_segments, PATH_SEPARATOR};
pub use search::{best_match, find_folders_by_keywords};
pub use tree::{FolderSpec, InventoryNode, InventoryTree, ItemKind, ItemSpec, NodeId, NodeKind};
pub use worn::{folder_worn_code, WornSummary};
