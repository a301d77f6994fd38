//! Inventory tree snapshot
//!
//! The outfit collaborator hands the engine a read-only snapshot of the
//! shared folder. Nodes live in an arena and refer to each other by
//! [`NodeId`], which keeps parent links cheap without shared ownership.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{ObjectId, WearableType};

/// Index of a node inside an [`InventoryTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// What an inventory item is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Rezzable object, worn as an attachment
    Object,
    /// Clothing or body part
    Wearable(WearableType),
    /// Anything else (notecards, scripts, ...)
    Other,
}

impl ItemKind {
    /// Whether the item can be worn at all
    pub fn is_wearable(&self) -> bool {
        matches!(self, ItemKind::Object | ItemKind::Wearable(_))
    }
}

/// Folder or item payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Folder,
    Item(ItemKind),
}

/// One folder or item
#[derive(Debug, Clone)]
pub struct InventoryNode {
    /// Inventory id of the folder or item
    pub id: ObjectId,
    pub name: String,
    pub kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl InventoryNode {
    pub fn is_folder(&self) -> bool {
        matches!(self.kind, NodeKind::Folder)
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Item kind, `None` for folders
    pub fn item_kind(&self) -> Option<ItemKind> {
        match self.kind {
            NodeKind::Item(kind) => Some(kind),
            NodeKind::Folder => None,
        }
    }
}

/// A folder tree rooted at one designated folder
///
/// `NodeId`s are only meaningful for the tree that produced them.
#[derive(Debug, Clone)]
pub struct InventoryTree {
    nodes: Vec<InventoryNode>,
}

impl InventoryTree {
    /// Create a tree holding only its root folder
    pub fn new(root_name: impl Into<String>) -> Self {
        Self::with_root_id(root_name, Uuid::new_v4())
    }

    /// Create a tree whose root folder has a known id
    pub fn with_root_id(root_name: impl Into<String>, id: ObjectId) -> Self {
        Self {
            nodes: vec![InventoryNode {
                id,
                name: root_name.into(),
                kind: NodeKind::Folder,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// The root folder
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn push(&mut self, parent: NodeId, id: ObjectId, name: String, kind: NodeKind) -> NodeId {
        let node_id = NodeId(self.nodes.len());
        self.nodes.push(InventoryNode {
            id,
            name,
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(node_id);
        node_id
    }

    /// Add a sub-folder
    pub fn add_folder(&mut self, parent: NodeId, name: impl Into<String>) -> NodeId {
        self.push(parent, Uuid::new_v4(), name.into(), NodeKind::Folder)
    }

    /// Add an item with a known inventory id
    pub fn add_item(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        item_id: ObjectId,
        kind: ItemKind,
    ) -> NodeId {
        self.push(parent, item_id, name.into(), NodeKind::Item(kind))
    }

    /// Access a node
    pub fn node(&self, id: NodeId) -> &InventoryNode {
        &self.nodes[id.0]
    }

    /// Name of a node
    pub fn name(&self, id: NodeId) -> &str {
        &self.nodes[id.0].name
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn is_folder(&self, id: NodeId) -> bool {
        self.nodes[id.0].is_folder()
    }

    /// Direct sub-folders, in order
    pub fn child_folders(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .filter(move |c| self.is_folder(*c))
    }

    /// Items directly inside a folder, in order
    pub fn items_in(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .filter(move |c| !self.is_folder(*c))
    }

    /// Items inside a folder and all its sub-folders, pre-order
    pub fn items_recursive(&self, id: NodeId) -> Vec<NodeId> {
        let mut items: Vec<NodeId> = self.items_in(id).collect();
        for folder in self.child_folders(id) {
            items.extend(self.items_recursive(folder));
        }
        items
    }

    /// Locate an item by inventory id
    pub fn find_item(&self, item_id: &ObjectId) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| !n.is_folder() && &n.id == item_id)
            .map(NodeId)
    }

    /// Total number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Build a tree from a nested description
    pub fn from_spec(spec: &FolderSpec) -> Self {
        let mut tree = InventoryTree::new(spec.name.clone());
        let root = tree.root();
        tree.fill(root, spec);
        tree
    }

    fn fill(&mut self, folder: NodeId, spec: &FolderSpec) {
        for item in &spec.items {
            self.add_item(
                folder,
                item.name.clone(),
                item.id.unwrap_or_else(Uuid::new_v4),
                item.kind,
            );
        }
        for child in &spec.folders {
            let child_id = self.add_folder(folder, child.name.clone());
            self.fill(child_id, child);
        }
    }
}

/// Nested folder description, e.g. loaded from JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FolderSpec {
    pub name: String,
    #[serde(default)]
    pub items: Vec<ItemSpec>,
    #[serde(default)]
    pub folders: Vec<FolderSpec>,
}

/// Item entry of a [`FolderSpec`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemSpec {
    pub name: String,
    #[serde(default)]
    pub id: Option<ObjectId>,
    pub kind: ItemKind,
}
