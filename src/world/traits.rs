//! Collaborator traits
//!
//! The engine never talks to the network or the inventory system directly;
//! everything goes through these three traits.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::{AttachmentPoint, ObjectId, Vector3, WearableType};
use crate::inventory::{InventoryTree, ItemKind};

/// Region the avatar is currently in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionInfo {
    pub name: String,
}

/// How an item is currently on the avatar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WornKind {
    /// Attached object, with the in-world id of the rezzed attachment
    Attached {
        point: AttachmentPoint,
        object_id: ObjectId,
    },
    /// Worn clothing or body part
    Worn(WearableType),
}

/// An item currently worn or attached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WornItem {
    /// Inventory id
    pub item_id: ObjectId,
    pub name: String,
    pub kind: WornKind,
}

impl WornItem {
    pub fn attachment_point(&self) -> Option<AttachmentPoint> {
        match self.kind {
            WornKind::Attached { point, .. } => Some(point),
            WornKind::Worn(_) => None,
        }
    }

    pub fn wearable_type(&self) -> Option<WearableType> {
        match self.kind {
            WornKind::Worn(layer) => Some(layer),
            WornKind::Attached { .. } => None,
        }
    }

    pub fn object_id(&self) -> Option<ObjectId> {
        match self.kind {
            WornKind::Attached { object_id, .. } => Some(object_id),
            WornKind::Worn(_) => None,
        }
    }
}

/// An inventory item handed to the outfit collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutfitItem {
    pub item_id: ObjectId,
    pub name: String,
    pub kind: ItemKind,
}

/// A group the avatar belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInfo {
    pub id: ObjectId,
    pub name: String,
}

/// Virtual-world session: chat, presence, movement
#[async_trait]
pub trait WorldSession: Send + Sync {
    /// Say something on a chat channel
    async fn send_chat(&self, channel: i32, text: &str) -> Result<()>;

    /// Whether an object is still in the simulation
    ///
    /// `None` means presence could not be determined.
    async fn object_exists(&self, id: ObjectId) -> Option<bool>;

    /// Region the avatar stands in, if known
    async fn current_region(&self) -> Option<RegionInfo>;

    /// Teleport to global coordinates
    async fn teleport_global(&self, position: Vector3) -> Result<()>;

    /// Teleport to a named region, optionally facing a yaw angle (radians)
    async fn teleport_region(
        &self,
        region: &str,
        position: Vector3,
        look_at: Option<f64>,
    ) -> Result<()>;

    /// Sit on an object
    async fn sit_on(&self, target: ObjectId) -> Result<()>;

    /// Stand up
    async fn stand(&self) -> Result<()>;

    /// Turn the avatar to face a yaw angle (radians)
    async fn set_rotation(&self, yaw: f64) -> Result<()>;

    /// Object the avatar is sitting on, if any
    async fn sitting_on(&self) -> Option<ObjectId>;
}

/// Outfit and inventory management
#[async_trait]
pub trait Outfit: Send + Sync {
    /// Snapshot of the top-level folder called `name`, `None` if unavailable
    async fn shared_folder(&self, name: &str) -> Option<InventoryTree>;

    /// Everything currently worn or attached
    async fn worn_items(&self) -> Vec<WornItem>;

    /// Attach objects, replacing what occupies their points when `replace`
    async fn attach(&self, items: &[OutfitItem], replace: bool) -> Result<()>;

    /// Detach attached objects by inventory id
    async fn detach(&self, items: &[ObjectId]) -> Result<()>;

    /// Wear clothing, replacing the same layer when `replace`
    async fn add_to_outfit(&self, items: &[OutfitItem], replace: bool) -> Result<()>;

    /// Take off clothing by inventory id
    async fn remove_from_outfit(&self, items: &[ObjectId]) -> Result<()>;

    /// Inventory item behind an attached in-world object
    async fn item_for_object(&self, object_id: ObjectId) -> Option<ObjectId> {
        self.worn_items()
            .await
            .into_iter()
            .find(|w| w.object_id() == Some(object_id))
            .map(|w| w.item_id)
    }

    /// In-world object of an attached inventory item
    async fn object_for_item(&self, item_id: ObjectId) -> Option<ObjectId> {
        self.worn_items()
            .await
            .into_iter()
            .find(|w| w.item_id == item_id)
            .and_then(|w| w.object_id())
    }
}

/// Group membership
#[async_trait]
pub trait Groups: Send + Sync {
    /// Currently active group, `None` when no group is active
    async fn active_group(&self) -> Option<GroupInfo>;

    /// Find one of the avatar's groups by id or (case-insensitive) name
    async fn find_group(&self, name_or_id: &str) -> Option<GroupInfo>;

    /// Make a group active
    async fn activate_group(&self, group: ObjectId) -> Result<()>;

    /// Resolve a role name inside a group; may take a network round-trip
    async fn lookup_role(&self, group: ObjectId, role_name: &str) -> Result<Option<ObjectId>>;

    /// Make a role (title) active inside a group
    async fn activate_role(&self, group: ObjectId, role: ObjectId) -> Result<()>;
}

/// The three collaborators an engine talks to
#[derive(Clone)]
pub struct Collaborators {
    pub world: Arc<dyn WorldSession>,
    pub outfit: Arc<dyn Outfit>,
    pub groups: Arc<dyn Groups>,
}

impl Collaborators {
    pub fn new(
        world: Arc<dyn WorldSession>,
        outfit: Arc<dyn Outfit>,
        groups: Arc<dyn Groups>,
    ) -> Self {
        Self {
            world,
            outfit,
            groups,
        }
    }
}
