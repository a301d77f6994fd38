//! In-memory collaborators
//!
//! Keep their state in plain collections and record every outbound effect,
//! so they back both the console harness and the test suites.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use uuid::Uuid;

use super::traits::{
    GroupInfo, Groups, OutfitItem, Outfit, RegionInfo, WorldSession, WornItem, WornKind,
};
use crate::core::{AttachmentPoint, ObjectId, Vector3};
use crate::inventory::{InventoryTree, ItemKind};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Effect sent to the world session
#[derive(Debug, Clone, PartialEq)]
pub enum WorldEvent {
    Chat { channel: i32, text: String },
    TeleportGlobal(Vector3),
    TeleportRegion {
        region: String,
        position: Vector3,
        look_at: Option<f64>,
    },
    Sit(ObjectId),
    Stand,
    Rotate(f64),
}

/// World session backed by in-memory state
#[derive(Debug)]
pub struct MemoryWorld {
    events: Mutex<Vec<WorldEvent>>,
    objects: Mutex<HashMap<ObjectId, bool>>,
    presence_available: Mutex<bool>,
    region: Mutex<Option<RegionInfo>>,
    sitting_on: Mutex<Option<ObjectId>>,
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            objects: Mutex::new(HashMap::new()),
            presence_available: Mutex::new(true),
            region: Mutex::new(None),
            sitting_on: Mutex::new(None),
        }
    }

    /// Set the current region
    pub fn with_region(self, name: impl Into<String>) -> Self {
        *lock(&self.region) = Some(RegionInfo { name: name.into() });
        self
    }

    /// Mark an object present or absent
    pub fn set_present(&self, id: ObjectId, present: bool) {
        lock(&self.objects).insert(id, present);
    }

    /// Make presence lookups answer "unknown"
    pub fn set_presence_available(&self, available: bool) {
        *lock(&self.presence_available) = available;
    }

    /// All recorded effects, oldest first
    pub fn events(&self) -> Vec<WorldEvent> {
        lock(&self.events).clone()
    }

    /// Recorded chat replies as `(channel, text)`
    pub fn chat(&self) -> Vec<(i32, String)> {
        lock(&self.events)
            .iter()
            .filter_map(|e| match e {
                WorldEvent::Chat { channel, text } => Some((*channel, text.clone())),
                _ => None,
            })
            .collect()
    }

    /// Forget recorded effects
    pub fn clear_events(&self) {
        lock(&self.events).clear();
    }

    fn record(&self, event: WorldEvent) {
        lock(&self.events).push(event);
    }
}

impl Default for MemoryWorld {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorldSession for MemoryWorld {
    async fn send_chat(&self, channel: i32, text: &str) -> Result<()> {
        self.record(WorldEvent::Chat {
            channel,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn object_exists(&self, id: ObjectId) -> Option<bool> {
        if !*lock(&self.presence_available) {
            return None;
        }
        Some(lock(&self.objects).get(&id).copied().unwrap_or(false))
    }

    async fn current_region(&self) -> Option<RegionInfo> {
        lock(&self.region).clone()
    }

    async fn teleport_global(&self, position: Vector3) -> Result<()> {
        self.record(WorldEvent::TeleportGlobal(position));
        Ok(())
    }

    async fn teleport_region(
        &self,
        region: &str,
        position: Vector3,
        look_at: Option<f64>,
    ) -> Result<()> {
        self.record(WorldEvent::TeleportRegion {
            region: region.to_string(),
            position,
            look_at,
        });
        Ok(())
    }

    async fn sit_on(&self, target: ObjectId) -> Result<()> {
        *lock(&self.sitting_on) = Some(target);
        self.record(WorldEvent::Sit(target));
        Ok(())
    }

    async fn stand(&self) -> Result<()> {
        *lock(&self.sitting_on) = None;
        self.record(WorldEvent::Stand);
        Ok(())
    }

    async fn set_rotation(&self, yaw: f64) -> Result<()> {
        self.record(WorldEvent::Rotate(yaw));
        Ok(())
    }

    async fn sitting_on(&self) -> Option<ObjectId> {
        *lock(&self.sitting_on)
    }
}

/// Effect sent to the outfit collaborator
#[derive(Debug, Clone, PartialEq)]
pub enum OutfitEvent {
    Attach { items: Vec<ObjectId>, replace: bool },
    Detach(Vec<ObjectId>),
    AddToOutfit { items: Vec<ObjectId>, replace: bool },
    RemoveFromOutfit(Vec<ObjectId>),
}

/// Outfit backed by an in-memory folder tree and worn list
#[derive(Debug, Default)]
pub struct MemoryOutfit {
    tree: Mutex<Option<InventoryTree>>,
    worn: Mutex<Vec<WornItem>>,
    attach_points: Mutex<HashMap<ObjectId, AttachmentPoint>>,
    events: Mutex<Vec<OutfitEvent>>,
}

impl MemoryOutfit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outfit whose shared folder is the given tree
    pub fn with_tree(tree: InventoryTree) -> Self {
        let outfit = Self::new();
        outfit.set_tree(Some(tree));
        outfit
    }

    pub fn set_tree(&self, tree: Option<InventoryTree>) {
        *lock(&self.tree) = tree;
    }

    /// Put an item on directly, bypassing events
    pub fn wear(&self, item: WornItem) {
        let mut worn = lock(&self.worn);
        worn.retain(|w| w.item_id != item.item_id);
        worn.push(item);
    }

    /// Where an object item lands when attached
    pub fn set_attach_point(&self, item_id: ObjectId, point: AttachmentPoint) {
        lock(&self.attach_points).insert(item_id, point);
    }

    pub fn events(&self) -> Vec<OutfitEvent> {
        lock(&self.events).clone()
    }

    pub fn worn(&self) -> Vec<WornItem> {
        lock(&self.worn).clone()
    }

    pub fn is_worn(&self, item_id: &ObjectId) -> bool {
        lock(&self.worn).iter().any(|w| &w.item_id == item_id)
    }

    fn record(&self, event: OutfitEvent) {
        lock(&self.events).push(event);
    }
}

#[async_trait]
impl Outfit for MemoryOutfit {
    async fn shared_folder(&self, name: &str) -> Option<InventoryTree> {
        lock(&self.tree)
            .as_ref()
            .filter(|tree| tree.name(tree.root()).eq_ignore_ascii_case(name))
            .cloned()
    }

    async fn worn_items(&self) -> Vec<WornItem> {
        self.worn()
    }

    async fn attach(&self, items: &[OutfitItem], replace: bool) -> Result<()> {
        let points = lock(&self.attach_points).clone();
        {
            let mut worn = lock(&self.worn);
            for item in items {
                let point = points
                    .get(&item.item_id)
                    .copied()
                    .unwrap_or(AttachmentPoint::Chest);
                if replace {
                    worn.retain(|w| w.attachment_point() != Some(point));
                }
                worn.retain(|w| w.item_id != item.item_id);
                worn.push(WornItem {
                    item_id: item.item_id,
                    name: item.name.clone(),
                    kind: WornKind::Attached {
                        point,
                        object_id: Uuid::new_v4(),
                    },
                });
            }
        }
        self.record(OutfitEvent::Attach {
            items: items.iter().map(|i| i.item_id).collect(),
            replace,
        });
        Ok(())
    }

    async fn detach(&self, items: &[ObjectId]) -> Result<()> {
        lock(&self.worn).retain(|w| !items.contains(&w.item_id));
        self.record(OutfitEvent::Detach(items.to_vec()));
        Ok(())
    }

    async fn add_to_outfit(&self, items: &[OutfitItem], replace: bool) -> Result<()> {
        {
            let mut worn = lock(&self.worn);
            for item in items {
                let ItemKind::Wearable(layer) = item.kind else {
                    continue;
                };
                if replace || layer.is_body_part() {
                    worn.retain(|w| w.wearable_type() != Some(layer));
                }
                worn.retain(|w| w.item_id != item.item_id);
                worn.push(WornItem {
                    item_id: item.item_id,
                    name: item.name.clone(),
                    kind: WornKind::Worn(layer),
                });
            }
        }
        self.record(OutfitEvent::AddToOutfit {
            items: items.iter().map(|i| i.item_id).collect(),
            replace,
        });
        Ok(())
    }

    async fn remove_from_outfit(&self, items: &[ObjectId]) -> Result<()> {
        lock(&self.worn).retain(|w| !items.contains(&w.item_id));
        self.record(OutfitEvent::RemoveFromOutfit(items.to_vec()));
        Ok(())
    }
}

/// Effect sent to the group collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupEvent {
    ActivateGroup(ObjectId),
    ActivateRole { group: ObjectId, role: ObjectId },
}

/// Group membership backed by in-memory lists
#[derive(Debug, Default)]
pub struct MemoryGroups {
    groups: Mutex<Vec<GroupInfo>>,
    roles: Mutex<HashMap<(ObjectId, String), ObjectId>>,
    active: Mutex<Option<ObjectId>>,
    role_lookup_delay: Mutex<Option<Duration>>,
    events: Mutex<Vec<GroupEvent>>,
}

impl MemoryGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join a group
    pub fn add_group(&self, id: ObjectId, name: impl Into<String>) {
        lock(&self.groups).push(GroupInfo {
            id,
            name: name.into(),
        });
    }

    /// Define a role inside a group
    pub fn add_role(&self, group: ObjectId, name: &str, role: ObjectId) {
        lock(&self.roles).insert((group, name.to_lowercase()), role);
    }

    /// Delay every role lookup, to exercise timeouts
    pub fn set_role_lookup_delay(&self, delay: Option<Duration>) {
        *lock(&self.role_lookup_delay) = delay;
    }

    pub fn events(&self) -> Vec<GroupEvent> {
        lock(&self.events).clone()
    }
}

#[async_trait]
impl Groups for MemoryGroups {
    async fn active_group(&self) -> Option<GroupInfo> {
        let active = (*lock(&self.active))?;
        lock(&self.groups).iter().find(|g| g.id == active).cloned()
    }

    async fn find_group(&self, name_or_id: &str) -> Option<GroupInfo> {
        let wanted = name_or_id.trim();
        let by_id = Uuid::parse_str(wanted).ok();
        lock(&self.groups)
            .iter()
            .find(|g| Some(g.id) == by_id || g.name.eq_ignore_ascii_case(wanted))
            .cloned()
    }

    async fn activate_group(&self, group: ObjectId) -> Result<()> {
        if !group.is_nil() && !lock(&self.groups).iter().any(|g| g.id == group) {
            return Err(anyhow!("Not a member of group {}", group));
        }
        *lock(&self.active) = if group.is_nil() { None } else { Some(group) };
        lock(&self.events).push(GroupEvent::ActivateGroup(group));
        Ok(())
    }

    async fn lookup_role(&self, group: ObjectId, role_name: &str) -> Result<Option<ObjectId>> {
        let delay = *lock(&self.role_lookup_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(lock(&self.roles)
            .get(&(group, role_name.trim().to_lowercase()))
            .copied())
    }

    async fn activate_role(&self, group: ObjectId, role: ObjectId) -> Result<()> {
        lock(&self.events).push(GroupEvent::ActivateRole { group, role });
        Ok(())
    }
}
