//! Action verbs
//!
//! Reached only with the force param. A target that does not resolve makes
//! the verb a no-op and locked items are left where they are. Folder verbs
//! fail with `FolderUnavailable` when the shared folder cannot be fetched.

use tokio::time::timeout;

use super::args::{parse_angle, parse_id, parse_teleport, split_modifier, TeleportTarget};
use super::dispatcher::{holding_folders, item_folder_path, Dispatcher, Outcome};
use super::queries::NO_GROUP;
use super::table::{ActionVerb, AttachMode};
use crate::core::{AttachmentPoint, ObjectId, RlvError, RlvResult, WearableType};
use crate::inventory::{find_folder, full_path, InventoryTree, ItemKind, NodeId};
use crate::parser::Command;
use crate::world::{OutfitItem, WornItem, WornKind};

/// Folder-name prefix that makes `attach*overorreplace` add instead of replace
pub const ADD_OVER_PREFIX: char = '+';

/// Attachment point named in parentheses at the end of an item name, e.g. `Collar (neck)`
pub fn point_from_item_name(name: &str) -> Option<AttachmentPoint> {
    let open = name.rfind('(')?;
    let close = name[open..].find(')')? + open;
    AttachmentPoint::from_name(&name[open + 1..close])
}

impl Dispatcher {
    pub(super) async fn perform(&self, verb: ActionVerb, command: &Command) -> RlvResult<Outcome> {
        let option = command.option.as_str();
        match verb {
            ActionVerb::Sit => self.sit(option).await,
            ActionVerb::Unsit => {
                self.world.stand().await?;
                Ok(Outcome::Executed)
            }
            ActionVerb::SetRot => {
                let yaw = parse_angle(option)?;
                self.world.set_rotation(yaw).await?;
                Ok(Outcome::Executed)
            }
            ActionVerb::TpTo => self.teleport(option).await,
            ActionVerb::SetGroup => self.set_group(option).await,
            ActionVerb::Attach { recursive, mode } => {
                self.attach_path(option, recursive, mode).await
            }
            ActionVerb::AttachThis { recursive } => self.attach_this(command, recursive).await,
            ActionVerb::Detach => self.detach_selected(option, true).await,
            ActionVerb::RemAttach => self.detach_selected(option, false).await,
            ActionVerb::DetachAll => self.detach_path(option).await,
            ActionVerb::DetachThis { recursive } => self.detach_this(command, recursive).await,
            ActionVerb::DetachMe => self.detach_me(command).await,
            ActionVerb::RemOutfit => self.remove_outfit(option).await,
        }
    }

    async fn sit(&self, option: &str) -> RlvResult<Outcome> {
        let target = parse_id(option)?;
        if self.world.sitting_on().await.is_some() && !self.permissions.can_stand() {
            tracing::debug!("[Dispatcher] Forced sit refused: seated and unsit is restricted");
            return Ok(Outcome::Ignored);
        }
        self.world.sit_on(target).await?;
        Ok(Outcome::Executed)
    }

    async fn teleport(&self, option: &str) -> RlvResult<Outcome> {
        match parse_teleport(option)? {
            TeleportTarget::Global(position) => {
                self.world.teleport_global(position).await?;
            }
            TeleportTarget::Region {
                name,
                position,
                look_at,
            } => {
                let region = if name.is_empty() {
                    self.world
                        .current_region()
                        .await
                        .map(|r| r.name)
                        .ok_or_else(|| RlvError::InvalidCoordinates(option.to_string()))?
                } else {
                    name
                };
                self.world
                    .teleport_region(&region, position, look_at)
                    .await?;
            }
        }
        Ok(Outcome::Executed)
    }

    /// `setgroup:<name|id>[;role]`
    async fn set_group(&self, option: &str) -> RlvResult<Outcome> {
        let (name, role) = split_modifier(option);
        if name.eq_ignore_ascii_case(NO_GROUP) {
            self.groups.activate_group(ObjectId::nil()).await?;
            return Ok(Outcome::Executed);
        }

        let group = self
            .groups
            .find_group(name)
            .await
            .ok_or_else(|| RlvError::invalid(format!("not a member of group {}", name)))?;
        self.groups.activate_group(group.id).await?;

        let role = role.map(str::trim).filter(|r| !r.is_empty());
        if let Some(role) = role {
            match self.resolve_role(group.id, role).await {
                Ok(Some(role_id)) => self.groups.activate_role(group.id, role_id).await?,
                Ok(None) => tracing::debug!(
                    group = %group.name,
                    role,
                    "[Dispatcher] No such role, group activated without it"
                ),
                Err(e) => tracing::warn!(
                    group = %group.name,
                    role,
                    error = %e,
                    "[Dispatcher] Role lookup failed, group activated without it"
                ),
            }
        }
        Ok(Outcome::Executed)
    }

    /// Role id from an id or a bounded name lookup
    async fn resolve_role(&self, group: ObjectId, role: &str) -> RlvResult<Option<ObjectId>> {
        if let Ok(id) = parse_id(role) {
            return Ok(Some(id));
        }
        let bound = self.config.role_lookup_timeout();
        let found = timeout(bound, self.groups.lookup_role(group, role))
            .await
            .map_err(|_| {
                RlvError::Timeout(format!(
                    "role lookup for {} after {}ms",
                    role, self.config.role_lookup_timeout_ms
                ))
            })??;
        Ok(found)
    }

    // ------------------------------------------------------------------
    // Attach
    // ------------------------------------------------------------------

    async fn attach_path(
        &self,
        path: &str,
        recursive: bool,
        mode: AttachMode,
    ) -> RlvResult<Outcome> {
        if path.trim().is_empty() {
            return Err(RlvError::UnknownFolder(path.to_string()));
        }
        let tree = self.shared_tree().await?;
        let Some(folder) = find_folder(&tree, tree.root(), path) else {
            tracing::debug!(path, "[Dispatcher] Folder not found");
            return Ok(Outcome::Ignored);
        };
        self.attach_folders(&tree, &[folder], recursive, mode).await
    }

    async fn attach_this(&self, command: &Command, recursive: bool) -> RlvResult<Outcome> {
        let tree = self.shared_tree().await?;
        let worn = self.outfit.worn_items().await;
        let items = self.selected_items(&worn, command).await?;
        let folders = holding_folders(&tree, &items);
        self.attach_folders(&tree, &folders, recursive, AttachMode::Replace)
            .await
    }

    /// Put on everything permitted in the given folders
    async fn attach_folders(
        &self,
        tree: &InventoryTree,
        folders: &[NodeId],
        recursive: bool,
        mode: AttachMode,
    ) -> RlvResult<Outcome> {
        // (item, replace) in folder order
        let mut plan: Vec<(OutfitItem, bool)> = Vec::new();
        for &folder in folders {
            for node in self.folder_items(tree, folder, recursive) {
                let Some(parent) = tree.parent(node) else {
                    continue;
                };
                let entry = tree.node(node);
                let Some(kind) = entry.item_kind() else {
                    continue;
                };
                let path = full_path(tree, parent);
                if !self
                    .permissions
                    .can_attach(kind, point_from_item_name(&entry.name), Some(path.as_str()))
                {
                    tracing::debug!(item = %entry.name, "[Dispatcher] Attach not permitted");
                    continue;
                }
                let replace = match mode {
                    AttachMode::Replace => true,
                    AttachMode::Over => false,
                    AttachMode::OverOrReplace => !tree.name(parent).starts_with(ADD_OVER_PREFIX),
                };
                plan.push((
                    OutfitItem {
                        item_id: entry.id,
                        name: entry.name.clone(),
                        kind,
                    },
                    replace,
                ));
            }
        }

        if plan.is_empty() {
            return Ok(Outcome::Ignored);
        }

        for replace in [true, false] {
            let (objects, wearables): (Vec<OutfitItem>, Vec<OutfitItem>) = plan
                .iter()
                .filter(|(_, r)| *r == replace)
                .map(|(item, _)| item.clone())
                .partition(|item| matches!(item.kind, ItemKind::Object));
            if !objects.is_empty() {
                self.outfit.attach(&objects, replace).await?;
            }
            if !wearables.is_empty() {
                self.outfit.add_to_outfit(&wearables, replace).await?;
            }
        }
        Ok(Outcome::Executed)
    }

    // ------------------------------------------------------------------
    // Detach
    // ------------------------------------------------------------------

    /// `detach[:point|folder]` / `remattach[:point]`
    ///
    /// No option addresses every attachment.
    async fn detach_selected(&self, option: &str, allow_folder: bool) -> RlvResult<Outcome> {
        let worn = self.outfit.worn_items().await;
        let tree = self.shared_tree().await.ok();

        let targets: Vec<&WornItem> = if option.is_empty() {
            worn.iter()
                .filter(|w| w.attachment_point().is_some())
                .collect()
        } else if let Some(point) = AttachmentPoint::from_name(option) {
            worn.iter()
                .filter(|w| w.attachment_point() == Some(point))
                .collect()
        } else if let Ok(item) = parse_id(option) {
            worn.iter().filter(|w| w.item_id == item).collect()
        } else if allow_folder {
            let Some(tree) = tree.as_ref() else {
                return Err(RlvError::FolderUnavailable);
            };
            let Some(folder) = find_folder(tree, tree.root(), option) else {
                tracing::debug!(path = option, "[Dispatcher] Folder not found");
                return Ok(Outcome::Ignored);
            };
            let items = self.folder_item_ids(tree, &[folder], false);
            worn.iter().filter(|w| items.contains(&w.item_id)).collect()
        } else {
            return Err(RlvError::UnknownAttachmentPoint(option.to_string()));
        };

        self.take_off(tree.as_ref(), targets).await
    }

    /// `detachall:<folder>`, recursive
    async fn detach_path(&self, path: &str) -> RlvResult<Outcome> {
        if path.trim().is_empty() {
            return Err(RlvError::UnknownFolder(path.to_string()));
        }
        let tree = self.shared_tree().await?;
        let Some(folder) = find_folder(&tree, tree.root(), path) else {
            tracing::debug!(path, "[Dispatcher] Folder not found");
            return Ok(Outcome::Ignored);
        };
        let worn = self.outfit.worn_items().await;
        let items = self.folder_item_ids(&tree, &[folder], true);
        let targets = worn.iter().filter(|w| items.contains(&w.item_id)).collect();
        self.take_off(Some(&tree), targets).await
    }

    async fn detach_this(&self, command: &Command, recursive: bool) -> RlvResult<Outcome> {
        let tree = self.shared_tree().await?;
        let worn = self.outfit.worn_items().await;
        let selected = self.selected_items(&worn, command).await?;
        let folders = holding_folders(&tree, &selected);
        let items = self.folder_item_ids(&tree, &folders, recursive);
        let targets = worn.iter().filter(|w| items.contains(&w.item_id)).collect();
        self.take_off(Some(&tree), targets).await
    }

    /// The issuer removes itself; its own locks do not hold it
    async fn detach_me(&self, command: &Command) -> RlvResult<Outcome> {
        let Some(item) = self.outfit.item_for_object(command.issuer).await else {
            tracing::debug!(issuer = %command.issuer, "[Dispatcher] Issuer is not an attachment");
            return Ok(Outcome::Ignored);
        };
        self.outfit.detach(&[item]).await?;
        Ok(Outcome::Executed)
    }

    /// `remoutfit[:layer]`; no option addresses every layer
    async fn remove_outfit(&self, option: &str) -> RlvResult<Outcome> {
        let layer = if option.is_empty() {
            None
        } else {
            Some(
                WearableType::from_name(option)
                    .ok_or_else(|| RlvError::UnknownWearable(option.to_string()))?,
            )
        };
        let worn = self.outfit.worn_items().await;
        let tree = self.shared_tree().await.ok();
        let targets = worn
            .iter()
            .filter(|w| match (w.wearable_type(), layer) {
                (Some(worn_layer), Some(wanted)) => worn_layer == wanted,
                (Some(_), None) => true,
                (None, _) => false,
            })
            .collect();
        self.take_off(tree.as_ref(), targets).await
    }

    fn folder_item_ids(
        &self,
        tree: &InventoryTree,
        folders: &[NodeId],
        recursive: bool,
    ) -> Vec<ObjectId> {
        folders
            .iter()
            .flat_map(|f| self.folder_items(tree, *f, recursive))
            .map(|node| tree.node(node).id)
            .collect()
    }

    /// Remove the targets that are not locked
    async fn take_off(
        &self,
        tree: Option<&InventoryTree>,
        targets: Vec<&WornItem>,
    ) -> RlvResult<Outcome> {
        let mut objects = Vec::new();
        let mut clothes = Vec::new();
        for item in targets {
            let folder_path = tree.and_then(|t| item_folder_path(t, &item.item_id));
            if !self.permissions.can_detach_worn(item, folder_path.as_deref()) {
                tracing::debug!(item = %item.name, "[Dispatcher] Item is locked, leaving it on");
                continue;
            }
            match item.kind {
                WornKind::Attached { .. } => objects.push(item.item_id),
                WornKind::Worn(_) => clothes.push(item.item_id),
            }
        }

        if objects.is_empty() && clothes.is_empty() {
            return Ok(Outcome::Ignored);
        }
        if !objects.is_empty() {
            self.outfit.detach(&objects).await?;
        }
        if !clothes.is_empty() {
            self.outfit.remove_from_outfit(&clothes).await?;
        }
        Ok(Outcome::Executed)
    }
}
