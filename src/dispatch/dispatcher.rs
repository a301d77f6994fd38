//! Command execution
//!
//! Each command is routed in a fixed order:
//! 1. `clear` drops the issuer's rules
//! 2. add/remove params toggle a restriction in the store
//! 3. everything else is looked up in the [`BehaviourTable`]
//!
//! Queries reply on the channel given as param. Actions run only with the
//! force param and race the caller's cancellation token.

use std::future::Future;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::args::parse_channel;
use super::table::{BehaviourTable, Handler};
use crate::core::{AttachmentPoint, ObjectId, RlvError, RlvResult, WearableType};
use crate::engine::RlvConfig;
use crate::inventory::{full_path, InventoryTree, NodeId};
use crate::parser::{Command, CommandKind, CLEAR_KEYWORD};
use crate::permissions::PermissionQuery;
use crate::rules::{notify, ChangeSender, Rule, RuleChange, RuleStore};
use crate::world::{Collaborators, Groups, Outfit, WorldSession, WornItem};

/// What executing one command did
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A restriction was added (or replaced)
    Added(Rule),
    /// This many rules were removed by a remove toggle
    Removed(usize),
    /// This many rules were removed by `clear`
    Cleared(usize),
    /// A query reply was sent
    Replied { channel: i32 },
    /// An action reached its collaborator
    Executed,
    /// Nothing to do: unknown behaviour, missing force, missing target
    Ignored,
}

/// Stateless executor for parsed commands
pub struct Dispatcher {
    pub(super) store: Arc<RuleStore>,
    pub(super) permissions: PermissionQuery,
    pub(super) world: Arc<dyn WorldSession>,
    pub(super) outfit: Arc<dyn Outfit>,
    pub(super) groups: Arc<dyn Groups>,
    pub(super) config: Arc<RlvConfig>,
    changes: ChangeSender,
    table: BehaviourTable,
}

impl Dispatcher {
    pub fn new(
        store: Arc<RuleStore>,
        collaborators: Collaborators,
        config: Arc<RlvConfig>,
        changes: ChangeSender,
    ) -> Self {
        Self {
            permissions: PermissionQuery::new(store.clone()),
            store,
            world: collaborators.world,
            outfit: collaborators.outfit,
            groups: collaborators.groups,
            config,
            changes,
            table: BehaviourTable::standard(),
        }
    }

    /// Make permission answers follow a shared enabled flag
    pub fn with_enabled_flag(mut self, enabled: Arc<AtomicBool>) -> Self {
        self.permissions = PermissionQuery::new(self.store.clone()).with_enabled_flag(enabled);
        self
    }

    pub fn table(&self) -> &BehaviourTable {
        &self.table
    }

    pub fn permissions(&self) -> &PermissionQuery {
        &self.permissions
    }

    /// Execute one command
    ///
    /// Returns `Err` only for the command itself; the caller decides whether
    /// to continue with the rest of the line.
    pub async fn execute(
        &self,
        command: &Command,
        cancel: &CancellationToken,
    ) -> RlvResult<Outcome> {
        if cancel.is_cancelled() {
            return Err(RlvError::Cancelled);
        }

        if command.behaviour == CLEAR_KEYWORD {
            return Ok(self.clear_matching(command));
        }

        match command.kind() {
            CommandKind::Add => return Ok(self.add_rule(command)),
            CommandKind::Remove => return Ok(self.remove_rule(command)),
            CommandKind::Force | CommandKind::Value(_) => {}
        }

        let Some(handler) = self.table.get(&command.behaviour) else {
            tracing::debug!(behaviour = %command.behaviour, "[Dispatcher] No handler, ignoring");
            return Ok(Outcome::Ignored);
        };

        match handler {
            Handler::Query(verb) => {
                let channel = parse_channel(&command.param)?;
                let reply = until_cancelled(cancel, self.answer(verb, command)).await?;
                tracing::debug!(channel, reply = %reply, "[Dispatcher] Query reply");
                self.world.send_chat(channel, &reply).await?;
                Ok(Outcome::Replied { channel })
            }
            Handler::Action(verb) => {
                if !matches!(command.kind(), CommandKind::Force) {
                    tracing::debug!(command = %command, "[Dispatcher] Action without force, ignoring");
                    return Ok(Outcome::Ignored);
                }
                tracing::info!(
                    issuer = %command.issuer,
                    command = %command,
                    "[Dispatcher] Executing action"
                );
                until_cancelled(cancel, self.perform(verb, command)).await
            }
        }
    }

    fn add_rule(&self, command: &Command) -> Outcome {
        let rule = command.to_rule();
        self.store.add(rule.clone());
        notify(&self.changes, RuleChange::added(rule.clone()));
        Outcome::Added(rule)
    }

    fn remove_rule(&self, command: &Command) -> Outcome {
        let removed =
            self.store
                .remove_matching(&command.behaviour, &command.issuer, &command.option);
        if removed > 0 {
            notify(&self.changes, RuleChange::removed(command.to_rule()));
        }
        Outcome::Removed(removed)
    }

    /// `@clear=<fragment>`; an empty fragment clears everything from the issuer
    fn clear_matching(&self, command: &Command) -> Outcome {
        let cleared = if command.param.is_empty() {
            self.store.clear_issuer(&command.issuer)
        } else {
            self.store
                .clear_issuer_matching(&command.issuer, &command.param)
        };
        if cleared > 0 {
            notify(&self.changes, RuleChange::issuer_cleared(command.issuer));
        }
        Outcome::Cleared(cleared)
    }

    /// Drop every rule from an issuer, as a bare `@clear` line does
    pub fn clear_issuer(&self, issuer: &ObjectId) -> usize {
        let cleared = self.store.clear_issuer(issuer);
        if cleared > 0 {
            notify(&self.changes, RuleChange::issuer_cleared(*issuer));
        }
        cleared
    }

    // ------------------------------------------------------------------
    // Helpers shared by queries and actions
    // ------------------------------------------------------------------

    /// Snapshot of the configured shared folder
    pub(super) async fn shared_tree(&self) -> RlvResult<InventoryTree> {
        self.outfit
            .shared_folder(&self.config.shared_folder)
            .await
            .ok_or_else(|| {
                tracing::debug!(
                    folder = %self.config.shared_folder,
                    "[Dispatcher] Shared folder unavailable"
                );
                RlvError::FolderUnavailable
            })
    }

    pub(super) fn is_hidden(&self, name: &str) -> bool {
        !self.config.hidden_prefix.is_empty() && name.starts_with(&self.config.hidden_prefix)
    }

    /// Child folders shown in listings
    pub(super) fn visible_folders(&self, tree: &InventoryTree, folder: NodeId) -> Vec<NodeId> {
        tree.child_folders(folder)
            .filter(|f| !self.is_hidden(tree.name(*f)))
            .collect()
    }

    /// Items in a folder, optionally with its visible subfolders
    pub(super) fn folder_items(
        &self,
        tree: &InventoryTree,
        folder: NodeId,
        recursive: bool,
    ) -> Vec<NodeId> {
        let mut items: Vec<NodeId> = tree.items_in(folder).collect();
        if recursive {
            for child in self.visible_folders(tree, folder) {
                items.extend(self.folder_items(tree, child, true));
            }
        }
        items
    }

    /// Inventory ids of the worn items an option addresses
    ///
    /// An empty option addresses the issuer's own attachment.
    pub(super) async fn selected_items(
        &self,
        worn: &[WornItem],
        command: &Command,
    ) -> RlvResult<Vec<ObjectId>> {
        if command.option.is_empty() {
            return Ok(self
                .outfit
                .item_for_object(command.issuer)
                .await
                .into_iter()
                .collect());
        }
        Ok(select_worn(worn, &command.option)?
            .into_iter()
            .map(|w| w.item_id)
            .collect())
    }
}

/// Worn items at an attachment point or on a clothing layer
pub(super) fn select_worn<'a>(worn: &'a [WornItem], option: &str) -> RlvResult<Vec<&'a WornItem>> {
    if let Some(point) = AttachmentPoint::from_name(option) {
        return Ok(worn
            .iter()
            .filter(|w| w.attachment_point() == Some(point))
            .collect());
    }
    if let Some(layer) = WearableType::from_name(option) {
        return Ok(worn
            .iter()
            .filter(|w| w.wearable_type() == Some(layer))
            .collect());
    }
    Err(RlvError::UnknownAttachmentPoint(option.to_string()))
}

/// Folders holding the given items, in first-seen order
pub(super) fn holding_folders(tree: &InventoryTree, items: &[ObjectId]) -> Vec<NodeId> {
    let mut folders = Vec::new();
    for item in items {
        if let Some(parent) = tree.find_item(item).and_then(|node| tree.parent(node)) {
            if !folders.contains(&parent) {
                folders.push(parent);
            }
        }
    }
    folders
}

/// Shared-folder path of the folder holding an item
pub(super) fn item_folder_path(tree: &InventoryTree, item: &ObjectId) -> Option<String> {
    let parent = tree.find_item(item).and_then(|node| tree.parent(node))?;
    Some(full_path(tree, parent))
}

async fn until_cancelled<T, F>(cancel: &CancellationToken, work: F) -> RlvResult<T>
where
    F: Future<Output = RlvResult<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(RlvError::Cancelled),
        result = work => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{create_change_channel, ChangeKind};
    use crate::world::{MemoryGroups, MemoryOutfit, MemoryWorld};
    use uuid::Uuid;

    fn dispatcher() -> (Dispatcher, Arc<MemoryWorld>, ChangeSender) {
        let world = Arc::new(MemoryWorld::new());
        let changes = create_change_channel();
        let dispatcher = Dispatcher::new(
            Arc::new(RuleStore::new()),
            Collaborators::new(
                world.clone(),
                Arc::new(MemoryOutfit::new()),
                Arc::new(MemoryGroups::new()),
            ),
            Arc::new(RlvConfig::default()),
            changes.clone(),
        );
        (dispatcher, world, changes)
    }

    fn command(behaviour: &str, option: &str, param: &str, issuer: ObjectId) -> Command {
        Command {
            behaviour: behaviour.into(),
            option: option.into(),
            param: param.into(),
            issuer,
            issuer_name: "Collar".into(),
        }
    }

    #[tokio::test]
    async fn test_toggles_mutate_store_and_notify() {
        let (dispatcher, _, changes) = dispatcher();
        let mut rx = changes.subscribe();
        let issuer = Uuid::new_v4();
        let cancel = CancellationToken::new();

        let outcome = dispatcher
            .execute(&command("sendchat", "", "n", issuer), &cancel)
            .await
            .unwrap();
        assert!(matches!(outcome, Outcome::Added(_)));
        assert!(dispatcher.store.is_restricted("sendchat"));
        assert_eq!(rx.recv().await.unwrap().kind, ChangeKind::Added);

        let outcome = dispatcher
            .execute(&command("sendchat", "", "y", issuer), &cancel)
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Removed(1));
        assert!(!dispatcher.store.is_restricted("sendchat"));
        assert_eq!(rx.recv().await.unwrap().kind, ChangeKind::Removed);
    }

    #[tokio::test]
    async fn test_remove_without_rule_is_silent() {
        let (dispatcher, _, changes) = dispatcher();
        let mut rx = changes.subscribe();
        let outcome = dispatcher
            .execute(
                &command("detach", "", "y", Uuid::new_v4()),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Removed(0));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_toggle_on_action_name_is_a_rule() {
        let (dispatcher, world, _) = dispatcher();
        let issuer = Uuid::new_v4();
        dispatcher
            .execute(&command("unsit", "", "n", issuer), &CancellationToken::new())
            .await
            .unwrap();
        assert!(dispatcher.store.is_restricted("unsit"));
        assert!(world.events().is_empty());
    }

    #[tokio::test]
    async fn test_clear_fragment() {
        let (dispatcher, _, _) = dispatcher();
        let issuer = Uuid::new_v4();
        let cancel = CancellationToken::new();
        for behaviour in ["sendchat", "recvchat", "detach"] {
            dispatcher
                .execute(&command(behaviour, "", "n", issuer), &cancel)
                .await
                .unwrap();
        }

        let outcome = dispatcher
            .execute(&command("clear", "", "chat", issuer), &cancel)
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Cleared(2));
        assert!(dispatcher.store.is_restricted("detach"));
        assert_eq!(dispatcher.clear_issuer(&issuer), 1);
    }

    #[tokio::test]
    async fn test_unknown_behaviour_and_missing_force() {
        let (dispatcher, world, _) = dispatcher();
        let cancel = CancellationToken::new();
        let issuer = Uuid::new_v4();

        let outcome = dispatcher
            .execute(&command("fly", "", "force", issuer), &cancel)
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Ignored);

        let outcome = dispatcher
            .execute(&command("tpto", "1/2/3", "2222", issuer), &cancel)
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Ignored);
        assert!(world.events().is_empty());
    }

    #[tokio::test]
    async fn test_query_needs_positive_channel() {
        let (dispatcher, world, _) = dispatcher();
        let cancel = CancellationToken::new();
        let issuer = Uuid::new_v4();

        let err = dispatcher
            .execute(&command("version", "", "0", issuer), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, RlvError::InvalidChannel(_)));

        let err = dispatcher
            .execute(&command("version", "", "force", issuer), &cancel)
            .await
            .unwrap_err();
        assert!(err.is_argument_error());
        assert!(world.chat().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_before_work() {
        let (dispatcher, world, _) = dispatcher();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = dispatcher
            .execute(&command("tpto", "1/2/3", "force", Uuid::new_v4()), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, RlvError::Cancelled));
        assert!(world.events().is_empty());
        assert!(dispatcher.store.is_empty());
    }
}
