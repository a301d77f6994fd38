//! Information queries
//!
//! Every query formats a reply string; the dispatcher sends it. Missing
//! folders or items give an empty reply, never an error.

use uuid::Uuid;

use super::args::{split_keywords, split_modifier};
use super::dispatcher::{holding_folders, Dispatcher};
use super::table::QueryVerb;
use crate::core::{AttachmentPoint, ObjectId, RlvError, RlvResult, WearableType};
use crate::inventory::{
    best_match, find_folder, find_folders_by_keywords, folder_worn_code, full_path,
};
use crate::parser::Command;

/// Default separator between `getstatus` entries
pub const STATUS_SEPARATOR: &str = "/";

/// Default separator between `findfolders` and `getpathnew` entries
pub const LIST_SEPARATOR: &str = ",";

/// `getgroup` reply when no group is active
pub const NO_GROUP: &str = "none";

fn digit(set: bool) -> char {
    if set {
        '1'
    } else {
        '0'
    }
}

impl Dispatcher {
    pub(super) async fn answer(&self, verb: QueryVerb, command: &Command) -> RlvResult<String> {
        let option = command.option.as_str();
        match verb {
            QueryVerb::Version => Ok(self.config.version_label.clone()),
            QueryVerb::VersionNew => Ok(self.config.version_new_label.clone()),
            QueryVerb::VersionNum => Ok(self.config.version_num.clone()),
            QueryVerb::GetGroup => Ok(self
                .groups
                .active_group()
                .await
                .map(|g| g.name)
                .unwrap_or_else(|| NO_GROUP.to_string())),
            QueryVerb::GetSitId => Ok(self
                .world
                .sitting_on()
                .await
                .unwrap_or_else(Uuid::nil)
                .to_string()),
            QueryVerb::GetStatus { all } => Ok(self.status_reply(command, all)),
            QueryVerb::GetOutfit => self.outfit_reply(option).await,
            QueryVerb::GetAttach => self.attach_reply(option).await,
            QueryVerb::GetInv => Ok(self.inventory_reply(option).await),
            QueryVerb::GetInvWorn => Ok(self.inventory_worn_reply(option).await),
            QueryVerb::FindFolder => Ok(self.find_folder_reply(option, false).await),
            QueryVerb::FindFolders => Ok(self.find_folder_reply(option, true).await),
            QueryVerb::GetPath { all } => self.path_reply(command, all).await,
        }
    }

    /// `/behaviour[:option]` for each rule whose behaviour contains the filter
    fn status_reply(&self, command: &Command, all: bool) -> String {
        let (filter, separator) = split_modifier(&command.option);
        let filter = filter.to_lowercase();
        let separator = separator
            .filter(|s| !s.is_empty())
            .unwrap_or(STATUS_SEPARATOR);

        let rules = if all {
            self.store.rules()
        } else {
            self.store.rules_from(&command.issuer)
        };

        rules
            .iter()
            .filter(|r| r.behaviour.contains(&filter))
            .map(|r| format!("{}{}", separator, r.status_text()))
            .collect()
    }

    async fn outfit_reply(&self, option: &str) -> RlvResult<String> {
        let worn = self.outfit.worn_items().await;
        let wearing = |layer: WearableType| worn.iter().any(|w| w.wearable_type() == Some(layer));

        if option.is_empty() {
            return Ok(WearableType::ALL
                .iter()
                .map(|layer| digit(wearing(*layer)))
                .collect());
        }
        let layer = WearableType::from_name(option)
            .ok_or_else(|| RlvError::UnknownWearable(option.to_string()))?;
        Ok(digit(wearing(layer)).to_string())
    }

    async fn attach_reply(&self, option: &str) -> RlvResult<String> {
        let worn = self.outfit.worn_items().await;
        let occupied =
            |point: AttachmentPoint| worn.iter().any(|w| w.attachment_point() == Some(point));

        if option.is_empty() {
            return Ok(AttachmentPoint::ALL
                .iter()
                .map(|point| digit(occupied(*point)))
                .collect());
        }
        let point = AttachmentPoint::from_name(option)
            .ok_or_else(|| RlvError::UnknownAttachmentPoint(option.to_string()))?;
        Ok(digit(occupied(point)).to_string())
    }

    /// Comma-separated subfolder names
    async fn inventory_reply(&self, path: &str) -> String {
        let Ok(tree) = self.shared_tree().await else {
            return String::new();
        };
        let Some(folder) = find_folder(&tree, tree.root(), path) else {
            return String::new();
        };
        self.visible_folders(&tree, folder)
            .into_iter()
            .map(|f| tree.name(f).to_string())
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR)
    }

    /// `|XY,child|XY,...` worn codes for a folder and its subfolders
    async fn inventory_worn_reply(&self, path: &str) -> String {
        let Ok(tree) = self.shared_tree().await else {
            return String::new();
        };
        let Some(folder) = find_folder(&tree, tree.root(), path) else {
            return String::new();
        };

        let worn = self.outfit.worn_items().await;
        let is_worn = |id: &ObjectId| worn.iter().any(|w| &w.item_id == id);

        let mut reply = format!("|{}", folder_worn_code(&tree, folder, &is_worn));
        for child in self.visible_folders(&tree, folder) {
            reply.push(',');
            reply.push_str(tree.name(child));
            reply.push('|');
            reply.push_str(&folder_worn_code(&tree, child, &is_worn));
        }
        reply
    }

    async fn find_folder_reply(&self, option: &str, all: bool) -> String {
        let (keywords, separator) = split_modifier(option);
        let keywords = split_keywords(keywords);
        let Ok(tree) = self.shared_tree().await else {
            return String::new();
        };

        let matches =
            find_folders_by_keywords(&tree, tree.root(), &keywords, &self.config.hidden_prefix);
        if all {
            let separator = separator
                .filter(|s| !s.is_empty())
                .unwrap_or(LIST_SEPARATOR);
            matches
                .iter()
                .map(|m| full_path(&tree, *m))
                .collect::<Vec<_>>()
                .join(separator)
        } else {
            best_match(&tree, &matches)
                .map(|m| full_path(&tree, m))
                .unwrap_or_default()
        }
    }

    /// Folder paths of the items worn at a point/layer, or of the issuer itself
    async fn path_reply(&self, command: &Command, all: bool) -> RlvResult<String> {
        let Ok(tree) = self.shared_tree().await else {
            return Ok(String::new());
        };
        let worn = self.outfit.worn_items().await;
        let items = self.selected_items(&worn, command).await?;

        let paths: Vec<String> = holding_folders(&tree, &items)
            .into_iter()
            .map(|f| full_path(&tree, f))
            .collect();

        if all {
            Ok(paths.join(LIST_SEPARATOR))
        } else {
            Ok(paths.into_iter().next().unwrap_or_default())
        }
    }
}
