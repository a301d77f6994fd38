//! Permission query implementation
//!
//! Every answer is computed from a snapshot of the rule store, so callers
//! may ask from any thread while commands are being processed. While the
//! shared enabled flag is off, no rule is in force.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::core::{AttachmentPoint, ChatType, ObjectId};
use crate::inventory::{is_within, ItemKind};
use crate::rules::{Rule, RuleStore};
use crate::world::{WornItem, WornKind};

/// Behaviour names consulted by the permission checks
pub mod behaviour {
    pub const DETACH: &str = "detach";
    pub const REMATTACH: &str = "remattach";
    pub const ADDATTACH: &str = "addattach";
    pub const REMOUTFIT: &str = "remoutfit";
    pub const ADDOUTFIT: &str = "addoutfit";
    pub const ATTACHTHIS: &str = "attachthis";
    pub const ATTACHALLTHIS: &str = "attachallthis";
    pub const DETACHTHIS: &str = "detachthis";
    pub const DETACHALLTHIS: &str = "detachallthis";
    pub const SENDCHAT: &str = "sendchat";
    pub const SENDCHANNEL: &str = "sendchannel";
    pub const RECVCHAT: &str = "recvchat";
    pub const SENDIM: &str = "sendim";
    pub const RECVIM: &str = "recvim";
    pub const CHATSHOUT: &str = "chatshout";
    pub const CHATNORMAL: &str = "chatnormal";
    pub const CHATWHISPER: &str = "chatwhisper";
    pub const TPLOC: &str = "tploc";
    pub const TPLURE: &str = "tplure";
    pub const ACCEPTTP: &str = "accepttp";
    pub const SIT: &str = "sit";
    pub const UNSIT: &str = "unsit";
    pub const SHOWINV: &str = "showinv";
    pub const EDIT: &str = "edit";
    pub const REZ: &str = "rez";
}

use behaviour as b;

/// Yes/no policy answers over the active rule set
#[derive(Debug, Clone)]
pub struct PermissionQuery {
    store: Arc<RuleStore>,
    enabled: Arc<AtomicBool>,
}

impl PermissionQuery {
    /// Query that is always enabled
    pub fn new(store: Arc<RuleStore>) -> Self {
        Self {
            store,
            enabled: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Follow an enabled flag owned elsewhere
    pub fn with_enabled_flag(mut self, enabled: Arc<AtomicBool>) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Rules in force for a behaviour; none while disabled
    fn matching(&self, behaviour: &str) -> Vec<Rule> {
        if self.is_enabled() {
            self.matching(behaviour)
        } else {
            Vec::new()
        }
    }

    /// True iff an unqualified rule for the behaviour exists
    pub fn is_restricted(&self, behaviour: &str) -> bool {
        self.is_enabled() && self.store.is_restricted(behaviour)
    }

    /// True iff restricted and no rule carries `exception` as its option
    pub fn is_restricted_except(&self, behaviour: &str, exception: &str) -> bool {
        self.is_enabled() && self.store.is_restricted_except(behaviour, exception)
    }

    /// Same as `is_restricted_except` for an id exception (ids compare case-insensitively)
    fn is_restricted_except_id(&self, behaviour: &str, id: &ObjectId) -> bool {
        let rules = self.matching(behaviour);
        let exception = id.to_string();
        rules.iter().any(Rule::is_unqualified)
            && !rules
                .iter()
                .any(|r| r.option.eq_ignore_ascii_case(&exception))
    }

    fn has_option(rules: &[Rule], option: &str) -> bool {
        rules.iter().any(|r| r.option.eq_ignore_ascii_case(option))
    }

    // ------------------------------------------------------------------
    // Outfit
    // ------------------------------------------------------------------

    /// Whether an item may be taken off
    ///
    /// Items that are not worn are trivially detachable.
    pub fn can_detach(
        &self,
        item_id: &ObjectId,
        worn: &[WornItem],
        folder_path: Option<&str>,
    ) -> bool {
        match worn.iter().find(|w| &w.item_id == item_id) {
            Some(item) => self.can_detach_worn(item, folder_path),
            None => true,
        }
    }

    /// Whether a worn item may be taken off
    ///
    /// `folder_path` is the item's folder relative to the shared folder,
    /// when the item lives there.
    pub fn can_detach_worn(&self, item: &WornItem, folder_path: Option<&str>) -> bool {
        match item.kind {
            WornKind::Attached { point, object_id } => {
                let detach = self.matching(b::DETACH);
                // An object that locked itself stays on
                if detach
                    .iter()
                    .any(|r| r.is_unqualified() && r.issuer == object_id)
                {
                    return false;
                }
                if Self::has_option(&detach, point.name()) {
                    return false;
                }
                let remattach = self.matching(b::REMATTACH);
                if remattach.iter().any(Rule::is_unqualified)
                    || Self::has_option(&remattach, point.name())
                {
                    return false;
                }
            }
            WornKind::Worn(layer) => {
                if layer.is_body_part() {
                    return false;
                }
                let remoutfit = self.matching(b::REMOUTFIT);
                if remoutfit.iter().any(Rule::is_unqualified)
                    || Self::has_option(&remoutfit, layer.name())
                {
                    return false;
                }
            }
        }

        match folder_path {
            Some(path) => !self.folder_locked(path, b::DETACHTHIS, b::DETACHALLTHIS),
            None => true,
        }
    }

    /// Whether an item may be put on
    pub fn can_attach(
        &self,
        kind: ItemKind,
        point: Option<AttachmentPoint>,
        folder_path: Option<&str>,
    ) -> bool {
        match kind {
            ItemKind::Object => {
                let addattach = self.matching(b::ADDATTACH);
                if addattach.iter().any(Rule::is_unqualified) {
                    return false;
                }
                if let Some(point) = point {
                    if Self::has_option(&addattach, point.name()) {
                        return false;
                    }
                }
            }
            ItemKind::Wearable(layer) => {
                let addoutfit = self.matching(b::ADDOUTFIT);
                if addoutfit.iter().any(Rule::is_unqualified)
                    || Self::has_option(&addoutfit, layer.name())
                {
                    return false;
                }
            }
            ItemKind::Other => return false,
        }

        match folder_path {
            Some(path) => !self.folder_locked(path, b::ATTACHTHIS, b::ATTACHALLTHIS),
            None => true,
        }
    }

    /// A folder is locked by an exact `this` rule or an `allthis` rule on it or an ancestor
    fn folder_locked(&self, path: &str, this: &str, all_this: &str) -> bool {
        let exact = self.matching(this);
        if exact
            .iter()
            .any(|r| !r.is_unqualified() && is_within(path, &r.option) && is_within(&r.option, path))
        {
            return true;
        }
        self.matching(all_this)
            .iter()
            .any(|r| !r.is_unqualified() && is_within(path, &r.option))
    }

    /// Folders (shared-folder paths) locked against detaching
    pub fn locked_folders(&self) -> BTreeSet<String> {
        if !self.is_enabled() {
            return BTreeSet::new();
        }
        let mut folders = self.store.options_for(b::DETACHTHIS);
        folders.extend(self.store.options_for(b::DETACHALLTHIS));
        folders
    }

    // ------------------------------------------------------------------
    // Chat
    // ------------------------------------------------------------------

    /// Whether the avatar may send chat on a channel
    pub fn chat_allowed(&self, channel: i32) -> bool {
        if channel == 0 {
            !self.is_restricted(b::SENDCHAT)
        } else {
            !self.is_restricted_except(b::SENDCHANNEL, &channel.to_string())
        }
    }

    /// Volume actually used for local chat
    ///
    /// The demotions are applied in a fixed order: shout to normal
    /// (`chatshout`), then normal or shout to whisper (`chatnormal`), then
    /// whisper to normal (`chatwhisper`).
    pub fn effective_chat_type(&self, requested: ChatType) -> ChatType {
        let mut chat = requested;
        if chat == ChatType::Shout && self.is_restricted(b::CHATSHOUT) {
            chat = ChatType::Normal;
        }
        if matches!(chat, ChatType::Normal | ChatType::Shout) && self.is_restricted(b::CHATNORMAL)
        {
            chat = ChatType::Whisper;
        }
        if chat == ChatType::Whisper && self.is_restricted(b::CHATWHISPER) {
            chat = ChatType::Normal;
        }
        chat
    }

    /// Whether local chat from `from` is shown
    pub fn can_receive_chat(&self, from: &ObjectId) -> bool {
        !self.is_restricted_except_id(b::RECVCHAT, from)
    }

    /// Whether an IM may be sent to `to`
    pub fn can_send_im(&self, to: &ObjectId) -> bool {
        !self.is_restricted_except_id(b::SENDIM, to)
    }

    /// Whether an IM from `from` is shown
    pub fn can_receive_im(&self, from: &ObjectId) -> bool {
        !self.is_restricted_except_id(b::RECVIM, from)
    }

    // ------------------------------------------------------------------
    // Movement
    // ------------------------------------------------------------------

    pub fn can_teleport_to_location(&self) -> bool {
        !self.is_restricted(b::TPLOC)
    }

    /// Whether a teleport offer from `from` may be accepted
    pub fn can_accept_lure(&self, from: &ObjectId) -> bool {
        !self.is_restricted_except_id(b::TPLURE, from)
    }

    /// Whether a teleport offer from `from` is accepted without asking
    ///
    /// True iff an `accepttp` rule names `from` or an unqualified one exists.
    pub fn auto_accept_teleport(&self, from: &ObjectId) -> bool {
        let requester = from.to_string();
        self.matching(b::ACCEPTTP)
            .iter()
            .any(|r| r.is_unqualified() || r.option.eq_ignore_ascii_case(&requester))
    }

    pub fn can_sit(&self) -> bool {
        !self.is_restricted(b::SIT)
    }

    pub fn can_stand(&self) -> bool {
        !self.is_restricted(b::UNSIT)
    }

    // ------------------------------------------------------------------
    // Interface
    // ------------------------------------------------------------------

    pub fn can_open_inventory(&self) -> bool {
        !self.is_restricted(b::SHOWINV)
    }

    pub fn can_edit(&self) -> bool {
        !self.is_restricted(b::EDIT)
    }

    pub fn can_rez(&self) -> bool {
        !self.is_restricted(b::REZ)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::WearableType;
    use uuid::Uuid;

    fn setup() -> (Arc<RuleStore>, PermissionQuery) {
        let store = Arc::new(RuleStore::new());
        let query = PermissionQuery::new(store.clone());
        (store, query)
    }

    fn attached(point: AttachmentPoint, object_id: ObjectId) -> WornItem {
        WornItem {
            item_id: Uuid::new_v4(),
            name: "thing".into(),
            kind: WornKind::Attached { point, object_id },
        }
    }

    #[test]
    fn test_unworn_item_is_detachable() {
        let (store, query) = setup();
        store.add(Rule::new("remattach", "", Uuid::new_v4(), "cage"));
        assert!(query.can_detach(&Uuid::new_v4(), &[], None));
    }

    #[test]
    fn test_self_locked_attachment() {
        let (store, query) = setup();
        let collar = Uuid::new_v4();
        let other = Uuid::new_v4();
        let item = attached(AttachmentPoint::Neck, collar);
        let worn = vec![item.clone()];

        assert!(query.can_detach(&item.item_id, &worn, None));

        // A detach lock from another object does not pin this one
        store.add(Rule::new("detach", "", other, "cuffs"));
        assert!(query.can_detach(&item.item_id, &worn, None));

        store.add(Rule::new("detach", "", collar, "collar"));
        assert!(!query.can_detach(&item.item_id, &worn, None));

        store.remove_matching("detach", &collar, "");
        assert!(query.can_detach(&item.item_id, &worn, None));
    }

    #[test]
    fn test_point_locks() {
        let (store, query) = setup();
        let item = attached(AttachmentPoint::LeftHand, Uuid::new_v4());

        store.add(Rule::new("detach", "Left Hand", Uuid::new_v4(), "cuff"));
        assert!(!query.can_detach_worn(&item, None));

        store.clear();
        store.add(Rule::new("remattach", "", Uuid::new_v4(), "cage"));
        assert!(!query.can_detach_worn(&item, None));
    }

    #[test]
    fn test_wearable_locks() {
        let (store, query) = setup();
        let shirt = WornItem {
            item_id: Uuid::new_v4(),
            name: "Shirt".into(),
            kind: WornKind::Worn(WearableType::Shirt),
        };
        let skin = WornItem {
            item_id: Uuid::new_v4(),
            name: "Skin".into(),
            kind: WornKind::Worn(WearableType::Skin),
        };

        assert!(query.can_detach_worn(&shirt, None));
        assert!(!query.can_detach_worn(&skin, None));

        store.add(Rule::new("remoutfit", "shirt", Uuid::new_v4(), "x"));
        assert!(!query.can_detach_worn(&shirt, None));
    }

    #[test]
    fn test_folder_locks() {
        let (store, query) = setup();
        let item = attached(AttachmentPoint::Spine, Uuid::new_v4());
        let issuer = Uuid::new_v4();

        store.add(Rule::new("detachthis", "Outfits/Red", issuer, "x"));
        assert!(!query.can_detach_worn(&item, Some("outfits/red")));
        assert!(query.can_detach_worn(&item, Some("Outfits/Red/Shoes")));

        store.add(Rule::new("detachallthis", "Outfits", issuer, "x"));
        assert!(!query.can_detach_worn(&item, Some("Outfits/Blue/Shoes")));
        assert!(query.can_detach_worn(&item, Some("Toys")));

        let locked: Vec<_> = query.locked_folders().into_iter().collect();
        assert_eq!(locked, vec!["Outfits", "Outfits/Red"]);
    }

    #[test]
    fn test_can_attach() {
        let (store, query) = setup();
        let issuer = Uuid::new_v4();

        assert!(query.can_attach(ItemKind::Object, None, None));
        assert!(!query.can_attach(ItemKind::Other, None, None));

        store.add(Rule::new("addattach", "skull", issuer, "x"));
        assert!(!query.can_attach(ItemKind::Object, Some(AttachmentPoint::Skull), None));
        assert!(query.can_attach(ItemKind::Object, Some(AttachmentPoint::Chest), None));

        store.add(Rule::new("addoutfit", "", issuer, "x"));
        assert!(!query.can_attach(ItemKind::Wearable(WearableType::Socks), None, None));

        store.add(Rule::new("attachallthis", "Toys", issuer, "x"));
        assert!(!query.can_attach(ItemKind::Object, None, Some("Toys/Ball")));
    }

    #[test]
    fn test_chat_channels() {
        let (store, query) = setup();
        let issuer = Uuid::new_v4();

        assert!(query.chat_allowed(0));
        store.add(Rule::new("sendchat", "", issuer, "gag"));
        assert!(!query.chat_allowed(0));
        assert!(query.chat_allowed(5));

        store.add(Rule::new("sendchannel", "", issuer, "gag"));
        store.add(Rule::new("sendchannel", "5", issuer, "gag"));
        assert!(query.chat_allowed(5));
        assert!(!query.chat_allowed(6));
    }

    #[test]
    fn test_chat_type_cascade() {
        let (store, query) = setup();
        let issuer = Uuid::new_v4();

        assert_eq!(query.effective_chat_type(ChatType::Shout), ChatType::Shout);

        store.add(Rule::new("chatshout", "", issuer, "gag"));
        assert_eq!(query.effective_chat_type(ChatType::Shout), ChatType::Normal);
        assert_eq!(query.effective_chat_type(ChatType::Whisper), ChatType::Whisper);

        store.add(Rule::new("chatnormal", "", issuer, "gag"));
        assert_eq!(query.effective_chat_type(ChatType::Shout), ChatType::Whisper);
        assert_eq!(query.effective_chat_type(ChatType::Normal), ChatType::Whisper);

        store.add(Rule::new("chatwhisper", "", issuer, "gag"));
        assert_eq!(query.effective_chat_type(ChatType::Normal), ChatType::Normal);

        store.clear();
        store.add(Rule::new("chatwhisper", "", issuer, "gag"));
        assert_eq!(query.effective_chat_type(ChatType::Whisper), ChatType::Normal);
        assert_eq!(query.effective_chat_type(ChatType::Shout), ChatType::Shout);
    }

    #[test]
    fn test_auto_accept_teleport() {
        let (store, query) = setup();
        let friend = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let issuer = Uuid::new_v4();

        assert!(!query.auto_accept_teleport(&friend));

        store.add(Rule::new("accepttp", friend.to_string().to_uppercase(), issuer, "x"));
        assert!(query.auto_accept_teleport(&friend));
        assert!(!query.auto_accept_teleport(&stranger));

        store.add(Rule::new("accepttp", "", issuer, "x"));
        assert!(query.auto_accept_teleport(&stranger));
    }

    #[test]
    fn test_im_and_lure_exceptions() {
        let (store, query) = setup();
        let issuer = Uuid::new_v4();
        let owner = Uuid::new_v4();

        store.add(Rule::new("sendim", "", issuer, "x"));
        store.add(Rule::new("sendim", owner.to_string(), issuer, "x"));
        assert!(query.can_send_im(&owner));
        assert!(!query.can_send_im(&Uuid::new_v4()));

        store.add(Rule::new("tplure", "", issuer, "x"));
        assert!(!query.can_accept_lure(&owner));
        assert!(query.can_teleport_to_location());
    }

    #[test]
    fn test_simple_toggles() {
        let (store, query) = setup();
        let issuer = Uuid::new_v4();
        assert!(query.can_open_inventory() && query.can_edit() && query.can_rez());

        store.add(Rule::new("showinv", "", issuer, "x"));
        store.add(Rule::new("unsit", "", issuer, "x"));
        assert!(!query.can_open_inventory());
        assert!(!query.can_stand());
        assert!(query.can_sit());
    }

    #[test]
    fn test_disabled_flag_lifts_every_rule() {
        let store = Arc::new(RuleStore::new());
        let enabled = Arc::new(AtomicBool::new(true));
        let query = PermissionQuery::new(store.clone()).with_enabled_flag(enabled.clone());
        let issuer = Uuid::new_v4();
        let friend = Uuid::new_v4();
        let item = attached(AttachmentPoint::Neck, issuer);

        store.add(Rule::new("sendchat", "", issuer, "gag"));
        store.add(Rule::new("accepttp", "", issuer, "leash"));
        store.add(Rule::new("detach", "", issuer, "collar"));
        store.add(Rule::new("detachthis", "Outfits", issuer, "collar"));
        assert!(!query.chat_allowed(0));
        assert!(query.auto_accept_teleport(&friend));
        assert!(!query.can_detach_worn(&item, None));

        enabled.store(false, Ordering::SeqCst);
        assert!(query.chat_allowed(0));
        assert!(!query.is_restricted("sendchat"));
        assert!(!query.auto_accept_teleport(&friend));
        assert!(query.can_detach_worn(&item, Some("Outfits")));
        assert!(query.locked_folders().is_empty());
        assert_eq!(store.len(), 4);

        enabled.store(true, Ordering::SeqCst);
        assert!(!query.chat_allowed(0));
    }
}
