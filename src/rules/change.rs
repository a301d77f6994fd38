//! Rule change notifications
//!
//! Changes are broadcast so any number of listeners (status panels, logs)
//! can follow the active rule set. Sending with no subscribers is fine.

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use super::rule::Rule;
use crate::core::ObjectId;

/// Default buffer size for the change broadcast channel
pub const CHANGE_CHANNEL_SIZE: usize = 256;

/// What happened to the rule set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// A rule was added (or replaced)
    Added,
    /// A rule, or all of a behaviour's rules from one issuer, was removed
    Removed,
    /// Every rule of an issuer was dropped
    IssuerCleared,
    /// The engine was enabled or disabled
    EnabledChanged,
}

/// A change to the active rule set
#[derive(Debug, Clone)]
pub struct RuleChange {
    pub kind: ChangeKind,
    /// The triggering rule, if a single rule triggered it
    pub rule: Option<Rule>,
    /// The issuer affected, if any
    pub issuer: Option<ObjectId>,
    pub at: DateTime<Utc>,
}

impl RuleChange {
    pub fn added(rule: Rule) -> Self {
        Self {
            kind: ChangeKind::Added,
            issuer: Some(rule.issuer),
            rule: Some(rule),
            at: Utc::now(),
        }
    }

    pub fn removed(rule: Rule) -> Self {
        Self {
            kind: ChangeKind::Removed,
            issuer: Some(rule.issuer),
            rule: Some(rule),
            at: Utc::now(),
        }
    }

    pub fn issuer_cleared(issuer: ObjectId) -> Self {
        Self {
            kind: ChangeKind::IssuerCleared,
            rule: None,
            issuer: Some(issuer),
            at: Utc::now(),
        }
    }

    pub fn enabled_changed() -> Self {
        Self {
            kind: ChangeKind::EnabledChanged,
            rule: None,
            issuer: None,
            at: Utc::now(),
        }
    }
}

/// Sender half of the change channel
pub type ChangeSender = broadcast::Sender<RuleChange>;

/// Receiver half of the change channel
pub type ChangeReceiver = broadcast::Receiver<RuleChange>;

/// Create the change broadcast channel
///
/// Receivers are created by calling `sender.subscribe()`.
pub fn create_change_channel() -> ChangeSender {
    let (tx, _) = broadcast::channel(CHANGE_CHANNEL_SIZE);
    tx
}

/// Publish a change, ignoring the no-subscriber case
pub fn notify(sender: &ChangeSender, change: RuleChange) {
    let kind = change.kind;
    if sender.send(change).is_err() {
        tracing::trace!(?kind, "No change subscribers");
    }
}
