//! RlvEngine - the single entry point for chat lines
//!
//! The engine owns the rule store and wires the parser, dispatcher and
//! collector to the caller's collaborators:
//! - `process_chat` runs one line, command by command, in source order
//! - `set_enabled` gates all processing
//! - `subscribe` follows every change to the active rule set
//! - `start_collector` launches the stale-rule sweep

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::config::RlvConfig;
use crate::collector::StaleRuleCollector;
use crate::core::{ObjectId, RlvError, RlvResult};
use crate::dispatch::{Dispatcher, Outcome};
use crate::parser::{Command, CommandParser, ParsedLine};
use crate::permissions::PermissionQuery;
use crate::rules::{
    create_change_channel, notify, ChangeReceiver, ChangeSender, RuleChange, RuleStore,
};
use crate::world::Collaborators;

/// Restriction and command engine for one avatar
pub struct RlvEngine {
    config: Arc<RlvConfig>,
    parser: CommandParser,
    store: Arc<RuleStore>,
    dispatcher: Dispatcher,
    collaborators: Collaborators,
    changes: ChangeSender,
    enabled: Arc<AtomicBool>,
}

impl RlvEngine {
    /// Create an engine with an empty rule store
    pub fn new(config: RlvConfig, collaborators: Collaborators) -> RlvResult<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let store = Arc::new(RuleStore::new());
        let changes = create_change_channel();
        let enabled = Arc::new(AtomicBool::new(config.enabled));
        let dispatcher = Dispatcher::new(
            store.clone(),
            collaborators.clone(),
            config.clone(),
            changes.clone(),
        )
        .with_enabled_flag(enabled.clone());

        tracing::info!(
            shared_folder = %config.shared_folder,
            enabled = config.enabled,
            behaviours = dispatcher.table().len(),
            "[RlvEngine] Created"
        );

        Ok(Self {
            enabled,
            parser: CommandParser::new()?,
            config,
            store,
            dispatcher,
            collaborators,
            changes,
        })
    }

    pub fn config(&self) -> &RlvConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<RuleStore> {
        &self.store
    }

    /// Policy answers over the active rules
    pub fn permissions(&self) -> &PermissionQuery {
        self.dispatcher.permissions()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Turn processing on or off; notifies only when the flag flips
    ///
    /// Rules survive while disabled but none of them is in force.
    pub fn set_enabled(&self, enabled: bool) {
        let previous = self.enabled.swap(enabled, Ordering::SeqCst);
        if previous != enabled {
            tracing::info!(enabled, "[RlvEngine] Enabled flag changed");
            notify(&self.changes, RuleChange::enabled_changed());
        }
    }

    /// Follow changes to the active rule set
    pub fn subscribe(&self) -> ChangeReceiver {
        self.changes.subscribe()
    }

    /// Process one chat line from an issuer
    ///
    /// Returns whether the line was a command line, so the caller can decide
    /// whether to still show it as chat. Nothing is recognised while disabled.
    pub async fn process_chat(&self, text: &str, issuer: ObjectId, issuer_name: &str) -> bool {
        self.process_chat_with_cancel(text, issuer, issuer_name, &CancellationToken::new())
            .await
    }

    /// Same as [`process_chat`](Self::process_chat), abortable through `cancel`
    ///
    /// Once cancelled, the running command stops and the rest of the line is
    /// dropped.
    pub async fn process_chat_with_cancel(
        &self,
        text: &str,
        issuer: ObjectId,
        issuer_name: &str,
        cancel: &CancellationToken,
    ) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let Some(line) = self.parser.parse(text, issuer, issuer_name) else {
            return false;
        };

        match line {
            ParsedLine::Clear => {
                let cleared = self.dispatcher.clear_issuer(&issuer);
                tracing::info!(issuer = %issuer, cleared, "[RlvEngine] Issuer cleared its rules");
            }
            ParsedLine::Commands(commands) => {
                for command in &commands {
                    match self.dispatcher.execute(command, cancel).await {
                        Ok(outcome) => log_outcome(command, &outcome),
                        Err(RlvError::Cancelled) => {
                            tracing::info!(
                                issuer = %issuer,
                                command = %command,
                                "[RlvEngine] Cancelled, dropping rest of line"
                            );
                            break;
                        }
                        Err(e) if e.is_argument_error() => {
                            tracing::debug!(command = %command, error = %e, "[RlvEngine] Command skipped");
                        }
                        Err(e) => {
                            tracing::warn!(command = %command, error = %e, "[RlvEngine] Command failed");
                        }
                    }
                }
            }
        }
        true
    }

    /// Collector over this engine's store and world session
    pub fn collector(&self) -> StaleRuleCollector {
        StaleRuleCollector::new(
            self.store.clone(),
            self.collaborators.world.clone(),
            self.changes.clone(),
        )
        .with_enabled_flag(self.enabled.clone())
    }

    /// Spawn the periodic stale-rule sweep at the configured interval
    pub fn start_collector(&self, cancel: CancellationToken) -> JoinHandle<()> {
        self.collector().spawn(self.config.gc_interval(), cancel)
    }
}

fn log_outcome(command: &Command, outcome: &Outcome) {
    match outcome {
        Outcome::Added(rule) => tracing::debug!(rule = %rule, "[RlvEngine] Rule added"),
        Outcome::Removed(count) | Outcome::Cleared(count) => {
            tracing::debug!(command = %command, removed = count, "[RlvEngine] Rules removed")
        }
        Outcome::Replied { channel } => {
            tracing::trace!(command = %command, channel, "[RlvEngine] Replied")
        }
        Outcome::Executed => tracing::trace!(command = %command, "[RlvEngine] Executed"),
        Outcome::Ignored => tracing::trace!(command = %command, "[RlvEngine] Ignored"),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use uuid::Uuid;

    use super::*;
    use crate::core::{AttachmentPoint, Vector3};
    use crate::rules::ChangeKind;
    use crate::world::{
        MemoryGroups, MemoryOutfit, MemoryWorld, WorldEvent, WornItem, WornKind,
    };

    struct Harness {
        engine: RlvEngine,
        world: Arc<MemoryWorld>,
        outfit: Arc<MemoryOutfit>,
    }

    fn harness(config: RlvConfig) -> Harness {
        let world = Arc::new(MemoryWorld::new());
        let outfit = Arc::new(MemoryOutfit::new());
        let engine = RlvEngine::new(
            config,
            Collaborators::new(world.clone(), outfit.clone(), Arc::new(MemoryGroups::new())),
        )
        .unwrap();
        Harness {
            engine,
            world,
            outfit,
        }
    }

    #[tokio::test]
    async fn test_two_restrictions_in_one_line() {
        let h = harness(RlvConfig::default());
        let x = Uuid::new_v4();

        assert!(h.engine.process_chat("@detach=n,@sendchat=n", x, "Collar").await);

        let rules = h.engine.store().rules_from(&x);
        assert_eq!(rules.len(), 2);
        assert!(rules.iter().all(|r| r.is_unqualified()));
        assert!(h.engine.permissions().is_restricted("sendchat"));
        assert!(h.engine.permissions().is_restricted("detach"));
    }

    #[tokio::test]
    async fn test_ordinary_chat_is_not_a_command() {
        let h = harness(RlvConfig::default());
        assert!(!h.engine.process_chat("hello there", Uuid::new_v4(), "Bob").await);
        assert!(h.engine.process_chat("@nonsense", Uuid::new_v4(), "Bob").await);
        assert!(h.engine.store().is_empty());
    }

    #[tokio::test]
    async fn test_remove_without_prior_rule_keeps_detach_allowed() {
        let h = harness(RlvConfig::default());
        let x = Uuid::new_v4();
        let item = Uuid::new_v4();
        let worn = vec![WornItem {
            item_id: item,
            name: "Collar".into(),
            kind: WornKind::Attached {
                point: AttachmentPoint::Neck,
                object_id: x,
            },
        }];

        h.engine.process_chat("@detach=y", x, "Collar").await;
        assert!(h.engine.store().is_empty());
        assert!(h.engine.permissions().can_detach(&item, &worn, None));

        h.engine.process_chat("@detach=n", x, "Collar").await;
        assert!(!h.engine.permissions().can_detach(&item, &worn, None));
    }

    #[tokio::test]
    async fn test_tpto_three_vs_four_fields() {
        let h = harness(RlvConfig::default());
        let x = Uuid::new_v4();

        h.engine.process_chat("@tpto:128/128/25=force", x, "Hud").await;
        h.engine
            .process_chat("@tpto:Region Name/10/20/30=force", x, "Hud")
            .await;

        assert_eq!(
            h.world.events(),
            vec![
                WorldEvent::TeleportGlobal(Vector3::new(128.0, 128.0, 25.0)),
                WorldEvent::TeleportRegion {
                    region: "Region Name".into(),
                    position: Vector3::new(10.0, 20.0, 30.0),
                    look_at: None,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_bad_command_does_not_stop_the_line() {
        let h = harness(RlvConfig::default());
        let x = Uuid::new_v4();

        h.engine
            .process_chat("@version=abc,tpto:1/x/3=force,sendchat=n,versionnum=42", x, "Hud")
            .await;

        assert!(h.engine.permissions().is_restricted("sendchat"));
        assert_eq!(h.world.chat(), vec![(42, "1230100".to_string())]);
    }

    #[tokio::test]
    async fn test_clear_line() {
        let h = harness(RlvConfig::default());
        let x = Uuid::new_v4();
        let y = Uuid::new_v4();
        h.engine.process_chat("@detach=n,sendchat=n", x, "Collar").await;
        h.engine.process_chat("@detach=n", y, "Cuffs").await;

        let mut rx = h.engine.subscribe();
        assert!(h.engine.process_chat("@clear", x, "Collar").await);
        assert_eq!(h.engine.store().len(), 1);
        let change = rx.recv().await.unwrap();
        assert_eq!(change.kind, ChangeKind::IssuerCleared);
        assert_eq!(change.issuer, Some(x));

        h.engine.process_chat("@sendchat=n,recvchat=n,tploc=n", x, "Collar").await;
        h.engine.process_chat("@clear=chat", x, "Collar").await;
        assert_eq!(h.engine.store().rules_from(&x).len(), 1);
    }

    #[tokio::test]
    async fn test_clear_fragment_matches_literal_text() {
        let h = harness(RlvConfig::default());
        let x = Uuid::new_v4();
        h.engine
            .process_chat("@sendchat=n,unsit=n,detach=n,tploc=n", x, "Collar")
            .await;

        h.engine.process_chat("@clear=add", x, "Collar").await;
        h.engine.process_chat("@clear=rem", x, "Collar").await;
        assert_eq!(h.engine.store().rules_from(&x).len(), 4);

        h.engine.process_chat("@addoutfit=n,addattach=n", x, "Collar").await;
        h.engine.process_chat("@clear=add", x, "Collar").await;
        let mut left: Vec<_> = h
            .engine
            .store()
            .rules_from(&x)
            .into_iter()
            .map(|r| r.behaviour)
            .collect();
        left.sort();
        assert_eq!(left, vec!["detach", "sendchat", "tploc", "unsit"]);
    }

    #[tokio::test]
    async fn test_disabled_engine_ignores_lines() {
        let h = harness(RlvConfig::default().with_enabled(false));
        let mut rx = h.engine.subscribe();
        let x = Uuid::new_v4();

        assert!(!h.engine.process_chat("@detach=n", x, "Collar").await);
        assert!(h.engine.store().is_empty());

        h.engine.set_enabled(true);
        h.engine.set_enabled(true);
        assert_eq!(rx.recv().await.unwrap().kind, ChangeKind::EnabledChanged);
        assert!(rx.try_recv().is_err());

        assert!(h.engine.process_chat("@detach=n", x, "Collar").await);
        assert_eq!(h.engine.store().len(), 1);
    }

    #[tokio::test]
    async fn test_disabling_lifts_restrictions_until_reenabled() {
        let h = harness(RlvConfig::default());
        let x = Uuid::new_v4();
        let friend = Uuid::new_v4();
        h.engine.process_chat("@sendchat=n,accepttp=n", x, "Collar").await;
        assert!(!h.engine.permissions().chat_allowed(0));
        assert!(h.engine.permissions().auto_accept_teleport(&friend));

        h.engine.set_enabled(false);
        assert!(h.engine.permissions().chat_allowed(0));
        assert!(!h.engine.permissions().auto_accept_teleport(&friend));
        assert!(h.engine.collector().sweep().await.is_empty());
        assert_eq!(h.engine.store().len(), 2);

        h.engine.set_enabled(true);
        assert!(!h.engine.permissions().chat_allowed(0));
    }

    #[tokio::test]
    async fn test_change_notifications_carry_rule() {
        let h = harness(RlvConfig::default());
        let mut rx = h.engine.subscribe();
        let x = Uuid::new_v4();

        h.engine.process_chat("@sendchannel:7=add", x, "Collar").await;
        h.engine.process_chat("@sendchannel:7=rem", x, "Collar").await;

        let added = rx.recv().await.unwrap();
        assert_eq!(added.kind, ChangeKind::Added);
        assert_eq!(added.rule.unwrap().option, "7");
        let removed = rx.recv().await.unwrap();
        assert_eq!(removed.kind, ChangeKind::Removed);
    }

    #[tokio::test]
    async fn test_cancel_drops_rest_of_line() {
        let h = harness(RlvConfig::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let recognised = h
            .engine
            .process_chat_with_cancel("@detach=n,sendchat=n", Uuid::new_v4(), "Collar", &cancel)
            .await;
        assert!(recognised);
        assert!(h.engine.store().is_empty());
    }

    #[tokio::test]
    async fn test_collector_clears_departed_issuer() {
        let h = harness(RlvConfig::default().with_gc_interval(1));
        let gone = Uuid::new_v4();
        h.engine.process_chat("@detach=n", gone, "Old collar").await;

        assert_eq!(h.engine.collector().sweep().await, vec![gone]);
        assert!(h.engine.store().is_empty());
        assert!(h.outfit.events().is_empty());
        assert_eq!(h.engine.config().gc_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let world = Arc::new(MemoryWorld::new());
        let result = RlvEngine::new(
            RlvConfig::default().with_gc_interval(0),
            Collaborators::new(
                world,
                Arc::new(MemoryOutfit::new()),
                Arc::new(MemoryGroups::new()),
            ),
        );
        assert!(matches!(result, Err(RlvError::InvalidConfig(_))));
    }
}
