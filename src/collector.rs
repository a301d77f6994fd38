//! Stale-rule collector
//!
//! Periodically drops the rules of issuers that have left the simulation.
//! Presence that cannot be determined keeps the issuer's rules. Nothing is
//! swept while the enabled flag is off.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::core::ObjectId;
use crate::rules::{notify, ChangeSender, RuleChange, RuleStore};
use crate::world::WorldSession;

/// Sweeps the rule store for issuers that no longer exist
#[derive(Clone)]
pub struct StaleRuleCollector {
    store: Arc<RuleStore>,
    world: Arc<dyn WorldSession>,
    changes: ChangeSender,
    enabled: Arc<AtomicBool>,
}

impl StaleRuleCollector {
    pub fn new(store: Arc<RuleStore>, world: Arc<dyn WorldSession>, changes: ChangeSender) -> Self {
        Self {
            store,
            world,
            changes,
            enabled: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Skip sweeps while `enabled` is off
    pub fn with_enabled_flag(mut self, enabled: Arc<AtomicBool>) -> Self {
        self.enabled = enabled;
        self
    }

    /// Run one sweep and return the issuers whose rules were cleared
    ///
    /// Issuers are snapshotted first, so the store lock is never held across
    /// the presence lookups.
    pub async fn sweep(&self) -> Vec<ObjectId> {
        if !self.enabled.load(Ordering::SeqCst) {
            tracing::debug!("[Collector] Disabled, skipping sweep");
            return Vec::new();
        }
        let issuers = self.store.issuers();
        if issuers.is_empty() {
            return Vec::new();
        }

        let presence = join_all(issuers.iter().map(|id| self.world.object_exists(*id))).await;

        let mut cleared = Vec::new();
        for (issuer, present) in issuers.into_iter().zip(presence) {
            match present {
                Some(false) => {
                    let removed = self.store.clear_issuer(&issuer);
                    if removed > 0 {
                        tracing::info!(
                            issuer = %issuer,
                            removed,
                            "[Collector] Issuer gone, rules cleared"
                        );
                        notify(&self.changes, RuleChange::issuer_cleared(issuer));
                        cleared.push(issuer);
                    }
                }
                Some(true) => {}
                None => {
                    tracing::debug!(issuer = %issuer, "[Collector] Presence unknown, keeping rules");
                }
            }
        }
        cleared
    }

    /// Sweep every `period` until `cancel` fires
    ///
    /// The first sweep happens one full period after spawning.
    pub fn spawn(self, period: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            tracing::info!(period_secs = period.as_secs(), "[Collector] Started");

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {
                        let cleared = self.sweep().await;
                        tracing::debug!(
                            cleared = cleared.len(),
                            remaining = self.store.len(),
                            "[Collector] Sweep complete"
                        );
                    }
                }
            }

            tracing::info!("[Collector] Stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{create_change_channel, ChangeKind, Rule};
    use crate::world::MemoryWorld;
    use uuid::Uuid;

    fn setup() -> (StaleRuleCollector, Arc<RuleStore>, Arc<MemoryWorld>, ChangeSender) {
        let store = Arc::new(RuleStore::new());
        let world = Arc::new(MemoryWorld::new());
        let changes = create_change_channel();
        let collector = StaleRuleCollector::new(store.clone(), world.clone(), changes.clone());
        (collector, store, world, changes)
    }

    #[tokio::test]
    async fn test_absent_issuer_cleared_once_per_sweep() {
        let (collector, store, world, changes) = setup();
        let mut rx = changes.subscribe();
        let gone = Uuid::new_v4();
        let here = Uuid::new_v4();
        world.set_present(here, true);
        for behaviour in ["detach", "sendchat", "tploc"] {
            store.add(Rule::new(behaviour, "", gone, "Old collar"));
        }
        store.add(Rule::new("detach", "", here, "Cuffs"));

        assert_eq!(collector.sweep().await, vec![gone]);
        assert_eq!(store.len(), 1);
        assert!(store.rules_from(&gone).is_empty());

        let change = rx.recv().await.unwrap();
        assert_eq!(change.kind, ChangeKind::IssuerCleared);
        assert_eq!(change.issuer, Some(gone));
        assert!(rx.try_recv().is_err());

        assert!(collector.sweep().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_presence_does_not_evict() {
        let (collector, store, world, _) = setup();
        world.set_presence_available(false);
        store.add(Rule::new("detach", "", Uuid::new_v4(), "Collar"));

        assert!(collector.sweep().await.is_empty());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_store() {
        let (collector, _, world, _) = setup();
        assert!(collector.sweep().await.is_empty());
        assert!(world.events().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_flag_skips_sweep() {
        let (collector, store, _, _) = setup();
        let enabled = Arc::new(AtomicBool::new(false));
        let collector = collector.with_enabled_flag(enabled.clone());
        let gone = Uuid::new_v4();
        store.add(Rule::new("detach", "", gone, "Old collar"));

        assert!(collector.sweep().await.is_empty());
        assert_eq!(store.len(), 1);

        enabled.store(true, Ordering::SeqCst);
        assert_eq!(collector.sweep().await, vec![gone]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_task_sweeps_and_stops() {
        let (collector, store, _, _) = setup();
        store.add(Rule::new("detach", "", Uuid::new_v4(), "Collar"));

        let cancel = CancellationToken::new();
        let handle = collector.spawn(Duration::from_secs(300), cancel.clone());

        tokio::time::sleep(Duration::from_secs(299)).await;
        assert_eq!(store.len(), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(store.is_empty());

        cancel.cancel();
        handle.await.unwrap();
    }
}
