//! Rule store implementation
//!
//! One `RwLock<Vec<Rule>>` shared by the chat path and the stale-rule sweep.
//! Queries copy what they need under the lock and compute outside it.

use std::collections::BTreeSet;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::rule::Rule;
use crate::core::ObjectId;

/// The set of currently active restrictions
///
/// Never holds two rules with the same `(behaviour, issuer, option)`.
#[derive(Debug, Default)]
pub struct RuleStore {
    rules: RwLock<Vec<Rule>>,
}

impl RuleStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Rule>> {
        self.rules.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Rule>> {
        self.rules.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a rule, replacing any rule with the same key
    pub fn add(&self, rule: Rule) {
        let mut rules = self.write();
        rules.retain(|r| r != &rule);
        tracing::debug!(
            behaviour = %rule.behaviour,
            option = %rule.option,
            issuer = %rule.issuer,
            "Adding rule"
        );
        rules.push(rule);
    }

    /// Remove rules for `(behaviour, issuer)`
    ///
    /// An empty `option` removes every rule of that behaviour from the issuer
    /// whatever its option; otherwise only the exact match goes.
    /// Returns the number of rules removed.
    pub fn remove_matching(&self, behaviour: &str, issuer: &ObjectId, option: &str) -> usize {
        let mut rules = self.write();
        let before = rules.len();
        rules.retain(|r| {
            let same = r.behaviour == behaviour && &r.issuer == issuer;
            !(same && (option.is_empty() || r.option == option))
        });
        before - rules.len()
    }

    /// Remove every rule from the issuer
    pub fn clear_issuer(&self, issuer: &ObjectId) -> usize {
        let mut rules = self.write();
        let before = rules.len();
        rules.retain(|r| &r.issuer != issuer);
        let removed = before - rules.len();
        if removed > 0 {
            tracing::debug!(issuer = %issuer, removed, "Cleared issuer rules");
        }
        removed
    }

    /// Remove the issuer's rules whose behaviour contains `fragment`
    pub fn clear_issuer_matching(&self, issuer: &ObjectId, fragment: &str) -> usize {
        let mut rules = self.write();
        let before = rules.len();
        rules.retain(|r| !(&r.issuer == issuer && r.behaviour.contains(fragment)));
        before - rules.len()
    }

    /// Remove every rule
    pub fn clear(&self) {
        self.write().clear();
    }

    /// True iff an unqualified rule for the behaviour exists from any issuer
    pub fn is_restricted(&self, behaviour: &str) -> bool {
        self.read()
            .iter()
            .any(|r| r.behaviour == behaviour && r.is_unqualified())
    }

    /// True iff an unqualified rule for the behaviour exists and no rule for
    /// it carries `exception` as its option
    pub fn is_restricted_except(&self, behaviour: &str, exception: &str) -> bool {
        let matching = self.matching(behaviour);
        matching.iter().any(Rule::is_unqualified)
            && !matching.iter().any(|r| r.option == exception)
    }

    /// Whether the exact rule exists
    pub fn contains(&self, behaviour: &str, issuer: &ObjectId, option: &str) -> bool {
        self.read()
            .iter()
            .any(|r| r.same_key(behaviour, issuer, option))
    }

    /// Distinct non-empty options set for a behaviour
    pub fn options_for(&self, behaviour: &str) -> BTreeSet<String> {
        self.read()
            .iter()
            .filter(|r| r.behaviour == behaviour && !r.is_unqualified())
            .map(|r| r.option.clone())
            .collect()
    }

    /// Snapshot of every rule for a behaviour
    pub fn matching(&self, behaviour: &str) -> Vec<Rule> {
        self.read()
            .iter()
            .filter(|r| r.behaviour == behaviour)
            .cloned()
            .collect()
    }

    /// Snapshot of every rule from an issuer
    pub fn rules_from(&self, issuer: &ObjectId) -> Vec<Rule> {
        self.read()
            .iter()
            .filter(|r| &r.issuer == issuer)
            .cloned()
            .collect()
    }

    /// Snapshot of all rules, in insertion order
    pub fn rules(&self) -> Vec<Rule> {
        self.read().clone()
    }

    /// Distinct issuers, in order of first appearance
    pub fn issuers(&self) -> Vec<ObjectId> {
        let rules = self.read();
        let mut issuers: Vec<ObjectId> = Vec::new();
        for rule in rules.iter() {
            if !issuers.contains(&rule.issuer) {
                issuers.push(rule.issuer);
            }
        }
        issuers
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use uuid::Uuid;

    fn rule(behaviour: &str, option: &str, issuer: ObjectId) -> Rule {
        Rule::new(behaviour, option, issuer, "obj")
    }

    #[test]
    fn test_add_is_idempotent() {
        let store = RuleStore::new();
        let x = Uuid::new_v4();

        store.add(rule("detach", "", x));
        store.add(Rule::new("detach", "", x, "renamed"));

        assert_eq!(store.len(), 1);
        assert_eq!(store.rules()[0].issuer_name, "renamed");
    }

    #[test]
    fn test_remove_unqualified_clears_all_options() {
        let store = RuleStore::new();
        let x = Uuid::new_v4();
        let other = Uuid::new_v4();

        store.add(rule("detach", "", x));
        store.add(rule("detach", "spine", x));
        store.add(rule("detach", "skull", x));
        store.add(rule("detach", "spine", other));

        assert_eq!(store.remove_matching("detach", &x, ""), 3);
        assert_eq!(store.len(), 1);
        assert!(store.contains("detach", &other, "spine"));
    }

    #[test]
    fn test_remove_exact_option() {
        let store = RuleStore::new();
        let x = Uuid::new_v4();

        store.add(rule("detach", "", x));
        store.add(rule("detach", "x", x));
        store.add(rule("detach", "y", x));

        assert_eq!(store.remove_matching("detach", &x, "x"), 1);
        assert!(store.contains("detach", &x, ""));
        assert!(store.contains("detach", &x, "y"));
        assert!(!store.contains("detach", &x, "x"));
    }

    #[test]
    fn test_remove_nothing_is_noop() {
        let store = RuleStore::new();
        assert_eq!(store.remove_matching("detach", &Uuid::new_v4(), ""), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_is_restricted_needs_unqualified() {
        let store = RuleStore::new();
        let x = Uuid::new_v4();

        store.add(rule("sendchannel", "5", x));
        assert!(!store.is_restricted("sendchannel"));

        store.add(rule("sendchannel", "", x));
        assert!(store.is_restricted("sendchannel"));
    }

    #[test]
    fn test_is_restricted_except() {
        let store = RuleStore::new();
        let x = Uuid::new_v4();
        let y = Uuid::new_v4();

        store.add(rule("sendchannel", "", x));
        assert!(store.is_restricted_except("sendchannel", "5"));

        // Exception from a different issuer still applies
        store.add(rule("sendchannel", "5", y));
        assert!(!store.is_restricted_except("sendchannel", "5"));
        assert!(store.is_restricted_except("sendchannel", "6"));
        assert!(store.is_restricted("sendchannel"));
    }

    #[test]
    fn test_is_restricted_except_same_issuer() {
        let store = RuleStore::new();
        let x = Uuid::new_v4();

        store.add(rule("sendchannel", "", x));
        store.add(rule("sendchannel", "5", x));
        assert!(!store.is_restricted_except("sendchannel", "5"));
        assert!(store.is_restricted_except("sendchannel", "7"));
    }

    #[test]
    fn test_options_for() {
        let store = RuleStore::new();
        let x = Uuid::new_v4();
        let y = Uuid::new_v4();

        store.add(rule("detachallthis", "Outfits/Red", x));
        store.add(rule("detachallthis", "Outfits/Red", y));
        store.add(rule("detachallthis", "Outfits/Blue", y));
        store.add(rule("detachallthis", "", y));

        let options: Vec<_> = store.options_for("detachallthis").into_iter().collect();
        assert_eq!(options, vec!["Outfits/Blue", "Outfits/Red"]);
    }

    #[test]
    fn test_clear_issuer() {
        let store = RuleStore::new();
        let x = Uuid::new_v4();
        let y = Uuid::new_v4();

        store.add(rule("detach", "", x));
        store.add(rule("sendchat", "", x));
        store.add(rule("sendchat", "", y));

        assert_eq!(store.clear_issuer(&x), 2);
        assert_eq!(store.issuers(), vec![y]);
    }

    #[test]
    fn test_clear_issuer_matching() {
        let store = RuleStore::new();
        let x = Uuid::new_v4();

        store.add(rule("sendchat", "", x));
        store.add(rule("sendchannel", "", x));
        store.add(rule("detach", "", x));

        assert_eq!(store.clear_issuer_matching(&x, "send"), 2);
        assert_eq!(store.len(), 1);
        assert!(store.contains("detach", &x, ""));
    }

    #[test]
    fn test_concurrent_adds() {
        let store = Arc::new(RuleStore::new());
        let x = Uuid::new_v4();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        store.add(rule("detach", "", x));
                        store.add(rule("sendchannel", &i.to_string(), x));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(store.len(), 9);
    }
}
