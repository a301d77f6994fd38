//! Restriction rule type

use serde::{Deserialize, Serialize};

use crate::core::ObjectId;

/// An active restriction attributed to the object that issued it
///
/// Identity is `(behaviour, issuer, option)`; `issuer_name` is only a label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    /// Lower-cased verb name (e.g. `detach`, `sendchat`)
    pub behaviour: String,
    /// Qualifier; empty means the rule applies to the whole behaviour
    pub option: String,
    /// Object or avatar that issued the rule
    pub issuer: ObjectId,
    /// Display label of the issuer
    pub issuer_name: String,
}

impl Rule {
    /// Create a rule
    pub fn new(
        behaviour: impl Into<String>,
        option: impl Into<String>,
        issuer: ObjectId,
        issuer_name: impl Into<String>,
    ) -> Self {
        Self {
            behaviour: behaviour.into(),
            option: option.into(),
            issuer,
            issuer_name: issuer_name.into(),
        }
    }

    /// Whether the rule has no option
    pub fn is_unqualified(&self) -> bool {
        self.option.is_empty()
    }

    /// Whether this rule has the same identity as the given key
    pub fn same_key(&self, behaviour: &str, issuer: &ObjectId, option: &str) -> bool {
        self.behaviour == behaviour && &self.issuer == issuer && self.option == option
    }

    /// Status text as reported by `@getstatus`: `behaviour[:option]`
    pub fn status_text(&self) -> String {
        if self.option.is_empty() {
            self.behaviour.clone()
        } else {
            format!("{}:{}", self.behaviour, self.option)
        }
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.same_key(&other.behaviour, &other.issuer, &other.option)
    }
}

impl Eq for Rule {}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.status_text(), self.issuer_name)
    }
}
