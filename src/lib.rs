pub mod core;
pub mod parser;
pub mod rules;
pub mod inventory;
pub mod permissions;
pub mod world;
pub mod dispatch;
pub mod collector;
pub mod engine;

// Optional components
pub mod cli;
pub mod logging;

pub use crate::core::{RlvError, RlvResult};
pub use collector::StaleRuleCollector;
pub use engine::{RlvConfig, RlvEngine};
pub use permissions::PermissionQuery;
pub use rules::{Rule, RuleChange, RuleStore};
