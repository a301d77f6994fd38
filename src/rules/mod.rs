//! Active restriction rules
//!
//! - `Rule` - one restriction attributed to an issuer
//! - `RuleStore` - the lock-guarded collection with add/remove/query semantics
//! - `RuleChange` - broadcast notification raised whenever the set changes
//!
//! ```rust,ignore
//! let store = RuleStore::new();
//! store.add(Rule::new("sendchat", "", collar_id, "Collar"));
//! assert!(store.is_restricted("sendchat"));
//! store.remove_matching("sendchat", &collar_id, "");
//! ```

mod change;
mod rule;
mod store;

pub use change::{
    create_change_channel, notify, ChangeKind, ChangeReceiver, ChangeSender, RuleChange,
    CHANGE_CHANNEL_SIZE,
};
pub use rule::Rule;
pub use store::RuleStore;
