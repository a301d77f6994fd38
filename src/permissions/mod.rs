//! Permission queries for the rest of the client
//!
//! A thin façade over the rule store answering questions such as "may this
//! attachment be taken off", "which chat volume is used", or "is this
//! teleport offer accepted automatically".
//!
//! ## Example
//!
//! ```rust,ignore
//! let query = PermissionQuery::new(store.clone());
//!
//! if !query.chat_allowed(0) {
//!     // swallow the message
//! }
//! let volume = query.effective_chat_type(ChatType::Shout);
//! ```

mod query;

pub use query::{behaviour, PermissionQuery};
