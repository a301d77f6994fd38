//! Command dispatch
//!
//! - `BehaviourTable` - behaviour name to query/action handler
//! - `Dispatcher` - executes one parsed command against the store and collaborators
//! - `args` - channel, coordinate and id parsing
//!
//! Restriction toggles (`=n` / `=y`) are handled before the table is consulted,
//! so any behaviour name can be restricted, including ones the table maps.

mod actions;
pub mod args;
mod dispatcher;
mod queries;
mod table;

pub use actions::{point_from_item_name, ADD_OVER_PREFIX};
pub use args::{parse_channel, parse_teleport, TeleportTarget};
pub use dispatcher::{Dispatcher, Outcome};
pub use queries::{LIST_SEPARATOR, NO_GROUP, STATUS_SEPARATOR};
pub use table::{ActionVerb, AttachMode, BehaviourTable, Handler, QueryVerb};
