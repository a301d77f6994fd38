//! External collaborators
//!
//! - `WorldSession` - chat replies, object presence, teleport, sit/stand
//! - `Outfit` - shared-folder snapshot, worn state, attach/detach
//! - `Groups` - active group and role lookups
//!
//! `memory` provides in-memory implementations that record every effect.

pub mod memory;
mod traits;

pub use memory::{
    GroupEvent, MemoryGroups, MemoryOutfit, MemoryWorld, OutfitEvent, WorldEvent,
};
pub use traits::{
    Collaborators, GroupInfo, Groups, Outfit, OutfitItem, RegionInfo, WorldSession, WornItem,
    WornKind,
};
