//! Core types for the engine
//!
//! This module provides the fundamental types used throughout the crate:
//! - `RlvError` - Error types
//! - `ObjectId`, `ChatType`, `Vector3` - Shared values
//! - `AttachmentPoint` / `WearableType` - Named outfit slots

pub mod error;
pub mod types;

pub use error::{RlvError, RlvResult};
pub use types::{AttachmentPoint, ChatType, ObjectId, Vector3, WearableType};
