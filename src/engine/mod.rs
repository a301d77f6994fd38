//! Engine entry point and configuration
//!
//! ```rust,ignore
//! let engine = RlvEngine::new(RlvConfig::default(), collaborators)?;
//! let cancel = CancellationToken::new();
//! engine.start_collector(cancel.clone());
//!
//! if !engine.process_chat("@sendchat=n", collar_id, "Collar").await {
//!     // not a command line, show it as chat
//! }
//! ```

mod config;
mod engine;

pub use config::RlvConfig;
pub use engine::RlvEngine;
