//! Command grammar and parser
//!
//! Turns a raw chat line into an ordered list of [`Command`]s:
//!
//! ```rust,ignore
//! let parser = CommandParser::new()?;
//! match parser.parse("@detach=n,sendchat=n", issuer, "Collar") {
//!     Some(ParsedLine::Commands(cmds)) => { /* two restriction toggles */ }
//!     Some(ParsedLine::Clear) => { /* drop the issuer's rules */ }
//!     None => { /* ordinary chat */ }
//! }
//! ```

mod command;
mod grammar;

pub use command::{Command, CommandKind, ParsedLine};
pub use grammar::{
    normalize_param, CommandParser, CLEAR_KEYWORD, COMMAND_SENTINEL, PARAM_ADD, PARAM_FORCE,
    PARAM_REMOVE,
};
