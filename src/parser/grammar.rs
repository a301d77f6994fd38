//! Chat-line grammar
//!
//! A command line starts with `@` and carries comma-separated commands of the
//! shape `behaviour[:option]=param`. Segments that do not match are dropped.

use regex::Regex;

use super::command::{Command, ParsedLine};
use crate::core::ObjectId;

/// First character of every command line
pub const COMMAND_SENTINEL: char = '@';

/// `@clear` on its own drops every rule of the issuer
pub const CLEAR_KEYWORD: &str = "clear";

/// Canonical param for "add this restriction"
pub const PARAM_ADD: &str = "n";

/// Canonical param for "remove this restriction"
pub const PARAM_REMOVE: &str = "y";

/// Param that arms an action verb
pub const PARAM_FORCE: &str = "force";

const ADD_SYNONYM: &str = "add";
const REMOVE_SYNONYM: &str = "rem";

/// `behaviour` excludes `:` and `=`, `option` excludes `=`, `param` is a bare word
const COMMAND_PATTERN: &str = r"(?i)^(?P<behaviour>[^:=]+)(?::(?P<option>[^=]*))?=(?P<param>\w+)$";

/// Parser for command lines
#[derive(Debug, Clone)]
pub struct CommandParser {
    pattern: Regex,
}

impl CommandParser {
    /// Compile the command grammar
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(COMMAND_PATTERN)?,
        })
    }

    /// Whether a chat line is addressed to the engine at all
    pub fn is_command_line(text: &str) -> bool {
        text.trim_start().starts_with(COMMAND_SENTINEL)
    }

    /// Parse one chat line
    ///
    /// Returns `None` when the line is ordinary chat. Commands keep their
    /// source order since later ones may supersede earlier ones.
    pub fn parse(&self, text: &str, issuer: ObjectId, issuer_name: &str) -> Option<ParsedLine> {
        let body = text.trim().strip_prefix(COMMAND_SENTINEL)?;

        if body.trim().eq_ignore_ascii_case(CLEAR_KEYWORD) {
            return Some(ParsedLine::Clear);
        }

        let commands = body
            .split(',')
            .filter_map(|segment| self.parse_segment(segment, issuer, issuer_name))
            .collect();

        Some(ParsedLine::Commands(commands))
    }

    /// Parse a single comma-separated segment
    pub fn parse_segment(
        &self,
        segment: &str,
        issuer: ObjectId,
        issuer_name: &str,
    ) -> Option<Command> {
        let segment = segment.trim();
        let segment = segment.strip_prefix(COMMAND_SENTINEL).unwrap_or(segment);

        let Some(caps) = self.pattern.captures(segment) else {
            tracing::trace!(segment, "Dropping segment that does not match the command grammar");
            return None;
        };

        let behaviour = caps.name("behaviour")?.as_str().trim().to_lowercase();
        if behaviour.is_empty() {
            return None;
        }
        let option = caps
            .name("option")
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();
        // `clear` takes a behaviour fragment, never a toggle
        let raw_param = caps.name("param")?.as_str();
        let param = if behaviour == CLEAR_KEYWORD {
            raw_param.to_lowercase()
        } else {
            normalize_param(raw_param)
        };

        Some(Command {
            behaviour,
            option,
            param,
            issuer,
            issuer_name: issuer_name.to_string(),
        })
    }
}

/// Lower-case the param and fold the add/remove synonyms
pub fn normalize_param(raw: &str) -> String {
    let param = raw.to_lowercase();
    match param.as_str() {
        ADD_SYNONYM => PARAM_ADD.to_string(),
        REMOVE_SYNONYM => PARAM_REMOVE.to_string(),
        _ => param,
    }
}
