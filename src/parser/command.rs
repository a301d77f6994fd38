//! Parsed command types

use crate::core::ObjectId;
use crate::rules::Rule;

use super::grammar::{PARAM_ADD, PARAM_FORCE, PARAM_REMOVE};

/// One `behaviour[:option]=param` command from a chat line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Lower-cased verb name
    pub behaviour: String,
    /// Qualifier, trimmed, case preserved
    pub option: String,
    /// Lower-cased param with add/remove synonyms folded
    pub param: String,
    /// Object that sent the line
    pub issuer: ObjectId,
    /// Display name of the issuer
    pub issuer_name: String,
}

/// What a command's param asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind<'a> {
    /// Add the restriction
    Add,
    /// Remove the restriction
    Remove,
    /// Execute the action verb
    Force,
    /// Any other value (usually a reply channel)
    Value(&'a str),
}

impl Command {
    /// Classify the param
    pub fn kind(&self) -> CommandKind<'_> {
        match self.param.as_str() {
            PARAM_ADD => CommandKind::Add,
            PARAM_REMOVE => CommandKind::Remove,
            PARAM_FORCE => CommandKind::Force,
            other => CommandKind::Value(other),
        }
    }

    /// Whether the param is one of the restriction toggles
    pub fn is_toggle(&self) -> bool {
        matches!(self.kind(), CommandKind::Add | CommandKind::Remove)
    }

    /// Build the rule this command adds or removes
    pub fn to_rule(&self) -> Rule {
        Rule::new(
            &self.behaviour,
            &self.option,
            self.issuer,
            &self.issuer_name,
        )
    }

    /// Canonical `behaviour[:option]=param` text
    pub fn canonical(&self) -> String {
        if self.option.is_empty() {
            format!("{}={}", self.behaviour, self.param)
        } else {
            format!("{}:{}={}", self.behaviour, self.option, self.param)
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.canonical())
    }
}

/// Result of parsing a command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// `@clear`: drop every rule of the issuer
    Clear,
    /// Commands in source order (possibly empty if nothing matched)
    Commands(Vec<Command>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn command(param: &str) -> Command {
        Command {
            behaviour: "detach".into(),
            option: "".into(),
            param: param.into(),
            issuer: Uuid::nil(),
            issuer_name: "collar".into(),
        }
    }

    #[test]
    fn test_kind() {
        assert_eq!(command("n").kind(), CommandKind::Add);
        assert_eq!(command("y").kind(), CommandKind::Remove);
        assert_eq!(command("force").kind(), CommandKind::Force);
        assert_eq!(command("2222").kind(), CommandKind::Value("2222"));
        assert!(command("n").is_toggle());
        assert!(!command("force").is_toggle());
    }

    #[test]
    fn test_display() {
        let mut cmd = command("n");
        assert_eq!(cmd.to_string(), "@detach=n");
        cmd.option = "spine".into();
        assert_eq!(cmd.to_string(), "@detach:spine=n");
    }
}
