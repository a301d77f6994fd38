use colored::*;
use std::io::{self, Write};

use crate::rules::{ChangeKind, Rule, RuleChange};
use crate::world::{GroupEvent, OutfitEvent, WorldEvent};

/// Console handles all terminal I/O for the harness with colored formatting
pub struct Console {
    issuer_color: Color,
    reply_color: Color,
    effect_color: Color,
}

impl Console {
    /// Create a new Console with default colors
    pub fn new() -> Self {
        Self {
            issuer_color: Color::Cyan,
            reply_color: Color::Green,
            effect_color: Color::Magenta,
        }
    }

    /// Print a welcome banner
    pub fn print_banner(&self) {
        println!("{}", "=".repeat(60).bright_blue());
        println!("{}", "  RLV engine console".bright_blue().bold());
        println!("{}", "=".repeat(60).bright_blue());
        println!();
        println!("Each line is `<issuer> <chat text>`; the issuer is a uuid or any label.");
        println!("Commands: /status, /gone <issuer>, /sweep, /enable, /disable, /quit");
        println!();
    }

    /// Read one line; `None` at end of input
    pub fn read_input(&self) -> io::Result<Option<String>> {
        print!("{} ", ">".color(self.issuer_color).bold());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(None);
        }
        Ok(Some(input.trim().to_string()))
    }

    /// Echo a line that was not a command as ordinary chat
    pub fn print_chat(&self, issuer: &str, text: &str) {
        println!("{} {}", format!("{}:", issuer).color(self.issuer_color).bold(), text);
    }

    /// Print an effect on the world session
    pub fn print_world_event(&self, event: &WorldEvent) {
        match event {
            WorldEvent::Chat { channel, text } => println!(
                "{} {}",
                format!("[ch {}]", channel).color(self.reply_color).bold(),
                text.color(self.reply_color)
            ),
            other => self.print_effect("world", &format!("{:?}", other)),
        }
    }

    pub fn print_outfit_event(&self, event: &OutfitEvent) {
        self.print_effect("outfit", &format!("{:?}", event));
    }

    pub fn print_group_event(&self, event: &GroupEvent) {
        self.print_effect("groups", &format!("{:?}", event));
    }

    fn print_effect(&self, source: &str, description: &str) {
        println!(
            "{} {}",
            format!("[{}]", source).color(self.effect_color).bold(),
            description
        );
    }

    /// Print a rule-set change
    pub fn print_change(&self, change: &RuleChange) {
        let label = match change.kind {
            ChangeKind::Added => "+".green().bold(),
            ChangeKind::Removed => "-".red().bold(),
            ChangeKind::IssuerCleared => "x".red().bold(),
            ChangeKind::EnabledChanged => "*".yellow().bold(),
        };
        let detail = match (&change.rule, &change.issuer) {
            (Some(rule), _) => rule.to_string(),
            (None, Some(issuer)) => format!("all rules from {}", issuer),
            (None, None) => "engine toggled".to_string(),
        };
        println!("{} {}", label, detail.bright_black());
    }

    /// Print the active rules
    pub fn print_rules(&self, rules: &[Rule]) {
        println!("{}", "-".repeat(60).bright_black());
        if rules.is_empty() {
            println!("{}", "No active restrictions".bright_black());
        }
        for rule in rules {
            println!(
                "  {} {}",
                rule.status_text().bold(),
                format!("({} {})", rule.issuer_name, rule.issuer).bright_black()
            );
        }
        println!("{}", "-".repeat(60).bright_black());
    }

    /// Print a system message (errors, info, etc.)
    pub fn print_system(&self, message: &str) {
        println!("{} {}", "System:".yellow().bold(), message);
    }

    /// Print an error message
    pub fn print_error(&self, error: &str) {
        eprintln!("{} {}", "Error:".red().bold(), error);
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}
