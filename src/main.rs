use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use rlv_engine::cli::{Cli, Console};
use rlv_engine::core::ObjectId;
use rlv_engine::inventory::{FolderSpec, InventoryTree};
use rlv_engine::logging;
use rlv_engine::world::{Collaborators, MemoryGroups, MemoryOutfit, MemoryWorld};
use rlv_engine::{RlvConfig, RlvEngine};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

fn load_inventory(path: &Path) -> Result<InventoryTree> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read inventory file {}", path.display()))?;
    let spec: FolderSpec = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse inventory file {}", path.display()))?;
    Ok(InventoryTree::from_spec(&spec))
}

/// Issuers typed as labels get a stable generated id for the session
struct Issuers {
    by_label: HashMap<String, ObjectId>,
}

impl Issuers {
    fn new() -> Self {
        Self {
            by_label: HashMap::new(),
        }
    }

    fn resolve(&mut self, label: &str) -> ObjectId {
        if let Ok(id) = Uuid::parse_str(label) {
            return id;
        }
        *self
            .by_label
            .entry(label.to_string())
            .or_insert_with(Uuid::new_v4)
    }
}

/// Prints everything the collaborators recorded since the last call
struct EffectCursor {
    world: usize,
    outfit: usize,
    groups: usize,
}

impl EffectCursor {
    fn flush(
        &mut self,
        console: &Console,
        world: &MemoryWorld,
        outfit: &MemoryOutfit,
        groups: &MemoryGroups,
    ) {
        let events = world.events();
        for event in events.iter().skip(self.world) {
            console.print_world_event(event);
        }
        self.world = events.len();

        let events = outfit.events();
        for event in events.iter().skip(self.outfit) {
            console.print_outfit_event(event);
        }
        self.outfit = events.len();

        let events = groups.events();
        for event in events.iter().skip(self.groups) {
            console.print_group_event(event);
        }
        self.groups = events.len();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keeps the file writer flushing until exit
    let _log_guard = if cli.log_file {
        Some(logging::init_logging()?)
    } else {
        logging::init_console_logging()?;
        None
    };

    let config = match &cli.config {
        Some(path) => RlvConfig::from_file(path)?,
        None => RlvConfig::new(),
    };

    let world = Arc::new(MemoryWorld::new());
    let outfit = Arc::new(match &cli.inventory {
        Some(path) => {
            let tree = load_inventory(path)?;
            let root = tree.name(tree.root());
            if !root.eq_ignore_ascii_case(&config.shared_folder) {
                tracing::warn!(
                    root,
                    shared_folder = %config.shared_folder,
                    "[Console] Inventory root does not match the shared folder name"
                );
            }
            MemoryOutfit::with_tree(tree)
        }
        None => MemoryOutfit::new(),
    });
    let groups = Arc::new(MemoryGroups::new());
    let collaborators = Collaborators::new(world.clone(), outfit.clone(), groups.clone());

    let engine = RlvEngine::new(config, collaborators)?;
    let mut changes = engine.subscribe();

    let cancel = CancellationToken::new();
    let collector = engine.start_collector(cancel.clone());

    tracing::info!("=== RLV console starting ===");

    let console = Console::new();
    console.print_banner();

    let mut issuers = Issuers::new();
    let mut cursor = EffectCursor {
        world: 0,
        outfit: 0,
        groups: 0,
    };

    while let Some(line) = console.read_input()? {
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('/') {
            let mut words = command.split_whitespace();
            match (words.next(), words.next()) {
                (Some("quit"), _) => break,
                (Some("status"), _) => console.print_rules(&engine.store().rules()),
                (Some("gone"), Some(label)) => {
                    world.set_present(issuers.resolve(label), false);
                    console.print_system(&format!("{} left the region", label));
                }
                (Some("sweep"), _) => {
                    let cleared = engine.collector().sweep().await;
                    console.print_system(&format!("Cleared {} issuer(s)", cleared.len()));
                }
                (Some("enable"), _) => engine.set_enabled(true),
                (Some("disable"), _) => engine.set_enabled(false),
                _ => console.print_error(&format!("Unknown console command: {}", line)),
            }
        } else {
            let (label, text) = line.split_once(' ').unwrap_or((line.as_str(), ""));
            let issuer = issuers.resolve(label);
            world.set_present(issuer, true);
            if !engine.process_chat(text, issuer, label).await {
                console.print_chat(label, text);
            }
        }

        cursor.flush(&console, &world, &outfit, &groups);
        while let Ok(change) = changes.try_recv() {
            console.print_change(&change);
        }
    }

    cancel.cancel();
    if let Err(e) = collector.await {
        console.print_error(&format!("Collector task failed: {}", e));
    }
    tracing::info!("=== RLV console stopped ===");
    Ok(())
}
