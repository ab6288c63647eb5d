//! Dungeon Master assistant command-line front-end.
//!
//! ```bash
//! dm-assist map --width 30 --height 20 --theme cave --monsters 3 --level 5 --png map.png
//! dm-assist combat --state fight.json
//! ```
//!
//! Logging goes to stderr; set `RUST_LOG=debug` for generator details.

mod tracker;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dm_core::{AssistantConfig, DmSession, EntityType, PlacementRequest, Theme};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dm-assist", version, about = "Dungeon Master assistant")]
struct Cli {
    /// JSON configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON entity catalog (overrides the configuration).
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Seed for reproducible maps, placements and initiative rolls.
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a map and optionally place an encounter on it.
    Map(MapArgs),
    /// Run the interactive combat tracker.
    Combat {
        /// Combat save to load instead of resuming the last one.
        #[arg(long)]
        state: Option<PathBuf>,
    },
}

#[derive(Args)]
struct MapArgs {
    #[arg(long, default_value_t = 30)]
    width: usize,

    #[arg(long, default_value_t = 20)]
    height: usize,

    /// Dungeon, Cave, Castle or Forest.
    #[arg(long, default_value = "dungeon")]
    theme: Theme,

    #[arg(long, default_value_t = 1)]
    level: u32,

    #[arg(long, default_value_t = 0)]
    monsters: usize,

    #[arg(long, default_value_t = 0)]
    magic_items: usize,

    #[arg(long, default_value_t = 0)]
    armor: usize,

    #[arg(long, default_value_t = 0)]
    weapons: usize,

    /// Write the map as a PNG image.
    #[arg(long)]
    png: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AssistantConfig::load_json(path)
            .await
            .with_context(|| format!("reading config {}", path.display()))?,
        None => AssistantConfig::new(),
    }
    .apply_env()?;
    if let Some(catalog) = &cli.catalog {
        config = config.with_catalog_path(catalog);
    }

    let session = match cli.seed {
        Some(seed) => DmSession::with_seed(config, seed).await?,
        None => DmSession::new(config).await?,
    };

    match cli.command {
        Command::Map(args) => run_map(session, args),
        Command::Combat { state } => tracker::run(session, state).await,
    }
}

fn run_map(mut session: DmSession, args: MapArgs) -> Result<()> {
    let map = session.generate_map(args.width, args.height, args.theme)?;
    println!("{}", map.describe());

    let request = PlacementRequest::new(args.level)
        .with(EntityType::Monster, args.monsters)
        .with(EntityType::MagicItem, args.magic_items)
        .with(EntityType::Armor, args.armor)
        .with(EntityType::Weapon, args.weapons);
    if request.total() > 0 {
        let outcome = session.place_entities(&request)?;
        println!("{}", outcome.log_text());
        println!();
    }

    if let Some(ascii) = session.render_map_ascii() {
        print!("{ascii}");
    }

    if let Some(path) = &args.png {
        session
            .export_map_png(path)
            .with_context(|| format!("exporting map to {}", path.display()))?;
        println!("\nMap image saved to {}", path.display());
    }

    let combatants = session.combat().combatants();
    if !combatants.is_empty() {
        println!("\nCombatants:");
        for c in combatants {
            println!("  {} (HP: {}, Initiative: {})", c.name, c.hp, c.initiative);
        }
    }
    Ok(())
}
