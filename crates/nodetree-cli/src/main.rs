//! nodetree - Node tree with spelled-out titles
//!
//! Works directly on the JSONL store in .nodetree/

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "nodetree")]
#[command(about = "Self-referencing node tree with localized, spelled-out titles")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Language for titles (two-letter code, e.g. "es")
    #[arg(long, global = true, env = "NODETREE_LANG")]
    lang: Option<String>,

    /// IANA timezone for timestamps (e.g. "Europe/Madrid")
    #[arg(long, global = true, env = "NODETREE_TZ")]
    tz: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new nodetree store in the current directory
    Init,

    /// Create a node
    Create {
        /// Parent node ID (omit for a root node)
        #[arg(long)]
        parent: Option<u64>,
    },

    /// List root nodes
    Roots,

    /// List children of a node
    Children {
        /// Parent node ID
        id: u64,

        /// Levels of descendants to include
        #[arg(short, long, allow_negative_numbers = true)]
        depth: Option<i64>,
    },

    /// Delete a node without children
    Delete {
        /// Node ID
        id: u64,
    },

    /// Insert the sample tree
    Seed,

    /// Show or reset configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Reset to default configuration
    Reset,
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let display = commands::Display {
        json: cli.json,
        lang: cli.lang,
        tz: cli.tz,
    };

    match cli.command {
        Commands::Init => commands::init(),
        Commands::Create { parent } => commands::create(parent, &display),
        Commands::Roots => commands::roots(&display),
        Commands::Children { id, depth } => commands::children(id, depth, &display),
        Commands::Delete { id } => commands::delete(id, &display),
        Commands::Seed => commands::seed(&display),
        Commands::Config { command } => match command {
            Some(ConfigCommands::Show) | None => commands::config_show(&display),
            Some(ConfigCommands::Reset) => commands::config_reset(),
        },
    }
}
