//! offergen: ODRL offer template tool
//!
//! Usage:
//!   offergen new                              → export a fresh offer
//!   offergen normalize offer.jsonld           → load and re-export, pruned
//!   offergen edit offer.jsonld --actions a.json
//!   offergen inspect offer.jsonld             → full template view
//!   offergen operands                         → constraint operand list
//!   offergen config                           → effective configuration

use clap::{Parser, Subcommand};
use offergen::commands;
use offergen_core::TemplateConfig;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "offergen",
    about = "Build and edit ODRL offers",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a fresh default offer
    New,
    /// Load a JSON-LD offer and print it pruned, under temporary ids
    Normalize {
        /// JSON-LD document
        document: PathBuf,
    },
    /// Load a JSON-LD offer, apply edit actions and print the result
    Edit {
        /// JSON-LD document
        document: PathBuf,
        /// JSON array of actions
        #[arg(short, long)]
        actions: PathBuf,
    },
    /// Load a JSON-LD offer and print every node with its field schema
    Inspect {
        /// JSON-LD document
        document: PathBuf,
    },
    /// List the recognised constraint operands
    Operands,
    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => TemplateConfig::load(path),
        None => TemplateConfig::default(),
    };

    let output = match cli.command {
        Commands::New => commands::new_offer(config)?,
        Commands::Normalize { document } => {
            let document = commands::read_json(&document)?;
            commands::normalize(&document, config).await?
        }
        Commands::Edit { document, actions } => {
            let document = commands::read_json(&document)?;
            let actions = commands::read_actions(&actions)?;
            commands::edit(&document, &actions, config).await?
        }
        Commands::Inspect { document } => {
            let document = commands::read_json(&document)?;
            commands::inspect(&document, config).await?
        }
        Commands::Operands => commands::operands()?,
        Commands::Config => {
            print!("{}", config.to_toml());
            return Ok(());
        }
    };

    println!("{}", commands::render(&output, cli.pretty)?);
    Ok(())
}

// Logs go to stderr; stdout carries the JSON output.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "offergen=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
