//! `relay`: check delegation manifests
//!
//! Loads a TOML manifest of classes and delegation declarations, applies them
//! with the delegation engine and prints the generated forwarders.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use relay_cli::commands::{check, reserved};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "relay")]
#[command(about = "Delegation generator for the relay object runtime", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Color output: auto, always, never
    #[arg(long, global = true)]
    color: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a manifest and list the generated forwarders
    Check {
        /// Manifest file
        manifest: PathBuf,
    },

    /// List reserved receiver names
    Reserved {
        /// Additional reserved names
        #[arg(long = "with")]
        extra: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let color = cli.color.as_deref();
    match cli.command {
        Commands::Check { manifest } => check::execute(&manifest, color),
        Commands::Reserved { extra } => reserved::execute(&extra, color),
    }
}
