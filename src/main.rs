//! action-router binary.
//!
//! ```text
//!   HTTP request ──▶ trigger server ──▶ merged handler ──▶ dispatcher ──▶ action runner
//!                    (one per port)     (method + path)    (conditions)   (registry)
//! ```
//!
//! `serve` runs every configured trigger until Ctrl+C/SIGTERM.
//! `check` validates the config and prints the routing table as JSON.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use action_router::config::load_config;
use action_router::lifecycle;
use action_router::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "action-router")]
#[command(about = "HTTP trigger that dispatches requests to actions by condition", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config/action-router.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all triggers
    Serve,
    /// Validate the config and print the routing table
    Check,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    logging::init_logging(&config.observability)?;
    tracing::info!(
        config = %cli.config.display(),
        triggers = config.triggers.len(),
        actions = config.actions.len(),
        "action-router v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Check => {
            let table = lifecycle::routing_table(&config)?;
            println!("{}", serde_json::to_string_pretty(&table)?);
        }
        Commands::Serve => {
            if config.observability.metrics_enabled {
                let addr: SocketAddr = config.observability.metrics_address.parse()?;
                metrics::init_metrics(addr)?;
            }
            lifecycle::run(config).await?;
        }
    }
    Ok(())
}
