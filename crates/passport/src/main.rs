//! Passport - user registration and cookie session server
//!
//! Main entry point for the Passport CLI.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;

use commands::{check_config, serve};

/// Passport - user registration and cookie session server
#[derive(Parser)]
#[command(name = "passport")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve(serve::ServeArgs),

    /// Validate a configuration file and exit
    CheckConfig(check_config::CheckConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "passport=debug,passport_server=debug,passport_session=debug,tower_http=debug,info"
    } else {
        "passport=info,passport_server=info,passport_session=info,warn"
    };

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
                ),
        )
        .init();

    match cli.command {
        Commands::Serve(args) => serve::run(args).await,
        Commands::CheckConfig(args) => check_config::run(args),
    }
}
