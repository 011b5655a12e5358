//! Serve command - runs the HTTP server.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Args;
use passport_server::Server;
use passport_session::ManagerConfig;
use tracing::{debug, info};

use crate::config::PassportConfig;

/// Arguments for the serve command.
///
/// CLI arguments override config file values.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "PASSPORT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind to (overrides config)
    #[arg(short, long)]
    pub bind: Option<SocketAddr>,
}

/// Run the serve command.
pub async fn run(args: ServeArgs) -> Result<()> {
    let (config, session_value) = match &args.config {
        Some(path) => {
            let config = PassportConfig::load(path)?;
            let session = config.session_value()?;
            (config, session)
        }
        None => (
            PassportConfig::default(),
            serde_json::to_value(ManagerConfig::default())?,
        ),
    };

    let sessions = passport_session::init_default_manager(session_value)
        .context("invalid [session] configuration")?
        .ok_or_else(|| anyhow!("[session] table is empty; sessions are disabled"))?;

    passport_session::set_pre_release(|session| {
        debug!(session_id = %session.id(), "Releasing session");
    });

    let session_config = sessions.config();
    info!(
        store = %session_config.store_type,
        cookie = %session_config.cookie_name,
        idle_secs = session_config.idle_time,
        "Session manager ready"
    );

    let server = Server::new(config.server_config(args.bind), sessions.clone());

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }

    sessions.destroy();
    Ok(())
}
