//! Check-config command - validates a configuration file.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;
use passport_session::{MEMORY_STORE, MemoryStoreConfig, StoreRegistry, cookie};

use crate::config::PassportConfig;

/// Arguments for the check-config command.
#[derive(Args, Debug)]
pub struct CheckConfigArgs {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    pub config: PathBuf,
}

/// Run the check-config command.
pub fn run(args: CheckConfigArgs) -> Result<()> {
    let config = PassportConfig::load(&args.config)?;
    let session = config.session_config()?;
    cookie::validate_attributes(&session.cookie_name, &session.domain)?;

    if !StoreRegistry::global().contains(&session.store_type) {
        bail!("unknown session store type: {}", session.store_type);
    }
    if session.store_type == MEMORY_STORE {
        MemoryStoreConfig::from_value(&session.store_config)?;
    }

    let server = config.server_config(None);
    println!("Configuration OK");
    println!("  bind:         {}", server.bind_address);
    println!("  store:        {}", session.store_type);
    println!("  cookie:       {}", session.cookie_name);
    println!("  idle timeout: {}s", session.idle_time);

    Ok(())
}
