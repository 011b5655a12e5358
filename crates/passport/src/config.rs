//! On-disk configuration for the `passport` binary.
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:8080"
//! request_logging = true
//!
//! [session]
//! cookie_name = "passport_sid"
//! idle_time = 3600
//! store_type = "memory"
//! store_config = { max_keys = 64 }
//! ```

use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;

use anyhow::{Context, Result, bail};
use passport_server::{DEFAULT_PORT, ServerConfig};
use passport_session::ManagerConfig;
use serde::Deserialize;
use serde_json::Value;

/// Top-level configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PassportConfig {
    #[serde(default)]
    pub server: ServerSection,

    /// Session options, passed through to the session layer untyped.
    pub session: Option<toml::Table>,
}

/// `[server]` table.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    pub bind: SocketAddr,
    pub request_logging: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            request_logging: true,
        }
    }
}

impl PassportConfig {
    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Parse configuration from TOML text.
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Server settings, with an optional bind address override.
    pub fn server_config(&self, bind: Option<SocketAddr>) -> ServerConfig {
        ServerConfig::new()
            .with_bind_address(bind.unwrap_or(self.server.bind))
            .with_request_logging(self.server.request_logging)
    }

    /// The `[session]` table as the JSON blob the session layer consumes.
    pub fn session_value(&self) -> Result<Value> {
        let Some(table) = &self.session else {
            bail!("missing [session] table; the server requires sessions");
        };
        Ok(serde_json::to_value(table)?)
    }

    /// The `[session]` table parsed into a manager configuration.
    pub fn session_config(&self) -> Result<ManagerConfig> {
        match ManagerConfig::from_value(self.session_value()?)? {
            Some(config) => Ok(config),
            None => bail!("[session] table is empty; sessions are disabled"),
        }
    }
}
