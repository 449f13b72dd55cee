//! dummypay provider
//!
//! Serves accounts, balances and payments from JSON files in a local
//! directory. Used for demos and end-to-end tests of the sync engine.
//!
//! Connector config:
//! ```json
//! { "directory": "/var/lib/dummypay" }
//! ```

pub mod client;
mod plugin;

use std::path::PathBuf;

use serde::Deserialize;

pub use client::Client;
pub use plugin::DummyPayPlugin;

use crate::plugin::{Capabilities, Capability, Plugin};
use crate::registry::PluginContext;
use crate::{ConnectorError, Result};

pub const PROVIDER: &str = "dummypay";
pub const DEFAULT_PAGE_SIZE: usize = 25;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub directory: PathBuf,
}

impl Config {
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        let config: Config = serde_json::from_value(value.clone())
            .map_err(|e| ConnectorError::InvalidConfig(format!("dummypay: {}", e)))?;
        if config.directory.as_os_str().is_empty() {
            return Err(ConnectorError::InvalidConfig(
                "dummypay: directory must not be empty".into(),
            ));
        }
        if config.directory.exists() && !config.directory.is_dir() {
            return Err(ConnectorError::InvalidConfig(format!(
                "dummypay: {} is not a directory",
                config.directory.display()
            )));
        }
        Ok(config)
    }
}

pub fn capabilities() -> Capabilities {
    [
        Capability::FetchAccounts,
        Capability::FetchBalances,
        Capability::FetchExternalAccounts,
        Capability::FetchPayments,
        Capability::CreateTransfer,
        Capability::CreatePayout,
    ]
    .into_iter()
    .collect()
}

/// Build a dummypay plugin from its connector config
pub fn construct(ctx: PluginContext<'_>) -> Result<Box<dyn Plugin>> {
    let config = Config::from_value(ctx.config)?;
    log::debug!(
        "{}: dummypay reading from {}",
        ctx.connector_name,
        config.directory.display()
    );
    Ok(Box::new(DummyPayPlugin::new(
        ctx.connector_name,
        Client::new(config.directory),
    )))
}
