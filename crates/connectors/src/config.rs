//! Connector definitions
//!
//! Connectors are declared in a JSON file loaded from (in order of priority):
//! 1. An explicit path given by the caller
//! 2. The file named by the `PAYCONN_CONNECTORS` environment variable
//! 3. `connectors.json` in the payconn config directory

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Connectors filename in the payconn config directory
const CONNECTORS_FILE: &str = "connectors.json";

/// Environment variable naming a connectors file
pub const CONNECTORS_ENV: &str = "PAYCONN_CONNECTORS";

/// Page size used when a definition does not set one
pub const DEFAULT_PAGE_SIZE: usize = 25;

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

/// One configured connector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorDefinition {
    /// Registered provider name, e.g. `dummypay`
    pub provider: String,
    /// Unique connector name, used for cursors and metrics
    pub name: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Provider-specific configuration, passed through untouched
    #[serde(default)]
    pub config: serde_json::Value,
}

/// Contents of a connectors file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectorsFile {
    #[serde(default)]
    pub connectors: Vec<ConnectorDefinition>,
}

impl ConnectorsFile {
    /// Load connector definitions
    ///
    /// # Arguments
    /// * `explicit` - Path given on the command line, if any
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_path(explicit)?;
        Self::from_file(&path)
    }

    /// Load definitions from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let file: ConnectorsFile = ::config::load_json_file(path)?;
        file.validate()
            .with_context(|| format!("Invalid connectors file: {}", path.display()))?;
        Ok(file)
    }

    /// Parse definitions from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let file: ConnectorsFile =
            serde_json::from_str(json).context("Failed to parse connectors JSON")?;
        file.validate()?;
        Ok(file)
    }

    /// Find a connector by name
    pub fn get(&self, name: &str) -> Option<&ConnectorDefinition> {
        self.connectors.iter().find(|c| c.name == name)
    }

    fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }
        if let Some(path) = std::env::var_os(CONNECTORS_ENV).filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(path));
        }
        ::config::config_path(CONNECTORS_FILE).context("Could not determine config directory")
    }

    fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for connector in &self.connectors {
            anyhow::ensure!(!connector.name.is_empty(), "connector name must not be empty");
            anyhow::ensure!(
                connector.page_size > 0,
                "connector {} has a zero page size",
                connector.name
            );
            anyhow::ensure!(
                seen.insert(connector.name.as_str()),
                "connector {} is defined twice",
                connector.name
            );
        }
        Ok(())
    }
}
