use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Metadata;

/// An account held at a provider
///
/// Also used for external accounts (beneficiaries, counterparties).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PspAccount {
    /// Provider-side identifier
    pub reference: String,
    pub created_at: DateTime<Utc>,
    pub name: Option<String>,
    /// Asset in `CURRENCY/precision` form, e.g. `EUR/2`
    pub default_asset: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    /// Provider payload, verbatim
    pub raw: serde_json::Value,
}

impl PspAccount {
    /// Create an account with no name, asset or metadata
    pub fn new(
        reference: impl Into<String>,
        created_at: DateTime<Utc>,
        raw: serde_json::Value,
    ) -> Self {
        Self {
            reference: reference.into(),
            created_at,
            name: None,
            default_asset: None,
            metadata: Metadata::new(),
            raw,
        }
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the default asset
    pub fn with_asset(mut self, asset: impl Into<String>) -> Self {
        self.default_asset = Some(asset.into());
        self
    }

    /// Add a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
