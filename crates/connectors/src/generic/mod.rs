//! generic provider
//!
//! Talks to any payments API implementing the generic REST contract:
//!
//! | Operation            | Call                                               |
//! |----------------------|----------------------------------------------------|
//! | accounts             | `GET /accounts?page&pageSize&createdAtFrom`        |
//! | external accounts    | `GET /beneficiaries?page&pageSize&createdAtFrom`   |
//! | balances             | `GET /accounts/{id}/balances`                      |
//! | payments             | `GET /payments?skip&count&since` (newest first)    |
//! | transfers / payouts  | `POST /transfers`, `POST /payouts`                 |
//! | webhooks             | `GET /webhooks`, `POST /webhooks`, `PUT /webhooks/{id}` |
//!
//! Connector config:
//! ```json
//! {
//!   "endpoint": "https://api.example.com",
//!   "apiKey": "...",
//!   "oauth": {"tokenUrl": "...", "clientId": "...", "clientSecret": "..."},
//!   "webhookSecret": "..."
//! }
//! ```
//! Only `endpoint` is required.

pub mod api;
mod client;
mod normalize;
mod plugin;
pub mod webhooks;

use std::fmt;

use serde::Deserialize;

pub use client::{API_KEY_HEADER, Client};
pub use plugin::GenericPlugin;

use crate::http::{HttpClient, OAuthConfig};
use crate::plugin::{Capabilities, Capability, Plugin};
use crate::registry::PluginContext;
use crate::{ConnectorError, Result};

pub const PROVIDER: &str = "generic";
pub const DEFAULT_PAGE_SIZE: usize = 50;

#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub oauth: Option<OAuthConfig>,
    #[serde(default)]
    pub webhook_secret: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("oauth", &self.oauth)
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl Config {
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        let config: Config = serde_json::from_value(value.clone())
            .map_err(|e| ConnectorError::InvalidConfig(format!("generic: {}", e)))?;

        let endpoint = url::Url::parse(config.endpoint.trim()).map_err(|e| {
            ConnectorError::InvalidConfig(format!(
                "generic: invalid endpoint {:?}: {}",
                config.endpoint, e
            ))
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ConnectorError::InvalidConfig(format!(
                "generic: endpoint must be http or https, got {}",
                endpoint.scheme()
            )));
        }
        if let Some(oauth) = &config.oauth
            && (oauth.token_url.is_empty() || oauth.client_id.is_empty())
        {
            return Err(ConnectorError::InvalidConfig(
                "generic: oauth requires tokenUrl and clientId".into(),
            ));
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
        Capability::CreateWebhooks,
        Capability::TranslateWebhook,
    ]
    .into_iter()
    .collect()
}

/// Build a generic plugin from its connector config
///
/// OAuth credentials in the connector config take precedence over any
/// set on the context's transport.
pub fn construct(ctx: PluginContext<'_>) -> Result<Box<dyn Plugin>> {
    let config = Config::from_value(ctx.config)?;

    let mut transport = ctx.transport;
    if let Some(oauth) = config.oauth.clone() {
        transport = transport.with_oauth(oauth);
    }

    let mut http = HttpClient::new(ctx.connector_name, transport);
    if let Some(key) = config.api_key.as_deref().filter(|k| !k.is_empty()) {
        http = http.with_default_header(API_KEY_HEADER, key);
    }

    log::debug!("{}: generic provider at {}", ctx.connector_name, config.endpoint);
    Ok(Box::new(GenericPlugin::new(
        ctx.connector_name,
        Client::new(http, &config.endpoint),
        config.webhook_secret.filter(|s| !s.is_empty()),
    )))
}
