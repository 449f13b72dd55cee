use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Metadata, PspAccount, PspBalance, PspPayment};

/// Metadata key holding the per-endpoint signing secret
pub const SECRET_METADATA_KEY: &str = "secret";

/// A webhook endpoint registered with a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Event type this endpoint receives
    pub name: String,
    /// Path appended to the connector's callback base URL
    pub url_path: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl WebhookConfig {
    /// Signing secret for this endpoint, if configured
    pub fn secret(&self) -> Option<&str> {
        self.metadata
            .get(SECRET_METADATA_KEY)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// An inbound webhook delivery, as received over HTTP
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookRequest {
    #[serde(default)]
    pub headers: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub query: BTreeMap<String, Vec<String>>,
    /// Raw request body, exactly as signed by the provider
    #[serde(default)]
    pub body: Vec<u8>,
}

impl WebhookRequest {
    /// Create a request carrying only a body
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            ..Default::default()
        }
    }

    /// Add a header value
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    /// First value of a header, matched case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .and_then(|(_, values)| values.first())
            .map(String::as_str)
    }

    /// First value of a query parameter
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}

/// One normalized record produced from a webhook delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookResponse {
    /// Deterministic key for downstream de-duplication
    pub idempotency_key: String,
    pub account: Option<PspAccount>,
    pub external_account: Option<PspAccount>,
    pub payment: Option<PspPayment>,
    pub balance: Option<PspBalance>,
}

impl WebhookResponse {
    /// Create an empty response with the given idempotency key
    pub fn new(idempotency_key: impl Into<String>) -> Self {
        Self {
            idempotency_key: idempotency_key.into(),
            account: None,
            external_account: None,
            payment: None,
            balance: None,
        }
    }
}
