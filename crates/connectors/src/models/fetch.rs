//! Request and response envelopes for plugin operations

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{PspOther, PspPayment, WebhookConfig, WebhookRequest};
use crate::{ConnectorError, Result};

/// Input of every `fetch_next_*` operation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchNextRequest {
    /// Last persisted cursor; `None` or empty means start of history
    pub state: Option<Vec<u8>>,
    /// Serialized parent resource, required for nested streams
    pub from_payload: Option<Vec<u8>>,
    pub page_size: usize,
}

impl FetchNextRequest {
    /// Create a request starting from the beginning of history
    pub fn new(page_size: usize) -> Self {
        Self {
            state: None,
            from_payload: None,
            page_size,
        }
    }

    /// Resume from a persisted cursor
    pub fn with_state(mut self, state: impl Into<Vec<u8>>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Attach the parent resource
    pub fn with_from_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.from_payload = Some(payload.into());
        self
    }

    /// Reject requests no provider can serve
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(ConnectorError::InvalidRequest(
                "page size must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Decode the parent resource
    ///
    /// A missing payload is [`ConnectorError::MissingFromPayload`]; one that
    /// does not parse is an invalid request.
    pub fn parent<T: DeserializeOwned>(&self) -> Result<T> {
        let payload = self
            .from_payload
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or(ConnectorError::MissingFromPayload)?;
        serde_json::from_slice(payload)
            .map_err(|e| ConnectorError::InvalidRequest(format!("malformed from payload: {}", e)))
    }
}

/// Input of `fetch_next_others`, which also names the resource to list
#[derive(Debug, Clone, PartialEq)]
pub struct FetchNextOthersRequest {
    pub name: String,
    pub request: FetchNextRequest,
}

/// Output of every `fetch_next_*` operation
#[derive(Debug, Clone, PartialEq)]
pub struct FetchNextResponse<T> {
    pub items: Vec<T>,
    /// Cursor to persist and pass back on the next call
    pub new_state: Vec<u8>,
    /// Whether calling again right away is likely to return more items
    pub has_more: bool,
}

/// Result of a transfer initiation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferResponse {
    pub payment: PspPayment,
}

/// Result of a payout initiation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutResponse {
    pub payment: PspPayment,
}

/// Input of `create_webhooks`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateWebhooksRequest {
    /// Public base URL under which this connector receives callbacks
    pub webhook_base_url: String,
    pub connector_id: String,
}

/// Output of `create_webhooks`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateWebhooksResponse {
    /// One config per supported event type
    pub configs: Vec<WebhookConfig>,
    /// Provider-side hook objects created or updated
    pub others: Vec<PspOther>,
}

/// Input of `verify_webhook`
#[derive(Debug, Clone, PartialEq)]
pub struct VerifyWebhookRequest {
    pub config: WebhookConfig,
    pub webhook: WebhookRequest,
}

/// Input of `translate_webhook`
#[derive(Debug, Clone, PartialEq)]
pub struct TranslateWebhookRequest {
    /// Event type the delivery was routed to
    pub name: String,
    pub config: WebhookConfig,
    pub webhook: WebhookRequest,
}
