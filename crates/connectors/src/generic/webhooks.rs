//! Webhook events of the generic API
//!
//! Every delivery is a JSON envelope:
//! ```json
//! {"id": "...", "eventType": "payment.created", "createdAt": "...",
//!  "resourceID": "...", "payload": {...}}
//! ```
//! and is signed with HMAC-SHA256 over the raw body, hex encoded in the
//! `X-Signature` header.

use serde::de::DeserializeOwned;

use super::api::{Account, Balance, Transaction, WebhookEnvelope};
use super::client::Client;
use super::normalize;
use crate::models::{TranslateWebhookRequest, WebhookResponse};
use crate::webhooks::{WebhookRouter, idempotency_key};
use crate::{ConnectorError, Result};

pub const SIGNATURE_HEADER: &str = "X-Signature";

pub const ACCOUNT_CREATED: &str = "account.created";
pub const BALANCE_UPDATED: &str = "balance.updated";
pub const PAYMENT_CREATED: &str = "payment.created";
pub const PAYMENT_UPDATED: &str = "payment.updated";

/// Event types handled by the generic provider
pub fn router() -> WebhookRouter<Client> {
    WebhookRouter::new()
        .route(ACCOUNT_CREATED, "/account/created", account_created)
        .route(BALANCE_UPDATED, "/balance/updated", balance_updated)
        .route(PAYMENT_CREATED, "/payment/created", payment_created)
        .route(PAYMENT_UPDATED, "/payment/updated", payment_updated)
}

fn envelope(request: &TranslateWebhookRequest) -> Result<WebhookEnvelope> {
    let envelope: WebhookEnvelope = serde_json::from_slice(&request.webhook.body)
        .map_err(|e| ConnectorError::InvalidRequest(format!("malformed webhook body: {}", e)))?;
    if envelope.event_type != request.name {
        return Err(ConnectorError::InvalidRequest(format!(
            "{} event delivered to the {} endpoint",
            envelope.event_type, request.name
        )));
    }
    Ok(envelope)
}

fn payload<T: DeserializeOwned>(envelope: &WebhookEnvelope) -> Result<T> {
    serde_json::from_value(envelope.payload.clone()).map_err(|e| {
        ConnectorError::InvalidRequest(format!(
            "malformed {} payload: {}",
            envelope.event_type, e
        ))
    })
}

fn response(envelope: &WebhookEnvelope) -> WebhookResponse {
    WebhookResponse::new(idempotency_key(
        &envelope.resource_id,
        &envelope.event_type,
        envelope.created_at,
    ))
}

fn account_created(_: &Client, request: &TranslateWebhookRequest) -> Result<Vec<WebhookResponse>> {
    let envelope = envelope(request)?;
    let account: Account = payload(&envelope)?;

    let mut response = response(&envelope);
    response.account = Some(normalize::account(&account)?);
    Ok(vec![response])
}

fn balance_updated(_: &Client, request: &TranslateWebhookRequest) -> Result<Vec<WebhookResponse>> {
    let envelope = envelope(request)?;
    let balance: Balance = payload(&envelope)?;

    Ok(normalize::balance(&balance)?
        .map(|balance| {
            let mut response = response(&envelope);
            response.balance = Some(balance);
            response
        })
        .into_iter()
        .collect())
}

fn payment_created(_: &Client, request: &TranslateWebhookRequest) -> Result<Vec<WebhookResponse>> {
    let envelope = envelope(request)?;
    let tx: Transaction = payload(&envelope)?;
    payment_response(&envelope, &tx)
}

/// Updates only carry the id; the current state is fetched
fn payment_updated(client: &Client, request: &TranslateWebhookRequest) -> Result<Vec<WebhookResponse>> {
    let envelope = envelope(request)?;
    let tx = client.get_payment(&envelope.resource_id)?;
    payment_response(&envelope, &tx)
}

fn payment_response(envelope: &WebhookEnvelope, tx: &Transaction) -> Result<Vec<WebhookResponse>> {
    Ok(normalize::payment(tx)?
        .map(|payment| {
            let mut response = response(envelope);
            response.payment = Some(payment);
            response
        })
        .into_iter()
        .collect())
}
