use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Metadata;

/// Direction of a payment relative to the connected account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    PayIn,
    PayOut,
    Transfer,
    Other,
}

/// Lifecycle status of a payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Cancelled,
    Failed,
    Expired,
    Refunded,
    RefundedFailure,
    RefundReversed,
    Dispute,
    Authorisation,
    Capture,
    Other,
}

impl PaymentStatus {
    /// Whether the payment can still change status
    pub fn is_final(&self) -> bool {
        !matches!(
            self,
            PaymentStatus::Pending | PaymentStatus::Authorisation | PaymentStatus::Dispute
        )
    }
}

/// A payment movement as reported by a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PspPayment {
    /// Provider-side identifier of this movement
    pub reference: String,
    /// Identifier of the payment this movement belongs to (refunds, captures)
    pub parent_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub payment_type: PaymentType,
    /// Amount in minor units of `asset`
    pub amount: i128,
    pub asset: String,
    pub scheme: Option<String>,
    pub status: PaymentStatus,
    pub source_account_reference: Option<String>,
    pub destination_account_reference: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    /// Provider payload, verbatim
    pub raw: serde_json::Value,
}
