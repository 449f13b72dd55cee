use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Metadata, PspAccount};

/// A transfer or payout requested by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentInitiation {
    /// Caller-chosen reference, forwarded to the provider
    pub reference: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
    pub source_account: Option<PspAccount>,
    pub destination_account: Option<PspAccount>,
    /// Amount in minor units of `asset`
    pub amount: i128,
    pub asset: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl PaymentInitiation {
    /// Check the fields every provider needs
    pub fn validate(&self) -> crate::Result<()> {
        if self.reference.trim().is_empty() {
            return Err(crate::ConnectorError::InvalidRequest(
                "payment initiation reference is required".into(),
            ));
        }
        if self.amount <= 0 {
            return Err(crate::ConnectorError::InvalidRequest(format!(
                "payment initiation amount must be positive, got {}",
                self.amount
            )));
        }
        if self.destination_account.is_none() {
            return Err(crate::ConnectorError::InvalidRequest(
                "payment initiation destination account is required".into(),
            ));
        }
        Ok(())
    }
}
