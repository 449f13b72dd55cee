use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Balance of one asset on one account at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PspBalance {
    pub account_reference: String,
    pub created_at: DateTime<Utc>,
    pub asset: String,
    /// Amount in minor units of `asset`
    pub amount: i128,
}
