use serde::{Deserialize, Serialize};

/// A provider resource with no normalized shape
///
/// Returned by `fetch_next_others` and by webhook registration, which reports
/// the hooks it created or updated this way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PspOther {
    pub id: String,
    pub other: serde_json::Value,
}
