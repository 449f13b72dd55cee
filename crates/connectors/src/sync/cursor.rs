//! Cursor codec
//!
//! A cursor is the persisted progress of one entity stream. The engine treats
//! it as opaque bytes; each provider picks a state shape and round-trips it
//! through JSON here.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{ConnectorError, Result};

/// Decode a persisted cursor
///
/// `None` and empty input mean start of history and yield the default state.
/// Anything else must parse, otherwise the call fails with
/// [`ConnectorError::CursorDecode`] and the cursor is left for inspection.
pub fn decode_state<S>(raw: Option<&[u8]>) -> Result<S>
where
    S: DeserializeOwned + Default,
{
    match raw {
        None => Ok(S::default()),
        Some(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(S::default()),
        Some(bytes) => serde_json::from_slice(bytes).map_err(ConnectorError::CursorDecode),
    }
}

/// Encode a cursor for persistence
pub fn encode_state<S: Serialize>(state: &S) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(state)?)
}

/// Forward-only watermark on creation time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatermarkState {
    /// Creation time of the newest item already returned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_created_at: Option<DateTime<Utc>>,
}

impl WatermarkState {
    /// Whether an item was already returned by an earlier call
    pub fn covers(&self, created_at: DateTime<Utc>) -> bool {
        self.last_created_at.is_some_and(|w| created_at <= w)
    }
}

/// Forward-only watermark on the last returned identifier
///
/// Used when the provider lists in a stable order but offers no date filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastIdState {
    #[serde(rename = "lastID", default, skip_serializing_if = "Option::is_none")]
    pub last_id: Option<String>,
}
