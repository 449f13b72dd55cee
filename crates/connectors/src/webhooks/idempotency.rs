//! Idempotency keys for translated webhook results

use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};

/// Deterministic de-duplication key for a webhook result
///
/// Lowercase hex SHA-256 of `resource_id`, `event_type` and the RFC 3339
/// event date, newline separated.
pub fn idempotency_key(resource_id: &str, event_type: &str, date: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(resource_id.as_bytes());
    hasher.update(b"\n");
    hasher.update(event_type.as_bytes());
    hasher.update(b"\n");
    hasher.update(date.to_rfc3339_opts(SecondsFormat::AutoSi, true).as_bytes());
    hex::encode(hasher.finalize())
}
