use std::sync::Arc;

/// Classification of an HTTP call outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClass {
    Success,
    /// 4xx other than 429
    ClientError,
    /// 429, kept apart so callers can back off
    RateLimited,
    /// 5xx
    ServerError,
    /// No response was received (status 0)
    NetworkFailure,
}

impl StatusClass {
    pub fn is_success(&self) -> bool {
        matches!(self, StatusClass::Success)
    }
}

/// Pluggable status classifier
pub type StatusClassifier = Arc<dyn Fn(u16) -> StatusClass + Send + Sync>;

/// Default classification
///
/// Status 0 is a network failure, 429 is rate limiting, other 4xx are client
/// errors and 5xx (or anything above) are server errors. Everything below
/// 400 is a success.
pub fn default_classifier() -> StatusClassifier {
    Arc::new(classify_status)
}

pub(crate) fn classify_status(status: u16) -> StatusClass {
    match status {
        0 => StatusClass::NetworkFailure,
        429 => StatusClass::RateLimited,
        400..=499 => StatusClass::ClientError,
        500.. => StatusClass::ServerError,
        _ => StatusClass::Success,
    }
}
