//! Error types shared by the connector framework

use crate::http::StatusClass;
use crate::plugin::Capability;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, ConnectorError>;

/// Failure of a single outbound provider call
///
/// Every variant names the endpoint that failed. Status-bearing variants keep
/// a short detail string extracted from the provider's error body when one
/// could be decoded.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("network failure calling {endpoint}: {message}")]
    Network { endpoint: String, message: String },

    #[error("client error (status {status}) from {endpoint}{}", detail_suffix(.detail))]
    ClientError {
        status: u16,
        endpoint: String,
        detail: Option<String>,
    },

    #[error("rate limited (status {status}) by {endpoint}{}", detail_suffix(.detail))]
    RateLimited {
        status: u16,
        endpoint: String,
        detail: Option<String>,
        /// Seconds from a `Retry-After` header, if the provider sent one
        retry_after: Option<u64>,
    },

    #[error("server error (status {status}) from {endpoint}{}", detail_suffix(.detail))]
    ServerError {
        status: u16,
        endpoint: String,
        detail: Option<String>,
    },

    #[error("failed to decode response (status {status}) from {endpoint}: {source}")]
    Decode {
        status: u16,
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("oauth login failed: {message}")]
    OAuth { message: String, status: Option<u16> },

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!(": {}", d),
        None => String::new(),
    }
}

impl TransportError {
    /// HTTP status of the failed call, 0 when no response was received
    pub fn status(&self) -> u16 {
        match self {
            TransportError::ClientError { status, .. }
            | TransportError::RateLimited { status, .. }
            | TransportError::ServerError { status, .. }
            | TransportError::Decode { status, .. } => *status,
            TransportError::OAuth { status, .. } => status.unwrap_or(0),
            TransportError::Network { .. } | TransportError::InvalidRequest(_) => 0,
        }
    }

    /// Classification of this failure, if it came from a status code
    pub fn class(&self) -> Option<StatusClass> {
        match self {
            TransportError::Network { .. } => Some(StatusClass::NetworkFailure),
            TransportError::ClientError { .. } => Some(StatusClass::ClientError),
            TransportError::RateLimited { .. } => Some(StatusClass::RateLimited),
            TransportError::ServerError { .. } => Some(StatusClass::ServerError),
            _ => None,
        }
    }

    /// Whether the caller may retry the same call later
    ///
    /// Rate limiting, server errors and network failures are transient.
    /// Client errors and decode failures are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportError::Network { .. }
                | TransportError::RateLimited { .. }
                | TransportError::ServerError { .. }
        )
    }
}

/// Error returned by connector operations
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("failed to decode persisted cursor state: {0}")]
    CursorDecode(#[source] serde_json::Error),

    #[error("missing from payload in request")]
    MissingFromPayload,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid connector config: {0}")]
    InvalidConfig(String),

    #[error("webhook verification failed: {0}")]
    WebhookVerification(String),

    #[error("webhook configuration error: {0}")]
    WebhookConfiguration(String),

    #[error("unsupported webhook event: {0}")]
    UnsupportedEvent(String),

    #[error("operation not supported: {0}")]
    UnsupportedOperation(Capability),

    #[error("connector {0} has been uninstalled")]
    NotInstalled(String),

    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("provider {0} is already registered")]
    DuplicateProvider(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConnectorError {
    /// Whether repeating the operation later could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            ConnectorError::Transport(e) => e.is_retryable(),
            ConnectorError::Io(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_transport_errors() {
        let rate_limited = TransportError::RateLimited {
            status: 429,
            endpoint: "/payments".into(),
            detail: None,
            retry_after: Some(3),
        };
        let client = TransportError::ClientError {
            status: 404,
            endpoint: "/payments".into(),
            detail: Some("not found".into()),
        };

        assert!(rate_limited.is_retryable());
        assert!(!client.is_retryable());
        assert_eq!(client.status(), 404);
        assert!(ConnectorError::from(rate_limited).is_retryable());
    }

    #[test]
    fn test_error_messages_include_detail() {
        let err = TransportError::ServerError {
            status: 503,
            endpoint: "/accounts".into(),
            detail: Some("maintenance".into()),
        };
        assert_eq!(
            err.to_string(),
            "server error (status 503) from /accounts: maintenance"
        );

        let err = TransportError::Network {
            endpoint: "/accounts".into(),
            message: "connection refused".into(),
        };
        assert_eq!(err.status(), 0);
        assert_eq!(err.class(), Some(StatusClass::NetworkFailure));
    }

    #[test]
    fn test_unsupported_operation_names_capability() {
        let err = ConnectorError::UnsupportedOperation(Capability::CreatePayout);
        assert_eq!(err.to_string(), "operation not supported: create_payout");
    }
}
