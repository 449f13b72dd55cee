//! Classified, metered, optionally authenticated HTTP client

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::{
    CallLabels, DEFAULT_TIMEOUT, HttpRequest, HttpResponse, HttpTransport, MetricsRecorder,
    NoopMetrics, OAuthConfig, OAuthTokenSource, StatusClass, StatusClassifier, UreqTransport,
    default_classifier,
};
use crate::TransportError;

/// Operation label used for token requests
const OAUTH_OPERATION: &str = "oauth_token";

/// Longest error body excerpt kept in error details
const MAX_DETAIL_LEN: usize = 200;

/// Transport configuration
///
/// Every field is optional in spirit: [`TransportConfig::default`] gives a
/// 10 second `ureq` transport, no OAuth, the default classifier and no-op
/// metrics.
#[derive(Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    /// Overrides the `ureq` transport built from `timeout`
    pub transport: Option<Arc<dyn HttpTransport>>,
    pub oauth: Option<OAuthConfig>,
    pub classifier: StatusClassifier,
    pub metrics: Arc<dyn MetricsRecorder>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            transport: None,
            oauth: None,
            classifier: default_classifier(),
            metrics: Arc::new(NoopMetrics),
        }
    }
}

impl TransportConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_oauth(mut self, oauth: OAuthConfig) -> Self {
        self.oauth = Some(oauth);
        self
    }

    pub fn with_classifier(mut self, classifier: StatusClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = metrics;
        self
    }
}

impl fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportConfig")
            .field("timeout", &self.timeout)
            .field("custom_transport", &self.transport.is_some())
            .field("oauth", &self.oauth)
            .finish_non_exhaustive()
    }
}

/// Error body shape understood by default
///
/// Covers the common `{"message": ..}`, `{"error_description": ..}` and
/// `{"error": ..}` conventions. Bodies carrying none of them do not decode.
#[derive(Debug, Deserialize)]
#[serde(try_from = "RawErrorBody")]
pub struct GenericErrorBody {
    message: String,
}

#[derive(Deserialize)]
struct RawErrorBody {
    message: Option<String>,
    error_description: Option<String>,
    error: Option<serde_json::Value>,
}

impl TryFrom<RawErrorBody> for GenericErrorBody {
    type Error = &'static str;

    fn try_from(raw: RawErrorBody) -> Result<Self, Self::Error> {
        let message = raw
            .message
            .or(raw.error_description)
            .or_else(|| {
                raw.error.map(|e| match e {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                })
            })
            .ok_or("error body carries no message")?;
        Ok(Self { message })
    }
}

impl fmt::Display for GenericErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// HTTP client used by providers
pub struct HttpClient {
    connector: String,
    transport: Arc<dyn HttpTransport>,
    classifier: StatusClassifier,
    oauth: Option<OAuthTokenSource>,
    metrics: Arc<dyn MetricsRecorder>,
    default_headers: Vec<(String, String)>,
}

impl HttpClient {
    /// Create a client for one connector
    ///
    /// # Arguments
    /// * `connector` - Connector name used as the metrics label
    /// * `config` - Transport configuration
    pub fn new(connector: impl Into<String>, config: TransportConfig) -> Self {
        let transport = config
            .transport
            .unwrap_or_else(|| Arc::new(UreqTransport::new(config.timeout)));
        Self {
            connector: connector.into(),
            transport,
            classifier: config.classifier,
            oauth: config.oauth.map(OAuthTokenSource::new),
            metrics: config.metrics,
            default_headers: Vec::new(),
        }
    }

    /// Add a header sent with every request
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    pub fn connector(&self) -> &str {
        &self.connector
    }

    /// Execute a request and classify its status
    ///
    /// Non-success statuses become the matching [`TransportError`] variant
    /// with a detail decoded as [`GenericErrorBody`] when possible.
    pub fn execute(&self, operation: &str, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.execute_with_error::<GenericErrorBody>(operation, request)
    }

    /// Like [`HttpClient::execute`], decoding error bodies as `E`
    pub fn execute_with_error<E>(
        &self,
        operation: &str,
        request: HttpRequest,
    ) -> Result<HttpResponse, TransportError>
    where
        E: DeserializeOwned + fmt::Display,
    {
        let endpoint = request.path();
        let response = self.send(operation, request)?;
        self.check_status::<E>(&endpoint, response)
    }

    /// Execute a request and decode a successful body as `T`
    pub fn execute_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: HttpRequest,
    ) -> Result<T, TransportError> {
        self.execute_json_with_error::<T, GenericErrorBody>(operation, request)
    }

    /// Execute a request, decoding success bodies as `T` and errors as `E`
    ///
    /// A body that fails to decode as `T` is a [`TransportError::Decode`],
    /// never a status error.
    pub fn execute_json_with_error<T, E>(
        &self,
        operation: &str,
        request: HttpRequest,
    ) -> Result<T, TransportError>
    where
        T: DeserializeOwned,
        E: DeserializeOwned + fmt::Display,
    {
        let endpoint = request.path();
        let response = self.execute_with_error::<E>(operation, request)?;
        serde_json::from_slice(&response.body).map_err(|source| TransportError::Decode {
            status: response.status,
            endpoint,
            source,
        })
    }

    fn send(&self, operation: &str, mut request: HttpRequest) -> Result<HttpResponse, TransportError> {
        for (name, value) in &self.default_headers {
            if request.header_value(name).is_none() {
                request = request.header(name.clone(), value.clone());
            }
        }

        if let Some(oauth) = &self.oauth {
            let metered = Metered {
                client: self,
                operation: OAUTH_OPERATION,
            };
            let token = oauth.token(&metered)?;
            request = request.header("Authorization", format!("Bearer {}", token));
            let response = self.execute_raw(operation, &request)?;
            if response.status == 401 {
                log::warn!("{}: token rejected, logging in again on next call", self.connector);
                oauth.invalidate();
            }
            return Ok(response);
        }

        self.execute_raw(operation, &request)
    }

    fn execute_raw(&self, operation: &str, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let labels = CallLabels {
            connector: self.connector.clone(),
            endpoint: request.path(),
            operation: operation.to_string(),
        };

        let started = Instant::now();
        let result = self.transport.execute(request);
        let elapsed = started.elapsed();

        let status = result.as_ref().map(|r| r.status).unwrap_or(0);
        self.metrics.record_call(&labels, status, elapsed);
        log::debug!(
            "{} {} {} -> {} in {:?}",
            self.connector,
            request.method,
            labels.endpoint,
            status,
            elapsed
        );

        result
    }

    fn check_status<E>(&self, endpoint: &str, response: HttpResponse) -> Result<HttpResponse, TransportError>
    where
        E: DeserializeOwned + fmt::Display,
    {
        let class = (self.classifier)(response.status);
        if class.is_success() {
            return Ok(response);
        }

        let detail = error_detail::<E>(&response.body);
        let endpoint = endpoint.to_string();
        let status = response.status;

        Err(match class {
            StatusClass::RateLimited => TransportError::RateLimited {
                status,
                endpoint,
                detail,
                retry_after: response
                    .header("Retry-After")
                    .and_then(|v| v.trim().parse().ok()),
            },
            StatusClass::ServerError => TransportError::ServerError {
                status,
                endpoint,
                detail,
            },
            StatusClass::NetworkFailure => TransportError::Network {
                endpoint,
                message: detail.unwrap_or_else(|| format!("status {}", status)),
            },
            StatusClass::ClientError | StatusClass::Success => TransportError::ClientError {
                status,
                endpoint,
                detail,
            },
        })
    }
}

/// Decode an error body as `E`, falling back to a text excerpt
fn error_detail<E>(body: &[u8]) -> Option<String>
where
    E: DeserializeOwned + fmt::Display,
{
    if body.is_empty() {
        return None;
    }
    if let Ok(decoded) = serde_json::from_slice::<E>(body) {
        return Some(decoded.to_string());
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(text.chars().take(MAX_DETAIL_LEN).collect())
}

/// Routes token requests through the client's metrics
struct Metered<'a> {
    client: &'a HttpClient,
    operation: &'a str,
}

impl HttpTransport for Metered<'_> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.client.execute_raw(self.operation, request)
    }
}
