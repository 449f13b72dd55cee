//! Blocking HTTP transport for provider APIs
//!
//! [`HttpClient`] wraps an [`HttpTransport`] and adds what every provider
//! call needs: status classification, optional OAuth bearer tokens and
//! per-call metrics. It never retries; callers decide based on the returned
//! error's classification.

mod classify;
mod client;
mod metrics;
mod oauth;
mod transport;

pub use classify::{StatusClass, StatusClassifier, default_classifier};
pub use client::{GenericErrorBody, HttpClient, TransportConfig};
pub use metrics::{CallLabels, CallStats, InMemoryMetrics, MetricsRecorder, NoopMetrics};
pub use oauth::{OAuthConfig, OAuthTokenSource};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Method, UreqTransport};

use std::time::Duration;

/// Timeout applied to each call when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
