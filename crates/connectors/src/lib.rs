//! Connectors crate - provider-independent payment sync engine
//!
//! This crate provides:
//! - Normalized models for accounts, balances, payments and webhooks
//! - The plugin contract, capability sets and an explicit registry
//! - Cursor codec, page-completion decisions and the timeline scanner
//! - A blocking HTTP transport with status classification, OAuth and metrics
//! - Webhook signature checks, routing, registration and idempotency keys
//! - A stream runner persisting cursors through pluggable stores
//! - Built-in providers: `dummypay` (local files) and `generic` (REST API)
//!
//! Everything is synchronous and executor-agnostic.

pub mod config;
pub mod dummypay;
mod error;
pub mod generic;
pub mod http;
pub mod models;
pub mod plugin;
pub mod registry;
pub mod storage;
pub mod sync;
pub mod webhooks;

pub use crate::config::{ConnectorDefinition, ConnectorsFile};
pub use error::{ConnectorError, Result, TransportError};
pub use http::{
    HttpClient, HttpRequest, HttpResponse, HttpTransport, InMemoryMetrics, MetricsRecorder,
    OAuthConfig, StatusClass, TransportConfig,
};
pub use models::{
    FetchNextRequest, FetchNextResponse, PaymentStatus, PaymentType, PspAccount, PspBalance,
    PspOther, PspPayment, WebhookConfig, WebhookRequest, WebhookResponse,
};
pub use plugin::{Capabilities, Capability, Plugin, PluginHandle};
pub use registry::{PluginContext, Registry, RegistryBuilder};
pub use storage::{CursorStore, FileCursorStore, InMemoryCursorStore};
pub use sync::{
    DrainOptions, DrainStats, EntityKind, FetchedItems, StreamKey, Timeline, drain,
    should_fetch_more,
};
