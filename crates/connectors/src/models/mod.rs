//! Normalized domain models
//!
//! These types are provider-agnostic projections of provider data. Every
//! record keeps the provider's raw payload so it can be audited or replayed.

mod account;
pub mod asset;
mod balance;
mod fetch;
mod initiation;
mod other;
mod payment;
mod webhook;

pub use account::PspAccount;
pub use balance::PspBalance;
pub use fetch::{
    CreateWebhooksRequest, CreateWebhooksResponse, FetchNextRequest, FetchNextResponse,
    FetchNextOthersRequest, PayoutResponse, TransferResponse, TranslateWebhookRequest,
    VerifyWebhookRequest,
};
pub use initiation::PaymentInitiation;
pub use other::PspOther;
pub use payment::{PaymentStatus, PaymentType, PspPayment};
pub use webhook::{SECRET_METADATA_KEY, WebhookConfig, WebhookRequest, WebhookResponse};

use std::collections::BTreeMap;

/// Free-form string metadata attached to records and configs
pub type Metadata = BTreeMap<String, String>;
