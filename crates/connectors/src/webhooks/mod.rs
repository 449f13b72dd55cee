//! Webhook verification, routing and translation helpers
//!
//! Providers combine these pieces in their `create_webhooks`,
//! `verify_webhook` and `translate_webhook` operations:
//!
//! - [`registration`] reconciles the hooks a provider already has with the
//!   ones a connector needs.
//! - [`signature`] checks HMAC-SHA256 signatures over raw bodies.
//! - [`WebhookRouter`] maps event types to URL paths and typed translators.
//! - [`idempotency_key`] derives the de-duplication key of every result.

mod dispatch;
mod idempotency;
pub mod registration;
pub mod signature;

pub use dispatch::{Translator, WebhookRouter};
pub use idempotency::idempotency_key;
pub use registration::{HookAction, RegisteredHook, reconcile, webhook_url};
pub use signature::{sign, verify_request, verify_signature};
