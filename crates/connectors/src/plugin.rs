//! Provider plugin contract
//!
//! Each provider implements [`Plugin`] and reports the operations it
//! supports as a set of [`Capability`] values. Callers go through a
//! [`PluginHandle`], which refuses operations outside that set with
//! [`ConnectorError::UnsupportedOperation`].

use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::models::{
    CreateWebhooksRequest, CreateWebhooksResponse, FetchNextOthersRequest, FetchNextRequest,
    FetchNextResponse, PaymentInitiation, PayoutResponse, PspAccount, PspBalance, PspOther,
    PspPayment, TransferResponse, TranslateWebhookRequest, VerifyWebhookRequest, WebhookResponse,
};
use crate::{ConnectorError, Result};

/// An operation a plugin may support
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    FetchAccounts,
    FetchBalances,
    FetchExternalAccounts,
    FetchPayments,
    FetchOthers,
    CreateTransfer,
    CreatePayout,
    CreateWebhooks,
    TranslateWebhook,
}

impl Capability {
    pub const ALL: [Capability; 9] = [
        Capability::FetchAccounts,
        Capability::FetchBalances,
        Capability::FetchExternalAccounts,
        Capability::FetchPayments,
        Capability::FetchOthers,
        Capability::CreateTransfer,
        Capability::CreatePayout,
        Capability::CreateWebhooks,
        Capability::TranslateWebhook,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::FetchAccounts => "fetch_accounts",
            Capability::FetchBalances => "fetch_balances",
            Capability::FetchExternalAccounts => "fetch_external_accounts",
            Capability::FetchPayments => "fetch_payments",
            Capability::FetchOthers => "fetch_others",
            Capability::CreateTransfer => "create_transfer",
            Capability::CreatePayout => "create_payout",
            Capability::CreateWebhooks => "create_webhooks",
            Capability::TranslateWebhook => "translate_webhook",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of supported operations
pub type Capabilities = BTreeSet<Capability>;

/// Contract implemented by every provider
///
/// All operations are blocking. Unimplemented operations report
/// [`ConnectorError::UnsupportedOperation`]; `verify_webhook` is covered by
/// [`Capability::TranslateWebhook`].
pub trait Plugin: Send + Sync {
    /// Provider name, e.g. `dummypay`
    fn name(&self) -> &str;

    fn capabilities(&self) -> Capabilities;

    fn fetch_next_accounts(&self, _req: &FetchNextRequest) -> Result<FetchNextResponse<PspAccount>> {
        Err(ConnectorError::UnsupportedOperation(Capability::FetchAccounts))
    }

    fn fetch_next_balances(&self, _req: &FetchNextRequest) -> Result<FetchNextResponse<PspBalance>> {
        Err(ConnectorError::UnsupportedOperation(Capability::FetchBalances))
    }

    fn fetch_next_external_accounts(
        &self,
        _req: &FetchNextRequest,
    ) -> Result<FetchNextResponse<PspAccount>> {
        Err(ConnectorError::UnsupportedOperation(
            Capability::FetchExternalAccounts,
        ))
    }

    fn fetch_next_payments(&self, _req: &FetchNextRequest) -> Result<FetchNextResponse<PspPayment>> {
        Err(ConnectorError::UnsupportedOperation(Capability::FetchPayments))
    }

    fn fetch_next_others(
        &self,
        _req: &FetchNextOthersRequest,
    ) -> Result<FetchNextResponse<PspOther>> {
        Err(ConnectorError::UnsupportedOperation(Capability::FetchOthers))
    }

    fn create_transfer(&self, _pi: &PaymentInitiation) -> Result<TransferResponse> {
        Err(ConnectorError::UnsupportedOperation(Capability::CreateTransfer))
    }

    fn create_payout(&self, _pi: &PaymentInitiation) -> Result<PayoutResponse> {
        Err(ConnectorError::UnsupportedOperation(Capability::CreatePayout))
    }

    fn create_webhooks(&self, _req: &CreateWebhooksRequest) -> Result<CreateWebhooksResponse> {
        Err(ConnectorError::UnsupportedOperation(Capability::CreateWebhooks))
    }

    fn verify_webhook(&self, _req: &VerifyWebhookRequest) -> Result<()> {
        Err(ConnectorError::UnsupportedOperation(Capability::TranslateWebhook))
    }

    fn translate_webhook(&self, _req: &TranslateWebhookRequest) -> Result<Vec<WebhookResponse>> {
        Err(ConnectorError::UnsupportedOperation(Capability::TranslateWebhook))
    }

    /// Release provider-side resources; the default has nothing to release
    fn uninstall(&self) -> Result<()> {
        Ok(())
    }
}

/// Capability-checked handle on a constructed plugin
pub struct PluginHandle {
    connector: String,
    capabilities: Capabilities,
    plugin: Box<dyn Plugin>,
    uninstalled: AtomicBool,
}

impl PluginHandle {
    pub fn new(connector: impl Into<String>, plugin: Box<dyn Plugin>) -> Self {
        let capabilities = plugin.capabilities();
        Self {
            connector: connector.into(),
            capabilities,
            plugin,
            uninstalled: AtomicBool::new(false),
        }
    }

    /// Connector name this handle was created for
    pub fn connector(&self) -> &str {
        &self.connector
    }

    /// Provider name
    pub fn provider(&self) -> &str {
        self.plugin.name()
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    fn check(&self, capability: Capability) -> Result<()> {
        if self.uninstalled.load(Ordering::SeqCst) {
            return Err(ConnectorError::NotInstalled(self.connector.clone()));
        }
        if !self.supports(capability) {
            log::debug!(
                "{} ({}) does not support {}",
                self.connector,
                self.provider(),
                capability
            );
            return Err(ConnectorError::UnsupportedOperation(capability));
        }
        Ok(())
    }

    pub fn fetch_next_accounts(&self, req: &FetchNextRequest) -> Result<FetchNextResponse<PspAccount>> {
        self.check(Capability::FetchAccounts)?;
        req.validate()?;
        self.plugin.fetch_next_accounts(req)
    }

    pub fn fetch_next_balances(&self, req: &FetchNextRequest) -> Result<FetchNextResponse<PspBalance>> {
        self.check(Capability::FetchBalances)?;
        req.validate()?;
        self.plugin.fetch_next_balances(req)
    }

    pub fn fetch_next_external_accounts(
        &self,
        req: &FetchNextRequest,
    ) -> Result<FetchNextResponse<PspAccount>> {
        self.check(Capability::FetchExternalAccounts)?;
        req.validate()?;
        self.plugin.fetch_next_external_accounts(req)
    }

    pub fn fetch_next_payments(&self, req: &FetchNextRequest) -> Result<FetchNextResponse<PspPayment>> {
        self.check(Capability::FetchPayments)?;
        req.validate()?;
        self.plugin.fetch_next_payments(req)
    }

    pub fn fetch_next_others(
        &self,
        req: &FetchNextOthersRequest,
    ) -> Result<FetchNextResponse<PspOther>> {
        self.check(Capability::FetchOthers)?;
        req.request.validate()?;
        self.plugin.fetch_next_others(req)
    }

    pub fn create_transfer(&self, pi: &PaymentInitiation) -> Result<TransferResponse> {
        self.check(Capability::CreateTransfer)?;
        pi.validate()?;
        self.plugin.create_transfer(pi)
    }

    pub fn create_payout(&self, pi: &PaymentInitiation) -> Result<PayoutResponse> {
        self.check(Capability::CreatePayout)?;
        pi.validate()?;
        self.plugin.create_payout(pi)
    }

    pub fn create_webhooks(&self, req: &CreateWebhooksRequest) -> Result<CreateWebhooksResponse> {
        self.check(Capability::CreateWebhooks)?;
        self.plugin.create_webhooks(req)
    }

    pub fn verify_webhook(&self, req: &VerifyWebhookRequest) -> Result<()> {
        self.check(Capability::TranslateWebhook)?;
        self.plugin.verify_webhook(req)
    }

    pub fn translate_webhook(&self, req: &TranslateWebhookRequest) -> Result<Vec<WebhookResponse>> {
        self.check(Capability::TranslateWebhook)?;
        self.plugin.translate_webhook(req)
    }

    /// Uninstall the connector; later calls fail with `NotInstalled`
    pub fn uninstall(&self) -> Result<()> {
        if self.uninstalled.load(Ordering::SeqCst) {
            return Err(ConnectorError::NotInstalled(self.connector.clone()));
        }
        self.plugin.uninstall()?;
        self.uninstalled.store(true, Ordering::SeqCst);
        log::info!("Uninstalled connector {}", self.connector);
        Ok(())
    }
}
