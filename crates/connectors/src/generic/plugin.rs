use super::api::{InitiationRequest, Transaction};
use super::capabilities;
use super::client::Client;
use super::normalize;
use super::webhooks::{SIGNATURE_HEADER, router};
use crate::models::{
    CreateWebhooksRequest, CreateWebhooksResponse, FetchNextRequest, FetchNextResponse,
    PaymentInitiation, PayoutResponse, PspAccount, PspBalance, PspOther, PspPayment,
    TransferResponse, TranslateWebhookRequest, VerifyWebhookRequest, WebhookResponse,
};
use crate::plugin::{Capabilities, Plugin};
use crate::sync::{Timeline, WatermarkState, collect_pages, decode_state, encode_state};
use crate::webhooks::{HookAction, RegisteredHook, WebhookRouter, reconcile, verify_request};
use crate::{ConnectorError, Result};

/// Provider for the generic payments REST API
pub struct GenericPlugin {
    name: String,
    client: Client,
    router: WebhookRouter<Client>,
    webhook_secret: Option<String>,
}

impl GenericPlugin {
    pub fn new(name: impl Into<String>, client: Client, webhook_secret: Option<String>) -> Self {
        Self {
            name: name.into(),
            client,
            router: router(),
            webhook_secret,
        }
    }

    fn initiate(
        &self,
        pi: &PaymentInitiation,
        send: impl FnOnce(&Client, &InitiationRequest) -> Result<Transaction>,
    ) -> Result<PspPayment> {
        let destination = pi.destination_account.as_ref().ok_or_else(|| {
            ConnectorError::InvalidRequest("destination account is required".into())
        })?;

        let request = InitiationRequest {
            idempotency_key: pi.reference.clone(),
            amount: pi.amount.to_string(),
            currency: pi.asset.clone(),
            source_account_id: pi.source_account.as_ref().map(|a| a.reference.clone()),
            destination_account_id: destination.reference.clone(),
            description: pi.description.clone(),
            metadata: pi.metadata.clone(),
        };

        let tx = send(&self.client, &request)?;
        normalize::payment(&tx)?.ok_or_else(|| {
            ConnectorError::Provider(format!(
                "payment {} returned in unknown currency {}",
                tx.id, tx.currency
            ))
        })
    }

    fn hook_other(hook: &RegisteredHook) -> Result<PspOther> {
        Ok(PspOther {
            id: hook.id.clone(),
            other: serde_json::to_value(hook)?,
        })
    }
}

impl Plugin for GenericPlugin {
    fn name(&self) -> &str {
        super::PROVIDER
    }

    fn capabilities(&self) -> Capabilities {
        capabilities()
    }

    fn fetch_next_accounts(&self, req: &FetchNextRequest) -> Result<FetchNextResponse<PspAccount>> {
        let mut state: WatermarkState = decode_state(req.state.as_deref())?;
        let from = state.last_created_at;

        let (accounts, has_more) = collect_pages(
            req.page_size,
            |page| self.client.list_accounts(page, req.page_size, from),
            |account| {
                if state.covers(account.created_at) {
                    return Ok(None);
                }
                normalize::account(&account).map(Some)
            },
        )?;

        if let Some(last) = accounts.last() {
            state.last_created_at = Some(last.created_at);
        }

        Ok(FetchNextResponse {
            items: accounts,
            new_state: encode_state(&state)?,
            has_more,
        })
    }

    fn fetch_next_external_accounts(
        &self,
        req: &FetchNextRequest,
    ) -> Result<FetchNextResponse<PspAccount>> {
        let mut state: WatermarkState = decode_state(req.state.as_deref())?;
        let from = state.last_created_at;

        let (accounts, has_more) = collect_pages(
            req.page_size,
            |page| self.client.list_beneficiaries(page, req.page_size, from),
            |beneficiary| {
                if state.covers(beneficiary.created_at) {
                    return Ok(None);
                }
                normalize::beneficiary(&beneficiary).map(Some)
            },
        )?;

        if let Some(last) = accounts.last() {
            state.last_created_at = Some(last.created_at);
        }

        Ok(FetchNextResponse {
            items: accounts,
            new_state: encode_state(&state)?,
            has_more,
        })
    }

    fn fetch_next_balances(&self, req: &FetchNextRequest) -> Result<FetchNextResponse<PspBalance>> {
        let account: PspAccount = req.parent()?;

        let mut balances = Vec::new();
        for balance in self.client.list_balances(&account.reference)? {
            if let Some(balance) = normalize::balance(&balance)? {
                balances.push(balance);
            }
        }

        Ok(FetchNextResponse {
            items: balances,
            new_state: req.state.clone().unwrap_or_default(),
            has_more: false,
        })
    }

    fn fetch_next_payments(&self, req: &FetchNextRequest) -> Result<FetchNextResponse<PspPayment>> {
        let timeline: Timeline = decode_state(req.state.as_deref())?;
        let page = timeline.next_page(&self.client, req.page_size)?;

        let mut payments = Vec::with_capacity(page.items.len());
        for tx in &page.items {
            if let Some(payment) = normalize::payment(tx)? {
                payments.push(payment);
            }
        }
        log::debug!(
            "{} fetched {} payments (caught up: {})",
            self.name,
            payments.len(),
            page.timeline.is_caught_up()
        );

        Ok(FetchNextResponse {
            items: payments,
            new_state: encode_state(&page.timeline)?,
            has_more: page.has_more,
        })
    }

    fn create_transfer(&self, pi: &PaymentInitiation) -> Result<TransferResponse> {
        let payment = self.initiate(pi, |client, request| client.create_transfer(request))?;
        Ok(TransferResponse { payment })
    }

    fn create_payout(&self, pi: &PaymentInitiation) -> Result<PayoutResponse> {
        let payment = self.initiate(pi, |client, request| client.create_payout(request))?;
        Ok(PayoutResponse { payment })
    }

    fn create_webhooks(&self, req: &CreateWebhooksRequest) -> Result<CreateWebhooksResponse> {
        if self.webhook_secret.is_none() {
            log::warn!(
                "{}: no webhook secret configured, deliveries cannot be verified",
                self.name
            );
        }

        let existing = self.client.list_webhooks()?;
        let actions = reconcile(&req.webhook_base_url, self.router.event_types(), &existing)?;

        let mut others = Vec::with_capacity(actions.len());
        for action in actions {
            let hook = match action {
                HookAction::Create { event_type, url } => {
                    let hook = self.client.create_webhook(&event_type, &url)?;
                    log::info!("{}: registered {} webhook {}", self.name, event_type, hook.id);
                    hook
                }
                HookAction::Update {
                    id,
                    event_type,
                    url,
                } => {
                    let hook = self.client.update_webhook(&id, &event_type, &url)?;
                    log::info!("{}: updated {} webhook {}", self.name, event_type, id);
                    hook
                }
            };
            others.push(Self::hook_other(&hook)?);
        }

        Ok(CreateWebhooksResponse {
            configs: self.router.configs(self.webhook_secret.as_deref()),
            others,
        })
    }

    fn verify_webhook(&self, req: &VerifyWebhookRequest) -> Result<()> {
        verify_request(&req.config, &req.webhook, SIGNATURE_HEADER)
    }

    fn translate_webhook(&self, req: &TranslateWebhookRequest) -> Result<Vec<WebhookResponse>> {
        self.router.translate(&self.client, req)
    }
}
