use chrono::Utc;

use super::capabilities;
use super::client::{Account, Client, Payment};
use crate::models::asset::{asset_for, currency_of};
use crate::models::{
    FetchNextRequest, FetchNextResponse, PaymentInitiation, PaymentStatus, PaymentType,
    PayoutResponse, PspAccount, PspBalance, PspPayment, TransferResponse,
};
use crate::plugin::{Capabilities, Plugin};
use crate::sync::{LastIdState, WatermarkState, collect_pages, decode_state, encode_state};
use crate::Result;

/// Provider backed by a local directory of JSON files
pub struct DummyPayPlugin {
    name: String,
    client: Client,
}

impl DummyPayPlugin {
    pub fn new(name: impl Into<String>, client: Client) -> Self {
        Self {
            name: name.into(),
            client,
        }
    }

    fn create_payment(&self, payment_type: PaymentType, pi: &PaymentInitiation) -> Result<PspPayment> {
        let payment = Payment {
            id: format!("dummypay-{}", pi.reference),
            created_at: Utc::now(),
            amount_in_minors: pi.amount,
            currency: currency_of(&pi.asset).to_string(),
            payment_type,
            status: PaymentStatus::Succeeded,
            source_account_id: pi.source_account.as_ref().map(|a| a.reference.clone()),
            destination_account_id: pi.destination_account.as_ref().map(|a| a.reference.clone()),
        };

        let stored = self.client.create_payment(payment)?;
        let mut psp = to_psp_payment(&stored)?;
        psp.asset = pi.asset.clone();
        psp.metadata = pi.metadata.clone();
        Ok(psp)
    }
}

fn to_psp_account(account: &Account) -> Result<PspAccount> {
    let mut psp = PspAccount::new(
        account.id.clone(),
        account.opening_date,
        serde_json::to_value(account)?,
    );
    psp.name = account.name.clone();
    psp.default_asset = asset_for(&account.currency);
    Ok(psp)
}

fn to_psp_payment(payment: &Payment) -> Result<PspPayment> {
    let asset = asset_for(&payment.currency).unwrap_or_else(|| payment.currency.clone());
    Ok(PspPayment {
        reference: payment.id.clone(),
        parent_reference: None,
        created_at: payment.created_at,
        payment_type: payment.payment_type,
        amount: payment.amount_in_minors,
        asset,
        scheme: None,
        status: payment.status,
        source_account_reference: payment.source_account_id.clone(),
        destination_account_reference: payment.destination_account_id.clone(),
        metadata: Default::default(),
        raw: serde_json::to_value(payment)?,
    })
}

impl Plugin for DummyPayPlugin {
    fn name(&self) -> &str {
        super::PROVIDER
    }

    fn capabilities(&self) -> Capabilities {
        capabilities()
    }

    fn fetch_next_accounts(&self, req: &FetchNextRequest) -> Result<FetchNextResponse<PspAccount>> {
        let mut state: WatermarkState = decode_state(req.state.as_deref())?;

        let (accounts, has_more) = collect_pages(
            req.page_size,
            |page| self.client.accounts(page, req.page_size),
            |account| {
                if state.covers(account.opening_date) {
                    return Ok(None);
                }
                to_psp_account(&account).map(Some)
            },
        )?;

        if let Some(last) = accounts.last() {
            state.last_created_at = Some(last.created_at);
        }
        log::debug!("{} fetched {} accounts", self.name, accounts.len());

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
        let mut state: LastIdState = decode_state(req.state.as_deref())?;
        let all = self.client.external_accounts()?;

        let start = match state.last_id.as_deref() {
            None => 0,
            Some(last_id) => match all.iter().position(|a| a.id == last_id) {
                Some(index) => index + 1,
                None => {
                    log::warn!(
                        "{}: external account {} no longer listed, restarting from the beginning",
                        self.name,
                        last_id
                    );
                    0
                }
            },
        };

        let remaining = &all[start.min(all.len())..];
        let (accounts, has_more) = collect_pages(
            req.page_size,
            |page| {
                Ok(remaining
                    .iter()
                    .skip(page * req.page_size)
                    .take(req.page_size)
                    .cloned()
                    .collect())
            },
            |account| to_psp_account(&account).map(Some),
        )?;

        if let Some(last) = accounts.last() {
            state.last_id = Some(last.reference.clone());
        }

        Ok(FetchNextResponse {
            items: accounts,
            new_state: encode_state(&state)?,
            has_more,
        })
    }

    fn fetch_next_balances(&self, req: &FetchNextRequest) -> Result<FetchNextResponse<PspBalance>> {
        let account: PspAccount = req.parent()?;

        let balances = match self.client.balance(&account.reference)? {
            Some(balance) => match asset_for(&balance.currency) {
                Some(asset) => vec![PspBalance {
                    account_reference: account.reference.clone(),
                    created_at: Utc::now(),
                    asset,
                    amount: balance.amount_in_minors,
                }],
                None => {
                    log::debug!(
                        "{}: skipping balance of {} in unknown currency {}",
                        self.name,
                        account.reference,
                        balance.currency
                    );
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        Ok(FetchNextResponse {
            items: balances,
            new_state: req.state.clone().unwrap_or_default(),
            has_more: false,
        })
    }

    fn fetch_next_payments(&self, req: &FetchNextRequest) -> Result<FetchNextResponse<PspPayment>> {
        let mut state: WatermarkState = decode_state(req.state.as_deref())?;

        let (payments, has_more) = collect_pages(
            req.page_size,
            |page| self.client.payments(page, req.page_size),
            |payment| {
                if state.covers(payment.created_at) {
                    return Ok(None);
                }
                if asset_for(&payment.currency).is_none() {
                    log::debug!(
                        "{}: skipping payment {} in unknown currency {}",
                        self.name,
                        payment.id,
                        payment.currency
                    );
                    return Ok(None);
                }
                to_psp_payment(&payment).map(Some)
            },
        )?;

        if let Some(last) = payments.last() {
            state.last_created_at = Some(last.created_at);
        }
        log::debug!("{} fetched {} payments", self.name, payments.len());

        Ok(FetchNextResponse {
            items: payments,
            new_state: encode_state(&state)?,
            has_more,
        })
    }

    fn create_transfer(&self, pi: &PaymentInitiation) -> Result<TransferResponse> {
        Ok(TransferResponse {
            payment: self.create_payment(PaymentType::Transfer, pi)?,
        })
    }

    fn create_payout(&self, pi: &PaymentInitiation) -> Result<PayoutResponse> {
        Ok(PayoutResponse {
            payment: self.create_payment(PaymentType::PayOut, pi)?,
        })
    }
}
