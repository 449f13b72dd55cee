//! Mapping of API records onto normalized records

use super::api::{Account, Balance, Beneficiary, Transaction, TransactionStatus, TransactionType};
use super::client::parse_amount;
use crate::models::asset::asset_for;
use crate::models::{PaymentStatus, PaymentType, PspAccount, PspBalance, PspPayment};
use crate::Result;

/// Asset for an API currency field
///
/// The API sends either a bare ISO code or an asset already written as
/// `CURRENCY/precision`.
pub fn asset(currency: &str) -> Option<String> {
    let currency = currency.trim();
    match currency.split_once('/') {
        Some((code, precision)) if !code.is_empty() && precision.parse::<u32>().is_ok() => {
            Some(format!("{}/{}", code.to_ascii_uppercase(), precision))
        }
        Some(_) => None,
        None => asset_for(currency),
    }
}

pub fn account(account: &Account) -> Result<PspAccount> {
    let mut psp = PspAccount::new(
        account.id.clone(),
        account.created_at,
        serde_json::to_value(account)?,
    );
    psp.name = account.account_name.clone();
    psp.default_asset = account.currency.as_deref().and_then(asset);
    psp.metadata = account.metadata.clone();
    Ok(psp)
}

pub fn beneficiary(beneficiary: &Beneficiary) -> Result<PspAccount> {
    let mut psp = PspAccount::new(
        beneficiary.id.clone(),
        beneficiary.created_at,
        serde_json::to_value(beneficiary)?,
    );
    psp.name = beneficiary.owner_name.clone();
    psp.metadata = beneficiary.metadata.clone();
    Ok(psp)
}

/// `None` when the currency is unknown
pub fn balance(balance: &Balance) -> Result<Option<PspBalance>> {
    let Some(asset) = asset(&balance.currency) else {
        log::debug!(
            "skipping balance of {} in unknown currency {}",
            balance.account_id,
            balance.currency
        );
        return Ok(None);
    };
    Ok(Some(PspBalance {
        account_reference: balance.account_id.clone(),
        created_at: balance.at,
        asset,
        amount: parse_amount(&balance.amount)?,
    }))
}

/// `None` when the currency is unknown
pub fn payment(tx: &Transaction) -> Result<Option<PspPayment>> {
    let Some(asset) = asset(&tx.currency) else {
        log::debug!("skipping payment {} in unknown currency {}", tx.id, tx.currency);
        return Ok(None);
    };
    Ok(Some(PspPayment {
        reference: tx.id.clone(),
        parent_reference: tx.related_transaction_id.clone(),
        created_at: tx.created_at,
        payment_type: payment_type(tx.transaction_type),
        amount: parse_amount(&tx.amount)?,
        asset,
        scheme: tx.scheme.clone(),
        status: payment_status(tx.status),
        source_account_reference: tx.source_account_id.clone(),
        destination_account_reference: tx.destination_account_id.clone(),
        metadata: tx.metadata.clone(),
        raw: serde_json::to_value(tx)?,
    }))
}

fn payment_type(t: TransactionType) -> PaymentType {
    match t {
        TransactionType::Payin => PaymentType::PayIn,
        TransactionType::Payout => PaymentType::PayOut,
        TransactionType::Transfer => PaymentType::Transfer,
        TransactionType::Other => PaymentType::Other,
    }
}

fn payment_status(s: TransactionStatus) -> PaymentStatus {
    match s {
        TransactionStatus::Pending => PaymentStatus::Pending,
        TransactionStatus::Succeeded => PaymentStatus::Succeeded,
        TransactionStatus::Failed => PaymentStatus::Failed,
        TransactionStatus::Cancelled => PaymentStatus::Cancelled,
        TransactionStatus::Refunded => PaymentStatus::Refunded,
        TransactionStatus::Unknown => PaymentStatus::Other,
    }
}
