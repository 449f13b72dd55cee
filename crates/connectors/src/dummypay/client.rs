//! Directory-backed dummypay "API"
//!
//! Directory structure:
//! ```text
//! <directory>/
//!   accounts.json
//!   external_accounts.json
//!   balances.json
//!   payments.json
//! ```
//!
//! Each file holds a JSON array. A missing file is an empty listing.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::models::{PaymentStatus, PaymentType};
use crate::{ConnectorError, Result};

pub const ACCOUNTS_FILE: &str = "accounts.json";
pub const EXTERNAL_ACCOUNTS_FILE: &str = "external_accounts.json";
pub const BALANCES_FILE: &str = "balances.json";
pub const PAYMENTS_FILE: &str = "payments.json";

/// Account record, also used for external accounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub currency: String,
    pub opening_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub account_id: String,
    pub amount_in_minors: i128,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub amount_in_minors: i128,
    pub currency: String,
    #[serde(rename = "type")]
    pub payment_type: PaymentType,
    pub status: PaymentStatus,
    #[serde(default)]
    pub source_account_id: Option<String>,
    #[serde(default)]
    pub destination_account_id: Option<String>,
}

/// Reads and writes the dummypay data directory
#[derive(Debug, Clone)]
pub struct Client {
    directory: PathBuf,
}

impl Client {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// One page of accounts, oldest first
    ///
    /// # Arguments
    /// * `page` - Zero-based page number
    /// * `page_size` - Records per page
    pub fn accounts(&self, page: usize, page_size: usize) -> Result<Vec<Account>> {
        let mut accounts: Vec<Account> = self.read_file(ACCOUNTS_FILE)?;
        accounts.sort_by(|a, b| {
            a.opening_date
                .cmp(&b.opening_date)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(slice_page(accounts, page, page_size))
    }

    /// All external accounts, in file order
    pub fn external_accounts(&self) -> Result<Vec<Account>> {
        self.read_file(EXTERNAL_ACCOUNTS_FILE)
    }

    /// One page of payments, oldest first
    pub fn payments(&self, page: usize, page_size: usize) -> Result<Vec<Payment>> {
        let mut payments: Vec<Payment> = self.read_file(PAYMENTS_FILE)?;
        payments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(slice_page(payments, page, page_size))
    }

    /// Current balance of an account, if the provider knows one
    pub fn balance(&self, account_id: &str) -> Result<Option<Balance>> {
        let balances: Vec<Balance> = self.read_file(BALANCES_FILE)?;
        Ok(balances.into_iter().find(|b| b.account_id == account_id))
    }

    /// Record a payment, returning the stored one
    ///
    /// A payment whose id already exists is returned unchanged and nothing
    /// is written.
    pub fn create_payment(&self, payment: Payment) -> Result<Payment> {
        let mut payments: Vec<Payment> = self.read_file(PAYMENTS_FILE)?;
        if let Some(existing) = payments.iter().find(|p| p.id == payment.id) {
            log::debug!("dummypay payment {} already exists", payment.id);
            return Ok(existing.clone());
        }

        payments.push(payment.clone());
        self.write_file(PAYMENTS_FILE, &payments)?;
        log::info!("dummypay recorded {:?} {}", payment.payment_type, payment.id);
        Ok(payment)
    }

    fn read_file<T: DeserializeOwned>(&self, filename: &str) -> Result<Vec<T>> {
        let path = self.directory.join(filename);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read(&path)?;
        if content.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        serde_json::from_slice(&content).map_err(|e| {
            ConnectorError::Provider(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    fn write_file<T: Serialize>(&self, filename: &str, records: &[T]) -> Result<()> {
        fs::create_dir_all(&self.directory)?;
        let path = self.directory.join(filename);
        let content = serde_json::to_vec_pretty(records)?;

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &path)?;
        Ok(())
    }
}

fn slice_page<T>(records: Vec<T>, page: usize, page_size: usize) -> Vec<T> {
    records
        .into_iter()
        .skip(page.saturating_mul(page_size))
        .take(page_size)
        .collect()
}
