//! Typed client for the generic payments API

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;

use super::api::{
    Account, ApiErrorBody, Balance, Beneficiary, HookRequest, InitiationRequest, Transaction,
};
use crate::http::{HttpClient, HttpRequest};
use crate::sync::{TimelineQuery, TimelineSource};
use crate::webhooks::RegisteredHook;
use crate::{ConnectorError, Result};

/// Header carrying the API key, when one is configured
pub const API_KEY_HEADER: &str = "X-Api-Key";

pub struct Client {
    http: HttpClient,
    endpoint: String,
}

impl Client {
    /// # Arguments
    /// * `http` - Configured HTTP client
    /// * `endpoint` - API base URL, e.g. `https://api.example.com/v1`
    pub fn new(http: HttpClient, endpoint: &str) -> Self {
        Self {
            http,
            endpoint: endpoint.trim().trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Accounts created at or after `created_at_from`, oldest first
    ///
    /// `page` is zero-based; the API counts pages from one.
    pub fn list_accounts(
        &self,
        page: usize,
        page_size: usize,
        created_at_from: Option<DateTime<Utc>>,
    ) -> Result<Vec<Account>> {
        let url = self.url("/accounts", &paging(page, page_size, created_at_from));
        self.get("list_accounts", url)
    }

    /// Beneficiaries created at or after `created_at_from`, oldest first
    pub fn list_beneficiaries(
        &self,
        page: usize,
        page_size: usize,
        created_at_from: Option<DateTime<Utc>>,
    ) -> Result<Vec<Beneficiary>> {
        let url = self.url("/beneficiaries", &paging(page, page_size, created_at_from));
        self.get("list_beneficiaries", url)
    }

    pub fn list_balances(&self, account_id: &str) -> Result<Vec<Balance>> {
        let path = format!("/accounts/{}/balances", urlencoding::encode(account_id));
        self.get("list_balances", self.url(&path, &[]))
    }

    /// Payments, newest first
    pub fn list_payments(&self, query: &TimelineQuery) -> Result<Vec<Transaction>> {
        let mut params = vec![
            ("skip", query.skip.to_string()),
            ("count", query.count.to_string()),
        ];
        if let Some(since) = query.since {
            params.push(("since", format_time(since)));
        }
        self.get("list_payments", self.url("/payments", &params))
    }

    pub fn get_payment(&self, id: &str) -> Result<Transaction> {
        let path = format!("/payments/{}", urlencoding::encode(id));
        self.get("get_payment", self.url(&path, &[]))
    }

    pub fn create_transfer(&self, request: &InitiationRequest) -> Result<Transaction> {
        let http = HttpRequest::post(self.url("/transfers", &[])).json(request)?;
        self.send("create_transfer", http)
    }

    pub fn create_payout(&self, request: &InitiationRequest) -> Result<Transaction> {
        let http = HttpRequest::post(self.url("/payouts", &[])).json(request)?;
        self.send("create_payout", http)
    }

    pub fn list_webhooks(&self) -> Result<Vec<RegisteredHook>> {
        self.get("list_webhooks", self.url("/webhooks", &[]))
    }

    pub fn create_webhook(&self, event_type: &str, url: &str) -> Result<RegisteredHook> {
        let http = HttpRequest::post(self.url("/webhooks", &[]))
            .json(&HookRequest { event_type, url })?;
        self.send("create_webhook", http)
    }

    pub fn update_webhook(&self, id: &str, event_type: &str, url: &str) -> Result<RegisteredHook> {
        let path = format!("/webhooks/{}", urlencoding::encode(id));
        let http = HttpRequest::put(self.url(&path, &[])).json(&HookRequest { event_type, url })?;
        self.send("update_webhook", http)
    }

    fn get<T: DeserializeOwned>(&self, operation: &str, url: String) -> Result<T> {
        self.send(operation, HttpRequest::get(url))
    }

    fn send<T: DeserializeOwned>(&self, operation: &str, request: HttpRequest) -> Result<T> {
        let request = request.header("Accept", "application/json");
        Ok(self
            .http
            .execute_json_with_error::<T, ApiErrorBody>(operation, request)?)
    }

    fn url(&self, path: &str, params: &[(&str, String)]) -> String {
        let mut url = format!("{}{}", self.endpoint, path);
        for (i, (name, value)) in params.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(name);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }
}

impl TimelineSource for Client {
    type Item = Transaction;

    fn list(&self, query: &TimelineQuery) -> Result<Vec<Transaction>> {
        self.list_payments(query)
    }
}

fn paging(
    page: usize,
    page_size: usize,
    created_at_from: Option<DateTime<Utc>>,
) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("page", (page + 1).to_string()),
        ("pageSize", page_size.to_string()),
    ];
    if let Some(from) = created_at_from {
        params.push(("createdAtFrom", format_time(from)));
    }
    params
}

fn format_time(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse a decimal minor-unit amount
pub fn parse_amount(raw: &str) -> Result<i128> {
    raw.trim()
        .parse()
        .map_err(|e| ConnectorError::Provider(format!("invalid amount {:?}: {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::TransportConfig;
    use chrono::TimeZone;

    fn client() -> Client {
        Client::new(
            HttpClient::new("generic-test", TransportConfig::default()),
            "https://api.example.com/v1/",
        )
    }

    #[test]
    fn test_url_encodes_query_values() {
        let since = Utc.with_ymd_and_hms(2024, 2, 1, 10, 0, 0).unwrap();
        let url = client().url("/accounts", &paging(0, 50, Some(since)));
        assert_eq!(
            url,
            "https://api.example.com/v1/accounts?page=1&pageSize=50&createdAtFrom=2024-02-01T10%3A00%3A00Z"
        );
    }

    #[test]
    fn test_url_without_query() {
        assert_eq!(
            client().url("/webhooks", &[]),
            "https://api.example.com/v1/webhooks"
        );
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1000").unwrap(), 1000);
        assert_eq!(parse_amount(" -25 ").unwrap(), -25);
        assert!(matches!(
            parse_amount("12.5"),
            Err(ConnectorError::Provider(_))
        ));
    }
}
