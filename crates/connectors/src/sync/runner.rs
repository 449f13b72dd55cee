//! Stream runner
//!
//! Drives one entity stream of one connector: loads its cursor, calls the
//! matching `fetch_next_*` operation, hands the page to the caller and
//! persists the new cursor, until the provider reports nothing more.
//!
//! A cursor is saved only after its page was fully handled. Any error stops
//! the run before the store is touched, so the stored cursor always
//! describes a completed page.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{
    FetchNextOthersRequest, FetchNextRequest, PspAccount, PspBalance, PspOther, PspPayment,
};
use crate::plugin::PluginHandle;
use crate::storage::CursorStore;
use crate::{ConnectorError, Result};

/// Kind of entity a stream lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Accounts,
    Balances,
    ExternalAccounts,
    Payments,
    Others,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Accounts => "accounts",
            EntityKind::Balances => "balances",
            EntityKind::ExternalAccounts => "external_accounts",
            EntityKind::Payments => "payments",
            EntityKind::Others => "others",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = ConnectorError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "accounts" => Ok(EntityKind::Accounts),
            "balances" => Ok(EntityKind::Balances),
            "external_accounts" | "external-accounts" => Ok(EntityKind::ExternalAccounts),
            "payments" => Ok(EntityKind::Payments),
            "others" => Ok(EntityKind::Others),
            other => Err(ConnectorError::InvalidRequest(format!(
                "unknown entity kind: {}",
                other
            ))),
        }
    }
}

/// Identity of one cursor
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamKey {
    pub connector: String,
    pub kind: EntityKind,
    /// Parent resource id (nested streams) or resource name (others)
    pub parent: Option<String>,
}

impl StreamKey {
    pub fn new(connector: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            connector: connector.into(),
            kind,
            parent: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

impl fmt::Display for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.parent {
            Some(parent) => write!(f, "{}/{}/{}", self.connector, self.kind, parent),
            None => write!(f, "{}/{}", self.connector, self.kind),
        }
    }
}

/// Items of one fetched page
#[derive(Debug, Clone, PartialEq)]
pub enum FetchedItems {
    Accounts(Vec<PspAccount>),
    Balances(Vec<PspBalance>),
    ExternalAccounts(Vec<PspAccount>),
    Payments(Vec<PspPayment>),
    Others(Vec<PspOther>),
}

impl FetchedItems {
    pub fn len(&self) -> usize {
        match self {
            FetchedItems::Accounts(items) | FetchedItems::ExternalAccounts(items) => items.len(),
            FetchedItems::Balances(items) => items.len(),
            FetchedItems::Payments(items) => items.len(),
            FetchedItems::Others(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Items as JSON values, for printing or forwarding
    pub fn to_json(&self) -> Result<Vec<serde_json::Value>> {
        fn values<T: Serialize>(items: &[T]) -> Result<Vec<serde_json::Value>> {
            items
                .iter()
                .map(|item| serde_json::to_value(item).map_err(ConnectorError::from))
                .collect()
        }
        match self {
            FetchedItems::Accounts(items) | FetchedItems::ExternalAccounts(items) => values(items),
            FetchedItems::Balances(items) => values(items),
            FetchedItems::Payments(items) => values(items),
            FetchedItems::Others(items) => values(items),
        }
    }
}

/// Options of a [`drain`] run
#[derive(Debug, Clone, Default)]
pub struct DrainOptions {
    pub page_size: usize,
    /// Serialized parent resource, for nested streams
    pub from_payload: Option<Vec<u8>>,
    /// Resource name, for `others` streams
    pub other_name: Option<String>,
    /// Stop after this many pages even if more remain
    pub max_pages: Option<usize>,
}

impl DrainOptions {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            ..Default::default()
        }
    }
}

/// Summary of a [`drain`] run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainStats {
    pub pages: usize,
    pub items: usize,
    /// The run stopped on `max_pages` with data left
    pub has_more: bool,
}

/// Call the `fetch_next_*` operation matching `kind`
///
/// Returns the page, the cursor to persist and the `has_more` flag.
pub fn fetch_page(
    plugin: &PluginHandle,
    kind: EntityKind,
    request: &FetchNextRequest,
    other_name: Option<&str>,
) -> Result<(FetchedItems, Vec<u8>, bool)> {
    Ok(match kind {
        EntityKind::Accounts => {
            let r = plugin.fetch_next_accounts(request)?;
            (FetchedItems::Accounts(r.items), r.new_state, r.has_more)
        }
        EntityKind::Balances => {
            let r = plugin.fetch_next_balances(request)?;
            (FetchedItems::Balances(r.items), r.new_state, r.has_more)
        }
        EntityKind::ExternalAccounts => {
            let r = plugin.fetch_next_external_accounts(request)?;
            (FetchedItems::ExternalAccounts(r.items), r.new_state, r.has_more)
        }
        EntityKind::Payments => {
            let r = plugin.fetch_next_payments(request)?;
            (FetchedItems::Payments(r.items), r.new_state, r.has_more)
        }
        EntityKind::Others => {
            let name = other_name.ok_or_else(|| {
                ConnectorError::InvalidRequest("others streams need a resource name".into())
            })?;
            let r = plugin.fetch_next_others(&FetchNextOthersRequest {
                name: name.to_string(),
                request: request.clone(),
            })?;
            (FetchedItems::Others(r.items), r.new_state, r.has_more)
        }
    })
}

/// Drain a stream until the provider reports no more data
///
/// Pages are fetched strictly one after another. `on_page` runs before the
/// page's cursor is saved; an error from it, from the plugin or from the
/// store ends the run with the previous cursor still in place.
///
/// # Arguments
/// * `plugin` - Connector to fetch from
/// * `stream` - Stream whose cursor is loaded and saved
/// * `store` - Cursor storage
/// * `options` - Page size, parent payload and page limit
/// * `on_page` - Handler receiving each page
pub fn drain<F>(
    plugin: &PluginHandle,
    stream: &StreamKey,
    store: &dyn CursorStore,
    options: &DrainOptions,
    mut on_page: F,
) -> Result<DrainStats>
where
    F: FnMut(&FetchedItems) -> Result<()>,
{
    let mut stats = DrainStats::default();
    let mut state = store.load(stream)?;

    loop {
        let request = FetchNextRequest {
            state: state.clone(),
            from_payload: options.from_payload.clone(),
            page_size: options.page_size,
        };
        let (items, new_state, has_more) =
            fetch_page(plugin, stream.kind, &request, options.other_name.as_deref())?;

        on_page(&items)?;
        store.save(stream, &new_state)?;

        stats.pages += 1;
        stats.items += items.len();
        log::debug!(
            "{}: page {} with {} items persisted (has_more={})",
            stream,
            stats.pages,
            items.len(),
            has_more
        );

        if !has_more {
            break;
        }
        if options.max_pages.is_some_and(|max| stats.pages >= max) {
            stats.has_more = true;
            break;
        }
        state = Some(new_state);
    }

    log::info!("{}: synced {} items in {} pages", stream, stats.items, stats.pages);
    Ok(stats)
}
