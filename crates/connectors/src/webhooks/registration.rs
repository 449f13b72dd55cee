//! Reconciling provider-side webhook registrations
//!
//! A connector needs one hook per supported event type, pointing at
//! `base_url + url_path`. [`reconcile`] compares that with the hooks the
//! provider reports and returns the creates and updates needed. Hooks that
//! are already correct produce no action.

use serde::{Deserialize, Serialize};

use crate::{ConnectorError, Result};

/// A hook as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredHook {
    pub id: String,
    pub event_type: String,
    pub url: String,
}

/// Change to apply on the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookAction {
    Create { event_type: String, url: String },
    Update { id: String, event_type: String, url: String },
}

/// Join a callback base URL and an event path
pub fn webhook_url(base_url: &str, url_path: &str) -> Result<String> {
    let base = base_url.trim();
    url::Url::parse(base).map_err(|e| {
        ConnectorError::InvalidRequest(format!("invalid webhook base url {:?}: {}", base, e))
    })?;
    Ok(format!(
        "{}/{}",
        base.trim_end_matches('/'),
        url_path.trim_start_matches('/')
    ))
}

/// Compute the actions bringing `existing` in line with `wanted`
///
/// # Arguments
/// * `base_url` - Public callback base URL of the connector
/// * `wanted` - `(event_type, url_path)` pairs the connector handles
/// * `existing` - Hooks currently registered at the provider
pub fn reconcile<'a>(
    base_url: &str,
    wanted: impl IntoIterator<Item = (&'a str, &'a str)>,
    existing: &[RegisteredHook],
) -> Result<Vec<HookAction>> {
    let mut actions = Vec::new();

    for (event_type, url_path) in wanted {
        let url = webhook_url(base_url, url_path)?;
        let mut same_event = existing.iter().filter(|h| h.event_type == event_type);

        match same_event.clone().find(|h| h.url == url) {
            Some(_) => continue,
            None => match same_event.next() {
                Some(hook) => actions.push(HookAction::Update {
                    id: hook.id.clone(),
                    event_type: event_type.to_string(),
                    url,
                }),
                None => actions.push(HookAction::Create {
                    event_type: event_type.to_string(),
                    url,
                }),
            },
        }
    }

    Ok(actions)
}
