//! Event routing from webhook endpoints to typed translators

use std::collections::BTreeMap;

use crate::models::{
    Metadata, SECRET_METADATA_KEY, TranslateWebhookRequest, WebhookConfig, WebhookResponse,
};
use crate::{ConnectorError, Result};

/// Typed translator for one event type
///
/// `C` is the provider context, usually its plugin or client.
pub type Translator<C> = fn(&C, &TranslateWebhookRequest) -> Result<Vec<WebhookResponse>>;

struct Route<C> {
    url_path: String,
    translate: Translator<C>,
}

/// Event type to handler table of one provider
pub struct WebhookRouter<C> {
    routes: BTreeMap<String, Route<C>>,
}

impl<C> Default for WebhookRouter<C> {
    fn default() -> Self {
        Self {
            routes: BTreeMap::new(),
        }
    }
}

impl<C> WebhookRouter<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `event_type`, received on `url_path`
    pub fn route(
        mut self,
        event_type: impl Into<String>,
        url_path: impl Into<String>,
        translate: Translator<C>,
    ) -> Self {
        self.routes.insert(
            event_type.into(),
            Route {
                url_path: url_path.into(),
                translate,
            },
        );
        self
    }

    /// `(event_type, url_path)` pairs, ordered by event type
    pub fn event_types(&self) -> impl Iterator<Item = (&str, &str)> {
        self.routes
            .iter()
            .map(|(event, route)| (event.as_str(), route.url_path.as_str()))
    }

    pub fn url_path(&self, event_type: &str) -> Option<&str> {
        self.routes.get(event_type).map(|r| r.url_path.as_str())
    }

    /// One config per event type, carrying `secret` when given
    pub fn configs(&self, secret: Option<&str>) -> Vec<WebhookConfig> {
        self.event_types()
            .map(|(event, path)| {
                let mut metadata = Metadata::new();
                if let Some(secret) = secret {
                    metadata.insert(SECRET_METADATA_KEY.into(), secret.into());
                }
                WebhookConfig {
                    name: event.to_string(),
                    url_path: path.to_string(),
                    metadata,
                }
            })
            .collect()
    }

    /// Resolve the translator for an event type
    pub fn resolve(&self, event_type: &str) -> Result<Translator<C>> {
        self.routes
            .get(event_type)
            .map(|r| r.translate)
            .ok_or_else(|| ConnectorError::UnsupportedEvent(event_type.to_string()))
    }

    /// Translate a delivery with the handler registered for its name
    pub fn translate(
        &self,
        context: &C,
        request: &TranslateWebhookRequest,
    ) -> Result<Vec<WebhookResponse>> {
        let translate = self.resolve(&request.name)?;
        translate(context, request)
    }
}
