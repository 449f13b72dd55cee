//! Explicit provider registry
//!
//! Providers are registered on a [`RegistryBuilder`] during startup, then the
//! builder is frozen into an immutable [`Registry`]. A process that wants a
//! single shared registry installs it once with [`install`] and reads it
//! back with [`global`]; nothing can be registered afterwards.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::http::TransportConfig;
use crate::plugin::{Capabilities, Plugin, PluginHandle};
use crate::{ConnectorError, Result, dummypay, generic};

/// Everything a provider constructor receives
pub struct PluginContext<'a> {
    pub connector_name: &'a str,
    /// Provider-specific configuration
    pub config: &'a serde_json::Value,
    pub transport: TransportConfig,
}

/// Builds a plugin from its configuration
pub type PluginConstructor = fn(PluginContext<'_>) -> Result<Box<dyn Plugin>>;

/// Static description of a registered provider
#[derive(Clone)]
pub struct ProviderEntry {
    pub name: String,
    pub capabilities: Capabilities,
    /// Page size suggested for this provider's streams
    pub default_page_size: usize,
    constructor: PluginConstructor,
}

impl std::fmt::Debug for ProviderEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderEntry")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .field("default_page_size", &self.default_page_size)
            .finish()
    }
}

/// Collects provider registrations before freezing
#[derive(Default)]
pub struct RegistryBuilder {
    entries: BTreeMap<String, ProviderEntry>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider
    ///
    /// Registering the same name twice fails.
    pub fn register(
        mut self,
        name: &str,
        capabilities: impl IntoIterator<Item = crate::Capability>,
        default_page_size: usize,
        constructor: PluginConstructor,
    ) -> Result<Self> {
        if self.entries.contains_key(name) {
            return Err(ConnectorError::DuplicateProvider(name.to_string()));
        }
        self.entries.insert(
            name.to_string(),
            ProviderEntry {
                name: name.to_string(),
                capabilities: capabilities.into_iter().collect(),
                default_page_size,
                constructor,
            },
        );
        Ok(self)
    }

    /// Freeze the registrations
    pub fn build(self) -> Registry {
        Registry {
            entries: self.entries,
        }
    }
}

/// Immutable provider registry
#[derive(Debug)]
pub struct Registry {
    entries: BTreeMap<String, ProviderEntry>,
}

impl Registry {
    /// Registry holding the providers shipped with this crate
    pub fn builtin() -> Result<Self> {
        Ok(RegistryBuilder::new()
            .register(
                dummypay::PROVIDER,
                dummypay::capabilities(),
                dummypay::DEFAULT_PAGE_SIZE,
                dummypay::construct,
            )?
            .register(
                generic::PROVIDER,
                generic::capabilities(),
                generic::DEFAULT_PAGE_SIZE,
                generic::construct,
            )?
            .build())
    }

    /// Registered provider names, sorted
    pub fn providers(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn entry(&self, provider: &str) -> Result<&ProviderEntry> {
        self.entries
            .get(provider)
            .ok_or_else(|| ConnectorError::UnknownProvider(provider.to_string()))
    }

    /// Capabilities a provider declares
    pub fn capabilities(&self, provider: &str) -> Result<&Capabilities> {
        self.entry(provider).map(|e| &e.capabilities)
    }

    /// Construct a connector with the default transport
    pub fn create(
        &self,
        provider: &str,
        connector_name: &str,
        config: &serde_json::Value,
    ) -> Result<PluginHandle> {
        self.create_with_transport(provider, connector_name, config, TransportConfig::default())
    }

    /// Construct a connector with a caller-supplied transport configuration
    pub fn create_with_transport(
        &self,
        provider: &str,
        connector_name: &str,
        config: &serde_json::Value,
        transport: TransportConfig,
    ) -> Result<PluginHandle> {
        let entry = self.entry(provider)?;
        let plugin = (entry.constructor)(PluginContext {
            connector_name,
            config,
            transport,
        })?;
        log::info!("Created connector {} ({})", connector_name, provider);
        Ok(PluginHandle::new(connector_name, plugin))
    }
}

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// Install the process-wide registry
///
/// Fails if one is already installed.
pub fn install(registry: Registry) -> Result<&'static Registry> {
    GLOBAL
        .set(registry)
        .map_err(|_| ConnectorError::InvalidRequest("registry already installed".into()))?;
    GLOBAL
        .get()
        .ok_or_else(|| ConnectorError::InvalidRequest("registry not installed".into()))
}

/// The process-wide registry, if installed
pub fn global() -> Option<&'static Registry> {
    GLOBAL.get()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Capability;

    struct Nothing;

    impl Plugin for Nothing {
        fn name(&self) -> &str {
            "nothing"
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities::new()
        }
    }

    fn construct_nothing(_: PluginContext<'_>) -> Result<Box<dyn Plugin>> {
        Ok(Box::new(Nothing))
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let result = RegistryBuilder::new()
            .register("nothing", [], 10, construct_nothing)
            .unwrap()
            .register("nothing", [], 10, construct_nothing);
        assert!(matches!(result, Err(ConnectorError::DuplicateProvider(_))));
    }

    #[test]
    fn test_unknown_provider() {
        let registry = RegistryBuilder::new().build();
        assert!(matches!(
            registry.create("missing", "c", &serde_json::Value::Null),
            Err(ConnectorError::UnknownProvider(_))
        ));
    }

    #[test]
    fn test_builtin_providers() {
        let registry = Registry::builtin().unwrap();
        let providers: Vec<_> = registry.providers().collect();
        assert_eq!(providers, vec!["dummypay", "generic"]);

        let generic = registry.capabilities("generic").unwrap();
        assert!(generic.contains(&Capability::FetchPayments));
        assert!(generic.contains(&Capability::CreateWebhooks));

        let dummypay = registry.capabilities("dummypay").unwrap();
        assert!(dummypay.contains(&Capability::CreateTransfer));
        assert!(!dummypay.contains(&Capability::CreateWebhooks));
    }

    #[test]
    fn test_global_install_once() {
        let registry = RegistryBuilder::new()
            .register("nothing", [], 10, construct_nothing)
            .unwrap()
            .build();
        let installed = install(registry).unwrap();
        assert!(installed.entry("nothing").is_ok());
        assert!(global().is_some());
        assert!(install(RegistryBuilder::new().build()).is_err());
    }
}
