//! Command handlers
//!
//! Every handler writes its output to the given writer so tests can
//! capture it.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use chrono::Utc;
use connectors::models::{
    CreateWebhooksRequest, Metadata, SECRET_METADATA_KEY, TranslateWebhookRequest,
    VerifyWebhookRequest,
};
use connectors::{
    ConnectorDefinition, ConnectorsFile, CursorStore, DrainOptions, EntityKind, FileCursorStore,
    PluginHandle, PspAccount, Registry, StreamKey, WebhookConfig, WebhookRequest, drain,
};
use log::info;

/// Everything a command needs besides its own arguments
pub struct Context<'a> {
    pub registry: &'a Registry,
    pub connectors: ConnectorsFile,
    pub state_dir: PathBuf,
}

impl<'a> Context<'a> {
    fn definition(&self, connector: &str) -> Result<&ConnectorDefinition> {
        self.connectors
            .get(connector)
            .with_context(|| format!("Unknown connector: {}", connector))
    }

    fn plugin(&self, connector: &str) -> Result<(PluginHandle, &ConnectorDefinition)> {
        let definition = self.definition(connector)?;
        let handle = self
            .registry
            .create(&definition.provider, &definition.name, &definition.config)
            .with_context(|| format!("Failed to create connector {}", connector))?;
        Ok((handle, definition))
    }

    fn store(&self) -> Result<FileCursorStore> {
        FileCursorStore::new(&self.state_dir).with_context(|| {
            format!("Failed to open state directory {}", self.state_dir.display())
        })
    }
}

/// Options of the `sync` command
#[derive(Debug, Clone)]
pub struct SyncArgs {
    pub connector: String,
    pub kind: EntityKind,
    pub parent: Option<String>,
    pub name: Option<String>,
    pub page_size: Option<usize>,
    pub max_pages: Option<usize>,
    pub print: bool,
}

fn stream_key(connector: &str, kind: EntityKind, parent: Option<&str>) -> StreamKey {
    let stream = StreamKey::new(connector, kind);
    match parent {
        Some(parent) => stream.with_parent(parent),
        None => stream,
    }
}

pub fn providers(registry: &Registry, out: &mut impl Write) -> Result<()> {
    for name in registry.providers() {
        let entry = registry.entry(name)?;
        let capabilities: Vec<&str> = entry.capabilities.iter().map(|c| c.as_str()).collect();
        writeln!(
            out,
            "{}\tpage_size={}\t{}",
            name,
            entry.default_page_size,
            capabilities.join(",")
        )?;
    }
    Ok(())
}

pub fn connectors(ctx: &Context<'_>, out: &mut impl Write) -> Result<()> {
    if ctx.connectors.connectors.is_empty() {
        writeln!(out, "No connectors configured")?;
        return Ok(());
    }
    for definition in &ctx.connectors.connectors {
        writeln!(
            out,
            "{}\t{}\tpage_size={}",
            definition.name, definition.provider, definition.page_size
        )?;
    }
    Ok(())
}

pub fn sync(ctx: &Context<'_>, args: &SyncArgs, out: &mut impl Write) -> Result<()> {
    let (handle, definition) = ctx.plugin(&args.connector)?;

    let parent = match args.kind {
        EntityKind::Balances => Some(
            args.parent
                .as_deref()
                .context("Syncing balances requires --parent <account reference>")?,
        ),
        EntityKind::Others => Some(
            args.name
                .as_deref()
                .context("Syncing others requires --name <resource>")?,
        ),
        _ => None,
    };

    let mut options = DrainOptions::new(args.page_size.unwrap_or(definition.page_size));
    options.max_pages = args.max_pages;
    match (args.kind, parent) {
        (EntityKind::Balances, Some(reference)) => {
            let account = PspAccount::new(reference, Utc::now(), serde_json::Value::Null);
            options.from_payload = Some(serde_json::to_vec(&account)?);
        }
        (EntityKind::Others, Some(name)) => options.other_name = Some(name.to_string()),
        _ => {}
    }

    let store = ctx.store()?;
    let stream = stream_key(&definition.name, args.kind, parent);
    let mut lines = Vec::new();
    let stats = drain(&handle, &stream, &store, &options, |page| {
        if args.print {
            lines.extend(page.to_json()?);
        }
        Ok(())
    })
    .with_context(|| format!("Sync of {} failed", stream))?;

    for line in &lines {
        writeln!(out, "{}", serde_json::to_string(line)?)?;
    }
    info!(
        "{}: {} items in {} pages{}",
        stream,
        stats.items,
        stats.pages,
        if stats.has_more { ", more remaining" } else { "" }
    );
    Ok(())
}

pub fn reset(
    ctx: &Context<'_>,
    connector: &str,
    kind: EntityKind,
    parent: Option<&str>,
    out: &mut impl Write,
) -> Result<()> {
    let definition = ctx.definition(connector)?;
    let stream = stream_key(&definition.name, kind, parent);
    ctx.store()?.delete(&stream)?;
    writeln!(out, "Reset {}", stream)?;
    Ok(())
}

pub fn webhook_register(
    ctx: &Context<'_>,
    connector: &str,
    base_url: &str,
    out: &mut impl Write,
) -> Result<()> {
    let (handle, definition) = ctx.plugin(connector)?;
    let response = handle.create_webhooks(&CreateWebhooksRequest {
        webhook_base_url: base_url.to_string(),
        connector_id: definition.name.clone(),
    })?;

    for config in &response.configs {
        writeln!(out, "{}\t{}", config.name, config.url_path)?;
    }
    info!(
        "{}: {} webhook endpoints, {} provider records",
        definition.name,
        response.configs.len(),
        response.others.len()
    );
    Ok(())
}

/// Options of the `webhook replay` command
#[derive(Debug, Clone)]
pub struct ReplayArgs {
    pub connector: String,
    pub event: String,
    pub body: PathBuf,
    pub signature: Option<String>,
    pub header: String,
    pub secret: Option<String>,
}

pub fn webhook_replay(ctx: &Context<'_>, args: &ReplayArgs, out: &mut impl Write) -> Result<()> {
    let (handle, definition) = ctx.plugin(&args.connector)?;
    let body = read_body(&args.body)?;

    let secret = args
        .secret
        .clone()
        .or_else(|| {
            definition
                .config
                .get("webhookSecret")
                .and_then(|v| v.as_str())
                .map(str::to_string)
        })
        .filter(|s| !s.is_empty())
        .context("No webhook secret: pass --secret or set webhookSecret on the connector")?;

    let signature = match &args.signature {
        Some(signature) => signature.clone(),
        None => connectors::webhooks::sign(&secret, &body)?,
    };

    let mut metadata = Metadata::new();
    metadata.insert(SECRET_METADATA_KEY.to_string(), secret);
    let config = WebhookConfig {
        name: args.event.clone(),
        url_path: format!("/{}", args.event.replace('.', "/")),
        metadata,
    };
    let webhook = WebhookRequest::new(body).with_header(args.header.as_str(), signature);

    handle.verify_webhook(&VerifyWebhookRequest {
        config: config.clone(),
        webhook: webhook.clone(),
    })?;
    let responses = handle.translate_webhook(&TranslateWebhookRequest {
        name: args.event.clone(),
        config,
        webhook,
    })?;

    for response in &responses {
        writeln!(out, "{}", serde_json::to_string(response)?)?;
    }
    Ok(())
}

fn read_body(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        bail!("Webhook body file not found: {}", path.display());
    }
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn seed_payments(dir: &Path, n: usize) {
        let payments: Vec<_> = (0..n)
            .map(|i| {
                json!({
                    "id": format!("pay-{}", i),
                    "createdAt": format!("2024-03-01T10:0{}:00Z", i),
                    "amountInMinors": 100 * (i + 1),
                    "currency": "EUR",
                    "type": "PAY_IN",
                    "status": "SUCCEEDED"
                })
            })
            .collect();
        fs::write(
            dir.join("payments.json"),
            serde_json::to_vec(&payments).unwrap(),
        )
        .unwrap();
    }

    fn context<'a>(registry: &'a Registry, data: &Path, state: &Path) -> Context<'a> {
        let connectors = ConnectorsFile::from_json(
            &json!({
                "connectors": [
                    {"provider": "dummypay", "name": "local", "pageSize": 2,
                     "config": {"directory": data}}
                ]
            })
            .to_string(),
        )
        .unwrap();
        Context {
            registry,
            connectors,
            state_dir: state.to_path_buf(),
        }
    }

    fn sync_args(kind: EntityKind) -> SyncArgs {
        SyncArgs {
            connector: "local".into(),
            kind,
            parent: None,
            name: None,
            page_size: None,
            max_pages: None,
            print: true,
        }
    }

    fn run_sync(ctx: &Context<'_>, args: &SyncArgs) -> Vec<String> {
        let mut out = Vec::new();
        sync(ctx, args, &mut out).unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_sync_resume_and_reset() {
        let data = TempDir::new().unwrap();
        let state = TempDir::new().unwrap();
        seed_payments(data.path(), 5);
        let registry = Registry::builtin().unwrap();
        let ctx = context(&registry, data.path(), state.path());
        let args = sync_args(EntityKind::Payments);

        let first = run_sync(&ctx, &args);
        assert_eq!(first.len(), 5);
        assert!(first[0].contains("pay-0"));

        assert!(run_sync(&ctx, &args).is_empty());

        let mut out = Vec::new();
        reset(&ctx, "local", EntityKind::Payments, None, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().trim(), "Reset local/payments");
        assert_eq!(run_sync(&ctx, &args).len(), 5);
    }

    #[test]
    fn test_sync_respects_max_pages() {
        let data = TempDir::new().unwrap();
        let state = TempDir::new().unwrap();
        seed_payments(data.path(), 5);
        let registry = Registry::builtin().unwrap();
        let ctx = context(&registry, data.path(), state.path());

        let mut args = sync_args(EntityKind::Payments);
        args.max_pages = Some(1);
        assert_eq!(run_sync(&ctx, &args).len(), 2);
        assert_eq!(run_sync(&ctx, &args).len(), 2);
        assert_eq!(run_sync(&ctx, &args).len(), 1);
    }

    #[test]
    fn test_balances_require_parent() {
        let data = TempDir::new().unwrap();
        let state = TempDir::new().unwrap();
        let registry = Registry::builtin().unwrap();
        let ctx = context(&registry, data.path(), state.path());

        let mut out = Vec::new();
        let err = sync(&ctx, &sync_args(EntityKind::Balances), &mut out).unwrap_err();
        assert!(err.to_string().contains("--parent"));
    }

    #[test]
    fn test_unknown_connector() {
        let data = TempDir::new().unwrap();
        let state = TempDir::new().unwrap();
        let registry = Registry::builtin().unwrap();
        let ctx = context(&registry, data.path(), state.path());

        let mut args = sync_args(EntityKind::Payments);
        args.connector = "missing".into();
        let mut out = Vec::new();
        assert!(sync(&ctx, &args, &mut out).is_err());
    }

    #[test]
    fn test_providers_lists_builtins() {
        let registry = Registry::builtin().unwrap();
        let mut out = Vec::new();
        providers(&registry, &mut out).unwrap();

        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("dummypay"));
        assert!(output.contains("generic"));
        assert!(output.contains("fetch_payments"));
    }

    #[test]
    fn test_connectors_listing() {
        let data = TempDir::new().unwrap();
        let state = TempDir::new().unwrap();
        let registry = Registry::builtin().unwrap();
        let ctx = context(&registry, data.path(), state.path());

        let mut out = Vec::new();
        connectors(&ctx, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap().trim(),
            "local\tdummypay\tpage_size=2"
        );
    }

    #[test]
    fn test_replay_without_webhook_support_fails() {
        let data = TempDir::new().unwrap();
        let state = TempDir::new().unwrap();
        let registry = Registry::builtin().unwrap();
        let ctx = context(&registry, data.path(), state.path());

        let body = data.path().join("body.json");
        fs::write(&body, b"{}").unwrap();
        let args = ReplayArgs {
            connector: "local".into(),
            event: "payment.created".into(),
            body,
            signature: None,
            header: "X-Signature".into(),
            secret: Some("s3cr3t".into()),
        };
        let mut out = Vec::new();
        assert!(webhook_replay(&ctx, &args, &mut out).is_err());
    }
}
