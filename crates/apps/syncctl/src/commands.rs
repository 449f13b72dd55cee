use std::path::PathBuf;

use clap::Subcommand;
use connectors::EntityKind;

#[derive(Subcommand)]
pub enum Commands {
    /// List registered providers and their capabilities
    Providers,

    /// List connectors defined in the connectors file
    Connectors,

    /// Drain one stream of a connector, persisting its cursor after each page
    Sync {
        #[arg(long, help = "Connector name from the connectors file")]
        connector: String,

        /// accounts, balances, external_accounts, payments or others
        #[arg(long)]
        kind: EntityKind,

        #[arg(long, help = "Parent account reference, required for balances")]
        parent: Option<String>,

        #[arg(long, help = "Resource name, required for others")]
        name: Option<String>,

        #[arg(long, help = "Override the connector's page size")]
        page_size: Option<usize>,

        #[arg(long, help = "Stop after this many pages")]
        max_pages: Option<usize>,

        #[arg(long, help = "Print fetched items as JSON lines")]
        print: bool,
    },

    /// Forget a stream's cursor so the next sync starts over
    Reset {
        #[arg(long)]
        connector: String,

        #[arg(long)]
        kind: EntityKind,

        #[arg(long)]
        parent: Option<String>,
    },

    Webhook {
        #[command(subcommand)]
        command: WebhookCommand,
    },
}

#[derive(Subcommand)]
pub enum WebhookCommand {
    /// Register the connector's webhooks under a public base URL
    Register {
        #[arg(long)]
        connector: String,

        #[arg(long, help = "Public URL under which callbacks are received")]
        base_url: String,
    },

    /// Verify and translate a captured webhook body
    Replay {
        #[arg(long)]
        connector: String,

        #[arg(long, help = "Event type, e.g. payment.created")]
        event: String,

        #[arg(long, help = "File holding the raw request body")]
        body: PathBuf,

        #[arg(
            long,
            help = "Signature header value; computed from the secret when omitted"
        )]
        signature: Option<String>,

        #[arg(long, default_value = "X-Signature", help = "Signature header name")]
        header: String,

        #[arg(
            long,
            help = "Signing secret; defaults to the connector's webhookSecret"
        )]
        secret: Option<String>,
    },
}
