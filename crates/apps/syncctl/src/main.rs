//! syncctl - drive payment connectors from the command line
//!
//! Connectors are declared in `connectors.json` in the payconn config
//! directory (or the file given with `--connectors-file`). Cursors are kept
//! under the state directory so repeated syncs only fetch new data.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Parser;
use connectors::{ConnectorsFile, Registry};
use log::error;

mod commands;
mod handlers;

use commands::{Commands, WebhookCommand};
use handlers::{Context, ReplayArgs, SyncArgs};

#[derive(Parser)]
#[command(name = "syncctl")]
#[command(about = "Sync payment provider data through connectors", long_about = None)]
struct Cli {
    #[arg(long, global = true, help = "Path to the connectors file")]
    connectors_file: Option<PathBuf>,

    #[arg(long, global = true, help = "Directory holding sync cursors")]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    if let Err(e) = config::init() {
        error!("Failed to initialize config directory: {}", e);
    }

    let Cli {
        connectors_file,
        state_dir,
        command,
    } = Cli::parse();
    let registry = connectors::registry::install(Registry::builtin()?)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let load_context = || -> Result<Context<'static>> {
        Ok(Context {
            registry,
            connectors: ConnectorsFile::load(connectors_file.as_deref())?,
            state_dir: match &state_dir {
                Some(dir) => dir.clone(),
                None => config::state_dir().context("Could not determine state directory")?,
            },
        })
    };

    match command {
        Commands::Providers => handlers::providers(registry, &mut out)?,
        Commands::Connectors => handlers::connectors(&load_context()?, &mut out)?,
        Commands::Sync {
            connector,
            kind,
            parent,
            name,
            page_size,
            max_pages,
            print,
        } => {
            let args = SyncArgs {
                connector,
                kind,
                parent,
                name,
                page_size,
                max_pages,
                print,
            };
            handlers::sync(&load_context()?, &args, &mut out)?
        }
        Commands::Reset {
            connector,
            kind,
            parent,
        } => handlers::reset(&load_context()?, &connector, kind, parent.as_deref(), &mut out)?,
        Commands::Webhook { command } => match command {
            WebhookCommand::Register {
                connector,
                base_url,
            } => handlers::webhook_register(&load_context()?, &connector, &base_url, &mut out)?,
            WebhookCommand::Replay {
                connector,
                event,
                body,
                signature,
                header,
                secret,
            } => {
                let args = ReplayArgs {
                    connector,
                    event,
                    body,
                    signature,
                    header,
                    secret,
                };
                handlers::webhook_replay(&load_context()?, &args, &mut out)?
            }
        },
    }

    out.flush()?;
    Ok(())
}
