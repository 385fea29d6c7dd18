//! clarityd — Clarity native messaging host.
//!
//! Launched by the browser with stdin/stdout connected to the extension.
//! Running it by hand exposes a few settings and stats commands. Logs go to
//! stderr because stdout carries protocol frames.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use clarity::host::config::Config;
use clarity::store::{DETAIL_LEVEL, FileStore, KeyValueStore, Settings, UsageStats};
use clarity::{Clarity, DetailLevel, Relay};

/// Clarity native messaging host.
#[derive(Parser)]
#[command(name = "clarityd")]
#[command(version = clarity::PKG_VERSION)]
#[command(about = "Clarity explanation host")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,

    /// Caller origin and manifest path passed by the browser.
    #[arg(hide = true)]
    launcher: Vec<String>,

    /// Passed by the browser on Windows.
    #[arg(long, hide = true)]
    parent_window: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve native messaging frames on stdin/stdout (default)
    Serve,

    /// Print usage statistics as JSON
    Stats,

    /// Store the Gemini API key
    SetKey {
        /// API key (at least 25 characters)
        key: String,
    },

    /// Set the explanation detail level
    SetDetail {
        /// simple, brief or detailed
        level: DetailLevel,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("clarity=info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(config.store_path()?));

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let explainer = config.apply(Clarity::builder().store(store)).build()?;
            let relay = Relay::new(Arc::new(explainer));
            info!(
                version = clarity::PKG_VERSION,
                launcher = ?args.launcher,
                "clarityd serving"
            );
            clarity::host::serve(relay, tokio::io::stdin(), tokio::io::stdout()).await?;
            info!("clarityd exiting");
        }
        Command::Stats => {
            let stats = UsageStats::load(store.as_ref()).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::SetKey { key } => {
            let mut settings = Settings::load(store.as_ref()).await?;
            settings.gemini_key = Some(key);
            settings.save(store.as_ref()).await?;
            println!("API key saved");
        }
        Command::SetDetail { level } => {
            let mut items = serde_json::Map::new();
            items.insert(DETAIL_LEVEL.to_string(), level.as_str().into());
            store.set(items).await?;
            println!("Detail level set to {level}");
        }
    }

    Ok(())
}
