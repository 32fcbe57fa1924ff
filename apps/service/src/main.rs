#![warn(clippy::all)]

mod commands;
mod config;
mod database;
mod monitoring;
mod pool;

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

use commands::CommandHandler;
use config::Config;
use database::{LibsqlStore, initialize_database};
use monitoring::{DigestNotifier, HttpProber, Sweeper, TelegramNotifier};
use pool::{LibsqlManager, LibsqlPool};

#[derive(Debug, Parser)]
#[command(name = "sitewatch-service", about = "Telegram bot that watches registered sites")]
struct Cli {
    /// Path to the TOML config file (created with defaults if missing)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logger::init_tracing();

    let cli = Cli::parse();
    let config = Config::from_config(cli.config.as_deref())?;
    debug!("{config}");

    // An unusable token is fatal before any loop starts.
    let token = env::var("TELEGRAM_TOKEN").context("TELEGRAM_TOKEN is not set")?;
    let bot = Arc::new(telegram::Bot::new(&token)?);
    let me = bot.get_me().await.context("Telegram credential check failed")?;
    info!(bot_id = me.id, "Telegram credentials verified");

    let database = libsql::Builder::new_local(&config.database.path).build().await?;
    let setup_conn = database.connect()?;
    initialize_database(&setup_conn).await?;

    let pool: LibsqlPool = LibsqlPool::builder(LibsqlManager::new(database))
        .build()
        .context("failed to build database pool")?;

    let store = Arc::new(LibsqlStore::new_from_pool(pool));
    let prober = Arc::new(HttpProber::new(config.monitor.probe_timeout_ms)?);
    let notifier = Arc::new(TelegramNotifier::new(bot.clone()));

    let sweeper = Sweeper::new(store.clone(), prober.clone(), notifier.clone());
    tokio::spawn(sweeper.run(Duration::from_secs(config.monitor.sweep_period_secs)));

    let digest = DigestNotifier::new(store.clone(), prober.clone(), notifier);
    tokio::spawn(digest.run(Duration::from_secs(config.monitor.digest_period_secs)));

    CommandHandler::new(bot, store, prober).run(config.telegram.poll_timeout_secs).await;

    Ok(())
}
