use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::sync::Arc;
use teloxide::prelude::*;

use clubwarden::brawl::BrawlStarsClient;
use clubwarden::cli::{Cli, Commands};
use clubwarden::conversation;
use clubwarden::core::{config, init_logger};
use clubwarden::fsm::{self, supervise_conversations, Deps, RestartPolicy, SystemClock, TaskScope};
use clubwarden::storage::{create_pool, SqliteStateStore};
use clubwarden::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps, TelegramMessenger};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, database, bot creation)
/// or the conversation loop stops on a fatal error.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Panics inside tasks are caught by the supervisor; this only makes sure they reach the log
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
        if let Some(msg) = panic_info.payload().downcast_ref::<&str>() {
            log::error!("Panic message: {}", msg);
        }
    }));

    // Load environment variables from .env if present
    let _ = dotenv();

    // Initialize logger (console + file)
    init_logger(&config::LOG_FILE_PATH)?;

    match cli.command {
        Some(Commands::Migrate) => run_migrate(),
        Some(Commands::Run) => run_bot().await,
        None => {
            log::info!("No command specified, running bot in default mode");
            run_bot().await
        }
    }
}

/// Opens the database, which applies any pending migrations, and exits.
fn run_migrate() -> Result<()> {
    create_pool(&config::DATABASE_PATH)
        .with_context(|| format!("Failed to migrate database {}", config::DATABASE_PATH.as_str()))?;
    log::info!("Database {} is up to date", config::DATABASE_PATH.as_str());
    Ok(())
}

async fn run_bot() -> Result<()> {
    log::info!("Starting bot...");

    let bot = create_bot()?;
    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let db_pool = Arc::new(create_pool(&config::DATABASE_PATH).context("Failed to create database pool")?);

    let tasks = TaskScope::new();
    let players = BrawlStarsClient::from_env().context("Failed to build Brawl Stars client")?;
    let deps = Deps::new(
        Arc::new(TelegramMessenger::new(bot.clone())),
        Arc::new(players),
        Arc::new(SystemClock::from_config()),
        Arc::clone(&db_pool),
        tasks.clone(),
        config::admin::ADMIN_IDS.iter().copied(),
    );
    if config::admin::ADMIN_IDS.is_empty() {
        log::warn!("ADMIN_IDS is empty, club settings can only be changed in the database");
    }

    let registry = conversation::registry().context("State handler registry is incomplete")?;
    let store = Arc::new(SqliteStateStore::new(Arc::clone(&db_pool)));
    let dispatcher = Arc::new(fsm::Dispatcher::new(registry, store, deps));

    let (updates_tx, updates_rx) = fsm::channel(config::fsm::CHANNEL_CAPACITY);
    let handler = schema(HandlerDeps::new(Arc::clone(&db_pool), updates_tx));

    let mut conversations = tokio::spawn(supervise_conversations(
        dispatcher,
        updates_rx,
        RestartPolicy::default(),
        tasks.cancel_token().child_token(),
    ));

    let mut telegram = Dispatcher::builder(bot, handler)
        .dependencies(DependencyMap::new())
        .enable_ctrlc_handler()
        .build();

    log::info!("Bot started, waiting for updates");

    let finished_first = tokio::select! {
        () = telegram.dispatch() => None,
        joined = &mut conversations => Some(joined),
    };

    let report = match finished_first {
        Some(joined) => joined.context("Conversation loop task failed")?,
        None => {
            log::info!("Telegram dispatcher stopped, draining queued updates");
            // Dropping the dispatcher closes the update channel
            drop(telegram);
            conversations.await.context("Conversation loop task failed")?
        }
    };

    tasks.shutdown().await;

    let restarts = report.into_result()?;
    log::info!("Conversation loop finished after {} restarts", restarts);
    Ok(())
}
