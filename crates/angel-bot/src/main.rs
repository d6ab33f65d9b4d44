//! Secret Angel organizer bot for Signal.
//!
//! Participants register with a name and wishlist, the organizer splits them
//! into groups and assigns every giver a receiver, and participants look up
//! their assignment. Talks to an external signal-cli daemon.

mod config;
mod processor;
mod sender;

use std::path::Path;
use std::sync::Arc;

use angel_engine::{AssignmentEngine, EngineConfig};
use conversation::{ConversationHandler, Dispatcher, HandlerConfig};
use database::Database;
use signal_daemon::{DaemonConfig, SignalClient};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::BotConfig;
use crate::processor::MessageProcessor;
use crate::sender::SignalSender;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = BotConfig::from_env()?;

    if let Some(parent) = config.database_path().and_then(|p| Path::new(p).parent()) {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;
    info!("Database ready at {}", config.database_url);

    let mut daemon_config = DaemonConfig::new(&config.signal_daemon_url);
    if let Some(ref account) = config.signal_daemon_account {
        daemon_config = daemon_config.with_account(account);
    }
    info!("Connecting to signal daemon at {}", daemon_config.base_url);
    let client = SignalClient::connect(daemon_config).await?;

    let engine = AssignmentEngine::new(
        db.clone(),
        EngineConfig {
            max_attempts: config.match_max_attempts,
        },
    );
    let handler = ConversationHandler::new(
        db.clone(),
        engine,
        Arc::new(SignalSender::new(client.clone())),
        HandlerConfig::new(&config.admin_id).with_rate_limit(config.rate_limit),
    );
    let dispatcher = Dispatcher::new(Arc::new(handler));

    let processor = MessageProcessor::new(client, dispatcher, config.bot_number.clone());
    processor.run_with_shutdown(shutdown_signal()).await?;

    db.close().await;
    info!("Stopped");
    Ok(())
}
