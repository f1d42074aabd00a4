//! Modmail - Discord support-ticket bot
//!
//! Relays direct messages sent to the bot into staff thread channels and
//! gives staff commands to answer, annotate and close those threads.

mod commands;
mod common;
mod config;
mod discord;
mod logs;
mod permissions;
mod settings;
mod threads;
mod time;
mod translations;
mod ui;

use std::sync::Arc;

use anyhow::Result;
use tokio::signal;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use config::{env::get_config_path, load_and_validate};
use discord::DiscordBotBuilder;
use logs::LogStore;
use settings::SettingsStore;
use translations::Translator;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Modmail v{} starting...", env!("CARGO_PKG_VERSION"));

    let config_path = get_config_path();
    info!("Loading configuration from {}...", config_path);

    let config = load_and_validate(&config_path).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        error!("Please ensure {} exists and is properly formatted.", config_path);
        e
    })?;
    let config = Arc::new(config);

    info!("Configuration loaded successfully");
    info!("  Guild: {}", config.discord.guild_id);
    info!("  Modmail guild: {}", config.modmail_guild_id());
    info!("  Prefix: {}", config.discord.prefix);

    let translator = Arc::new(Translator::load(
        &config.language_catalog_path(),
        &config.language.language,
    )?);
    info!("  Language: {}", translator.language());

    let settings = Arc::new(SettingsStore::open(config.settings_path()).await?);
    let logs = LogStore::open(
        &config.logs_database_path(),
        config.discord.guild_id,
        config.log_base_url(),
    )
    .await?;
    info!("Storage ready in {}", config.storage.data_dir.display());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let bot = DiscordBotBuilder::new(config, settings, logs, translator, shutdown_rx)
        .build()
        .await?;

    info!("Starting Discord bot...");
    let mut discord_task = tokio::spawn(bot.run());

    let shutdown = tokio::select! {
        biased;
        _ = shutdown_signal() => {
            info!("Shutdown signal received - disconnecting...");
            true
        }
        _ = &mut discord_task => false,
    };

    if shutdown {
        if let Err(e) = shutdown_tx.send(true) {
            debug!("Shutdown channel closed (bot already exited): {}", e);
        }
        let timeout = tokio::time::Duration::from_secs(5);
        match tokio::time::timeout(timeout, discord_task).await {
            Ok(Ok(())) => info!("Discord client stopped gracefully"),
            Ok(Err(e)) => warn!("Discord task panicked: {}", e),
            Err(_) => warn!("Discord shutdown timed out"),
        }
    }

    info!("Exiting...");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
