//! Discord bot client.
//!
//! Gateway events are forwarded into a channel and processed by one loop,
//! while the connection itself is restarted with backoff when it fails.

use std::sync::Arc;
use std::time::Duration;

use backon::BackoffBuilder;
use serenity::async_trait;
use serenity::http::HttpBuilder;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use serenity::Client;
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::commands::context::Services;
use crate::config::Config;
use crate::discord::directory::GuildDirectory;
use crate::discord::handler::ModmailHandler;
use crate::discord::threads::DiscordThreads;
use crate::logs::LogStore;
use crate::settings::SettingsStore;
use crate::translations::Translator;

/// Longest wait between reconnection attempts.
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub enum DiscordBotEvent {
    /// Bot connected and ready.
    Ready(Ready),
    /// Message received, in a guild or a direct message.
    Message { context: Context, message: Message },
    Disconnected,
}

struct DiscordBotEvents {
    discord_events_tx: mpsc::UnboundedSender<DiscordBotEvent>,
}

impl DiscordBotEvents {
    fn new(discord_events_tx: mpsc::UnboundedSender<DiscordBotEvent>) -> Self {
        Self { discord_events_tx }
    }

    fn forward(&self, event: DiscordBotEvent) {
        if let Err(error) = self.discord_events_tx.send(event) {
            warn!("Failed to process discord event: {}", error);
        }
    }
}

#[async_trait]
impl EventHandler for DiscordBotEvents {
    async fn ready(&self, _context: Context, ready: Ready) {
        self.forward(DiscordBotEvent::Ready(ready));
    }

    async fn message(&self, context: Context, message: Message) {
        self.forward(DiscordBotEvent::Message { context, message });
    }
}

/// Builder for the Discord bot.
pub struct DiscordBotBuilder {
    config: Arc<Config>,
    settings: Arc<SettingsStore>,
    logs: LogStore,
    translator: Arc<Translator>,
    shutdown_rx: watch::Receiver<bool>,
}

impl DiscordBotBuilder {
    pub fn new(
        config: Arc<Config>,
        settings: Arc<SettingsStore>,
        logs: LogStore,
        translator: Arc<Translator>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            config,
            settings,
            logs,
            translator,
            shutdown_rx,
        }
    }

    pub async fn build(self) -> anyhow::Result<DiscordBot> {
        let token = self.config.discord.token.clone();
        let (discord_events_tx, discord_events_rx) = mpsc::unbounded_channel::<DiscordBotEvent>();

        let client = build_client(&token, discord_events_tx.clone()).await?;
        let http = client.http.clone();

        let threads = DiscordThreads::new(
            http.clone(),
            self.config.clone(),
            self.settings.clone(),
            self.logs.clone(),
            self.translator.clone(),
        );
        let services = Services {
            config: self.config.clone(),
            settings: self.settings,
            logs: self.logs,
            threads: threads.clone(),
            directory: Arc::new(GuildDirectory::new(http, self.config)),
            translator: self.translator,
        };

        Ok(DiscordBot {
            client: Some(client),
            token,
            handler: ModmailHandler::new(services, threads),
            discord_events_rx,
            discord_events_tx,
            shutdown_rx: self.shutdown_rx,
        })
    }
}

async fn build_client(
    token: &str,
    discord_events_tx: mpsc::UnboundedSender<DiscordBotEvent>,
) -> anyhow::Result<Client> {
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_MEMBERS;

    let reqwest_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .connect_timeout(Duration::from_secs(10))
        .build()?;

    let http = HttpBuilder::new(token).client(reqwest_client).build();

    let events = DiscordBotEvents::new(discord_events_tx);
    let client = serenity::client::ClientBuilder::new_with_http(http, intents)
        .event_handler(events)
        .await?;
    Ok(client)
}

/// 5s initial, 5min max, factor 1.1, with jitter, unlimited retries.
fn discord_backoff() -> impl Iterator<Item = Duration> {
    backon::ExponentialBuilder::default()
        .with_min_delay(Duration::from_secs(5))
        .with_max_delay(MAX_RECONNECT_DELAY)
        .with_factor(1.1)
        .with_jitter()
        .without_max_times()
        .build()
}

pub struct DiscordBot {
    client: Option<Client>,
    token: String,
    handler: ModmailHandler,
    discord_events_rx: mpsc::UnboundedReceiver<DiscordBotEvent>,
    discord_events_tx: mpsc::UnboundedSender<DiscordBotEvent>,
    shutdown_rx: watch::Receiver<bool>,
}

impl DiscordBot {
    pub async fn run(mut self) {
        let shard_manager = self.client.as_ref().map(|c| c.shard_manager.clone());
        let mut shutdown_rx = self.shutdown_rx.clone();

        tokio::select! {
            _ = Self::run_connection(&mut self.client, &self.token, &self.discord_events_tx) => {},
            _ = Self::process_events(&mut self.discord_events_rx, &self.handler, &mut self.shutdown_rx) => {},
            _ = async {
                loop {
                    if shutdown_rx.changed().await.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
                if let Some(ref manager) = shard_manager {
                    info!("Initiating graceful Discord shutdown...");
                    manager.shutdown_all().await;
                    info!("Discord shutdown complete");
                }
            } => {}
        }
        info!("Discord task ended");
    }

    async fn run_connection(
        client: &mut Option<Client>,
        token: &str,
        discord_events_tx: &mpsc::UnboundedSender<DiscordBotEvent>,
    ) {
        let mut backoff = discord_backoff();

        loop {
            info!("Connecting to Discord...");

            let mut client = match client.take() {
                Some(client) => client,
                None => match build_client(token, discord_events_tx.clone()).await {
                    Ok(client) => {
                        backoff = discord_backoff();
                        client
                    }
                    Err(e) => {
                        error!("Failed to rebuild Discord client: {}", e);
                        let delay = backoff.next().unwrap_or(MAX_RECONNECT_DELAY);
                        warn!("Retrying in {:.1}s...", delay.as_secs_f64());
                        sleep(delay).await;
                        continue;
                    }
                },
            };

            match client.start().await {
                Ok(()) => {
                    info!("Discord client disconnected normally");
                    if let Err(error) = discord_events_tx.send(DiscordBotEvent::Disconnected) {
                        warn!("Failed to process discord event: {}", error);
                    }
                    break;
                }
                Err(e) => {
                    error!("Discord client error: {}", e);
                    let delay = backoff.next().unwrap_or(MAX_RECONNECT_DELAY);
                    warn!(
                        "Discord disconnected. Reconnecting in {:.1}s...",
                        delay.as_secs_f64(),
                    );
                    if let Err(error) = discord_events_tx.send(DiscordBotEvent::Disconnected) {
                        warn!("Failed to process discord event: {}", error);
                    }
                    sleep(delay).await;
                }
            }
        }
    }

    async fn process_events(
        discord_events_rx: &mut mpsc::UnboundedReceiver<DiscordBotEvent>,
        handler: &ModmailHandler,
        shutdown_rx: &mut watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                event = discord_events_rx.recv() => {
                    match event {
                        Some(DiscordBotEvent::Ready(ready)) => handler.handle_ready(&ready).await,
                        Some(DiscordBotEvent::Message { context, message }) => {
                            handler.handle_message(context, message).await;
                        }
                        Some(DiscordBotEvent::Disconnected) => {
                            debug!("Discord connection lost");
                        }
                        None => {
                            debug!("Discord events channel closed.");
                            break;
                        }
                    }
                }

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("Shutdown signal received, stopping event processing");
                        break;
                    }
                }
            }
        }
    }
}
