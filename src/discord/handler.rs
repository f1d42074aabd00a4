//! Routing of gateway messages.
//!
//! Direct messages go to the relay. Guild messages starting with the prefix
//! run as commands; anything else typed in a thread channel is logged as
//! staff chatter.

use std::sync::Arc;

use chrono::Utc;
use serenity::all::{Context, Message, Ready};
use tracing::{debug, error, info};

use crate::commands::context::{Invocation, Services};
use crate::commands::dispatch::{self, Planned};
use crate::config::Config;
use crate::discord::directory::user_ref;
use crate::discord::render;
use crate::discord::threads::{DiscordThreads, Relay};
use crate::permissions::Invoker;
use crate::threads::ThreadManager;

/// Whether the author owns the guild or holds an administrator role there.
fn is_guild_admin(ctx: &Context, msg: &Message) -> bool {
    let Some(guild_id) = msg.guild_id else {
        return false;
    };
    let Some(guild) = ctx.cache.guild(guild_id) else {
        return false;
    };
    if guild.owner_id == msg.author.id {
        return true;
    }
    let Some(member) = msg.member.as_ref() else {
        return false;
    };
    member
        .roles
        .iter()
        .filter_map(|id| guild.roles.get(id))
        .any(|role| role.permissions.administrator())
}

fn invocation(ctx: &Context, msg: &Message, config: &Config) -> Invocation {
    let role_ids = msg
        .member
        .as_ref()
        .map(|member| member.roles.iter().map(|id| id.get()).collect())
        .unwrap_or_default();
    let guild_id = msg.guild_id.map(|id| id.get());

    Invocation {
        author: user_ref(&msg.author),
        invoker: Invoker {
            user_id: msg.author.id.get(),
            role_ids,
            is_guild_admin: is_guild_admin(ctx, msg),
            in_modmail_guild: guild_id == Some(config.modmail_guild_id()),
        },
        guild_id,
        channel_id: msg.channel_id.get(),
        message_id: msg.id.get(),
        attachments: msg.attachments.iter().map(|a| a.url.clone()).collect(),
        now: Utc::now(),
    }
}

/// Gateway event handler of the modmail bot.
pub struct ModmailHandler {
    services: Services,
    threads: Arc<DiscordThreads>,
}

impl ModmailHandler {
    pub fn new(services: Services, threads: Arc<DiscordThreads>) -> Self {
        Self { services, threads }
    }

    pub async fn handle_ready(&self, ready: &Ready) {
        info!(
            "Discord bot connected as {} ({} guilds)",
            ready.user.name,
            ready.guilds.len()
        );
        if let Err(e) = self.threads.restore().await {
            error!("Failed to restore open threads: {}", e);
        }
    }

    pub async fn handle_message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        if msg.guild_id.is_none() {
            self.relay(&ctx, &msg).await;
            return;
        }

        match dispatch::parse_command(&self.services, msg.content.trim()).await {
            Some(planned) => self.spawn_command(ctx, msg, planned),
            None => {
                if let Some(thread) = self.threads.find_by_channel(msg.channel_id.get()).await {
                    let author = user_ref(&msg.author);
                    self.threads.log_internal(&thread, &author, &msg).await;
                }
            }
        }
    }

    async fn relay(&self, ctx: &Context, msg: &Message) {
        let author = user_ref(&msg.author);
        let appearance = &self.services.config.appearance;
        match self.threads.relay_from_recipient(&author, msg).await {
            Ok(Relay::Sent) => render::react(ctx, msg, &appearance.sent_emoji).await,
            Ok(Relay::Blocked | Relay::Disabled) => {
                render::react(ctx, msg, &appearance.blocked_emoji).await
            }
            Err(e) => error!("Failed to relay message from {}: {}", author.tag(), e),
        }
    }

    /// Commands run on their own task so a slow one does not hold up the
    /// event loop.
    fn spawn_command(&self, ctx: Context, msg: Message, planned: Planned) {
        let services = self.services.clone();
        tokio::spawn(async move {
            debug!(
                "{} invoked {} in {}",
                msg.author.name,
                planned.spec.qualified_name(),
                msg.channel_id
            );
            let invocation = invocation(&ctx, &msg, &services.config);
            let typing = planned
                .spec
                .typing
                .then(|| msg.channel_id.start_typing(&ctx.http));

            let reply = dispatch::run(&services, &invocation, &planned).await;
            drop(typing);

            render::send_reply(&ctx, &services.config, &msg, reply).await;
        });
    }
}
