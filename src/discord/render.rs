//! Turns command replies into Discord messages.

use std::time::Duration;

use serenity::all::{
    Context, CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter, CreateMessage,
    Message, ReactionType, Timestamp,
};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::{Colors, Config};
use crate::discord::paginator;
use crate::ui::{EmbedSpec, Outgoing, Reply};

/// Build the serenity embed for `spec` with the configured palette.
pub fn build_embed(spec: &EmbedSpec, colors: &Colors) -> CreateEmbed {
    let mut embed = CreateEmbed::new().color(spec.color.resolve(colors));
    if let Some(title) = &spec.title {
        embed = embed.title(title);
    }
    if let Some(description) = &spec.description {
        embed = embed.description(description);
    }
    if let Some(url) = &spec.url {
        embed = embed.url(url);
    }
    if let Some(author) = &spec.author {
        let mut builder = CreateEmbedAuthor::new(&author.name);
        if let Some(url) = &author.url {
            builder = builder.url(url);
        }
        if let Some(icon) = &author.icon_url {
            builder = builder.icon_url(icon);
        }
        embed = embed.author(builder);
    }
    for field in &spec.fields {
        embed = embed.field(&field.name, &field.value, field.inline);
    }
    if let Some(footer) = &spec.footer {
        embed = embed.footer(CreateEmbedFooter::new(footer));
    }
    if let Some(timestamp) = spec.timestamp {
        if let Ok(timestamp) = Timestamp::from_unix_timestamp(timestamp.timestamp()) {
            embed = embed.timestamp(timestamp);
        }
    }
    embed
}

/// A configured emoji as a reaction, `None` when Discord would reject it.
pub fn reaction(emoji: &str) -> Option<ReactionType> {
    ReactionType::try_from(emoji).ok()
}

pub async fn react(ctx: &Context, msg: &Message, emoji: &str) {
    let Some(reaction) = reaction(emoji) else {
        warn!("Cannot react with invalid emoji {}", emoji);
        return;
    };
    if let Err(e) = msg.react(&ctx.http, reaction).await {
        debug!("Failed to react to message {}: {}", msg.id, e);
    }
}

/// Send everything `reply` asks for in answer to `msg`.
pub async fn send_reply(ctx: &Context, config: &Config, msg: &Message, reply: Reply) {
    let colors = config.colors();

    for outgoing in reply.outgoing {
        let result = match outgoing {
            Outgoing::Embed(embed) => msg
                .channel_id
                .send_message(&ctx.http, CreateMessage::new().embed(build_embed(&embed, &colors)))
                .await
                .map(drop),
            Outgoing::Text(text) => msg.channel_id.say(&ctx.http, text).await.map(drop),
            Outgoing::Paginated(pages) => {
                spawn_paginator(ctx, msg, pages, colors);
                Ok(())
            }
        };
        if let Err(e) = result {
            warn!("Failed to send reply in channel {}: {}", msg.channel_id, e);
        }
    }

    if reply.react_sent {
        react(ctx, msg, &config.appearance.sent_emoji).await;
    }

    if let Some(delay) = reply.delete_invocation_after {
        delete_later(ctx, msg, delay);
    }
}

fn spawn_paginator(ctx: &Context, msg: &Message, pages: Vec<EmbedSpec>, colors: Colors) {
    let ctx = ctx.clone();
    let channel_id = msg.channel_id;
    let author_id = msg.author.id;
    tokio::spawn(async move {
        if let Err(e) = paginator::run(&ctx, channel_id, author_id, &pages, &colors).await {
            warn!("Paginated reply in channel {} failed: {}", channel_id, e);
        }
    });
}

fn delete_later(ctx: &Context, msg: &Message, delay: Duration) {
    let http = ctx.http.clone();
    let channel_id = msg.channel_id;
    let message_id = msg.id;
    tokio::spawn(async move {
        sleep(delay).await;
        if let Err(e) = channel_id.delete_message(&http, message_id).await {
            debug!("Failed to delete message {}: {}", message_id, e);
        }
    });
}
