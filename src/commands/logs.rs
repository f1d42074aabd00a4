//! Log lookups: `loglink` and the `logs` group.

use tracing::info;

use crate::commands::context::Context;
use crate::commands::parse;
use crate::common::error::{CommandError, CommandResult};
use crate::logs::LogEntry;
use crate::time::human_duration_since;
use crate::ui::{format_preview, EmbedSpec, Reply};

const DEFAULT_AVATAR: &str = "https://cdn.discordapp.com/embed/avatars/0.png";

/// `loglink`
pub async fn loglink(ctx: &Context<'_>) -> CommandResult<Reply> {
    let thread = ctx.require_thread()?;
    let embed = match ctx.services.logs.get_log_link(thread.channel_id).await? {
        Some(link) => EmbedSpec::main().description(link),
        None => EmbedSpec::error().description(ctx.tr("No log entry exists for this thread.")),
    };
    Ok(Reply::embed(embed))
}

/// One page per log entry.
fn log_embeds(ctx: &Context<'_>, entries: &[LogEntry], icon: Option<String>) -> Vec<EmbedSpec> {
    let title = ctx.tr_fmt(
        "Total Results Found ({count})",
        &[("count", &entries.len().to_string())],
    );

    entries
        .iter()
        .map(|entry| {
            let url = ctx.services.logs.log_url(&entry.key);
            let closed_by = match &entry.closer {
                Some(closer) => format!("<@{}>", closer.id),
                None => ctx.tr("Unknown").to_string(),
            };

            let mut embed = EmbedSpec::main()
                .author(
                    format!("{} - {}", title, entry.recipient.tag()),
                    Some(url.clone()),
                    icon.clone(),
                )
                .url(url.clone())
                .timestamp(entry.created_at)
                .field(
                    ctx.tr("Created"),
                    human_duration_since(entry.created_at, ctx.now()),
                    true,
                )
                .field(ctx.tr("Closed By"), closed_by, true);

            if entry.recipient.id != entry.creator.id {
                embed = embed.field(ctx.tr("Created by"), format!("<@{}>", entry.creator.id), true);
            }
            embed = embed.field(ctx.tr("Preview"), format_preview(&entry.messages), false);

            embed = match entry.closer {
                Some(_) => embed.field(ctx.tr("Link"), url, true),
                None => embed.field(ctx.tr("Log Key"), format!("`{}`", entry.key), true),
            };
            embed.footer(ctx.tr_fmt(
                "Recipient ID: {id}",
                &[("id", &entry.recipient.id.to_string())],
            ))
        })
        .collect()
}

async fn main_guild_icon(ctx: &Context<'_>) -> Option<String> {
    ctx.services
        .directory
        .guild(ctx.config().discord.guild_id)
        .await?
        .icon_url
}

fn empty(description: String) -> Reply {
    Reply::embed(EmbedSpec::error().description(description))
}

/// `logs [user]`: closed logs of a user, newest first.
pub async fn logs(ctx: &Context<'_>, args: &str) -> CommandResult<Reply> {
    let target = ctx.user_or_recipient(parse::rest_opt(args), "member").await?;
    let icon = target
        .avatar_url()
        .unwrap_or_else(|| DEFAULT_AVATAR.to_string());

    let mut entries: Vec<LogEntry> = ctx
        .services
        .logs
        .get_user_logs(target.id)
        .await?
        .into_iter()
        .filter(|entry| !entry.open)
        .collect();
    if entries.is_empty() {
        return Ok(empty(
            ctx.tr("This user does not have any previous logs.").to_string(),
        ));
    }
    entries.reverse();

    Ok(Reply::pages(log_embeds(ctx, &entries, Some(icon))))
}

/// `logs closed-by [user]`
pub async fn logs_closed_by(ctx: &Context<'_>, args: &str) -> CommandResult<Reply> {
    let target = ctx.user_or_author(parse::rest_opt(args)).await?;
    let entries = ctx.services.logs.find_closed_by(target.id).await?;
    if entries.is_empty() {
        return Ok(empty(
            ctx.tr("No log entries have been found for that query").to_string(),
        ));
    }

    let icon = main_guild_icon(ctx).await;
    Ok(Reply::pages(log_embeds(ctx, &entries, icon)))
}

/// `logs delete <key_or_link>`
pub async fn logs_delete(ctx: &Context<'_>, args: &str) -> CommandResult<Reply> {
    let arg = parse::rest_opt(args).ok_or(CommandError::MissingArgument("key_or_link"))?;
    let key = parse::log_key(arg);

    let embed = if ctx.services.logs.delete_log_entry(key).await? {
        info!("{} deleted log entry {}", ctx.author().tag(), key);
        EmbedSpec::main()
            .title(ctx.tr("Success"))
            .description(ctx.tr_fmt("Log entry `{key}` successfully deleted.", &[("key", key)]))
    } else {
        EmbedSpec::error()
            .title(ctx.tr("Error"))
            .description(ctx.tr_fmt("Log entry `{key}` not found.", &[("key", key)]))
    };
    Ok(Reply::embed(embed))
}

/// `logs responded [user]`
pub async fn logs_responded(ctx: &Context<'_>, args: &str) -> CommandResult<Reply> {
    let target = ctx.user_or_author(parse::rest_opt(args)).await?;
    let entries = ctx.services.logs.get_responded_logs(target.id).await?;
    if entries.is_empty() {
        let mention = match &target.user {
            Some(user) => user.mention(),
            None => target.id.to_string(),
        };
        return Ok(empty(ctx.tr_fmt(
            "{mention} has not responded to any threads.",
            &[("mention", &mention)],
        )));
    }

    let icon = main_guild_icon(ctx).await;
    Ok(Reply::pages(log_embeds(ctx, &entries, icon)))
}

/// `logs search [limit] <query>`
pub async fn logs_search(ctx: &Context<'_>, args: &str) -> CommandResult<Reply> {
    let (first, rest) = parse::split_first(args).ok_or(CommandError::MissingArgument("query"))?;
    let (limit, query) = match first.parse::<u32>() {
        Ok(limit) => (
            Some(limit),
            parse::rest_opt(rest).ok_or(CommandError::MissingArgument("query"))?,
        ),
        Err(_) => (None, args.trim()),
    };

    let entries = ctx.services.logs.search(query, limit).await?;
    if entries.is_empty() {
        return Ok(empty(
            ctx.tr("No log entries have been found for that query.").to_string(),
        ));
    }

    let icon = main_guild_icon(ctx).await;
    Ok(Reply::pages(log_embeds(ctx, &entries, icon)))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::commands::testing::{Harness, OWNER_ID, THREAD_CHANNEL};
    use crate::common::UserRef;
    use crate::logs::{LogMessage, LogUser, MessageKind};
    use crate::ui::Outgoing;

    fn staff() -> LogUser {
        LogUser::from_user(&UserRef::new(OWNER_ID, "admin").with_discriminator(1), true)
    }

    /// Open a thread, write a staff reply and close it. Returns the key.
    async fn closed_log(h: &Harness, content: &str) -> String {
        h.open_thread().await;
        let logs = &h.services.logs;
        logs.append_message(
            THREAD_CHANNEL,
            &LogMessage {
                message_id: 77,
                timestamp: Utc::now(),
                content: content.to_string(),
                author: staff(),
                kind: MessageKind::ThreadMessage,
                attachments: Vec::new(),
                edited: false,
            },
        )
        .await
        .unwrap();
        let entry = logs.get_log_by_channel(THREAD_CHANNEL).await.unwrap().unwrap();
        logs.close_log(&entry.key, &staff(), None, Utc::now())
            .await
            .unwrap();
        entry.key
    }

    fn pages(reply: &crate::ui::Reply) -> &[crate::ui::EmbedSpec] {
        match &reply.outgoing[0] {
            Outgoing::Paginated(pages) => pages,
            other => panic!("expected pages, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_loglink() {
        let h = Harness::new().await;
        h.open_thread().await;
        let reply = h.run_in_thread("?loglink").await;
        let link = reply.first_embed().unwrap().description.clone().unwrap();
        assert!(link.starts_with("https://logs.example.org/"));
    }

    #[tokio::test]
    async fn test_logs_for_user_without_history() {
        let h = Harness::new().await;
        let reply = h.run("?logs recipient").await;
        assert_eq!(
            reply.first_embed().unwrap().description.as_deref(),
            Some("This user does not have any previous logs.")
        );

        let reply = h.run("?logs").await;
        assert_eq!(
            reply.first_embed().unwrap().description.as_deref(),
            Some("member is a required argument that is missing.")
        );
    }

    #[tokio::test]
    async fn test_logs_lists_closed_entries() {
        let h = Harness::new().await;
        let key = closed_log(&h, "We have refunded your order").await;

        let reply = h.run("?logs <@50>").await;
        let pages = pages(&reply);
        assert_eq!(pages.len(), 1);

        let embed = &pages[0];
        let author = embed.author.as_ref().unwrap();
        assert_eq!(author.name, "Total Results Found (1) - recipient#4242");
        assert_eq!(
            author.icon_url.as_deref(),
            Some("https://cdn.discordapp.com/embed/avatars/0.png")
        );
        assert_eq!(embed.field_value("Closed By"), Some("<@1>"));
        assert_eq!(
            embed.field_value("Link").map(str::to_string),
            Some(format!("https://logs.example.org/{}", key))
        );
        assert!(embed
            .field_value("Preview")
            .unwrap()
            .contains("[M] admin#0001:` We have refunded"));
        assert_eq!(embed.footer.as_deref(), Some("Recipient ID: 50"));
    }

    #[tokio::test]
    async fn test_closed_by_and_responded() {
        let h = Harness::new().await;
        closed_log(&h, "Sorted").await;

        let reply = h.run("?logs closed-by").await;
        assert_eq!(pages(&reply).len(), 1);
        let reply = h.run("?logs responded").await;
        assert_eq!(pages(&reply).len(), 1);

        let reply = h.run("?logs closeby stranger").await;
        assert_eq!(
            reply.first_embed().unwrap().description.as_deref(),
            Some("No log entries have been found for that query")
        );
        let reply = h.run("?logs responded 999999999999999999").await;
        assert_eq!(
            reply.first_embed().unwrap().description.as_deref(),
            Some("999999999999999999 has not responded to any threads.")
        );
    }

    #[tokio::test]
    async fn test_search_with_limit() {
        let h = Harness::new().await;
        closed_log(&h, "Your refund is on its way").await;

        let reply = h.run("?logs search refund").await;
        assert_eq!(pages(&reply).len(), 1);
        let reply = h.run("?logs find 5 REFUND").await;
        assert_eq!(pages(&reply).len(), 1);
        let reply = h.run("?logs search 0 refund").await;
        assert_eq!(pages(&reply).len(), 1);

        let reply = h.run("?logs search chargeback").await;
        assert_eq!(
            reply.first_embed().unwrap().description.as_deref(),
            Some("No log entries have been found for that query.")
        );
        let reply = h.run("?logs search 5").await;
        assert_eq!(
            reply.first_embed().unwrap().description.as_deref(),
            Some("query is a required argument that is missing.")
        );
    }

    #[tokio::test]
    async fn test_delete_by_link() {
        let h = Harness::new().await;
        let key = closed_log(&h, "bye").await;

        let reply = h
            .run(&format!("?logs delete https://logs.example.org/{}", key))
            .await;
        let embed = reply.first_embed().unwrap();
        assert_eq!(embed.title.as_deref(), Some("Success"));

        let reply = h.run(&format!("?logs wipe {}", key)).await;
        assert_eq!(
            reply.first_embed().unwrap().description,
            Some(format!("Log entry `{}` not found.", key))
        );
    }
}
