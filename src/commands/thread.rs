//! Commands run inside a thread channel, plus `contact` which opens one.

use std::collections::HashMap;
use std::time::Duration;

use tracing::info;

use crate::commands::context::{user_not_found, Context};
use crate::commands::parse;
use crate::common::error::{CommandError, CommandResult};
use crate::settings::{DmDisabled, Settings};
use crate::threads::{close_cancelled_embed, find_linked_message, CloseRequest, ReplyRequest};
use crate::time::{human_timedelta, UserFriendlyTime};
use crate::ui::{EmbedSpec, Reply};

/// Channel messages searched for a staff reply to edit or delete.
const HISTORY_LIMIT: u8 = 100;

/// `move <category> [specifics]`
pub async fn move_thread(ctx: &Context<'_>, args: &str) -> CommandResult<Reply> {
    let thread = ctx.require_thread()?;
    let (category_arg, specifics) =
        parse::split_first(args).ok_or(CommandError::MissingArgument("category"))?;
    let category = ctx
        .services
        .directory
        .resolve_category(&category_arg)
        .await
        .ok_or_else(|| {
            CommandError::BadArgument(
                ctx.tr_fmt("Channel \"{name}\" not found.", &[("name", &category_arg)]),
            )
        })?;

    let silent = specifics
        .split_whitespace()
        .any(|word| word == "silent" || word == "silently");

    ctx.services.threads.move_to(thread, &category).await?;
    info!(
        "{} moved thread of {} to {}",
        ctx.author().tag(),
        thread.recipient.tag(),
        category.name
    );

    if ctx.config().threads.move_notify && !silent {
        let embed = EmbedSpec::main()
            .title(ctx.tr("Thread Moved"))
            .description(ctx.config().threads.move_response.clone());
        ctx.services.threads.send_to_recipient(thread, embed).await?;
    }

    Ok(Reply::sent())
}

fn scheduled_close_embed(ctx: &Context<'_>, after: &UserFriendlyTime, silent: bool) -> EmbedSpec {
    let delta = human_timedelta(after.dt, after.now);
    let description = if silent {
        ctx.tr_fmt("This thread will close *silently* in {delta}.", &[("delta", &delta)])
    } else {
        ctx.tr_fmt("This thread will close in {delta}.", &[("delta", &delta)])
    };
    let mut embed = EmbedSpec::error()
        .title(ctx.tr("Scheduled close"))
        .description(description);
    if let (Some(message), false) = (&after.arg, silent) {
        embed = embed.field(ctx.tr("Message"), message.clone(), true);
    }
    embed
        .footer(ctx.tr("Closing will be cancelled if a thread message is sent."))
        .timestamp(after.dt)
}

/// `close [after] [close message]`
pub async fn close(ctx: &Context<'_>, args: &str) -> CommandResult<Reply> {
    let thread = ctx.require_thread()?;
    let after = parse::rest_opt(args).map(|text| UserFriendlyTime::parse(text, ctx.now()));

    let message = after.as_ref().and_then(|a| a.arg.clone());
    let keyword = message.as_deref().map(str::to_lowercase);
    let silent = matches!(keyword.as_deref(), Some("silent") | Some("silently"));

    if keyword.as_deref() == Some("cancel") {
        let embed = if ctx.services.threads.cancel_closure(thread).await {
            close_cancelled_embed(&ctx.services.translator)
        } else {
            EmbedSpec::error().description(ctx.tr("This thread has not already been scheduled to close."))
        };
        return Ok(Reply::embed(embed));
    }

    let mut reply = Reply::none();
    let delay = match &after {
        Some(after) if after.is_future() => {
            reply = Reply::embed(scheduled_close_embed(ctx, after, silent));
            after.delay_seconds()
        }
        _ => 0,
    };

    let request = CloseRequest {
        closer: ctx.author().clone(),
        after: delay,
        message: if silent { None } else { message },
        silent,
    };
    ctx.services.threads.close(thread, request).await?;

    Ok(reply)
}

/// Mention for a user, role, `here` or `everyone` argument.
///
/// An empty argument mentions the invoker.
async fn mention_for(ctx: &Context<'_>, arg: Option<&str>) -> Option<String> {
    let Some(arg) = arg else {
        return Some(ctx.author().mention());
    };
    if let Some(role) = ctx.services.directory.resolve_role(arg).await {
        return Some(role.mention());
    }
    if let Some(user) = ctx.services.directory.resolve_user(arg).await {
        return Some(user.mention());
    }
    let lowered = arg.to_lowercase();
    match lowered.as_str() {
        "here" | "everyone" | "@here" | "@everyone" => {
            Some(format!("@{}", lowered.trim_start_matches('@')))
        }
        _ => None,
    }
}

#[derive(Clone, Copy)]
enum MentionList {
    /// Pinged once, on the next recipient message.
    Notify,
    /// Pinged on every recipient message.
    Subscribe,
}

impl MentionList {
    fn of(self, settings: &mut Settings) -> &mut HashMap<String, Vec<String>> {
        match self {
            MentionList::Notify => &mut settings.notification_squad,
            MentionList::Subscribe => &mut settings.subscriptions,
        }
    }
}

async fn add_mention(ctx: &Context<'_>, args: &str, list: MentionList) -> CommandResult<Reply> {
    let thread = ctx.require_thread()?;
    let arg = parse::rest_opt(args);
    let mention = mention_for(ctx, arg).await.ok_or_else(|| {
        CommandError::BadArgument(ctx.tr_fmt(
            "{argument} is not a valid role.",
            &[("argument", &arg.unwrap_or_default().to_lowercase())],
        ))
    })?;

    let key = thread.key();
    let added = ctx
        .settings()
        .update(|s| {
            let mentions = list.of(s).entry(key).or_default();
            if mentions.contains(&mention) {
                false
            } else {
                mentions.push(mention.clone());
                true
            }
        })
        .await?;

    let values = [("mention", mention.as_str())];
    let embed = match (list, added) {
        (MentionList::Notify, true) => EmbedSpec::main().description(
            ctx.tr_fmt("{mention} will be mentioned on the next message received.", &values),
        ),
        (MentionList::Notify, false) => EmbedSpec::error()
            .description(ctx.tr_fmt("{mention} is already going to be mentioned.", &values)),
        (MentionList::Subscribe, true) => EmbedSpec::main().description(
            ctx.tr_fmt("{mention} will now be notified of all messages received.", &values),
        ),
        (MentionList::Subscribe, false) => EmbedSpec::error()
            .description(ctx.tr_fmt("{mention} is already subscribed to this thread.", &values)),
    };
    Ok(Reply::embed(embed))
}

async fn remove_mention(ctx: &Context<'_>, args: &str, list: MentionList) -> CommandResult<Reply> {
    let thread = ctx.require_thread()?;
    let arg = parse::rest_opt(args);
    let mention = match mention_for(ctx, arg).await {
        Some(mention) => mention,
        None => format!("`{}`", arg.unwrap_or_default().to_lowercase()),
    };

    let key = thread.key();
    let removed = ctx
        .settings()
        .update(|s| {
            let mentions = list.of(s).entry(key).or_default();
            match mentions.iter().position(|m| *m == mention) {
                Some(index) => {
                    mentions.remove(index);
                    true
                }
                None => false,
            }
        })
        .await?;

    let values = [("mention", mention.as_str())];
    let embed = match (list, removed) {
        (MentionList::Notify, true) => EmbedSpec::main()
            .description(ctx.tr_fmt("{mention} will no longer be notified.", &values)),
        (MentionList::Notify, false) => EmbedSpec::error()
            .description(ctx.tr_fmt("{mention} does not have a pending notification.", &values)),
        (MentionList::Subscribe, true) => EmbedSpec::main()
            .description(ctx.tr_fmt("{mention} is now unsubscribed to this thread.", &values)),
        (MentionList::Subscribe, false) => EmbedSpec::error()
            .description(ctx.tr_fmt("{mention} is not already subscribed to this thread.", &values)),
    };
    Ok(Reply::embed(embed))
}

/// `notify [user_or_role]`
pub async fn notify(ctx: &Context<'_>, args: &str) -> CommandResult<Reply> {
    add_mention(ctx, args, MentionList::Notify).await
}

/// `unnotify [user_or_role]`
pub async fn unnotify(ctx: &Context<'_>, args: &str) -> CommandResult<Reply> {
    remove_mention(ctx, args, MentionList::Notify).await
}

/// `subscribe [user_or_role]`
pub async fn subscribe(ctx: &Context<'_>, args: &str) -> CommandResult<Reply> {
    add_mention(ctx, args, MentionList::Subscribe).await
}

/// `unsubscribe [user_or_role]`
pub async fn unsubscribe(ctx: &Context<'_>, args: &str) -> CommandResult<Reply> {
    remove_mention(ctx, args, MentionList::Subscribe).await
}

/// `nsfw` / `sfw`
pub async fn set_nsfw(ctx: &Context<'_>, nsfw: bool) -> CommandResult<Reply> {
    let thread = ctx.require_thread()?;
    ctx.services.threads.set_nsfw(thread, nsfw).await?;
    Ok(Reply::sent())
}

/// `reply <msg>` and `anonreply <msg>`
pub async fn reply(ctx: &Context<'_>, args: &str, anonymous: bool) -> CommandResult<Reply> {
    let thread = ctx.require_thread()?;
    let content = args.trim();
    if content.is_empty() && ctx.invocation.attachments.is_empty() {
        return Err(CommandError::MissingArgument("msg"));
    }

    let request = ReplyRequest {
        author: ctx.author().clone(),
        content: content.to_string(),
        attachments: ctx.invocation.attachments.clone(),
        anonymous,
        source_id: ctx.invocation.message_id,
    };
    ctx.services.threads.reply(thread, request).await?;
    Ok(Reply::none())
}

/// `note <msg>`
pub async fn note(ctx: &Context<'_>, args: &str) -> CommandResult<Reply> {
    let thread = ctx.require_thread()?;
    let content = parse::rest_opt(args).ok_or(CommandError::MissingArgument("msg"))?;
    ctx.services
        .threads
        .note(thread, ctx.author(), content, ctx.invocation.message_id)
        .await?;
    Ok(Reply::none())
}

fn failed(ctx: &Context<'_>, description: &str) -> Reply {
    Reply::embed(
        EmbedSpec::error()
            .title(ctx.tr("Failed"))
            .description(ctx.tr(description)),
    )
}

/// `edit [message_id] <message>`
pub async fn edit(ctx: &Context<'_>, args: &str) -> CommandResult<Reply> {
    let thread = ctx.require_thread()?;
    let (first, rest) = parse::split_first(args).ok_or(CommandError::MissingArgument("message"))?;
    let (message_id, message) = match parse::parse_id(&first) {
        Some(id) => (
            Some(id),
            parse::rest_opt(rest).ok_or(CommandError::MissingArgument("message"))?,
        ),
        None => (None, args.trim()),
    };

    let history = ctx.services.threads.history(thread, HISTORY_LIMIT).await?;
    let mod_color = ctx.config().colors().moderator;
    let Some(linked) = find_linked_message(&history, message_id, mod_color) else {
        return Ok(failed(ctx, "Cannot find a message to edit."));
    };

    let (edited, logged) = tokio::join!(
        ctx.services.threads.edit_message(thread, linked, message),
        ctx.services.logs.edit_message(linked, message),
    );
    edited?;
    logged?;

    Ok(Reply::sent())
}

/// `delete [message_id]`
pub async fn delete(ctx: &Context<'_>, args: &str) -> CommandResult<Reply> {
    let thread = ctx.require_thread()?;
    let message_id = match parse::rest_opt(args) {
        Some(arg) => Some(parse::parse_id(arg).ok_or_else(|| {
            CommandError::BadArgument(
                ctx.tr("An integer message ID needs to be specified.").to_string(),
            )
        })?),
        None => None,
    };

    let history = ctx.services.threads.history(thread, HISTORY_LIMIT).await?;
    let mod_color = ctx.config().colors().moderator;
    let Some(linked) = find_linked_message(&history, message_id, mod_color) else {
        return Ok(failed(ctx, "Cannot find a message to delete."));
    };

    ctx.services.threads.delete_message(thread, linked).await?;
    ctx.services.logs.delete_message(linked).await?;

    Ok(Reply::sent())
}

/// `contact [category] <user>`
pub async fn contact(ctx: &Context<'_>, args: &str) -> CommandResult<Reply> {
    let (first, rest) = parse::split_first(args).ok_or(CommandError::MissingArgument("user"))?;

    let category = match parse::rest_opt(rest) {
        Some(_) => ctx.services.directory.resolve_category(&first).await,
        None => None,
    };
    let user_arg = if category.is_some() { rest.trim() } else { args.trim() };
    let user = ctx
        .services
        .directory
        .resolve_user(user_arg)
        .await
        .ok_or_else(|| user_not_found(user_arg))?;

    if user.bot {
        return Ok(Reply::embed(
            EmbedSpec::error().description(ctx.tr("Cannot start a thread with a bot.")),
        ));
    }

    if let Some(existing) = ctx.services.threads.find_by_recipient(user.id).await {
        return Ok(Reply::embed(EmbedSpec::error().description(ctx.tr_fmt(
            "A thread for this user already exists in {channel}.",
            &[("channel", &existing.channel_mention())],
        ))));
    }

    let thread = ctx
        .services
        .threads
        .create(&user, ctx.author(), category.as_ref())
        .await?;

    if ctx.settings().read().await.dm_disabled >= DmDisabled::NewThreads {
        info!("Contacting user {} when Modmail DM is disabled.", user.tag());
    }

    let embed = EmbedSpec::main()
        .title(ctx.tr("Created Thread"))
        .description(ctx.tr_fmt(
            "Thread started by {author} for {recipient}.",
            &[
                ("author", &ctx.author().mention()),
                ("recipient", &user.mention()),
            ],
        ));
    ctx.services.threads.send_to_channel(&thread, embed).await?;

    Ok(Reply::sent().delete_after(Duration::from_secs(3)))
}

#[cfg(test)]
mod tests {
    use crate::commands::testing::{Harness, RECIPIENT_ID};
    use crate::common::UserRef;
    use crate::threads::{HistoryEmbed, HistoryMessage};
    use crate::ui::Color;

    #[tokio::test]
    async fn test_close_immediately() {
        let h = Harness::new().await;
        h.open_thread().await;
        let reply = h.run_in_thread("?close").await;
        assert!(reply.outgoing.is_empty());

        let closes = h.threads.closes();
        assert_eq!(closes.len(), 1);
        assert_eq!(closes[0].after, 0);
        assert_eq!(closes[0].message, None);
        assert!(!closes[0].silent);
    }

    #[tokio::test]
    async fn test_close_scheduled_with_message() {
        let h = Harness::new().await;
        h.open_thread().await;
        let reply = h
            .run_in_thread("?close 2 hours The issue has been resolved.")
            .await;

        let embed = reply.first_embed().unwrap();
        assert_eq!(embed.title.as_deref(), Some("Scheduled close"));
        assert_eq!(
            embed.description.as_deref(),
            Some("This thread will close in 2 hours.")
        );
        assert_eq!(
            embed.field_value("Message"),
            Some("The issue has been resolved.")
        );
        assert!(embed.timestamp.is_some());

        let closes = h.threads.closes();
        assert_eq!(closes[0].after, 7200);
        assert_eq!(closes[0].message.as_deref(), Some("The issue has been resolved."));
    }

    #[tokio::test]
    async fn test_close_silently_later() {
        let h = Harness::new().await;
        h.open_thread().await;
        let reply = h.run_in_thread("?close in 10m silently").await;

        let embed = reply.first_embed().unwrap();
        assert_eq!(
            embed.description.as_deref(),
            Some("This thread will close *silently* in 10 minutes.")
        );
        assert!(embed.fields.is_empty());

        let closes = h.threads.closes();
        assert!(closes[0].silent);
        assert_eq!(closes[0].message, None);
        assert_eq!(closes[0].after, 600);
    }

    #[tokio::test]
    async fn test_close_message_without_time() {
        let h = Harness::new().await;
        h.open_thread().await;
        let reply = h
            .run_in_thread("?close We will contact you once we find out more.")
            .await;
        assert!(reply.outgoing.is_empty());
        assert_eq!(
            h.threads.closes()[0].message.as_deref(),
            Some("We will contact you once we find out more.")
        );
    }

    #[tokio::test]
    async fn test_close_cancel() {
        let h = Harness::new().await;
        h.open_thread().await;

        let reply = h.run_in_thread("?close cancel").await;
        assert_eq!(
            reply.first_embed().unwrap().description.as_deref(),
            Some("This thread has not already been scheduled to close.")
        );

        h.run_in_thread("?close 1h").await;
        let reply = h.run_in_thread("?close CANCEL").await;
        assert_eq!(
            reply.first_embed().unwrap().description.as_deref(),
            Some("Scheduled close has been cancelled.")
        );
    }

    #[tokio::test]
    async fn test_notify_and_unnotify() {
        let h = Harness::new().await;
        h.open_thread().await;
        let key = RECIPIENT_ID.to_string();

        let reply = h.run_in_thread("?notify").await;
        assert_eq!(
            reply.first_embed().unwrap().description.as_deref(),
            Some("<@1> will be mentioned on the next message received.")
        );
        let reply = h.run_in_thread("?alert").await;
        assert_eq!(
            reply.first_embed().unwrap().description.as_deref(),
            Some("<@1> is already going to be mentioned.")
        );

        h.run_in_thread("?notify here").await;
        h.run_in_thread("?notify Support").await;
        let settings = h.services.settings.snapshot().await;
        assert_eq!(
            settings.notification_squad[&key],
            vec!["<@1>", "@here", "<@&300>"]
        );

        let reply = h.run_in_thread("?notify Nobody").await;
        assert_eq!(
            reply.first_embed().unwrap().description.as_deref(),
            Some("nobody is not a valid role.")
        );

        let reply = h.run_in_thread("?unnotify @here").await;
        assert_eq!(
            reply.first_embed().unwrap().description.as_deref(),
            Some("@here will no longer be notified.")
        );
        let reply = h.run_in_thread("?unalert Nobody").await;
        assert_eq!(
            reply.first_embed().unwrap().description.as_deref(),
            Some("`nobody` does not have a pending notification.")
        );
    }

    #[tokio::test]
    async fn test_subscribe_and_unsubscribe() {
        let h = Harness::new().await;
        h.open_thread().await;

        let reply = h.run_in_thread("?sub").await;
        assert_eq!(
            reply.first_embed().unwrap().description.as_deref(),
            Some("<@1> will now be notified of all messages received.")
        );
        let reply = h.run_in_thread("?subscribe").await;
        assert_eq!(
            reply.first_embed().unwrap().description.as_deref(),
            Some("<@1> is already subscribed to this thread.")
        );
        let reply = h.run_in_thread("?unsub").await;
        assert_eq!(
            reply.first_embed().unwrap().description.as_deref(),
            Some("<@1> is now unsubscribed to this thread.")
        );
        let reply = h.run_in_thread("?unsubscribe").await;
        assert_eq!(
            reply.first_embed().unwrap().color,
            Color::Error
        );
    }

    #[tokio::test]
    async fn test_move_notifies_unless_silent() {
        let h = Harness::with_config("threads { move_notify = true, move_response = \"Moved!\" }").await;
        h.open_thread().await;

        let reply = h.run_in_thread("?move Archive").await;
        assert!(reply.react_sent);
        assert_eq!(h.threads.moves(), vec![(600, 700)]);
        let sent = h.threads.sent_to_recipient();
        assert_eq!(sent[0].title.as_deref(), Some("Thread Moved"));
        assert_eq!(sent[0].description.as_deref(), Some("Moved!"));

        h.run_in_thread("?move Archive silently").await;
        assert_eq!(h.threads.sent_to_recipient().len(), 1);

        let reply = h.run_in_thread("?move Nowhere").await;
        assert_eq!(
            reply.first_embed().unwrap().description.as_deref(),
            Some("Channel \"Nowhere\" not found.")
        );
    }

    #[tokio::test]
    async fn test_nsfw_and_sfw() {
        let h = Harness::new().await;
        h.open_thread().await;
        assert!(h.run_in_thread("?nsfw").await.react_sent);
        assert!(h.run_in_thread("?sfw").await.react_sent);
        assert_eq!(h.threads.nsfw_flags(), vec![true, false]);
    }

    #[tokio::test]
    async fn test_reply_and_anonreply() {
        let h = Harness::new().await;
        h.open_thread().await;
        h.run_in_thread("?reply Hello there").await;
        h.run_in_thread("?anonreply Quietly").await;

        let replies = h.threads.replies();
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0].content, "Hello there");
        assert!(!replies[0].anonymous);
        assert!(replies[1].anonymous);

        let reply = h.run_in_thread("?reply").await;
        assert_eq!(
            reply.first_embed().unwrap().description.as_deref(),
            Some("msg is a required argument that is missing.")
        );
    }

    #[tokio::test]
    async fn test_note() {
        let h = Harness::new().await;
        h.open_thread().await;
        h.run_in_thread("?note Check their order history").await;
        assert_eq!(h.threads.notes(), vec!["Check their order history".to_string()]);
    }

    fn mod_reply(id: u64, linked: u64) -> HistoryMessage {
        HistoryMessage {
            id,
            embed: Some(HistoryEmbed {
                color: Some(crate::config::Colors::default().moderator),
                author_url: Some(format!("https://discord.com/channels/@me/5/{}", linked)),
            }),
        }
    }

    #[tokio::test]
    async fn test_edit_latest_and_specific() {
        let h = Harness::new().await;
        h.open_thread().await;

        let reply = h.run_in_thread("?edit New text").await;
        assert_eq!(
            reply.first_embed().unwrap().description.as_deref(),
            Some("Cannot find a message to edit.")
        );

        h.threads.set_history(vec![mod_reply(20, 200), mod_reply(10, 100)]);
        let reply = h.run_in_thread("?edit New text").await;
        assert!(reply.react_sent);
        let reply = h.run_in_thread("?edit 10 Older text").await;
        assert!(reply.react_sent);
        assert_eq!(
            h.threads.edits(),
            vec![(200, "New text".to_string()), (100, "Older text".to_string())]
        );
    }

    #[tokio::test]
    async fn test_delete() {
        let h = Harness::new().await;
        h.open_thread().await;

        let reply = h.run_in_thread("?delete abc").await;
        assert_eq!(
            reply.first_embed().unwrap().description.as_deref(),
            Some("An integer message ID needs to be specified.")
        );

        let reply = h.run_in_thread("?delete").await;
        assert_eq!(
            reply.first_embed().unwrap().description.as_deref(),
            Some("Cannot find a message to delete.")
        );

        h.threads.set_history(vec![mod_reply(20, 200)]);
        assert!(h.run_in_thread("?delete").await.react_sent);
        assert_eq!(h.threads.deletes(), vec![200]);
    }

    #[tokio::test]
    async fn test_contact_creates_thread() {
        let h = Harness::new().await;
        let reply = h.run("?contact <@60>").await;
        assert!(reply.react_sent);
        assert_eq!(
            reply.delete_invocation_after,
            Some(std::time::Duration::from_secs(3))
        );

        let created = h.threads.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].0.id, 60);
        assert_eq!(created[0].2, None);

        let posted = h.threads.sent_to_channel();
        assert_eq!(posted[0].title.as_deref(), Some("Created Thread"));
        assert_eq!(
            posted[0].description.as_deref(),
            Some("Thread started by <@1> for <@60>.")
        );
    }

    #[tokio::test]
    async fn test_contact_with_category_and_existing_thread() {
        let h = Harness::new().await;
        h.run("?contact Archive other").await;
        let created = h.threads.created();
        assert_eq!(created[0].2.as_ref().map(|c| c.id), Some(700));

        let reply = h.run("?contact other").await;
        assert_eq!(
            reply.first_embed().unwrap().description.as_deref(),
            Some(format!("A thread for this user already exists in <#{}>.", created[0].3).as_str())
        );
    }

    #[tokio::test]
    async fn test_contact_rejects_bots_and_unknown_users() {
        let h = Harness::new().await;
        let mut bot = UserRef::new(70, "robot");
        bot.bot = true;
        h.directory.add_user(bot);

        let reply = h.run("?contact robot").await;
        assert_eq!(
            reply.first_embed().unwrap().description.as_deref(),
            Some("Cannot start a thread with a bot.")
        );

        let reply = h.run("?contact ghost").await;
        assert_eq!(
            reply.first_embed().unwrap().description.as_deref(),
            Some("User \"ghost\" not found.")
        );
    }
}
