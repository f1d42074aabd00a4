//! Block list management.

use chrono::SecondsFormat;
use tracing::info;

use crate::commands::context::{user_not_found, Context, UserTarget};
use crate::commands::{find, help, parse};
use crate::common::error::{CommandError, CommandResult};
use crate::settings::SYSTEM_BLOCK_PREFIX;
use crate::time::UserFriendlyTime;
use crate::ui::{escape_markdown, EmbedSpec, Reply};

/// Discord's embed description limit.
const DESCRIPTION_LIMIT: usize = 2048;

fn success(ctx: &Context<'_>, description: String) -> Reply {
    Reply::embed(EmbedSpec::main().title(ctx.tr("Success")).description(description))
}

fn failure(ctx: &Context<'_>, description: String) -> Reply {
    Reply::embed(EmbedSpec::error().title(ctx.tr("Error")).description(description))
}

/// Reason text of a block written by the bot itself.
fn system_reason(reason: &str) -> Option<&str> {
    reason
        .strip_prefix(SYSTEM_BLOCK_PREFIX)
        .map(|rest| rest.trim().trim_end_matches('.'))
}

/// `blocked`
pub async fn blocked(ctx: &Context<'_>) -> CommandResult<Reply> {
    let blocked = ctx.settings().snapshot().await.blocked;

    if blocked.is_empty() {
        return Ok(Reply::pages(vec![EmbedSpec::main()
            .title(ctx.tr("Blocked Users"))
            .description(ctx.tr("Currently there are no blocked users."))]));
    }

    let mut pages = Vec::new();
    let mut current = String::new();
    for (id, reason) in &blocked {
        let mention = match id.parse::<u64>() {
            Ok(user_id) => match ctx.services.directory.fetch_user(user_id).await {
                Some(user) => user.mention(),
                None => id.clone(),
            },
            Err(_) => id.clone(),
        };
        let reason = if reason.is_empty() {
            ctx.tr("No Reason Provided")
        } else {
            reason.as_str()
        };
        let line = format!("{} - {}\n", mention, reason);

        if current.len() + line.len() > DESCRIPTION_LIMIT {
            pages.push(std::mem::take(&mut current));
        }
        current.push_str(&line);
    }
    pages.push(current);

    let embeds = pages
        .into_iter()
        .enumerate()
        .map(|(index, description)| {
            let title = if index == 0 {
                ctx.tr("Blocked Users")
            } else {
                ctx.tr("Blocked Users (Continued)")
            };
            EmbedSpec::main().title(title).description(description)
        })
        .collect();

    Ok(Reply::pages(embeds))
}

/// `blocked whitelist [user]`: toggle a user's whitelist entry.
pub async fn blocked_whitelist(ctx: &Context<'_>, args: &str) -> CommandResult<Reply> {
    let target = match parse::rest_opt(args) {
        Some(arg) => ctx
            .resolve_user(arg)
            .await
            .ok_or_else(|| user_not_found(arg))?,
        None => match &ctx.thread {
            Some(thread) => UserTarget::known(thread.recipient.clone()),
            None => {
                return Ok(find("blocked whitelist")
                    .map(|spec| Reply::embed(help::command_embed(ctx, spec)))
                    .unwrap_or_default())
            }
        },
    };

    let mention = target.mention();
    let key = target.id.to_string();

    let previous = ctx
        .settings()
        .update(|s| {
            if let Some(index) = s.blocked_whitelist.iter().position(|id| *id == key) {
                s.blocked_whitelist.remove(index);
                return None;
            }
            s.blocked_whitelist.push(key.clone());
            Some(s.blocked.remove(&key).unwrap_or_default())
        })
        .await?;

    let Some(previous) = previous else {
        info!("{} removed {} from the block whitelist", ctx.author().tag(), target.id);
        return Ok(success(
            ctx,
            ctx.tr_fmt("{mention} is no longer whitelisted.", &[("mention", &mention)]),
        ));
    };

    info!("{} whitelisted {}", ctx.author().tag(), target.id);
    let description = match system_reason(&previous) {
        Some(reason) => ctx.tr_fmt(
            "{mention} was previously blocked internally for \"{reason}\". {mention} is now whitelisted.",
            &[("mention", &mention), ("reason", reason)],
        ),
        None => ctx.tr_fmt("{mention} is now whitelisted.", &[("mention", &mention)]),
    };
    Ok(success(ctx, description))
}

/// `block [user] [duration] [reason]`
pub async fn block(ctx: &Context<'_>, args: &str) -> CommandResult<Reply> {
    let (user, after_text) = match parse::split_first(args) {
        Some((first, rest)) => match ctx.resolve_user(&first).await {
            Some(user) => (Some(user), parse::rest_opt(rest)),
            None => (None, parse::rest_opt(args)),
        },
        None => (None, None),
    };
    let after = after_text.map(|text| UserFriendlyTime::parse(text, ctx.now()));

    let target = match (user, &ctx.thread, &after) {
        (Some(user), _, _) => user,
        (None, Some(thread), _) => UserTarget::known(thread.recipient.clone()),
        (None, None, None) => return Err(CommandError::MissingArgument("user")),
        (None, None, Some(after)) => {
            return Err(CommandError::BadArgument(format!(
                "User \"{}\" not found",
                after.arg.as_deref().unwrap_or_default()
            )))
        }
    };

    let mention = target.mention();
    let key = target.id.to_string();

    if ctx.settings().read().await.is_whitelisted(target.id) {
        return Ok(failure(
            ctx,
            ctx.tr_fmt("Cannot block {mention}, user is whitelisted.", &[("mention", &mention)]),
        ));
    }

    let author = ctx.author();
    let mut reason = format!(
        "by {}#{}",
        escape_markdown(&author.name),
        author.discriminator_str()
    );
    if let Some(after) = &after {
        if let Some(arg) = &after.arg {
            if arg.contains('%') {
                return Err(CommandError::BadArgument(
                    ctx.tr("The reason contains illegal character \"%\".").to_string(),
                ));
            }
            reason.push_str(&format!(" for `{}`", arg));
        }
        if after.is_future() {
            reason.push_str(&format!(
                " until {}",
                after.dt.to_rfc3339_opts(SecondsFormat::Secs, true)
            ));
        }
    }
    reason.push('.');

    let previous = ctx
        .settings()
        .update(|s| s.blocked.insert(key, reason.clone()))
        .await?;
    info!("{} blocked {} {}", author.tag(), target.id, reason);

    let description = match previous.filter(|old| !old.is_empty()) {
        Some(old) => ctx.tr_fmt(
            "{mention} was previously blocked {old_reason}.\n{mention} is now blocked {reason}",
            &[
                ("mention", &mention),
                ("old_reason", old.trim().trim_end_matches('.')),
                ("reason", &reason),
            ],
        ),
        None => ctx.tr_fmt(
            "{mention} is now blocked {reason}",
            &[("mention", &mention), ("reason", &reason)],
        ),
    };
    Ok(success(ctx, description))
}

/// `unblock [user]`
pub async fn unblock(ctx: &Context<'_>, args: &str) -> CommandResult<Reply> {
    let target = ctx.user_or_recipient(parse::rest_opt(args), "user").await?;
    let mention = target.mention();
    let key = target.id.to_string();

    let Some(previous) = ctx.settings().update(|s| s.blocked.remove(&key)).await? else {
        return Ok(failure(
            ctx,
            ctx.tr_fmt("{mention} is not blocked.", &[("mention", &mention)]),
        ));
    };
    info!("{} unblocked {}", ctx.author().tag(), target.id);

    let Some(reason) = system_reason(&previous) else {
        return Ok(success(
            ctx,
            ctx.tr_fmt("{mention} is no longer blocked.", &[("mention", &mention)]),
        ));
    };
    let reason = if reason.is_empty() {
        ctx.tr("no reason")
    } else {
        reason
    };

    let embed = EmbedSpec::main()
        .title(ctx.tr("Success"))
        .description(ctx.tr_fmt(
            "{mention} was previously blocked internally {reason}.\n{mention} is no longer blocked.",
            &[("mention", &mention), ("reason", reason)],
        ))
        .footer(ctx.tr_fmt(
            "However, if the original system block reason still applies, {name} will be \
             automatically blocked again. Use \"{prefix}blocked whitelist {id}\" to whitelist the user.",
            &[
                ("name", &target.name()),
                ("prefix", ctx.prefix()),
                ("id", &target.id.to_string()),
            ],
        ));
    Ok(Reply::embed(embed))
}
