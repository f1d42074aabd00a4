//! First-run server setup.

use futures::future::join_all;
use tracing::{debug, info};

use crate::commands::context::Context;
use crate::common::error::CommandResult;
use crate::permissions::PermissionLevel;
use crate::settings::EVERYONE;
use crate::ui::{EmbedSpec, Reply};

const CATEGORY_NAME: &str = "Modmail";
const LOG_CHANNEL_NAME: &str = "bot-logs";

/// `setup`: create the Modmail category and its log channel.
pub async fn setup(ctx: &Context<'_>) -> CommandResult<Reply> {
    let directory = &ctx.services.directory;

    let Some(guild) = directory.modmail_guild().await else {
        return Ok(Reply::embed(
            EmbedSpec::error()
                .title(ctx.tr("Error"))
                .description(ctx.tr("Modmail functioning guild not found.")),
        ));
    };

    if ctx.invocation.guild_id != Some(guild.id) {
        return Ok(Reply::text(ctx.tr_fmt(
            "You can only setup in the Modmail guild: {guild_name}.",
            &[("guild_name", &guild.name)],
        )));
    }

    let configured = ctx.settings().read().await.main_category_id;
    let existing = match configured {
        Some(id) => directory.category(id).await,
        None => directory.resolve_category(CATEGORY_NAME).await,
    };
    if existing.is_some() {
        debug!("Can't re-setup server, main category is found.");
        return Ok(Reply::text(ctx.tr_fmt(
            "{guild_name} is already set up.",
            &[("guild_name", &guild.name)],
        )));
    }

    let granted: Vec<i64> = {
        let settings = ctx.settings().read().await;
        PermissionLevel::ALL
            .iter()
            .filter(|level| **level > PermissionLevel::Regular)
            .filter_map(|level| settings.level_permissions.get(level.name()))
            .flatten()
            .copied()
            .collect()
    };
    let resolved = join_all(granted.into_iter().map(|id| directory.resolve_grantee(id))).await;
    let mut grants = Vec::new();
    for grantee in resolved.into_iter().flatten() {
        if !grants.contains(&grantee) {
            info!("Granting {} access to Modmail category.", grantee.name());
            grants.push(grantee);
        }
    }

    let category = directory.create_category(CATEGORY_NAME, &grants).await?;
    let log_channel = directory
        .create_text_channel(LOG_CHANNEL_NAME, &category)
        .await?;

    let prefix = ctx.prefix();
    let reminder = EmbedSpec::main()
        .title(ctx.tr("Friendly Reminder"))
        .description(ctx.tr_fmt(
            "Closed threads are logged in <#{channel}>. Use `{prefix}snippet add` to save canned \
             responses and `{prefix}contact <user>` to open a thread with a member.",
            &[("channel", &log_channel.to_string()), ("prefix", prefix)],
        ))
        .field(
            ctx.tr("Thanks for using the bot!"),
            ctx.tr("Direct messages sent to the bot will now open threads in this category."),
            true,
        )
        .footer(ctx.tr_fmt(
            "Type \"{prefix}help\" for a complete list of commands.",
            &[("prefix", prefix)],
        ));
    directory.send_embed(log_channel, reminder).await?;

    let owners = ctx.config().discord.owners.clone();
    ctx.settings()
        .update(|s| {
            s.main_category_id = Some(category.id);
            s.log_channel_id = Some(log_channel);
            if s.command_permissions.is_empty() && s.level_permissions.is_empty() {
                s.update_perms(PermissionLevel::Regular.name(), EVERYONE);
                for owner in owners {
                    s.update_perms(PermissionLevel::Owner.name(), owner as i64);
                }
            }
        })
        .await?;
    info!("{} set up the Modmail category in {}", ctx.author().tag(), guild.name);

    Ok(Reply::text(ctx.tr_fmt(
        "**Successfully set up server.**\n\
         Consider setting permission levels in the settings file to give roles or users access to Modmail.\n\n\
         Type:\n- `{prefix}help` for a list of commands you can use.\n\
         - `{prefix}help <command>` for the usage of one command.",
        &[("prefix", prefix)],
    )))
}
