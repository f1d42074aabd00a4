//! Snippet commands: canned responses staff can send into threads.

use tracing::info;

use crate::commands::context::Context;
use crate::commands::parse;
use crate::common::error::{CommandError, CommandResult};
use crate::ui::{
    escape_markdown, escape_mentions, format_description, not_found_embed, EmbedSpec, Reply,
    PAGE_SIZE,
};

const MAX_NAME_LEN: usize = 120;

async fn guild_icon(ctx: &Context<'_>) -> Option<String> {
    let guild_id = ctx.invocation.guild_id?;
    ctx.services.directory.guild(guild_id).await?.icon_url
}

/// `snippet [name]`: show one snippet or list them all.
pub async fn snippet(ctx: &Context<'_>, args: &str) -> CommandResult<Reply> {
    let settings = ctx.settings().snapshot().await;

    if let Some(name) = parse::rest_opt(args) {
        let name = name.to_lowercase();
        return Ok(match settings.snippets.get(&name) {
            Some(value) => Reply::text(escape_mentions(value)),
            None => Reply::embed(not_found_embed(
                &ctx.services.translator,
                &name,
                settings.snippets.keys().map(String::as_str),
                ctx.tr("Snippet"),
            )),
        });
    }

    let icon = guild_icon(ctx).await;

    if settings.snippets.is_empty() {
        return Ok(Reply::embed(
            EmbedSpec::error()
                .description(ctx.tr("You dont have any snippets at the moment."))
                .footer(ctx.tr_fmt(
                    "Do {prefix}help snippet for more commands.",
                    &[("prefix", ctx.prefix())],
                ))
                .author(ctx.tr("Snippets"), None, icon),
        ));
    }

    // BTreeMap keys are already sorted.
    let names: Vec<String> = settings.snippets.keys().cloned().collect();
    let pages = names
        .chunks(PAGE_SIZE)
        .enumerate()
        .map(|(page, chunk)| {
            EmbedSpec::main()
                .description(format_description(page, chunk))
                .author(ctx.tr("Snippets"), None, icon.clone())
        })
        .collect();

    Ok(Reply::pages(pages))
}

/// `snippet raw <name>`
pub async fn snippet_raw(ctx: &Context<'_>, args: &str) -> CommandResult<Reply> {
    let name = parse::rest_opt(args)
        .ok_or(CommandError::MissingArgument("name"))?
        .to_lowercase();
    let settings = ctx.settings().read().await;

    Ok(match settings.snippets.get(&name) {
        Some(value) => Reply::text(escape_markdown(&escape_mentions(value)).replace('<', "\\<")),
        None => Reply::embed(not_found_embed(
            &ctx.services.translator,
            &name,
            settings.snippets.keys().map(String::as_str),
            ctx.tr("Snippet"),
        )),
    })
}

/// `snippet add <name> <value>`
pub async fn snippet_add(ctx: &Context<'_>, args: &str) -> CommandResult<Reply> {
    let (name, value) = parse::split_first(args).ok_or(CommandError::MissingArgument("name"))?;
    let name = name.to_lowercase();
    let value = parse::rest_opt(value).ok_or(CommandError::MissingArgument("value"))?;
    let value = escape_mentions(value);

    let error = |description: String| -> CommandResult<Reply> {
        Ok(Reply::embed(
            EmbedSpec::error().title(ctx.tr("Error")).description(description),
        ))
    };

    {
        let settings = ctx.settings().read().await;
        if settings.snippets.contains_key(&name) {
            return error(ctx.tr_fmt("Snippet `{name}` already exists.", &[("name", &name)]));
        }
        if settings.aliases.contains_key(&name) {
            return error(ctx.tr_fmt(
                "An alias with the same name already exists: `{name}`.",
                &[("name", &name)],
            ));
        }
    }
    if name.chars().count() > MAX_NAME_LEN {
        return error(
            ctx.tr("Snippet names cannot be longer than 120 characters.")
                .to_string(),
        );
    }

    ctx.settings()
        .update(|s| {
            s.snippets.insert(name.clone(), value);
        })
        .await?;
    info!("{} added snippet {}", ctx.author().tag(), name);

    Ok(Reply::embed(
        EmbedSpec::main()
            .title(ctx.tr("Added snippet"))
            .description(ctx.tr("Successfully created snippet.")),
    ))
}

/// `snippet remove <name>`
pub async fn snippet_remove(ctx: &Context<'_>, args: &str) -> CommandResult<Reply> {
    let name = parse::rest_opt(args)
        .ok_or(CommandError::MissingArgument("name"))?
        .to_lowercase();

    let removed = ctx
        .settings()
        .update(|s| s.snippets.remove(&name).is_some())
        .await?;

    if removed {
        info!("{} removed snippet {}", ctx.author().tag(), name);
        return Ok(Reply::embed(
            EmbedSpec::main()
                .title(ctx.tr("Removed snippet"))
                .description(ctx.tr_fmt("Snippet `{name}` is now deleted.", &[("name", &name)])),
        ));
    }

    let settings = ctx.settings().read().await;
    Ok(Reply::embed(not_found_embed(
        &ctx.services.translator,
        &name,
        settings.snippets.keys().map(String::as_str),
        ctx.tr("Snippet"),
    )))
}

/// `snippet edit <name> <value>`
pub async fn snippet_edit(ctx: &Context<'_>, args: &str) -> CommandResult<Reply> {
    let (name, value) = parse::split_first(args).ok_or(CommandError::MissingArgument("name"))?;
    let name = name.to_lowercase();
    let value = parse::rest_opt(value).ok_or(CommandError::MissingArgument("value"))?;

    let edited = ctx
        .settings()
        .update(|s| match s.snippets.get_mut(&name) {
            Some(existing) => {
                *existing = value.to_string();
                true
            }
            None => false,
        })
        .await?;

    if edited {
        return Ok(Reply::embed(
            EmbedSpec::main()
                .title(ctx.tr("Edited snippet"))
                .description(ctx.tr_fmt(
                    "`{name}` will now send \"{value}\".",
                    &[("name", &name), ("value", value)],
                )),
        ));
    }

    let settings = ctx.settings().read().await;
    Ok(Reply::embed(not_found_embed(
        &ctx.services.translator,
        &name,
        settings.snippets.keys().map(String::as_str),
        ctx.tr("Snippet"),
    )))
}
