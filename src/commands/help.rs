//! `help`: command listing and per-command usage.

use crate::commands::context::Context;
use crate::commands::{find, parse, CommandSpec, COMMANDS};
use crate::common::error::CommandResult;
use crate::permissions;
use crate::ui::{not_found_embed, EmbedSpec, Reply, PAGE_SIZE};

/// Usage embed of a single command or group.
pub fn command_embed(ctx: &Context<'_>, spec: &CommandSpec) -> EmbedSpec {
    let title = format!("{}{} {}", ctx.prefix(), spec.qualified_name(), spec.usage);
    let mut embed = EmbedSpec::main()
        .title(title.trim_end())
        .description(ctx.tr(spec.summary))
        .field(ctx.tr("Permission level"), spec.level.to_string(), true);

    if !spec.aliases.is_empty() {
        embed = embed.field(ctx.tr("Aliases"), spec.aliases.join(", "), true);
    }
    let subcommands: Vec<String> = spec
        .subcommands()
        .map(|sub| format!("`{}` - {}", sub.name, ctx.tr(sub.summary)))
        .collect();
    if !subcommands.is_empty() {
        embed = embed.field(ctx.tr("Sub-commands"), subcommands.join("\n"), false);
    }
    if spec.thread_only {
        embed = embed.footer(ctx.tr("Only usable inside a Modmail thread."));
    }
    embed
}

/// `help [command]`
pub async fn help(ctx: &Context<'_>, args: &str) -> CommandResult<Reply> {
    if let Some(name) = parse::rest_opt(args) {
        let name = name.to_lowercase();
        return Ok(match find(&name) {
            Some(spec) => Reply::embed(command_embed(ctx, spec)),
            None => {
                let names: Vec<String> = COMMANDS.iter().map(CommandSpec::qualified_name).collect();
                Reply::embed(not_found_embed(
                    &ctx.services.translator,
                    &name,
                    names.iter().map(String::as_str),
                    ctx.tr("command"),
                ))
            }
        });
    }

    let lines: Vec<String> = {
        let settings = ctx.settings().read().await;
        COMMANDS
            .iter()
            .filter(|spec| spec.parent.is_none())
            .filter(|spec| {
                permissions::check(
                    &ctx.invocation.invoker,
                    spec.name,
                    spec.level,
                    &ctx.config().discord.owners,
                    &settings,
                )
            })
            .map(|spec| format!("`{}{}` - {}", ctx.prefix(), spec.name, ctx.tr(spec.summary)))
            .collect()
    };

    let pages = lines
        .chunks(PAGE_SIZE)
        .map(|chunk| {
            EmbedSpec::main()
                .title(ctx.tr("Commands"))
                .description(chunk.join("\n"))
                .footer(ctx.tr_fmt(
                    "Type \"{prefix}help <command>\" for more info on a command.",
                    &[("prefix", ctx.prefix())],
                ))
        })
        .collect();
    Ok(Reply::pages(pages))
}
