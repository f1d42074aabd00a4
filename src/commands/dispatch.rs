//! From raw message content to a rendered reply.

use tracing::{debug, error, warn};

use crate::commands::context::{Context, Invocation, Services};
use crate::commands::{
    blocking, dm, find, help, logs, parse, resolve, setup, snippets, thread, CommandId,
    CommandSpec,
};
use crate::common::error::{CommandError, CommandResult};
use crate::permissions;
use crate::ui::{EmbedSpec, Reply};

/// A command recognised in a message, ready to run.
#[derive(Debug, Clone)]
pub struct Planned {
    pub spec: &'static CommandSpec,
    pub args: String,
}

/// Recognise a command in `content`.
///
/// Expands aliases and turns snippet names into replies. Returns `None` for
/// messages that are not commands.
pub async fn parse_command(services: &Services, content: &str) -> Option<Planned> {
    let prefix = services.config.discord.prefix.as_str();
    let body = content.strip_prefix(prefix)?.trim_start();
    let (first, rest) = parse::split_first(body)?;
    let word = first.to_lowercase();

    let settings = services.settings.read().await;

    let body = match settings.aliases.get(&word) {
        Some(expanded) => {
            debug!("Expanding alias {} to {}", word, expanded);
            format!("{} {}", expanded, rest).trim().to_string()
        }
        None => body.to_string(),
    };

    if let Some((spec, args)) = resolve(&body) {
        return Some(Planned {
            spec,
            args: args.to_string(),
        });
    }

    let (first, _) = parse::split_first(&body)?;
    if let Some(text) = settings.snippets.get(&first.to_lowercase()) {
        let spec = find("reply")?;
        return Some(Planned {
            spec,
            args: text.clone(),
        });
    }

    debug!("Ignoring unknown command {}", first);
    None
}

/// Run a recognised command. Failures become error embeds.
pub async fn run(services: &Services, invocation: &Invocation, planned: &Planned) -> Reply {
    let thread = services.threads.find_by_channel(invocation.channel_id).await;
    let ctx = Context {
        services,
        invocation,
        thread,
    };

    match execute(&ctx, planned).await {
        Ok(reply) => reply,
        Err(err) => error_reply(&ctx, planned.spec, err),
    }
}

async fn execute(ctx: &Context<'_>, planned: &Planned) -> CommandResult<Reply> {
    let spec = planned.spec;
    let name = spec.qualified_name();

    let allowed = {
        let settings = ctx.settings().read().await;
        permissions::check(
            &ctx.invocation.invoker,
            &name,
            spec.level,
            &ctx.config().discord.owners,
            &settings,
        )
    };
    if !allowed {
        debug!(
            "{} lacks {} permission for {}",
            ctx.author().tag(),
            spec.level,
            name
        );
        return Err(CommandError::Forbidden);
    }

    if spec.thread_only && ctx.thread.is_none() {
        return Err(CommandError::NotThread);
    }

    let args = planned.args.as_str();
    match spec.id {
        CommandId::Setup => setup::setup(ctx).await,
        CommandId::Snippet => snippets::snippet(ctx, args).await,
        CommandId::SnippetRaw => snippets::snippet_raw(ctx, args).await,
        CommandId::SnippetAdd => snippets::snippet_add(ctx, args).await,
        CommandId::SnippetRemove => snippets::snippet_remove(ctx, args).await,
        CommandId::SnippetEdit => snippets::snippet_edit(ctx, args).await,
        CommandId::Move => thread::move_thread(ctx, args).await,
        CommandId::Close => thread::close(ctx, args).await,
        CommandId::Notify => thread::notify(ctx, args).await,
        CommandId::Unnotify => thread::unnotify(ctx, args).await,
        CommandId::Subscribe => thread::subscribe(ctx, args).await,
        CommandId::Unsubscribe => thread::unsubscribe(ctx, args).await,
        CommandId::Nsfw => thread::set_nsfw(ctx, true).await,
        CommandId::Sfw => thread::set_nsfw(ctx, false).await,
        CommandId::Loglink => logs::loglink(ctx).await,
        CommandId::Logs => logs::logs(ctx, args).await,
        CommandId::LogsClosedBy => logs::logs_closed_by(ctx, args).await,
        CommandId::LogsDelete => logs::logs_delete(ctx, args).await,
        CommandId::LogsResponded => logs::logs_responded(ctx, args).await,
        CommandId::LogsSearch => logs::logs_search(ctx, args).await,
        CommandId::Reply => thread::reply(ctx, args, false).await,
        CommandId::AnonReply => thread::reply(ctx, args, true).await,
        CommandId::Note => thread::note(ctx, args).await,
        CommandId::Edit => thread::edit(ctx, args).await,
        CommandId::Delete => thread::delete(ctx, args).await,
        CommandId::Contact => thread::contact(ctx, args).await,
        CommandId::Blocked => blocking::blocked(ctx).await,
        CommandId::BlockedWhitelist => blocking::blocked_whitelist(ctx, args).await,
        CommandId::Block => blocking::block(ctx, args).await,
        CommandId::Unblock => blocking::unblock(ctx, args).await,
        CommandId::Enable => dm::enable(ctx).await,
        CommandId::Disable => dm::disable(ctx).await,
        CommandId::DisableAll => dm::disable_all(ctx).await,
        CommandId::IsEnable => dm::isenable(ctx).await,
        CommandId::Help => help::help(ctx, args).await,
    }
}

fn error_reply(ctx: &Context<'_>, spec: &CommandSpec, err: CommandError) -> Reply {
    let name = spec.qualified_name();

    if !err.is_user_facing() {
        error!("Command {} failed: {}", name, err);
        return Reply::embed(
            EmbedSpec::error()
                .description(ctx.tr("Something went wrong while running this command.")),
        );
    }

    match &err {
        CommandError::Forbidden | CommandError::NotThread => {
            warn!("{} could not run {}: {}", ctx.author().tag(), name, err)
        }
        _ => debug!("Bad input for {}: {}", name, err),
    }

    let description = match &err {
        CommandError::MissingArgument(argument) => ctx.tr_fmt(
            "{argument} is a required argument that is missing.",
            &[("argument", argument)],
        ),
        // Bad arguments are worded by the handler that raised them.
        CommandError::BadArgument(message) => message.clone(),
        _ => ctx.tr(&err.to_string()).to_string(),
    };
    let mut embed = EmbedSpec::error().description(description);
    if matches!(err, CommandError::MissingArgument(_)) {
        let usage = format!("{}{} {}", ctx.prefix(), name, spec.usage);
        embed = embed.footer(ctx.tr_fmt("Usage: {usage}", &[("usage", usage.trim_end())]));
    }
    Reply::embed(embed)
}
