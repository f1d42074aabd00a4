//! Switches for the direct-message relay.

use tracing::info;

use crate::commands::context::Context;
use crate::common::error::CommandResult;
use crate::settings::DmDisabled;
use crate::ui::{EmbedSpec, Reply};

async fn set_level(ctx: &Context<'_>, level: DmDisabled, only_raise: bool) -> CommandResult<()> {
    let changed = ctx
        .settings()
        .update(|s| {
            let apply = if only_raise {
                s.dm_disabled < level
            } else {
                s.dm_disabled != level
            };
            if apply {
                s.dm_disabled = level;
            }
            apply
        })
        .await?;
    if changed {
        info!("{} set dm_disabled to {:?}", ctx.author().tag(), level);
    }
    Ok(())
}

fn success(ctx: &Context<'_>, description: &str) -> Reply {
    Reply::embed(
        EmbedSpec::main()
            .title(ctx.tr("Success"))
            .description(ctx.tr(description)),
    )
}

/// `enable`
pub async fn enable(ctx: &Context<'_>) -> CommandResult<Reply> {
    set_level(ctx, DmDisabled::Enabled, false).await?;
    Ok(success(ctx, "Modmail will now accept all DM messages."))
}

/// `disable`: stop creating threads, unless everything is already off.
pub async fn disable(ctx: &Context<'_>) -> CommandResult<Reply> {
    set_level(ctx, DmDisabled::NewThreads, true).await?;
    Ok(success(ctx, "Modmail will not create any new threads."))
}

/// `disable all`
pub async fn disable_all(ctx: &Context<'_>) -> CommandResult<Reply> {
    set_level(ctx, DmDisabled::All, false).await?;
    Ok(success(ctx, "Modmail will not accept any DM messages."))
}

/// `isenable`
pub async fn isenable(ctx: &Context<'_>) -> CommandResult<Reply> {
    let embed = match ctx.settings().read().await.dm_disabled {
        DmDisabled::NewThreads => EmbedSpec::error()
            .title(ctx.tr("New Threads Disabled"))
            .description(ctx.tr("Modmail is not creating new threads.")),
        DmDisabled::All => EmbedSpec::error()
            .title(ctx.tr("All DM Disabled"))
            .description(ctx.tr(
                "Modmail is not accepting any DM messages for new and existing threads.",
            )),
        DmDisabled::Enabled => EmbedSpec::main()
            .title(ctx.tr("Enabled"))
            .description(ctx.tr("Modmail is accepting all DM messages.")),
    };
    Ok(Reply::embed(embed))
}

#[cfg(test)]
mod tests {
    use crate::commands::testing::Harness;
    use crate::settings::DmDisabled;
    use crate::ui::Color;

    async fn level(h: &Harness) -> DmDisabled {
        h.services.settings.read().await.dm_disabled
    }

    #[tokio::test]
    async fn test_disable_then_enable() {
        let h = Harness::new().await;

        let reply = h.run("?disable").await;
        assert_eq!(
            reply.first_embed().unwrap().description.as_deref(),
            Some("Modmail will not create any new threads.")
        );
        assert_eq!(level(&h).await, DmDisabled::NewThreads);

        let reply = h.run("?isenable").await;
        let embed = reply.first_embed().unwrap();
        assert_eq!(embed.title.as_deref(), Some("New Threads Disabled"));
        assert_eq!(embed.color, Color::Error);

        h.run("?enable").await;
        assert_eq!(level(&h).await, DmDisabled::Enabled);
        let reply = h.run("?isenable").await;
        assert_eq!(reply.first_embed().unwrap().title.as_deref(), Some("Enabled"));
    }

    #[tokio::test]
    async fn test_disable_does_not_lower_disable_all() {
        let h = Harness::new().await;
        let reply = h.run("?disable all").await;
        assert_eq!(
            reply.first_embed().unwrap().description.as_deref(),
            Some("Modmail will not accept any DM messages.")
        );
        assert_eq!(level(&h).await, DmDisabled::All);

        h.run("?disable").await;
        assert_eq!(level(&h).await, DmDisabled::All);

        let reply = h.run("?isenable").await;
        assert_eq!(
            reply.first_embed().unwrap().title.as_deref(),
            Some("All DM Disabled")
        );
    }

    #[tokio::test]
    async fn test_requires_administrator() {
        let h = Harness::new().await;
        h.run_as_stranger("?disable all").await;
        assert_eq!(level(&h).await, DmDisabled::Enabled);
    }
}
