//! Button-driven browsing of multi-page replies.

use std::time::Duration;

use serenity::all::{
    ButtonStyle, ChannelId, ComponentInteractionCollector, Context, CreateActionRow,
    CreateButton, CreateEmbed, CreateInteractionResponse, CreateInteractionResponseMessage,
    CreateMessage, EditMessage, UserId,
};
use tracing::debug;

use crate::config::Colors;
use crate::discord::render::build_embed;
use crate::ui::EmbedSpec;

/// Controls stop responding after this long without a press.
const TIMEOUT: Duration = Duration::from_secs(180);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    First,
    Previous,
    Next,
    Last,
    Stop,
}

impl Control {
    const ALL: [Control; 5] = [
        Control::First,
        Control::Previous,
        Control::Next,
        Control::Last,
        Control::Stop,
    ];

    fn custom_id(self) -> &'static str {
        match self {
            Control::First => "modmail:page:first",
            Control::Previous => "modmail:page:previous",
            Control::Next => "modmail:page:next",
            Control::Last => "modmail:page:last",
            Control::Stop => "modmail:page:stop",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Control::First => "⏮",
            Control::Previous => "◀",
            Control::Next => "▶",
            Control::Last => "⏭",
            Control::Stop => "⏹",
        }
    }

    fn parse(custom_id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.custom_id() == custom_id)
    }

    /// Page shown after pressing this control, `None` for stop.
    fn apply(self, index: usize, total: usize) -> Option<usize> {
        let last = total.saturating_sub(1);
        match self {
            Control::First => Some(0),
            Control::Previous => Some(index.saturating_sub(1)),
            Control::Next => Some((index + 1).min(last)),
            Control::Last => Some(last),
            Control::Stop => None,
        }
    }
}

fn controls() -> Vec<CreateActionRow> {
    let buttons = Control::ALL
        .into_iter()
        .map(|control| {
            let style = match control {
                Control::Stop => ButtonStyle::Danger,
                _ => ButtonStyle::Secondary,
            };
            CreateButton::new(control.custom_id())
                .label(control.label())
                .style(style)
        })
        .collect();
    vec![CreateActionRow::Buttons(buttons)]
}

/// Footer of page `index`, numbered when there is more than one page.
fn page_footer(footer: Option<&str>, index: usize, total: usize) -> Option<String> {
    if total < 2 {
        return footer.map(str::to_string);
    }
    let page = format!("Page {}/{}", index + 1, total);
    Some(match footer {
        Some(footer) => format!("{} • {}", footer, page),
        None => page,
    })
}

fn numbered(pages: &[EmbedSpec], colors: &Colors) -> Vec<CreateEmbed> {
    let total = pages.len();
    pages
        .iter()
        .enumerate()
        .map(|(index, page)| {
            let mut page = page.clone();
            page.footer = page_footer(page.footer.as_deref(), index, total);
            build_embed(&page, colors)
        })
        .collect()
}

/// Send `pages` to `channel_id` and let `author_id` browse them.
pub async fn run(
    ctx: &Context,
    channel_id: ChannelId,
    author_id: UserId,
    pages: &[EmbedSpec],
    colors: &Colors,
) -> serenity::Result<()> {
    let embeds = numbered(pages, colors);
    let Some(first) = embeds.first() else {
        return Ok(());
    };

    if embeds.len() == 1 {
        channel_id
            .send_message(&ctx.http, CreateMessage::new().embed(first.clone()))
            .await?;
        return Ok(());
    }

    let mut message = channel_id
        .send_message(
            &ctx.http,
            CreateMessage::new().embed(first.clone()).components(controls()),
        )
        .await?;

    let mut index = 0;
    loop {
        let pressed = ComponentInteractionCollector::new(&ctx.shard)
            .message_id(message.id)
            .author_id(author_id)
            .timeout(TIMEOUT)
            .await;

        let Some(interaction) = pressed else {
            debug!("Paginator on message {} timed out", message.id);
            message
                .edit(&ctx.http, EditMessage::new().components(Vec::new()))
                .await?;
            return Ok(());
        };

        let Some(control) = Control::parse(&interaction.data.custom_id) else {
            continue;
        };

        let update = match control.apply(index, embeds.len()) {
            Some(next) => {
                index = next;
                CreateInteractionResponseMessage::new().embed(embeds[index].clone())
            }
            None => CreateInteractionResponseMessage::new().components(Vec::new()),
        };
        interaction
            .create_response(&ctx.http, CreateInteractionResponse::UpdateMessage(update))
            .await?;

        if control == Control::Stop {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controls_stay_in_bounds() {
        assert_eq!(Control::Previous.apply(0, 3), Some(0));
        assert_eq!(Control::Next.apply(1, 3), Some(2));
        assert_eq!(Control::Next.apply(2, 3), Some(2));
        assert_eq!(Control::Last.apply(0, 3), Some(2));
        assert_eq!(Control::First.apply(2, 3), Some(0));
        assert_eq!(Control::Stop.apply(1, 3), None);
    }

    #[test]
    fn test_custom_ids_round_trip() {
        for control in Control::ALL {
            assert_eq!(Control::parse(control.custom_id()), Some(control));
        }
        assert_eq!(Control::parse("other:button"), None);
    }

    #[test]
    fn test_page_footer() {
        assert_eq!(page_footer(None, 0, 1), None);
        assert_eq!(page_footer(Some("Recipient ID: 5"), 0, 1).as_deref(), Some("Recipient ID: 5"));
        assert_eq!(page_footer(None, 1, 3).as_deref(), Some("Page 2/3"));
        assert_eq!(
            page_footer(Some("Recipient ID: 5"), 2, 3).as_deref(),
            Some("Recipient ID: 5 • Page 3/3")
        );
    }
}
