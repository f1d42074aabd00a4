//! Transport-neutral embeds and command replies.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::Colors;

/// Embed color, resolved against the configured palette when rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Color {
    #[default]
    Main,
    Error,
    Mod,
    Recipient,
    Custom(u32),
}

impl Color {
    pub fn resolve(self, colors: &Colors) -> u32 {
        match self {
            Color::Main => colors.main,
            Color::Error => colors.error,
            Color::Mod => colors.moderator,
            Color::Recipient => colors.recipient,
            Color::Custom(value) => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedAuthor {
    pub name: String,
    pub url: Option<String>,
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// An embed description that can be rendered by any transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbedSpec {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub color: Color,
    pub author: Option<EmbedAuthor>,
    pub footer: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub fields: Vec<EmbedField>,
}

impl EmbedSpec {
    pub fn new(color: Color) -> Self {
        Self {
            color,
            ..Default::default()
        }
    }

    pub fn main() -> Self {
        Self::new(Color::Main)
    }

    pub fn error() -> Self {
        Self::new(Color::Error)
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn author(mut self, name: impl Into<String>, url: Option<String>, icon_url: Option<String>) -> Self {
        self.author = Some(EmbedAuthor {
            name: name.into(),
            url,
            icon_url,
        });
        self
    }

    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(text.into());
        self
    }

    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    /// Description length, zero when unset.
    pub fn description_len(&self) -> usize {
        self.description.as_deref().map_or(0, |d| d.chars().count())
    }

    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}

/// One message produced by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    Embed(EmbedSpec),
    Text(String),
    /// Pages browsed with buttons; a single page is sent without controls.
    Paginated(Vec<EmbedSpec>),
}

/// Everything a command wants sent back to the invoking channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub outgoing: Vec<Outgoing>,
    /// React to the invoking message with the sent emoji.
    pub react_sent: bool,
    /// Delete the invoking message after this delay.
    pub delete_invocation_after: Option<Duration>,
}

impl Reply {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn embed(embed: EmbedSpec) -> Self {
        Self {
            outgoing: vec![Outgoing::Embed(embed)],
            ..Default::default()
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            outgoing: vec![Outgoing::Text(text.into())],
            ..Default::default()
        }
    }

    pub fn pages(pages: Vec<EmbedSpec>) -> Self {
        Self {
            outgoing: vec![Outgoing::Paginated(pages)],
            ..Default::default()
        }
    }

    pub fn sent() -> Self {
        Self {
            react_sent: true,
            ..Default::default()
        }
    }

    pub fn with(mut self, outgoing: Outgoing) -> Self {
        self.outgoing.push(outgoing);
        self
    }

    pub fn delete_after(mut self, delay: Duration) -> Self {
        self.delete_invocation_after = Some(delay);
        self
    }

    /// First embed sent, if any.
    pub fn first_embed(&self) -> Option<&EmbedSpec> {
        self.outgoing.iter().find_map(|o| match o {
            Outgoing::Embed(e) => Some(e),
            Outgoing::Paginated(pages) => pages.first(),
            Outgoing::Text(_) => None,
        })
    }

    pub fn first_text(&self) -> Option<&str> {
        self.outgoing.iter().find_map(|o| match o {
            Outgoing::Text(t) => Some(t.as_str()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_resolution() {
        let colors = Colors::default();
        assert_eq!(Color::Main.resolve(&colors), colors.main);
        assert_eq!(Color::Mod.resolve(&colors), colors.moderator);
        assert_eq!(Color::Custom(0xABCDEF).resolve(&colors), 0xABCDEF);
    }

    #[test]
    fn test_builder_and_lookups() {
        let embed = EmbedSpec::error()
            .title("Error")
            .description("nope")
            .field("Message", "hello", false);
        assert_eq!(embed.color, Color::Error);
        assert_eq!(embed.description_len(), 4);
        assert_eq!(embed.field_value("Message"), Some("hello"));
        assert_eq!(embed.field_value("Other"), None);
    }

    #[test]
    fn test_reply_first_embed_looks_into_pages() {
        let reply = Reply::pages(vec![EmbedSpec::main().title("one"), EmbedSpec::main()]);
        assert_eq!(
            reply.first_embed().and_then(|e| e.title.as_deref()),
            Some("one")
        );
        assert!(!reply.react_sent);
        assert!(Reply::sent().react_sent);
    }
}
