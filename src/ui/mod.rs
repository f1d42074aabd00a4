//! Response model produced by commands and rendered by the Discord layer.

pub mod embed;
pub mod format;

pub use embed::{Color, EmbedAuthor, EmbedField, EmbedSpec, Outgoing, Reply};
pub use format::{
    escape_markdown, escape_mentions, format_description, format_preview, not_found_embed,
    truncate, PAGE_SIZE,
};
