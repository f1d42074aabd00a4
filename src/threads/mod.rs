//! Thread lifecycle seam used by the command layer.
//!
//! A thread pairs a recipient's direct messages with a staff channel. The
//! Discord implementation lives in [`crate::discord::threads`].

use serenity::async_trait;

use crate::common::error::ThreadResult;
use crate::common::{CategoryRef, ThreadInfo, UserRef};
use crate::translations::Translator;
use crate::ui::EmbedSpec;

/// How a thread should be closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseRequest {
    pub closer: UserRef,
    /// Delay in seconds; zero closes immediately.
    pub after: u64,
    /// Message sent to the recipient instead of the configured close response.
    pub message: Option<String>,
    /// Close without notifying the recipient.
    pub silent: bool,
}

/// A staff reply relayed to the recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRequest {
    pub author: UserRef,
    pub content: String,
    pub attachments: Vec<String>,
    pub anonymous: bool,
    /// The invoking message, removed once the reply is mirrored.
    pub source_id: u64,
}

/// First embed of a message in a thread channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEmbed {
    pub color: Option<u32>,
    pub author_url: Option<String>,
}

/// A message of the thread channel, newest first in history listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryMessage {
    pub id: u64,
    pub embed: Option<HistoryEmbed>,
}

/// Posted when a scheduled close is called off.
pub fn close_cancelled_embed(translator: &Translator) -> EmbedSpec {
    EmbedSpec::error().description(translator.translate("Scheduled close has been cancelled."))
}

#[async_trait]
pub trait ThreadManager: Send + Sync {
    async fn find_by_recipient(&self, recipient_id: u64) -> Option<ThreadInfo>;

    async fn find_by_channel(&self, channel_id: u64) -> Option<ThreadInfo>;

    /// Open a thread for `recipient`, in `category` or the main category.
    async fn create(
        &self,
        recipient: &UserRef,
        creator: &UserRef,
        category: Option<&CategoryRef>,
    ) -> ThreadResult<ThreadInfo>;

    async fn close(&self, thread: &ThreadInfo, request: CloseRequest) -> ThreadResult<()>;

    /// Abort a scheduled close. Returns `false` when none was pending.
    async fn cancel_closure(&self, thread: &ThreadInfo) -> bool;

    /// Abort a scheduled close because the thread saw a new message, and
    /// tell staff in the channel when one was pending.
    async fn interrupt_closure(
        &self,
        thread: &ThreadInfo,
        translator: &Translator,
    ) -> ThreadResult<bool> {
        if !self.cancel_closure(thread).await {
            return Ok(false);
        }
        self.send_to_channel(thread, close_cancelled_embed(translator))
            .await?;
        Ok(true)
    }

    async fn reply(&self, thread: &ThreadInfo, request: ReplyRequest) -> ThreadResult<()>;

    /// Post a pinned internal note. Returns the note's message id.
    async fn note(
        &self,
        thread: &ThreadInfo,
        author: &UserRef,
        content: &str,
        source_id: u64,
    ) -> ThreadResult<u64>;

    async fn history(&self, thread: &ThreadInfo, limit: u8) -> ThreadResult<Vec<HistoryMessage>>;

    /// Edit a relayed reply, addressed by its linked (direct message) id.
    async fn edit_message(&self, thread: &ThreadInfo, linked_id: u64, content: &str)
        -> ThreadResult<()>;

    async fn delete_message(&self, thread: &ThreadInfo, linked_id: u64) -> ThreadResult<()>;

    /// Move the channel, syncing its permissions with the new category.
    async fn move_to(&self, thread: &ThreadInfo, category: &CategoryRef) -> ThreadResult<()>;

    async fn set_nsfw(&self, thread: &ThreadInfo, nsfw: bool) -> ThreadResult<()>;

    async fn send_to_recipient(&self, thread: &ThreadInfo, embed: EmbedSpec) -> ThreadResult<()>;

    async fn send_to_channel(&self, thread: &ThreadInfo, embed: EmbedSpec) -> ThreadResult<()>;
}

/// Id of the message a relayed embed points at, taken from its author url.
pub fn linked_id_from_url(url: &str) -> Option<u64> {
    url.trim_end_matches('/').rsplit('/').next()?.parse().ok()
}

/// Locate the linked id of a staff reply in channel history.
///
/// Without `message_id` the newest embed in the moderator color with an
/// author url wins. With it, that exact channel message is used.
pub fn find_linked_message(
    history: &[HistoryMessage],
    message_id: Option<u64>,
    mod_color: u32,
) -> Option<u64> {
    match message_id {
        None => history.iter().find_map(|msg| {
            let embed = msg.embed.as_ref()?;
            if embed.color != Some(mod_color) {
                return None;
            }
            linked_id_from_url(embed.author_url.as_deref()?)
        }),
        Some(id) => {
            let msg = history.iter().find(|msg| msg.id == id)?;
            linked_id_from_url(msg.embed.as_ref()?.author_url.as_deref()?)
        }
    }
}
