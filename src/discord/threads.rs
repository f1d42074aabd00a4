//! Thread channels backed by Discord.
//!
//! Open threads are kept in memory, keyed by recipient id, and rebuilt from
//! the open logs when the bot reconnects. A scheduled close is a sleeping
//! task that any new message in the thread aborts.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serenity::all::{
    ChannelId, ChannelType, CreateChannel, CreateEmbed, CreateMessage, EditChannel, EditMessage,
    GetMessages, GuildId, Http, Message, MessageId, UserId,
};
use serenity::async_trait;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::common::error::{ThreadError, ThreadResult};
use crate::common::{CategoryRef, ThreadInfo, UserRef};
use crate::config::Config;
use crate::discord::directory::user_ref;
use crate::discord::render::build_embed;
use crate::logs::{LogEntry, LogMessage, LogStore, LogUser, MessageKind};
use crate::settings::{BlockStatus, DmDisabled, SettingsStore};
use crate::threads::{
    linked_id_from_url, CloseRequest, HistoryEmbed, HistoryMessage, ReplyRequest, ThreadManager,
};
use crate::time::human_duration_since;
use crate::translations::Translator;
use crate::ui::{Color, EmbedSpec};

/// Messages scanned when looking for a relayed copy.
const SCAN_LIMIT: u8 = 100;

/// Milliseconds between the Unix epoch and the first Discord snowflake.
const DISCORD_EPOCH_MS: u64 = 1_420_070_400_000;

/// What happened to a direct message from a recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relay {
    Sent,
    Blocked,
    Disabled,
}

struct OpenThread {
    info: ThreadInfo,
    dm_channel: Option<ChannelId>,
    close_task: Option<JoinHandle<()>>,
}

impl OpenThread {
    fn new(info: ThreadInfo) -> Self {
        Self {
            info,
            dm_channel: None,
            close_task: None,
        }
    }
}

/// Creation time encoded in a snowflake id.
fn snowflake_time(id: u64) -> Option<DateTime<Utc>> {
    let millis = (id >> 22) + DISCORD_EPOCH_MS;
    DateTime::from_timestamp_millis(i64::try_from(millis).ok()?)
}

/// `name-discriminator`, with the characters channel names reject removed.
pub fn channel_name(user: &UserRef) -> String {
    let name: String = user
        .name
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_ascii_punctuation() && !c.is_control() && !c.is_whitespace())
        .collect();
    let name = if name.is_empty() { "null".to_string() } else { name };
    format!("{}-{}", name, user.discriminator_str())
}

/// Message text followed by one line per attachment url.
fn with_attachments(content: &str, attachments: &[String]) -> String {
    let mut lines: Vec<&str> = Vec::new();
    if !content.trim().is_empty() {
        lines.push(content);
    }
    lines.extend(attachments.iter().map(String::as_str));
    if lines.is_empty() {
        "No content".to_string()
    } else {
        lines.join("\n")
    }
}

fn dm_link(channel_id: ChannelId, message_id: MessageId) -> String {
    format!("https://discord.com/channels/@me/{}/{}", channel_id, message_id)
}

/// First message of a new thread channel.
fn genesis_embed(
    tr: &Translator,
    recipient: &UserRef,
    past_threads: usize,
    now: DateTime<Utc>,
) -> EmbedSpec {
    let created = snowflake_time(recipient.id).unwrap_or(now);
    let mut embed = EmbedSpec::main()
        .author(
            recipient.tag(),
            Some(format!("https://discord.com/users/{}", recipient.id)),
            recipient.avatar_url.clone(),
        )
        .description(tr.format(
            "{mention} was created {delta}",
            &[
                ("mention", &recipient.mention()),
                ("delta", &human_duration_since(created, now)),
            ],
        ))
        .footer(tr.format("User ID: {id}", &[("id", &recipient.id.to_string())]))
        .timestamp(now);
    if past_threads > 0 {
        embed = embed.field(tr.translate("Past Threads"), past_threads.to_string(), true);
    }
    embed
}

/// Entry posted in the log channel when a thread closes.
fn closed_log_embed(
    tr: &Translator,
    entry: &LogEntry,
    url: &str,
    closer: &UserRef,
    message: Option<&str>,
    now: DateTime<Utc>,
) -> EmbedSpec {
    let mut description = format!("[`{}`]({})", entry.key, url);
    if let Some(message) = message {
        description.push('\n');
        description.push_str(&tr.format("**Close message:** {message}", &[("message", message)]));
    }
    EmbedSpec::error()
        .author(
            format!("{} (ID: {})", entry.recipient.tag(), entry.recipient.id),
            None,
            entry.recipient.avatar_url.clone(),
        )
        .description(description)
        .footer(tr.format("Closed by: {closer}", &[("closer", &closer.tag())]))
        .timestamp(now)
}

fn history_message(msg: &Message) -> HistoryMessage {
    HistoryMessage {
        id: msg.id.get(),
        embed: msg.embeds.first().map(|embed| HistoryEmbed {
            color: embed.colour.map(|c| c.0),
            author_url: embed.author.as_ref().and_then(|a| a.url.clone()),
        }),
    }
}

fn links_to(msg: &Message, linked_id: u64) -> bool {
    msg.embeds
        .first()
        .and_then(|embed| embed.author.as_ref())
        .and_then(|author| author.url.as_deref())
        .and_then(linked_id_from_url)
        == Some(linked_id)
}

/// [`ThreadManager`] over Discord channels and direct messages.
pub struct DiscordThreads {
    me: Weak<DiscordThreads>,
    http: Arc<Http>,
    config: Arc<Config>,
    settings: Arc<SettingsStore>,
    logs: LogStore,
    translator: Arc<Translator>,
    threads: RwLock<HashMap<u64, OpenThread>>,
}

impl DiscordThreads {
    pub fn new(
        http: Arc<Http>,
        config: Arc<Config>,
        settings: Arc<SettingsStore>,
        logs: LogStore,
        translator: Arc<Translator>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            http,
            config,
            settings,
            logs,
            translator,
            threads: RwLock::new(HashMap::new()),
        })
    }

    fn channel(thread: &ThreadInfo) -> ChannelId {
        ChannelId::new(thread.channel_id)
    }

    fn embed(&self, spec: &EmbedSpec) -> CreateEmbed {
        build_embed(spec, &self.config.colors())
    }

    /// Rebuild the open thread table from the open logs.
    pub async fn restore(&self) -> ThreadResult<usize> {
        let entries = self.logs.open_logs().await?;
        let mut restored = 0;

        for entry in entries {
            let channel = ChannelId::new(entry.channel_id);
            if let Err(e) = channel.to_channel(&self.http).await {
                warn!(
                    "Channel {} of open log {} is gone: {}",
                    entry.channel_id, entry.key, e
                );
                continue;
            }

            let recipient = match UserId::new(entry.recipient.id).to_user(&self.http).await {
                Ok(user) => user_ref(&user),
                Err(_) => UserRef {
                    id: entry.recipient.id,
                    name: entry.recipient.name.clone(),
                    discriminator: entry.recipient.discriminator.parse().ok().filter(|d| *d != 0),
                    avatar_url: entry.recipient.avatar_url.clone(),
                    bot: false,
                },
            };
            let info = ThreadInfo {
                recipient,
                channel_id: entry.channel_id,
            };
            self.threads
                .write()
                .await
                .insert(info.id(), OpenThread::new(info));
            restored += 1;
        }

        info!("Restored {} open threads", restored);
        Ok(restored)
    }

    async fn dm_channel(&self, recipient: &UserRef) -> ThreadResult<ChannelId> {
        let known = self
            .threads
            .read()
            .await
            .get(&recipient.id)
            .and_then(|open| open.dm_channel);
        if let Some(channel) = known {
            return Ok(channel);
        }

        let channel = UserId::new(recipient.id)
            .create_dm_channel(&self.http)
            .await?
            .id;
        if let Some(open) = self.threads.write().await.get_mut(&recipient.id) {
            open.dm_channel = Some(channel);
        }
        Ok(channel)
    }

    async fn dm(&self, recipient: &UserRef, embed: &EmbedSpec) -> ThreadResult<Message> {
        let channel = self.dm_channel(recipient).await?;
        let message = channel
            .send_message(&self.http, CreateMessage::new().embed(self.embed(embed)))
            .await?;
        Ok(message)
    }

    /// The channel message mirroring `linked_id`.
    async fn find_mirror(&self, thread: &ThreadInfo, linked_id: u64) -> ThreadResult<Message> {
        if linked_id == 0 {
            return Err(ThreadError::UnknownMessage { message_id: 0 });
        }
        let messages = Self::channel(thread)
            .messages(&self.http, GetMessages::new().limit(SCAN_LIMIT))
            .await?;
        messages
            .into_iter()
            .find(|msg| links_to(msg, linked_id))
            .ok_or(ThreadError::UnknownMessage {
                message_id: linked_id,
            })
    }

    async fn delete_source(&self, thread: &ThreadInfo, source_id: u64) {
        if source_id == 0 {
            return;
        }
        if let Err(e) = Self::channel(thread)
            .delete_message(&self.http, MessageId::new(source_id))
            .await
        {
            debug!("Failed to delete message {}: {}", source_id, e);
        }
    }

    async fn post_closed_log(
        &self,
        entry: &LogEntry,
        closer: &UserRef,
        message: Option<&str>,
        now: DateTime<Utc>,
    ) {
        let Some(log_channel) = self.settings.read().await.log_channel_id else {
            return;
        };
        let url = self.logs.log_url(&entry.key);
        let embed = closed_log_embed(&self.translator, entry, &url, closer, message, now);
        if let Err(e) = ChannelId::new(log_channel)
            .send_message(&self.http, CreateMessage::new().embed(self.embed(&embed)))
            .await
        {
            warn!("Failed to post closed log {}: {}", entry.key, e);
        }
    }

    async fn close_now(&self, thread: &ThreadInfo, request: CloseRequest) -> ThreadResult<()> {
        if let Some(task) = self
            .threads
            .write()
            .await
            .remove(&thread.id())
            .and_then(|open| open.close_task)
        {
            task.abort();
        }

        let now = Utc::now();
        let message = request.message.as_deref();
        if let Some(entry) = self.logs.get_log_by_channel(thread.channel_id).await? {
            let closer = LogUser::from_user(&request.closer, true);
            self.logs.close_log(&entry.key, &closer, message, now).await?;
            self.post_closed_log(&entry, &request.closer, message, now)
                .await;
        }

        if !request.silent {
            let text = match message {
                Some(text) => text.to_string(),
                None => self
                    .config
                    .threads
                    .close_response
                    .replace("{closer}", &request.closer.mention()),
            };
            let embed = EmbedSpec::error()
                .title(self.translator.translate("Thread Closed"))
                .description(text)
                .footer(self.translator.translate("Replying will create a new thread"))
                .timestamp(now);
            if let Err(e) = self.dm(&thread.recipient, &embed).await {
                warn!("Could not notify {} of the close: {}", thread.recipient.tag(), e);
            }
        }

        let key = thread.key();
        self.settings.update(|s| s.forget_thread(&key)).await?;
        Self::channel(thread).delete(&self.http).await?;

        info!(
            "{} closed the thread of {}",
            request.closer.tag(),
            thread.recipient.tag()
        );
        Ok(())
    }

    fn schedule_close(&self, thread: &ThreadInfo, request: CloseRequest) -> Option<JoinHandle<()>> {
        let me = self.me.upgrade()?;
        let thread = thread.clone();
        let delay = Duration::from_secs(request.after);
        Some(tokio::spawn(async move {
            sleep(delay).await;
            // Detach our own handle so closing does not abort this task.
            if let Some(open) = me.threads.write().await.get_mut(&thread.id()) {
                open.close_task = None;
            }
            if let Err(e) = me.close_now(&thread, request).await {
                error!("Scheduled close of {} failed: {}", thread.recipient.tag(), e);
            }
        }))
    }

    /// Relay a direct message from `author` into their thread, opening one
    /// when needed.
    pub async fn relay_from_recipient(
        &self,
        author: &UserRef,
        msg: &Message,
    ) -> ThreadResult<Relay> {
        let now = Utc::now();
        let status = self.settings.read().await.block_status(author.id, now);
        match status {
            BlockStatus::Blocked { reason } => {
                debug!("Ignoring message from blocked user {}: {}", author.tag(), reason);
                return Ok(Relay::Blocked);
            }
            BlockStatus::Expired => {
                let key = author.id.to_string();
                self.settings
                    .update(|s| {
                        s.blocked.remove(&key);
                    })
                    .await?;
                info!("Block of {} has expired", author.tag());
            }
            BlockStatus::NotBlocked | BlockStatus::Whitelisted => {}
        }

        let existing = self.find_by_recipient(author.id).await;
        let dm_disabled = self.settings.read().await.dm_disabled;
        let refusal = match (dm_disabled, &existing) {
            (DmDisabled::All, _) => Some(&self.config.threads.disabled_current_thread_response),
            (DmDisabled::NewThreads, None) => {
                Some(&self.config.threads.disabled_new_thread_response)
            }
            _ => None,
        };
        if let Some(text) = refusal {
            let embed = EmbedSpec::error()
                .title(self.translator.translate("Message not sent!"))
                .description(text.as_str())
                .timestamp(now);
            msg.channel_id
                .send_message(&self.http, CreateMessage::new().embed(self.embed(&embed)))
                .await?;
            return Ok(Relay::Disabled);
        }

        let thread = match existing {
            Some(thread) => thread,
            None => self.create(author, author, None).await?,
        };
        if let Err(e) = self.interrupt_closure(&thread, &self.translator).await {
            warn!("Failed to announce cancelled close in {}: {}", thread.channel_id, e);
        }
        if let Some(open) = self.threads.write().await.get_mut(&thread.id()) {
            open.dm_channel = Some(msg.channel_id);
        }

        let key = thread.key();
        let mentions = self.settings.update(|s| s.take_mentions(&key)).await?;
        let attachments: Vec<String> = msg.attachments.iter().map(|a| a.url.clone()).collect();

        let embed = EmbedSpec::new(Color::Recipient)
            .author(
                author.tag(),
                Some(dm_link(msg.channel_id, msg.id)),
                author.avatar_url.clone(),
            )
            .description(with_attachments(&msg.content, &attachments))
            .footer(format!("Message ID: {}", msg.id))
            .timestamp(now);
        let mut builder = CreateMessage::new().embed(self.embed(&embed));
        if !mentions.is_empty() {
            builder = builder.content(mentions.join(" "));
        }
        Self::channel(&thread)
            .send_message(&self.http, builder)
            .await?;

        self.logs
            .append_message(
                thread.channel_id,
                &LogMessage {
                    message_id: msg.id.get(),
                    timestamp: now,
                    content: msg.content.clone(),
                    author: LogUser::from_user(author, false),
                    kind: MessageKind::ThreadMessage,
                    attachments,
                    edited: false,
                },
            )
            .await?;
        Ok(Relay::Sent)
    }

    /// Record staff chatter in a thread channel.
    pub async fn log_internal(&self, thread: &ThreadInfo, author: &UserRef, msg: &Message) {
        let message = LogMessage {
            message_id: msg.id.get(),
            timestamp: Utc::now(),
            content: msg.content.clone(),
            author: LogUser::from_user(author, true),
            kind: MessageKind::Internal,
            attachments: msg.attachments.iter().map(|a| a.url.clone()).collect(),
            edited: false,
        };
        if let Err(e) = self.logs.append_message(thread.channel_id, &message).await {
            warn!("Failed to log message {}: {}", msg.id, e);
        }
    }
}

#[async_trait]
impl ThreadManager for DiscordThreads {
    async fn find_by_recipient(&self, recipient_id: u64) -> Option<ThreadInfo> {
        self.threads
            .read()
            .await
            .get(&recipient_id)
            .map(|open| open.info.clone())
    }

    async fn find_by_channel(&self, channel_id: u64) -> Option<ThreadInfo> {
        self.threads
            .read()
            .await
            .values()
            .find(|open| open.info.channel_id == channel_id)
            .map(|open| open.info.clone())
    }

    async fn create(
        &self,
        recipient: &UserRef,
        creator: &UserRef,
        category: Option<&CategoryRef>,
    ) -> ThreadResult<ThreadInfo> {
        let parent = match category {
            Some(category) => Some(category.id),
            None => self.settings.read().await.main_category_id,
        };

        let mut builder = CreateChannel::new(channel_name(recipient))
            .kind(ChannelType::Text)
            .topic(format!("User ID: {}", recipient.id));
        if let Some(parent) = parent {
            builder = builder.category(ChannelId::new(parent));
        }
        let channel = GuildId::new(self.config.modmail_guild_id())
            .create_channel(&self.http, builder)
            .await?;

        let info = ThreadInfo {
            recipient: recipient.clone(),
            channel_id: channel.id.get(),
        };
        let started_by_staff = creator.id != recipient.id;
        self.logs
            .create_log(
                info.channel_id,
                &LogUser::from_user(recipient, false),
                &LogUser::from_user(creator, started_by_staff),
            )
            .await?;
        self.threads
            .write()
            .await
            .insert(info.id(), OpenThread::new(info.clone()));

        let now = Utc::now();
        let past_threads = self
            .logs
            .get_user_logs(recipient.id)
            .await?
            .iter()
            .filter(|entry| !entry.open)
            .count();
        self.send_to_channel(&info, genesis_embed(&self.translator, recipient, past_threads, now))
            .await?;

        if !started_by_staff {
            let embed = EmbedSpec::main()
                .title(self.translator.translate("Thread Created"))
                .description(self.config.threads.creation_response.as_str())
                .footer(self.translator.translate("Your message has been sent"))
                .timestamp(now);
            if let Err(e) = self.dm(recipient, &embed).await {
                warn!("Could not confirm thread creation to {}: {}", recipient.tag(), e);
            }
        }

        info!(
            "Opened thread {} for {} (started by {})",
            info.channel_id,
            recipient.tag(),
            creator.tag()
        );
        Ok(info)
    }

    async fn close(&self, thread: &ThreadInfo, request: CloseRequest) -> ThreadResult<()> {
        if request.after == 0 {
            return self.close_now(thread, request).await;
        }

        let after = request.after;
        let Some(task) = self.schedule_close(thread, request.clone()) else {
            return self.close_now(thread, request).await;
        };
        let mut threads = self.threads.write().await;
        match threads.get_mut(&thread.id()) {
            Some(open) => {
                if let Some(previous) = open.close_task.replace(task) {
                    previous.abort();
                }
                info!("Thread {} will close in {}s", thread.channel_id, after);
            }
            None => task.abort(),
        }
        Ok(())
    }

    async fn cancel_closure(&self, thread: &ThreadInfo) -> bool {
        let task = self
            .threads
            .write()
            .await
            .get_mut(&thread.id())
            .and_then(|open| open.close_task.take());
        match task {
            Some(task) => {
                task.abort();
                info!("Cancelled scheduled close of thread {}", thread.channel_id);
                true
            }
            None => false,
        }
    }

    async fn reply(&self, thread: &ThreadInfo, request: ReplyRequest) -> ThreadResult<()> {
        if let Err(e) = self.interrupt_closure(thread, &self.translator).await {
            warn!("Failed to announce cancelled close in {}: {}", thread.channel_id, e);
        }

        let now = Utc::now();
        let tags = &self.config.threads;
        let description = with_attachments(&request.content, &request.attachments);

        let signed = if request.anonymous {
            let name = tags.anon_username.clone().unwrap_or_else(|| tags.mod_tag.clone());
            EmbedSpec::new(Color::Mod)
                .author(name, None, None)
                .footer(tags.anon_tag.as_str())
        } else {
            EmbedSpec::new(Color::Mod)
                .author(request.author.tag(), None, request.author.avatar_url.clone())
                .footer(tags.mod_tag.as_str())
        };
        let to_recipient = signed.description(description.as_str()).timestamp(now);
        let delivered = self.dm(&thread.recipient, &to_recipient).await?;

        let footer = if request.anonymous {
            self.translator.translate("Anonymous Reply")
        } else {
            tags.mod_tag.as_str()
        };
        let mirror = EmbedSpec::new(Color::Mod)
            .author(
                request.author.tag(),
                Some(dm_link(delivered.channel_id, delivered.id)),
                request.author.avatar_url.clone(),
            )
            .description(description)
            .footer(footer)
            .timestamp(now);
        self.send_to_channel(thread, mirror).await?;
        self.delete_source(thread, request.source_id).await;

        let kind = if request.anonymous {
            MessageKind::Anonymous
        } else {
            MessageKind::ThreadMessage
        };
        self.logs
            .append_message(
                thread.channel_id,
                &LogMessage {
                    message_id: delivered.id.get(),
                    timestamp: now,
                    content: request.content,
                    author: LogUser::from_user(&request.author, true),
                    kind,
                    attachments: request.attachments,
                    edited: false,
                },
            )
            .await?;
        Ok(())
    }

    async fn note(
        &self,
        thread: &ThreadInfo,
        author: &UserRef,
        content: &str,
        source_id: u64,
    ) -> ThreadResult<u64> {
        let now = Utc::now();
        let link = format!(
            "https://discord.com/channels/{}/{}/{}",
            self.config.modmail_guild_id(),
            thread.channel_id,
            source_id
        );
        let embed = EmbedSpec::main()
            .author(author.tag(), Some(link), author.avatar_url.clone())
            .description(content)
            .footer(self.translator.translate("Internal Note"))
            .timestamp(now);
        let note = Self::channel(thread)
            .send_message(&self.http, CreateMessage::new().embed(self.embed(&embed)))
            .await?;
        if let Err(e) = note.pin(&self.http).await {
            warn!("Failed to pin note {}: {}", note.id, e);
        }
        self.delete_source(thread, source_id).await;

        self.logs
            .append_message(
                thread.channel_id,
                &LogMessage {
                    message_id: source_id,
                    timestamp: now,
                    content: content.to_string(),
                    author: LogUser::from_user(author, true),
                    kind: MessageKind::Note,
                    attachments: Vec::new(),
                    edited: false,
                },
            )
            .await?;
        Ok(note.id.get())
    }

    async fn history(&self, thread: &ThreadInfo, limit: u8) -> ThreadResult<Vec<HistoryMessage>> {
        let messages = Self::channel(thread)
            .messages(&self.http, GetMessages::new().limit(limit))
            .await?;
        Ok(messages.iter().map(history_message).collect())
    }

    async fn edit_message(
        &self,
        thread: &ThreadInfo,
        linked_id: u64,
        content: &str,
    ) -> ThreadResult<()> {
        let mirror = self.find_mirror(thread, linked_id).await?;
        if let Some(embed) = mirror.embeds.first() {
            let edited = CreateEmbed::from(embed.clone()).description(content);
            Self::channel(thread)
                .edit_message(&self.http, mirror.id, EditMessage::new().embed(edited))
                .await?;
        }

        // Notes have no recipient copy.
        let dm = self.dm_channel(&thread.recipient).await?;
        match dm.message(&self.http, MessageId::new(linked_id)).await {
            Ok(delivered) => {
                if let Some(embed) = delivered.embeds.first() {
                    let edited = CreateEmbed::from(embed.clone()).description(content);
                    dm.edit_message(&self.http, delivered.id, EditMessage::new().embed(edited))
                        .await?;
                }
            }
            Err(e) => debug!("No recipient copy of {}: {}", linked_id, e),
        }
        Ok(())
    }

    async fn delete_message(&self, thread: &ThreadInfo, linked_id: u64) -> ThreadResult<()> {
        let mirror = self.find_mirror(thread, linked_id).await?;
        Self::channel(thread)
            .delete_message(&self.http, mirror.id)
            .await?;

        let dm = self.dm_channel(&thread.recipient).await?;
        if let Err(e) = dm
            .delete_message(&self.http, MessageId::new(linked_id))
            .await
        {
            debug!("No recipient copy of {} to delete: {}", linked_id, e);
        }
        Ok(())
    }

    async fn move_to(&self, thread: &ThreadInfo, category: &CategoryRef) -> ThreadResult<()> {
        let category_id = ChannelId::new(category.id);
        let overwrites = category_id
            .to_channel(&self.http)
            .await?
            .guild()
            .map(|channel| channel.permission_overwrites)
            .unwrap_or_default();
        Self::channel(thread)
            .edit(
                &self.http,
                EditChannel::new()
                    .category(Some(category_id))
                    .permissions(overwrites),
            )
            .await?;
        Ok(())
    }

    async fn set_nsfw(&self, thread: &ThreadInfo, nsfw: bool) -> ThreadResult<()> {
        Self::channel(thread)
            .edit(&self.http, EditChannel::new().nsfw(nsfw))
            .await?;
        Ok(())
    }

    async fn send_to_recipient(&self, thread: &ThreadInfo, embed: EmbedSpec) -> ThreadResult<()> {
        self.dm(&thread.recipient, &embed).await?;
        Ok(())
    }

    async fn send_to_channel(&self, thread: &ThreadInfo, embed: EmbedSpec) -> ThreadResult<()> {
        Self::channel(thread)
            .send_message(&self.http, CreateMessage::new().embed(self.embed(&embed)))
            .await?;
        Ok(())
    }
}
