//! What a command handler can see and reach.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serenity::async_trait;

use crate::commands::parse;
use crate::common::error::{CommandError, CommandResult, DiscordError};
use crate::common::{CategoryRef, Grantee, GuildRef, RoleRef, ThreadInfo, UserRef};
use crate::config::Config;
use crate::logs::LogStore;
use crate::permissions::Invoker;
use crate::settings::SettingsStore;
use crate::threads::ThreadManager;
use crate::translations::Translator;
use crate::ui::EmbedSpec;

/// Guild lookups and server setup operations.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Resolve a user from an id, a mention, `name#1234` or a name.
    async fn resolve_user(&self, arg: &str) -> Option<UserRef>;

    /// Resolve a role of the modmail guild from an id, a mention or a name.
    async fn resolve_role(&self, arg: &str) -> Option<RoleRef>;

    /// Resolve a category of the modmail guild from an id, a mention or a name.
    async fn resolve_category(&self, arg: &str) -> Option<CategoryRef>;

    async fn category(&self, id: u64) -> Option<CategoryRef>;

    async fn fetch_user(&self, id: u64) -> Option<UserRef>;

    async fn guild(&self, id: u64) -> Option<GuildRef>;

    async fn modmail_guild(&self) -> Option<GuildRef>;

    /// Member, role or `@everyone` behind a permission id.
    async fn resolve_grantee(&self, id: i64) -> Option<Grantee>;

    /// Hidden category readable by the bot and the grantees, placed first.
    async fn create_category(&self, name: &str, grants: &[Grantee])
        -> Result<CategoryRef, DiscordError>;

    /// Returns the new channel id.
    async fn create_text_channel(&self, name: &str, category: &CategoryRef)
        -> Result<u64, DiscordError>;

    async fn send_embed(&self, channel_id: u64, embed: EmbedSpec) -> Result<(), DiscordError>;
}

/// Shared collaborators of every command.
#[derive(Clone)]
pub struct Services {
    pub config: Arc<Config>,
    pub settings: Arc<SettingsStore>,
    pub logs: LogStore,
    pub threads: Arc<dyn ThreadManager>,
    pub directory: Arc<dyn Directory>,
    pub translator: Arc<Translator>,
}

/// The message that invoked a command.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub author: UserRef,
    pub invoker: Invoker,
    pub guild_id: Option<u64>,
    pub channel_id: u64,
    pub message_id: u64,
    pub attachments: Vec<String>,
    pub now: DateTime<Utc>,
}

/// A user argument, possibly unknown to Discord.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTarget {
    pub id: u64,
    pub user: Option<UserRef>,
}

impl UserTarget {
    pub fn known(user: UserRef) -> Self {
        Self {
            id: user.id,
            user: Some(user),
        }
    }

    /// Mention, or the id in backticks when the user could not be fetched.
    pub fn mention(&self) -> String {
        match &self.user {
            Some(user) => user.mention(),
            None => format!("`{}`", self.id),
        }
    }

    pub fn name(&self) -> String {
        match &self.user {
            Some(user) => user.name.clone(),
            None => format!("`{}`", self.id),
        }
    }

    pub fn avatar_url(&self) -> Option<String> {
        self.user.as_ref().and_then(|u| u.avatar_url.clone())
    }
}

/// Per-invocation view handed to handlers.
pub struct Context<'a> {
    pub services: &'a Services,
    pub invocation: &'a Invocation,
    pub thread: Option<ThreadInfo>,
}

impl<'a> Context<'a> {
    pub fn config(&self) -> &Config {
        &self.services.config
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.services.settings
    }

    pub fn prefix(&self) -> &str {
        &self.services.config.discord.prefix
    }

    /// Text of the current language for `identifier`.
    pub fn tr<'b>(&'b self, identifier: &'b str) -> &'b str {
        self.services.translator.translate(identifier)
    }

    /// Translated text with its `{name}` placeholders filled.
    pub fn tr_fmt(&self, identifier: &str, args: &[(&str, &str)]) -> String {
        self.services.translator.format(identifier, args)
    }

    pub fn author(&self) -> &UserRef {
        &self.invocation.author
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.invocation.now
    }

    pub fn require_thread(&self) -> CommandResult<&ThreadInfo> {
        self.thread.as_ref().ok_or(CommandError::NotThread)
    }

    /// Resolve a user argument: mentions, snowflakes and names. Unknown users
    /// are still accepted when given by mention or snowflake.
    pub async fn resolve_user(&self, arg: &str) -> Option<UserTarget> {
        if let Some(user) = self.services.directory.resolve_user(arg).await {
            return Some(UserTarget::known(user));
        }
        let id = parse::parse_user_id(arg)?;
        Some(match self.services.directory.fetch_user(id).await {
            Some(user) => UserTarget::known(user),
            None => UserTarget { id, user: None },
        })
    }

    /// A user argument, falling back to the thread recipient.
    ///
    /// `missing` names the argument reported when neither is available.
    pub async fn user_or_recipient(
        &self,
        arg: Option<&str>,
        missing: &'static str,
    ) -> CommandResult<UserTarget> {
        match arg {
            Some(arg) => self
                .resolve_user(arg)
                .await
                .ok_or_else(|| user_not_found(arg)),
            None => match &self.thread {
                Some(thread) => Ok(UserTarget::known(thread.recipient.clone())),
                None => Err(CommandError::MissingArgument(missing)),
            },
        }
    }

    /// A user argument, falling back to the invoker.
    pub async fn user_or_author(&self, arg: Option<&str>) -> CommandResult<UserTarget> {
        match arg {
            Some(arg) => self
                .resolve_user(arg)
                .await
                .ok_or_else(|| user_not_found(arg)),
            None => Ok(UserTarget::known(self.author().clone())),
        }
    }
}

pub fn user_not_found(arg: &str) -> CommandError {
    CommandError::BadArgument(format!("User \"{}\" not found.", arg))
}
