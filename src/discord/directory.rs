//! Guild lookups over the REST API.

use std::collections::HashMap;
use std::sync::Arc;

use serenity::all::{
    ChannelId, ChannelType, CreateChannel, CreateMessage, GuildChannel, GuildId, Http, Member,
    PermissionOverwrite, PermissionOverwriteType, Permissions, Role, RoleId, User, UserId,
};
use serenity::async_trait;
use tracing::{debug, warn};

use crate::commands::context::Directory;
use crate::commands::parse;
use crate::common::error::DiscordError;
use crate::common::{CategoryRef, Grantee, GuildRef, RoleRef, UserRef};
use crate::config::Config;
use crate::discord::render::build_embed;
use crate::settings::EVERYONE;
use crate::ui::EmbedSpec;

/// Members returned per name search.
const SEARCH_LIMIT: u64 = 25;

/// Snapshot of a serenity user.
pub fn user_ref(user: &User) -> UserRef {
    UserRef {
        id: user.id.get(),
        name: user.name.clone(),
        discriminator: user.discriminator.map(|d| d.get()),
        avatar_url: user.avatar_url(),
        bot: user.bot,
    }
}

fn member_matches(member: &Member, name: &str, discriminator: Option<u16>) -> bool {
    let user = &member.user;
    if let Some(discriminator) = discriminator {
        return user.name == name && user.discriminator.map(|d| d.get()) == Some(discriminator);
    }
    user.name.eq_ignore_ascii_case(name)
        || user.global_name.as_deref() == Some(name)
        || member.nick.as_deref() == Some(name)
}

fn find_role(roles: &HashMap<RoleId, Role>, arg: &str) -> Option<RoleRef> {
    let role = match parse::parse_role_id(arg).filter(|id| *id != 0) {
        Some(id) => roles.get(&RoleId::new(id)),
        None => roles
            .values()
            .find(|role| role.name == arg)
            .or_else(|| roles.values().find(|role| role.name.eq_ignore_ascii_case(arg))),
    }?;
    Some(RoleRef {
        id: role.id.get(),
        name: role.name.clone(),
    })
}

fn category_ref(channel: &GuildChannel) -> CategoryRef {
    CategoryRef {
        id: channel.id.get(),
        name: channel.name.clone(),
    }
}

/// The `@everyone` role shares its guild's id.
fn everyone_role(guild: GuildId) -> RoleId {
    RoleId::new(guild.get())
}

/// Overwrites hiding a category from everyone but the bot and `grants`.
fn category_overwrites(guild: GuildId, bot: UserId, grants: &[Grantee]) -> Vec<PermissionOverwrite> {
    let view = Permissions::VIEW_CHANNEL;
    let mut everyone = PermissionOverwrite {
        allow: Permissions::empty(),
        deny: view,
        kind: PermissionOverwriteType::Role(everyone_role(guild)),
    };
    let mut overwrites = vec![PermissionOverwrite {
        allow: view | Permissions::SEND_MESSAGES | Permissions::MANAGE_CHANNELS,
        deny: Permissions::empty(),
        kind: PermissionOverwriteType::Member(bot),
    }];

    for grant in grants {
        match grant {
            Grantee::Everyone => {
                everyone.allow = view;
                everyone.deny = Permissions::empty();
            }
            Grantee::Member { id, .. } => overwrites.push(PermissionOverwrite {
                allow: view,
                deny: Permissions::empty(),
                kind: PermissionOverwriteType::Member(UserId::new(*id)),
            }),
            Grantee::Role { id, .. } => overwrites.push(PermissionOverwrite {
                allow: view,
                deny: Permissions::empty(),
                kind: PermissionOverwriteType::Role(RoleId::new(*id)),
            }),
        }
    }
    overwrites.insert(0, everyone);
    overwrites
}

/// [`Directory`] backed by Discord's REST API.
pub struct GuildDirectory {
    http: Arc<Http>,
    config: Arc<Config>,
}

impl GuildDirectory {
    pub fn new(http: Arc<Http>, config: Arc<Config>) -> Self {
        Self { http, config }
    }

    fn modmail_guild_id(&self) -> GuildId {
        GuildId::new(self.config.modmail_guild_id())
    }

    /// Main guild first, then the modmail guild when it differs.
    fn guild_ids(&self) -> Vec<GuildId> {
        let main = GuildId::new(self.config.discord.guild_id);
        let modmail = self.modmail_guild_id();
        if main == modmail {
            vec![main]
        } else {
            vec![main, modmail]
        }
    }

    async fn roles(&self) -> HashMap<RoleId, Role> {
        match self.modmail_guild_id().roles(&self.http).await {
            Ok(roles) => roles,
            Err(e) => {
                warn!("Failed to fetch roles: {}", e);
                HashMap::new()
            }
        }
    }

    async fn categories(&self) -> Vec<GuildChannel> {
        match self.modmail_guild_id().channels(&self.http).await {
            Ok(channels) => channels
                .into_values()
                .filter(|channel| channel.kind == ChannelType::Category)
                .collect(),
            Err(e) => {
                warn!("Failed to fetch channels: {}", e);
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl Directory for GuildDirectory {
    async fn resolve_user(&self, arg: &str) -> Option<UserRef> {
        if let Some(id) = parse::parse_user_id(arg) {
            return self.fetch_user(id).await;
        }

        let (name, discriminator) = parse::split_tag(arg.trim());
        for guild in self.guild_ids() {
            match guild.search_members(&self.http, name, Some(SEARCH_LIMIT)).await {
                Ok(members) => {
                    if let Some(member) = members
                        .iter()
                        .find(|member| member_matches(member, name, discriminator))
                    {
                        return Some(user_ref(&member.user));
                    }
                }
                Err(e) => debug!("Member search for {} in {} failed: {}", name, guild, e),
            }
        }
        None
    }

    async fn resolve_role(&self, arg: &str) -> Option<RoleRef> {
        find_role(&self.roles().await, arg.trim())
    }

    async fn resolve_category(&self, arg: &str) -> Option<CategoryRef> {
        let arg = arg.trim();
        if let Some(id) = parse::parse_channel_id(arg) {
            return self.category(id).await;
        }
        self.categories()
            .await
            .iter()
            .find(|channel| channel.name.eq_ignore_ascii_case(arg))
            .map(category_ref)
    }

    async fn category(&self, id: u64) -> Option<CategoryRef> {
        self.categories()
            .await
            .iter()
            .find(|channel| channel.id.get() == id)
            .map(category_ref)
    }

    async fn fetch_user(&self, id: u64) -> Option<UserRef> {
        if id == 0 {
            return None;
        }
        match UserId::new(id).to_user(&self.http).await {
            Ok(user) => Some(user_ref(&user)),
            Err(e) => {
                debug!("Failed to fetch user {}: {}", id, e);
                None
            }
        }
    }

    async fn guild(&self, id: u64) -> Option<GuildRef> {
        if id == 0 {
            return None;
        }
        match GuildId::new(id).to_partial_guild(&self.http).await {
            Ok(guild) => Some(GuildRef {
                id: guild.id.get(),
                name: guild.name.clone(),
                icon_url: guild.icon_url(),
            }),
            Err(e) => {
                warn!("Guild {} is unavailable: {}", id, e);
                None
            }
        }
    }

    async fn modmail_guild(&self) -> Option<GuildRef> {
        self.guild(self.config.modmail_guild_id()).await
    }

    async fn resolve_grantee(&self, id: i64) -> Option<Grantee> {
        if id == EVERYONE {
            return Some(Grantee::Everyone);
        }
        let id = u64::try_from(id).ok().filter(|id| *id != 0)?;

        if let Ok(member) = self.modmail_guild_id().member(&self.http, UserId::new(id)).await {
            return Some(Grantee::Member {
                id,
                name: member.user.name.clone(),
            });
        }
        self.roles()
            .await
            .get(&RoleId::new(id))
            .map(|role| Grantee::Role {
                id,
                name: role.name.clone(),
            })
    }

    async fn create_category(
        &self,
        name: &str,
        grants: &[Grantee],
    ) -> Result<CategoryRef, DiscordError> {
        let guild = self.modmail_guild_id();
        let bot = self.http.get_current_user().await?;
        let builder = CreateChannel::new(name)
            .kind(ChannelType::Category)
            .permissions(category_overwrites(guild, bot.id, grants))
            .position(0);
        let channel = guild.create_channel(&self.http, builder).await?;
        Ok(category_ref(&channel))
    }

    async fn create_text_channel(
        &self,
        name: &str,
        category: &CategoryRef,
    ) -> Result<u64, DiscordError> {
        let builder = CreateChannel::new(name)
            .kind(ChannelType::Text)
            .category(ChannelId::new(category.id));
        let channel = self
            .modmail_guild_id()
            .create_channel(&self.http, builder)
            .await?;
        Ok(channel.id.get())
    }

    async fn send_embed(&self, channel_id: u64, embed: EmbedSpec) -> Result<(), DiscordError> {
        let message = CreateMessage::new().embed(build_embed(&embed, &self.config.colors()));
        ChannelId::new(channel_id)
            .send_message(&self.http, message)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_hidden_from_everyone() {
        let guild = GuildId::new(1000);
        let overwrites = category_overwrites(guild, UserId::new(5), &[]);
        assert_eq!(overwrites.len(), 2);
        assert_eq!(
            overwrites[0].kind,
            PermissionOverwriteType::Role(RoleId::new(1000))
        );
        assert_eq!(overwrites[0].deny, Permissions::VIEW_CHANNEL);
        assert!(overwrites[1].allow.view_channel());
    }

    #[test]
    fn test_grants_become_overwrites() {
        let guild = GuildId::new(1000);
        let grants = vec![
            Grantee::Role {
                id: 300,
                name: "Support".to_string(),
            },
            Grantee::Member {
                id: 7,
                name: "helper".to_string(),
            },
            Grantee::Everyone,
        ];
        let overwrites = category_overwrites(guild, UserId::new(5), &grants);
        assert_eq!(overwrites.len(), 4);
        assert_eq!(overwrites[0].allow, Permissions::VIEW_CHANNEL);
        assert!(overwrites[0].deny.is_empty());
        assert!(overwrites
            .iter()
            .any(|o| o.kind == PermissionOverwriteType::Role(RoleId::new(300))));
        assert!(overwrites
            .iter()
            .any(|o| o.kind == PermissionOverwriteType::Member(UserId::new(7))));
    }
}
