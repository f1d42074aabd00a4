//! Shared types used across the application.
//!
//! These are plain snapshots of Discord entities so the command layer can be
//! exercised without a gateway connection.

/// Snapshot of a Discord user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRef {
    pub id: u64,
    pub name: String,
    /// Legacy four digit discriminator, `None` for migrated usernames.
    pub discriminator: Option<u16>,
    pub avatar_url: Option<String>,
    pub bot: bool,
}

impl UserRef {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            discriminator: None,
            avatar_url: None,
            bot: false,
        }
    }

    pub fn with_discriminator(mut self, discriminator: u16) -> Self {
        self.discriminator = Some(discriminator);
        self
    }

    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }

    /// `name#1234`, or the bare name when the user has no discriminator.
    pub fn tag(&self) -> String {
        match self.discriminator {
            Some(d) => format!("{}#{:04}", self.name, d),
            None => self.name.clone(),
        }
    }

    /// Discriminator rendered the way log entries store it.
    pub fn discriminator_str(&self) -> String {
        self.discriminator
            .map(|d| format!("{:04}", d))
            .unwrap_or_else(|| "0".to_string())
    }
}

/// Snapshot of a guild role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRef {
    pub id: u64,
    pub name: String,
}

impl RoleRef {
    pub fn mention(&self) -> String {
        format!("<@&{}>", self.id)
    }
}

/// Snapshot of a channel category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRef {
    pub id: u64,
    pub name: String,
}

/// Snapshot of a guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildRef {
    pub id: u64,
    pub name: String,
    pub icon_url: Option<String>,
}

/// An open modmail thread.
///
/// A thread is identified by its recipient: per-thread settings lists are
/// keyed by the recipient's user id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadInfo {
    pub recipient: UserRef,
    pub channel_id: u64,
}

impl ThreadInfo {
    pub fn id(&self) -> u64 {
        self.recipient.id
    }

    /// Key used by the per-thread settings maps.
    pub fn key(&self) -> String {
        self.recipient.id.to_string()
    }

    pub fn channel_mention(&self) -> String {
        format!("<#{}>", self.channel_id)
    }
}

/// Something that can receive access to the modmail category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grantee {
    Everyone,
    Member { id: u64, name: String },
    Role { id: u64, name: String },
}

impl Grantee {
    pub fn name(&self) -> &str {
        match self {
            Grantee::Everyone => "@everyone",
            Grantee::Member { name, .. } | Grantee::Role { name, .. } => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_tag_with_discriminator() {
        let user = UserRef::new(1, "alice").with_discriminator(42);
        assert_eq!(user.tag(), "alice#0042");
        assert_eq!(user.discriminator_str(), "0042");
    }

    #[test]
    fn test_user_tag_without_discriminator() {
        let user = UserRef::new(1, "bob");
        assert_eq!(user.tag(), "bob");
        assert_eq!(user.discriminator_str(), "0");
        assert_eq!(user.mention(), "<@1>");
    }

    #[test]
    fn test_thread_key_is_recipient_id() {
        let thread = ThreadInfo {
            recipient: UserRef::new(99, "carol"),
            channel_id: 5,
        };
        assert_eq!(thread.key(), "99");
        assert_eq!(thread.channel_mention(), "<#5>");
    }
}
