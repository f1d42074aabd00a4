//! The dynamic settings document edited by staff commands.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use fancy_regex::Regex;
use serde::{Deserialize, Serialize};

/// Id placeholder granting a permission to everyone.
pub const EVERYONE: i64 = -1;

/// Prefix of block reasons written by the bot itself rather than staff.
pub const SYSTEM_BLOCK_PREFIX: &str = "System Message: ";

/// How much of the direct-message relay is switched off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DmDisabled {
    /// Everything is relayed.
    #[default]
    Enabled,
    /// No new threads are created from direct messages.
    NewThreads,
    /// No direct messages are relayed at all.
    All,
}

impl TryFrom<u8> for DmDisabled {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Enabled),
            1 => Ok(Self::NewThreads),
            2 => Ok(Self::All),
            other => Err(format!("invalid dm_disabled value {}", other)),
        }
    }
}

impl From<DmDisabled> for u8 {
    fn from(value: DmDisabled) -> Self {
        match value {
            DmDisabled::Enabled => 0,
            DmDisabled::NewThreads => 1,
            DmDisabled::All => 2,
        }
    }
}

/// Block state of a user as seen by the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockStatus {
    NotBlocked,
    Whitelisted,
    Blocked { reason: String },
    /// A timed block whose end has passed.
    Expired,
}

/// Persistent bot settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub snippets: BTreeMap<String, String>,
    /// Alias name to the command text it expands to.
    pub aliases: BTreeMap<String, String>,
    /// Blocked user id to block reason.
    pub blocked: BTreeMap<String, String>,
    pub blocked_whitelist: Vec<String>,
    /// Thread id to mentions pinged once on the next recipient message.
    pub notification_squad: HashMap<String, Vec<String>>,
    /// Thread id to mentions pinged on every recipient message.
    pub subscriptions: HashMap<String, Vec<String>>,
    pub dm_disabled: DmDisabled,
    pub main_category_id: Option<u64>,
    pub log_channel_id: Option<u64>,
    /// Permission level name to user/role ids (`EVERYONE` for all).
    pub level_permissions: BTreeMap<String, Vec<i64>>,
    /// Qualified command name to user/role ids (`EVERYONE` for all).
    pub command_permissions: BTreeMap<String, Vec<i64>>,
}

impl Settings {
    /// Grant a permission level to a user or role id.
    ///
    /// Returns `false` when the id already had the level.
    pub fn update_perms(&mut self, level: &str, id: i64) -> bool {
        let ids = self.level_permissions.entry(level.to_string()).or_default();
        if ids.contains(&id) {
            return false;
        }
        ids.push(id);
        true
    }

    pub fn is_whitelisted(&self, user_id: u64) -> bool {
        self.blocked_whitelist.contains(&user_id.to_string())
    }

    /// Resolve whether a user may reach the staff right now.
    pub fn block_status(&self, user_id: u64, now: DateTime<Utc>) -> BlockStatus {
        if self.is_whitelisted(user_id) {
            return BlockStatus::Whitelisted;
        }
        let key = user_id.to_string();
        let Some(reason) = self.blocked.get(&key) else {
            return BlockStatus::NotBlocked;
        };
        match block_end(reason) {
            Some(end) if end <= now => BlockStatus::Expired,
            _ => BlockStatus::Blocked {
                reason: reason.clone(),
            },
        }
    }

    /// Mentions to ping for a recipient message; consumes the one-shot list.
    pub fn take_mentions(&mut self, thread_key: &str) -> Vec<String> {
        let mut mentions = self
            .subscriptions
            .get(thread_key)
            .cloned()
            .unwrap_or_default();
        for mention in self.notification_squad.remove(thread_key).unwrap_or_default() {
            if !mentions.contains(&mention) {
                mentions.push(mention);
            }
        }
        mentions
    }

    /// Drop per-thread state once a thread closes.
    pub fn forget_thread(&mut self, thread_key: &str) {
        self.notification_squad.remove(thread_key);
        self.subscriptions.remove(thread_key);
    }
}

/// End of a timed block, parsed from the `until <rfc3339>.` suffix.
pub fn block_end(reason: &str) -> Option<DateTime<Utc>> {
    let re = Regex::new(r"until (\S+?)\.$").ok()?;
    let captures = re.captures(reason.trim()).ok()??;
    let raw = captures.get(1)?.as_str();
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_dm_disabled_serializes_as_integer() {
        let mut settings = Settings::default();
        settings.dm_disabled = DmDisabled::All;
        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["dm_disabled"], 2);

        let back: Settings = serde_json::from_value(json).unwrap();
        assert_eq!(back.dm_disabled, DmDisabled::All);
    }

    #[test]
    fn test_dm_disabled_rejects_unknown_value() {
        let result: Result<Settings, _> = serde_json::from_str(r#"{"dm_disabled": 7}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_fields_default() {
        let settings: Settings = serde_json::from_str(r#"{"snippets": {"hi": "hello"}}"#).unwrap();
        assert_eq!(settings.snippets.get("hi").map(String::as_str), Some("hello"));
        assert_eq!(settings.dm_disabled, DmDisabled::Enabled);
        assert!(settings.blocked.is_empty());
    }

    #[test]
    fn test_update_perms_is_idempotent() {
        let mut settings = Settings::default();
        assert!(settings.update_perms("REGULAR", EVERYONE));
        assert!(!settings.update_perms("REGULAR", EVERYONE));
        assert_eq!(settings.level_permissions["REGULAR"], vec![EVERYONE]);
    }

    #[test]
    fn test_block_status_timed_block() {
        let now = Utc::now();
        let until = (now + Duration::hours(1)).to_rfc3339();
        let mut settings = Settings::default();
        settings
            .blocked
            .insert("5".to_string(), format!("by mod#0001 until {}.", until));

        assert!(matches!(settings.block_status(5, now), BlockStatus::Blocked { .. }));
        assert_eq!(
            settings.block_status(5, now + Duration::hours(2)),
            BlockStatus::Expired
        );
        assert_eq!(settings.block_status(6, now), BlockStatus::NotBlocked);
    }

    #[test]
    fn test_whitelist_wins_over_block() {
        let mut settings = Settings::default();
        settings.blocked.insert("5".to_string(), "by mod.".to_string());
        settings.blocked_whitelist.push("5".to_string());
        assert_eq!(settings.block_status(5, Utc::now()), BlockStatus::Whitelisted);
    }

    #[test]
    fn test_take_mentions_consumes_notifications_only() {
        let mut settings = Settings::default();
        settings
            .subscriptions
            .insert("1".to_string(), vec!["<@10>".to_string()]);
        settings
            .notification_squad
            .insert("1".to_string(), vec!["<@10>".to_string(), "@here".to_string()]);

        assert_eq!(settings.take_mentions("1"), vec!["<@10>", "@here"]);
        assert_eq!(settings.take_mentions("1"), vec!["<@10>"]);
    }

    #[test]
    fn test_block_end_without_until() {
        assert!(block_end("by mod#0001 for `spam`.").is_none());
    }
}
