//! Staff permission levels and the command permission check.

use std::fmt;

use tracing::{debug, warn};

use crate::settings::{Settings, EVERYONE};

/// Ordered staff permission levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PermissionLevel {
    Invalid,
    Regular,
    Supporter,
    Moderator,
    Administrator,
    Owner,
}

impl PermissionLevel {
    /// Every real level, highest first.
    pub const ALL: [PermissionLevel; 5] = [
        PermissionLevel::Owner,
        PermissionLevel::Administrator,
        PermissionLevel::Moderator,
        PermissionLevel::Supporter,
        PermissionLevel::Regular,
    ];

    pub fn value(self) -> i8 {
        match self {
            PermissionLevel::Owner => 5,
            PermissionLevel::Administrator => 4,
            PermissionLevel::Moderator => 3,
            PermissionLevel::Supporter => 2,
            PermissionLevel::Regular => 1,
            PermissionLevel::Invalid => -1,
        }
    }

    /// Key used in `level_permissions`.
    pub fn name(self) -> &'static str {
        match self {
            PermissionLevel::Owner => "OWNER",
            PermissionLevel::Administrator => "ADMINISTRATOR",
            PermissionLevel::Moderator => "MODERATOR",
            PermissionLevel::Supporter => "SUPPORTER",
            PermissionLevel::Regular => "REGULAR",
            PermissionLevel::Invalid => "INVALID",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "OWNER" => Some(PermissionLevel::Owner),
            "ADMINISTRATOR" | "ADMIN" => Some(PermissionLevel::Administrator),
            "MODERATOR" | "MOD" => Some(PermissionLevel::Moderator),
            "SUPPORTER" | "RESPONDER" => Some(PermissionLevel::Supporter),
            "REGULAR" => Some(PermissionLevel::Regular),
            _ => None,
        }
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The person running a command, with what the check needs to know.
#[derive(Debug, Clone, Default)]
pub struct Invoker {
    pub user_id: u64,
    pub role_ids: Vec<u64>,
    /// Holds the Administrator permission in the channel's guild.
    pub is_guild_admin: bool,
    /// The command was sent inside the modmail guild.
    pub in_modmail_guild: bool,
}

impl Invoker {
    fn matches_any(&self, ids: &[i64]) -> bool {
        ids.iter().any(|&id| {
            id == EVERYONE
                || id as u64 == self.user_id
                || self.role_ids.iter().any(|&role| role == id as u64)
        })
    }
}

/// Decide whether `invoker` may run `command` requiring `required`.
pub fn check(
    invoker: &Invoker,
    command: &str,
    required: PermissionLevel,
    owners: &[u64],
    settings: &Settings,
) -> bool {
    if owners.contains(&invoker.user_id) {
        return true;
    }

    if required == PermissionLevel::Invalid {
        warn!("Invalid permission level for command {}.", command);
        return true;
    }

    if required != PermissionLevel::Owner && invoker.is_guild_admin && invoker.in_modmail_guild {
        debug!("Allowed {} due to administrator.", command);
        return true;
    }

    if let Some(ids) = settings.command_permissions.get(command) {
        if invoker.matches_any(ids) {
            return true;
        }
    }

    PermissionLevel::ALL
        .iter()
        .filter(|level| **level >= required)
        .filter_map(|level| settings.level_permissions.get(level.name()))
        .any(|ids| invoker.matches_any(ids))
}
