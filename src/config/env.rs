//! Environment variable overrides for configuration.
//!
//! Supports overriding config values with environment variables:
//! - `MODMAIL_DISCORD_TOKEN` - Discord bot token
//! - `MODMAIL_GUILD_ID` - Guild whose members open threads
//! - `MODMAIL_MODMAIL_GUILD_ID` - Staff guild hosting thread channels
//! - `MODMAIL_PREFIX` - Command prefix
//! - `MODMAIL_LOG_URL` - Base url of the log viewer
//! - `MODMAIL_DATA_DIR` - Directory for the settings file and log database
//! - `MODMAIL_LANGUAGE` - Language catalog of user-facing texts

use std::env;
use std::path::PathBuf;

use crate::config::types::Config;

/// Environment variable prefix for all config overrides.
const ENV_PREFIX: &str = "MODMAIL";

/// Apply environment variable overrides to a config.
///
/// This allows the token to be provided via the environment instead of
/// the config file.
pub fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(token) = env::var(format!("{}_DISCORD_TOKEN", ENV_PREFIX)) {
        config.discord.token = token;
    }

    if let Ok(guild_id) = env::var(format!("{}_GUILD_ID", ENV_PREFIX)) {
        if let Ok(id) = guild_id.parse() {
            config.discord.guild_id = id;
        }
    }
    if let Ok(guild_id) = env::var(format!("{}_MODMAIL_GUILD_ID", ENV_PREFIX)) {
        if let Ok(id) = guild_id.parse() {
            config.discord.modmail_guild_id = Some(id);
        }
    }

    if let Ok(prefix) = env::var(format!("{}_PREFIX", ENV_PREFIX)) {
        if !prefix.is_empty() {
            config.discord.prefix = prefix;
        }
    }

    if let Ok(url) = env::var(format!("{}_LOG_URL", ENV_PREFIX)) {
        config.logs.url = url;
    }

    if let Ok(dir) = env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
        config.storage.data_dir = PathBuf::from(dir);
    }

    if let Ok(language) = env::var(format!("{}_LANGUAGE", ENV_PREFIX)) {
        if !language.is_empty() {
            config.language.language = language;
        }
    }

    config
}

/// Check if any required environment variables are set but empty.
///
/// Returns a list of variable names that are set but empty.
pub fn check_empty_env_vars() -> Vec<String> {
    let vars = [format!("{}_DISCORD_TOKEN", ENV_PREFIX)];

    vars.into_iter()
        .filter(|var| env::var(var).map(|v| v.is_empty()).unwrap_or(false))
        .collect()
}

/// Get the config file path from environment or use default.
///
/// Checks `MODMAIL_CONFIG` environment variable, otherwise returns "modmail.conf".
pub fn get_config_path() -> String {
    env::var(format!("{}_CONFIG", ENV_PREFIX)).unwrap_or_else(|_| "modmail.conf".to_string())
}
