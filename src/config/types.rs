//! Configuration type definitions.

use std::path::PathBuf;

use serde::Deserialize;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub discord: DiscordConfig,
    #[serde(default)]
    pub logs: LogsConfig,
    #[serde(default)]
    pub appearance: AppearanceConfig,
    #[serde(default)]
    pub threads: ThreadsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub language: LanguageConfig,
}

/// Discord bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    pub token: String,
    /// Guild whose members open threads.
    pub guild_id: u64,
    /// Staff guild hosting thread channels; defaults to `guild_id`.
    pub modmail_guild_id: Option<u64>,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Users with absolute power over the bot.
    #[serde(default)]
    pub owners: Vec<u64>,
}

/// Where closed thread logs can be viewed.
#[derive(Debug, Clone, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_log_url")]
    pub url: String,
    /// Path segment between the base url and the log key, `NONE` to omit.
    #[serde(default = "default_log_url_prefix")]
    pub url_prefix: String,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            url: default_log_url(),
            url_prefix: default_log_url_prefix(),
        }
    }
}

/// Embed colors and reaction emoji.
#[derive(Debug, Clone, Deserialize)]
pub struct AppearanceConfig {
    #[serde(default = "default_main_color")]
    pub main_color: String,
    #[serde(default = "default_error_color")]
    pub error_color: String,
    #[serde(default = "default_mod_color")]
    pub mod_color: String,
    #[serde(default = "default_recipient_color")]
    pub recipient_color: String,
    #[serde(default = "default_sent_emoji")]
    pub sent_emoji: String,
    #[serde(default = "default_blocked_emoji")]
    pub blocked_emoji: String,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            main_color: default_main_color(),
            error_color: default_error_color(),
            mod_color: default_mod_color(),
            recipient_color: default_recipient_color(),
            sent_emoji: default_sent_emoji(),
            blocked_emoji: default_blocked_emoji(),
        }
    }
}

/// Thread behaviour and canned texts.
#[derive(Debug, Clone, Deserialize)]
pub struct ThreadsConfig {
    #[serde(default)]
    pub move_notify: bool,
    #[serde(default = "default_move_response")]
    pub move_response: String,
    #[serde(default = "default_close_response")]
    pub close_response: String,
    #[serde(default = "default_creation_response")]
    pub creation_response: String,
    #[serde(default = "default_disabled_new_thread_response")]
    pub disabled_new_thread_response: String,
    #[serde(default = "default_disabled_current_thread_response")]
    pub disabled_current_thread_response: String,
    /// Name shown to recipients for anonymous replies.
    pub anon_username: Option<String>,
    #[serde(default = "default_anon_tag")]
    pub anon_tag: String,
    #[serde(default = "default_mod_tag")]
    pub mod_tag: String,
}

impl Default for ThreadsConfig {
    fn default() -> Self {
        Self {
            move_notify: false,
            move_response: default_move_response(),
            close_response: default_close_response(),
            creation_response: default_creation_response(),
            disabled_new_thread_response: default_disabled_new_thread_response(),
            disabled_current_thread_response: default_disabled_current_thread_response(),
            anon_username: None,
            anon_tag: default_anon_tag(),
            mod_tag: default_mod_tag(),
        }
    }
}

/// On-disk locations of the settings document and the log database.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_settings_file")]
    pub settings_file: String,
    #[serde(default = "default_logs_database")]
    pub logs_database: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            settings_file: default_settings_file(),
            logs_database: default_logs_database(),
        }
    }
}

/// Language of the texts shown to users.
#[derive(Debug, Clone, Deserialize)]
pub struct LanguageConfig {
    /// Catalog name, `{directory}/{language}.csv`.
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_languages_dir")]
    pub directory: PathBuf,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            directory: default_languages_dir(),
        }
    }
}

/// Embed colors resolved to RGB integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Colors {
    pub main: u32,
    pub error: u32,
    pub moderator: u32,
    pub recipient: u32,
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            main: 0x7289DA,
            error: 0xE74C3C,
            moderator: 0x2ECC71,
            recipient: 0xF1C40F,
        }
    }
}

impl Config {
    /// The staff guild id.
    pub fn modmail_guild_id(&self) -> u64 {
        self.discord.modmail_guild_id.unwrap_or(self.discord.guild_id)
    }

    /// Parsed embed colors; unparsable values fall back to the defaults.
    pub fn colors(&self) -> Colors {
        let defaults = Colors::default();
        Colors {
            main: parse_color(&self.appearance.main_color).unwrap_or(defaults.main),
            error: parse_color(&self.appearance.error_color).unwrap_or(defaults.error),
            moderator: parse_color(&self.appearance.mod_color).unwrap_or(defaults.moderator),
            recipient: parse_color(&self.appearance.recipient_color)
                .unwrap_or(defaults.recipient),
        }
    }

    pub fn settings_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.settings_file)
    }

    pub fn language_catalog_path(&self) -> PathBuf {
        self.language
            .directory
            .join(format!("{}.csv", self.language.language))
    }

    pub fn logs_database_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.logs_database)
    }

    /// Base url for a log key, without the trailing slash.
    pub fn log_base_url(&self) -> String {
        let base = self.logs.url.trim_matches('/');
        let prefix = self.logs.url_prefix.trim_matches('/');
        if prefix.is_empty() || prefix == "NONE" {
            base.to_string()
        } else {
            format!("{}/{}", base, prefix)
        }
    }

    pub fn log_url(&self, key: &str) -> String {
        format!("{}/{}", self.log_base_url(), key)
    }
}

/// Parse `#rrggbb`, `0xrrggbb` or a bare hex triplet.
pub fn parse_color(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    let hex = trimmed
        .strip_prefix('#')
        .or_else(|| trimmed.strip_prefix("0x"))
        .unwrap_or(trimmed);
    if hex.len() != 6 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

fn default_prefix() -> String {
    "?".to_string()
}

fn default_log_url() -> String {
    "https://example.com".to_string()
}

fn default_log_url_prefix() -> String {
    "/logs".to_string()
}

fn default_main_color() -> String {
    "#7289da".to_string()
}

fn default_error_color() -> String {
    "#e74c3c".to_string()
}

fn default_mod_color() -> String {
    "#2ecc71".to_string()
}

fn default_recipient_color() -> String {
    "#f1c40f".to_string()
}

fn default_sent_emoji() -> String {
    "✅".to_string()
}

fn default_blocked_emoji() -> String {
    "🚫".to_string()
}

fn default_move_response() -> String {
    "This thread has been moved.".to_string()
}

fn default_close_response() -> String {
    "{closer} has closed this Modmail thread.".to_string()
}

fn default_creation_response() -> String {
    "The staff team will get back to you as soon as possible.".to_string()
}

fn default_disabled_new_thread_response() -> String {
    "We are not accepting new threads.".to_string()
}

fn default_disabled_current_thread_response() -> String {
    "We are not accepting any messages.".to_string()
}

fn default_anon_tag() -> String {
    "Response".to_string()
}

fn default_mod_tag() -> String {
    "Staff".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_languages_dir() -> PathBuf {
    PathBuf::from("languages")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_settings_file() -> String {
    "settings.json".to_string()
}

fn default_logs_database() -> String {
    "logs.db".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parser::load_config_str;

    const MINIMAL: &str = r#"
        discord {
            token = "abc"
            guild_id = 42
        }
    "#;

    #[test]
    fn test_defaults_fill_optional_sections() {
        let config = load_config_str(MINIMAL).unwrap();
        assert_eq!(config.discord.prefix, "?");
        assert_eq!(config.modmail_guild_id(), 42);
        assert_eq!(config.appearance.sent_emoji, "✅");
        assert!(!config.threads.move_notify);
        assert_eq!(config.settings_path(), PathBuf::from("data/settings.json"));
        assert_eq!(config.language_catalog_path(), PathBuf::from("languages/en.csv"));
    }

    #[test]
    fn test_parse_color_variants() {
        assert_eq!(parse_color("#7289da"), Some(0x7289DA));
        assert_eq!(parse_color("0xFF0000"), Some(0xFF0000));
        assert_eq!(parse_color("00ff00"), Some(0x00FF00));
        assert_eq!(parse_color("red"), None);
        assert_eq!(parse_color("#12345"), None);
    }

    #[test]
    fn test_log_url_with_prefix() {
        let mut config = load_config_str(MINIMAL).unwrap();
        config.logs.url = "https://logs.example.org/".to_string();
        config.logs.url_prefix = "/logs/".to_string();
        assert_eq!(config.log_url("abc123"), "https://logs.example.org/logs/abc123");
    }

    #[test]
    fn test_log_url_without_prefix() {
        let mut config = load_config_str(MINIMAL).unwrap();
        config.logs.url = "https://logs.example.org".to_string();
        config.logs.url_prefix = "NONE".to_string();
        assert_eq!(config.log_url("k"), "https://logs.example.org/k");

        config.logs.url_prefix = String::new();
        assert_eq!(config.log_url("k"), "https://logs.example.org/k");
    }

    #[test]
    fn test_invalid_color_falls_back() {
        let mut config = load_config_str(MINIMAL).unwrap();
        config.appearance.error_color = "not-a-color".to_string();
        assert_eq!(config.colors().error, Colors::default().error);
    }
}
