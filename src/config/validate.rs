//! Configuration validation.
//!
//! Validates configuration values and provides helpful error messages.

use fancy_regex::Regex;

use crate::common::error::ConfigError;
use crate::config::types::{parse_color, Config};

/// Validate a configuration and return detailed errors.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    // Validate Discord config
    if config.discord.token.is_empty() {
        errors.push("discord.token is required".to_string());
    }
    if config.discord.token == "YOUR_DISCORD_TOKEN_HERE" {
        errors.push("discord.token has not been configured (still using placeholder)".to_string());
    }
    if config.discord.guild_id == 0 {
        errors.push("discord.guild_id must be non-zero".to_string());
    }
    if config.discord.modmail_guild_id == Some(0) {
        errors.push("discord.modmail_guild_id must be non-zero when set".to_string());
    }

    let prefix = &config.discord.prefix;
    if prefix.is_empty() || prefix.chars().count() > 10 {
        errors.push(format!(
            "discord.prefix must be 1-10 characters (got {})",
            prefix.chars().count()
        ));
    }
    if prefix.chars().any(char::is_whitespace) {
        errors.push("discord.prefix must not contain whitespace".to_string());
    }

    // Validate appearance
    let colors = [
        ("appearance.main_color", &config.appearance.main_color),
        ("appearance.error_color", &config.appearance.error_color),
        ("appearance.mod_color", &config.appearance.mod_color),
        ("appearance.recipient_color", &config.appearance.recipient_color),
    ];
    for (field, value) in colors {
        if parse_color(value).is_none() {
            errors.push(format!("{} '{}' is not a hex color", field, value));
        }
    }

    let emoji = [
        ("appearance.sent_emoji", &config.appearance.sent_emoji),
        ("appearance.blocked_emoji", &config.appearance.blocked_emoji),
    ];
    for (field, value) in emoji {
        if !is_valid_reaction(value) {
            errors.push(format!(
                "{} '{}' is neither a unicode emoji nor a custom emoji",
                field, value
            ));
        }
    }

    if config.logs.url.trim().is_empty() {
        errors.push("logs.url is required".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}

/// Unicode emoji or a custom emoji mention like `<:name:123>`.
pub fn is_valid_reaction(value: &str) -> bool {
    if emojis::get(value).is_some() {
        return true;
    }
    Regex::new(r"^<a?:\w{2,32}:\d{15,21}>$")
        .map(|re| re.is_match(value).unwrap_or(false))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parser::load_config_str;

    fn make_valid_config() -> Config {
        load_config_str(
            r#"
            discord {
                token = "valid_token_here"
                guild_id = 123456789
                owners = [1]
            }
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_valid_config_passes() {
        let config = make_valid_config();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_token_fails() {
        let mut config = make_valid_config();
        config.discord.token = String::new();

        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("discord.token"));
    }

    #[test]
    fn test_placeholder_token_fails() {
        let mut config = make_valid_config();
        config.discord.token = "YOUR_DISCORD_TOKEN_HERE".to_string();

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("placeholder"));
    }

    #[test]
    fn test_prefix_with_space_fails() {
        let mut config = make_valid_config();
        config.discord.prefix = "? ".to_string();

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("whitespace"));
    }

    #[test]
    fn test_bad_color_fails() {
        let mut config = make_valid_config();
        config.appearance.mod_color = "green".to_string();

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("appearance.mod_color"));
    }

    #[test]
    fn test_reaction_validation() {
        assert!(is_valid_reaction("✅"));
        assert!(is_valid_reaction("<:done:123456789012345678>"));
        assert!(is_valid_reaction("<a:spin:123456789012345678>"));
        assert!(!is_valid_reaction("done"));
        assert!(!is_valid_reaction(""));
    }
}
