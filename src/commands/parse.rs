//! Argument splitting and mention parsing.

use fancy_regex::Regex;

const USER_MENTION: &str = r"^<@!?(\d+)>$";
const ROLE_MENTION: &str = r"^<@&(\d+)>$";
const CHANNEL_MENTION: &str = r"^<#(\d+)>$";

/// Split off the first argument, honouring double quotes.
///
/// Returns the argument without its quotes and the trimmed remainder.
pub fn split_first(input: &str) -> Option<(String, &str)> {
    let input = input.trim_start();
    if input.is_empty() {
        return None;
    }

    if let Some(quoted) = input.strip_prefix('"') {
        if let Some(end) = quoted.find('"') {
            let rest = &quoted[end + 1..];
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                return Some((quoted[..end].to_string(), rest.trim()));
            }
        }
    }

    match input.find(char::is_whitespace) {
        Some(end) => Some((input[..end].to_string(), input[end..].trim())),
        None => Some((input.to_string(), "")),
    }
}

/// Optional trailing text: `None` when blank.
pub fn rest_opt(input: &str) -> Option<&str> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn capture_id(pattern: &str, arg: &str) -> Option<u64> {
    let re = Regex::new(pattern).ok()?;
    let captures = re.captures(arg.trim()).ok()??;
    captures.get(1)?.as_str().parse().ok()
}

/// A bare snowflake id.
pub fn parse_id(arg: &str) -> Option<u64> {
    let arg = arg.trim();
    if arg.is_empty() || !arg.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    arg.parse().ok()
}

/// Whether `arg` has the shape of a Discord snowflake: 15 to 20 digits.
pub fn is_snowflake(arg: &str) -> bool {
    let arg = arg.trim();
    (15..=20).contains(&arg.len()) && arg.chars().all(|c| c.is_ascii_digit())
}

/// `<@id>` / `<@!id>` or a bare snowflake.
///
/// Short numbers are left alone so they can be read as durations or text.
pub fn parse_user_id(arg: &str) -> Option<u64> {
    capture_id(USER_MENTION, arg).or_else(|| {
        if is_snowflake(arg) {
            parse_id(arg)
        } else {
            None
        }
    })
}

/// `<@&id>` or a bare id.
pub fn parse_role_id(arg: &str) -> Option<u64> {
    capture_id(ROLE_MENTION, arg).or_else(|| parse_id(arg))
}

/// `<#id>` or a bare id.
pub fn parse_channel_id(arg: &str) -> Option<u64> {
    capture_id(CHANNEL_MENTION, arg).or_else(|| parse_id(arg))
}

/// `name#1234` split into name and discriminator.
pub fn split_tag(arg: &str) -> (&str, Option<u16>) {
    if let Some((name, discriminator)) = arg.rsplit_once('#') {
        if discriminator.len() == 4 {
            if let Ok(d) = discriminator.parse() {
                return (name, Some(d));
            }
        }
    }
    (arg, None)
}

/// Last path segment of a log link, or the key itself.
pub fn log_key(key_or_link: &str) -> &str {
    key_or_link
        .trim()
        .rsplit('/')
        .next()
        .unwrap_or(key_or_link)
}
