//! Text helpers shared by command responses.

use std::borrow::Cow;

use fancy_regex::{Captures, Regex};

use crate::logs::LogMessage;
use crate::translations::Translator;
use crate::ui::embed::EmbedSpec;

/// Entries per page of a numbered listing.
pub const PAGE_SIZE: usize = 15;

/// Similarity required for a "perhaps you meant" suggestion.
const CLOSE_MATCH_CUTOFF: f64 = 0.6;
const CLOSE_MATCH_COUNT: usize = 2;

const MENTION_PATTERN: &str = r"@(everyone|here|[!&]?[0-9]{17,20})";
const MARKDOWN_PATTERN: &str = r#"(?m)(?P<url>(?:https?|steam)://[^\s<]+[^<.,:;"'\]\s])|(?P<markdown>[_\\~|*`]|^>(?:>>)?\s)"#;

/// Cut `text` to at most `max` characters, ending in `...` when shortened.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let head: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", head.trim())
}

/// Break `@everyone`, `@here` and user/role mentions with a zero-width space.
pub fn escape_mentions(text: &str) -> String {
    match Regex::new(MENTION_PATTERN) {
        Ok(re) => re.replace_all(text, "@\u{200b}$1").into_owned(),
        Err(_) => text.to_string(),
    }
}

/// Backslash-escape markdown control characters, leaving links intact.
pub fn escape_markdown(text: &str) -> String {
    let Ok(re) = Regex::new(MARKDOWN_PATTERN) else {
        return text.to_string();
    };
    re.replace_all(text, |caps: &Captures<'_>| -> Cow<'static, str> {
        if let Some(url) = caps.name("url") {
            return Cow::Owned(url.as_str().to_string());
        }
        match caps.name("markdown") {
            Some(m) => Cow::Owned(format!("\\{}", m.as_str())),
            None => Cow::Borrowed(""),
        }
    })
    .into_owned()
}

/// Numbered listing for one page of names.
pub fn format_description(page: usize, names: &[String]) -> String {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| format!("{}: {}", i + 1 + page * PAGE_SIZE, name))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Short preview of the first log messages, skipping staff-only ones.
pub fn format_preview(messages: &[LogMessage]) -> String {
    let mut out = String::new();
    for message in messages.iter().take(3) {
        if message.kind.is_private() {
            continue;
        }
        let prefix = if message.author.is_mod { "[M]" } else { "[R]" };
        let content = message.content.replace('\n', " ");
        let line = format!("`{} {}:` {}", prefix, message.author.tag(), content);
        out.push_str(&truncate(&line, 75));
        out.push('\n');
    }
    if out.is_empty() {
        "No Messages".to_string()
    } else {
        out
    }
}

/// Error embed for an unknown name, suggesting close matches.
pub fn not_found_embed<'a>(
    translator: &Translator,
    word: &str,
    candidates: impl IntoIterator<Item = &'a str>,
    kind: &str,
) -> EmbedSpec {
    let mut description = translator.format(
        "**{kind} `{word}` cannot be found.**",
        &[("kind", &capitalize(kind)), ("word", word)],
    );
    let matches = close_matches(word, candidates, CLOSE_MATCH_COUNT, CLOSE_MATCH_CUTOFF);
    if !matches.is_empty() {
        description.push('\n');
        description.push_str(translator.translate("However, perhaps you meant..."));
        description.push('\n');
        description.push_str(&matches.join("\n"));
    }
    EmbedSpec::error().description(description)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}

/// The best `n` candidates whose similarity to `word` reaches `cutoff`.
pub fn close_matches<'a>(
    word: &str,
    candidates: impl IntoIterator<Item = &'a str>,
    n: usize,
    cutoff: f64,
) -> Vec<String> {
    let mut scored: Vec<(f64, &str)> = candidates
        .into_iter()
        .map(|candidate| (similarity(word, candidate), candidate))
        .filter(|(score, _)| *score >= cutoff)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| b.1.cmp(a.1)));
    scored
        .into_iter()
        .take(n)
        .map(|(_, candidate)| candidate.to_string())
        .collect()
}

/// Ratcliff/Obershelp similarity in `0.0..=1.0`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (start_a, start_b, len) = longest_common_run(a, b);
    if len == 0 {
        return 0;
    }
    len + matching_chars(&a[..start_a], &b[..start_b])
        + matching_chars(&a[start_a + len..], &b[start_b + len..])
}

/// Earliest longest common substring as `(start_a, start_b, len)`.
fn longest_common_run(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut previous = vec![0usize; b.len() + 1];
    for i in 0..a.len() {
        let mut current = vec![0usize; b.len() + 1];
        for j in 0..b.len() {
            if a[i] == b[j] {
                current[j + 1] = previous[j] + 1;
                if current[j + 1] > best.2 {
                    best = (i + 1 - current[j + 1], j + 1 - current[j + 1], current[j + 1]);
                }
            }
        }
        previous = current;
    }
    best
}
