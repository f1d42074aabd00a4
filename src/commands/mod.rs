//! Staff commands.
//!
//! Every command is described by a [`CommandSpec`] in [`COMMANDS`]. The
//! dispatcher resolves the command, checks permissions and thread-only rules,
//! then runs the matching handler, which returns a [`crate::ui::Reply`].

pub mod blocking;
pub mod context;
pub mod dispatch;
pub mod dm;
pub mod help;
pub mod logs;
pub mod parse;
pub mod setup;
pub mod snippets;
pub mod thread;

#[cfg(test)]
pub(crate) mod testing;

pub use context::{Context, Directory, Invocation, Services, UserTarget};
pub use dispatch::{parse_command, run, Planned};

use crate::permissions::PermissionLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandId {
    Setup,
    Snippet,
    SnippetRaw,
    SnippetAdd,
    SnippetRemove,
    SnippetEdit,
    Move,
    Close,
    Notify,
    Unnotify,
    Subscribe,
    Unsubscribe,
    Nsfw,
    Sfw,
    Loglink,
    Logs,
    LogsClosedBy,
    LogsDelete,
    LogsResponded,
    LogsSearch,
    Reply,
    AnonReply,
    Note,
    Edit,
    Delete,
    Contact,
    Blocked,
    BlockedWhitelist,
    Block,
    Unblock,
    Enable,
    Disable,
    DisableAll,
    IsEnable,
    Help,
}

/// Static description of a command.
#[derive(Debug)]
pub struct CommandSpec {
    pub id: CommandId,
    pub name: &'static str,
    /// Group this subcommand belongs to.
    pub parent: Option<&'static str>,
    pub aliases: &'static [&'static str],
    pub level: PermissionLevel,
    pub thread_only: bool,
    /// Show the typing indicator while the command runs.
    pub typing: bool,
    pub usage: &'static str,
    pub summary: &'static str,
}

impl CommandSpec {
    /// `logs search`, `snippet add`, `close`.
    pub fn qualified_name(&self) -> String {
        match self.parent {
            Some(parent) => format!("{} {}", parent, self.name),
            None => self.name.to_string(),
        }
    }

    fn answers_to(&self, word: &str) -> bool {
        self.name == word || self.aliases.contains(&word)
    }

    pub fn subcommands(&self) -> impl Iterator<Item = &'static CommandSpec> + '_ {
        COMMANDS
            .iter()
            .filter(move |c| self.parent.is_none() && c.parent == Some(self.name))
    }
}

macro_rules! command {
    ($id:ident, $name:expr, $parent:expr, [$($alias:expr),*], $level:ident, $thread:expr, $typing:expr, $usage:expr, $summary:expr) => {
        CommandSpec {
            id: CommandId::$id,
            name: $name,
            parent: $parent,
            aliases: &[$($alias),*],
            level: PermissionLevel::$level,
            thread_only: $thread,
            typing: $typing,
            usage: $usage,
            summary: $summary,
        }
    };
}

pub static COMMANDS: &[CommandSpec] = &[
    command!(Setup, "setup", None, [], Owner, false, true, "", "Sets up a server for Modmail."),
    command!(Snippet, "snippet", None, ["snippets"], Supporter, false, false, "[name]",
        "Create pre-defined messages for use in threads."),
    command!(SnippetRaw, "raw", Some("snippet"), [], Supporter, false, false, "<name>",
        "View the raw content of a snippet."),
    command!(SnippetAdd, "add", Some("snippet"), [], Supporter, false, false, "<name> <value>",
        "Add a snippet. Quote multi-word names."),
    command!(SnippetRemove, "remove", Some("snippet"), ["del", "delete"], Supporter, false, false, "<name>",
        "Remove a snippet."),
    command!(SnippetEdit, "edit", Some("snippet"), [], Supporter, false, false, "<name> <value>",
        "Edit a snippet. Quote multi-word names."),
    command!(Move, "move", None, [], Moderator, true, false, "<category> [specifics]",
        "Move a thread to another category. Add \"silently\" to skip the recipient notice."),
    command!(Close, "close", None, [], Supporter, true, false, "[after] [close message]",
        "Close the current thread, now or after a delay. `close cancel` stops a scheduled close."),
    command!(Notify, "notify", None, ["alert"], Supporter, true, false, "[user_or_role]",
        "Notify a user or role when the next thread message is received."),
    command!(Unnotify, "unnotify", None, ["unalert"], Supporter, true, false, "[user_or_role]",
        "Un-notify a user, role, or yourself from a thread."),
    command!(Subscribe, "subscribe", None, ["sub"], Supporter, true, false, "[user_or_role]",
        "Notify a user, role, or yourself for every thread message received."),
    command!(Unsubscribe, "unsubscribe", None, ["unsub"], Supporter, true, false, "[user_or_role]",
        "Unsubscribe a user, role, or yourself from a thread."),
    command!(Nsfw, "nsfw", None, [], Supporter, true, false, "",
        "Flags a Modmail thread as NSFW (not safe for work)."),
    command!(Sfw, "sfw", None, [], Supporter, true, false, "",
        "Flags a Modmail thread as SFW (safe for work)."),
    command!(Loglink, "loglink", None, [], Supporter, true, false, "",
        "Retrieves the link to the current thread's logs."),
    command!(Logs, "logs", None, [], Supporter, false, true, "[user]",
        "Get previous Modmail thread logs of a member."),
    command!(LogsClosedBy, "closed-by", Some("logs"), ["closeby"], Supporter, false, false, "[user]",
        "Get all logs closed by the specified user."),
    command!(LogsDelete, "delete", Some("logs"), ["wipe"], Owner, false, false, "<key_or_link>",
        "Wipe a log entry from the database."),
    command!(LogsResponded, "responded", Some("logs"), [], Supporter, false, false, "[user]",
        "Get all logs where the specified user has responded at least once."),
    command!(LogsSearch, "search", Some("logs"), ["find"], Supporter, false, true, "[limit] <query>",
        "Retrieve all logs that contain messages with your query."),
    command!(Reply, "reply", None, [], Supporter, true, true, "<msg>",
        "Reply to a Modmail thread."),
    command!(AnonReply, "anonreply", None, [], Supporter, true, true, "<msg>",
        "Reply to a thread anonymously."),
    command!(Note, "note", None, [], Supporter, true, true, "<msg>",
        "Take a note about the current thread."),
    command!(Edit, "edit", None, [], Supporter, true, false, "[message_id] <message>",
        "Edit a message that was sent using the reply or anonreply command."),
    command!(Delete, "delete", None, [], Supporter, true, false, "[message_id]",
        "Delete a message that was sent using the reply command or a note."),
    command!(Contact, "contact", None, [], Supporter, false, false, "[category] <user>",
        "Create a thread with a specified member."),
    command!(Blocked, "blocked", None, [], Moderator, false, true, "",
        "Retrieve a list of blocked users."),
    command!(BlockedWhitelist, "whitelist", Some("blocked"), [], Moderator, false, true, "[user]",
        "Whitelist or un-whitelist a user from getting blocked."),
    command!(Block, "block", None, [], Moderator, false, true, "[user] [duration] [reason]",
        "Block a user from using Modmail."),
    command!(Unblock, "unblock", None, [], Moderator, false, true, "[user]",
        "Unblock a user from using Modmail."),
    command!(Enable, "enable", None, [], Administrator, false, false, "",
        "Re-enables DM functionalities of Modmail."),
    command!(Disable, "disable", None, [], Administrator, false, false, "",
        "Stop accepting new Modmail threads."),
    command!(DisableAll, "all", Some("disable"), [], Administrator, false, false, "",
        "Disables all DM functionalities of Modmail."),
    command!(IsEnable, "isenable", None, [], Administrator, false, false, "",
        "Check if the DM functionalities of Modmail is enabled."),
    command!(Help, "help", None, [], Regular, false, false, "[command]",
        "Shows this message."),
];

/// Resolve the command named at the start of `body`.
///
/// Returns the command and the remaining argument text. Subcommands are
/// preferred over the group when the second word names one.
pub fn resolve(body: &str) -> Option<(&'static CommandSpec, &str)> {
    let (first, rest) = parse::split_first(body)?;
    let first = first.to_lowercase();
    let group = COMMANDS
        .iter()
        .find(|c| c.parent.is_none() && c.answers_to(&first))?;

    if let Some((second, sub_rest)) = parse::split_first(rest) {
        let second = second.to_lowercase();
        if let Some(sub) = group.subcommands().find(|c| c.answers_to(&second)) {
            return Some((sub, sub_rest));
        }
    }
    Some((group, rest))
}

/// Look a command up by its qualified name or an alias path.
pub fn find(name: &str) -> Option<&'static CommandSpec> {
    let (spec, rest) = resolve(name)?;
    if rest.trim().is_empty() {
        Some(spec)
    } else {
        None
    }
}
