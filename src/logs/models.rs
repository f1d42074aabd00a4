//! Thread log records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::UserRef;

/// A participant as recorded in a log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogUser {
    pub id: u64,
    pub name: String,
    pub discriminator: String,
    pub avatar_url: Option<String>,
    #[serde(rename = "mod")]
    pub is_mod: bool,
}

impl LogUser {
    pub fn from_user(user: &UserRef, is_mod: bool) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            discriminator: user.discriminator_str(),
            avatar_url: user.avatar_url.clone(),
            is_mod,
        }
    }

    /// `name#discriminator`, as shown in previews.
    pub fn tag(&self) -> String {
        format!("{}#{}", self.name, self.discriminator)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Recipient message or staff reply.
    ThreadMessage,
    Anonymous,
    System,
    Internal,
    Note,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::ThreadMessage => "thread_message",
            MessageKind::Anonymous => "anonymous",
            MessageKind::System => "system",
            MessageKind::Internal => "internal",
            MessageKind::Note => "note",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "thread_message" => Some(MessageKind::ThreadMessage),
            "anonymous" => Some(MessageKind::Anonymous),
            "system" => Some(MessageKind::System),
            "internal" => Some(MessageKind::Internal),
            "note" => Some(MessageKind::Note),
            _ => None,
        }
    }

    /// Staff-only messages hidden from previews.
    pub fn is_private(self) -> bool {
        matches!(self, MessageKind::Note | MessageKind::Internal)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMessage {
    /// Id of the message the log entry is linked to.
    pub message_id: u64,
    pub timestamp: DateTime<Utc>,
    pub content: String,
    pub author: LogUser,
    pub kind: MessageKind,
    pub attachments: Vec<String>,
    pub edited: bool,
}

/// One thread's log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub key: String,
    pub open: bool,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub channel_id: u64,
    pub guild_id: u64,
    pub recipient: LogUser,
    pub creator: LogUser,
    pub closer: Option<LogUser>,
    pub close_message: Option<String>,
    /// Oldest first. Listing queries load a short preview only.
    pub messages: Vec<LogMessage>,
}
