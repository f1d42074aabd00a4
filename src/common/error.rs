//! Error types for the application.

use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },

    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Errors raised while loading or persisting the dynamic settings document.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access settings file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Settings file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while loading a language catalog.
#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("Failed to read language file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed language file: {0}")]
    Csv(#[from] csv::Error),
}

/// Thread log storage errors.
#[derive(Debug, Error)]
pub enum LogStoreError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Failed to create database directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt log row: {message}")]
    Corrupt { message: String },
}

/// Discord-related errors.
#[derive(Debug, Error)]
pub enum DiscordError {
    #[error("Serenity error: {0}")]
    Serenity(#[from] serenity::Error),
}

/// Errors from the thread manager.
#[derive(Debug, Error)]
pub enum ThreadError {
    #[error("Discord error: {0}")]
    Discord(#[from] DiscordError),

    #[error("Log store error: {0}")]
    Logs(#[from] LogStoreError),

    #[error("Settings error: {0}")]
    Store(#[from] StoreError),

    #[error("Message {message_id} is not linked to this thread")]
    UnknownMessage { message_id: u64 },
}

impl From<serenity::Error> for ThreadError {
    fn from(err: serenity::Error) -> Self {
        ThreadError::Discord(DiscordError::Serenity(err))
    }
}

/// Errors surfaced while running a command.
///
/// The argument and check variants are shown to the invoker verbatim;
/// backend variants are logged and replaced by a generic message.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    BadArgument(String),

    #[error("{0} is a required argument that is missing.")]
    MissingArgument(&'static str),

    #[error("This command can only be used in a Modmail thread.")]
    NotThread,

    #[error("You don't have permission to use this command.")]
    Forbidden,

    #[error("Settings error: {0}")]
    Store(#[from] StoreError),

    #[error("Log store error: {0}")]
    Logs(#[from] LogStoreError),

    #[error("Thread error: {0}")]
    Thread(#[from] ThreadError),

    #[error("Discord error: {0}")]
    Discord(#[from] DiscordError),
}

impl CommandError {
    /// Whether the error describes a mistake by the invoker rather than a failure.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            CommandError::BadArgument(_)
                | CommandError::MissingArgument(_)
                | CommandError::NotThread
                | CommandError::Forbidden
        )
    }
}

/// Result type alias for command handlers.
pub type CommandResult<T> = std::result::Result<T, CommandError>;

/// Result type alias for thread manager operations.
pub type ThreadResult<T> = std::result::Result<T, ThreadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_argument_message() {
        let err = CommandError::MissingArgument("user");
        assert_eq!(err.to_string(), "user is a required argument that is missing.");
        assert!(err.is_user_facing());
    }

    #[test]
    fn test_backend_errors_are_not_user_facing() {
        let err = CommandError::Thread(ThreadError::UnknownMessage { message_id: 7 });
        assert!(!err.is_user_facing());
        assert!(err.to_string().contains("Message 7"));
    }
}
