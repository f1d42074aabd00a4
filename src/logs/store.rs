//! SQLite-backed thread log storage.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use tracing::debug;

use crate::common::error::LogStoreError;
use crate::logs::models::{LogEntry, LogMessage, LogUser, MessageKind};

type Result<T> = std::result::Result<T, LogStoreError>;

/// Messages loaded per entry by listing queries.
pub const PREVIEW_MESSAGES: i64 = 5;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS logs (
    key TEXT PRIMARY KEY,
    open INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    closed_at TEXT,
    channel_id INTEGER NOT NULL,
    guild_id INTEGER NOT NULL,
    recipient_id INTEGER NOT NULL,
    recipient TEXT NOT NULL,
    creator TEXT NOT NULL,
    closer_id INTEGER,
    closer TEXT,
    close_message TEXT
);
CREATE INDEX IF NOT EXISTS idx_logs_recipient ON logs(recipient_id);
CREATE INDEX IF NOT EXISTS idx_logs_channel ON logs(channel_id);
CREATE INDEX IF NOT EXISTS idx_logs_closer ON logs(closer_id);

CREATE TABLE IF NOT EXISTS log_messages (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    log_key TEXT NOT NULL,
    message_id INTEGER NOT NULL,
    timestamp TEXT NOT NULL,
    content TEXT NOT NULL,
    author_id INTEGER NOT NULL,
    author_mod INTEGER NOT NULL DEFAULT 0,
    author TEXT NOT NULL,
    kind TEXT NOT NULL,
    attachments TEXT NOT NULL DEFAULT '[]',
    edited INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_log_messages_key ON log_messages(log_key);
CREATE INDEX IF NOT EXISTS idx_log_messages_id ON log_messages(message_id);
"#;

const ENTRY_COLUMNS: &str = "key, open, created_at, closed_at, channel_id, guild_id, \
     recipient, creator, closer, close_message";

/// Open a pool on `db_path`, creating the file and schema as needed.
pub async fn init_logs_db(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let url = format!("sqlite:{}?mode=rwc", db_path.display());
    let pool = SqlitePool::connect(&url).await?;

    sqlx::query("PRAGMA journal_mode=WAL;")
        .execute(&pool)
        .await?;

    sqlx::raw_sql(SCHEMA).execute(&pool).await?;

    Ok(pool)
}

/// Thread logs of one guild.
#[derive(Debug, Clone)]
pub struct LogStore {
    pool: SqlitePool,
    guild_id: u64,
    base_url: String,
}

impl LogStore {
    /// `base_url` is the viewer address a log key is appended to.
    pub async fn open(db_path: &Path, guild_id: u64, base_url: impl Into<String>) -> Result<Self> {
        let pool = init_logs_db(db_path).await?;
        debug!(db_path = %db_path.display(), "Log store initialized");
        Ok(Self {
            pool,
            guild_id,
            base_url: base_url.into(),
        })
    }

    pub fn log_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    /// Start a log for a newly created thread channel.
    pub async fn create_log(
        &self,
        channel_id: u64,
        recipient: &LogUser,
        creator: &LogUser,
    ) -> Result<LogEntry> {
        let entry = LogEntry {
            key: new_key(),
            open: true,
            created_at: Utc::now(),
            closed_at: None,
            channel_id,
            guild_id: self.guild_id,
            recipient: recipient.clone(),
            creator: creator.clone(),
            closer: None,
            close_message: None,
            messages: Vec::new(),
        };

        sqlx::query(
            "INSERT INTO logs
             (key, open, created_at, channel_id, guild_id, recipient_id, recipient, creator)
             VALUES (?, 1, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&entry.key)
        .bind(format_time(entry.created_at))
        .bind(channel_id as i64)
        .bind(self.guild_id as i64)
        .bind(recipient.id as i64)
        .bind(encode_user(recipient)?)
        .bind(encode_user(creator)?)
        .execute(&self.pool)
        .await?;

        debug!(key = %entry.key, channel_id, "Created log entry");
        Ok(entry)
    }

    /// Record a message in the open log of `channel_id`.
    ///
    /// Returns `false` when the channel has no open log.
    pub async fn append_message(&self, channel_id: u64, message: &LogMessage) -> Result<bool> {
        let key: Option<String> =
            sqlx::query_scalar("SELECT key FROM logs WHERE channel_id = ? AND open = 1")
                .bind(channel_id as i64)
                .fetch_optional(&self.pool)
                .await?;

        let Some(key) = key else {
            return Ok(false);
        };

        let attachments = serde_json::to_string(&message.attachments).map_err(corrupt)?;
        sqlx::query(
            "INSERT INTO log_messages
             (log_key, message_id, timestamp, content, author_id, author_mod, author, kind,
              attachments, edited)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&key)
        .bind(message.message_id as i64)
        .bind(format_time(message.timestamp))
        .bind(&message.content)
        .bind(message.author.id as i64)
        .bind(if message.author.is_mod { 1 } else { 0 })
        .bind(encode_user(&message.author)?)
        .bind(message.kind.as_str())
        .bind(attachments)
        .bind(if message.edited { 1 } else { 0 })
        .execute(&self.pool)
        .await?;

        Ok(true)
    }

    /// Mark a log closed. Returns `false` when the key is unknown.
    pub async fn close_log(
        &self,
        key: &str,
        closer: &LogUser,
        close_message: Option<&str>,
        closed_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE logs SET open = 0, closed_at = ?, closer_id = ?, closer = ?, close_message = ?
             WHERE key = ?",
        )
        .bind(format_time(closed_at))
        .bind(closer.id as i64)
        .bind(encode_user(closer)?)
        .bind(close_message)
        .bind(key)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// A log with all of its messages.
    pub async fn get_log(&self, key: &str) -> Result<Option<LogEntry>> {
        let row = sqlx::query(&format!("SELECT {} FROM logs WHERE key = ?", ENTRY_COLUMNS))
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let mut entry = entry_from_row(&row)?;
                entry.messages = self.load_messages(&entry.key, -1).await?;
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    /// The open log of a thread channel.
    pub async fn get_log_by_channel(&self, channel_id: u64) -> Result<Option<LogEntry>> {
        let key: Option<String> =
            sqlx::query_scalar("SELECT key FROM logs WHERE channel_id = ? AND open = 1")
                .bind(channel_id as i64)
                .fetch_optional(&self.pool)
                .await?;

        match key {
            Some(key) => self.get_log(&key).await,
            None => Ok(None),
        }
    }

    pub async fn get_log_link(&self, channel_id: u64) -> Result<Option<String>> {
        let key: Option<String> =
            sqlx::query_scalar("SELECT key FROM logs WHERE channel_id = ? ORDER BY open DESC, created_at DESC")
                .bind(channel_id as i64)
                .fetch_optional(&self.pool)
                .await?;

        Ok(key.map(|k| self.log_url(&k)))
    }

    /// Every log of a recipient, oldest first, with message previews.
    pub async fn get_user_logs(&self, user_id: u64) -> Result<Vec<LogEntry>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM logs WHERE guild_id = ? AND recipient_id = ? ORDER BY created_at",
            ENTRY_COLUMNS
        ))
        .bind(self.guild_id as i64)
        .bind(user_id as i64)
        .fetch_all(&self.pool)
        .await?;

        self.with_previews(rows).await
    }

    /// Closed logs where `user_id` replied as staff at least once.
    pub async fn get_responded_logs(&self, user_id: u64) -> Result<Vec<LogEntry>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM logs WHERE guild_id = ? AND open = 0 AND EXISTS (
                 SELECT 1 FROM log_messages m
                 WHERE m.log_key = logs.key AND m.author_id = ? AND m.author_mod = 1
                   AND m.kind IN ('thread_message', 'anonymous')
             ) ORDER BY created_at",
            ENTRY_COLUMNS
        ))
        .bind(self.guild_id as i64)
        .bind(user_id as i64)
        .fetch_all(&self.pool)
        .await?;

        self.with_previews(rows).await
    }

    /// Closed logs closed by `user_id`.
    pub async fn find_closed_by(&self, user_id: u64) -> Result<Vec<LogEntry>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM logs WHERE guild_id = ? AND open = 0 AND closer_id = ?
             ORDER BY created_at",
            ENTRY_COLUMNS
        ))
        .bind(self.guild_id as i64)
        .bind(user_id as i64)
        .fetch_all(&self.pool)
        .await?;

        self.with_previews(rows).await
    }

    /// Closed logs with a message containing `query`, case-insensitively.
    pub async fn search(&self, query: &str, limit: Option<u32>) -> Result<Vec<LogEntry>> {
        let pattern = format!("%{}%", escape_like(query));
        // SQLite reads a negative limit as unbounded; zero means no limit too.
        let limit = limit.filter(|l| *l > 0).map(i64::from).unwrap_or(-1);

        let rows = sqlx::query(&format!(
            "SELECT {} FROM logs WHERE guild_id = ? AND open = 0 AND EXISTS (
                 SELECT 1 FROM log_messages m
                 WHERE m.log_key = logs.key AND m.content LIKE ? ESCAPE '\\'
             ) ORDER BY created_at LIMIT ?",
            ENTRY_COLUMNS
        ))
        .bind(self.guild_id as i64)
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        self.with_previews(rows).await
    }

    /// Open logs, used to restore threads after a restart.
    pub async fn open_logs(&self) -> Result<Vec<LogEntry>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM logs WHERE guild_id = ? AND open = 1 ORDER BY created_at",
            ENTRY_COLUMNS
        ))
        .bind(self.guild_id as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(entry_from_row).collect()
    }

    /// Remove a log and its messages. Returns `false` when the key is unknown.
    pub async fn delete_log_entry(&self, key: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM log_messages WHERE log_key = ?")
            .bind(key)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM logs WHERE key = ?")
            .bind(key)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn edit_message(&self, message_id: u64, content: &str) -> Result<bool> {
        let result =
            sqlx::query("UPDATE log_messages SET content = ?, edited = 1 WHERE message_id = ?")
                .bind(content)
                .bind(message_id as i64)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_message(&self, message_id: u64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM log_messages WHERE message_id = ?")
            .bind(message_id as i64)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn with_previews(&self, rows: Vec<SqliteRow>) -> Result<Vec<LogEntry>> {
        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut entry = entry_from_row(row)?;
            entry.messages = self.load_messages(&entry.key, PREVIEW_MESSAGES).await?;
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Messages of a log in order; a negative limit loads all of them.
    async fn load_messages(&self, key: &str, limit: i64) -> Result<Vec<LogMessage>> {
        let rows = sqlx::query(
            "SELECT message_id, timestamp, content, author, kind, attachments, edited
             FROM log_messages WHERE log_key = ? ORDER BY seq LIMIT ?",
        )
        .bind(key)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(message_from_row).collect()
    }

    #[cfg(test)]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn entry_from_row(row: &SqliteRow) -> Result<LogEntry> {
    Ok(LogEntry {
        key: row.try_get("key")?,
        open: row.try_get::<i64, _>("open")? != 0,
        created_at: parse_time(&row.try_get::<String, _>("created_at")?)?,
        closed_at: row
            .try_get::<Option<String>, _>("closed_at")?
            .map(|raw| parse_time(&raw))
            .transpose()?,
        channel_id: row.try_get::<i64, _>("channel_id")? as u64,
        guild_id: row.try_get::<i64, _>("guild_id")? as u64,
        recipient: decode_user(&row.try_get::<String, _>("recipient")?)?,
        creator: decode_user(&row.try_get::<String, _>("creator")?)?,
        closer: row
            .try_get::<Option<String>, _>("closer")?
            .map(|raw| decode_user(&raw))
            .transpose()?,
        close_message: row.try_get("close_message")?,
        messages: Vec::new(),
    })
}

fn message_from_row(row: &SqliteRow) -> Result<LogMessage> {
    let kind: String = row.try_get("kind")?;
    let attachments: String = row.try_get("attachments")?;

    Ok(LogMessage {
        message_id: row.try_get::<i64, _>("message_id")? as u64,
        timestamp: parse_time(&row.try_get::<String, _>("timestamp")?)?,
        content: row.try_get("content")?,
        author: decode_user(&row.try_get::<String, _>("author")?)?,
        kind: MessageKind::parse(&kind).ok_or_else(|| LogStoreError::Corrupt {
            message: format!("unknown message kind '{}'", kind),
        })?,
        attachments: serde_json::from_str(&attachments).map_err(corrupt)?,
        edited: row.try_get::<i64, _>("edited")? != 0,
    })
}

fn format_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| LogStoreError::Corrupt {
            message: format!("bad timestamp '{}': {}", raw, e),
        })
}

fn encode_user(user: &LogUser) -> Result<String> {
    serde_json::to_string(user).map_err(corrupt)
}

fn decode_user(raw: &str) -> Result<LogUser> {
    serde_json::from_str(raw).map_err(corrupt)
}

fn corrupt(err: serde_json::Error) -> LogStoreError {
    LogStoreError::Corrupt {
        message: err.to_string(),
    }
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Twelve hex characters.
fn new_key() -> String {
    format!("{:012x}", rand::random::<u64>() & 0xFFFF_FFFF_FFFF)
}
