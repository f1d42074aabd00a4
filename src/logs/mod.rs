//! Thread log storage.

pub mod models;
pub mod store;

pub use models::{LogEntry, LogMessage, LogUser, MessageKind};
pub use store::LogStore;
