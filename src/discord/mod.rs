//! Discord integration.
//!
//! Owns the gateway connection and implements the thread and directory
//! seams the command layer runs against.

pub mod client;
pub mod directory;
pub mod handler;
pub mod paginator;
pub mod render;
pub mod threads;

pub use client::DiscordBotBuilder;
