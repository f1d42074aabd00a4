//! Dynamic settings edited at runtime by staff commands.

pub mod model;
pub mod store;

pub use model::{BlockStatus, DmDisabled, Settings, EVERYONE, SYSTEM_BLOCK_PREFIX};
pub use store::SettingsStore;
