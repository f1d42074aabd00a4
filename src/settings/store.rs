//! JSON-file persistence for [`Settings`].

use std::path::{Path, PathBuf};

use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{debug, info};

use crate::common::error::StoreError;
use crate::settings::model::Settings;

/// Shared settings document with write-through persistence.
#[derive(Debug)]
pub struct SettingsStore {
    /// `None` keeps the document in memory only.
    path: Option<PathBuf>,
    inner: RwLock<Settings>,
}

impl SettingsStore {
    /// Load settings from `path`, starting empty when the file does not exist yet.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let settings = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No settings file at {}, starting fresh", path.display());
                Settings::default()
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        Ok(Self {
            path: Some(path),
            inner: RwLock::new(settings),
        })
    }

    pub fn in_memory(settings: Settings) -> Self {
        Self {
            path: None,
            inner: RwLock::new(settings),
        }
    }

    /// Read access to the current document.
    pub async fn read(&self) -> RwLockReadGuard<'_, Settings> {
        self.inner.read().await
    }

    /// Cloned snapshot of the current document.
    pub async fn snapshot(&self) -> Settings {
        self.inner.read().await.clone()
    }

    /// Mutate a copy of the document, persist it, then swap it in.
    ///
    /// The live document is untouched when persisting fails.
    pub async fn update<R>(&self, f: impl FnOnce(&mut Settings) -> R) -> Result<R, StoreError> {
        let mut guard = self.inner.write().await;
        let mut next = guard.clone();
        let result = f(&mut next);
        self.persist(&next).await?;
        *guard = next;
        Ok(result)
    }

    async fn persist(&self, settings: &Settings) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let io_err = |source: std::io::Error| StoreError::Io {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
            }
        }

        let bytes = serde_json::to_vec_pretty(settings)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, path).await.map_err(io_err)?;

        debug!("Settings persisted to {}", path.display());
        Ok(())
    }
}
