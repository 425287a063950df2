//! Per-application preference storage.
//!
//! Each application owns one SQLite file under `<root>/<app id>/`. A store
//! holds only configuration; connections live in [`AppHandle`]s, which open
//! lazily and keep a single transaction for their whole lifetime.

/// Handle over one application's table.
pub mod handle;
mod schema;

pub use handle::AppHandle;

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::error::{PrefsError, Result};
use crate::infrastructure::audit::{self, AuditEvent};
use crate::infrastructure::config::StoreSettings;

/// Name of the database file inside an application's directory.
pub const DB_FILE_NAME: &str = "prefsDB.sl";

/// Factory for application handles rooted at one directory.
#[derive(Debug, Clone)]
pub struct AppStore {
    root: PathBuf,
    busy_timeout: Duration,
}

impl AppStore {
    /// Creates a store rooted at `root` that never waits on a locked database.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            busy_timeout: Duration::ZERO,
        }
    }

    /// Creates a store from the `store` settings section.
    #[must_use]
    pub fn from_settings(settings: &StoreSettings) -> Self {
        Self::new(settings.root.clone())
            .with_busy_timeout(Duration::from_millis(settings.busy_timeout_ms))
    }

    /// Sets how long a connection waits on another holder of the lock before
    /// reporting [`PrefsError::Busy`].
    #[must_use]
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Directory under which every application's store lives.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the store for `app_id`.
    ///
    /// # Errors
    ///
    /// Returns [`PrefsError::InvalidHandle`] if the id is empty or would
    /// escape the store root.
    pub fn app_dir(&self, app_id: &str) -> Result<PathBuf> {
        validate_app_id(app_id)?;
        Ok(self.root.join(app_id))
    }

    /// Creates a handle for `app_id`. Nothing is touched on disk until the
    /// first operation.
    ///
    /// # Errors
    ///
    /// Returns [`PrefsError::InvalidHandle`] if the id is unusable.
    pub fn open(&self, app_id: &str) -> Result<AppHandle> {
        let dir = self.app_dir(app_id)?;
        Ok(AppHandle::new(app_id, dir, self.busy_timeout))
    }

    /// Deletes the database file for `app_id`, independent of any handle.
    ///
    /// # Errors
    ///
    /// Returns [`PrefsError::ParamError`] if the file cannot be removed,
    /// including when it does not exist.
    #[instrument(skip(self))]
    pub async fn clear_all(&self, app_id: &str) -> Result<()> {
        let path = self.app_dir(app_id)?.join(DB_FILE_NAME);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!(path = %path.display(), "Cleared application store");
                audit::log_audit(&AuditEvent::StoreCleared {
                    app_id: app_id.to_owned(),
                });
                Ok(())
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to clear application store");
                Err(PrefsError::ParamError)
            }
        }
    }
}

fn validate_app_id(app_id: &str) -> Result<()> {
    let unusable = app_id.is_empty()
        || app_id == "."
        || app_id == ".."
        || app_id.contains(['/', '\\', '\0']);
    if unusable {
        return Err(PrefsError::InvalidHandle);
    }
    Ok(())
}
