//! Preference store configuration.
//!
//! This module defines where application stores live and how they react to
//! lock contention.

use serde::Deserialize;
use std::path::PathBuf;

/// Settings for the per-application store.
#[derive(Debug, Deserialize, Clone)]
pub struct StoreSettings {
    /// Directory holding one subdirectory per application (default:
    /// `/var/preferences`).
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// How long to wait on a locked database before reporting busy, in
    /// milliseconds (default: 0, fail immediately).
    #[serde(default)]
    pub busy_timeout_ms: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            root: default_root(),
            busy_timeout_ms: 0,
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from("/var/preferences")
}
