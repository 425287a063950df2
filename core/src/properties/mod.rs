//! System properties: device-wide values under a reserved key prefix.
//!
//! A property is never stored by this crate. Each lookup consults, in
//! order, the provisioned token directory, the computed tokens, the runtime
//! tokens directory and the second runtime directory; the first source that
//! knows the token answers.

pub mod device;
mod enumerator;
mod resolver;
mod sources;
pub mod token;

pub use device::{DeviceField, DeviceInfo, HostDeviceInfo};
pub use token::ComputedToken;

use std::fmt;
use std::sync::Arc;

use crate::infrastructure::config::{PropertySettings, Settings};
use crate::store::AppStore;
use crate::visibility::Whitelist;

/// Resolver and enumerator for system properties.
#[derive(Clone)]
pub struct SystemProperties {
    settings: PropertySettings,
    store: AppStore,
    device: Arc<dyn DeviceInfo>,
    whitelist: Option<Arc<Whitelist>>,
}

impl fmt::Debug for SystemProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemProperties")
            .field("settings", &self.settings)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl SystemProperties {
    /// Builds a resolver over explicit collaborators.
    ///
    /// `store` is used only for the nested shutdown-state lookup.
    #[must_use]
    pub fn new(settings: PropertySettings, store: AppStore, device: Arc<dyn DeviceInfo>) -> Self {
        Self {
            settings,
            store,
            device,
            whitelist: None,
        }
    }

    /// Builds a resolver reading the host described by `settings`.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        let device = Arc::new(HostDeviceInfo::new(&settings.properties));
        Self::new(
            settings.properties.clone(),
            AppStore::from_settings(&settings.store),
            device,
        )
    }

    /// Uses `whitelist` instead of the process-wide one.
    #[must_use]
    pub fn with_whitelist(mut self, whitelist: Whitelist) -> Self {
        self.whitelist = Some(Arc::new(whitelist));
        self
    }

    /// The settings this resolver reads from.
    #[must_use]
    pub fn settings(&self) -> &PropertySettings {
        &self.settings
    }

    /// The reserved key prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.settings.prefix
    }

    /// The token of a prefixed key, or `None` for keys outside the reserved
    /// namespace.
    #[must_use]
    pub fn token<'k>(&self, key: &'k str) -> Option<&'k str> {
        key.strip_prefix(self.prefix())
    }

    /// The full key for `token`.
    #[must_use]
    pub fn key_for(&self, token: &str) -> String {
        format!("{}{token}", self.prefix())
    }

    /// The whitelist governing the public channel.
    ///
    /// Without an injected set, the process-wide whitelist is loaded from the
    /// configured path on first use.
    #[must_use]
    pub fn whitelist(&self) -> &Whitelist {
        match &self.whitelist {
            Some(whitelist) => whitelist.as_ref(),
            None => Whitelist::global(&self.settings.whitelist),
        }
    }

    /// Whether `key` may be disclosed to public callers.
    #[must_use]
    pub fn is_public(&self, key: &str) -> bool {
        self.whitelist().is_public(key)
    }
}
