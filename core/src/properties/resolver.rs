use serde_json::Value;
use tracing::{debug, instrument};

use super::token::ComputedToken;
use super::{sources, DeviceField, SystemProperties};
use crate::codec;
use crate::error::{PrefsError, Result};

impl SystemProperties {
    /// Resolves a prefixed key to its raw value.
    ///
    /// The first source that knows the token answers, even when it then
    /// fails: an unreadable provisioned file is `NoSuchKey` and a computed
    /// token whose provider is unavailable is `SystemConfigMissing`, without
    /// falling through to later sources.
    ///
    /// # Errors
    ///
    /// Returns [`PrefsError::NoSuchKey`] if the key lacks the prefix or no
    /// source knows the token, or the error of the answering source.
    #[instrument(skip(self))]
    pub async fn resolve(&self, key: &str) -> Result<String> {
        let Some(token) = self.token(key) else {
            return Err(PrefsError::NoSuchKey);
        };

        if let Some(path) = sources::token_path(&self.settings.provisioned_dir, token).await {
            debug!(source = "provisioned", "Resolving from file");
            return sources::read_token_file(&path).await;
        }
        if let Some(computed) = ComputedToken::from_name(token) {
            debug!(source = "computed", %computed, "Resolving computed token");
            return self.compute(computed).await;
        }
        for (source, dir) in [
            ("tokens", &self.settings.tokens_dir),
            ("runtime", &self.settings.runtime_dir),
        ] {
            if let Some(path) = sources::token_path(dir, token).await {
                debug!(source, "Resolving from file");
                return sources::read_token_file(&path).await;
            }
        }
        Err(PrefsError::NoSuchKey)
    }

    /// Resolves a key to its value document, the raw value wrapped as a
    /// one-element string array.
    ///
    /// # Errors
    ///
    /// Same as [`SystemProperties::resolve`].
    pub async fn resolve_document(&self, key: &str) -> Result<Value> {
        self.resolve(key).await.map(|raw| codec::wrap_scalar(&raw))
    }

    async fn compute(&self, token: ComputedToken) -> Result<String> {
        let settings = &self.settings;
        match token {
            ComputedToken::Version => self.device.query(DeviceField::OsVersion),
            ComputedToken::BuildName => self.device.query(DeviceField::BuildName),
            ComputedToken::BuildNumber => self.device.query(DeviceField::BuildNumber),
            ComputedToken::Nduid => self.device.query(DeviceField::DeviceId),
            ComputedToken::BoardType => self.device.query(DeviceField::BoardType),
            ComputedToken::StorageCapacity => {
                sources::storage_capacity(&settings.partitions, &settings.storage_device).await
            }
            ComputedToken::StorageFreeSpace => sources::storage_free_space(&settings.storage_mount),
            ComputedToken::PrevBootPanicked => {
                sources::previous_boot_panicked(&settings.kernel_cmdline, &settings.panic_marker)
                    .await
            }
            ComputedToken::PrevShutdownClean => self.shutdown_clean().await,
        }
    }

    /// Reads the shutdown state recorded in the system application's store.
    /// An unrecorded state is the empty string.
    async fn shutdown_clean(&self) -> Result<String> {
        let mut handle = self.store.open(&self.settings.system_app_id)?;
        let value = match handle.get_string(&self.settings.shutdown_key).await {
            Err(PrefsError::NoSuchKey) => Ok(String::new()),
            other => other,
        };
        let closed = handle.close(false).await;
        let value = value?;
        closed?;
        Ok(value)
    }
}
