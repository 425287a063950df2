//! Shared test utilities for integration tests.
//!
//! Provides a sandboxed settings tree, a fixed device, and helpers for
//! placing token files in the property directories.

#![allow(dead_code)]

use anyhow::Result;
use propstore::PrefsError;
use propstore::infrastructure::config::Settings;
use propstore::properties::{DeviceField, DeviceInfo};
use propstore::{AppStore, PrefsService, SystemProperties, Whitelist};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Application id used by most scenarios.
pub const APP: &str = "com.example.app";

/// Property directories, highest priority first.
#[derive(Debug, Clone, Copy)]
pub enum TokenDir {
    /// Factory-provisioned properties.
    Provisioned,
    /// Runtime tokens.
    Tokens,
    /// Second runtime directory.
    Runtime,
}

/// Device answering every field from constants.
#[derive(Debug)]
pub struct FixedDevice;

impl DeviceInfo for FixedDevice {
    fn query(&self, field: DeviceField) -> propstore::Result<String> {
        match field {
            DeviceField::DeviceId => Ok("0123456789abcdef".into()),
            DeviceField::BoardType => Ok("topaz-3g".into()),
            DeviceField::OsVersion => Ok("2.6.35-palm-tenderloin".into()),
            DeviceField::BuildName => Ok("Nova-Main".into()),
            DeviceField::BuildNumber => Ok("214".into()),
        }
    }
}

/// Device that cannot answer anything.
#[derive(Debug)]
pub struct MissingDevice;

impl DeviceInfo for MissingDevice {
    fn query(&self, _field: DeviceField) -> propstore::Result<String> {
        Err(PrefsError::SystemConfigMissing)
    }
}

/// Integration test context providing a private filesystem layout.
pub struct IntegrationTestContext {
    /// Temporary directory holding every store and property source.
    pub temp_dir: TempDir,
    /// Settings pointing into `temp_dir`.
    pub settings: Settings,
}

impl IntegrationTestContext {
    /// Creates a context with empty property directories and a kernel
    /// command line and partition table that resolve.
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();

        let mut settings = Settings::default();
        settings.store.root = root.join("preferences");
        let props = &mut settings.properties;
        props.provisioned_dir = root.join("etc/prefs/properties");
        props.tokens_dir = root.join("dev/tokens");
        props.runtime_dir = root.join("var/lib/prefs/properties");
        props.whitelist = root.join("etc/prefs/public_properties");
        props.kernel_cmdline = root.join("proc/cmdline");
        props.partitions = root.join("proc/partitions");
        props.build_info = root.join("etc/palm-build-info");
        props.device_id_file = root.join("var/lib/nyx/nduid");
        props.board_type_file = root.join("sys/board_name");

        for dir in [
            &props.provisioned_dir,
            &props.tokens_dir,
            &props.runtime_dir,
            &root.join("proc"),
        ] {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&props.kernel_cmdline, "console=ttyS0 root=/dev/mmcblk0p2\n")?;
        std::fs::write(
            &props.partitions,
            "major minor  #blocks  name\n\n 179  0  7864320 mmcblk0\n 179  1  4096 mmcblk0p1\n",
        )?;
        // Not created, so free space is unavailable until a test calls
        // `create_storage_mount`.
        props.storage_mount = root.join("media/internal");

        Ok(Self { temp_dir, settings })
    }

    /// Store rooted in the sandbox.
    pub fn store(&self) -> AppStore {
        AppStore::from_settings(&self.settings.store)
    }

    /// Resolver over the sandbox with `public` as the whitelist.
    pub fn properties(&self, public: &[&str]) -> SystemProperties {
        self.properties_with(Arc::new(FixedDevice), public)
    }

    /// Resolver over the sandbox with a chosen device.
    pub fn properties_with(&self, device: Arc<dyn DeviceInfo>, public: &[&str]) -> SystemProperties {
        let whitelist: Whitelist = public.iter().map(ToString::to_string).collect();
        SystemProperties::new(self.settings.properties.clone(), self.store(), device)
            .with_whitelist(whitelist)
    }

    /// Dispatcher over the sandbox with `public` as the whitelist.
    pub fn service(&self, public: &[&str]) -> PrefsService {
        PrefsService::new(self.store(), self.properties(public))
    }

    /// Directory for `which`.
    pub fn token_dir(&self, which: TokenDir) -> &Path {
        let props = &self.settings.properties;
        match which {
            TokenDir::Provisioned => &props.provisioned_dir,
            TokenDir::Tokens => &props.tokens_dir,
            TokenDir::Runtime => &props.runtime_dir,
        }
    }

    /// Writes a token file.
    pub fn write_token(&self, which: TokenDir, token: &str, content: &str) -> Result<()> {
        std::fs::write(self.token_dir(which).join(token), content)?;
        Ok(())
    }

    /// Creates the free-space directory so that every computed property
    /// resolves.
    pub fn create_storage_mount(&self) -> Result<()> {
        std::fs::create_dir_all(&self.settings.properties.storage_mount)?;
        Ok(())
    }

    /// Path of an application's database file.
    pub fn db_path(&self, app_id: &str) -> PathBuf {
        self.settings
            .store
            .root
            .join(app_id)
            .join(propstore::store::DB_FILE_NAME)
    }
}

/// Prefixed key for `token`.
pub fn key(token: &str) -> String {
    format!("com.palm.properties.{token}")
}
