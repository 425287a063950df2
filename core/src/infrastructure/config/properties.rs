//! System property source configuration.
//!
//! Every path the resolver reads, plus the fixed names it matches against.
//! The defaults describe the device layout; tests and hosts override them.

use serde::Deserialize;
use std::path::PathBuf;

/// Locations and names used to resolve system properties.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PropertySettings {
    /// Prefix marking a key as a system property.
    pub prefix: String,
    /// Factory-provisioned token files; highest priority.
    pub provisioned_dir: PathBuf,
    /// Token files written after first boot.
    pub tokens_dir: PathBuf,
    /// Second runtime token directory; lowest priority.
    pub runtime_dir: PathBuf,
    /// Newline-delimited list of keys visible on the public channel.
    pub whitelist: PathBuf,
    /// Kernel boot parameters.
    pub kernel_cmdline: PathBuf,
    /// Boot parameter marking that the previous boot ended in a panic.
    pub panic_marker: String,
    /// Partition table listing block counts per device.
    pub partitions: PathBuf,
    /// Name of the primary storage block device in the partition table.
    pub storage_device: String,
    /// Mount point whose free space is reported.
    pub storage_mount: PathBuf,
    /// `KEY=VALUE` build description file.
    pub build_info: PathBuf,
    /// File holding the unique device identifier.
    pub device_id_file: PathBuf,
    /// File holding the board type.
    pub board_type_file: PathBuf,
    /// Application whose store records the previous shutdown state.
    pub system_app_id: String,
    /// Key in that store recording whether the last unmount was clean.
    pub shutdown_key: String,
}

impl Default for PropertySettings {
    fn default() -> Self {
        Self {
            prefix: "com.palm.properties.".to_string(),
            provisioned_dir: PathBuf::from("/etc/prefs/properties"),
            tokens_dir: PathBuf::from("/dev/tokens"),
            runtime_dir: PathBuf::from("/var/lib/prefs/properties"),
            whitelist: PathBuf::from("/etc/prefs/public_properties"),
            kernel_cmdline: PathBuf::from("/proc/cmdline"),
            panic_marker: "lastboot=panic".to_string(),
            partitions: PathBuf::from("/proc/partitions"),
            storage_device: "mmcblk0".to_string(),
            storage_mount: PathBuf::from("/media/internal"),
            build_info: PathBuf::from("/etc/palm-build-info"),
            device_id_file: PathBuf::from("/var/lib/nyx/nduid"),
            board_type_file: PathBuf::from("/sys/devices/virtual/dmi/id/board_name"),
            system_app_id: "com.palm.system".to_string(),
            shutdown_key: "last_umount_clean".to_string(),
        }
    }
}
