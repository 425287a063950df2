//! Hardware and OS identity queries.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{PrefsError, Result};
use crate::infrastructure::config::PropertySettings;

/// Build-info key holding the image name.
const BUILD_NAME_KEY: &str = "BUILDNAME";
/// Build-info key holding the build identifier.
const BUILD_NUMBER_KEY: &str = "BUILDNUMBER";

/// A named field of the device or OS description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceField {
    /// Unique device identifier.
    DeviceId,
    /// Hardware board type.
    BoardType,
    /// Running OS (kernel) version.
    OsVersion,
    /// Image name of the installed build.
    BuildName,
    /// Build identifier of the installed build.
    BuildNumber,
}

/// Source of device identity and OS build facts.
///
/// Implementations answer with the bare field text. A field the host cannot
/// provide is [`PrefsError::SystemConfigMissing`].
pub trait DeviceInfo: Send + Sync {
    /// Queries one field.
    ///
    /// # Errors
    ///
    /// Returns [`PrefsError::SystemConfigMissing`] if the field is unavailable.
    fn query(&self, field: DeviceField) -> Result<String>;
}

/// [`DeviceInfo`] backed by files on the running host.
#[derive(Debug, Clone)]
pub struct HostDeviceInfo {
    device_id_file: PathBuf,
    board_type_file: PathBuf,
    build_info: PathBuf,
}

impl HostDeviceInfo {
    /// Reads identity files from the locations in `settings`.
    #[must_use]
    pub fn new(settings: &PropertySettings) -> Self {
        Self {
            device_id_file: settings.device_id_file.clone(),
            board_type_file: settings.board_type_file.clone(),
            build_info: settings.build_info.clone(),
        }
    }

    fn read_line_file(path: &Path) -> Result<String> {
        let mut text = std::fs::read_to_string(path).map_err(|e| {
            warn!(path = %path.display(), error = %e, "Device file unavailable");
            PrefsError::SystemConfigMissing
        })?;
        if text.ends_with('\n') {
            text.pop();
        }
        Ok(text)
    }

    fn build_info_value(&self, wanted: &str) -> Result<String> {
        let text = std::fs::read_to_string(&self.build_info).map_err(|e| {
            warn!(path = %self.build_info.display(), error = %e, "Build info unavailable");
            PrefsError::SystemConfigMissing
        })?;
        parse_build_info(&text, wanted).ok_or_else(|| {
            debug!(key = wanted, "Build info has no such entry");
            PrefsError::SystemConfigMissing
        })
    }
}

impl DeviceInfo for HostDeviceInfo {
    fn query(&self, field: DeviceField) -> Result<String> {
        match field {
            DeviceField::DeviceId => Self::read_line_file(&self.device_id_file),
            DeviceField::BoardType => Self::read_line_file(&self.board_type_file),
            DeviceField::OsVersion => {
                sysinfo::System::kernel_version().ok_or(PrefsError::SystemConfigMissing)
            }
            DeviceField::BuildName => self.build_info_value(BUILD_NAME_KEY),
            DeviceField::BuildNumber => self.build_info_value(BUILD_NUMBER_KEY),
        }
    }
}

/// Finds `wanted` in `KEY=VALUE` text. The value runs to the end of the line.
fn parse_build_info(text: &str, wanted: &str) -> Option<String> {
    text.lines()
        .filter_map(|line| line.split_once('='))
        .find(|(key, _)| *key == wanted)
        .map(|(_, value)| value.trim_end_matches(['\r', '\n']).to_owned())
}
