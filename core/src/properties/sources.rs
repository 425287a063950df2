//! File and kernel sources for system properties.

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{PrefsError, Result};

/// Bytes per block in the partition table.
const PARTITION_BLOCK_SIZE: u64 = 1024;

/// Whether `token` can name a file directly inside a token directory.
pub(super) fn is_file_token(token: &str) -> bool {
    !token.is_empty() && token != "." && token != ".." && !token.contains(['/', '\\', '\0'])
}

/// Path of the token file for `token` in `dir`, if one exists.
pub(super) async fn token_path(dir: &Path, token: &str) -> Option<PathBuf> {
    if !is_file_token(token) {
        return None;
    }
    let path = dir.join(token);
    match tokio::fs::try_exists(&path).await {
        Ok(true) => Some(path),
        _ => None,
    }
}

/// Reads a token file verbatim, minus one trailing newline. Bytes that are
/// not UTF-8 are replaced rather than rejected.
///
/// A file that exists but cannot be read is [`PrefsError::NoSuchKey`].
pub(super) async fn read_token_file(path: &Path) -> Result<String> {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            let mut text = String::from_utf8_lossy(&bytes).into_owned();
            if text.ends_with('\n') {
                text.pop();
            }
            Ok(text)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read token file");
            Err(PrefsError::NoSuchKey)
        }
    }
}

/// Names of the regular files in `dir`, sorted. A missing or unreadable
/// directory contributes nothing.
pub(super) async fn list_tokens(dir: &Path) -> Vec<String> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            if e.kind() != IoErrorKind::NotFound {
                warn!(dir = %dir.display(), error = %e, "Failed to list token directory");
            }
            return Vec::new();
        }
    };

    let mut tokens = Vec::new();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Token directory scan interrupted");
                break;
            }
        };
        let is_file = entry
            .file_type()
            .await
            .map(|t| t.is_file())
            .unwrap_or(false);
        if !is_file {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => tokens.push(name),
            Err(name) => debug!(?name, "Skipping non UTF-8 token file"),
        }
    }
    tokens.sort();
    tokens
}

/// Finds the block count for `device` in `/proc/partitions` text and
/// converts it to bytes.
pub(super) fn parse_partition_bytes(text: &str, device: &str) -> Option<u64> {
    text.lines().find_map(|line| {
        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.as_slice() {
            [_major, _minor, blocks, name] if *name == device => blocks
                .parse::<u64>()
                .ok()?
                .checked_mul(PARTITION_BLOCK_SIZE),
            _ => None,
        }
    })
}

/// Size of the primary storage device, in bytes.
pub(super) async fn storage_capacity(partitions: &Path, device: &str) -> Result<String> {
    let text = tokio::fs::read_to_string(partitions).await.map_err(|e| {
        warn!(path = %partitions.display(), error = %e, "Partition table unavailable");
        PrefsError::SystemConfigMissing
    })?;
    parse_partition_bytes(&text, device)
        .map(|bytes| bytes.to_string())
        .ok_or_else(|| {
            debug!(device, "Storage device not in partition table");
            PrefsError::SystemConfigMissing
        })
}

/// Bytes available to unprivileged users on the filesystem holding `mount`.
///
/// Any existing path works; it need not be a mount point itself.
pub(super) fn storage_free_space(mount: &Path) -> Result<String> {
    available_bytes(mount)
        .map(|bytes| bytes.to_string())
        .map_err(|e| {
            warn!(mount = %mount.display(), error = %e, "Free space unavailable");
            PrefsError::SystemConfigMissing
        })
}

#[cfg(unix)]
#[allow(clippy::useless_conversion)] // statvfs field widths vary by platform
fn available_bytes(path: &Path) -> std::io::Result<u64> {
    use std::ffi::CString;
    use std::mem::MaybeUninit;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| std::io::Error::new(IoErrorKind::InvalidInput, e))?;
    let mut stats = MaybeUninit::<libc::statvfs>::uninit();
    // SAFETY: c_path is NUL-terminated and stats is valid for writes.
    let result = unsafe { libc::statvfs(c_path.as_ptr(), stats.as_mut_ptr()) };
    if result != 0 {
        return Err(std::io::Error::last_os_error());
    }
    // SAFETY: statvfs filled the struct on success.
    let stats = unsafe { stats.assume_init() };
    Ok(u64::from(stats.f_bavail).saturating_mul(u64::from(stats.f_frsize)))
}

#[cfg(not(unix))]
fn available_bytes(_path: &Path) -> std::io::Result<u64> {
    Err(std::io::Error::new(
        IoErrorKind::Unsupported,
        "statvfs is not available on this platform",
    ))
}

/// `"true"` if the first line of the kernel command line carries `marker`.
pub(super) async fn previous_boot_panicked(cmdline: &Path, marker: &str) -> Result<String> {
    let text = tokio::fs::read_to_string(cmdline).await.map_err(|e| {
        warn!(path = %cmdline.display(), error = %e, "Kernel command line unavailable");
        PrefsError::SystemConfigMissing
    })?;
    let first_line = text.lines().next().unwrap_or_default();
    Ok(first_line.contains(marker).to_string())
}
