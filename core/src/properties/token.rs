//! Property tokens whose values are computed rather than read from a file.

use std::fmt;

/// A token answered by its own provider instead of a token file.
///
/// The declaration order is the order in which enumeration appends them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComputedToken {
    /// Operating system version.
    Version,
    /// Image name of the installed build.
    BuildName,
    /// Build identifier of the installed build.
    BuildNumber,
    /// Unique device identifier.
    Nduid,
    /// Hardware board type.
    BoardType,
    /// Size of the primary storage device in bytes.
    StorageCapacity,
    /// Bytes available on the internal media mount.
    StorageFreeSpace,
    /// `"true"` if the previous boot ended in a kernel panic.
    PrevBootPanicked,
    /// Whether the last unmount was clean, as recorded by the system app.
    PrevShutdownClean,
}

impl ComputedToken {
    /// Every computed token in enumeration order.
    pub const ALL: [Self; 9] = [
        Self::Version,
        Self::BuildName,
        Self::BuildNumber,
        Self::Nduid,
        Self::BoardType,
        Self::StorageCapacity,
        Self::StorageFreeSpace,
        Self::PrevBootPanicked,
        Self::PrevShutdownClean,
    ];

    /// The token as it appears after the reserved prefix.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Version => "version",
            Self::BuildName => "buildName",
            Self::BuildNumber => "buildNumber",
            Self::Nduid => "nduid",
            Self::BoardType => "boardType",
            Self::StorageCapacity => "storageCapacity",
            Self::StorageFreeSpace => "storageFreeSpace",
            Self::PrevBootPanicked => "prevBootPanicked",
            Self::PrevShutdownClean => "prevShutdownClean",
        }
    }

    /// Looks up a token by exact, case-sensitive name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|token| token.name() == name)
    }
}

impl fmt::Display for ComputedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
