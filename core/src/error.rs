//! Error taxonomy shared by the store, the resolver and the service boundary.
//!
//! Every failure surfaced to a caller carries one [`ErrorKind`], and every kind
//! renders as a fixed human-readable message. Callers at the boundary (CLI,
//! service dispatcher) report that message verbatim and never raw codes.

use thiserror::Error;

/// Message used when translating a code that names no known kind.
pub const UNKNOWN_ERROR_CODE: &str = "unknown error code";

/// Errors produced by the preference store and the system property resolver.
#[derive(Debug, Error)]
pub enum PrefsError {
    /// The handle or application id is unusable.
    #[error("invalid handle")]
    InvalidHandle,
    /// The key is not present in the store or not served by any source.
    #[error("no such key")]
    NoSuchKey,
    /// An allocation could not be satisfied.
    #[error("unable to allocate memory")]
    OutOfMemory,
    /// Another connection holds the application's database lock.
    #[error("underlying database is busy")]
    Busy,
    /// The operation exists in the interface but has no implementation.
    #[error("unimplemented")]
    NotImplemented,
    /// A value is not a complete top-level JSON object or array.
    #[error("illegal value (not a json document)")]
    ValueNotJson,
    /// The key is empty.
    #[error("illegal key")]
    IllegalKey,
    /// A required OS or hardware source is unavailable.
    #[error("required system resource is missing")]
    SystemConfigMissing,
    /// A parameter was rejected, e.g. clearing a store that does not exist.
    #[error("general parameter error")]
    ParamError,
    /// An invariant inside this crate did not hold.
    #[error("unspecified failure occurred")]
    Internal,
    /// The embedded database reported a failure other than lock contention.
    #[error("unspecified sqlite3 error")]
    Database(#[source] sqlx::Error),
}

/// Copyable mirror of [`PrefsError`] with stable integer codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`PrefsError::InvalidHandle`].
    InvalidHandle,
    /// See [`PrefsError::NoSuchKey`].
    NoSuchKey,
    /// See [`PrefsError::OutOfMemory`].
    OutOfMemory,
    /// A code was translated that names no known kind.
    UnknownErrorCode,
    /// See [`PrefsError::Busy`].
    Busy,
    /// See [`PrefsError::NotImplemented`].
    NotImplemented,
    /// See [`PrefsError::ValueNotJson`].
    ValueNotJson,
    /// See [`PrefsError::IllegalKey`].
    IllegalKey,
    /// See [`PrefsError::SystemConfigMissing`].
    SystemConfigMissing,
    /// See [`PrefsError::ParamError`].
    ParamError,
    /// See [`PrefsError::Internal`].
    Internal,
    /// See [`PrefsError::Database`].
    Database,
}

impl ErrorKind {
    const ALL: [Self; 12] = [
        Self::InvalidHandle,
        Self::NoSuchKey,
        Self::OutOfMemory,
        Self::UnknownErrorCode,
        Self::Busy,
        Self::NotImplemented,
        Self::ValueNotJson,
        Self::IllegalKey,
        Self::SystemConfigMissing,
        Self::ParamError,
        Self::Internal,
        Self::Database,
    ];

    /// Stable numeric code, starting at 1 (0 is reserved for success).
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            Self::InvalidHandle => 1,
            Self::NoSuchKey => 2,
            Self::OutOfMemory => 3,
            Self::UnknownErrorCode => 4,
            Self::Busy => 5,
            Self::NotImplemented => 6,
            Self::ValueNotJson => 7,
            Self::IllegalKey => 8,
            Self::SystemConfigMissing => 9,
            Self::ParamError => 10,
            Self::Internal => 11,
            Self::Database => 12,
        }
    }

    /// Looks up the kind carrying `code`.
    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// The fixed message for this kind.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::InvalidHandle => "invalid handle",
            Self::NoSuchKey => "no such key",
            Self::OutOfMemory => "unable to allocate memory",
            Self::UnknownErrorCode => UNKNOWN_ERROR_CODE,
            Self::Busy => "underlying database is busy",
            Self::NotImplemented => "unimplemented",
            Self::ValueNotJson => "illegal value (not a json document)",
            Self::IllegalKey => "illegal key",
            Self::SystemConfigMissing => "required system resource is missing",
            Self::ParamError => "general parameter error",
            Self::Internal => "unspecified failure occurred",
            Self::Database => "unspecified sqlite3 error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Translates a raw code into its message, falling back to
/// [`UNKNOWN_ERROR_CODE`].
#[must_use]
pub fn describe_code(code: i32) -> &'static str {
    if code == 0 {
        return "no error";
    }
    ErrorKind::from_code(code).map_or(UNKNOWN_ERROR_CODE, ErrorKind::message)
}

impl PrefsError {
    /// The kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidHandle => ErrorKind::InvalidHandle,
            Self::NoSuchKey => ErrorKind::NoSuchKey,
            Self::OutOfMemory => ErrorKind::OutOfMemory,
            Self::Busy => ErrorKind::Busy,
            Self::NotImplemented => ErrorKind::NotImplemented,
            Self::ValueNotJson => ErrorKind::ValueNotJson,
            Self::IllegalKey => ErrorKind::IllegalKey,
            Self::SystemConfigMissing => ErrorKind::SystemConfigMissing,
            Self::ParamError => ErrorKind::ParamError,
            Self::Internal => ErrorKind::Internal,
            Self::Database(_) => ErrorKind::Database,
        }
    }

    /// Returns true when the database rejected a statement because the
    /// preferences table is absent.
    #[must_use]
    pub fn is_missing_table(&self) -> bool {
        matches!(self, Self::Database(sqlx::Error::Database(db)) if db.message().contains("no such table"))
    }
}

impl From<sqlx::Error> for PrefsError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            // SQLITE_BUSY (5) and SQLITE_LOCKED (6), including extended codes.
            let primary = db
                .code()
                .and_then(|code| code.parse::<i32>().ok())
                .map(|code| code & 0xff);
            if matches!(primary, Some(5 | 6)) {
                return Self::Busy;
            }
        }
        Self::Database(err)
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = PrefsError> = std::result::Result<T, E>;
