//! Which system properties may be disclosed to unprivileged callers.
//!
//! The whitelist is a newline-delimited file of fully prefixed keys. It ships
//! with the package, so the process-wide copy is built on first use and never
//! re-read.

use std::collections::HashSet;
use std::io::ErrorKind as IoErrorKind;
use std::path::Path;
use std::sync::OnceLock;

use thiserror::Error;
use tracing::{debug, info};

static GLOBAL: OnceLock<Whitelist> = OnceLock::new();

/// Inconsistencies in a whitelist file.
#[derive(Debug, Error)]
pub enum WhitelistError {
    /// A line is not terminated by a newline.
    #[error("line {line} is not newline-terminated")]
    UnterminatedLine {
        /// One-based line number.
        line: usize,
    },
    /// A key appears more than once.
    #[error("duplicate key '{key}' on line {line}")]
    DuplicateKey {
        /// The repeated key.
        key: String,
        /// One-based line number of the repeat.
        line: usize,
    },
    /// The file exists but could not be read.
    #[error("failed to read whitelist: {0}")]
    Io(#[from] std::io::Error),
}

/// Immutable set of publicly disclosable property keys.
#[derive(Debug, Clone, Default)]
pub struct Whitelist {
    keys: HashSet<String>,
}

impl Whitelist {
    /// Parses whitelist text: one key per line, every line newline-terminated,
    /// no duplicates.
    ///
    /// # Errors
    ///
    /// Returns a [`WhitelistError`] describing the first inconsistency.
    pub fn parse(text: &str) -> Result<Self, WhitelistError> {
        let mut keys = HashSet::new();
        for (index, line) in text.split_inclusive('\n').enumerate() {
            let line_no = index + 1;
            let Some(key) = line.strip_suffix('\n') else {
                return Err(WhitelistError::UnterminatedLine { line: line_no });
            };
            if !keys.insert(key.to_owned()) {
                return Err(WhitelistError::DuplicateKey {
                    key: key.to_owned(),
                    line: line_no,
                });
            }
        }
        Ok(Self { keys })
    }

    /// Loads the whitelist at `path`. A missing file yields an empty set.
    ///
    /// # Errors
    ///
    /// Returns a [`WhitelistError`] if the file cannot be read or is
    /// inconsistent.
    pub fn load(path: &Path) -> Result<Self, WhitelistError> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let whitelist = Self::parse(&text)?;
                info!(path = %path.display(), keys = whitelist.len(), "Loaded public property whitelist");
                Ok(whitelist)
            }
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                debug!(path = %path.display(), "No whitelist; no property is public");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// The process-wide whitelist, built from `path` on the first call.
    ///
    /// Later calls return the same set whatever path they pass.
    ///
    /// # Panics
    ///
    /// Panics if the file is inconsistent. The whitelist is part of the
    /// installed package, so a malformed one is a packaging defect.
    pub fn global(path: &Path) -> &'static Self {
        GLOBAL.get_or_init(|| {
            Self::load(path).unwrap_or_else(|e| {
                panic!("public property whitelist {} is invalid: {e}", path.display())
            })
        })
    }

    /// Whether `key` may be disclosed on the public channel.
    #[must_use]
    pub fn is_public(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Number of public keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether no key is public.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl FromIterator<String> for Whitelist {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}
