//! Error types for the derived data cache.

use std::fmt;
use std::path::PathBuf;

use crate::key::DerivedDataKey;

/// Errors that can occur while accessing the cache.
///
/// Absence of a blob is not an error; lookups return `Ok(None)` instead.
#[derive(Debug)]
pub enum DdcError {
    /// The backing file could not be created, opened, mapped or removed.
    Io {
        /// The backing file involved.
        path: PathBuf,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// A blob exists but does not follow the header-prefixed container layout.
    Container {
        /// Key of the malformed blob.
        key: DerivedDataKey,
        /// Description of the problem.
        message: String,
    },
}

impl DdcError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DdcError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn container(key: DerivedDataKey, message: impl Into<String>) -> Self {
        DdcError::Container {
            key,
            message: message.into(),
        }
    }
}

impl fmt::Display for DdcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DdcError::Io { path, source } => {
                write!(f, "Derived data IO error on '{}': {}", path.display(), source)
            }
            DdcError::Container { key, message } => {
                write!(f, "Malformed derived data blob {}: {}", key, message)
            }
        }
    }
}

impl std::error::Error for DdcError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DdcError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type alias for cache operations.
pub type DdcResult<T> = Result<T, DdcError>;
