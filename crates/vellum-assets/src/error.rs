//! Error types for the asset system.

use std::fmt;
use std::path::PathBuf;

use vellum_ddc::DdcError;

/// Errors that can occur during asset operations.
#[derive(Debug)]
pub enum AssetError {
    /// The requested asset file does not exist.
    NotFound {
        /// The resource path of the asset.
        path: String,
    },

    /// Failed to read or write an asset file.
    IoError {
        /// The file involved.
        path: PathBuf,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// An asset file or attribute payload could not be (de)serialized.
    Serialization {
        /// What was being (de)serialized.
        context: String,
        /// The underlying serde error.
        source: serde_json::Error,
    },

    /// The derived data cache failed.
    Cache(DdcError),

    /// An asset file names a type that is not registered with the factory.
    UnknownType {
        /// The type name found in the file.
        name: String,
    },

    /// Producing derived data for an asset failed.
    Compilation {
        /// The resource path of the asset.
        path: String,
        /// Description of the failure.
        message: String,
    },

    /// A resource path that cannot name an asset file.
    InvalidPath {
        /// The offending path.
        path: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Generic error with a message.
    Other {
        /// Error message.
        message: String,
    },
}

impl AssetError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AssetError::IoError {
            path: path.into(),
            source,
        }
    }

    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        AssetError::Serialization {
            context: context.into(),
            source,
        }
    }

    pub fn invalid_path(path: impl fmt::Display, reason: &'static str) -> Self {
        AssetError::InvalidPath {
            path: path.to_string(),
            reason,
        }
    }

    pub fn compilation(path: impl fmt::Display, message: impl Into<String>) -> Self {
        AssetError::Compilation {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::NotFound { path } => {
                write!(f, "Asset not found: {}", path)
            }
            AssetError::IoError { path, source } => {
                write!(f, "IO error on '{}': {}", path.display(), source)
            }
            AssetError::Serialization { context, source } => {
                write!(f, "Failed to (de)serialize {}: {}", context, source)
            }
            AssetError::Cache(err) => {
                write!(f, "Derived data cache error: {}", err)
            }
            AssetError::UnknownType { name } => {
                write!(f, "Unknown asset type: {}", name)
            }
            AssetError::Compilation { path, message } => {
                write!(f, "Failed to compile '{}': {}", path, message)
            }
            AssetError::InvalidPath { path, reason } => {
                write!(f, "Invalid asset path '{}': {}", path, reason)
            }
            AssetError::Other { message } => {
                write!(f, "Asset error: {}", message)
            }
        }
    }
}

impl std::error::Error for AssetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AssetError::IoError { source, .. } => Some(source),
            AssetError::Serialization { source, .. } => Some(source),
            AssetError::Cache(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for AssetError {
    fn from(err: std::io::Error) -> Self {
        AssetError::IoError {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<DdcError> for AssetError {
    fn from(err: DdcError) -> Self {
        AssetError::Cache(err)
    }
}

/// Result type alias for asset operations.
pub type AssetResult<T> = Result<T, AssetError>;

/// Why [`crate::AssetsSystem::create_asset`] failed.
#[derive(Debug)]
pub enum CreateError {
    /// An asset file (or a live instance) already exists at the path.
    AlreadyExists,
    /// The type could not be constructed, or the asset file could not be written.
    FailedToCreateInstance(AssetError),
    /// The asset's post-create step (usually its compile) failed.
    CompilationFailed(AssetError),
}

impl fmt::Display for CreateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreateError::AlreadyExists => write!(f, "Asset already exists"),
            CreateError::FailedToCreateInstance(err) => {
                write!(f, "Failed to create asset instance: {}", err)
            }
            CreateError::CompilationFailed(err) => write!(f, "Asset compilation failed: {}", err),
        }
    }
}

impl std::error::Error for CreateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CreateError::AlreadyExists => None,
            CreateError::FailedToCreateInstance(err) | CreateError::CompilationFailed(err) => {
                Some(err)
            }
        }
    }
}

/// Why [`crate::AssetsSystem::load_asset`] failed.
#[derive(Debug)]
pub enum LoadError {
    /// No asset file exists at the path and no instance is loaded.
    DoesNotExist,
    /// The asset file could not be read, decoded or constructed.
    FailedToCreateInstance(AssetError),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::DoesNotExist => write!(f, "Asset does not exist"),
            LoadError::FailedToCreateInstance(err) => {
                write!(f, "Failed to create asset instance: {}", err)
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::DoesNotExist => None,
            LoadError::FailedToCreateInstance(err) => Some(err),
        }
    }
}

/// Outcome of [`crate::AssetsSystem::delete_asset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteResult {
    /// The asset file was removed.
    Success,
    /// There was no asset file to remove.
    DoesNotExist,
    /// Reserved for a policy that refuses to delete referenced assets. Never produced.
    StillReferenced,
}

impl DeleteResult {
    pub fn is_success(&self) -> bool {
        matches!(self, DeleteResult::Success)
    }
}
