//! Configuration of the asset system.

use std::path::{Path, PathBuf};

use vellum_core::ResourcePath;

/// Default initial capacity of the descriptor index.
pub const DEFAULT_ASSETS_DB_CAPACITY: usize = 1024;

/// Where assets live on disk and which optional layers are enabled.
///
/// # Example
///
/// ```ignore
/// let config = AssetsConfig::in_directory("project")
///     .with_assets_db_capacity(4096);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetsConfig {
    /// Root of the human-readable asset files.
    pub content_root: PathBuf,
    /// Root of the derived data cache.
    pub cache_root: PathBuf,
    /// Maintain the persistent descriptor index.
    pub use_assets_db: bool,
    /// Initial slot capacity of a freshly created descriptor index.
    pub assets_db_capacity: usize,
    /// Create missing root directories at start-up.
    pub create_directories: bool,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            content_root: PathBuf::from("content"),
            cache_root: PathBuf::from("ddc"),
            use_assets_db: true,
            assets_db_capacity: DEFAULT_ASSETS_DB_CAPACITY,
            create_directories: true,
        }
    }
}

impl AssetsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Content under `root/content`, cache under `root/ddc`.
    pub fn in_directory(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            content_root: root.join("content"),
            cache_root: root.join("ddc"),
            ..Self::default()
        }
    }

    pub fn with_content_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.content_root = root.into();
        self
    }

    pub fn with_cache_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.cache_root = root.into();
        self
    }

    pub fn with_assets_db(mut self, enabled: bool) -> Self {
        self.use_assets_db = enabled;
        self
    }

    pub fn with_assets_db_capacity(mut self, capacity: usize) -> Self {
        self.assets_db_capacity = capacity;
        self
    }

    pub fn with_create_directories(mut self, enabled: bool) -> Self {
        self.create_directories = enabled;
        self
    }

    /// On-disk location of the asset file for `path`.
    pub fn content_path(&self, path: ResourcePath) -> PathBuf {
        self.content_root.join(path.as_path())
    }
}
