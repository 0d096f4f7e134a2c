//! The derived data cache.

use std::path::{Path, PathBuf};

use vellum_core::profiling::profile_function;

use crate::backend::{MmapBackend, PlatformBackend};
use crate::error::{DdcError, DdcResult};
use crate::handle::{ByteRange, ContentHandle};
use crate::key::DerivedDataKey;

/// Size sentinel meaning "map to the end of the blob".
pub const WHOLE_BLOB: usize = usize::MAX;

/// Which part of a blob to map, and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapOptions {
    pub offset: u64,
    /// Number of bytes to map, or [`WHOLE_BLOB`].
    pub size: usize,
    pub writable: bool,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            offset: 0,
            size: WHOLE_BLOB,
            writable: false,
        }
    }
}

impl MapOptions {
    /// Map the whole blob read-only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map the whole blob read-write.
    pub fn writable() -> Self {
        Self {
            writable: true,
            ..Self::default()
        }
    }

    /// Map `size` bytes starting at `offset`.
    pub fn range(mut self, offset: u64, size: usize) -> Self {
        self.offset = offset;
        self.size = size;
        self
    }
}

/// Content-addressed store of memory-mapped blobs, one file per key under `root`.
///
/// Every operation except the existence checks treats IO failure as an error; a
/// missing blob is a normal outcome (`Ok(None)` / `Ok(false)`).
pub struct DerivedDataCache {
    root: PathBuf,
    backend: Box<dyn PlatformBackend>,
}

impl DerivedDataCache {
    /// Open (creating if needed) a cache rooted at `root` using memory-mapped files.
    pub fn new(root: impl AsRef<Path>) -> DdcResult<Self> {
        Self::with_backend(root, MmapBackend)
    }

    /// Open a cache with a custom backend.
    pub fn with_backend(
        root: impl AsRef<Path>,
        backend: impl PlatformBackend + 'static,
    ) -> DdcResult<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root).map_err(|e| DdcError::io(&root, e))?;
        tracing::debug!("Derived data cache opened at {}", root.display());
        Ok(Self {
            root,
            backend: Box::new(backend),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Backing file of `key`.
    pub fn blob_path(&self, key: DerivedDataKey) -> PathBuf {
        self.root.join(key.to_hex())
    }

    fn assert_valid(key: DerivedDataKey) {
        assert!(key.is_valid(), "invalid derived data key");
    }

    /// Durably write `bytes` as the blob named by `key`, replacing any previous blob.
    ///
    /// # Panics
    ///
    /// Panics if `key` is invalid or `bytes` is empty.
    pub fn create_derived_data(&self, key: DerivedDataKey, bytes: &[u8]) -> DdcResult<()> {
        profile_function!();
        Self::assert_valid(key);
        assert!(!bytes.is_empty(), "derived data for {} is empty", key);

        let path = self.blob_path(key);
        self.backend
            .write_all(&path, bytes)
            .map_err(|e| DdcError::io(&path, e))?;
        tracing::trace!("Wrote derived data {} ({} bytes)", key, bytes.len());
        Ok(())
    }

    /// Create a zero-filled blob of `size` bytes and return it mapped for writing.
    ///
    /// # Panics
    ///
    /// Panics if `key` is invalid or `size` is zero.
    pub fn create_derived_data_sized(
        &self,
        key: DerivedDataKey,
        size: usize,
    ) -> DdcResult<ContentHandle> {
        profile_function!();
        Self::assert_valid(key);
        assert!(size > 0, "derived data for {} is empty", key);

        let path = self.blob_path(key);
        let region = self
            .backend
            .create(&path, size)
            .map_err(|e| DdcError::io(&path, e))?;
        tracing::trace!("Created derived data {} ({} bytes)", key, size);
        Ok(ContentHandle::new(region, ByteRange { offset: 0, size }, key))
    }

    /// Map part of an existing blob. Returns `Ok(None)` if no blob exists for `key`.
    pub fn get_resource_handle(
        &self,
        key: DerivedDataKey,
        options: MapOptions,
    ) -> DdcResult<Option<ContentHandle>> {
        profile_function!();
        Self::assert_valid(key);

        let path = self.blob_path(key);
        let size = (options.size != WHOLE_BLOB).then_some(options.size);
        let region = self
            .backend
            .open(&path, options.offset, size, options.writable)
            .map_err(|e| DdcError::io(&path, e))?;

        Ok(region.map(|region| {
            let range = ByteRange {
                offset: options.offset,
                size: region.len(),
            };
            ContentHandle::new(region, range, key)
        }))
    }

    /// Remove the blob if present. Returns whether anything was removed.
    pub fn delete_derived_data(&self, key: DerivedDataKey) -> DdcResult<bool> {
        Self::assert_valid(key);
        let path = self.blob_path(key);
        let removed = self
            .backend
            .remove(&path)
            .map_err(|e| DdcError::io(&path, e))?;
        if removed {
            tracing::trace!("Deleted derived data {}", key);
        }
        Ok(removed)
    }

    /// Move the blob of `from` over the blob of `to` in one step.
    ///
    /// Handles mapped from either key keep their current contents.
    pub fn rename_derived_data(&self, from: DerivedDataKey, to: DerivedDataKey) -> DdcResult<()> {
        Self::assert_valid(from);
        Self::assert_valid(to);
        let source = self.blob_path(from);
        self.backend
            .rename(&source, &self.blob_path(to))
            .map_err(|e| DdcError::io(&source, e))?;
        tracing::trace!("Renamed derived data {} to {}", from, to);
        Ok(())
    }

    /// Whether a blob exists for `key`, without mapping it.
    pub fn does_key_exist(&self, key: DerivedDataKey) -> bool {
        key.is_valid() && self.backend.exists(&self.blob_path(key))
    }

    /// Size of the blob in bytes, or `None` if it does not exist.
    pub fn blob_size(&self, key: DerivedDataKey) -> DdcResult<Option<u64>> {
        Self::assert_valid(key);
        let path = self.blob_path(key);
        self.backend.size(&path).map_err(|e| DdcError::io(&path, e))
    }
}

impl std::fmt::Debug for DerivedDataCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedDataCache")
            .field("root", &self.root)
            .finish()
    }
}
