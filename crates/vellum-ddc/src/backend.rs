//! Platform backend for cache blobs.
//!
//! The cache itself only deals in keys and handles; the backend owns the actual file
//! and mapping calls so tests and tools can substitute their own implementation.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use memmap2::{Mmap, MmapMut, MmapOptions};
use vellum_core::profiling::profile_function;

/// A live memory mapping of (part of) a blob.
#[derive(Debug)]
pub enum MappedRegion {
    /// Mapped read-only.
    ReadOnly(Mmap),
    /// Mapped read-write; writes reach the file on flush or unmap.
    Writable(MmapMut),
}

impl MappedRegion {
    pub fn len(&self) -> usize {
        match self {
            MappedRegion::ReadOnly(map) => map.len(),
            MappedRegion::Writable(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_writable(&self) -> bool {
        matches!(self, MappedRegion::Writable(_))
    }

    pub fn as_slice(&self) -> &[u8] {
        match self {
            MappedRegion::ReadOnly(map) => &map[..],
            MappedRegion::Writable(map) => &map[..],
        }
    }

    pub fn as_mut_slice(&mut self) -> Option<&mut [u8]> {
        match self {
            MappedRegion::ReadOnly(_) => None,
            MappedRegion::Writable(map) => Some(&mut map[..]),
        }
    }

    /// Force written bytes back to the file. No-op for read-only regions.
    pub fn flush(&self) -> io::Result<()> {
        match self {
            MappedRegion::ReadOnly(_) => Ok(()),
            MappedRegion::Writable(map) => map.flush(),
        }
    }
}

/// File and mapping primitives used by [`crate::DerivedDataCache`].
pub trait PlatformBackend: Send + Sync {
    /// Replace the file at `path` with a new zero-filled file of `size` bytes and map
    /// it writable.
    ///
    /// Mappings of the previous file stay valid and keep its old contents.
    fn create(&self, path: &Path, size: usize) -> io::Result<MappedRegion>;

    /// Durably write `bytes` as the complete content of `path`.
    ///
    /// Readers never observe a partially written file.
    fn write_all(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;

    /// Map `size` bytes starting at `offset`, or the rest of the file if `size` is `None`.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    fn open(
        &self,
        path: &Path,
        offset: u64,
        size: Option<usize>,
        writable: bool,
    ) -> io::Result<Option<MappedRegion>>;

    /// Remove the file. Returns `false` if it did not exist.
    fn remove(&self, path: &Path) -> io::Result<bool>;

    /// Atomically move the file at `from` over `to`, replacing any file there.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    fn exists(&self, path: &Path) -> bool;

    /// Size of the file in bytes, or `None` if it does not exist.
    fn size(&self, path: &Path) -> io::Result<Option<u64>>;
}

static STAGING_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique sibling of `path` used while a blob is being written.
fn staging_path(path: &Path) -> PathBuf {
    let n = STAGING_COUNTER.fetch_add(1, Ordering::Relaxed);
    path.with_extension(format!("{}-{}.tmp", std::process::id(), n))
}

/// Backend that stores each blob as a regular file and maps it with `memmap2`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MmapBackend;

impl MmapBackend {
    fn map_writable(file: &File, offset: u64, len: usize) -> io::Result<MappedRegion> {
        // SAFETY: cache files are only modified through mappings handed out by the
        // cache; concurrent truncation by other processes is unsupported.
        let map = unsafe { MmapOptions::new().offset(offset).len(len).map_mut(file)? };
        Ok(MappedRegion::Writable(map))
    }

    fn map_read_only(file: &File, offset: u64, len: usize) -> io::Result<MappedRegion> {
        // SAFETY: see `map_writable`.
        let map = unsafe { MmapOptions::new().offset(offset).len(len).map(file)? };
        Ok(MappedRegion::ReadOnly(map))
    }

    /// Create a fresh file at `path`, which must not exist, and map it writable.
    fn create_new(path: &Path, size: usize) -> io::Result<MappedRegion> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;
        file.set_len(size as u64)?;
        Self::map_writable(&file, 0, size)
    }

    /// Run `fill` on a new staging file and move it over `path` once `fill` succeeds.
    fn staged<T>(
        path: &Path,
        size: usize,
        fill: impl FnOnce(MappedRegion) -> io::Result<T>,
    ) -> io::Result<T> {
        let staging = staging_path(path);
        let result = Self::create_new(&staging, size)
            .and_then(fill)
            .and_then(|value| fs::rename(&staging, path).map(|()| value));
        if result.is_err() {
            let _ = fs::remove_file(&staging);
        }
        result
    }
}

impl PlatformBackend for MmapBackend {
    fn create(&self, path: &Path, size: usize) -> io::Result<MappedRegion> {
        profile_function!();
        // A new inode, so live mappings of the old blob never see it shrink.
        Self::staged(path, size, Ok)
    }

    fn write_all(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        profile_function!();
        Self::staged(path, bytes.len(), |mut region| {
            if let Some(span) = region.as_mut_slice() {
                span.copy_from_slice(bytes);
            }
            region.flush()
        })
    }

    fn open(
        &self,
        path: &Path,
        offset: u64,
        size: Option<usize>,
        writable: bool,
    ) -> io::Result<Option<MappedRegion>> {
        profile_function!();
        let file = match OpenOptions::new().read(true).write(writable).open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        let file_len = file.metadata()?.len();
        assert!(
            offset <= file_len,
            "mapping offset {} is past the end of '{}' ({} bytes)",
            offset,
            path.display(),
            file_len
        );
        let len = size.unwrap_or((file_len - offset) as usize);
        assert!(len > 0, "mapping of '{}' would be empty", path.display());
        assert!(
            offset + len as u64 <= file_len,
            "mapping range {}..{} is past the end of '{}' ({} bytes)",
            offset,
            offset + len as u64,
            path.display(),
            file_len
        );

        let region = if writable {
            Self::map_writable(&file, offset, len)?
        } else {
            Self::map_read_only(&file, offset, len)?
        };
        Ok(Some(region))
    }

    fn remove(&self, path: &Path) -> io::Result<bool> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn size(&self, path: &Path) -> io::Result<Option<u64>> {
        match fs::metadata(path) {
            Ok(meta) => Ok(Some(meta.len())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}
