//! Owning handles over mapped cache blobs.

use std::fmt;

use crate::backend::MappedRegion;
use crate::error::{DdcError, DdcResult};
use crate::key::DerivedDataKey;

/// The byte range of a blob covered by a [`ContentHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub offset: u64,
    pub size: usize,
}

impl ByteRange {
    pub fn end(&self) -> u64 {
        self.offset + self.size as u64
    }
}

/// Exclusive owner of one mapping of a cache blob.
///
/// Handles are move-only; dropping one unmaps its range. Bytes handed to a consumer
/// (e.g. a GPU upload) stay valid for as long as the handle is alive.
pub struct ContentHandle {
    region: MappedRegion,
    range: ByteRange,
    key: DerivedDataKey,
}

impl ContentHandle {
    /// Wrap a live mapping.
    ///
    /// # Panics
    ///
    /// Panics if the mapping is empty or does not cover `range.size` bytes.
    pub fn new(region: MappedRegion, range: ByteRange, key: DerivedDataKey) -> Self {
        assert!(range.size > 0, "content handle for {} has zero length", key);
        assert_eq!(
            region.len(),
            range.size,
            "content handle for {} does not cover its byte range",
            key
        );
        Self { region, range, key }
    }

    pub fn key(&self) -> DerivedDataKey {
        self.key
    }

    pub fn range(&self) -> ByteRange {
        self.range
    }

    pub fn len(&self) -> usize {
        self.range.size
    }

    pub fn is_empty(&self) -> bool {
        self.range.size == 0
    }

    pub fn is_writable(&self) -> bool {
        self.region.is_writable()
    }

    pub fn immutable_span(&self) -> &[u8] {
        self.region.as_slice()
    }

    /// Writable view of the mapped bytes.
    ///
    /// # Panics
    ///
    /// Panics if the handle was mapped read-only.
    pub fn mutable_span(&mut self) -> &mut [u8] {
        let key = self.key;
        self.region
            .as_mut_slice()
            .unwrap_or_else(|| panic!("content handle for {} is mapped read-only", key))
    }

    /// Force pending writes back to the backing file.
    pub fn flush_writes(&self) -> DdcResult<()> {
        self.region
            .flush()
            .map_err(|e| DdcError::io(self.key.to_hex(), e))
    }
}

impl fmt::Debug for ContentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentHandle")
            .field("key", &self.key)
            .field("range", &self.range)
            .field("writable", &self.is_writable())
            .finish()
    }
}
