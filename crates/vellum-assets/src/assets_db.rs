//! Persistent descriptor index.
//!
//! Maps every known asset path to a small [`AssetDescriptor`] so dependent-asset
//! compilation can learn an asset's type without reading its file. The index lives in
//! two cache blobs with index-aligned slots:
//!
//! ```text
//! descriptors: [ DbHeader { count } ][ AssetDescriptor; capacity ]
//! paths:       [ [u8; PATH_SLOT_LEN]; capacity ]
//! ```
//!
//! The live region is always `[0, count)` in both blobs. Deleting swaps the last live
//! slot into the hole, so insertion order is not preserved.
//!
//! Growing writes both enlarged blobs under staging keys and renames them into place,
//! descriptors first. A process that dies between the two renames leaves only the
//! staged paths blob behind, which [`AssetsDb::open`] promotes; any other leftover
//! staging blob is discarded.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use parking_lot::RwLock;
use vellum_core::alloc::HashMap;
use vellum_core::path::PathId;
use vellum_core::profiling::profile_function;
use vellum_core::ResourcePath;
use vellum_ddc::{ContentHandle, DerivedDataCache, DerivedDataKey, MapOptions};

use crate::asset_type::AssetTypeKey;
use crate::error::{AssetError, AssetResult};

/// Byte length of one path slot, including the terminating NUL padding.
pub const PATH_SLOT_LEN: usize = 256;

/// Longest path, in bytes, the index can record.
pub const MAX_PATH_LEN: usize = PATH_SLOT_LEN - 1;

const DB_NAMESPACE: &str = "vellum.assets_db";
const HEADER_LEN: usize = size_of::<DbHeader>();
const DESCRIPTOR_LEN: usize = size_of::<AssetDescriptor>();

/// Key of the blob holding the header and descriptor array.
pub fn descriptors_key() -> DerivedDataKey {
    DerivedDataKey::derive(DB_NAMESPACE, "descriptors")
}

/// Key of the blob holding the path array.
pub fn paths_key() -> DerivedDataKey {
    DerivedDataKey::derive(DB_NAMESPACE, "paths")
}

fn staged_descriptors_key() -> DerivedDataKey {
    DerivedDataKey::derive(DB_NAMESPACE, "descriptors.staging")
}

fn staged_paths_key() -> DerivedDataKey {
    DerivedDataKey::derive(DB_NAMESPACE, "paths.staging")
}

/// Whether `path` fits an index slot.
pub fn accepts_path(path: ResourcePath) -> bool {
    path.is_valid() && path.as_str().len() <= MAX_PATH_LEN
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct DbHeader {
    count: u32,
    reserved: u32,
}

/// What the index records about one asset.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct AssetDescriptor {
    pub asset_type: AssetTypeKey,
}

impl AssetDescriptor {
    pub fn new(asset_type: AssetTypeKey) -> Self {
        Self { asset_type }
    }
}

#[derive(Debug, Clone, Copy)]
struct IndexEntry {
    path: ResourcePath,
    descriptor: AssetDescriptor,
    slot: usize,
}

/// The two writable mappings backing the index.
struct DbBlobs {
    descriptors: ContentHandle,
    paths: ContentHandle,
    capacity: usize,
}

impl DbBlobs {
    fn header(&self) -> &DbHeader {
        bytemuck::from_bytes(&self.descriptors.immutable_span()[..HEADER_LEN])
    }

    fn count(&self) -> usize {
        self.header().count as usize
    }

    fn set_count(&mut self, count: usize) {
        let header: &mut DbHeader =
            bytemuck::from_bytes_mut(&mut self.descriptors.mutable_span()[..HEADER_LEN]);
        header.count = u32::try_from(count).expect("assets db count exceeds u32");
    }

    fn descriptor_range(slot: usize) -> std::ops::Range<usize> {
        let start = HEADER_LEN + slot * DESCRIPTOR_LEN;
        start..start + DESCRIPTOR_LEN
    }

    fn path_range(slot: usize) -> std::ops::Range<usize> {
        let start = slot * PATH_SLOT_LEN;
        start..start + PATH_SLOT_LEN
    }

    fn descriptor(&self, slot: usize) -> AssetDescriptor {
        *bytemuck::from_bytes(&self.descriptors.immutable_span()[Self::descriptor_range(slot)])
    }

    fn set_descriptor(&mut self, slot: usize, descriptor: AssetDescriptor) {
        self.descriptors.mutable_span()[Self::descriptor_range(slot)]
            .copy_from_slice(bytemuck::bytes_of(&descriptor));
    }

    fn path(&self, slot: usize) -> &str {
        let bytes = &self.paths.immutable_span()[Self::path_range(slot)];
        let len = bytes.iter().position(|&b| b == 0).unwrap_or(PATH_SLOT_LEN);
        std::str::from_utf8(&bytes[..len])
            .unwrap_or_else(|_| panic!("assets db path slot {} is not valid UTF-8", slot))
    }

    fn set_path(&mut self, slot: usize, path: &str) {
        assert!(
            path.len() < PATH_SLOT_LEN,
            "path '{}' does not fit an assets db slot ({} bytes max)",
            path,
            PATH_SLOT_LEN - 1
        );
        let span = &mut self.paths.mutable_span()[Self::path_range(slot)];
        span.fill(0);
        span[..path.len()].copy_from_slice(path.as_bytes());
    }

    fn clear_slot(&mut self, slot: usize) {
        self.descriptors.mutable_span()[Self::descriptor_range(slot)].fill(0);
        self.paths.mutable_span()[Self::path_range(slot)].fill(0);
    }

    fn flush(&self) -> AssetResult<()> {
        self.descriptors.flush_writes()?;
        self.paths.flush_writes()?;
        Ok(())
    }
}

fn descriptors_size(capacity: usize) -> usize {
    HEADER_LEN + capacity * DESCRIPTOR_LEN
}

fn paths_size(capacity: usize) -> usize {
    capacity * PATH_SLOT_LEN
}

fn create_blobs(
    cache: &DerivedDataCache,
    (descriptors_key, paths_key): (DerivedDataKey, DerivedDataKey),
    capacity: usize,
) -> AssetResult<DbBlobs> {
    let descriptors = cache.create_derived_data_sized(descriptors_key, descriptors_size(capacity))?;
    let paths = cache.create_derived_data_sized(paths_key, paths_size(capacity))?;
    Ok(DbBlobs {
        descriptors,
        paths,
        capacity,
    })
}

/// Finish or roll back a growth that was interrupted before both renames happened.
fn recover_interrupted_growth(cache: &DerivedDataCache) -> AssetResult<()> {
    let staged_descriptors = cache.does_key_exist(staged_descriptors_key());
    let staged_paths = cache.does_key_exist(staged_paths_key());
    if staged_paths && !staged_descriptors {
        tracing::warn!("Finishing interrupted assets db growth");
        cache.rename_derived_data(staged_paths_key(), paths_key())?;
    } else if staged_descriptors {
        tracing::warn!("Discarding interrupted assets db growth");
        cache.delete_derived_data(staged_descriptors_key())?;
        cache.delete_derived_data(staged_paths_key())?;
    }
    Ok(())
}

fn discard_staged(cache: &DerivedDataCache) {
    for key in [staged_descriptors_key(), staged_paths_key()] {
        if let Err(e) = cache.delete_derived_data(key) {
            tracing::warn!("Failed to remove staged assets db blob {}: {}", key, e);
        }
    }
}

struct DbState {
    blobs: DbBlobs,
    index: HashMap<PathId, IndexEntry>,
}

/// The persistent descriptor index.
///
/// Lookups take the lock in shared mode, mutations in exclusive mode.
pub struct AssetsDb {
    cache: Arc<DerivedDataCache>,
    state: RwLock<DbState>,
}

impl AssetsDb {
    /// Open the index stored in `cache`, creating it with `initial_capacity` slots if it
    /// does not exist yet.
    ///
    /// # Panics
    ///
    /// Panics if only one of the two blobs exists or their slot counts disagree.
    pub fn open(cache: Arc<DerivedDataCache>, initial_capacity: usize) -> AssetResult<Self> {
        profile_function!();
        recover_interrupted_growth(&cache)?;
        let descriptors = cache.get_resource_handle(descriptors_key(), MapOptions::writable())?;
        let paths = cache.get_resource_handle(paths_key(), MapOptions::writable())?;

        let (blobs, index) = match (descriptors, paths) {
            (Some(descriptors), Some(paths)) => {
                let capacity = (descriptors.len() - HEADER_LEN) / DESCRIPTOR_LEN;
                let path_capacity = paths.len() / PATH_SLOT_LEN;
                assert_eq!(
                    capacity, path_capacity,
                    "assets db descriptor and path blobs disagree on slot count"
                );
                let blobs = DbBlobs {
                    descriptors,
                    paths,
                    capacity,
                };
                let index = Self::rebuild_index(&blobs);
                tracing::debug!(
                    "Opened assets db with {} entries ({} slots)",
                    index.len(),
                    capacity
                );
                (blobs, index)
            }
            (None, None) => {
                let capacity = initial_capacity.max(1);
                let blobs = create_blobs(&cache, (descriptors_key(), paths_key()), capacity)?;
                blobs.flush()?;
                tracing::debug!("Created assets db with {} slots", capacity);
                (blobs, HashMap::default())
            }
            _ => panic!("assets db is incomplete: exactly one of its two blobs exists"),
        };

        Ok(Self {
            cache,
            state: RwLock::new(DbState { blobs, index }),
        })
    }

    fn rebuild_index(blobs: &DbBlobs) -> HashMap<PathId, IndexEntry> {
        let count = blobs.count();
        assert!(
            count <= blobs.capacity,
            "assets db count {} exceeds capacity {}",
            count,
            blobs.capacity
        );

        let mut index = vellum_core::alloc::map_with_capacity(count);
        for slot in 0..count {
            let path = ResourcePath::get_or_create(blobs.path(slot));
            assert!(path.is_valid(), "assets db slot {} has an empty path", slot);
            let entry = IndexEntry {
                path,
                descriptor: blobs.descriptor(slot),
                slot,
            };
            let previous = index.insert(path.id(), entry);
            assert!(previous.is_none(), "assets db lists '{}' twice", path);
        }
        index
    }

    /// Record `descriptor` for `path`. Returns `false` if the path was already indexed.
    ///
    /// Fails with [`AssetError::InvalidPath`] if the path is longer than
    /// [`MAX_PATH_LEN`] bytes.
    pub fn save_asset_descriptor(
        &self,
        path: ResourcePath,
        descriptor: AssetDescriptor,
    ) -> AssetResult<bool> {
        profile_function!();
        assert!(path.is_valid(), "cannot index the invalid path");
        if !accepts_path(path) {
            return Err(AssetError::invalid_path(path, "too long for the assets db"));
        }

        let mut state = self.state.write();
        if state.index.contains_key(&path.id()) {
            return Ok(false);
        }

        let slot = state.blobs.count();
        if slot == state.blobs.capacity {
            self.grow(&mut state, slot)?;
        }

        let blobs = &mut state.blobs;
        blobs.set_descriptor(slot, descriptor);
        blobs.set_path(slot, path.as_str());
        blobs.set_count(slot + 1);
        blobs.flush()?;

        state.index.insert(
            path.id(),
            IndexEntry {
                path,
                descriptor,
                slot,
            },
        );
        tracing::trace!("Indexed {} in slot {}", path, slot);
        Ok(true)
    }

    /// Double the capacity, keeping the first `count` slots.
    ///
    /// On failure the current blobs stay in place and in use.
    fn grow(&self, state: &mut DbState, count: usize) -> AssetResult<()> {
        profile_function!();
        let capacity = state.blobs.capacity;
        let new_capacity = capacity * 2;

        let staged = match self.stage_blobs(&state.blobs, count, new_capacity) {
            Ok(staged) => staged,
            Err(e) => {
                tracing::error!("Failed to grow assets db to {} slots: {}", new_capacity, e);
                discard_staged(&self.cache);
                return Err(e);
            }
        };

        if let Err(e) = self
            .cache
            .rename_derived_data(staged_descriptors_key(), descriptors_key())
        {
            tracing::error!("Failed to grow assets db to {} slots: {}", new_capacity, e);
            discard_staged(&self.cache);
            return Err(e.into());
        }

        // The descriptors are committed; a failed paths rename is finished by the next open.
        let promoted = self
            .cache
            .rename_derived_data(staged_paths_key(), paths_key());
        state.blobs = staged;
        promoted?;

        tracing::debug!("Grew assets db from {} to {} slots", capacity, new_capacity);
        Ok(())
    }

    /// Write both blobs at `capacity` slots under the staging keys, holding a copy of
    /// the first `count` slots of `blobs`.
    fn stage_blobs(&self, blobs: &DbBlobs, count: usize, capacity: usize) -> AssetResult<DbBlobs> {
        let mut staged = create_blobs(
            &self.cache,
            (staged_descriptors_key(), staged_paths_key()),
            capacity,
        )?;
        let descriptors = descriptors_size(count);
        let paths = paths_size(count);
        staged.descriptors.mutable_span()[..descriptors]
            .copy_from_slice(&blobs.descriptors.immutable_span()[..descriptors]);
        staged.paths.mutable_span()[..paths]
            .copy_from_slice(&blobs.paths.immutable_span()[..paths]);
        staged.flush()?;
        Ok(staged)
    }

    /// Remove the entry of `path_id`, compacting the live region. Returns `false` if the
    /// path was not indexed.
    pub fn delete_asset_descriptor(&self, path_id: PathId) -> AssetResult<bool> {
        profile_function!();
        let mut state = self.state.write();
        let Some(removed) = state.index.remove(&path_id) else {
            return Ok(false);
        };

        let blobs = &mut state.blobs;
        let count = blobs.count();
        assert!(
            removed.slot < count,
            "assets db slot {} of '{}' is outside the live region",
            removed.slot,
            removed.path
        );
        let last = count - 1;

        let moved = if removed.slot != last {
            let descriptor = blobs.descriptor(last);
            let path = blobs.path(last).to_owned();
            blobs.set_descriptor(removed.slot, descriptor);
            blobs.set_path(removed.slot, &path);
            Some(path)
        } else {
            None
        };
        blobs.clear_slot(last);
        blobs.set_count(last);
        blobs.flush()?;

        if let Some(path) = moved {
            let moved_id = ResourcePath::get_or_create(&path).id();
            let entry = state
                .index
                .get_mut(&moved_id)
                .unwrap_or_else(|| panic!("assets db slot {} names unindexed '{}'", last, path));
            entry.slot = removed.slot;
        }

        tracing::trace!("Removed {} from assets db", removed.path);
        Ok(true)
    }

    pub fn find_asset_descriptor(&self, path: ResourcePath) -> Option<AssetDescriptor> {
        self.state
            .read()
            .index
            .get(&path.id())
            .map(|entry| entry.descriptor)
    }

    /// Every indexed path with its descriptor, in slot order.
    pub fn enumerate_asset_descriptors(&self) -> Vec<(ResourcePath, AssetDescriptor)> {
        let state = self.state.read();
        let mut entries: Vec<_> = state.index.values().copied().collect();
        entries.sort_by_key(|entry| entry.slot);
        entries
            .into_iter()
            .map(|entry| (entry.path, entry.descriptor))
            .collect()
    }

    /// The indexed path with the given id.
    pub fn resolve_path(&self, path_id: PathId) -> Option<ResourcePath> {
        self.state.read().index.get(&path_id).map(|entry| entry.path)
    }

    /// Slot currently holding `path`.
    pub fn slot_of(&self, path: ResourcePath) -> Option<usize> {
        self.state.read().index.get(&path.id()).map(|entry| entry.slot)
    }

    /// Path stored in `slot` of the backing blob, if the slot is live.
    pub fn path_in_slot(&self, slot: usize) -> Option<ResourcePath> {
        let state = self.state.read();
        let blobs = &state.blobs;
        (slot < blobs.count()).then(|| ResourcePath::get_or_create(blobs.path(slot)))
    }

    /// Number of live entries, as recorded in the blob header.
    pub fn descriptor_count(&self) -> usize {
        self.state.read().blobs.count()
    }

    pub fn capacity(&self) -> usize {
        self.state.read().blobs.capacity
    }
}

impl std::fmt::Debug for AssetsDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetsDb")
            .field("count", &self.descriptor_count())
            .field("capacity", &self.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, Ordering};
    use vellum_ddc::{MappedRegion, MmapBackend, PlatformBackend};

    fn open(dir: &tempfile::TempDir, capacity: usize) -> AssetsDb {
        let cache = Arc::new(DerivedDataCache::new(dir.path()).unwrap());
        AssetsDb::open(cache, capacity).unwrap()
    }

    fn descriptor(name: &str) -> AssetDescriptor {
        AssetDescriptor::new(AssetTypeKey::from_name(name))
    }

    fn assert_consistent(db: &AssetsDb) {
        let entries = db.enumerate_asset_descriptors();
        assert_eq!(db.descriptor_count(), entries.len());
        for (path, _) in &entries {
            let slot = db.slot_of(*path).unwrap();
            assert!(slot < db.descriptor_count());
            assert_eq!(db.path_in_slot(slot), Some(*path));
        }
    }

    #[test]
    fn test_save_and_find() {
        let dir = tempfile::tempdir().unwrap();
        let db = open(&dir, 4);
        let path = ResourcePath::get_or_create("Db/Save/A.asset");

        assert!(db.save_asset_descriptor(path, descriptor("Texture")).unwrap());
        assert!(!db.save_asset_descriptor(path, descriptor("Mesh")).unwrap());

        assert_eq!(db.find_asset_descriptor(path), Some(descriptor("Texture")));
        assert_eq!(db.resolve_path(path.id()), Some(path));
        assert_eq!(db.descriptor_count(), 1);
    }

    #[test]
    fn test_reopen_rebuilds_index() {
        let dir = tempfile::tempdir().unwrap();
        let a = ResourcePath::get_or_create("Db/Reopen/A.asset");
        let b = ResourcePath::get_or_create("Db/Reopen/B.asset");
        {
            let db = open(&dir, 4);
            db.save_asset_descriptor(a, descriptor("Texture")).unwrap();
            db.save_asset_descriptor(b, descriptor("Mesh")).unwrap();
        }

        let db = open(&dir, 4);
        assert_eq!(db.descriptor_count(), 2);
        assert_eq!(db.find_asset_descriptor(b), Some(descriptor("Mesh")));
        assert_eq!(
            db.enumerate_asset_descriptors(),
            vec![(a, descriptor("Texture")), (b, descriptor("Mesh"))]
        );
    }

    #[test]
    fn test_growth_doubles_capacity() {
        let dir = tempfile::tempdir().unwrap();
        let db = open(&dir, 2);
        let paths: Vec<_> = (0..5)
            .map(|i| ResourcePath::get_or_create(format!("Db/Grow/{}.asset", i)))
            .collect();
        for path in &paths {
            db.save_asset_descriptor(*path, descriptor("Texture")).unwrap();
        }

        assert_eq!(db.capacity(), 8);
        assert_eq!(db.descriptor_count(), 5);
        assert_consistent(&db);

        drop(db);
        let db = open(&dir, 2);
        assert_eq!(db.capacity(), 8);
        assert_eq!(db.descriptor_count(), 5);
        assert_consistent(&db);
    }

    #[test]
    fn test_delete_swaps_last_into_hole() {
        let dir = tempfile::tempdir().unwrap();
        let db = open(&dir, 4);
        let a = ResourcePath::get_or_create("Db/Delete/A.asset");
        let b = ResourcePath::get_or_create("Db/Delete/B.asset");
        let c = ResourcePath::get_or_create("Db/Delete/C.asset");
        for path in [a, b, c] {
            db.save_asset_descriptor(path, descriptor("Mesh")).unwrap();
        }

        assert!(db.delete_asset_descriptor(a.id()).unwrap());
        assert!(!db.delete_asset_descriptor(a.id()).unwrap());

        assert_eq!(db.descriptor_count(), 2);
        assert_eq!(db.slot_of(c), Some(0));
        assert_eq!(db.path_in_slot(0), Some(c));
        assert_eq!(db.path_in_slot(2), None);
        assert!(db.find_asset_descriptor(a).is_none());

        assert!(db.delete_asset_descriptor(b.id()).unwrap());
        assert_eq!(db.descriptor_count(), 1);
        assert_consistent(&db);
    }

    #[test]
    fn test_compaction_under_mixed_operations() {
        let dir = tempfile::tempdir().unwrap();
        let db = open(&dir, 2);
        let paths: Vec<_> = (0..24)
            .map(|i| ResourcePath::get_or_create(format!("Db/Mixed/{}.asset", i)))
            .collect();

        let mut live = std::collections::BTreeSet::new();
        let mut seed = 0x2545_f491_4f6c_dd1du64;
        for _ in 0..300 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let index = (seed % paths.len() as u64) as usize;
            let path = paths[index];

            if seed & 0x100 == 0 {
                let inserted = db.save_asset_descriptor(path, descriptor("Prefab")).unwrap();
                assert_eq!(inserted, live.insert(index));
            } else {
                let removed = db.delete_asset_descriptor(path.id()).unwrap();
                assert_eq!(removed, live.remove(&index));
            }
            assert_eq!(db.descriptor_count(), live.len());
        }

        assert_consistent(&db);
        drop(db);
        let db = open(&dir, 2);
        assert_eq!(db.descriptor_count(), live.len());
        assert_consistent(&db);
    }

    #[test]
    fn test_overlong_path_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let db = open(&dir, 1);
        let longest = ResourcePath::get_or_create("x".repeat(MAX_PATH_LEN));
        let overlong = ResourcePath::get_or_create("y".repeat(PATH_SLOT_LEN + 10));

        let err = db.save_asset_descriptor(overlong, descriptor("Mesh")).unwrap_err();
        assert!(matches!(err, AssetError::InvalidPath { .. }));
        assert_eq!(db.descriptor_count(), 0);

        assert!(db.save_asset_descriptor(longest, descriptor("Mesh")).unwrap());
        assert_eq!(db.path_in_slot(0), Some(longest));
    }

    // ========================================================================
    // Open
    // ========================================================================

    #[test]
    #[should_panic(expected = "disagree on slot count")]
    fn test_open_with_mismatched_blobs_panics() {
        let dir = tempfile::tempdir().unwrap();
        drop(open(&dir, 4));

        let cache = Arc::new(DerivedDataCache::new(dir.path()).unwrap());
        drop(cache.create_derived_data_sized(paths_key(), paths_size(2)).unwrap());
        let _ = AssetsDb::open(cache, 4);
    }

    #[test]
    #[should_panic(expected = "exactly one of its two blobs exists")]
    fn test_open_with_one_blob_panics() {
        let dir = tempfile::tempdir().unwrap();
        drop(open(&dir, 4));

        let cache = Arc::new(DerivedDataCache::new(dir.path()).unwrap());
        assert!(cache.delete_derived_data(paths_key()).unwrap());
        let _ = AssetsDb::open(cache, 4);
    }

    // ========================================================================
    // Growth failures
    // ========================================================================

    /// Memory-mapped backend that refuses to create one blob while `failing` is set.
    struct RefusingBackend {
        refused: String,
        failing: Arc<AtomicBool>,
    }

    impl PlatformBackend for RefusingBackend {
        fn create(&self, path: &Path, size: usize) -> io::Result<MappedRegion> {
            if self.failing.load(Ordering::Acquire) && path.ends_with(&self.refused) {
                return Err(io::Error::new(io::ErrorKind::StorageFull, "disk full"));
            }
            MmapBackend.create(path, size)
        }

        fn write_all(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
            MmapBackend.write_all(path, bytes)
        }

        fn open(
            &self,
            path: &Path,
            offset: u64,
            size: Option<usize>,
            writable: bool,
        ) -> io::Result<Option<MappedRegion>> {
            MmapBackend.open(path, offset, size, writable)
        }

        fn remove(&self, path: &Path) -> io::Result<bool> {
            MmapBackend.remove(path)
        }

        fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
            MmapBackend.rename(from, to)
        }

        fn exists(&self, path: &Path) -> bool {
            MmapBackend.exists(path)
        }

        fn size(&self, path: &Path) -> io::Result<Option<u64>> {
            MmapBackend.size(path)
        }
    }

    #[test]
    fn test_failed_growth_keeps_db_usable() {
        let dir = tempfile::tempdir().unwrap();
        let failing = Arc::new(AtomicBool::new(false));
        let backend = RefusingBackend {
            refused: staged_paths_key().to_hex(),
            failing: failing.clone(),
        };
        let cache = Arc::new(DerivedDataCache::with_backend(dir.path(), backend).unwrap());
        let db = AssetsDb::open(cache.clone(), 2).unwrap();

        let a = ResourcePath::get_or_create("Db/Refused/A.asset");
        let b = ResourcePath::get_or_create("Db/Refused/B.asset");
        let c = ResourcePath::get_or_create("Db/Refused/C.asset");
        db.save_asset_descriptor(a, descriptor("Texture")).unwrap();
        db.save_asset_descriptor(b, descriptor("Texture")).unwrap();

        failing.store(true, Ordering::Release);
        assert!(db.save_asset_descriptor(c, descriptor("Mesh")).is_err());

        // The old blobs are still mapped and nothing staged is left behind.
        assert_eq!(db.capacity(), 2);
        assert_eq!(db.descriptor_count(), 2);
        assert_eq!(db.find_asset_descriptor(b), Some(descriptor("Texture")));
        assert!(db.find_asset_descriptor(c).is_none());
        assert!(!cache.does_key_exist(staged_descriptors_key()));
        assert!(!cache.does_key_exist(staged_paths_key()));
        assert!(db.delete_asset_descriptor(a.id()).unwrap());
        db.save_asset_descriptor(a, descriptor("Texture")).unwrap();

        failing.store(false, Ordering::Release);
        assert!(db.save_asset_descriptor(c, descriptor("Mesh")).unwrap());
        assert_eq!(db.capacity(), 4);
        assert_consistent(&db);

        drop(db);
        let db = AssetsDb::open(cache, 2).unwrap();
        assert_eq!(db.capacity(), 4);
        assert_eq!(db.descriptor_count(), 3);
        assert_consistent(&db);
    }

    /// Open a db with two entries in two slots and stage a grown copy of it.
    fn stage_growth(dir: &tempfile::TempDir) -> (Arc<DerivedDataCache>, [ResourcePath; 2]) {
        let cache = Arc::new(DerivedDataCache::new(dir.path()).unwrap());
        let paths = [
            ResourcePath::get_or_create("Db/Interrupted/A.asset"),
            ResourcePath::get_or_create("Db/Interrupted/B.asset"),
        ];
        let db = AssetsDb::open(cache.clone(), 2).unwrap();
        for path in paths {
            db.save_asset_descriptor(path, descriptor("Prefab")).unwrap();
        }
        let state = db.state.read();
        drop(db.stage_blobs(&state.blobs, 2, 4).unwrap());
        (cache, paths)
    }

    #[test]
    fn test_open_finishes_growth_interrupted_between_renames() {
        let dir = tempfile::tempdir().unwrap();
        let (cache, paths) = stage_growth(&dir);
        cache
            .rename_derived_data(staged_descriptors_key(), descriptors_key())
            .unwrap();

        let db = AssetsDb::open(cache.clone(), 2).unwrap();
        assert_eq!(db.capacity(), 4);
        assert_eq!(db.descriptor_count(), 2);
        for path in paths {
            assert_eq!(db.find_asset_descriptor(path), Some(descriptor("Prefab")));
        }
        assert!(!cache.does_key_exist(staged_paths_key()));
        assert_consistent(&db);
    }

    #[test]
    fn test_open_discards_growth_interrupted_before_commit() {
        let dir = tempfile::tempdir().unwrap();
        let (cache, paths) = stage_growth(&dir);

        let db = AssetsDb::open(cache.clone(), 2).unwrap();
        assert_eq!(db.capacity(), 2);
        assert_eq!(db.descriptor_count(), 2);
        assert_eq!(db.find_asset_descriptor(paths[1]), Some(descriptor("Prefab")));
        assert!(!cache.does_key_exist(staged_descriptors_key()));
        assert!(!cache.does_key_exist(staged_paths_key()));
        assert_consistent(&db);
    }
}
