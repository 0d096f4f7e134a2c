//! Loaded asset instances and the handles that keep them alive.

use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU8, AtomicU32, Ordering};
use std::sync::{Arc, Weak};

use bitflags::bitflags;
use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use vellum_core::ResourcePath;
use vellum_core::jobs::JobHandle;

use crate::asset_type::{AssetBehavior, AssetInstanceData, AssetTypeKey, InstanceDefinition};
use crate::blackboard::Blackboard;
use crate::system::{AssetsSystem, SystemShared};

bitflags! {
    /// Runtime state bits of an [`AssetInstance`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AssetFlags: u8 {
        /// Initialization finished successfully.
        const INITIALIZED = 1 << 0;
        /// Exempt from bulk unloading.
        const PERMANENT = 1 << 1;
    }
}

/// One loaded asset.
///
/// Instances are owned by the [`AssetsSystem`] and reached through [`AssetHandle`]s.
/// The reference count, runtime flags and initialization signal are atomic and can
/// be read from any thread; attribute data sits behind its own lock.
pub struct AssetInstance {
    name: String,
    path: ResourcePath,
    asset_type: AssetTypeKey,
    behavior: Box<dyn AssetBehavior>,
    data: RwLock<AssetInstanceData>,
    ref_count: AtomicU32,
    flags: AtomicU8,
    initialization: JobHandle,
    owner: Weak<SystemShared>,
}

impl AssetInstance {
    pub(crate) fn new(
        definition: InstanceDefinition,
        behavior: Box<dyn AssetBehavior>,
        attributes: Blackboard,
        owner: Weak<SystemShared>,
    ) -> Self {
        Self {
            name: definition.name,
            path: definition.path,
            asset_type: definition.asset_type,
            behavior,
            data: RwLock::new(AssetInstanceData {
                asset_type: definition.asset_type,
                attributes,
            }),
            ref_count: AtomicU32::new(0),
            flags: AtomicU8::new(0),
            initialization: JobHandle::new(),
            owner,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> ResourcePath {
        self.path
    }

    pub fn asset_type(&self) -> AssetTypeKey {
        self.asset_type
    }

    pub fn behavior(&self) -> &dyn AssetBehavior {
        self.behavior.as_ref()
    }

    /// The behaviour as its concrete type.
    pub fn behavior_as<T: AssetBehavior>(&self) -> Option<&T> {
        self.behavior().as_any().downcast_ref::<T>()
    }

    pub fn data(&self) -> RwLockReadGuard<'_, AssetInstanceData> {
        self.data.read()
    }

    pub fn data_mut(&self) -> RwLockWriteGuard<'_, AssetInstanceData> {
        self.data.write()
    }

    pub fn attributes(&self) -> MappedRwLockReadGuard<'_, Blackboard> {
        RwLockReadGuard::map(self.data.read(), |data| &data.attributes)
    }

    pub fn attributes_mut(&self) -> MappedRwLockWriteGuard<'_, Blackboard> {
        RwLockWriteGuard::map(self.data.write(), |data| &mut data.attributes)
    }

    /// Number of live [`AssetHandle`]s.
    pub fn ref_count(&self) -> u32 {
        self.ref_count.load(Ordering::Acquire)
    }

    pub fn flags(&self) -> AssetFlags {
        AssetFlags::from_bits_truncate(self.flags.load(Ordering::Acquire))
    }

    /// Non-blocking check of whether initialization has finished successfully.
    pub fn is_initialized(&self) -> bool {
        self.flags().contains(AssetFlags::INITIALIZED)
    }

    /// Block until the initialization job has finished. Returns whether it succeeded.
    pub fn await_initialization(&self) -> bool {
        self.initialization.wait();
        self.is_initialized()
    }

    /// The signal completed when the initialization job finishes, successful or not.
    pub fn initialization(&self) -> &JobHandle {
        &self.initialization
    }

    pub fn set_permanent(&self) {
        self.flags
            .fetch_or(AssetFlags::PERMANENT.bits(), Ordering::AcqRel);
    }

    pub fn clear_permanent(&self) {
        self.flags
            .fetch_and(!AssetFlags::PERMANENT.bits(), Ordering::AcqRel);
    }

    pub fn is_permanent(&self) -> bool {
        self.flags().contains(AssetFlags::PERMANENT)
    }

    pub(crate) fn mark_initialized(&self) {
        self.flags
            .fetch_or(AssetFlags::INITIALIZED.bits(), Ordering::Release);
    }
}

impl fmt::Debug for AssetInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetInstance")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("asset_type", &self.asset_type)
            .field("ref_count", &self.ref_count())
            .field("flags", &self.flags())
            .finish()
    }
}

impl Drop for AssetInstance {
    fn drop(&mut self) {
        let count = *self.ref_count.get_mut();
        assert_eq!(
            count, 0,
            "asset instance {} destroyed with {} live references",
            self.path, count
        );
    }
}

/// A counted reference to a loaded [`AssetInstance`].
///
/// Dropping the last handle removes the instance from the system's loaded table.
pub struct AssetHandle {
    instance: Arc<AssetInstance>,
}

impl AssetHandle {
    /// Take a new reference. Callers hold the loaded-table lock when the instance is
    /// reachable through the table.
    pub(crate) fn acquire(instance: &Arc<AssetInstance>) -> Self {
        instance.ref_count.fetch_add(1, Ordering::AcqRel);
        Self {
            instance: instance.clone(),
        }
    }

    pub(crate) fn instance(&self) -> &Arc<AssetInstance> {
        &self.instance
    }

    /// Whether both handles refer to the same instance.
    pub fn ptr_eq(a: &AssetHandle, b: &AssetHandle) -> bool {
        Arc::ptr_eq(&a.instance, &b.instance)
    }
}

impl Clone for AssetHandle {
    fn clone(&self) -> Self {
        Self::acquire(&self.instance)
    }
}

impl Deref for AssetHandle {
    type Target = AssetInstance;

    fn deref(&self) -> &AssetInstance {
        &self.instance
    }
}

impl fmt::Debug for AssetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AssetHandle").field(&self.instance).finish()
    }
}

impl Drop for AssetHandle {
    fn drop(&mut self) {
        let previous = self.instance.ref_count.fetch_sub(1, Ordering::AcqRel);
        assert!(
            previous > 0,
            "asset {} reference count underflow",
            self.instance.path
        );
        if previous == 1 {
            if let Some(owner) = self.instance.owner.upgrade() {
                AssetsSystem::from_shared(owner).release_instance(&self.instance);
            }
        }
    }
}
