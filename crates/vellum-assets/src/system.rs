//! The asset system: creation, loading, saving and deletion of assets.

use std::any::{Any, TypeId};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde::de::DeserializeOwned;
use vellum_core::ResourcePath;
use vellum_core::alloc::{HashMap, HashSet};
use vellum_core::jobs::{JobScheduler, TaskPool};
use vellum_core::path::PathId;
use vellum_core::profiling::profile_function;
use vellum_ddc::DerivedDataCache;

use crate::asset_type::{AssetInstanceData, AssetType, AssetTypeKey, InstanceDefinition};
use crate::assets_db::{self, AssetDescriptor, AssetsDb};
use crate::attribute::{Attribute, AttributeRegistry};
use crate::batch::{CompilationBatch, CompilationBatchCache};
use crate::blackboard::Blackboard;
use crate::config::AssetsConfig;
use crate::document::AssetDocument;
use crate::error::{AssetError, AssetResult, CreateError, DeleteResult, LoadError};
use crate::event::{AssetEvent, AssetEventBuffer};
use crate::factory::{AssetFactory, AssetTypeInfo};
use crate::instance::{AssetHandle, AssetInstance};

/// Seeds the attributes of a new asset.
pub type DataInitializer<'a> = Box<dyn FnOnce(&mut Blackboard) + 'a>;

/// Parameters of [`AssetsSystem::create_asset`].
pub struct CreateAssetInfo<'a> {
    pub path: ResourcePath,
    pub asset_type: AssetTypeKey,
    pub initializer: Option<DataInitializer<'a>>,
}

impl<'a> CreateAssetInfo<'a> {
    pub fn new(path: impl Into<ResourcePath>, asset_type: AssetTypeKey) -> Self {
        Self {
            path: path.into(),
            asset_type,
            initializer: None,
        }
    }

    /// Create an asset of the statically known type `T`.
    pub fn of<T: AssetType>(path: impl Into<ResourcePath>) -> Self {
        Self::new(path, T::type_key())
    }

    pub fn with_initializer(mut self, initializer: impl FnOnce(&mut Blackboard) + 'a) -> Self {
        self.initializer = Some(Box::new(initializer));
        self
    }
}

#[derive(Default)]
struct LoadedTable {
    instances: HashMap<PathId, Arc<AssetInstance>>,
    /// Paths reserved by a `create_asset` that has not finished yet.
    in_flight: HashSet<PathId>,
}

pub(crate) struct SystemShared {
    config: AssetsConfig,
    cache: Arc<DerivedDataCache>,
    assets_db: Option<AssetsDb>,
    factory: AssetFactory,
    attributes: AttributeRegistry,
    scheduler: Arc<dyn JobScheduler>,
    table: RwLock<LoadedTable>,
    batch: CompilationBatchCache,
    events: Mutex<AssetEventBuffer>,
}

/// Releases a `create_asset` path reservation on early exit.
struct Reservation<'a> {
    table: &'a RwLock<LoadedTable>,
    id: PathId,
    armed: bool,
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.table.write().in_flight.remove(&self.id);
        }
    }
}

/// Completes the initialization signal of an asset once its job is done with it,
/// or when the job is dropped without running.
struct InitializationGuard {
    handle: AssetHandle,
}

impl Drop for InitializationGuard {
    fn drop(&mut self) {
        self.handle.initialization().complete();
    }
}

/// Builder for [`AssetsSystem`].
///
/// Asset types and attribute types are registered here, before the system exists.
pub struct AssetsSystemBuilder {
    config: AssetsConfig,
    factory: AssetFactory,
    attributes: AttributeRegistry,
    scheduler: Option<Arc<dyn JobScheduler>>,
}

impl AssetsSystemBuilder {
    pub fn new(config: AssetsConfig) -> Self {
        Self {
            config,
            factory: AssetFactory::new(),
            attributes: AttributeRegistry::new(),
            scheduler: None,
        }
    }

    pub fn with_asset_type<T: AssetType>(mut self) -> Self {
        self.factory.register::<T>();
        self
    }

    pub fn with_asset_type_info(mut self, info: AssetTypeInfo) -> Self {
        self.factory.register_info(info);
        self
    }

    pub fn with_attribute<T>(mut self) -> Self
    where
        T: Attribute + Default + Serialize + DeserializeOwned,
    {
        self.attributes.register::<T>();
        self
    }

    /// Run initialization jobs on `scheduler` instead of a private [`TaskPool`].
    pub fn with_scheduler(mut self, scheduler: Arc<dyn JobScheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn build(self) -> AssetResult<AssetsSystem> {
        profile_function!();
        let config = self.config;
        if config.create_directories {
            std::fs::create_dir_all(&config.content_root)
                .map_err(|e| AssetError::io(&config.content_root, e))?;
        }

        let cache = Arc::new(DerivedDataCache::new(&config.cache_root)?);
        let assets_db = if config.use_assets_db {
            Some(AssetsDb::open(cache.clone(), config.assets_db_capacity)?)
        } else {
            None
        };
        let scheduler = self
            .scheduler
            .unwrap_or_else(|| Arc::new(TaskPool::default_threads()) as Arc<dyn JobScheduler>);

        tracing::info!(
            "Asset system ready: content at {}, cache at {}, {} asset types",
            config.content_root.display(),
            config.cache_root.display(),
            self.factory.len()
        );

        Ok(AssetsSystem {
            shared: Arc::new(SystemShared {
                config,
                cache,
                assets_db,
                factory: self.factory,
                attributes: self.attributes,
                scheduler,
                table: RwLock::new(LoadedTable::default()),
                batch: CompilationBatchCache::new(),
                events: Mutex::new(AssetEventBuffer::new()),
            }),
        })
    }
}

/// Owns the derived data cache, the descriptor index and the table of loaded assets.
///
/// At most one instance is loaded per path. Cloning is cheap and shares the system.
///
/// # Example
///
/// ```ignore
/// fn create_grass() -> Result<(), Box<dyn std::error::Error>> {
///     let system = AssetsSystem::builder(AssetsConfig::in_directory("project"))
///         .with_asset_type::<Texture>()
///         .with_attribute::<TextureSource>()
///         .build()?;
///
///     let texture = system.create_asset(
///         CreateAssetInfo::of::<Texture>("Textures/Grass.asset")
///             .with_initializer(|attributes| {
///                 attributes.create(TextureSource::new("grass.png"));
///             }),
///     )?;
///     texture.await_initialization();
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct AssetsSystem {
    shared: Arc<SystemShared>,
}

impl AssetsSystem {
    pub fn builder(config: AssetsConfig) -> AssetsSystemBuilder {
        AssetsSystemBuilder::new(config)
    }

    pub(crate) fn from_shared(shared: Arc<SystemShared>) -> Self {
        Self { shared }
    }

    pub fn config(&self) -> &AssetsConfig {
        &self.shared.config
    }

    pub fn cache(&self) -> &DerivedDataCache {
        &self.shared.cache
    }

    /// The descriptor index, unless disabled in the config.
    pub fn assets_db(&self) -> Option<&AssetsDb> {
        self.shared.assets_db.as_ref()
    }

    pub fn factory(&self) -> &AssetFactory {
        &self.shared.factory
    }

    pub fn attribute_registry(&self) -> &AttributeRegistry {
        &self.shared.attributes
    }

    /// On-disk location of the asset file for `path`.
    pub fn content_path(&self, path: ResourcePath) -> PathBuf {
        self.shared.config.content_path(path)
    }

    // ------------------------------------------------------------------------
    // Create / load
    // ------------------------------------------------------------------------

    /// Create a new asset, run its post-create step and write its file.
    ///
    /// Fails with [`CreateError::AlreadyExists`] if an asset file exists at the path
    /// or an instance for it is loaded or being created, and with
    /// [`AssetError::InvalidPath`] if the path leaves the content root or is too long
    /// for the descriptor index. Nothing is written in either case.
    pub fn create_asset(&self, info: CreateAssetInfo<'_>) -> Result<AssetHandle, CreateError> {
        profile_function!();
        let CreateAssetInfo {
            path,
            asset_type,
            initializer,
        } = info;
        assert!(path.is_valid(), "cannot create an asset at the invalid path");
        self.check_asset_path(path)
            .map_err(CreateError::FailedToCreateInstance)?;
        let file = self.content_path(path);

        let mut reservation = {
            let mut table = self.shared.table.write();
            if table.instances.contains_key(&path.id())
                || table.in_flight.contains(&path.id())
                || file.exists()
            {
                tracing::debug!("Asset {} already exists", path);
                return Err(CreateError::AlreadyExists);
            }
            table.in_flight.insert(path.id());
            Reservation {
                table: &self.shared.table,
                id: path.id(),
                armed: true,
            }
        };

        let definition = InstanceDefinition {
            name: path.stem().to_string(),
            path,
            asset_type,
        };
        let behavior = self
            .shared
            .factory
            .construct(self, &definition)
            .map_err(CreateError::FailedToCreateInstance)?;

        let mut attributes = Blackboard::new();
        if let Some(initializer) = initializer {
            initializer(&mut attributes);
        }

        let instance = Arc::new(AssetInstance::new(
            definition,
            behavior,
            attributes,
            Arc::downgrade(&self.shared),
        ));
        let handle = AssetHandle::acquire(&instance);

        instance
            .behavior()
            .post_create(&instance, self)
            .map_err(|e| {
                tracing::warn!("Post-create of {} failed: {}", path, e);
                CreateError::CompilationFailed(e)
            })?;

        let document = self
            .document_for(&instance.data())
            .map_err(CreateError::FailedToCreateInstance)?;

        let written = {
            let mut table = self.shared.table.write();
            table.in_flight.remove(&path.id());
            reservation.armed = false;
            let written = self.write_new_asset(path, asset_type, &document, &file);
            if written.is_ok() {
                table.instances.insert(path.id(), instance.clone());
            }
            written
        };
        written.map_err(CreateError::FailedToCreateInstance)?;

        self.push_event(AssetEvent::Created { path, asset_type });
        tracing::debug!("Created asset {}", path);
        self.schedule_initialization(&handle);
        Ok(handle)
    }

    /// Write the file of a new asset and index it. The file is removed again if the
    /// index rejects the entry. Called with the loaded table locked.
    fn write_new_asset(
        &self,
        path: ResourcePath,
        asset_type: AssetTypeKey,
        document: &AssetDocument,
        file: &Path,
    ) -> AssetResult<()> {
        document.write(file)?;
        let Some(db) = &self.shared.assets_db else {
            return Ok(());
        };
        let indexed = db
            .save_asset_descriptor(path, AssetDescriptor::new(asset_type))
            .map(|_| ());
        if indexed.is_err() {
            if let Err(e) = std::fs::remove_file(file) {
                tracing::warn!("Failed to remove unindexed asset file {}: {}", file.display(), e);
            }
        }
        indexed
    }

    /// Reject paths that cannot name an asset file: paths outside the content root,
    /// and paths the descriptor index has no room for.
    fn check_asset_path(&self, path: ResourcePath) -> AssetResult<()> {
        if !path.is_contained() {
            return Err(AssetError::invalid_path(path, "not inside the content root"));
        }
        if self.shared.assets_db.is_some() && !assets_db::accepts_path(path) {
            return Err(AssetError::invalid_path(path, "too long for the assets db"));
        }
        Ok(())
    }

    /// [`AssetsSystem::create_asset`], panicking on failure.
    pub fn create_asset_checked(&self, info: CreateAssetInfo<'_>) -> AssetHandle {
        let path = info.path;
        self.create_asset(info)
            .unwrap_or_else(|e| panic!("Failed to create asset {}: {}", path, e))
    }

    /// Return the loaded instance for `path`, or load it from its file.
    ///
    /// Initialization is scheduled but not awaited.
    pub fn load_asset(&self, path: impl Into<ResourcePath>) -> Result<AssetHandle, LoadError> {
        profile_function!();
        let path = path.into();
        if !path.is_contained() {
            return Err(LoadError::DoesNotExist);
        }
        if let Some(handle) = self.find_loaded_asset(path) {
            return Ok(handle);
        }

        let file = self.content_path(path);
        let document = match AssetDocument::read(&file) {
            Ok(Some(document)) => document,
            Ok(None) => return Err(LoadError::DoesNotExist),
            Err(e) => return Err(LoadError::FailedToCreateInstance(e)),
        };
        self.check_asset_path(path)
            .map_err(LoadError::FailedToCreateInstance)?;
        let instance = self
            .instantiate(path, &document)
            .map_err(LoadError::FailedToCreateInstance)?;

        let handle = {
            let mut table = self.shared.table.write();
            if let Some(existing) = table.instances.get(&path.id()) {
                // Another thread finished loading first.
                return Ok(AssetHandle::acquire(existing));
            }
            // Deleted since it was read.
            if !file.is_file() {
                return Err(LoadError::DoesNotExist);
            }
            if let Some(db) = &self.shared.assets_db {
                db.save_asset_descriptor(path, AssetDescriptor::new(instance.asset_type()))
                    .map_err(LoadError::FailedToCreateInstance)?;
            }
            table.instances.insert(path.id(), instance.clone());
            AssetHandle::acquire(&instance)
        };

        self.push_event(AssetEvent::Loaded {
            path,
            asset_type: handle.asset_type(),
        });
        tracing::debug!("Loaded asset {}", path);
        self.schedule_initialization(&handle);
        Ok(handle)
    }

    /// [`AssetsSystem::load_asset`], panicking on failure.
    pub fn load_asset_checked(&self, path: impl Into<ResourcePath>) -> AssetHandle {
        let path = path.into();
        self.load_asset(path)
            .unwrap_or_else(|e| panic!("Failed to load asset {}: {}", path, e))
    }

    /// Load `path` and block until its initialization has finished.
    pub fn load_and_init_asset(
        &self,
        path: impl Into<ResourcePath>,
    ) -> Result<AssetHandle, LoadError> {
        let handle = self.load_asset(path)?;
        handle.await_initialization();
        Ok(handle)
    }

    /// Load `path` and wait for initialization, panicking if either fails.
    pub fn load_and_init_asset_checked(&self, path: impl Into<ResourcePath>) -> AssetHandle {
        let handle = self.load_asset_checked(path);
        assert!(
            handle.await_initialization(),
            "asset {} failed to initialize",
            handle.path()
        );
        handle
    }

    fn instantiate(
        &self,
        path: ResourcePath,
        document: &AssetDocument,
    ) -> AssetResult<Arc<AssetInstance>> {
        let info = self
            .shared
            .factory
            .by_name(&document.asset_type)
            .ok_or_else(|| AssetError::UnknownType {
                name: document.asset_type.clone(),
            })?;
        let attributes = self.shared.attributes.load_blackboard(&document.attributes)?;
        let definition = InstanceDefinition {
            name: path.stem().to_string(),
            path,
            asset_type: info.key(),
        };
        let behavior = info.construct(self, &definition)?;
        Ok(Arc::new(AssetInstance::new(
            definition,
            behavior,
            attributes,
            Arc::downgrade(&self.shared),
        )))
    }

    fn document_for(&self, data: &AssetInstanceData) -> AssetResult<AssetDocument> {
        Ok(AssetDocument {
            asset_type: self.shared.factory.info(data.asset_type).name().to_string(),
            attributes: self.shared.attributes.save_blackboard(&data.attributes)?,
        })
    }

    // ------------------------------------------------------------------------
    // Initialization
    // ------------------------------------------------------------------------

    fn schedule_initialization(&self, handle: &AssetHandle) {
        let system = self.clone();
        let guard = InitializationGuard {
            handle: handle.clone(),
        };
        self.shared.scheduler.schedule(Box::new(move || {
            system.run_initialization(&guard.handle);
        }));
    }

    fn run_initialization(&self, asset: &AssetInstance) {
        profile_function!();
        let path = asset.path();
        match self.initialize(asset) {
            Ok(()) => {
                asset.behavior().post_initialize(asset, self);
                asset.mark_initialized();
                self.push_event(AssetEvent::Initialized { path });
                tracing::trace!("Initialized asset {}", path);
            }
            Err(e) => {
                tracing::error!("Failed to initialize asset {}: {}", path, e);
                self.push_event(AssetEvent::InitializationFailed {
                    path,
                    error: e.to_string(),
                });
            }
        }
    }

    fn initialize(&self, asset: &AssetInstance) -> AssetResult<()> {
        let behavior = asset.behavior();
        if behavior.is_deprecated(asset, self) {
            tracing::debug!("Derived data of {} is missing, compiling", asset.path());
            behavior.compile(asset, self)?;
        }
        behavior.on_initialize(asset, self)
    }

    /// Compile `path` if its derived data is missing. Returns whether it compiled.
    ///
    /// Compilers of dependent assets call this before recording a dependency.
    pub fn compile_asset_if_deprecated(&self, path: impl Into<ResourcePath>) -> AssetResult<bool> {
        profile_function!();
        let path = path.into();
        let handle = self.load_asset(path).map_err(|e| match e {
            LoadError::DoesNotExist => AssetError::NotFound {
                path: path.to_string(),
            },
            LoadError::FailedToCreateInstance(err) => err,
        })?;

        let behavior = handle.behavior();
        if !behavior.is_deprecated(&handle, self) {
            return Ok(false);
        }
        tracing::debug!("Recompiling deprecated asset {}", path);
        behavior.compile(&handle, self)?;
        Ok(true)
    }

    // ------------------------------------------------------------------------
    // Save / delete
    // ------------------------------------------------------------------------

    /// Write `asset` to its file.
    ///
    /// Attribute types that were unloaded from the asset are restored from the
    /// current file first and unloaded again afterwards, so the save neither loses
    /// them nor changes what is resident.
    ///
    /// Fails with [`AssetError::InvalidPath`] for paths outside the content root.
    pub fn save_asset(&self, asset: &AssetInstance) -> AssetResult<()> {
        profile_function!();
        let path = asset.path();
        self.check_asset_path(path)?;
        let file = self.content_path(path);
        asset.behavior().pre_save(asset, self);

        let document = {
            let mut data = asset.data_mut();
            let unloaded = data.attributes.unloaded_types();
            if !unloaded.is_empty() {
                self.merge_unloaded(&mut data.attributes, &unloaded, &file)?;
            }
            let document = self.document_for(&data);
            for type_id in &unloaded {
                data.attributes.unload(*type_id);
            }
            document?
        };
        {
            let _table = self.shared.table.write();
            document.write(&file)?;
            if let Some(db) = &self.shared.assets_db {
                db.save_asset_descriptor(path, AssetDescriptor::new(asset.asset_type()))?;
            }
        }

        asset.behavior().post_save(asset, self);
        self.push_event(AssetEvent::Saved { path });
        tracing::debug!("Saved asset {}", path);
        Ok(())
    }

    /// [`AssetsSystem::save_asset`], panicking on failure.
    pub fn save_asset_checked(&self, asset: &AssetInstance) {
        if let Err(e) = self.save_asset(asset) {
            panic!("Failed to save asset {}: {}", asset.path(), e);
        }
    }

    fn merge_unloaded(
        &self,
        attributes: &mut Blackboard,
        unloaded: &[TypeId],
        file: &Path,
    ) -> AssetResult<()> {
        let Some(on_disk) = AssetDocument::read(file)? else {
            tracing::warn!(
                "No file at {} to restore unloaded attributes from",
                file.display()
            );
            return Ok(());
        };
        let mut stored = self.shared.attributes.load_blackboard(&on_disk.attributes)?;
        for type_id in unloaded {
            attributes.move_type(&mut stored, *type_id);
        }
        Ok(())
    }

    /// Delete the asset file at `path`.
    ///
    /// A loaded instance is not affected: it stays usable, and saving it recreates
    /// the file, until its last handle is dropped.
    pub fn delete_asset(&self, path: impl Into<ResourcePath>) -> AssetResult<DeleteResult> {
        profile_function!();
        let path = path.into();
        if !path.is_contained() {
            return Ok(DeleteResult::DoesNotExist);
        }
        let file = self.content_path(path);

        let contents = {
            let _table = self.shared.table.write();
            let contents = match std::fs::read(&file) {
                Ok(contents) => contents,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Ok(DeleteResult::DoesNotExist);
                }
                Err(e) => return Err(AssetError::io(&file, e)),
            };
            std::fs::remove_file(&file).map_err(|e| AssetError::io(&file, e))?;
            if let Some(db) = &self.shared.assets_db {
                db.delete_asset_descriptor(path.id())?;
            }
            contents
        };

        match AssetDocument::from_slice(&contents, &file) {
            Ok(document) => self.notify_deleted(path, &document),
            Err(e) => tracing::warn!("Deleted asset {} had an unreadable file: {}", path, e),
        }

        self.push_event(AssetEvent::Deleted { path });
        tracing::debug!("Deleted asset {}", path);
        Ok(DeleteResult::Success)
    }

    fn notify_deleted(&self, path: ResourcePath, document: &AssetDocument) {
        let Some(info) = self.shared.factory.by_name(&document.asset_type) else {
            tracing::warn!(
                "Deleted asset {} has unregistered type '{}'",
                path,
                document.asset_type
            );
            return;
        };
        if !info.has_delete_hook() {
            return;
        }
        match self.shared.attributes.load_blackboard(&document.attributes) {
            Ok(attributes) => {
                let data = AssetInstanceData {
                    asset_type: info.key(),
                    attributes,
                };
                info.notify_deleted(self, path, &data);
            }
            Err(e) => tracing::warn!("Delete hook of {} skipped: {}", path, e),
        }
    }

    // ------------------------------------------------------------------------
    // Compilation batches
    // ------------------------------------------------------------------------

    pub fn on_compilation_started(&self) {
        self.shared.batch.started();
    }

    pub fn on_compilation_finished(&self) {
        self.shared.batch.finished();
    }

    /// Open a compilation batch that closes when the guard is dropped.
    pub fn begin_compilation_batch(&self) -> CompilationBatch<'_> {
        CompilationBatch::begin(&self.shared.batch)
    }

    /// Share a value between assets compiled in the current batch.
    pub fn batch_value<T, F>(&self, key: &str, init: F) -> Arc<T>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        self.shared.batch.get_or_insert(key, init)
    }

    pub fn compilation_batch_cache(&self) -> &CompilationBatchCache {
        &self.shared.batch
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// A new handle to the loaded instance for `path`, without touching the disk.
    pub fn find_loaded_asset(&self, path: impl Into<ResourcePath>) -> Option<AssetHandle> {
        let path = path.into();
        let table = self.shared.table.read();
        table.instances.get(&path.id()).map(AssetHandle::acquire)
    }

    pub fn is_asset_loaded(&self, path: impl Into<ResourcePath>) -> bool {
        let path = path.into();
        self.shared.table.read().instances.contains_key(&path.id())
    }

    /// Paths of all loaded instances.
    pub fn loaded_assets(&self) -> Vec<ResourcePath> {
        let table = self.shared.table.read();
        let mut paths: Vec<_> = table
            .instances
            .values()
            .map(|instance| instance.path())
            .collect();
        paths.sort_by_key(|path| path.as_str());
        paths
    }

    pub fn loaded_asset_count(&self) -> usize {
        self.shared.table.read().instances.len()
    }

    /// Whether an asset file exists for `path` under the content root.
    pub fn asset_exists(&self, path: impl Into<ResourcePath>) -> bool {
        let path = path.into();
        path.is_contained() && self.content_path(path).is_file()
    }

    /// Take all events recorded since the last call.
    pub fn drain_events(&self) -> Vec<AssetEvent> {
        self.shared.events.lock().drain().collect()
    }

    fn push_event(&self, event: AssetEvent) {
        self.shared.events.lock().push(event);
    }

    /// Called by the last [`AssetHandle`] of `instance` as it is dropped.
    pub(crate) fn release_instance(&self, instance: &Arc<AssetInstance>) {
        let path = instance.path();
        let removed = {
            let mut table = self.shared.table.write();
            let is_current = table
                .instances
                .get(&path.id())
                .is_some_and(|current| Arc::ptr_eq(current, instance));
            // A concurrent lookup may have revived the instance before we got the lock.
            if is_current && instance.ref_count() == 0 {
                table.instances.remove(&path.id())
            } else {
                None
            }
        };

        if let Some(removed) = removed {
            removed.behavior().pre_unload(&removed, self);
            self.push_event(AssetEvent::Unloaded { path });
            tracing::debug!("Unloaded asset {}", path);
        }
    }
}

impl std::fmt::Debug for AssetsSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetsSystem")
            .field("content_root", &self.shared.config.content_root)
            .field("cache_root", &self.shared.config.cache_root)
            .field("loaded", &self.loaded_asset_count())
            .finish()
    }
}
