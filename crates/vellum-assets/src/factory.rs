//! Registry of asset types.

use std::fmt;

use vellum_core::ResourcePath;
use vellum_core::alloc::HashMap;

use crate::asset_type::{AssetBehavior, AssetInstanceData, AssetType, AssetTypeKey, InstanceDefinition};
use crate::error::AssetResult;
use crate::system::AssetsSystem;

/// Builds the behaviour of a new instance.
pub type ConstructFn = Box<
    dyn Fn(&AssetsSystem, &InstanceDefinition) -> AssetResult<Box<dyn AssetBehavior>>
        + Send
        + Sync,
>;

/// Cleans up after an asset file of this type was deleted.
pub type DeleteHookFn = Box<dyn Fn(&AssetsSystem, ResourcePath, &AssetInstanceData) + Send + Sync>;

/// Everything the factory knows about one asset type.
pub struct AssetTypeInfo {
    name: String,
    key: AssetTypeKey,
    construct: ConstructFn,
    on_deleted: Option<DeleteHookFn>,
}

impl AssetTypeInfo {
    pub fn new<F>(name: impl Into<String>, construct: F) -> Self
    where
        F: Fn(&AssetsSystem, &InstanceDefinition) -> AssetResult<Box<dyn AssetBehavior>>
            + Send
            + Sync
            + 'static,
    {
        let name = name.into();
        Self {
            key: AssetTypeKey::from_name(&name),
            name,
            construct: Box::new(construct),
            on_deleted: None,
        }
    }

    /// Build the info of a statically known type.
    pub fn of<T: AssetType>() -> Self {
        Self::new(T::TYPE_NAME, |system, definition| {
            let behavior: Box<dyn AssetBehavior> = Box::new(T::construct(system, definition)?);
            Ok(behavior)
        })
        .with_delete_hook(T::on_deleted)
    }

    pub fn with_delete_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&AssetsSystem, ResourcePath, &AssetInstanceData) + Send + Sync + 'static,
    {
        self.on_deleted = Some(Box::new(hook));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> AssetTypeKey {
        self.key
    }

    pub fn has_delete_hook(&self) -> bool {
        self.on_deleted.is_some()
    }

    pub fn construct(
        &self,
        system: &AssetsSystem,
        definition: &InstanceDefinition,
    ) -> AssetResult<Box<dyn AssetBehavior>> {
        (self.construct)(system, definition)
    }

    pub fn notify_deleted(&self, system: &AssetsSystem, path: ResourcePath, data: &AssetInstanceData) {
        if let Some(hook) = &self.on_deleted {
            hook(system, path, data);
        }
    }
}

impl fmt::Debug for AssetTypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetTypeInfo")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("has_delete_hook", &self.has_delete_hook())
            .finish()
    }
}

/// Maps asset type keys to their construction and deletion functions.
///
/// Types register at start-up; dispatching on an unregistered key is a bug.
#[derive(Debug, Default)]
pub struct AssetFactory {
    types: HashMap<AssetTypeKey, AssetTypeInfo>,
}

impl AssetFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a statically known asset type.
    pub fn register<T: AssetType>(&mut self) -> AssetTypeKey {
        self.register_info(AssetTypeInfo::of::<T>())
    }

    /// # Panics
    ///
    /// Panics if a type with the same key is already registered.
    pub fn register_info(&mut self, info: AssetTypeInfo) -> AssetTypeKey {
        let key = info.key;
        if let Some(existing) = self.types.get(&key) {
            panic!(
                "asset type '{}' conflicts with registered type '{}'",
                info.name, existing.name
            );
        }
        tracing::debug!("Registered asset type {} ({})", info.name, key);
        self.types.insert(key, info);
        key
    }

    pub fn find(&self, key: AssetTypeKey) -> Option<&AssetTypeInfo> {
        self.types.get(&key)
    }

    /// # Panics
    ///
    /// Panics if `key` is not registered.
    pub fn info(&self, key: AssetTypeKey) -> &AssetTypeInfo {
        self.find(key)
            .unwrap_or_else(|| panic!("asset type {} is not registered", key))
    }

    pub fn by_name(&self, name: &str) -> Option<&AssetTypeInfo> {
        self.find(AssetTypeKey::from_name(name))
            .filter(|info| info.name == name)
    }

    pub fn contains(&self, key: AssetTypeKey) -> bool {
        self.types.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Construct the behaviour for `definition`.
    ///
    /// # Panics
    ///
    /// Panics if the definition's type is not registered.
    pub fn construct(
        &self,
        system: &AssetsSystem,
        definition: &InstanceDefinition,
    ) -> AssetResult<Box<dyn AssetBehavior>> {
        self.info(definition.asset_type).construct(system, definition)
    }

    /// Run the delete hook of `data.asset_type`, if it has one.
    pub fn notify_deleted(&self, system: &AssetsSystem, path: ResourcePath, data: &AssetInstanceData) {
        self.info(data.asset_type).notify_deleted(system, path, data);
    }
}
