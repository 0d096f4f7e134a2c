//! Asset type identity and the behaviour hooks of asset types.

use std::any::Any;
use std::fmt;

use bytemuck::{Pod, Zeroable};
use vellum_core::ResourcePath;
use vellum_core::hash::stable_hash64;
use vellum_ddc::DerivedDataKey;

use crate::blackboard::Blackboard;
use crate::error::AssetResult;
use crate::instance::AssetInstance;
use crate::system::AssetsSystem;

/// Stable numeric identity of an asset type, derived from its name.
///
/// Stored verbatim in the descriptor index, hence `Pod`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Pod, Zeroable)]
#[repr(transparent)]
pub struct AssetTypeKey(u64);

impl AssetTypeKey {
    pub fn from_name(name: &str) -> Self {
        Self(stable_hash64(name.as_bytes()).max(1))
    }

    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> u64 {
        self.0
    }

    pub const fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for AssetTypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// The complete persisted payload of one asset.
#[derive(Debug, Default)]
pub struct AssetInstanceData {
    pub asset_type: AssetTypeKey,
    pub attributes: Blackboard,
}

impl AssetInstanceData {
    pub fn new(asset_type: AssetTypeKey) -> Self {
        Self {
            asset_type,
            attributes: Blackboard::new(),
        }
    }
}

/// What a type constructor is told about the instance being built.
#[derive(Debug, Clone)]
pub struct InstanceDefinition {
    pub name: String,
    pub path: ResourcePath,
    pub asset_type: AssetTypeKey,
}

/// Access to the concrete type behind a `dyn AssetBehavior`.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Hooks through which an asset type takes part in the asset lifecycle.
///
/// Every hook receives the instance it belongs to and the owning system. Runtime
/// state built in [`AssetBehavior::on_initialize`] lives in the behaviour value and
/// needs interior mutability.
///
/// Behaviours must not keep a clone of the [`AssetsSystem`] they are given.
pub trait AssetBehavior: AsAny + Send + Sync {
    /// Produce or refresh the derived data of `asset` from its attributes.
    fn compile(&self, _asset: &AssetInstance, _system: &AssetsSystem) -> AssetResult<()> {
        Ok(())
    }

    /// Runs right after a new asset is constructed and its attributes seeded.
    fn post_create(&self, asset: &AssetInstance, system: &AssetsSystem) -> AssetResult<()> {
        self.compile(asset, system)
    }

    /// Derived data blobs owned by `asset`.
    fn derived_data_keys(&self, _asset: &AssetInstance) -> Vec<DerivedDataKey> {
        Vec::new()
    }

    /// Whether the derived data of `asset` must be recompiled before use.
    fn is_deprecated(&self, asset: &AssetInstance, system: &AssetsSystem) -> bool {
        self.derived_data_keys(asset)
            .into_iter()
            .any(|key| !system.cache().does_key_exist(key))
    }

    /// Runs once derived data is known to be present.
    fn on_initialize(&self, _asset: &AssetInstance, _system: &AssetsSystem) -> AssetResult<()> {
        Ok(())
    }

    /// Runs after a successful [`AssetBehavior::on_initialize`].
    fn post_initialize(&self, _asset: &AssetInstance, _system: &AssetsSystem) {}

    fn pre_save(&self, _asset: &AssetInstance, _system: &AssetsSystem) {}

    fn post_save(&self, _asset: &AssetInstance, _system: &AssetsSystem) {}

    /// Runs after the last handle is released and the asset left the loaded table.
    fn pre_unload(&self, _asset: &AssetInstance, _system: &AssetsSystem) {}
}

/// A statically known asset type, registered with
/// [`crate::AssetFactory::register`].
pub trait AssetType: AssetBehavior + Sized {
    /// Name written into asset files.
    const TYPE_NAME: &'static str;

    fn construct(system: &AssetsSystem, definition: &InstanceDefinition) -> AssetResult<Self>;

    /// Clean up derived data owned by a deleted asset.
    fn on_deleted(_system: &AssetsSystem, _path: ResourcePath, _data: &AssetInstanceData) {}

    fn type_key() -> AssetTypeKey {
        AssetTypeKey::from_name(Self::TYPE_NAME)
    }
}
