//! Vellum - asset persistence and derived data caching
//!
//! Vellum stores the source description of every asset as a small file under a
//! content root and keeps compiled byproducts in a memory-mapped, content-addressed
//! derived data cache:
//!
//! - **Resource paths**: Interned, cheap-to-copy asset identifiers
//! - **Derived data cache**: One mapped blob per key, with zero-copy reads
//! - **Assets**: Typed attributes, reference-counted instances and asynchronous
//!   initialization (feature `assets`)
//!
//! # Quick Start
//!
//! ```ignore
//! use vellum::prelude::*;
//!
//! // Setup and load fail with different error types.
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     vellum::init();
//!
//!     let system = AssetsSystem::builder(AssetsConfig::in_directory("project"))
//!         .with_asset_type::<Texture>()
//!         .with_attribute::<TextureSource>()
//!         .build()?;
//!
//!     let texture = system.load_and_init_asset("Textures/Grass.asset")?;
//!     Ok(())
//! }
//! ```

pub use vellum_core as core;
pub use vellum_ddc as ddc;

#[cfg(feature = "assets")]
pub use vellum_assets as assets;

pub use vellum_core::ResourcePath;
pub use vellum_core::jobs::{InlineScheduler, JobHandle, JobScheduler, TaskPool};
pub use vellum_ddc::{ContentHandle, DerivedDataCache, DerivedDataKey, MapOptions};

#[cfg(feature = "assets")]
pub use vellum_assets::{AssetHandle, AssetsConfig, AssetsSystem};

/// Install the default `tracing` subscriber.
///
/// Does nothing if the application already installed one.
pub fn init() {
    if !vellum_core::logging::try_init() {
        tracing::debug!("Logging already initialized");
    }
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use vellum_core::ResourcePath;
    pub use vellum_core::jobs::{InlineScheduler, JobScheduler, TaskPool};
    pub use vellum_ddc::{ContentHandle, DdcError, DerivedDataCache, DerivedDataKey, MapOptions};

    // Asset types
    #[cfg(feature = "assets")]
    pub use vellum_assets::{
        AssetBehavior, AssetError, AssetEvent, AssetHandle, AssetInstance, AssetResult, AssetType,
        AssetsConfig, AssetsSystem, Attribute, Blackboard, CreateAssetInfo, CreateError,
        DeleteResult, InstanceDefinition, LoadError,
    };
}
