//! Asset persistence and lifecycle.
//!
//! Assets are JSON files under a content root. Each file names its asset type and
//! stores a set of typed attributes; compiled byproducts live in the derived data
//! cache from `vellum-ddc`. The [`AssetsSystem`] keeps at most one loaded
//! [`AssetInstance`] per path, reference-counted through [`AssetHandle`]s, and
//! initializes instances asynchronously after they are created or loaded.
//!
//! # Example
//!
//! ```ignore
//! #[derive(Default, Serialize, Deserialize)]
//! struct Source {
//!     file: String,
//! }
//!
//! impl Attribute for Source {
//!     const TYPE_NAME: &'static str = "Source";
//! }
//!
//! fn print_source() -> Result<(), Box<dyn std::error::Error>> {
//!     let system = AssetsSystem::builder(AssetsConfig::in_directory("project"))
//!         .with_asset_type::<Texture>()
//!         .with_attribute::<Source>()
//!         .build()?;
//!
//!     let handle = system.load_and_init_asset("Textures/Grass.asset")?;
//!     println!("{}", handle.attributes().get::<Source>().file);
//!     Ok(())
//! }
//! ```

pub mod asset_type;
pub mod assets_db;
pub mod attribute;
pub mod batch;
pub mod blackboard;
pub mod config;
pub mod document;
pub mod error;
pub mod event;
pub mod factory;
pub mod instance;
pub mod system;

pub use asset_type::{AsAny, AssetBehavior, AssetInstanceData, AssetType, AssetTypeKey, InstanceDefinition};
pub use assets_db::{AssetDescriptor, AssetsDb};
pub use attribute::{Attribute, AttributeRegistry, AttributeVTable, ErasedAttribute};
pub use batch::{CompilationBatch, CompilationBatchCache};
pub use blackboard::Blackboard;
pub use config::AssetsConfig;
pub use document::AssetDocument;
pub use error::{AssetError, AssetResult, CreateError, DeleteResult, LoadError};
pub use event::{AssetEvent, AssetEventBuffer};
pub use factory::{AssetFactory, AssetTypeInfo};
pub use instance::{AssetFlags, AssetHandle, AssetInstance};
pub use system::{AssetsSystem, AssetsSystemBuilder, CreateAssetInfo, DataInitializer};
